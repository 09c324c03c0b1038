//! # MessageList Component
//!
//! Scrollable view of the active room's messages.
//!
//! ## Responsibilities
//!
//! - Lay out messages and cache their heights
//! - Move the viewport on scroll input, refreshing the follow state
//! - Apply the queued follow action after layout (jump or animate to end)
//!
//! ## Architecture
//!
//! `MessageList` is a transient component (created each frame) that wraps
//! `&'a mut MessageListState` (persistent state) and the `MessageStore`
//! (props). The follow decision itself lives in `core::scroll::AutoFollow`;
//! this component only supplies geometry and carries out the decision.
//!
//! Only the message viewport is ever scrolled here.

use log::debug;
use ratatui::Frame;
use ratatui::layout::{Alignment, Position, Rect, Size};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::Paragraph;
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::message::Message;
use crate::core::scroll::{AutoFollow, FollowAction, ScrollFollowPolicy, Viewport};
use crate::core::store::MessageStore;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::MessageView;
use crate::tui::event::TuiEvent;

/// Frames a follow animation takes to reach the end.
pub const ANIMATION_FRAMES: u8 = 4;

const EMPTY_ROOM_TEXT: &str = "No messages yet";

#[derive(Debug, Clone, Copy)]
struct FollowAnimation {
    frames_left: u8,
}

/// Scroll and layout state for the message list.
/// Must be persisted in the parent TuiState.
pub struct MessageListState {
    pub scroll_state: ScrollViewState,
    pub follow: AutoFollow,
    /// Content below the viewport that the reader has not scrolled to
    pub has_unseen_content: bool,
    layout: LayoutCache,
    viewport_height: u16,
    animation: Option<FollowAnimation>,
}

impl MessageListState {
    /// `follow_threshold` is in rows.
    pub fn new(follow_threshold: u16) -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            follow: AutoFollow::new(ScrollFollowPolicy::new(f64::from(follow_threshold))),
            has_unseen_content: false,
            layout: LayoutCache::default(),
            viewport_height: 0,
            animation: None,
        }
    }

    /// Forget the previous room: layout, scroll position and follow state.
    pub fn reset(&mut self) {
        self.scroll_state = ScrollViewState::default();
        self.follow.reset();
        self.has_unseen_content = false;
        self.layout = LayoutCache::default();
        self.animation = None;
    }

    /// True while a follow animation still has frames to draw.
    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    pub fn offset_y(&self) -> u16 {
        self.scroll_state.offset().y
    }

    fn max_offset(&self) -> u16 {
        self.layout.total_height().saturating_sub(self.viewport_height)
    }

    fn set_offset_y(&mut self, y: u16) {
        let y = y.min(self.max_offset());
        self.scroll_state.set_offset(Position { x: 0, y });
    }

    /// Recompute `ScrollState` from the current geometry.
    fn refresh_follow_state(&mut self) {
        let viewport = Viewport::new(
            f64::from(self.offset_y()),
            f64::from(self.layout.total_height()),
            f64::from(self.viewport_height),
        );
        self.follow.on_scroll(viewport);
    }

    fn scroll_by(&mut self, delta: i32) {
        self.animation = None;
        let target = (i32::from(self.offset_y()) + delta).clamp(0, i32::from(self.max_offset()));
        self.set_offset_y(target as u16);
        self.refresh_follow_state();
    }

    pub fn scroll_to_bottom(&mut self) {
        self.animation = None;
        self.set_offset_y(self.max_offset());
        self.refresh_follow_state();
    }

    fn page_size(&self) -> i32 {
        i32::from(self.viewport_height.saturating_sub(1).max(1))
    }

    /// Carry out the queued follow action, then advance any running animation.
    fn apply_follow(&mut self) {
        match self.follow.take_pending() {
            Some(FollowAction::JumpToEnd) => self.scroll_to_bottom(),
            Some(FollowAction::AnimateToEnd) => {
                self.animation = Some(FollowAnimation {
                    frames_left: ANIMATION_FRAMES,
                });
            }
            None => {}
        }

        let Some(animation) = self.animation else {
            return;
        };
        let target = self.max_offset();
        let current = self.offset_y();
        if current >= target || animation.frames_left <= 1 {
            self.scroll_to_bottom();
            return;
        }

        let step = (target - current).div_ceil(u16::from(animation.frames_left));
        self.set_offset_y(current + step);
        self.animation = Some(FollowAnimation {
            frames_left: animation.frames_left - 1,
        });
    }
}

/// Scrollable message view.
/// Created fresh each frame with references to state and data.
pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub store: &'a MessageStore,
    /// Local user, whose messages are labelled "You"
    pub username: &'a str,
}

impl<'a> MessageList<'a> {
    pub fn new(state: &'a mut MessageListState, store: &'a MessageStore, username: &'a str) -> Self {
        Self {
            state,
            store,
            username,
        }
    }
}

impl<'a> Component for MessageList<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let messages = self.store.snapshot();
        let content_width = area.width.saturating_sub(1); // -1 for scrollbar

        // 1. Layout
        self.state.viewport_height = area.height;
        self.state
            .layout
            .update(messages, content_width, self.store.snapshot_revision());

        // 2. Follow decision, now that the new content is measured
        self.state.follow.observe(self.store);
        let clamped = self.state.offset_y().min(self.state.max_offset());
        self.state.set_offset_y(clamped);
        self.state.apply_follow();

        if messages.is_empty() {
            self.state.has_unseen_content = false;
            let empty = Paragraph::new(EMPTY_ROOM_TEXT)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC));
            let y = area.y + area.height / 2;
            frame.render_widget(empty, Rect::new(area.x, y, area.width, 1.min(area.height)));
            return;
        }

        // 3. Render visible messages into a ScrollView
        let layout = &self.state.layout;
        let offset = self.state.offset_y();
        let visible = layout.visible_range(offset, area.height);

        let mut scroll_view = ScrollView::new(Size::new(content_width, layout.total_height()))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Always)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let mut y_offset = layout.top_of(visible.start);
        for i in visible {
            let height = layout.heights[i];
            let rect = Rect::new(0, y_offset, content_width, height);
            scroll_view.render_widget(MessageView::new(&messages[i], self.username), rect);
            y_offset = y_offset.saturating_add(height);
        }

        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);

        self.state.has_unseen_content =
            self.state.animation.is_none() && self.state.offset_y() < self.state.max_offset();
    }
}

/// Implemented on the state: scroll input has to outlive the per-frame `MessageList`.
impl EventHandler for MessageListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp | TuiEvent::CursorUp => self.scroll_by(-1),
            TuiEvent::ScrollDown | TuiEvent::CursorDown => self.scroll_by(1),
            TuiEvent::ScrollPageUp => self.scroll_by(-self.page_size()),
            TuiEvent::ScrollPageDown => self.scroll_by(self.page_size()),
            TuiEvent::ScrollToBottom => self.scroll_to_bottom(),
            _ => {}
        }
        None
    }
}

/// Rows the scroll view can address.
const MAX_LAID_OUT_ROWS: u32 = u16::MAX as u32;

/// Cached message heights for one content width.
///
/// Live appends only measure the new tail; a new snapshot or a width change
/// measures everything again. Only the newest messages that fit in
/// `MAX_LAID_OUT_ROWS` are laid out; `first` is the oldest of them. Indices
/// passed in and out are store indices.
#[derive(Default)]
struct LayoutCache {
    heights: Vec<u16>,
    prefix_heights: Vec<u16>,
    first: usize,
    content_width: u16,
    snapshot_revision: u64,
}

impl LayoutCache {
    fn update(&mut self, messages: &[Message], content_width: u16, snapshot_revision: u64) {
        if self.content_width != content_width
            || self.snapshot_revision != snapshot_revision
            || messages.len() < self.heights.len()
        {
            self.heights.clear();
        }
        self.content_width = content_width;
        self.snapshot_revision = snapshot_revision;

        for message in messages.iter().skip(self.heights.len()) {
            self.heights
                .push(MessageView::calculate_height(message, content_width));
        }

        self.rebuild_window();
    }

    fn rebuild_window(&mut self) {
        let mut first = self.heights.len();
        let mut total = 0u32;
        while first > 0 {
            let height = u32::from(self.heights[first - 1]);
            if total + height > MAX_LAID_OUT_ROWS {
                break;
            }
            total += height;
            first -= 1;
        }
        if first > 0 && first != self.first {
            debug!(
                "Laying out the newest {} of {} messages",
                self.heights.len() - first,
                self.heights.len()
            );
        }
        self.first = first;

        self.prefix_heights = self.heights[first..]
            .iter()
            .scan(0u16, |acc, &h| {
                *acc = acc.saturating_add(h);
                Some(*acc)
            })
            .collect();
    }

    fn total_height(&self) -> u16 {
        self.prefix_heights.last().copied().unwrap_or(0)
    }

    fn top_of(&self, index: usize) -> u16 {
        if index <= self.first {
            0
        } else {
            self.prefix_heights[index - self.first - 1]
        }
    }

    /// Indices of messages overlapping the viewport, plus half a screen either side.
    fn visible_range(&self, scroll_offset: u16, viewport_height: u16) -> std::ops::Range<usize> {
        let buffer = viewport_height / 2;
        let buffered_start = scroll_offset.saturating_sub(buffer);
        let buffered_end = scroll_offset
            .saturating_add(viewport_height)
            .saturating_add(buffer);

        let start = self
            .prefix_heights
            .partition_point(|&end| end <= buffered_start);
        let end = self
            .prefix_heights
            .partition_point(|&end| end < buffered_end)
            .saturating_add(1)
            .min(self.prefix_heights.len());

        self.first + start..self.first + end
    }
}
