//! # Room Picker Component
//!
//! Full-screen overlay listing the server's conversations, with aggregate
//! stats in the header. Opened at start when no room is configured, with
//! Ctrl+O, and after leaving a room.
//!
//! A name row above the list joins any room by name, listed or not. Rooms
//! come into existence on their first message, so this is the only way to
//! start one from an empty server.
//!
//! Follows the persistent state + transient wrapper pattern:
//! - `RoomPickerState` lives in `TuiState`
//! - `RoomPicker` is created each frame with borrowed state

use chrono::{DateTime, Local};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Padding, Paragraph};
use unicode_width::UnicodeWidthStr;

use crate::api::{ApiError, Conversation, DashboardStats};
use crate::tui::component::EventHandler;
use crate::tui::event::TuiEvent;

/// What the directory fetch produced.
#[derive(Debug, Clone)]
pub struct DirectorySnapshot {
    pub conversations: Result<Vec<Conversation>, ApiError>,
    pub stats: Result<DashboardStats, ApiError>,
}

/// Persistent state for the room picker overlay.
pub struct RoomPickerState {
    pub conversations: Vec<Conversation>,
    pub stats: Option<DashboardStats>,
    pub error: Option<String>,
    pub loading: bool,
    /// Typed room name. Takes precedence over the list selection on Enter.
    pub name: String,
    /// Esc closes the picker only when there is a room to go back to.
    pub dismissible: bool,
    pub list_state: ListState,
}

impl RoomPickerState {
    pub fn new(dismissible: bool) -> Self {
        Self {
            conversations: Vec::new(),
            stats: None,
            error: None,
            loading: true,
            name: String::new(),
            dismissible,
            list_state: ListState::default(),
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.list_state.selected()
    }

    /// Replace the listing, keeping the selection on the same room if it still exists.
    pub fn apply_snapshot(&mut self, snapshot: DirectorySnapshot) {
        self.loading = false;
        let previous = self
            .selected()
            .and_then(|i| self.conversations.get(i))
            .map(|c| c.name.clone());

        match snapshot.conversations {
            Ok(conversations) => {
                self.conversations = conversations;
                self.error = None;
            }
            Err(e) => {
                self.error = Some(e.to_string());
            }
        }
        // Stats are decoration; keep the last good ones on failure.
        if let Ok(stats) = snapshot.stats {
            self.stats = Some(stats);
        }

        let index = previous
            .and_then(|name| self.conversations.iter().position(|c| c.name == name))
            .or(if self.conversations.is_empty() { None } else { Some(0) });
        self.list_state.select(index);
    }

    fn move_selection(&mut self, delta: isize) {
        if self.conversations.is_empty() {
            return;
        }
        let last = self.conversations.len() - 1;
        let current = self.selected().unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(last);
        self.list_state.select(Some(next));
    }
}

/// Events emitted by the room picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomPickerEvent {
    Join(String),
    Refresh,
    Dismiss,
}

impl EventHandler for RoomPickerState {
    type Event = RoomPickerEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::Escape if !self.name.is_empty() => {
                self.name.clear();
                None
            }
            TuiEvent::Escape if self.dismissible => Some(RoomPickerEvent::Dismiss),
            TuiEvent::InputChar(c) => {
                self.name.push(*c);
                None
            }
            TuiEvent::Paste(text) => {
                self.name.extend(text.chars().filter(|c| !c.is_control()));
                None
            }
            TuiEvent::Backspace => {
                self.name.pop();
                None
            }
            TuiEvent::Submit if !self.name.trim().is_empty() => {
                let name = self.name.trim().to_string();
                self.name.clear();
                Some(RoomPickerEvent::Join(name))
            }
            TuiEvent::CursorUp | TuiEvent::ScrollUp => {
                self.move_selection(-1);
                None
            }
            TuiEvent::CursorDown | TuiEvent::ScrollDown => {
                self.move_selection(1);
                None
            }
            TuiEvent::Submit => self
                .selected()
                .and_then(|i| self.conversations.get(i))
                .map(|c| RoomPickerEvent::Join(c.name.clone())),
            TuiEvent::Reconnect => {
                self.loading = true;
                Some(RoomPickerEvent::Refresh)
            }
            _ => None,
        }
    }
}

/// Transient render wrapper for the room picker overlay.
pub struct RoomPicker<'a> {
    state: &'a mut RoomPickerState,
}

impl<'a> RoomPicker<'a> {
    pub fn new(state: &'a mut RoomPickerState) -> Self {
        Self { state }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let overlay = centered_rect(80, 70, area);
        frame.render_widget(Clear, overlay);

        let help_text = if self.state.dismissible {
            " Enter Join  Ctrl+R Refresh  Esc Back "
        } else {
            " Enter Join  Ctrl+R Refresh  Ctrl+C Quit "
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Rooms ")
            .title_alignment(Alignment::Left)
            .title_bottom(Line::from(help_text).centered())
            .padding(Padding::horizontal(1));

        let inner = block.inner(overlay);
        frame.render_widget(block, overlay);

        let [header_area, name_area, list_area] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .areas(inner);
        frame.render_widget(Paragraph::new(self.header_line()), header_area);
        self.render_name_row(frame, name_area);

        if self.state.conversations.is_empty() {
            let text = if self.state.loading {
                "Loading conversations..."
            } else if self.state.error.is_some() {
                "Could not load conversations. Press Ctrl+R to retry."
            } else {
                "No conversations yet. Type a name and press Enter to start one."
            };
            let empty = Paragraph::new(text)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center);
            frame.render_widget(empty, list_area);
            return;
        }

        let selected = self.state.selected();
        let inner_width = list_area.width as usize;
        let items: Vec<ListItem> = self
            .state
            .conversations
            .iter()
            .enumerate()
            .map(|(i, conversation)| {
                let style = if Some(i) == selected {
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else {
                    Style::default().fg(Color::Gray)
                };
                ListItem::new(conversation_line(conversation, inner_width, style))
            })
            .collect();

        frame.render_stateful_widget(List::new(items), list_area, &mut self.state.list_state);
    }

    fn render_name_row(&self, frame: &mut Frame, area: Rect) {
        const PROMPT: &str = "Room name: #";
        let line = if self.state.name.is_empty() {
            Line::from(vec![
                Span::styled(PROMPT, Style::default().fg(Color::Green)),
                Span::styled(
                    "type to join or create",
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM),
                ),
            ])
        } else {
            Line::from(vec![
                Span::styled(PROMPT, Style::default().fg(Color::Green)),
                Span::raw(self.state.name.clone()),
            ])
        };
        frame.render_widget(Paragraph::new(line), area);

        if area.height > 0 && area.width > 0 {
            let column = PROMPT.width() + self.state.name.width();
            let x = area.x + (column as u16).min(area.width - 1);
            frame.set_cursor_position((x, area.y));
        }
    }

    fn header_line(&self) -> Line<'static> {
        let mut spans = Vec::new();
        if let Some(stats) = &self.state.stats {
            let users = stats
                .total_users
                .map(|n| n.to_string())
                .unwrap_or_else(|| "0".to_string());
            spans.push(Span::styled(
                format!(
                    "{} conversations · {} messages · {} users",
                    stats.total_conversations, stats.total_messages, users
                ),
                Style::default().fg(Color::Cyan),
            ));
        }
        if let Some(error) = &self.state.error {
            if !spans.is_empty() {
                spans.push(Span::raw("  "));
            }
            spans.push(Span::styled(error.clone(), Style::default().fg(Color::Red)));
        } else if self.state.loading && !self.state.conversations.is_empty() {
            spans.push(Span::styled("  refreshing...", Style::default().fg(Color::DarkGray)));
        }
        Line::from(spans)
    }
}

/// "name      12 msgs  3 people  Jan 15 10:30"
fn conversation_line(conversation: &Conversation, width: usize, style: Style) -> Line<'static> {
    let details = format!(
        "{} msgs  {} people  {}",
        conversation.message_count,
        conversation.participants.len(),
        format_updated(conversation.updated_at.as_deref()),
    );
    let name_width = width.saturating_sub(details.chars().count() + 2);
    let name = truncate_str(&format!("#{}", conversation.name), name_width);
    let padded_name = format!("{:<width$}", name, width = name_width);

    Line::from(vec![
        Span::styled(padded_name, style),
        Span::styled("  ", style),
        Span::styled(details, style),
    ])
}

/// Format an ISO-8601 timestamp as local "Jan 15 10:30". Blank if unparsable.
fn format_updated(raw: Option<&str>) -> String {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Local).format("%b %d %H:%M").to_string())
        .unwrap_or_default()
}

/// Truncate a string to fit within `max_width` chars, adding "..." if needed.
fn truncate_str(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else if max_width <= 3 {
        ".".repeat(max_width)
    } else {
        let kept: String = s.chars().take(max_width - 3).collect();
        format!("{kept}...")
    }
}

/// Compute a centered rect using percentage of the outer rect.
fn centered_rect(percent_x: u16, percent_y: u16, outer: Rect) -> Rect {
    let [_, center_v, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(outer);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(center_v);
    center
}
