//! # InputBox Component
//!
//! One-row message composer.
//!
//! ## Responsibilities
//!
//! - Capture text input and paste, newlines included (Alt+Enter or
//!   Shift+Enter inserts one; shown as `↵` in the row)
//! - Handle editing (backspace, delete, cursor movement)
//! - Emit `Submit` on Enter; blank input is a no-op
//! - Scroll horizontally so the cursor stays visible
//!
//! The buffer and cursor are internal state. The room name is a prop.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Padding, Paragraph};
use unicode_width::UnicodeWidthChar;

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

/// Border (2) + padding (2) consumed horizontally
const HORIZONTAL_OVERHEAD: u16 = 4;
/// Offset from the area edge to the first content column
const CONTENT_OFFSET: u16 = 2;

const HELP_TEXT: &str =
    " Enter send · Alt+Enter newline · Ctrl+R reconnect · Esc leave · Ctrl+O rooms · Ctrl+C quit ";

/// Stand-in glyph for a newline in the single display row.
const NEWLINE_GLYPH: char = '↵';

/// High-level events emitted by the InputBox
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Non-blank text submitted with Enter. The buffer has been cleared.
    Submit(String),
    ContentChanged,
}

pub struct InputBox {
    /// Text buffer (Internal State)
    pub buffer: String,
    /// Active room (Prop)
    pub room: Option<String>,
    /// Byte offset of the cursor in `buffer`
    cursor: usize,
    /// First visible display column
    scroll: usize,
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            room: None,
            cursor: 0,
            scroll: 0,
        }
    }

    /// Replace the buffer, cursor at the end. Used to restore an unsent message.
    pub fn set_text(&mut self, text: &str) {
        self.buffer = text.to_string();
        self.cursor = self.buffer.len();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.scroll = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn insert_str(&mut self, text: &str) {
        self.buffer.insert_str(self.cursor, text);
        self.cursor += text.len();
    }

    fn prev_boundary(&self) -> usize {
        self.buffer[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    fn next_boundary(&self) -> usize {
        self.buffer[self.cursor..]
            .chars()
            .next()
            .map(|c| self.cursor + c.len_utf8())
            .unwrap_or(self.buffer.len())
    }

    /// Display column of the cursor.
    fn cursor_column(&self) -> usize {
        column_width(&self.buffer[..self.cursor])
    }

    /// Keep the cursor inside a window of `width` columns.
    fn update_scroll(&mut self, width: usize) {
        if width == 0 {
            self.scroll = 0;
            return;
        }
        let column = self.cursor_column();
        if column < self.scroll {
            self.scroll = column;
        } else if column >= self.scroll + width {
            self.scroll = column + 1 - width;
        }
    }

    /// The slice of the buffer visible from `self.scroll`, at most `width` columns.
    fn visible_text(&self, width: usize) -> String {
        let mut column = 0;
        let mut visible = String::new();
        for c in self.buffer.chars().map(display_char) {
            let w = c.width().unwrap_or(0);
            if column >= self.scroll {
                if column + w > self.scroll + width {
                    break;
                }
                visible.push(c);
            }
            column += w;
        }
        visible
    }
}

fn display_char(c: char) -> char {
    if c == '\n' { NEWLINE_GLYPH } else { c }
}

fn column_width(text: &str) -> usize {
    text.chars()
        .map(|c| display_char(c).width().unwrap_or(0))
        .sum()
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let width = area.width.saturating_sub(HORIZONTAL_OVERHEAD) as usize;
        self.update_scroll(width);

        let (title, style) = match &self.room {
            Some(room) => (format!(" Message #{room} "), Style::default().fg(Color::Green)),
            None => (
                " Join a room with Ctrl+O ".to_string(),
                Style::default().fg(Color::DarkGray),
            ),
        };

        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title(title)
            .title_bottom(
                Line::from(HELP_TEXT)
                    .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM))
                    .right_aligned(),
            )
            .padding(Padding::horizontal(1));

        let input = Paragraph::new(self.visible_text(width))
            .block(block)
            .style(style);
        frame.render_widget(input, area);

        if area.height > 2 && width > 0 {
            let x = area.x + CONTENT_OFFSET + (self.cursor_column() - self.scroll) as u16;
            frame.set_cursor_position((x, area.y + 1));
        }
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(c) => {
                let mut utf8 = [0u8; 4];
                self.insert_str(c.encode_utf8(&mut utf8));
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::InsertNewline => {
                self.insert_str("\n");
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Paste(text) => {
                let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
                self.insert_str(&normalized);
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Backspace => {
                if self.cursor == 0 {
                    return None;
                }
                let prev = self.prev_boundary();
                self.buffer.drain(prev..self.cursor);
                self.cursor = prev;
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Delete => {
                if self.cursor >= self.buffer.len() {
                    return None;
                }
                let next = self.next_boundary();
                self.buffer.drain(self.cursor..next);
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::CursorLeft => {
                (self.cursor > 0).then(|| {
                    self.cursor = self.prev_boundary();
                    InputEvent::ContentChanged
                })
            }
            TuiEvent::CursorRight => (self.cursor < self.buffer.len()).then(|| {
                self.cursor = self.next_boundary();
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorHome => (self.cursor != 0).then(|| {
                self.cursor = 0;
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorEnd => (self.cursor != self.buffer.len()).then(|| {
                self.cursor = self.buffer.len();
                InputEvent::ContentChanged
            }),
            TuiEvent::Submit => {
                if self.buffer.trim().is_empty() {
                    return None;
                }
                let text = std::mem::take(&mut self.buffer);
                self.clear();
                Some(InputEvent::Submit(text))
            }
            _ => None,
        }
    }
}
