use chrono::{DateTime, Local, Utc};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget, Wrap};

use crate::core::message::Message;

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;

/// Label used for the local user's own messages.
pub const OWN_LABEL: &str = "You";

/// A single chat message: sender and local time on the border, content inside.
///
/// Transient: built each frame by `MessageList` for the visible messages only.
///
/// [`calculate_height`](Self::calculate_height) predicts the rendered height
/// with `textwrap` options that match ratatui's `Paragraph` wrapping, so the
/// list can lay out the scroll canvas without rendering anything.
#[derive(Clone, Copy)]
pub struct MessageView<'a> {
    pub message: &'a Message,
    /// Whether the local user sent this message.
    pub is_own: bool,
}

impl<'a> MessageView<'a> {
    pub fn new(message: &'a Message, username: &str) -> Self {
        Self {
            message,
            is_own: message.sender == username,
        }
    }

    /// Height in rows this message needs at `width`, borders included.
    pub fn calculate_height(message: &Message, width: u16) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            // Too narrow for borders and padding; still occupy a row.
            return 1;
        }

        let content = message.content.trim();
        if content.is_empty() {
            return VERTICAL_OVERHEAD;
        }

        let options = textwrap::Options::new(content_width as usize)
            .break_words(true)
            .word_separator(textwrap::WordSeparator::AsciiSpace);

        let lines = textwrap::wrap(content, options);
        (lines.len() as u16).max(1) + VERTICAL_OVERHEAD
    }

    fn sender_label(&self) -> &str {
        if self.is_own {
            OWN_LABEL
        } else {
            &self.message.sender
        }
    }

    fn accent(&self) -> Style {
        if self.is_own {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Blue)
        }
    }
}

/// Local wall-clock `HH:MM` for a message timestamp.
pub fn format_time(timestamp: &DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M").to_string()
}

impl<'a> Widget for MessageView<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let accent = self.accent();
        let border_style = accent.add_modifier(Modifier::DIM);

        let title = Line::from(vec![
            Span::styled(self.sender_label().to_string(), accent.add_modifier(Modifier::BOLD)),
            Span::styled(
                format!(" · {}", format_time(&self.message.timestamp)),
                Style::default().fg(Color::DarkGray),
            ),
        ]);

        let block = Block::bordered()
            .title(title)
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));

        let inner_area = block.inner(area);
        block.render(area, buf);

        Paragraph::new(self.message.content.trim())
            .wrap(Wrap { trim: true })
            .render(inner_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::history_message;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn render_text(message: &Message, username: &str, width: u16) -> String {
        let height = MessageView::calculate_height(message, width);
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|f| f.render_widget(MessageView::new(message, username), f.area()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    // ==========================================================================
    // calculate_height tests
    // ==========================================================================

    #[test]
    fn calculate_height_empty_content_returns_border_height() {
        let message = history_message("1", "", "bob");
        assert_eq!(MessageView::calculate_height(&message, 80), VERTICAL_OVERHEAD);
    }

    #[test]
    fn calculate_height_whitespace_only_treated_as_empty() {
        let message = history_message("1", "   \n\t  ", "bob");
        assert_eq!(MessageView::calculate_height(&message, 80), VERTICAL_OVERHEAD);
    }

    #[test]
    fn calculate_height_width_equals_overhead_returns_minimum() {
        let message = history_message("1", "Hello world", "bob");
        assert_eq!(MessageView::calculate_height(&message, HORIZONTAL_OVERHEAD), 1);
    }

    #[test]
    fn calculate_height_wraps_at_width_boundary() {
        // width 9 → content width 5: "Hello" | "world"
        let message = history_message("1", "Hello world", "bob");
        assert_eq!(
            MessageView::calculate_height(&message, 9),
            2 + VERTICAL_OVERHEAD
        );
    }

    #[test]
    fn calculate_height_breaks_long_words() {
        // width 8 → content width 4: "abcd" | "efgh" | "ij"
        let message = history_message("1", "abcdefghij", "bob");
        assert_eq!(
            MessageView::calculate_height(&message, 8),
            3 + VERTICAL_OVERHEAD
        );
    }

    // ==========================================================================
    // Rendering
    // ==========================================================================

    #[test]
    fn own_messages_are_labelled_you() {
        let message = history_message("1", "hello there", "ann");
        let text = render_text(&message, "ann", 40);
        assert!(text.contains("You"));
        assert!(!text.contains("ann"));
        assert!(text.contains("hello there"));
    }

    #[test]
    fn other_messages_show_sender_and_time() {
        let message = history_message("1", "hi", "bob");
        let text = render_text(&message, "ann", 40);
        assert!(text.contains("bob"));
        assert!(text.contains(&format_time(&message.timestamp)));
    }
}
