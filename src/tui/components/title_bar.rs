//! # TitleBar Component
//!
//! One-line status bar above the messages.
//!
//! ```text
//! Chatterbox #general | ● Connected | 42 messages | History unavailable | ↓ New
//! ```
//!
//! Stateless: every field is a prop supplied by the run loop, so the bar
//! can be rendered and tested without a session behind it.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::core::connection::ConnectionState;
use crate::core::session::SessionPhase;
use crate::tui::component::Component;

/// Connection indicator shown next to the room name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIndicator {
    Connected,
    Loading,
    Disconnected,
    Error,
}

impl StatusIndicator {
    pub fn from_session(phase: SessionPhase, connection: ConnectionState) -> Self {
        match connection {
            ConnectionState::Connected => StatusIndicator::Connected,
            ConnectionState::Error => StatusIndicator::Error,
            ConnectionState::Connecting => StatusIndicator::Loading,
            ConnectionState::Disconnected => match phase {
                SessionPhase::Loading | SessionPhase::Reconnecting => StatusIndicator::Loading,
                _ => StatusIndicator::Disconnected,
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusIndicator::Connected => "Connected",
            StatusIndicator::Loading => "Loading",
            StatusIndicator::Disconnected => "Disconnected",
            StatusIndicator::Error => "Error",
        }
    }

    fn color(&self) -> Color {
        match self {
            StatusIndicator::Connected => Color::Green,
            StatusIndicator::Loading => Color::Yellow,
            StatusIndicator::Disconnected => Color::DarkGray,
            StatusIndicator::Error => Color::Red,
        }
    }
}

pub struct TitleBar {
    /// Active room, `None` while no room is joined
    pub room: Option<String>,
    pub status: StatusIndicator,
    pub message_count: usize,
    /// Transient status line (errors, hints)
    pub status_message: String,
    /// Whether there's content below the current scroll position
    pub has_unseen_content: bool,
}

impl TitleBar {
    fn line(&self) -> Line<'_> {
        let separator = || Span::styled(" | ", Style::default().fg(Color::DarkGray));

        let mut spans = vec![Span::styled(
            "Chatterbox",
            Style::default().add_modifier(Modifier::BOLD),
        )];

        let Some(room) = &self.room else {
            spans.push(separator());
            spans.push(Span::raw("no room"));
            if !self.status_message.is_empty() {
                spans.push(separator());
                spans.push(Span::raw(self.status_message.as_str()));
            }
            return Line::from(spans);
        };

        spans.push(Span::styled(format!(" #{room}"), Style::default().fg(Color::Cyan)));
        spans.push(separator());
        spans.push(Span::styled(
            format!("● {}", self.status.label()),
            Style::default().fg(self.status.color()),
        ));
        spans.push(separator());
        spans.push(Span::raw(match self.message_count {
            1 => "1 message".to_string(),
            n => format!("{n} messages"),
        }));
        if !self.status_message.is_empty() {
            spans.push(separator());
            spans.push(Span::raw(self.status_message.as_str()));
        }
        if self.has_unseen_content {
            spans.push(separator());
            spans.push(Span::styled(
                "↓ New",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ));
        }
        Line::from(spans)
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(self.line(), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn render(mut title_bar: TitleBar) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 1)).unwrap();
        terminal
            .draw(|f| title_bar.render(f, f.area()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    fn bar(status: StatusIndicator) -> TitleBar {
        TitleBar {
            room: Some("general".to_string()),
            status,
            message_count: 2,
            status_message: String::new(),
            has_unseen_content: false,
        }
    }

    #[test]
    fn test_title_bar_shows_room_status_and_count() {
        let text = render(bar(StatusIndicator::Connected));
        assert!(text.contains("Chatterbox"));
        assert!(text.contains("#general"));
        assert!(text.contains("Connected"));
        assert!(text.contains("2 messages"));
        assert!(!text.contains("↓ New"));
    }

    #[test]
    fn test_title_bar_with_unseen_content_and_status_message() {
        let mut title_bar = bar(StatusIndicator::Error);
        title_bar.status_message = "History unavailable".to_string();
        title_bar.has_unseen_content = true;

        let text = render(title_bar);
        assert!(text.contains("Error"));
        assert!(text.contains("History unavailable"));
        assert!(text.contains("↓ New"));
    }

    #[test]
    fn test_title_bar_without_room() {
        let text = render(TitleBar {
            room: None,
            status: StatusIndicator::Disconnected,
            message_count: 0,
            status_message: String::new(),
            has_unseen_content: true,
        });
        assert!(text.contains("no room"));
        assert!(!text.contains("messages"));
        assert!(!text.contains("↓ New"));
    }

    #[test]
    fn test_status_indicator_mapping() {
        use ConnectionState as C;
        use SessionPhase as P;

        assert_eq!(StatusIndicator::from_session(P::Live, C::Connected), StatusIndicator::Connected);
        assert_eq!(StatusIndicator::from_session(P::Live, C::Error), StatusIndicator::Error);
        assert_eq!(StatusIndicator::from_session(P::Loading, C::Disconnected), StatusIndicator::Loading);
        assert_eq!(StatusIndicator::from_session(P::Live, C::Connecting), StatusIndicator::Loading);
        assert_eq!(StatusIndicator::from_session(P::Live, C::Disconnected), StatusIndicator::Disconnected);
    }
}
