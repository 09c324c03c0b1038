use ratatui::Frame;
use ratatui::layout::Rect;

use super::event::TuiEvent;

/// A renderable piece of the chat screen.
///
/// Components are built each frame from borrowed props and persistent state.
/// `render` takes `&mut self` so a component can refresh caches (message
/// heights) and presentation state (scroll offset, follow animation) while
/// drawing, the same way a ratatui `StatefulWidget` does.
pub trait Component {
    fn render(&mut self, frame: &mut Frame, area: Rect);
}

/// A component that consumes terminal events.
pub trait EventHandler {
    /// What the component reports back to the run loop.
    type Event;

    /// Handle a `TuiEvent`, optionally producing a higher-level event.
    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event>;
}
