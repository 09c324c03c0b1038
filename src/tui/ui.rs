use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};

use crate::core::session::ConversationSession;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{MessageList, RoomPicker, StatusIndicator, TitleBar};

pub fn draw_ui(frame: &mut Frame, session: &ConversationSession, tui: &mut TuiState) {
    use Constraint::{Length, Min};
    let layout = Layout::vertical([Length(1), Min(0), Length(3)]);
    let [title_area, main_area, input_area] = layout.areas(frame.area());

    // Messages first: the title bar reads the unseen-content flag it leaves behind.
    MessageList::new(&mut tui.message_list, session.store(), session.username())
        .render(frame, main_area);

    let mut title_bar = TitleBar {
        room: session.room().map(str::to_string),
        status: StatusIndicator::from_session(session.phase(), session.connection_state()),
        message_count: session.store().len(),
        status_message: tui.status_message.clone(),
        has_unseen_content: tui.message_list.has_unseen_content,
    };
    title_bar.render(frame, title_area);

    tui.input_box.room = session.room().map(str::to_string);
    tui.input_box.render(frame, input_area);

    if let Some(picker) = tui.room_picker.as_mut() {
        RoomPicker::new(picker).render(frame, frame.area());
    }
}
