//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the chat, and
//! translates keyboard events into session operations.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Event Flow
//!
//! ```text
//! terminal ──poll──▶ TuiEvent ──▶ ChatApp::handle_event ──▶ ConversationSession
//!                                                                │ spawns
//! history task / socket pump ──SessionEvent──▶ ChatApp ◀─────────┘
//! directory task ──DirectorySnapshot──▶ ChatApp
//! ```
//!
//! Background tasks only send on channels; the run loop drains them between
//! frames, so the session is only ever touched from this thread.
//!
//! ## Redraw Strategy
//!
//! Draws only when something changed, or every ~40ms while a follow
//! animation is running. Idle polls wake every 100ms to pick up network
//! events.

mod component;
mod components;
mod event;
mod ui;

use log::{info, warn};
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;

use crossterm::cursor::{SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::api::{ConversationDirectory, HistorySource};
use crate::core::config::ResolvedConfig;
use crate::core::event::SessionEvent;
use crate::core::session::{ConversationSession, Notice, SendOutcome, SessionPhase};
use crate::transport::Transport;
use crate::tui::component::EventHandler;
use crate::tui::components::{
    DirectorySnapshot, InputBox, InputEvent, MessageListState, RoomPickerEvent, RoomPickerState,
};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

const ANIMATION_TICK: Duration = Duration::from_millis(40);
const IDLE_TICK: Duration = Duration::from_millis(100);

/// The collaborators a chat session talks to.
pub struct Backends {
    pub history: Arc<dyn HistorySource>,
    pub directory: Arc<dyn ConversationDirectory>,
    pub transport: Arc<dyn Transport>,
}

/// TUI-specific presentation state (not part of the conversation core)
pub struct TuiState {
    pub message_list: MessageListState,
    pub input_box: InputBox,
    /// Room picker overlay (None = hidden)
    pub room_picker: Option<RoomPickerState>,
    /// Transient status line shown in the title bar
    pub status_message: String,
}

impl TuiState {
    pub fn new(follow_threshold: u16) -> Self {
        Self {
            message_list: MessageListState::new(follow_threshold),
            input_box: InputBox::new(),
            room_picker: None,
            status_message: String::new(),
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock, // Non-blinking: draw() resets the blink timer
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, steady block cursor)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), DisableMouseCapture, DisableBracketedPaste);
    }
}

/// The session, its presentation state, and the channels feeding both.
struct ChatApp {
    config: ResolvedConfig,
    backends: Backends,
    session: ConversationSession,
    tui: TuiState,
    session_tx: UnboundedSender<SessionEvent>,
    session_rx: UnboundedReceiver<SessionEvent>,
    directory_tx: UnboundedSender<DirectorySnapshot>,
    directory_rx: UnboundedReceiver<DirectorySnapshot>,
}

impl ChatApp {
    fn new(config: ResolvedConfig, backends: Backends) -> Self {
        let (session_tx, session_rx) = mpsc::unbounded_channel();
        let (directory_tx, directory_rx) = mpsc::unbounded_channel();
        let session = ConversationSession::new(
            config.username.clone(),
            backends.history.clone(),
            backends.transport.clone(),
            session_tx.clone(),
        );
        let tui = TuiState::new(config.follow_threshold);
        Self {
            config,
            backends,
            session,
            tui,
            session_tx,
            session_rx,
            directory_tx,
            directory_rx,
        }
    }

    /// Join the configured room, or ask which one.
    fn start(&mut self) {
        match self.config.default_room.clone() {
            Some(room) => self.join_room(&room),
            None => self.open_room_picker(false),
        }
    }

    fn new_session(&self) -> ConversationSession {
        ConversationSession::new(
            self.config.username.clone(),
            self.backends.history.clone(),
            self.backends.transport.clone(),
            self.session_tx.clone(),
        )
    }

    fn join_room(&mut self, room: &str) {
        if self.session.phase() == SessionPhase::Closed {
            self.session = self.new_session();
        }
        match self.session.select_room(room) {
            Ok(()) => {
                self.tui.message_list.reset();
                self.tui.room_picker = None;
                self.tui.status_message.clear();
            }
            Err(e) => {
                warn!("Cannot join room {:?}: {}", room, e);
                self.tui.status_message = e.to_string();
            }
        }
    }

    fn open_room_picker(&mut self, dismissible: bool) {
        self.tui.room_picker = Some(RoomPickerState::new(dismissible));
        self.refresh_directory();
    }

    fn refresh_directory(&self) {
        let directory = self.backends.directory.clone();
        let tx = self.directory_tx.clone();
        tokio::spawn(async move {
            let (conversations, stats) =
                tokio::join!(directory.list_conversations(), directory.dashboard_stats());
            if let Err(e) = &conversations {
                warn!("Failed to list conversations: {}", e);
            }
            if tx.send(DirectorySnapshot { conversations, stats }).is_err() {
                warn!("Failed to deliver directory listing: receiver dropped");
            }
        });
    }

    fn send(&mut self, text: String) {
        match self.session.send_message(&text) {
            SendOutcome::Sent => self.tui.status_message.clear(),
            SendOutcome::Blank => {}
            SendOutcome::NotConnected => {
                self.tui.status_message = "Not connected, message not sent".to_string();
                self.tui.input_box.set_text(&text);
            }
        }
    }

    fn on_session_event(&mut self, event: SessionEvent) {
        self.session.apply(event);
        self.process_notices();
    }

    fn on_directory(&mut self, snapshot: DirectorySnapshot) {
        if let Some(picker) = self.tui.room_picker.as_mut() {
            picker.apply_snapshot(snapshot);
        }
    }

    fn process_notices(&mut self) {
        for notice in self.session.drain_notices() {
            match notice {
                Notice::HistoryUnavailable { room, reason } => {
                    self.tui.status_message = format!("History for #{room} unavailable: {reason}");
                }
                Notice::RoomLeft { room } => {
                    self.session = self.new_session();
                    self.tui.message_list.reset();
                    self.tui.input_box.clear();
                    self.tui.status_message = format!("Left #{room}");
                    self.open_room_picker(false);
                }
            }
        }
    }

    /// Apply everything background tasks reported since the last frame.
    /// Returns `true` if anything arrived.
    fn drain_background(&mut self) -> bool {
        let mut received = false;
        while let Ok(event) = self.session_rx.try_recv() {
            self.on_session_event(event);
            received = true;
        }
        while let Ok(snapshot) = self.directory_rx.try_recv() {
            self.on_directory(snapshot);
            received = true;
        }
        received
    }

    /// Returns `true` when the app should quit.
    fn handle_event(&mut self, event: TuiEvent) -> bool {
        match event {
            TuiEvent::ForceQuit => return true,
            TuiEvent::Resize => return false,
            TuiEvent::OpenRoomPicker => {
                let dismissible = self.session.room().is_some();
                self.open_room_picker(dismissible);
                return false;
            }
            _ => {}
        }

        // When the room picker is open, route all events to it
        if let Some(picker) = self.tui.room_picker.as_mut() {
            match picker.handle_event(&event) {
                Some(RoomPickerEvent::Join(room)) => self.join_room(&room),
                Some(RoomPickerEvent::Refresh) => self.refresh_directory(),
                Some(RoomPickerEvent::Dismiss) => self.tui.room_picker = None,
                None => {}
            }
            return false;
        }

        match event {
            TuiEvent::ScrollUp
            | TuiEvent::ScrollDown
            | TuiEvent::ScrollPageUp
            | TuiEvent::ScrollPageDown
            | TuiEvent::ScrollToBottom
            | TuiEvent::CursorUp
            | TuiEvent::CursorDown => {
                self.tui.message_list.handle_event(&event);
            }
            TuiEvent::CursorEnd if self.tui.input_box.is_empty() => {
                self.tui.message_list.scroll_to_bottom();
            }
            TuiEvent::Reconnect => {
                self.tui.status_message = if self.session.reconnect() {
                    "Reconnecting...".to_string()
                } else {
                    "No room to reconnect to".to_string()
                };
            }
            TuiEvent::Escape => {
                self.session.leave();
                self.process_notices();
            }
            _ => {
                if let Some(InputEvent::Submit(text)) = self.tui.input_box.handle_event(&event) {
                    self.send(text);
                }
            }
        }
        false
    }
}

pub fn run(config: ResolvedConfig, backends: Backends) -> std::io::Result<()> {
    info!("Starting chat as {} against {}", config.username, config.server_url);
    let mut app = ChatApp::new(config, backends);
    app.start();

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new()
        .inspect_err(|e| warn!("Failed to enable terminal modes: {}", e))
        .ok();

    let mut needs_redraw = true; // Force first frame

    loop {
        if app.drain_background() {
            needs_redraw = true;
        }

        let animating = app.tui.message_list.is_animating();
        if needs_redraw || animating {
            terminal.draw(|f| ui::draw_ui(f, &app.session, &mut app.tui))?;
            needs_redraw = false;
        }

        let timeout = if app.tui.message_list.is_animating() {
            ANIMATION_TICK
        } else {
            IDLE_TICK
        };
        let first_event = poll_event_timeout(timeout);
        if first_event.is_some() {
            needs_redraw = true;
        }

        // Process first event + drain ALL pending events before next draw
        let mut should_quit = false;
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            if app.handle_event(event) {
                should_quit = true;
                break;
            }
        }
        if should_quit {
            break;
        }
    }

    app.session.leave();
    ratatui::restore();
    info!("Chat closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Conversation;
    use crate::core::connection::ConnectionState;
    use crate::core::event::LinkEvent;
    use crate::test_support::{
        FakePeer, FakeTransport, StaticDirectory, StaticHistory, history_message, next_event,
    };

    fn config(default_room: Option<&str>) -> ResolvedConfig {
        ResolvedConfig {
            server_url: "http://localhost:8000".to_string(),
            ws_url: None,
            request_timeout: Duration::from_secs(10),
            username: "ann".to_string(),
            default_room: default_room.map(str::to_string),
            follow_threshold: 3,
        }
    }

    fn conversation(name: &str) -> Conversation {
        Conversation {
            id: None,
            name: name.to_string(),
            message_count: 0,
            participants: Vec::new(),
            last_message: None,
            updated_at: None,
            created_at: None,
        }
    }

    fn app(
        default_room: Option<&str>,
        history: StaticHistory,
    ) -> (ChatApp, Arc<FakeTransport>, UnboundedReceiver<FakePeer>) {
        let (transport, peers) = FakeTransport::new();
        let directory = StaticDirectory {
            conversations: vec![conversation("general"), conversation("random")],
            ..Default::default()
        };
        let backends = Backends {
            history: Arc::new(history),
            directory: Arc::new(directory),
            transport: transport.clone(),
        };
        let mut app = ChatApp::new(config(default_room), backends);
        app.start();
        (app, transport, peers)
    }

    async fn step(app: &mut ChatApp) {
        let event = next_event(&mut app.session_rx).await;
        app.on_session_event(event);
    }

    async fn directory(app: &mut ChatApp) {
        let snapshot = tokio::time::timeout(Duration::from_secs(2), app.directory_rx.recv())
            .await
            .unwrap()
            .unwrap();
        app.on_directory(snapshot);
    }

    fn type_text(app: &mut ChatApp, text: &str) {
        for c in text.chars() {
            app.handle_event(TuiEvent::InputChar(c));
        }
    }

    #[tokio::test]
    async fn test_default_room_joins_and_sends() {
        let history = StaticHistory::new().with_room("general", vec![history_message("1", "hi", "bob")]);
        let (mut app, _transport, mut peers) = app(Some("general"), history);
        assert!(app.tui.room_picker.is_none());

        step(&mut app).await;
        let mut peer = peers.recv().await.unwrap();
        step(&mut app).await;
        assert_eq!(app.session.connection_state(), ConnectionState::Connected);
        assert_eq!(app.session.messages().len(), 1);

        type_text(&mut app, "hello");
        app.handle_event(TuiEvent::Submit);
        let sent: serde_json::Value = serde_json::from_str(&peer.sent.recv().await.unwrap()).unwrap();
        assert_eq!(sent["message"], "hello");
        assert_eq!(sent["username"], "ann");
        assert!(app.tui.input_box.is_empty());
    }

    #[tokio::test]
    async fn test_no_default_room_opens_picker_and_joins() {
        let (mut app, _transport, _peers) = app(None, StaticHistory::new());
        let picker = app.tui.room_picker.as_ref().unwrap();
        assert!(!picker.dismissible);

        // Esc cannot dismiss without a room to return to
        app.handle_event(TuiEvent::Escape);
        assert!(app.tui.room_picker.is_some());

        directory(&mut app).await;
        app.handle_event(TuiEvent::CursorDown);
        app.handle_event(TuiEvent::Submit);
        assert!(app.tui.room_picker.is_none());
        assert_eq!(app.session.room(), Some("random"));
        assert_eq!(app.session.phase(), SessionPhase::Loading);
    }

    #[tokio::test]
    async fn test_picker_joins_room_by_name() {
        let (mut app, _transport, mut peers) = app(None, StaticHistory::new());
        directory(&mut app).await;

        type_text(&mut app, "brand-new");
        app.handle_event(TuiEvent::Submit);
        assert!(app.tui.room_picker.is_none());
        assert_eq!(app.session.room(), Some("brand-new"));

        step(&mut app).await;
        let peer = peers.recv().await.unwrap();
        assert_eq!(peer.room, "brand-new");
    }

    #[tokio::test]
    async fn test_escape_leaves_room_and_reopens_picker() {
        let (mut app, _transport, mut peers) = app(Some("general"), StaticHistory::new());
        step(&mut app).await;
        let mut peer = peers.recv().await.unwrap();
        step(&mut app).await;

        app.handle_event(TuiEvent::Escape);
        assert!(peer.sent.recv().await.is_none());
        assert_eq!(app.session.phase(), SessionPhase::Idle);
        assert_eq!(app.session.room(), None);
        assert_eq!(app.tui.status_message, "Left #general");
        let picker = app.tui.room_picker.as_ref().unwrap();
        assert!(!picker.dismissible);

        directory(&mut app).await;
        assert_eq!(app.tui.room_picker.as_ref().unwrap().conversations.len(), 2);
    }

    #[tokio::test]
    async fn test_ctrl_o_picker_is_dismissible_in_room() {
        let (mut app, _transport, _peers) = app(Some("general"), StaticHistory::new());
        app.handle_event(TuiEvent::OpenRoomPicker);
        assert!(app.tui.room_picker.as_ref().unwrap().dismissible);

        app.handle_event(TuiEvent::Escape);
        assert!(app.tui.room_picker.is_none());
        assert_eq!(app.session.room(), Some("general"));
    }

    #[tokio::test]
    async fn test_unsent_message_is_restored() {
        let (mut app, transport, _peers) = app(None, StaticHistory::new());
        transport.refuse_connections(true);
        app.join_room("general");
        step(&mut app).await; // history
        let failed = next_event(&mut app.session_rx).await;
        assert!(matches!(
            &failed,
            SessionEvent::Connection(e) if matches!(e.event, LinkEvent::Failed(_))
        ));
        app.on_session_event(failed);
        assert_eq!(app.session.connection_state(), ConnectionState::Error);

        type_text(&mut app, "hi");
        app.handle_event(TuiEvent::Submit);
        assert_eq!(app.tui.input_box.buffer, "hi");
        assert!(app.tui.status_message.contains("Not connected"));
    }

    #[tokio::test]
    async fn test_history_failure_reaches_status_line() {
        let history = StaticHistory::new().failing(
            "general",
            crate::api::ApiError::Network("timed out".to_string()),
        );
        let (mut app, _transport, _peers) = app(Some("general"), history);
        step(&mut app).await;
        assert!(app.tui.status_message.contains("History for #general unavailable"));
        assert_eq!(app.session.phase(), SessionPhase::Live);
    }

    #[tokio::test]
    async fn test_reconnect_without_room() {
        let (mut app, _transport, _peers) = app(None, StaticHistory::new());
        app.tui.room_picker = None;
        app.handle_event(TuiEvent::Reconnect);
        assert_eq!(app.tui.status_message, "No room to reconnect to");
    }
}
