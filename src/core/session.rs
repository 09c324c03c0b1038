//! # Conversation Session
//!
//! Binds one active room to its `MessageStore` and `ConnectionManager`.
//!
//! ```text
//!        select_room           history resolved
//! Idle ──────────────▶ Loading ───────────────▶ Live ◀──────────┐
//!                        ▲                        │  reconnect   │
//!                        │ select_room            ▼              │
//!                        └──────────────── Reconnecting ────────┘
//!                                                      history resolved
//! any ── leave ──▶ Closed   (terminal)
//! ```
//!
//! The session is owned by one task and never shared. History fetches and
//! the socket pump run elsewhere and report back as `SessionEvent`s, which
//! the owner passes to [`ConversationSession::apply`]. Each room selection
//! gets a fresh [`Ticket`]; a history result whose ticket is not the current
//! one belongs to a room the user already left and is discarded.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info, warn};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::AbortHandle;

use crate::api::{HistorySource, OutboundFrame};
use crate::core::connection::{ConnectionManager, ConnectionState};
use crate::core::event::{SessionEvent, Ticket};
use crate::core::message::Message;
use crate::core::store::{AppendOutcome, MessageStore};
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Loading,
    Live,
    Reconnecting,
    Closed,
}

/// Things the host should surface. Drained with [`ConversationSession::drain_notices`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// History could not be fetched; the room stays usable.
    HistoryUnavailable { room: String, reason: String },
    /// The session left its room; the host should clear its active room.
    RoomLeft { room: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    /// Empty or whitespace-only text. Nothing was sent.
    Blank,
    /// No open connection to send on.
    NotConnected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The session was left and accepts no further work.
    Closed,
    InvalidRoom,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Closed => write!(f, "session is closed"),
            SessionError::InvalidRoom => write!(f, "room name must not be empty"),
        }
    }
}

impl std::error::Error for SessionError {}

static NEXT_EPOCH: AtomicU64 = AtomicU64::new(1);

/// Epochs are process-wide so a replacement session never issues a ticket
/// equal to one its predecessor left in flight.
fn next_epoch() -> u64 {
    NEXT_EPOCH.fetch_add(1, Ordering::Relaxed)
}

pub struct ConversationSession {
    username: String,
    history: Arc<dyn HistorySource>,
    transport: Arc<dyn Transport>,
    events: UnboundedSender<SessionEvent>,
    phase: SessionPhase,
    ticket: Option<Ticket>,
    store: MessageStore,
    connection: ConnectionManager,
    pending_fetches: Vec<AbortHandle>,
    notices: VecDeque<Notice>,
}

impl ConversationSession {
    pub fn new(
        username: impl Into<String>,
        history: Arc<dyn HistorySource>,
        transport: Arc<dyn Transport>,
        events: UnboundedSender<SessionEvent>,
    ) -> Self {
        let connection = ConnectionManager::new(transport.clone(), events.clone());
        Self {
            username: username.into(),
            history,
            transport,
            events,
            phase: SessionPhase::Idle,
            ticket: None,
            store: MessageStore::new(),
            connection,
            pending_fetches: Vec::new(),
            notices: VecDeque::new(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn room(&self) -> Option<&str> {
        self.ticket.as_ref().map(|t| t.room.as_str())
    }

    /// The ticket async results must carry to be applied.
    pub fn ticket(&self) -> Option<&Ticket> {
        self.ticket.as_ref()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn messages(&self) -> &[Message] {
        self.store.snapshot()
    }

    /// Switch to `room`: drop everything about the previous room, fetch
    /// history, and open the connection once history has resolved.
    pub fn select_room(&mut self, room: &str) -> Result<(), SessionError> {
        if self.phase == SessionPhase::Closed {
            return Err(SessionError::Closed);
        }
        let room = room.trim();
        if room.is_empty() {
            return Err(SessionError::InvalidRoom);
        }

        info!("Selecting room {}", room);
        self.cancel_fetches();
        self.connection.close();
        self.connection = ConnectionManager::new(self.transport.clone(), self.events.clone());
        self.store = MessageStore::new();

        let ticket = Ticket {
            room: room.to_string(),
            epoch: next_epoch(),
        };
        self.ticket = Some(ticket.clone());
        self.phase = SessionPhase::Loading;
        self.spawn_history(ticket);
        Ok(())
    }

    /// Reopen the connection and, independently, reload history.
    ///
    /// Returns `false` when there is no room to reconnect to.
    pub fn reconnect(&mut self) -> bool {
        if matches!(self.phase, SessionPhase::Idle | SessionPhase::Closed) {
            return false;
        }
        let Some(room) = self.ticket.as_ref().map(|t| t.room.clone()) else {
            return false;
        };
        // A history result from before the reconnect must not count as the reload.
        let ticket = Ticket {
            room,
            epoch: next_epoch(),
        };
        self.ticket = Some(ticket.clone());

        info!("Reconnecting to room {}", ticket.room);
        self.phase = SessionPhase::Reconnecting;
        self.connection.open(&ticket.room);
        self.cancel_fetches();
        self.spawn_history(ticket);
        true
    }

    /// Send `text` to the room as this session's user.
    ///
    /// Blank input is rejected before touching the connection. The text is
    /// trimmed before sending.
    pub fn send_message(&self, text: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::Blank;
        }
        if self.phase == SessionPhase::Closed || self.ticket.is_none() {
            return SendOutcome::NotConnected;
        }

        let frame = OutboundFrame::ChatMessage {
            message: text.to_string(),
            username: self.username.clone(),
        };
        if self.connection.send(&frame) {
            SendOutcome::Sent
        } else {
            SendOutcome::NotConnected
        }
    }

    /// Close the connection and give up the room. Terminal.
    pub fn leave(&mut self) {
        if self.phase == SessionPhase::Closed {
            return;
        }

        self.cancel_fetches();
        self.connection.close();
        if let Some(ticket) = self.ticket.take() {
            info!("Leaving room {}", ticket.room);
            self.notices.push_back(Notice::RoomLeft { room: ticket.room });
        }
        self.phase = SessionPhase::Closed;
    }

    /// Apply an async completion. Returns `true` if anything visible changed.
    pub fn apply(&mut self, event: SessionEvent) -> bool {
        if self.phase == SessionPhase::Closed {
            debug!("Session closed, dropping {:?}", event);
            return false;
        }

        match event {
            SessionEvent::HistoryLoaded { ticket, result } => {
                if self.ticket.as_ref() != Some(&ticket) {
                    debug!(
                        "Discarding stale history for room {} (epoch {})",
                        ticket.room, ticket.epoch
                    );
                    return false;
                }

                match result {
                    Ok(messages) => {
                        info!("Loaded {} messages for room {}", messages.len(), ticket.room);
                        self.store.load_snapshot(messages);
                    }
                    Err(e) => {
                        warn!("History for room {} unavailable: {}", ticket.room, e);
                        self.notices.push_back(Notice::HistoryUnavailable {
                            room: ticket.room.clone(),
                            reason: e.to_string(),
                        });
                    }
                }

                if self.phase == SessionPhase::Loading {
                    self.connection.open(&ticket.room);
                }
                self.phase = SessionPhase::Live;
                true
            }
            SessionEvent::Connection(event) => {
                let before = self.connection.state();
                let mut changed = false;
                if let Some(message) = self.connection.handle(event) {
                    changed = self.store.append_live(message) == AppendOutcome::Inserted;
                }
                changed || before != self.connection.state()
            }
        }
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    fn spawn_history(&mut self, ticket: Ticket) {
        let history = self.history.clone();
        let events = self.events.clone();
        let handle = tokio::spawn(async move {
            let result = history.fetch_history(&ticket.room).await;
            if events
                .send(SessionEvent::HistoryLoaded { ticket, result })
                .is_err()
            {
                debug!("History resolved after the session owner went away");
            }
        });

        self.pending_fetches.retain(|h| !h.is_finished());
        self.pending_fetches.push(handle.abort_handle());
    }

    fn cancel_fetches(&mut self) {
        for handle in self.pending_fetches.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for ConversationSession {
    fn drop(&mut self) {
        self.cancel_fetches();
    }
}
