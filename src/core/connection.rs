//! # Connection Manager
//!
//! Owns at most one streaming connection and the state machine around it.
//!
//! ```text
//!                  open                 Opened
//! Disconnected ───────────▶ Connecting ────────▶ Connected
//!      ▲                        │                    │
//!      │          Closed        │                    │
//!      └────────────────────────┴────────────────────┤
//!                               │     Failed         │
//!                               └──────────▶ Error ◀─┘
//! ```
//!
//! The socket itself lives in a spawned pump task. The pump never touches
//! manager state: it reports `LinkEvent`s on the session channel, tagged
//! with a connection id, and the owner feeds them back through
//! [`ConnectionManager::handle`]. Events from a connection that is no longer
//! the active one are dropped there.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::api::{InboundFrame, OutboundFrame};
use crate::core::event::{ConnectionEvent, LinkEvent, SessionEvent};
use crate::core::message::LiveMessage;
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl ConnectionState {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Connected => "Connected",
            ConnectionState::Error => "Error",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Ids are process-wide so a rebuilt manager never mistakes a predecessor's
/// late events for its own.
fn next_connection_id() -> u64 {
    NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed)
}

struct ActiveConnection {
    id: u64,
    room: String,
    outbound: UnboundedSender<String>,
    task: JoinHandle<()>,
}

pub struct ConnectionManager {
    transport: Arc<dyn Transport>,
    events: UnboundedSender<SessionEvent>,
    state: ConnectionState,
    active: Option<ActiveConnection>,
}

impl ConnectionManager {
    pub fn new(transport: Arc<dyn Transport>, events: UnboundedSender<SessionEvent>) -> Self {
        Self {
            transport,
            events,
            state: ConnectionState::Disconnected,
            active: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Id of the connection whose events are currently accepted.
    pub fn active_connection(&self) -> Option<u64> {
        self.active.as_ref().map(|a| a.id)
    }

    pub fn room(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.room.as_str())
    }

    /// Start connecting to `room`, closing any existing connection first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(&mut self, room: &str) {
        self.close();

        let id = next_connection_id();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(pump(
            id,
            room.to_string(),
            self.transport.clone(),
            outbound_rx,
            self.events.clone(),
        ));

        info!("Opening connection {} to room {}", id, room);
        self.state = ConnectionState::Connecting;
        self.active = Some(ActiveConnection {
            id,
            room: room.to_string(),
            outbound: outbound_tx,
            task,
        });
    }

    /// Send a frame. Returns `false` unless the connection is `Connected`.
    pub fn send(&self, frame: &OutboundFrame) -> bool {
        if self.state != ConnectionState::Connected {
            debug!("Send rejected: connection is {}", self.state);
            return false;
        }
        let Some(active) = &self.active else {
            return false;
        };

        match serde_json::to_string(frame) {
            Ok(text) => active.outbound.send(text).is_ok(),
            Err(e) => {
                warn!("Failed to encode outbound frame: {}", e);
                false
            }
        }
    }

    /// Tear down the connection. Safe to call in any state, any number of times.
    pub fn close(&mut self) {
        if let Some(active) = self.active.take() {
            info!("Closing connection {} to room {}", active.id, active.room);
            active.task.abort();
        }
        self.state = ConnectionState::Disconnected;
    }

    /// Apply an event reported by a pump task.
    ///
    /// Returns the chat message carried by the event, if any.
    pub fn handle(&mut self, event: ConnectionEvent) -> Option<LiveMessage> {
        let Some(active) = &self.active else {
            debug!("Ignoring event from closed connection {}", event.connection);
            return None;
        };
        if active.id != event.connection {
            debug!(
                "Ignoring event from stale connection {} (active {})",
                event.connection, active.id
            );
            return None;
        }

        match event.event {
            LinkEvent::Opened => {
                if self.state == ConnectionState::Connecting {
                    info!("Connection {} established", event.connection);
                    self.state = ConnectionState::Connected;
                }
                None
            }
            LinkEvent::Frame(text) => parse_frame(&text),
            LinkEvent::Closed => {
                info!("Connection {} closed by peer", event.connection);
                self.active = None;
                self.state = ConnectionState::Disconnected;
                None
            }
            LinkEvent::Failed(reason) => {
                warn!("Connection {} failed: {}", event.connection, reason);
                self.active = None;
                self.state = ConnectionState::Error;
                None
            }
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.close();
    }
}

/// Decode one inbound frame. Malformed frames are logged and dropped.
fn parse_frame(text: &str) -> Option<LiveMessage> {
    match serde_json::from_str::<InboundFrame>(text) {
        Ok(InboundFrame::ChatMessage(chat)) => Some(chat.into()),
        Ok(InboundFrame::Other) => {
            debug!("Ignoring non-chat frame");
            None
        }
        Err(e) => {
            let preview: String = text.chars().take(120).collect();
            warn!("Dropping malformed frame ({}): {}", e, preview);
            None
        }
    }
}

async fn pump(
    id: u64,
    room: String,
    transport: Arc<dyn Transport>,
    mut outbound: UnboundedReceiver<String>,
    events: UnboundedSender<SessionEvent>,
) {
    let emit = |event: LinkEvent| {
        events
            .send(SessionEvent::Connection(ConnectionEvent {
                connection: id,
                event,
            }))
            .is_ok()
    };

    let mut link = match transport.connect(&room).await {
        Ok(link) => link,
        Err(e) => {
            emit(LinkEvent::Failed(e.to_string()));
            return;
        }
    };
    if !emit(LinkEvent::Opened) {
        return;
    }

    loop {
        tokio::select! {
            frame = outbound.recv() => {
                let Some(text) = frame else {
                    return;
                };
                if link.outbound.send(text).is_err() {
                    warn!("Connection {} writer is gone, frame dropped", id);
                    emit(LinkEvent::Failed("writer closed".to_string()));
                    return;
                }
            }
            incoming = link.inbound.recv() => match incoming {
                Some(Ok(text)) => {
                    if !emit(LinkEvent::Frame(text)) {
                        return;
                    }
                }
                Some(Err(e)) => {
                    emit(LinkEvent::Failed(e.to_string()));
                    return;
                }
                None => {
                    emit(LinkEvent::Closed);
                    return;
                }
            },
        }
    }
}
