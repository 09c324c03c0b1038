//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::api::{ApiError, Conversation, ConversationDirectory, DashboardStats, HistorySource};
use crate::core::event::{ConnectionEvent, SessionEvent};
use crate::core::message::Message;
use crate::transport::{Link, Transport, TransportError};

const EVENT_TIMEOUT: Duration = Duration::from_secs(2);

/// A history message with a fixed timestamp.
pub fn history_message(id: &str, content: &str, sender: &str) -> Message {
    let timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap();
    Message::from_history(
        Some(id.to_string()),
        content.to_string(),
        sender.to_string(),
        timestamp,
    )
}

/// Next event on the session channel, or panic after a short wait.
pub async fn next_event(events: &mut UnboundedReceiver<SessionEvent>) -> SessionEvent {
    tokio::time::timeout(EVENT_TIMEOUT, events.recv())
        .await
        .expect("timed out waiting for a session event")
        .expect("session event channel closed")
}

/// Like [`next_event`], but the event must come from a connection.
pub async fn next_connection_event(
    events: &mut UnboundedReceiver<SessionEvent>,
) -> ConnectionEvent {
    match next_event(events).await {
        SessionEvent::Connection(event) => event,
        other => panic!("expected a connection event, got {:?}", other),
    }
}

// ============================================================================
// Transport
// ============================================================================

/// The server side of a fake connection.
///
/// Dropping the peer ends its inbound stream, which the client sees as the
/// server closing the connection.
pub struct FakePeer {
    pub room: String,
    /// Frames the client sent. Yields `None` once the client closed its side.
    pub sent: UnboundedReceiver<String>,
    inject: UnboundedSender<Result<String, TransportError>>,
}

impl FakePeer {
    pub fn push_raw(&self, text: &str) {
        let _ = self.inject.send(Ok(text.to_string()));
    }

    pub fn push_json(&self, value: serde_json::Value) {
        let _ = self.inject.send(Ok(value.to_string()));
    }

    pub fn fail(&self, reason: &str) {
        let _ = self.inject.send(Err(TransportError::Io(reason.to_string())));
    }
}

/// Hands every accepted connection to the test as a [`FakePeer`].
pub struct FakeTransport {
    peers: UnboundedSender<FakePeer>,
    refuse: AtomicBool,
    connects: AtomicUsize,
}

impl FakeTransport {
    pub fn new() -> (Arc<Self>, UnboundedReceiver<FakePeer>) {
        let (peers, rx) = mpsc::unbounded_channel();
        let transport = Arc::new(Self {
            peers,
            refuse: AtomicBool::new(false),
            connects: AtomicUsize::new(0),
        });
        (transport, rx)
    }

    pub fn refuse_connections(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Number of connection attempts, refused ones included.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn connect(&self, room: &str) -> Result<Link, TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.refuse.load(Ordering::SeqCst) {
            return Err(TransportError::Connect("connection refused".to_string()));
        }

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let _ = self.peers.send(FakePeer {
            room: room.to_string(),
            sent: outbound_rx,
            inject: inbound_tx,
        });

        Ok(Link {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}

// ============================================================================
// REST
// ============================================================================

/// In-memory history keyed by room. Unknown rooms have empty history.
#[derive(Default)]
pub struct StaticHistory {
    rooms: Mutex<HashMap<String, Result<Vec<Message>, ApiError>>>,
    calls: AtomicUsize,
}

impl StaticHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_room(self, room: &str, messages: Vec<Message>) -> Self {
        self.set(room, Ok(messages));
        self
    }

    pub fn failing(self, room: &str, error: ApiError) -> Self {
        self.set(room, Err(error));
        self
    }

    pub fn set(&self, room: &str, result: Result<Vec<Message>, ApiError>) {
        self.rooms
            .lock()
            .unwrap()
            .insert(room.to_string(), result);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HistorySource for StaticHistory {
    async fn fetch_history(&self, room: &str) -> Result<Vec<Message>, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.rooms
            .lock()
            .unwrap()
            .get(room)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Fixed conversation directory.
#[derive(Default)]
pub struct StaticDirectory {
    pub conversations: Vec<Conversation>,
    pub stats: DashboardStats,
}

#[async_trait]
impl ConversationDirectory for StaticDirectory {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        Ok(self.conversations.clone())
    }

    async fn conversation(&self, name: &str) -> Result<Conversation, ApiError> {
        self.conversations
            .iter()
            .find(|c| c.name == name)
            .cloned()
            .ok_or_else(|| ApiError::Api {
                status: 404,
                message: format!("no conversation named {name}"),
            })
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        Ok(self.stats.clone())
    }
}
