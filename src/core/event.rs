//! # Session Events
//!
//! Everything asynchronous that can happen to a session arrives as a
//! `SessionEvent` on one channel. Background tasks only ever *send*; the
//! single owner of the session applies events one at a time, so session
//! state is never touched concurrently.
//!
//! ```text
//! history task  ─┐
//!                ├──▶  mpsc  ──▶  ConversationSession::apply(event)
//! socket pump   ─┘
//! ```

use crate::api::ApiError;
use crate::core::message::Message;

/// Identifies the room selection an async result belongs to.
///
/// Every room selection takes a fresh epoch, so a result carrying an older
/// ticket is stale even if the room name matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub room: String,
    pub epoch: u64,
}

/// What a streaming connection reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Opened,
    Frame(String),
    Closed,
    Failed(String),
}

/// A `LinkEvent` tagged with the connection that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionEvent {
    pub connection: u64,
    pub event: LinkEvent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    HistoryLoaded {
        ticket: Ticket,
        result: Result<Vec<Message>, ApiError>,
    },
    Connection(ConnectionEvent),
}
