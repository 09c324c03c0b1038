//! # Streaming Transport
//!
//! The seam between the connection state machine and the network. A
//! `Transport` turns a room name into a `Link`: a pair of channels carrying
//! text frames out and transport results in.
//!
//! ```text
//! Link.outbound  ──String──▶  writer task  ──▶ socket
//! Link.inbound   ◀──Result──  reader task  ◀── socket
//! ```
//!
//! The inbound channel closing means the peer closed the connection.
//! Dropping `outbound` asks the transport to close its side.

pub mod ws;

use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc;

pub use ws::WebSocketTransport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The room endpoint could not be built.
    Endpoint(String),
    /// Handshake or TCP connect failed.
    Connect(String),
    /// The established connection broke.
    Io(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Endpoint(msg) => write!(f, "endpoint error: {msg}"),
            TransportError::Connect(msg) => write!(f, "connect failed: {msg}"),
            TransportError::Io(msg) => write!(f, "connection error: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// An established connection, split into its two directions.
pub struct Link {
    pub outbound: mpsc::UnboundedSender<String>,
    pub inbound: mpsc::UnboundedReceiver<Result<String, TransportError>>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect to the room-scoped endpoint. Resolves once the handshake is done.
    async fn connect(&self, room: &str) -> Result<Link, TransportError>;
}
