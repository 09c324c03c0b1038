use std::fmt;

use async_trait::async_trait;

use crate::api::types::{Conversation, DashboardStats};
use crate::core::message::Message;

/// Errors from the REST collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Bad base URL or client setup. Not retryable.
    Config(String),
    /// Timeout, DNS, connection refused.
    Network(String),
    /// Non-success HTTP status.
    Api { status: u16, message: String },
    /// Body was not the expected JSON.
    Parse(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Config(msg) => write!(f, "config error: {msg}"),
            ApiError::Network(msg) => write!(f, "network error: {msg}"),
            ApiError::Api { status, message } => {
                write!(f, "API error (HTTP {status}): {message}")
            }
            ApiError::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Supplies the message history of a room.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Ordered history for `room`, oldest first.
    async fn fetch_history(&self, room: &str) -> Result<Vec<Message>, ApiError>;
}

/// Read-only view of the conversation directory and its statistics.
#[async_trait]
pub trait ConversationDirectory: Send + Sync {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError>;

    async fn conversation(&self, name: &str) -> Result<Conversation, ApiError>;

    async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError>;
}
