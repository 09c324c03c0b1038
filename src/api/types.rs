//! Wire types for the chat backend: REST payloads and streaming frames.

use serde::{Deserialize, Serialize};

use crate::core::message::{LiveMessage, Message, UNKNOWN_SENDER, parse_timestamp};

// ============================================================================
// Identifiers
// ============================================================================

/// The backend emits database ids as numbers but nothing forbids strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum WireId {
    Number(i64),
    Text(String),
}

impl From<WireId> for String {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Number(n) => n.to_string(),
            WireId::Text(s) => s,
        }
    }
}

// ============================================================================
// History / Directory (REST)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserSummary {
    #[serde(default)]
    pub id: Option<WireId>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// One row of `GET /api/conversations/{room}/messages/`.
///
/// The author is either flattened (`username`) or nested (`sender.username`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub id: Option<WireId>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub sender: Option<UserSummary>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub read: Option<bool>,
}

impl HistoryEntry {
    pub fn sender_name(&self) -> String {
        self.username
            .clone()
            .or_else(|| self.sender.as_ref().and_then(|s| s.username.clone()))
            .unwrap_or_else(|| UNKNOWN_SENDER.to_string())
    }
}

impl From<HistoryEntry> for Message {
    fn from(entry: HistoryEntry) -> Self {
        let sender = entry.sender_name();
        let timestamp = parse_timestamp(entry.timestamp.as_deref());
        Message::from_history(entry.id.map(String::from), entry.content, sender, timestamp)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Conversation {
    #[serde(default)]
    pub id: Option<WireId>,
    pub name: String,
    #[serde(default)]
    pub message_count: u64,
    #[serde(default)]
    pub participants: Vec<UserSummary>,
    #[serde(default)]
    pub last_message: Option<HistoryEntry>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub total_conversations: u64,
    #[serde(default)]
    pub total_messages: u64,
    /// The backend aggregate yields `null` when there are no participants.
    #[serde(default)]
    pub total_users: Option<u64>,
    #[serde(default)]
    pub recent_conversations: Vec<Conversation>,
}

// ============================================================================
// Streaming frames
// ============================================================================

/// Frames received on the room socket, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum InboundFrame {
    #[serde(rename = "chat_message")]
    ChatMessage(ChatMessageFrame),
    /// `system_message`, typing, presence... anything the core does not interpret.
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatMessageFrame {
    #[serde(default)]
    pub message_id: Option<WireId>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl From<ChatMessageFrame> for LiveMessage {
    fn from(frame: ChatMessageFrame) -> Self {
        LiveMessage {
            id: frame.message_id.map(String::from),
            content: frame.message,
            sender: frame
                .username
                .unwrap_or_else(|| UNKNOWN_SENDER.to_string()),
            timestamp: parse_timestamp(frame.timestamp.as_deref()),
        }
    }
}

/// Frames this client sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum OutboundFrame {
    #[serde(rename = "chat_message")]
    ChatMessage { message: String, username: String },
}
