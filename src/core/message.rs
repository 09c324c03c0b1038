//! # Messages
//!
//! The unit the rest of the core moves around. A `Message` is what the
//! store holds and the UI renders; a `LiveMessage` is what arrives on the
//! streaming connection before the store has decided on its identity.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, NaiveDateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

/// Where a message entered the store from. Diagnostics only, never rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    History,
    Live,
}

/// A chat message as held by the `MessageStore`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Server-assigned id, or a locally generated fallback (see [`fallback_id`]).
    pub id: String,
    pub content: String,
    /// Display name of the author.
    pub sender: String,
    pub timestamp: DateTime<Utc>,
    pub origin: Origin,
}

impl Message {
    /// Build a history message. Rows without an id get a fallback id.
    pub fn from_history(
        id: Option<String>,
        content: String,
        sender: String,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.unwrap_or_else(fallback_id),
            content,
            sender,
            timestamp,
            origin: Origin::History,
        }
    }
}

/// A message received on the live connection.
///
/// `id` is `None` when the frame carried no `message_id`; the store assigns
/// a fallback id on insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveMessage {
    pub id: Option<String>,
    pub content: String,
    pub sender: String,
    pub timestamp: DateTime<Utc>,
}

impl LiveMessage {
    pub(crate) fn into_message(self) -> Message {
        Message {
            id: self.id.unwrap_or_else(fallback_id),
            content: self.content,
            sender: self.sender,
            timestamp: self.timestamp,
            origin: Origin::Live,
        }
    }
}

/// Display name used when the server sent no sender at all.
pub const UNKNOWN_SENDER: &str = "User";

static FALLBACK_SEQ: AtomicU64 = AtomicU64::new(0);

/// Generate a local id for a message the server did not identify.
///
/// Unique within this process (millisecond clock plus a counter), but it can
/// never match a server id, so a message that later shows up again with its
/// real `message_id` will not be deduplicated against it. Real uniqueness
/// depends on the server sending `message_id` on every chat frame.
pub fn fallback_id() -> String {
    let seq = FALLBACK_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("local-{}-{}", Utc::now().timestamp_millis(), seq)
}

/// Parse a wire timestamp.
///
/// Accepts RFC3339 and offset-less ISO-8601 (read as UTC). Anything else,
/// including a missing value, is stamped with the current time.
pub fn parse_timestamp(raw: Option<&str>) -> DateTime<Utc> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Utc::now();
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&Utc);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.and_utc();
    }

    debug!("Unparsable timestamp {:?}, using arrival time", raw);
    Utc::now()
}
