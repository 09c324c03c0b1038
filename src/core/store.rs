//! # Message Store
//!
//! The ordered, deduplicated message sequence for the active room.
//!
//! ```text
//! load_snapshot([h1, h2])     →  [h1, h2]
//! append_live(l1)             →  [h1, h2, l1]       Inserted
//! append_live(l1 again)       →  [h1, h2, l1]       Ignored
//! ```
//!
//! Arrival order is display order. Nothing is ever re-sorted by timestamp.
//!
//! Every mutation bumps `revision`, which is how the render layer notices a
//! change without diffing the message list.

use std::collections::HashSet;

use log::debug;

use crate::core::message::{LiveMessage, Message};

/// Result of offering a live message to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Inserted,
    /// The id was already present; the store is unchanged.
    Ignored,
}

#[derive(Debug, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
    ids: HashSet<String>,
    revision: u64,
    snapshot_revision: u64,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole contents with a history snapshot.
    ///
    /// Duplicate ids inside the snapshot keep their first occurrence.
    pub fn load_snapshot(&mut self, messages: Vec<Message>) {
        self.messages.clear();
        self.ids.clear();

        for message in messages {
            if self.ids.insert(message.id.clone()) {
                self.messages.push(message);
            } else {
                debug!("Snapshot contained duplicate message id {}", message.id);
            }
        }

        self.revision += 1;
        self.snapshot_revision = self.revision;
    }

    /// Append a live message unless its id is already known.
    pub fn append_live(&mut self, message: LiveMessage) -> AppendOutcome {
        if let Some(id) = message.id.as_deref()
            && self.ids.contains(id)
        {
            debug!("Ignoring redelivered message {}", id);
            return AppendOutcome::Ignored;
        }

        let message = message.into_message();
        self.ids.insert(message.id.clone());
        self.messages.push(message);
        self.revision += 1;
        AppendOutcome::Inserted
    }

    /// Read-only view in display order.
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Monotonic counter bumped by every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The revision produced by the most recent `load_snapshot`.
    pub fn snapshot_revision(&self) -> u64 {
        self.snapshot_revision
    }
}
