//! # Core Application Logic
//!
//! The conversation core: which room is active, what messages it holds,
//! whether the live connection is up, and whether the view should follow
//! new content. It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • ConversationSession  │
//!                    │  • MessageStore         │
//!                    │  • ConnectionManager    │
//!                    │  • ScrollFollowPolicy   │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │    TUI     │      │    API     │      │ Transport  │
//!     │ (ratatui)  │      │  (REST)    │      │ (WebSocket)│
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`session`]: `ConversationSession`, the per-room orchestrator
//! - [`store`]: `MessageStore`, ordered and deduplicated by id
//! - [`connection`]: `ConnectionManager` and its state machine
//! - [`scroll`]: the follow-the-bottom decision
//! - [`event`]: async completions routed back to the session owner
//! - [`message`]: the `Message` type and wire normalisation helpers
//! - [`config`]: settings and their override hierarchy

pub mod config;
pub mod connection;
pub mod event;
pub mod message;
pub mod scroll;
pub mod session;
pub mod store;

pub use connection::ConnectionState;
pub use event::SessionEvent;
pub use message::Message;
pub use session::{ConversationSession, Notice, SendOutcome, SessionPhase};
pub use store::MessageStore;
