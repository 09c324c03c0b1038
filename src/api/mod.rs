pub mod client;
pub mod endpoints;
pub mod source;
pub mod types;

pub use client::HttpChatApi;
pub use endpoints::Endpoints;
pub use source::{ApiError, ConversationDirectory, HistorySource};
pub use types::{Conversation, DashboardStats, InboundFrame, OutboundFrame, UserSummary};
