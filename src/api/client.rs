//! reqwest-backed client for the chat backend's REST endpoints.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use url::Url;

use crate::api::endpoints::Endpoints;
use crate::api::source::{ApiError, ConversationDirectory, HistorySource};
use crate::api::types::{Conversation, DashboardStats, HistoryEntry};
use crate::core::message::Message;

pub struct HttpChatApi {
    endpoints: Endpoints,
    client: reqwest::Client,
}

impl HttpChatApi {
    pub fn new(endpoints: Endpoints, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;
        Ok(Self { endpoints, client })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("GET {} failed: {} - {}", url, status, body);
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| ApiError::Parse(e.to_string()))
    }
}

#[async_trait]
impl HistorySource for HttpChatApi {
    async fn fetch_history(&self, room: &str) -> Result<Vec<Message>, ApiError> {
        let entries: Vec<HistoryEntry> = self.get_json(self.endpoints.history(room)).await?;
        info!("Fetched {} history messages for room {}", entries.len(), room);
        Ok(entries.into_iter().map(Message::from).collect())
    }
}

#[async_trait]
impl ConversationDirectory for HttpChatApi {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        self.get_json(self.endpoints.conversations()).await
    }

    async fn conversation(&self, name: &str) -> Result<Conversation, ApiError> {
        self.get_json(self.endpoints.conversation(name)).await
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        self.get_json(self.endpoints.dashboard_stats()).await
    }
}
