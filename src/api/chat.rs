//! Chat widget backend

use crate::api::types::{ChatReply, ChatRequest};
use crate::error::{FintripError, Result};
use crate::http::ApiClient;
use std::sync::Arc;

/// Travel assistant chat endpoint
pub struct ChatApi {
    client: Arc<ApiClient>,
}

impl ChatApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Send one message and return the assistant's reply.
    pub async fn send(&self, text: &str) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            return Err(FintripError::Validation("Message cannot be empty".into()).into());
        }

        let reply: ChatReply = self
            .client
            .post_json("/chatbot/chat/", &ChatRequest { text })
            .await?;

        Ok(reply.response)
    }
}
