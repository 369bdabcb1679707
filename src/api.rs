use reqwest::Client;

use crate::message::Message;

/// Failure of a single transport attempt. Every call is best-effort: no
/// retry, no timeout tuning, no idempotency key.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server returned {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the full conversation, oldest message first.
    pub async fn fetch_messages(&self) -> Result<Vec<Message>, TransportError> {
        let url = format!("{}/api/messages", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(TransportError::Status(response.status()));
        }

        let messages: Vec<Message> = response.json().await?;
        Ok(messages)
    }

    /// Submit one message. The backend persists the submitted text as a user
    /// message and returns the assistant reply it generated; the user record
    /// only shows up on the next fetch.
    pub async fn submit_message(&self, text: &str) -> Result<Message, TransportError> {
        let url = format!("{}/api/messages", self.base_url);

        // The backend takes the raw text as a JSON string body.
        let response = self.client.post(&url).json(&text).send().await?;

        if !response.status().is_success() {
            return Err(TransportError::Status(response.status()));
        }

        let message: Message = response.json().await?;
        Ok(message)
    }

    /// One-shot connectivity probe against the backend's health endpoint.
    pub async fn health(&self) -> Result<(), TransportError> {
        let url = format!("{}/health", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(TransportError::Status(response.status()));
        }

        Ok(())
    }
}
