//! Outbound webhook sink.
//!
//! The sink is an opaque HTTP endpoint (an n8n workflow in practice). Its answer is relayed, not
//! interpreted: any status it returns is a [`SinkResponse`], and only a failure to reach it at all
//! is a [`SinkError`].

use crate::constants::RESPONSE_BODY_LIMIT;
use crate::error::SinkError;
use crate::event::CallStartEvent;
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tracing::{info, warn};

/// What the sink answered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SinkResponse {
    pub status: u16,
    pub ok: bool,
    /// Response text, cut to the relay limit.
    pub body: String,
}

impl SinkResponse {
    pub fn new(status: u16, body: &str) -> Self {
        Self {
            status,
            ok: (200..300).contains(&status),
            body: truncate_chars(body, RESPONSE_BODY_LIMIT),
        }
    }
}

/// Destination for start-call events.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver `event` once. No retry.
    async fn forward(&self, event: &CallStartEvent) -> Result<SinkResponse, SinkError>;
}

/// POSTs events as JSON to a fixed webhook URL.
#[derive(Clone, Debug)]
pub struct WebhookSink {
    http: HttpClient,
    url: String,
}

impl WebhookSink {
    pub fn new(http: HttpClient, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl EventSink for WebhookSink {
    async fn forward(&self, event: &CallStartEvent) -> Result<SinkResponse, SinkError> {
        let response = self
            .http
            .post(&self.url)
            .json(event)
            .send()
            .await
            .map_err(SinkError::Unreachable)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(SinkError::Body)?;
        let relayed = SinkResponse::new(status, &body);

        if relayed.ok {
            info!(status, "Webhook sink accepted start_call");
        } else {
            warn!(status, body = %relayed.body, "Webhook sink rejected start_call");
        }
        Ok(relayed)
    }
}

/// Cut `text` to at most `limit` characters without splitting a UTF-8 sequence.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}
