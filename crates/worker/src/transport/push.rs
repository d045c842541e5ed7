//! Push notification delivery via an HTTP gateway.
//!
//! The delivery address is the recipient's device token; a 404/410 from
//! the gateway means the token is gone and the send is permanently
//! undeliverable.

use std::time::Duration;

use serde::Deserialize;

use crate::render::RenderedContent;
use crate::transport::{classify_http_status, SendReceipt, Transport, TransportError};

/// HTTP request timeout for a single gateway call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// PushConfig
// ---------------------------------------------------------------------------

/// Configuration for the push gateway.
#[derive(Debug, Clone)]
pub struct PushConfig {
    /// Gateway send endpoint.
    pub api_url: String,
    /// Bearer token for the gateway.
    pub api_key: String,
}

impl PushConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `PUSH_API_URL` is not set, signalling that push
    /// delivery is not configured and its worker should be skipped.
    ///
    /// | Variable       | Required | Default |
    /// |----------------|----------|---------|
    /// | `PUSH_API_URL` | yes      | —       |
    /// | `PUSH_API_KEY` | no       | empty   |
    pub fn from_env() -> Option<Self> {
        let api_url = std::env::var("PUSH_API_URL").ok()?;
        Some(Self {
            api_url,
            api_key: std::env::var("PUSH_API_KEY").unwrap_or_default(),
        })
    }
}

/// Gateway acknowledgement body.
#[derive(Debug, Deserialize)]
struct GatewayResponse {
    id: Option<String>,
}

// ---------------------------------------------------------------------------
// PushTransport
// ---------------------------------------------------------------------------

/// Sends push notifications through the gateway's HTTP API.
pub struct PushTransport {
    client: reqwest::Client,
    config: PushConfig,
}

impl PushTransport {
    pub fn new(config: PushConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TransportError::Permanent(format!("HTTP client build: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait::async_trait]
impl Transport for PushTransport {
    async fn send(
        &self,
        address: &str,
        content: &RenderedContent,
        idempotency_key: &str,
    ) -> Result<SendReceipt, TransportError> {
        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .header("Idempotency-Key", idempotency_key)
            .json(&serde_json::json!({
                "device_token": address,
                "title": content.subject,
                "body": content.body,
            }))
            .send()
            .await
            .map_err(|e| TransportError::Transient(format!("Gateway request: {e}")))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_http_status(status, &body));
        }

        let ack: GatewayResponse = response.json().await.unwrap_or(GatewayResponse { id: None });
        Ok(SendReceipt {
            provider_id: ack.id,
        })
    }
}
