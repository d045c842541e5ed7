//! SMS delivery via an HTTP carrier API.

use std::time::Duration;

use serde::Deserialize;

use crate::render::RenderedContent;
use crate::transport::{classify_http_status, SendReceipt, Transport, TransportError};

/// HTTP request timeout for a single carrier call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// SmsConfig
// ---------------------------------------------------------------------------

/// Configuration for the SMS carrier API.
#[derive(Debug, Clone)]
pub struct SmsConfig {
    /// Carrier send endpoint.
    pub api_url: String,
    /// Bearer token for the carrier API.
    pub api_key: String,
    /// Sender number or alphanumeric ID.
    pub from_number: String,
}

impl SmsConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMS_API_URL` is not set, signalling that SMS
    /// delivery is not configured and its worker should be skipped.
    ///
    /// | Variable        | Required | Default    |
    /// |-----------------|----------|------------|
    /// | `SMS_API_URL`   | yes      | —          |
    /// | `SMS_API_KEY`   | no       | empty      |
    /// | `SMS_FROM`      | no       | `AMORIA`   |
    pub fn from_env() -> Option<Self> {
        let api_url = std::env::var("SMS_API_URL").ok()?;
        Some(Self {
            api_url,
            api_key: std::env::var("SMS_API_KEY").unwrap_or_default(),
            from_number: std::env::var("SMS_FROM").unwrap_or_else(|_| "AMORIA".to_string()),
        })
    }
}

/// Carrier acknowledgement body.
#[derive(Debug, Deserialize)]
struct CarrierResponse {
    message_id: Option<String>,
}

// ---------------------------------------------------------------------------
// SmsTransport
// ---------------------------------------------------------------------------

/// Sends notification texts through the carrier's HTTP API.
pub struct SmsTransport {
    client: reqwest::Client,
    config: SmsConfig,
}

impl SmsTransport {
    pub fn new(config: SmsConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TransportError::Permanent(format!("HTTP client build: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait::async_trait]
impl Transport for SmsTransport {
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
                "to": address,
                "from": self.config.from_number,
                "body": content.body,
            }))
            .send()
            .await
            .map_err(|e| TransportError::Transient(format!("Carrier request: {e}")))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_http_status(status, &body));
        }

        let ack: CarrierResponse = response
            .json()
            .await
            .unwrap_or(CarrierResponse { message_id: None });
        Ok(SendReceipt {
            provider_id: ack.message_id,
        })
    }
}
