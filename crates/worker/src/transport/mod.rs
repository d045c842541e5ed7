//! Channel transport clients.
//!
//! Each transport implements the narrow `send(address, content,
//! idempotency_key) -> receipt` contract. The error taxonomy is the
//! retry policy: transient failures are retried up to the bound,
//! permanent failures (invalid address, unsubscribed recipient) go
//! straight to terminal `failed`.

use crate::render::RenderedContent;

pub mod email;
pub mod push;
pub mod sms;

pub use email::{EmailConfig, EmailTransport};
pub use push::{PushConfig, PushTransport};
pub use sms::{SmsConfig, SmsTransport};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A failed delivery attempt, classified for retry.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Network or provider hiccup; worth retrying with backoff.
    #[error("Transient transport failure: {0}")]
    Transient(String),

    /// The send can never succeed (invalid address, unsubscribed,
    /// rejected content); retrying would be wasted work.
    #[error("Permanent transport failure: {0}")]
    Permanent(String),
}

impl TransportError {
    pub fn is_permanent(&self) -> bool {
        matches!(self, TransportError::Permanent(_))
    }
}

// ---------------------------------------------------------------------------
// Transport trait
// ---------------------------------------------------------------------------

/// Provider acknowledgement of a successful send.
#[derive(Debug, Clone, Default)]
pub struct SendReceipt {
    /// Provider-side message ID, when the provider returns one.
    pub provider_id: Option<String>,
}

/// A channel delivery client.
///
/// `idempotency_key` is derived from the queue entry ID and passed to
/// providers that support de-duplication, so a crash between send and
/// status update cannot produce a second external send.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        address: &str,
        content: &RenderedContent,
        idempotency_key: &str,
    ) -> Result<SendReceipt, TransportError>;
}

/// Classify an HTTP status from a carrier/gateway API.
///
/// 2xx is success (handled by the caller); 408/425/429 and every 5xx are
/// transient; any other 4xx means the request itself can never succeed.
pub(crate) fn classify_http_status(status: u16, body: &str) -> TransportError {
    match status {
        408 | 425 | 429 => TransportError::Transient(format!("HTTP {status}: {body}")),
        s if s >= 500 => TransportError::Transient(format!("HTTP {s}: {body}")),
        s => TransportError::Permanent(format!("HTTP {s}: {body}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn server_errors_are_transient() {
        assert_matches!(classify_http_status(502, ""), TransportError::Transient(_));
        assert_matches!(classify_http_status(429, ""), TransportError::Transient(_));
    }

    #[test]
    fn client_errors_are_permanent() {
        assert_matches!(classify_http_status(400, ""), TransportError::Permanent(_));
        assert_matches!(classify_http_status(404, ""), TransportError::Permanent(_));
        assert_matches!(classify_http_status(410, ""), TransportError::Permanent(_));
    }
}
