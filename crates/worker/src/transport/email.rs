//! Email delivery via SMTP.
//!
//! Wraps the `lettre` async SMTP transport. Configuration comes from
//! environment variables; if `SMTP_HOST` is not set,
//! [`EmailConfig::from_env`] returns `None` and the email worker is not
//! started.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::render::RenderedContent;
use crate::transport::{SendReceipt, Transport, TransportError};

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@amoria.app";

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Configuration for the SMTP transport.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    /// Optional SMTP username.
    pub smtp_user: Option<String>,
    /// Optional SMTP password.
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set, signalling that email
    /// delivery is not configured and its worker should be skipped.
    ///
    /// | Variable        | Required | Default               |
    /// |-----------------|----------|-----------------------|
    /// | `SMTP_HOST`     | yes      | —                     |
    /// | `SMTP_PORT`     | no       | `587`                 |
    /// | `SMTP_FROM`     | no       | `noreply@amoria.app`  |
    /// | `SMTP_USER`     | no       | —                     |
    /// | `SMTP_PASSWORD` | no       | —                     |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// EmailTransport
// ---------------------------------------------------------------------------

/// Sends notification emails via SMTP.
pub struct EmailTransport {
    config: EmailConfig,
}

impl EmailTransport {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn build_mailer(
        &self,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, TransportError> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)
                .map_err(|e| TransportError::Transient(format!("SMTP relay setup: {e}")))?
                .port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        Ok(builder.build())
    }
}

#[async_trait::async_trait]
impl Transport for EmailTransport {
    async fn send(
        &self,
        address: &str,
        content: &RenderedContent,
        idempotency_key: &str,
    ) -> Result<SendReceipt, TransportError> {
        // A recipient address that does not parse can never be delivered.
        let to = address
            .parse()
            .map_err(|e| TransportError::Permanent(format!("Invalid address: {e}")))?;
        let from = self
            .config
            .from_address
            .parse()
            .map_err(|e| TransportError::Permanent(format!("Invalid from address: {e}")))?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(&content.subject)
            .header(ContentType::TEXT_PLAIN)
            .message_id(Some(format!("<{idempotency_key}@amoria.app>")))
            .body(content.body.clone())
            .map_err(|e| TransportError::Permanent(format!("Message build: {e}")))?;

        let mailer = self.build_mailer()?;
        let response = mailer.send(email).await.map_err(|e| {
            if e.is_permanent() {
                TransportError::Permanent(format!("SMTP: {e}"))
            } else {
                TransportError::Transient(format!("SMTP: {e}"))
            }
        })?;

        tracing::debug!(to = address, code = %response.code(), "Email accepted by SMTP server");
        let provider_id = response.message().next().map(str::to_string);
        Ok(SendReceipt { provider_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_returns_none_without_smtp_host() {
        std::env::remove_var("SMTP_HOST");
        assert!(EmailConfig::from_env().is_none());
    }
}
