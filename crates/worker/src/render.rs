//! Channel content rendering.
//!
//! Turns a queue entry's trigger + payload into subject/body text per
//! channel. Template authoring lives outside the pipeline; this module
//! only knows the payload shape each trigger enqueues.

use amoria_core::{Channel, TriggerType};

/// SMS bodies are truncated to a single segment.
const SMS_MAX_LEN: usize = 160;

/// Rendered channel-specific content handed to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedContent {
    /// Email subject line; ignored by SMS, used as the title by push.
    pub subject: String,
    pub body: String,
}

/// Render a notification for a channel.
pub fn render(
    trigger: TriggerType,
    payload: &serde_json::Value,
    channel: Channel,
) -> RenderedContent {
    let (subject, body) = match trigger {
        TriggerType::Favorited => (
            "Someone favorited you".to_string(),
            format!("{} added you to their favorites.", str_field(payload, "from")),
        ),
        TriggerType::MutualInterest => (
            "It's a match!".to_string(),
            format!(
                "You and {} have favorited each other. Say hello!",
                str_field(payload, "with")
            ),
        ),
        TriggerType::ShortlistAdded => (
            "You made a shortlist".to_string(),
            format!("{} shortlisted your profile.", str_field(payload, "from")),
        ),
        TriggerType::ProfileView => (
            "Your profile was viewed".to_string(),
            format!("{} viewed your profile.", str_field(payload, "viewer")),
        ),
        TriggerType::NewMessage => {
            let from = str_field(payload, "from");
            let preview = payload
                .get("preview")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            let body = if preview.is_empty() {
                format!("New message from {from}.")
            } else {
                format!("New message from {from}: {preview}")
            };
            (format!("New message from {from}"), body)
        }
        TriggerType::AccessRequested => (
            "Private information request".to_string(),
            format!(
                "{} requested access to your {}.",
                str_field(payload, "from"),
                payload
                    .get("kind")
                    .and_then(|v| v.as_str())
                    .unwrap_or("contact_info")
                    .replace('_', " ")
            ),
        ),
        TriggerType::AccessGranted => (
            "Access request granted".to_string(),
            format!(
                "{} granted your private information request.",
                str_field(payload, "from")
            ),
        ),
        TriggerType::AccessDenied => (
            "Access request declined".to_string(),
            "Your private information request was declined.".to_string(),
        ),
        TriggerType::AccountSuspended => (
            "Your account has been suspended".to_string(),
            format!(
                "Your account was suspended. Reason: {}.",
                str_field_or(payload, "reason", "Policy violation")
            ),
        ),
        TriggerType::SuspiciousLogin => (
            "Suspicious login detected".to_string(),
            format!(
                "A login from {} ({}) looked unusual. If this wasn't you, \
                 change your password immediately.",
                str_field_or(payload, "location", "an unknown location"),
                str_field_or(payload, "device", "unknown device"),
            ),
        ),
    };

    let body = match channel {
        Channel::Sms => truncate(&body, SMS_MAX_LEN),
        Channel::Email | Channel::Push => body,
    };

    RenderedContent { subject, body }
}

/// A string payload field, or `"Someone"` when absent.
fn str_field(payload: &serde_json::Value, key: &str) -> String {
    str_field_or(payload, key, "Someone")
}

fn str_field_or(payload: &serde_json::Value, key: &str, default: &str) -> String {
    payload
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or(default)
        .to_string()
}

/// Truncate on a char boundary, appending an ellipsis when cut.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}…")
}
