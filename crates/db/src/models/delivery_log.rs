//! Delivery log record model.

use amoria_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the append-only `delivery_log` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DeliveryRecord {
    pub id: DbId,
    pub queue_entry_id: DbId,
    pub recipient: String,
    pub trigger_type: String,
    pub channel: String,
    pub outcome: String,
    pub provider_id: Option<String>,
    pub error: Option<String>,
    pub sent_at: Timestamp,
}
