//! Shared domain types for the Amoria notification pipeline.
//!
//! This crate is the dependency-free leaf of the workspace: the closed
//! event/trigger/channel enumerations, queue status machine, quiet-hours
//! window math, and the retry backoff schedule. Everything here is pure;
//! persistence lives in `amoria-db` and execution in `amoria-events` /
//! `amoria-worker`.

pub mod backoff;
pub mod channels;
pub mod error;
pub mod events;
pub mod quiet_hours;
pub mod queue;
pub mod triggers;
pub mod types;

pub use channels::Channel;
pub use error::CoreError;
pub use events::EventType;
pub use queue::{DeliveryOutcome, Priority, QueueStatus};
pub use triggers::TriggerType;
