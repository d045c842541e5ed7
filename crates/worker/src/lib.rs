//! Amoria delivery workers.
//!
//! One periodic batch worker per channel drains the notification queue:
//! claim, render, send through the channel transport, log the attempt,
//! and update the entry with retry accounting. The binary entrypoint
//! (`amoria-worker`) wires a worker per configured transport.

pub mod config;
pub mod render;
pub mod retention;
pub mod transport;
pub mod worker;

pub use config::WorkerConfig;
pub use render::RenderedContent;
pub use transport::{SendReceipt, Transport, TransportError};
pub use worker::DeliveryWorker;
