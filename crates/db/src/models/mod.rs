//! Row models for the pipeline's collections.

pub mod delivery_log;
pub mod preference;
pub mod queue;
