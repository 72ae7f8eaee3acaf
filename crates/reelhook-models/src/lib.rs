//! Shared data models for the reelhook delivery layer.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs handed over by the execution framework
//! - Job results returned by the upstream handler
//! - Callback targets and project identifiers
//! - Webhook delivery payloads

pub mod callback;
pub mod job;
pub mod payload;
pub mod result;

// Re-export common types
pub use callback::{CallbackTarget, ProjectId};
pub use job::{Job, JobId, JobInput};
pub use payload::{DeliveryPayload, DeliveryStatus};
pub use result::JobResult;
