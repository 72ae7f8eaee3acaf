//! Webhook delivery of job artifacts.
//!
//! This crate provides:
//! - A raw `multipart/form-data` encoder
//! - Callback target resolution and delivery configuration
//! - The webhook HTTP client
//! - The dispatcher choosing between file upload and JSON delivery,
//!   with a single form-encoded retry on HTTP 422

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod multipart;

pub use client::{WebhookClient, JOB_ID_HEADER};
pub use config::{resolve_target, DeliveryConfig};
pub use dispatcher::{
    DeliveryOutcome, DeliveryRoute, JobOutcome, WebhookDispatcher, DELIVERY_FILENAME,
    NO_ARTIFACT_MESSAGE,
};
pub use error::{WebhookError, WebhookResult, SHAPE_REJECTION_STATUS};
pub use multipart::{encode_fields, encode_file_with_fields, FilePart, MultipartBody, MultipartEncoder};
