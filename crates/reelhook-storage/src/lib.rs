//! Object upload resolution for delivered artifacts.
//!
//! This crate provides:
//! - An S3-compatible bucket client (public or presigned URLs)
//! - Generic HTTP upload endpoints in several request shapes
//! - An ordered resolver that probes upload shapes until one yields a URL

pub mod bucket;
pub mod config;
pub mod error;
pub mod http_upload;
pub mod resolver;

pub use bucket::{BucketClient, BucketConfig, BucketShape, BucketUpload};
pub use config::UploadConfig;
pub use error::{StorageError, StorageResult};
pub use http_upload::{extract_url, HttpUpload, HttpUploadShape};
pub use resolver::{UploadCandidate, UploadResolver, UploadSource};
