//! Upload configuration.

use std::time::Duration;
use tracing::debug;

use crate::bucket::BucketConfig;

/// Default object key prefix.
const DEFAULT_KEY_PREFIX: &str = "deliveries";

/// Configuration for the upload resolver.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Bucket credentials (bucket shapes are skipped when absent)
    pub bucket_client: Option<BucketConfig>,
    /// Bucket to upload into
    pub bucket: Option<String>,
    /// Prefix for generated object keys
    pub key_prefix: String,
    /// Public base URL for uploaded keys; presigned URLs are used when absent
    pub public_base_url: Option<String>,
    /// Lifetime of presigned URLs
    pub presign_expiry: Duration,
    /// Generic HTTP upload endpoint (HTTP shapes are skipped when absent)
    pub endpoint_url: Option<String>,
    /// Timeout for each HTTP upload attempt
    pub timeout: Duration,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            bucket_client: None,
            bucket: None,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            public_base_url: None,
            presign_expiry: Duration::from_secs(7 * 24 * 3600), // S3 maximum
            endpoint_url: None,
            timeout: Duration::from_secs(120),
        }
    }
}

impl UploadConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let bucket_client = match BucketConfig::from_env() {
            Ok(config) => Some(config),
            Err(e) => {
                debug!("Bucket uploads disabled: {}", e);
                None
            }
        };

        Self {
            bucket_client,
            bucket: non_empty_env("UPLOAD_BUCKET").or_else(|| non_empty_env("BUCKET_NAME")),
            key_prefix: non_empty_env("UPLOAD_KEY_PREFIX")
                .unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_string()),
            public_base_url: non_empty_env("S3_PUBLIC_BASE_URL"),
            presign_expiry: Duration::from_secs(
                std::env::var("UPLOAD_PRESIGN_EXPIRY_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(7 * 24 * 3600),
            ),
            endpoint_url: non_empty_env("UPLOAD_ENDPOINT_URL"),
            timeout: Duration::from_secs(
                std::env::var("UPLOAD_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
        }
    }

    /// Key for a new object: `<prefix>/<uuid>/<filename>`.
    pub fn object_key(&self, filename: &str) -> String {
        let prefix = self.key_prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("{}/{}", uuid::Uuid::new_v4(), filename)
        } else {
            format!("{}/{}/{}", prefix, uuid::Uuid::new_v4(), filename)
        }
    }
}

pub(crate) fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
