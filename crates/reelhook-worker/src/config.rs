//! Worker configuration.

use std::time::Duration;

use reelhook_media::{DeliveryTranscoder, TranscodeConfig};
use reelhook_storage::{UploadConfig, UploadResolver};
use reelhook_webhook::{DeliveryConfig, WebhookClient, WebhookDispatcher};

use crate::error::WorkerResult;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Webhook delivery settings
    pub delivery: DeliveryConfig,
    /// Object upload settings
    pub upload: UploadConfig,
    /// Delivery transcode settings
    pub transcode: TranscodeConfig,
    /// Upstream handler command line
    pub handler_cmd: Option<String>,
    /// Upper bound for one handler run
    pub job_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            delivery: DeliveryConfig::default(),
            upload: UploadConfig::default(),
            transcode: TranscodeConfig::default(),
            handler_cmd: None,
            job_timeout: Duration::from_secs(3600), // 1 hour
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            delivery: DeliveryConfig::from_env(),
            upload: UploadConfig::from_env(),
            transcode: TranscodeConfig::from_env(),
            handler_cmd: std::env::var("JOB_HANDLER_CMD")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            job_timeout: Duration::from_secs(
                std::env::var("WORKER_JOB_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3600),
            ),
        }
    }

    /// Build the webhook dispatcher described by this config.
    pub fn build_dispatcher(&self) -> WorkerResult<WebhookDispatcher> {
        let resolver = UploadResolver::from_config(&self.upload);
        Ok(WebhookDispatcher::new(
            self.delivery.clone(),
            WebhookClient::new()?,
            resolver,
            DeliveryTranscoder::new(self.transcode.clone()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.job_timeout, Duration::from_secs(3600));
        assert!(config.handler_cmd.is_none());
        assert!(config.transcode.enabled);
    }

    #[test]
    fn test_build_dispatcher_without_upload_backends() {
        let config = WorkerConfig::default();
        let dispatcher = config.build_dispatcher().unwrap();
        assert_eq!(dispatcher.config().json_timeout, Duration::from_secs(30));
    }
}
