//! Worker error types.

use std::time::Duration;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Webhook error: {0}")]
    Webhook(#[from] reelhook_webhook::WebhookError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

/// Failure of the upstream job handler.
///
/// The display text is what ends up in the failure payload and in the
/// `error` field of the job result.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The handler reported a failure of its own
    #[error("{0}")]
    Failed(String),

    #[error("Failed to start handler `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Handler exited with {}: {stderr}", exit_description(.exit_code))]
    CommandFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Handler timed out after {0:?}")]
    Timeout(Duration),

    #[error("Handler output is not valid JSON: {0}")]
    InvalidOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AdapterError {
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "no exit code (killed by signal)".to_string(),
    }
}
