//! Webhook delivery error types.

use thiserror::Error;

pub type WebhookResult<T> = Result<T, WebhookError>;

/// HTTP status that signals "wrong body shape, send a form instead".
pub const SHAPE_REJECTION_STATUS: u16 = 422;

#[derive(Debug, Error)]
pub enum WebhookError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {status}")]
    HttpStatus { status: u16, body: String },

    #[error("Invalid callback headers: {0}")]
    InvalidHeaders(String),

    #[error("Multipart encoding failed: {0}")]
    Encoding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WebhookError {
    pub fn invalid_headers(msg: impl Into<String>) -> Self {
        Self::InvalidHeaders(msg.into())
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Status code of a rejected request, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            WebhookError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the endpoint rejected the body shape (HTTP 422).
    pub fn is_shape_rejection(&self) -> bool {
        self.status() == Some(SHAPE_REJECTION_STATUS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_display() {
        let err = WebhookError::HttpStatus {
            status: 502,
            body: String::new(),
        };
        assert_eq!(err.to_string(), "Webhook returned HTTP 502");
        assert_eq!(err.status(), Some(502));
        assert!(!err.is_shape_rejection());
    }

    #[test]
    fn test_shape_rejection() {
        let err = WebhookError::HttpStatus {
            status: 422,
            body: "expected form".to_string(),
        };
        assert!(err.is_shape_rejection());
        assert!(!WebhookError::invalid_headers("x").is_shape_rejection());
    }
}
