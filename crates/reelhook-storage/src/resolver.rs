//! Ordered probing of upload shapes.
//!
//! The upload provider's exact interface is not known up front, so each known
//! call convention is registered as an [`UploadCandidate`]. The resolver tries
//! them in order and returns the first non-empty URL. Exhaustion yields an
//! empty string, which callers treat as "no durable URL available".

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::bucket::{BucketClient, BucketShape, BucketUpload};
use crate::config::UploadConfig;
use crate::error::{StorageError, StorageResult};
use crate::http_upload::{HttpUpload, HttpUploadShape};

/// What to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadSource {
    /// A file that exists on disk
    File(PathBuf),
    /// In-memory bytes
    Bytes(Vec<u8>),
}

impl UploadSource {
    /// Pick the usable input: an existing file wins over bytes.
    pub fn select(file_path: Option<&Path>, data: Option<&[u8]>) -> Option<Self> {
        if let Some(path) = file_path.filter(|p| p.is_file()) {
            return Some(Self::File(path.to_path_buf()));
        }
        data.map(|d| Self::Bytes(d.to_vec()))
    }

    /// Load the content as bytes.
    pub async fn read(&self) -> StorageResult<Vec<u8>> {
        match self {
            Self::File(path) => Ok(tokio::fs::read(path).await?),
            Self::Bytes(data) => Ok(data.clone()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Bytes(_) => "bytes",
        }
    }
}

/// One upload call convention.
#[async_trait]
pub trait UploadCandidate: Send + Sync {
    /// Stable name used in logs.
    fn name(&self) -> &str;

    /// Upload and return a retrievable URL.
    ///
    /// Return [`crate::StorageError::Unsupported`] when this shape cannot take
    /// the given source.
    async fn upload(&self, source: &UploadSource, filename: &str) -> StorageResult<String>;
}

/// Ordered registry of upload candidates.
#[derive(Default, Clone)]
pub struct UploadResolver {
    candidates: Vec<Arc<dyn UploadCandidate>>,
    /// Upper bound for a single candidate attempt
    attempt_timeout: Option<Duration>,
}

impl UploadResolver {
    /// Create an empty resolver (always resolves to "").
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a candidate to the end of the probing order.
    pub fn with_candidate(mut self, candidate: impl UploadCandidate + 'static) -> Self {
        self.register(Arc::new(candidate));
        self
    }

    /// Abandon any candidate attempt that runs longer than `timeout`.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    pub fn register(&mut self, candidate: Arc<dyn UploadCandidate>) {
        self.candidates.push(candidate);
    }

    pub fn candidate_names(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Build the default registry from configuration.
    ///
    /// Order: bucket file, bucket bytes, HTTP multipart, HTTP raw body,
    /// HTTP JSON base64. Shapes whose backend is not configured are skipped.
    pub fn from_config(config: &UploadConfig) -> Self {
        let mut resolver = Self::new().with_attempt_timeout(config.timeout);

        if let Some(ref bucket_config) = config.bucket_client {
            let client = BucketClient::new(bucket_config.clone(), config.timeout);
            for shape in [BucketShape::PutFile, BucketShape::PutBytes] {
                resolver.register(Arc::new(BucketUpload::new(
                    shape,
                    client.clone(),
                    config.clone(),
                )));
            }
        }

        if let Some(ref endpoint) = config.endpoint_url {
            match reqwest::Client::builder().timeout(config.timeout).build() {
                Ok(http) => {
                    for shape in [
                        HttpUploadShape::MultipartFile,
                        HttpUploadShape::RawBody,
                        HttpUploadShape::JsonBase64,
                    ] {
                        resolver.register(Arc::new(HttpUpload::new(
                            shape,
                            http.clone(),
                            endpoint.clone(),
                        )));
                    }
                }
                Err(e) => warn!("HTTP upload shapes disabled: {}", e),
            }
        }

        info!(
            candidates = ?resolver.candidate_names(),
            "Upload resolver configured"
        );
        resolver
    }

    /// Obtain a URL for a file or a byte buffer.
    ///
    /// `file_path` is preferred when it exists on disk. Returns an empty
    /// string when no input is usable or every candidate fails.
    pub async fn resolve(
        &self,
        file_path: Option<&Path>,
        data: Option<&[u8]>,
        filename: &str,
    ) -> String {
        let Some(source) = UploadSource::select(file_path, data) else {
            warn!("Upload requested without a usable file or data");
            return String::new();
        };

        self.resolve_source(&source, filename).await
    }

    /// Probe every candidate in order for an already selected source.
    pub async fn resolve_source(&self, source: &UploadSource, filename: &str) -> String {
        for candidate in &self.candidates {
            match self.attempt(candidate.as_ref(), source, filename).await {
                Ok(url) if !url.trim().is_empty() => {
                    info!(
                        candidate = candidate.name(),
                        source = source.kind(),
                        "Upload resolved"
                    );
                    return url.trim().to_string();
                }
                Ok(_) => {
                    debug!(candidate = candidate.name(), "Upload returned an empty URL");
                }
                Err(e) => {
                    debug!(candidate = candidate.name(), error = %e, "Upload candidate failed");
                }
            }
        }

        debug!(
            tried = self.candidates.len(),
            source = source.kind(),
            "No upload candidate produced a URL"
        );
        String::new()
    }

    async fn attempt(
        &self,
        candidate: &dyn UploadCandidate,
        source: &UploadSource,
        filename: &str,
    ) -> StorageResult<String> {
        let upload = candidate.upload(source, filename);
        match self.attempt_timeout {
            Some(limit) => tokio::time::timeout(limit, upload)
                .await
                .unwrap_or(Err(StorageError::Timeout(limit))),
            None => upload.await,
        }
    }
}
