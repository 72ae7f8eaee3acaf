//! S3-compatible bucket uploads.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::timeout::TimeoutConfig;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::config::{non_empty_env, UploadConfig};
use crate::error::{StorageError, StorageResult};
use crate::resolver::{UploadCandidate, UploadSource};

/// Credentials and endpoint for an S3-compatible store.
#[derive(Debug, Clone)]
pub struct BucketConfig {
    /// Custom endpoint (R2, MinIO, ...); AWS default when absent
    pub endpoint_url: Option<String>,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Region ("auto" for R2)
    pub region: String,
}

impl BucketConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            endpoint_url: non_empty_env("S3_ENDPOINT_URL"),
            access_key_id: non_empty_env("S3_ACCESS_KEY_ID")
                .ok_or_else(|| StorageError::config_error("S3_ACCESS_KEY_ID not set"))?,
            secret_access_key: non_empty_env("S3_SECRET_ACCESS_KEY")
                .ok_or_else(|| StorageError::config_error("S3_SECRET_ACCESS_KEY not set"))?,
            region: non_empty_env("S3_REGION").unwrap_or_else(|| "auto".to_string()),
        })
    }
}

/// Thin S3 client; the bucket is chosen per call.
#[derive(Clone)]
pub struct BucketClient {
    client: Client,
}

impl BucketClient {
    /// Create a new client from configuration.
    ///
    /// `operation_timeout` bounds each S3 call, retries included.
    pub fn new(config: BucketConfig, operation_timeout: Duration) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "reelhook",
        );

        let mut builder = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(operation_timeout)
                    .build(),
            );

        if let Some(ref endpoint) = config.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
        }
    }

    /// Upload a file.
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        bucket: &str,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        let path = path.as_ref();
        debug!("Uploading {} to {}/{}", path.display(), bucket, key);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!("Uploaded {} to {}/{}", path.display(), bucket, key);
        Ok(())
    }

    /// Upload bytes.
    pub async fn upload_bytes(
        &self,
        data: Vec<u8>,
        bucket: &str,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        debug!("Uploading {} bytes to {}/{}", data.len(), bucket, key);

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        Ok(())
    }

    /// Generate a presigned GET URL.
    pub async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let presign_config = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }
}

/// Which bucket call convention a [`BucketUpload`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketShape {
    /// PutObject streamed from a file on disk
    PutFile,
    /// PutObject from an in-memory buffer
    PutBytes,
}

/// Upload candidate backed by an S3-compatible bucket.
pub struct BucketUpload {
    shape: BucketShape,
    client: BucketClient,
    config: UploadConfig,
}

impl BucketUpload {
    pub fn new(shape: BucketShape, client: BucketClient, config: UploadConfig) -> Self {
        Self {
            shape,
            client,
            config,
        }
    }

    /// Public URL when a base is configured, presigned URL otherwise.
    async fn object_url(&self, bucket: &str, key: &str) -> StorageResult<String> {
        match self.config.public_base_url {
            Some(ref base) => Ok(public_url(base, key)),
            None => {
                self.client
                    .presign_get(bucket, key, self.config.presign_expiry)
                    .await
            }
        }
    }
}

#[async_trait]
impl UploadCandidate for BucketUpload {
    fn name(&self) -> &str {
        match self.shape {
            BucketShape::PutFile => "bucket.put_file",
            BucketShape::PutBytes => "bucket.put_bytes",
        }
    }

    async fn upload(&self, source: &UploadSource, filename: &str) -> StorageResult<String> {
        let bucket = self
            .config
            .bucket
            .as_deref()
            .ok_or_else(|| StorageError::config_error("no upload bucket configured"))?;

        let key = self.config.object_key(filename);
        let content_type = mime_guess::from_path(filename).first_or_octet_stream();

        match (self.shape, source) {
            (BucketShape::PutFile, UploadSource::File(path)) => {
                self.client
                    .upload_file(path, bucket, &key, content_type.as_ref())
                    .await?
            }
            (BucketShape::PutBytes, UploadSource::Bytes(data)) => {
                self.client
                    .upload_bytes(data.clone(), bucket, &key, content_type.as_ref())
                    .await?
            }
            (_, other) => {
                return Err(StorageError::unsupported(format!(
                    "{} does not take {} input",
                    self.name(),
                    other.kind()
                )))
            }
        }

        self.object_url(bucket, &key).await
    }
}

fn public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}
