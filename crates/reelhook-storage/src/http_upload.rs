//! Generic HTTP upload endpoints.
//!
//! Upload services disagree on request shape and on where the resulting URL
//! lives in the response, so each shape is its own candidate and the URL is
//! pulled out of a handful of known response layouts.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::resolver::{UploadCandidate, UploadSource};

/// Response keys that may hold the uploaded object's URL, in lookup order.
const URL_POINTERS: &[&str] = &["/url", "/link", "/location", "/data/url", "/data/link", "/file/url"];

/// Request shape for an HTTP upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpUploadShape {
    /// `POST <endpoint>` with a multipart `file` field
    MultipartFile,
    /// `PUT <endpoint>/<filename>` with the raw bytes as body
    RawBody,
    /// `POST <endpoint>` with `{"filename", "content_type", "data": <base64>}`
    JsonBase64,
}

impl HttpUploadShape {
    pub fn name(&self) -> &'static str {
        match self {
            HttpUploadShape::MultipartFile => "http.multipart_file",
            HttpUploadShape::RawBody => "http.raw_body",
            HttpUploadShape::JsonBase64 => "http.json_base64",
        }
    }
}

/// Upload candidate for a generic HTTP endpoint.
pub struct HttpUpload {
    shape: HttpUploadShape,
    http: reqwest::Client,
    endpoint: String,
}

impl HttpUpload {
    /// The client is expected to carry the upload timeout.
    pub fn new(shape: HttpUploadShape, http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            shape,
            http,
            endpoint: endpoint.into(),
        }
    }

    fn build_request(
        &self,
        data: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> StorageResult<reqwest::RequestBuilder> {
        let request = match self.shape {
            HttpUploadShape::MultipartFile => {
                let part = Part::bytes(data)
                    .file_name(filename.to_string())
                    .mime_str(content_type)?;
                self.http
                    .post(&self.endpoint)
                    .multipart(Form::new().part("file", part))
            }
            HttpUploadShape::RawBody => {
                let url = format!("{}/{}", self.endpoint.trim_end_matches('/'), filename);
                self.http
                    .put(url)
                    .header(reqwest::header::CONTENT_TYPE, content_type)
                    .body(data)
            }
            HttpUploadShape::JsonBase64 => self.http.post(&self.endpoint).json(&json!({
                "filename": filename,
                "content_type": content_type,
                "data": STANDARD.encode(&data),
            })),
        };
        Ok(request)
    }
}

#[async_trait]
impl UploadCandidate for HttpUpload {
    fn name(&self) -> &str {
        self.shape.name()
    }

    async fn upload(&self, source: &UploadSource, filename: &str) -> StorageResult<String> {
        let data = source.read().await?;
        let content_type = mime_guess::from_path(filename).first_or_octet_stream();

        debug!(
            shape = self.name(),
            bytes = data.len(),
            "Uploading to {}",
            self.endpoint
        );

        let response = self
            .build_request(data, filename, content_type.as_ref())?
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(StorageError::upload_failed(format!(
                "{} returned {}",
                self.name(),
                status
            )));
        }

        extract_url(&body).ok_or_else(|| StorageError::NoUrl(truncate(&body, 200)))
    }
}

/// Pull an `http(s)` URL out of an upload response body.
///
/// Accepts a JSON object with the URL under one of the known keys, a JSON
/// string, or a plain-text body holding just the URL.
pub fn extract_url(body: &str) -> Option<String> {
    let body = body.trim();

    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(s) = value.as_str() {
            return as_http_url(s);
        }
        return URL_POINTERS
            .iter()
            .filter_map(|p| value.pointer(p).and_then(Value::as_str))
            .find_map(as_http_url);
    }

    as_http_url(body)
}

fn as_http_url(s: &str) -> Option<String> {
    let s = s.trim();
    let is_http = s.starts_with("https://") || s.starts_with("http://");
    (is_http && !s.contains(char::is_whitespace)).then(|| s.to_string())
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
