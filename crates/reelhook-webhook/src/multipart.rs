//! Raw `multipart/form-data` encoding.
//!
//! Bodies are built fully in memory with a fresh random boundary per call.
//! Part content is never escaped; instead a boundary that occurs anywhere in
//! the content is discarded and a new one drawn.

use std::path::PathBuf;
use uuid::Uuid;

use crate::error::{WebhookError, WebhookResult};

const BOUNDARY_PREFIX: &str = "----ReelhookFormBoundary";
const MAX_BOUNDARY_DRAWS: usize = 8;
const CRLF: &[u8] = b"\r\n";

/// An encoded multipart body and its boundary.
#[derive(Debug, Clone)]
pub struct MultipartBody {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBody {
    /// Value for the `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

#[derive(Debug, Clone)]
enum PartContent {
    Text(String),
    File {
        filename: String,
        content_type: String,
        data: Vec<u8>,
    },
}

#[derive(Debug, Clone)]
struct Part {
    name: String,
    content: PartContent,
}

impl Part {
    fn contains(&self, needle: &[u8]) -> bool {
        let haystacks: [&[u8]; 2] = match self.content {
            PartContent::Text(ref value) => [self.name.as_bytes(), value.as_bytes()],
            PartContent::File {
                ref filename,
                ref data,
                ..
            } => [filename.as_bytes(), data.as_slice()],
        };
        haystacks
            .iter()
            .any(|h| h.windows(needle.len()).any(|w| w == needle))
    }

    fn write_to(&self, boundary: &str, out: &mut Vec<u8>) {
        out.extend_from_slice(b"--");
        out.extend_from_slice(boundary.as_bytes());
        out.extend_from_slice(CRLF);

        match self.content {
            PartContent::Text(ref value) => {
                out.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"", self.name).as_bytes(),
                );
                out.extend_from_slice(CRLF);
                out.extend_from_slice(CRLF);
                out.extend_from_slice(value.as_bytes());
            }
            PartContent::File {
                ref filename,
                ref content_type,
                ref data,
            } => {
                out.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"",
                        self.name, filename
                    )
                    .as_bytes(),
                );
                out.extend_from_slice(CRLF);
                out.extend_from_slice(format!("Content-Type: {}", content_type).as_bytes());
                out.extend_from_slice(CRLF);
                out.extend_from_slice(CRLF);
                out.extend_from_slice(data);
            }
        }
        out.extend_from_slice(CRLF);
    }
}

/// Builder for multipart bodies. Parts are emitted in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MultipartEncoder {
    parts: Vec<Part>,
}

impl MultipartEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(Part {
            name: name.into(),
            content: PartContent::Text(value.into()),
        });
        self
    }

    /// Add text fields in order.
    pub fn texts<'a, I>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = &'a (String, String)>,
    {
        fields
            .into_iter()
            .fold(self, |enc, (name, value)| enc.text(name.clone(), value.clone()))
    }

    /// Add a file field; the content type is inferred from `filename`.
    pub fn file(self, name: impl Into<String>, filename: impl Into<String>, data: Vec<u8>) -> Self {
        let filename = filename.into();
        let content_type = content_type_for(&filename);
        self.file_with_type(name, filename, content_type, data)
    }

    pub fn file_with_type(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        self.parts.push(Part {
            name: name.into(),
            content: PartContent::File {
                filename: filename.into(),
                content_type: content_type.into(),
                data,
            },
        });
        self
    }

    /// Encode with a fresh boundary.
    pub fn finish(self) -> WebhookResult<MultipartBody> {
        let boundary = self.pick_boundary()?;

        let capacity = self
            .parts
            .iter()
            .map(|p| match p.content {
                PartContent::Text(ref v) => v.len(),
                PartContent::File { ref data, .. } => data.len(),
            })
            .sum::<usize>()
            + (self.parts.len() + 1) * 160;
        let mut body = Vec::with_capacity(capacity);

        for part in &self.parts {
            part.write_to(&boundary, &mut body);
        }

        body.extend_from_slice(b"--");
        body.extend_from_slice(boundary.as_bytes());
        body.extend_from_slice(b"--");
        body.extend_from_slice(CRLF);

        Ok(MultipartBody { boundary, body })
    }

    fn pick_boundary(&self) -> WebhookResult<String> {
        for _ in 0..MAX_BOUNDARY_DRAWS {
            let boundary = format!("{}{}", BOUNDARY_PREFIX, Uuid::new_v4().simple());
            if !self.parts.iter().any(|p| p.contains(boundary.as_bytes())) {
                return Ok(boundary);
            }
        }
        Err(WebhookError::encoding(
            "could not find a boundary absent from the part content",
        ))
    }
}

/// File attached to a multipart delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// Form field name
    pub field_name: String,
    /// Filename announced to the server
    pub filename: String,
    /// Local file to read
    pub path: PathBuf,
}

impl FilePart {
    pub fn new(field_name: impl Into<String>, filename: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            field_name: field_name.into(),
            filename: filename.into(),
            path: path.into(),
        }
    }
}

/// Encode text fields followed by one file read from disk.
pub async fn encode_file_with_fields(
    fields: &[(String, String)],
    file: &FilePart,
) -> WebhookResult<MultipartBody> {
    let data = tokio::fs::read(&file.path).await?;
    MultipartEncoder::new()
        .texts(fields)
        .file(file.field_name.clone(), file.filename.clone(), data)
        .finish()
}

/// Encode text fields only.
pub fn encode_fields(fields: &[(String, String)]) -> WebhookResult<MultipartBody> {
    MultipartEncoder::new().texts(fields).finish()
}

/// MIME type from a filename extension, `application/octet-stream` if unknown.
pub fn content_type_for(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
