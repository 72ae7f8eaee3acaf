//! Callback target and project identifier.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Project identifier forwarded to the webhook.
///
/// Coerced to an integer when possible; otherwise the raw value is kept and
/// forwarded as-is without further validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProjectId {
    Integer(i64),
    Raw(Value),
}

impl ProjectId {
    /// Coerce a raw JSON value into a project id.
    pub fn coerce(value: &Value) -> Self {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return Self::Integer(i);
                }
                match n.as_f64() {
                    // Saturating cast; u64 values above i64::MAX land here too
                    Some(f) if f.is_finite() => Self::Integer(f.trunc() as i64),
                    _ => Self::Raw(value.clone()),
                }
            }
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Self::Integer)
                .unwrap_or_else(|_| Self::Raw(value.clone())),
            other => Self::Raw(other.clone()),
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Raw(_) => None,
        }
    }
}

/// Text form used for multipart fields.
impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{}", i),
            Self::Raw(Value::String(s)) => f.write_str(s),
            Self::Raw(other) => write!(f, "{}", other),
        }
    }
}

/// Where and how to notify the caller about a job.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackTarget {
    /// Webhook URL (never empty)
    pub url: String,
    /// Caller-supplied headers, merged over the defaults of each request
    pub headers: Option<BTreeMap<String, String>>,
    /// Project the job belongs to
    pub project_id: ProjectId,
}

impl CallbackTarget {
    pub fn new(url: impl Into<String>, project_id: ProjectId) -> Self {
        Self {
            url: url.into(),
            headers: None,
            project_id,
        }
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Iterate caller headers (empty when none were supplied).
    pub fn header_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .flat_map(|h| h.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}
