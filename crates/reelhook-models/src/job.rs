//! Job definitions as handed over by the execution framework.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Identifier assigned to a job by the execution framework.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unit of work submitted to the execution framework.
///
/// Read-only to the delivery layer: the upstream handler receives the whole
/// record, the dispatcher only looks at the callback-related input fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Job {
    /// Job identifier (empty when the framework did not provide one)
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: JobId,

    /// Input parameters
    #[serde(default, deserialize_with = "null_as_default")]
    pub input: JobInput,
}

impl Job {
    pub fn new(id: impl Into<String>, input: JobInput) -> Self {
        Self {
            id: JobId::from_string(id),
            input,
        }
    }
}

/// Job input parameters.
///
/// Kept as the raw JSON object so upstream fields survive untouched; the
/// callback-related fields are read through accessors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobInput(pub Map<String, Value>);

impl JobInput {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Webhook URL supplied by the caller.
    ///
    /// `webhook_url` takes precedence over `callback_url`. Empty strings and
    /// non-string values count as absent.
    pub fn webhook_url(&self) -> Option<&str> {
        self.non_empty_str("webhook_url")
            .or_else(|| self.non_empty_str("callback_url"))
    }

    /// Raw `callback_headers` value, if present and not null.
    pub fn callback_headers(&self) -> Option<&Value> {
        self.0.get("callback_headers").filter(|v| !v.is_null())
    }

    /// Raw `project_id` value, if present and not null.
    pub fn project_id(&self) -> Option<&Value> {
        self.0.get("project_id").filter(|v| !v.is_null())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    fn non_empty_str(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
