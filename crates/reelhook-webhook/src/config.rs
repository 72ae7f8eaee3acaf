//! Delivery configuration and callback target resolution.

use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use reelhook_models::{CallbackTarget, JobInput, ProjectId};

use crate::error::{WebhookError, WebhookResult};

/// Webhook delivery configuration.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Used when the job input carries no webhook URL
    pub fallback_url: Option<String>,
    /// JSON object of headers used when the job input carries none
    pub default_headers_raw: Option<String>,
    /// Timeout for JSON posts and the fields-only fallback
    pub json_timeout: Duration,
    /// Timeout for multipart file posts
    pub multipart_timeout: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            fallback_url: None,
            default_headers_raw: None,
            json_timeout: Duration::from_secs(30),
            multipart_timeout: Duration::from_secs(600),
        }
    }
}

impl DeliveryConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            fallback_url: non_empty_env("WEBHOOK_URL").or_else(|| non_empty_env("CALLBACK_URL")),
            default_headers_raw: non_empty_env("CALLBACK_HEADERS"),
            json_timeout: Duration::from_secs(
                std::env::var("WEBHOOK_JSON_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            multipart_timeout: Duration::from_secs(
                std::env::var("WEBHOOK_MULTIPART_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Work out where to deliver a job's outcome.
///
/// Returns `Ok(None)` when there is no URL or no project id. Headers come from
/// the job input, then from the configured defaults; an unparseable header
/// source is an error.
pub fn resolve_target(
    input: &JobInput,
    config: &DeliveryConfig,
) -> WebhookResult<Option<CallbackTarget>> {
    let url = input
        .webhook_url()
        .map(str::to_string)
        .or_else(|| config.fallback_url.clone())
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());

    let (Some(url), Some(project_id)) = (url, input.project_id()) else {
        return Ok(None);
    };

    let mut target = CallbackTarget::new(url, ProjectId::coerce(project_id));

    let headers = match input.callback_headers() {
        Some(value) => parse_headers(value)?,
        None => match config.default_headers_raw {
            Some(ref raw) => parse_headers(&Value::String(raw.clone()))?,
            None => None,
        },
    };
    if let Some(headers) = headers {
        target = target.with_headers(headers);
    }

    Ok(Some(target))
}

/// Accepts a JSON object or a string holding one. Non-string values are kept
/// as their JSON text. A blank string means no headers.
fn parse_headers(value: &Value) -> WebhookResult<Option<BTreeMap<String, String>>> {
    let object = match value {
        Value::Object(map) => map.clone(),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                return Err(WebhookError::invalid_headers(format!(
                    "expected a JSON object, got {}",
                    json_kind(&other)
                )))
            }
            Err(e) => return Err(WebhookError::invalid_headers(e.to_string())),
        },
        other => {
            return Err(WebhookError::invalid_headers(format!(
                "expected a JSON object, got {}",
                json_kind(other)
            )))
        }
    };

    let headers = object
        .into_iter()
        .map(|(k, v)| match v {
            Value::String(s) => (k, s),
            other => (k, other.to_string()),
        })
        .collect();
    Ok(Some(headers))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(value: Value) -> JobInput {
        serde_json::from_value(value).unwrap()
    }

    fn config_with(url: Option<&str>, headers: Option<&str>) -> DeliveryConfig {
        DeliveryConfig {
            fallback_url: url.map(str::to_string),
            default_headers_raw: headers.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_timeouts() {
        let config = DeliveryConfig::default();
        assert_eq!(config.json_timeout, Duration::from_secs(30));
        assert_eq!(config.multipart_timeout, Duration::from_secs(600));
    }

    #[test]
    fn test_job_url_wins_over_fallback() {
        let target = resolve_target(
            &input(json!({"webhook_url": "https://job.test/cb", "project_id": 42})),
            &config_with(Some("https://env.test/cb"), None),
        )
        .unwrap()
        .unwrap();
        assert_eq!(target.url, "https://job.test/cb");
        assert_eq!(target.project_id, ProjectId::Integer(42));
        assert!(target.headers.is_none());
    }

    #[test]
    fn test_fallback_url_used() {
        let target = resolve_target(
            &input(json!({"project_id": "7"})),
            &config_with(Some("https://env.test/cb"), None),
        )
        .unwrap()
        .unwrap();
        assert_eq!(target.url, "https://env.test/cb");
        assert_eq!(target.project_id, ProjectId::Integer(7));
    }

    #[test]
    fn test_missing_project_id_means_no_target() {
        let resolved = resolve_target(
            &input(json!({"webhook_url": "https://job.test/cb", "project_id": null})),
            &DeliveryConfig::default(),
        )
        .unwrap();
        assert!(resolved.is_none());
    }

    #[test]
    fn test_missing_url_means_no_target() {
        let resolved = resolve_target(&input(json!({"project_id": 1})), &DeliveryConfig::default()).unwrap();
        assert!(resolved.is_none());
    }

    #[test]
    fn test_no_target_skips_header_parsing() {
        let resolved = resolve_target(
            &input(json!({"callback_headers": "not json"})),
            &DeliveryConfig::default(),
        )
        .unwrap();
        assert!(resolved.is_none());
    }

    #[test]
    fn test_headers_from_object_and_string() {
        let from_object = resolve_target(
            &input(json!({
                "callback_url": "https://job.test/cb",
                "project_id": 1,
                "callback_headers": {"Authorization": "Bearer t", "X-Retry": 3}
            })),
            &DeliveryConfig::default(),
        )
        .unwrap()
        .unwrap();
        let headers = from_object.headers.unwrap();
        assert_eq!(headers["Authorization"], "Bearer t");
        assert_eq!(headers["X-Retry"], "3");

        let from_string = resolve_target(
            &input(json!({
                "callback_url": "https://job.test/cb",
                "project_id": 1,
                "callback_headers": "{\"Authorization\": \"Bearer s\"}"
            })),
            &DeliveryConfig::default(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(from_string.headers.unwrap()["Authorization"], "Bearer s");
    }

    #[test]
    fn test_default_headers_from_config() {
        let target = resolve_target(
            &input(json!({"webhook_url": "https://job.test/cb", "project_id": 1})),
            &config_with(None, Some(r#"{"X-Api-Key": "k"}"#)),
        )
        .unwrap()
        .unwrap();
        assert_eq!(target.headers.unwrap()["X-Api-Key"], "k");
    }

    #[test]
    fn test_invalid_headers_are_an_error() {
        let err = resolve_target(
            &input(json!({
                "webhook_url": "https://job.test/cb",
                "project_id": 1,
                "callback_headers": "{broken"
            })),
            &DeliveryConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, WebhookError::InvalidHeaders(_)));

        let err = resolve_target(
            &input(json!({"webhook_url": "https://job.test/cb", "project_id": 1})),
            &config_with(None, Some("[1, 2]")),
        )
        .unwrap_err();
        assert!(matches!(err, WebhookError::InvalidHeaders(_)));
    }
}
