//! HTTP client for webhook posts.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use std::time::Duration;
use tracing::debug;

use reelhook_models::{CallbackTarget, DeliveryPayload, JobId};

use crate::error::{WebhookError, WebhookResult};
use crate::multipart::MultipartBody;

/// Header carrying the job id on every delivery request.
pub const JOB_ID_HEADER: &str = "x-reelhook-job-id";

const USER_AGENT: &str = concat!("reelhook/", env!("CARGO_PKG_VERSION"));

/// Response bodies kept in errors are cut to this many characters.
const MAX_ERROR_BODY: usize = 512;

/// Sends delivery requests to callback targets.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    http: reqwest::Client,
}

impl WebhookClient {
    /// Create a client with default settings. Timeouts are set per request.
    pub fn new() -> WebhookResult<Self> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { http })
    }

    pub fn with_http(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// POST the payload as JSON.
    pub async fn post_json(
        &self,
        target: &CallbackTarget,
        job_id: &JobId,
        payload: &DeliveryPayload,
        timeout: Duration,
    ) -> WebhookResult<()> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        apply_caller_headers(&mut headers, target)?;
        apply_job_id(&mut headers, job_id)?;

        let body = serde_json::to_vec(payload)?;
        self.send(&target.url, headers, body, timeout).await
    }

    /// POST an encoded multipart body.
    pub async fn post_multipart(
        &self,
        target: &CallbackTarget,
        job_id: &JobId,
        body: MultipartBody,
        timeout: Duration,
    ) -> WebhookResult<()> {
        let mut headers = HeaderMap::new();
        apply_caller_headers(&mut headers, target)?;
        headers.insert(CONTENT_TYPE, header_value(&body.content_type())?);
        apply_job_id(&mut headers, job_id)?;

        self.send(&target.url, headers, body.into_bytes(), timeout)
            .await
    }

    async fn send(
        &self,
        url: &str,
        headers: HeaderMap,
        body: Vec<u8>,
        timeout: Duration,
    ) -> WebhookResult<()> {
        debug!(url, bytes = body.len(), "Posting webhook");

        let response = self
            .http
            .post(url)
            .headers(headers)
            .timeout(timeout)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WebhookError::HttpStatus {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }
        Ok(())
    }
}

/// Caller headers replace same-named entries already in the map.
fn apply_caller_headers(headers: &mut HeaderMap, target: &CallbackTarget) -> WebhookResult<()> {
    for (name, value) in target.header_pairs() {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| WebhookError::invalid_headers(format!("{}: {}", name, e)))?;
        headers.insert(name, header_value(value)?);
    }
    Ok(())
}

fn apply_job_id(headers: &mut HeaderMap, job_id: &JobId) -> WebhookResult<()> {
    if !job_id.is_empty() {
        headers.insert(
            HeaderName::from_static(JOB_ID_HEADER),
            header_value(job_id.as_str())?,
        );
    }
    Ok(())
}

fn header_value(value: &str) -> WebhookResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| WebhookError::invalid_headers(format!("{:?}: {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelhook_models::ProjectId;
    use std::collections::BTreeMap;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn target(server: &MockServer, headers: &[(&str, &str)]) -> CallbackTarget {
        let target = CallbackTarget::new(format!("{}/hook", server.uri()), ProjectId::Integer(42));
        if headers.is_empty() {
            return target;
        }
        target.with_headers(
            headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    fn payload() -> DeliveryPayload {
        DeliveryPayload::success(ProjectId::Integer(42), "https://cdn.test/v.mp4", "", None)
    }

    #[tokio::test]
    async fn test_json_post_carries_job_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(header("content-type", "application/json"))
            .and(header(JOB_ID_HEADER, "job-1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        WebhookClient::new()
            .unwrap()
            .post_json(
                &target(&server, &[]),
                &JobId::from_string("job-1"),
                &payload(),
                Duration::from_secs(5),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_caller_content_type_overrides_json_default() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("content-type", "application/vnd.custom+json"))
            .and(header("authorization", "Bearer t"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        WebhookClient::new()
            .unwrap()
            .post_json(
                &target(
                    &server,
                    &[("Content-Type", "application/vnd.custom+json"), ("Authorization", "Bearer t")],
                ),
                &JobId::default(),
                &payload(),
                Duration::from_secs(5),
            )
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].headers.get(JOB_ID_HEADER).is_none());
    }

    #[tokio::test]
    async fn test_multipart_content_type_is_forced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let body = crate::multipart::encode_fields(&[("status".to_string(), "success".to_string())]).unwrap();
        let expected = body.content_type();

        WebhookClient::new()
            .unwrap()
            .post_multipart(
                &target(&server, &[("content-type", "application/json")]),
                &JobId::from_string("job-2"),
                body,
                Duration::from_secs(5),
            )
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(
            requests[0].headers.get("content-type").unwrap().to_str().unwrap(),
            expected
        );
    }

    #[tokio::test]
    async fn test_non_success_is_http_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("expected multipart"))
            .mount(&server)
            .await;

        let err = WebhookClient::new()
            .unwrap()
            .post_json(&target(&server, &[]), &JobId::default(), &payload(), Duration::from_secs(5))
            .await
            .unwrap_err();

        match err {
            WebhookError::HttpStatus { status, ref body } => {
                assert_eq!(status, 422);
                assert_eq!(body, "expected multipart");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.is_shape_rejection());
    }

    #[tokio::test]
    async fn test_invalid_header_name_fails_before_sending() {
        let server = MockServer::start().await;

        let err = WebhookClient::new()
            .unwrap()
            .post_json(
                &target(&server, &[("bad header", "x")]),
                &JobId::default(),
                &payload(),
                Duration::from_secs(5),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::InvalidHeaders(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
