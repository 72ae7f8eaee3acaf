//! End-to-end delivery of a job outcome to its callback.
//!
//! A completed job whose result points at a video file on disk is delivered
//! as a multipart upload. Otherwise the base64 video is turned into a URL
//! (object upload, or a `data:` URL as a last resort) and posted as JSON. A
//! JSON post answered with 422 is retried once as a fields-only form.
//!
//! Nothing here fails the job: every problem ends up in the returned
//! [`DeliveryOutcome`] and the logs.

use base64::{engine::general_purpose::STANDARD, Engine};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};

use reelhook_media::DeliveryTranscoder;
use reelhook_models::{CallbackTarget, DeliveryPayload, Job, JobId, JobResult};
use reelhook_storage::UploadResolver;

use crate::client::WebhookClient;
use crate::config::{resolve_target, DeliveryConfig};
use crate::error::WebhookResult;
use crate::metrics;
use crate::multipart::{encode_fields, encode_file_with_fields, FilePart};

/// Filename announced for the uploaded video.
pub const DELIVERY_FILENAME: &str = "result.mp4";

/// Form field holding the uploaded video.
pub const FILE_FIELD: &str = "file";

/// Message of the failure payload sent when a result has no usable video.
pub const NO_ARTIFACT_MESSAGE: &str = "job result contained no video artifact";

/// How the upstream job ended.
#[derive(Debug, Clone, Copy)]
pub enum JobOutcome<'a> {
    Completed(&'a JobResult),
    /// The adapter failed with this message
    Failed(&'a str),
}

/// Delivery path taken for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryRoute {
    /// No usable callback target
    NoCallback,
    /// Multipart upload of a local video file
    FileDelivery,
    /// JSON payload with a video URL (or a failure payload)
    InlineDelivery,
}

impl DeliveryRoute {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryRoute::NoCallback => "no_callback",
            DeliveryRoute::FileDelivery => "file",
            DeliveryRoute::InlineDelivery => "inline",
        }
    }
}

/// Terminal state of a delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Nothing to deliver to
    Skipped,
    Delivered {
        route: DeliveryRoute,
        /// Whether the 422 fields-only retry was needed
        fallback_used: bool,
    },
    Failed {
        route: DeliveryRoute,
        reason: String,
    },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }

    fn label(&self) -> &'static str {
        match self {
            DeliveryOutcome::Skipped => "skipped",
            DeliveryOutcome::Delivered { .. } => "delivered",
            DeliveryOutcome::Failed { .. } => "failed",
        }
    }
}

/// Delivers job outcomes to webhooks.
#[derive(Clone)]
pub struct WebhookDispatcher {
    config: DeliveryConfig,
    client: WebhookClient,
    resolver: UploadResolver,
    transcoder: DeliveryTranscoder,
}

impl WebhookDispatcher {
    pub fn new(
        config: DeliveryConfig,
        client: WebhookClient,
        resolver: UploadResolver,
        transcoder: DeliveryTranscoder,
    ) -> Self {
        Self {
            config,
            client,
            resolver,
            transcoder,
        }
    }

    pub fn config(&self) -> &DeliveryConfig {
        &self.config
    }

    /// Deliver the outcome of `job` to its callback target, if it has one.
    pub async fn dispatch(&self, job: &Job, outcome: JobOutcome<'_>) -> DeliveryOutcome {
        let target = match resolve_target(&job.input, &self.config) {
            Ok(Some(target)) => target,
            Ok(None) => {
                info!(
                    job_id = %job.id,
                    "No webhook URL or project_id, skipping delivery"
                );
                return DeliveryOutcome::Skipped;
            }
            Err(e) => {
                error!(job_id = %job.id, error = %e, "Cannot resolve callback target");
                return DeliveryOutcome::Failed {
                    route: DeliveryRoute::NoCallback,
                    reason: e.to_string(),
                };
            }
        };

        let span = info_span!(
            "webhook_delivery",
            job_id = %job.id,
            url = %target.url,
            project_id = %target.project_id
        );

        async move {
            let start = Instant::now();

            let (route, result) = match outcome {
                JobOutcome::Completed(result) => match result.existing_video_path() {
                    Some(video) => (
                        DeliveryRoute::FileDelivery,
                        self.deliver_file(&target, &job.id, result, video)
                            .await
                            .map(|()| false),
                    ),
                    None => (
                        DeliveryRoute::InlineDelivery,
                        self.deliver_inline(&target, &job.id, result).await,
                    ),
                },
                JobOutcome::Failed(message) => {
                    let payload = DeliveryPayload::failure(target.project_id.clone(), message);
                    (
                        DeliveryRoute::InlineDelivery,
                        self.post_json_with_fallback(&target, &job.id, &payload)
                            .await,
                    )
                }
            };

            let outcome = match result {
                Ok(fallback_used) => {
                    info!(route = route.as_str(), fallback_used, "Webhook delivered");
                    DeliveryOutcome::Delivered {
                        route,
                        fallback_used,
                    }
                }
                Err(e) => {
                    error!(route = route.as_str(), error = %e, "Webhook delivery failed");
                    DeliveryOutcome::Failed {
                        route,
                        reason: e.to_string(),
                    }
                }
            };

            metrics::record_delivery(
                route.as_str(),
                outcome.label(),
                start.elapsed().as_secs_f64(),
            );
            outcome
        }
        .instrument(span)
        .await
    }

    /// Multipart upload of the (transcoded) video file. No fallback.
    async fn deliver_file(
        &self,
        target: &CallbackTarget,
        job_id: &JobId,
        result: &JobResult,
        video: &Path,
    ) -> WebhookResult<()> {
        let audio = read_audio(result).await;

        let transcoded = self.transcoder.normalize(video).await;
        metrics::record_transcode(if transcoded.is_some() {
            "transcoded"
        } else {
            "original"
        });
        let upload_path = transcoded.as_deref().unwrap_or(video);

        let mut fields = vec![
            ("project_id".to_string(), target.project_id.to_string()),
            ("status".to_string(), "success".to_string()),
            ("message".to_string(), String::new()),
        ];
        if let Some(audio) = audio {
            fields.push(("audio".to_string(), audio));
        }

        let file = FilePart::new(FILE_FIELD, DELIVERY_FILENAME, upload_path);
        debug!(file = %upload_path.display(), "Delivering video as multipart upload");

        let sent = match encode_file_with_fields(&fields, &file).await {
            Ok(body) => {
                self.client
                    .post_multipart(target, job_id, body, self.config.multipart_timeout)
                    .await
            }
            Err(e) => Err(e),
        };

        if let Some(ref path) = transcoded {
            if let Err(e) = tokio::fs::remove_file(path).await {
                warn!(error = %e, "Failed to remove {}", path.display());
            }
        }

        sent
    }

    /// JSON delivery with a URL for the base64 video.
    async fn deliver_inline(
        &self,
        target: &CallbackTarget,
        job_id: &JobId,
        result: &JobResult,
    ) -> WebhookResult<bool> {
        let Some(encoded) = result.base64_video() else {
            warn!("Job result contained no video artifact, sending failure payload");
            let payload = DeliveryPayload::failure(target.project_id.clone(), NO_ARTIFACT_MESSAGE);
            return self.post_json_with_fallback(target, job_id, &payload).await;
        };

        let video_url = self.video_url_for(encoded).await;
        let audio = read_audio(result).await;
        let payload = DeliveryPayload::success(target.project_id.clone(), video_url, "", audio);

        self.post_json_with_fallback(target, job_id, &payload).await
    }

    /// Upload the decoded video, or embed the base64 in a data URL.
    ///
    /// Decodable input is embedded without whitespace; undecodable input is
    /// embedded as received.
    async fn video_url_for(&self, encoded: &str) -> String {
        let compact = strip_whitespace(encoded);
        let embedded = match STANDARD.decode(&compact) {
            Ok(bytes) => {
                let url = self
                    .resolver
                    .resolve(None, Some(bytes.as_slice()), DELIVERY_FILENAME)
                    .await;
                if !url.is_empty() {
                    metrics::record_upload_resolution("url");
                    return url;
                }
                compact.as_str()
            }
            Err(e) => {
                warn!(error = %e, "Video base64 does not decode, skipping upload");
                encoded
            }
        };

        metrics::record_upload_resolution("data_url");
        data_url(embedded)
    }

    /// POST JSON; on 422 retry exactly once as a fields-only form.
    ///
    /// Returns whether the retry was used.
    async fn post_json_with_fallback(
        &self,
        target: &CallbackTarget,
        job_id: &JobId,
        payload: &DeliveryPayload,
    ) -> WebhookResult<bool> {
        match self
            .client
            .post_json(target, job_id, payload, self.config.json_timeout)
            .await
        {
            Ok(()) => Ok(false),
            Err(e) if e.is_shape_rejection() => {
                info!("Webhook rejected JSON body with 422, retrying as form fields");
                metrics::record_fallback();

                let body = encode_fields(&payload.form_fields())?;
                self.client
                    .post_multipart(target, job_id, body, self.config.json_timeout)
                    .await?;
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }
}

/// Base64 of the audio file, if one exists and can be read.
async fn read_audio(result: &JobResult) -> Option<String> {
    let path = result.existing_audio_path()?;
    match tokio::fs::read(path).await {
        Ok(bytes) => Some(STANDARD.encode(bytes)),
        Err(e) => {
            warn!(error = %e, "Cannot read audio {}, delivering without it", path.display());
            None
        }
    }
}

fn strip_whitespace(encoded: &str) -> String {
    encoded.chars().filter(|c| !c.is_whitespace()).collect()
}

fn data_url(encoded: &str) -> String {
    format!("data:video/mp4;base64,{}", encoded)
}
