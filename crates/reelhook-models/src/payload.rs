//! Webhook delivery payloads.

use serde::Serialize;

use crate::ProjectId;

/// Outcome reported to the webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Success,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Success => "success",
            DeliveryStatus::Failed => "failed",
        }
    }
}

/// Body of a single delivery attempt.
///
/// Built through [`DeliveryPayload::success`] or [`DeliveryPayload::failure`]
/// and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryPayload {
    project_id: ProjectId,
    video_url: String,
    status: DeliveryStatus,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio: Option<String>,
}

impl DeliveryPayload {
    pub fn success(
        project_id: ProjectId,
        video_url: impl Into<String>,
        message: impl Into<String>,
        audio: Option<String>,
    ) -> Self {
        Self {
            project_id,
            video_url: video_url.into(),
            status: DeliveryStatus::Success,
            message: message.into(),
            audio,
        }
    }

    /// Failure payloads never carry a video URL or audio.
    pub fn failure(project_id: ProjectId, message: impl Into<String>) -> Self {
        Self {
            project_id,
            video_url: String::new(),
            status: DeliveryStatus::Failed,
            message: message.into(),
            audio: None,
        }
    }

    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    pub fn video_url(&self) -> &str {
        &self.video_url
    }

    pub fn status(&self) -> DeliveryStatus {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn audio(&self) -> Option<&str> {
        self.audio.as_deref()
    }

    /// The payload as ordered text fields, for form-encoded deliveries.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("project_id".to_string(), self.project_id.to_string()),
            ("video_url".to_string(), self.video_url.clone()),
            ("status".to_string(), self.status.as_str().to_string()),
            ("message".to_string(), self.message.clone()),
        ];
        if let Some(ref audio) = self.audio {
            fields.push(("audio".to_string(), audio.clone()));
        }
        fields
    }
}
