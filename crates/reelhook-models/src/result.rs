//! Typed view over the result returned by the upstream handler.

use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Artifacts recognized in a job result.
///
/// The upstream handler returns an untyped mapping; this record reads the
/// known keys explicitly and keeps everything else in `extra`. Keys holding a
/// value of the wrong type are treated as absent and left in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobResult {
    /// Base64 video from the `video` key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
    /// Base64 video from the `video_base64` key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_base64: Option<String>,
    /// Local path of the rendered video
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_path: Option<PathBuf>,
    /// Local path of an audio side channel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_path: Option<PathBuf>,
    /// Unrecognized keys, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JobResult {
    const VIDEO: &'static str = "video";
    const VIDEO_BASE64: &'static str = "video_base64";
    const VIDEO_PATH: &'static str = "video_path";
    const AUDIO_PATH: &'static str = "audio_path";

    /// Build the typed view from the handler's raw return value.
    ///
    /// A value that is not a JSON object yields an empty result.
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::default();
        };

        let mut result = Self::default();
        for (key, value) in object {
            match (key.as_str(), value.as_str()) {
                (Self::VIDEO, Some(s)) => result.video = Some(s.to_string()),
                (Self::VIDEO_BASE64, Some(s)) => result.video_base64 = Some(s.to_string()),
                (Self::VIDEO_PATH, Some(s)) if !s.is_empty() => {
                    result.video_path = Some(PathBuf::from(s))
                }
                (Self::AUDIO_PATH, Some(s)) if !s.is_empty() => {
                    result.audio_path = Some(PathBuf::from(s))
                }
                _ => {
                    result.extra.insert(key.clone(), value.clone());
                }
            }
        }
        result
    }

    /// The base64 video source: `video` wins over `video_base64`.
    pub fn base64_video(&self) -> Option<&str> {
        let non_blank = |s: &&str| !s.trim().is_empty();
        self.video
            .as_deref()
            .filter(non_blank)
            .or_else(|| self.video_base64.as_deref().filter(non_blank))
    }

    /// The video path, only if it exists on disk.
    pub fn existing_video_path(&self) -> Option<&Path> {
        self.video_path.as_deref().filter(|p| p.is_file())
    }

    /// The audio path, only if it exists on disk.
    pub fn existing_audio_path(&self) -> Option<&Path> {
        self.audio_path.as_deref().filter(|p| p.is_file())
    }
}
