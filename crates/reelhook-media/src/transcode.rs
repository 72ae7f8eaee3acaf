//! Best-effort normalization of rendered videos before delivery.
//!
//! Transcoding is an optimization: a missing tool or a failed run yields
//! `None` and the caller delivers the original file.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::command::{check_tool, FfmpegCommand, FfmpegRunner};

/// Suffix appended to the source stem for the normalized copy.
const OUTPUT_SUFFIX: &str = "_delivery";

/// Target encoding for delivered videos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryProfile {
    pub width: u32,
    pub height: u32,
    pub video_codec: String,
    pub preset: String,
    pub crf: u8,
    pub pixel_format: String,
}

impl Default for DeliveryProfile {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            video_codec: "libx264".to_string(),
            preset: "fast".to_string(),
            crf: 20,
            pixel_format: "yuv420p".to_string(),
        }
    }
}

impl DeliveryProfile {
    /// Scale to fit the frame, then letterbox to the exact size.
    pub fn scale_filter(&self) -> String {
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2",
            w = self.width,
            h = self.height
        )
    }
}

/// Transcoder configuration.
#[derive(Debug, Clone)]
pub struct TranscodeConfig {
    /// Whether transcoding is attempted at all
    pub enabled: bool,
    /// FFmpeg program name or path
    pub program: String,
    /// Optional timeout; `None` waits for ffmpeg indefinitely
    pub timeout_secs: Option<u64>,
    /// Target encoding
    pub profile: DeliveryProfile,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "ffmpeg".to_string(),
            timeout_secs: None,
            profile: DeliveryProfile::default(),
        }
    }
}

impl TranscodeConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            enabled: std::env::var("TRANSCODE_ENABLED")
                .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "no" | "off"))
                .unwrap_or(true),
            program: std::env::var("FFMPEG_BIN").unwrap_or_else(|_| "ffmpeg".to_string()),
            timeout_secs: std::env::var("TRANSCODE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok()),
            profile: DeliveryProfile::default(),
        }
    }

    /// Config that never transcodes.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

/// Produces delivery-ready copies of rendered videos.
#[derive(Debug, Clone)]
pub struct DeliveryTranscoder {
    config: TranscodeConfig,
}

impl DeliveryTranscoder {
    pub fn new(config: TranscodeConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(TranscodeConfig::from_env())
    }

    pub fn config(&self) -> &TranscodeConfig {
        &self.config
    }

    /// Path of the normalized copy: same directory, suffixed stem, `.mp4`.
    pub fn output_path_for(source: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "video".to_string());
        source.with_file_name(format!("{}{}.mp4", stem, OUTPUT_SUFFIX))
    }

    /// Build the ffmpeg invocation for the configured profile.
    pub fn build_command(&self, source: &Path, output: &Path) -> FfmpegCommand {
        let profile = &self.config.profile;
        FfmpegCommand::new(source, output)
            .video_filter(profile.scale_filter())
            .video_codec(profile.video_codec.clone())
            .preset(profile.preset.clone())
            .crf(profile.crf)
            .pixel_format(profile.pixel_format.clone())
            .audio_codec("copy")
            .movflags("+faststart")
    }

    /// Transcode `source` into the delivery profile.
    ///
    /// Returns the path of the new file, or `None` when the transcoder is
    /// disabled, unavailable, or fails. Never errors.
    pub async fn normalize(&self, source: &Path) -> Option<PathBuf> {
        if !self.config.enabled {
            debug!("Transcoding disabled, delivering {} as-is", source.display());
            return None;
        }

        if !source.is_file() {
            warn!("Transcode source {} does not exist", source.display());
            return None;
        }

        if let Err(e) = check_tool(&self.config.program).await {
            info!("Skipping transcode of {}: {}", source.display(), e);
            return None;
        }

        let output = Self::output_path_for(source);
        let cmd = self.build_command(source, &output);

        let mut runner = FfmpegRunner::new(self.config.program.clone());
        if let Some(secs) = self.config.timeout_secs {
            runner = runner.with_timeout(secs);
        }

        match runner.run(&cmd).await {
            Ok(()) if output.is_file() => {
                info!("Transcoded {} -> {}", source.display(), output.display());
                Some(output)
            }
            Ok(()) => {
                warn!("FFmpeg reported success but {} is missing", output.display());
                None
            }
            Err(e) => {
                warn!(error = %e, "Transcode of {} failed, using original", source.display());
                let _ = tokio::fs::remove_file(&output).await;
                None
            }
        }
    }
}

impl Default for DeliveryTranscoder {
    fn default() -> Self {
        Self::new(TranscodeConfig::default())
    }
}
