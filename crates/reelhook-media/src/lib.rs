//! FFmpeg CLI wrapper for delivery transcoding.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - A runner with optional timeout and stderr capture
//! - Best-effort normalization of rendered videos before delivery

pub mod command;
pub mod error;
pub mod transcode;

pub use command::{check_tool, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use transcode::{DeliveryProfile, DeliveryTranscoder, TranscodeConfig};
