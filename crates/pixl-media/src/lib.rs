//! Bounded transform pipelines.
//!
//! This crate provides:
//! - A generic deadline wrapper racing work against a timer
//! - Type-safe FFmpeg command building and a killing runner
//! - Unique-named scratch storage with best-effort cleanup
//! - The image pipeline (two-stage pixelating resample)
//! - The video pipeline (parameterized transcode)

pub mod command;
pub mod config;
pub mod deadline;
pub mod error;
pub mod image;
pub mod scratch;
pub mod video;

pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use config::{ImageConfig, VideoConfig};
pub use deadline::run_with_deadline;
pub use error::{MediaError, MediaResult};
pub use image::{ImagePipeline, ValidatedImage};
pub use scratch::Scratch;
pub use video::{ValidatedVideo, VideoPipeline};
