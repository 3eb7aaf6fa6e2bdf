//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use pixl_models::VideoEncoding;

/// Image pipeline configuration.
#[derive(Debug, Clone)]
pub struct ImageConfig {
    /// Maximum decoded payload size in bytes
    pub max_bytes: usize,
    /// Maximum pixel width/height of the source
    pub max_dimension: u32,
    /// Wall-clock budget for the validated-to-encoded sequence
    pub deadline: Duration,
    /// JPEG output quality (85 bandwidth-optimized, 100 quality-preserving)
    pub jpeg_quality: u8,
    /// Blur sigma applied between the down and up stages; `None` disables
    /// the softening pass
    pub blur_sigma: Option<f32>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_bytes: 50 * 1024 * 1024,
            max_dimension: 5000,
            deadline: Duration::from_secs(30),
            jpeg_quality: 85,
            blur_sigma: Some(0.5),
        }
    }
}

impl ImageConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_bytes: env_parse("IMAGE_MAX_BYTES", defaults.max_bytes),
            max_dimension: env_parse("IMAGE_MAX_DIMENSION", defaults.max_dimension),
            deadline: Duration::from_secs(env_parse(
                "IMAGE_DEADLINE_SECS",
                defaults.deadline.as_secs(),
            )),
            jpeg_quality: env_parse("IMAGE_JPEG_QUALITY", defaults.jpeg_quality),
            blur_sigma: match std::env::var("IMAGE_BLUR_SIGMA") {
                Ok(v) if v.eq_ignore_ascii_case("off") => None,
                Ok(v) => v.parse().ok().or(defaults.blur_sigma),
                Err(_) => defaults.blur_sigma,
            },
        }
    }
}

/// Video pipeline configuration.
#[derive(Debug, Clone)]
pub struct VideoConfig {
    /// Maximum decoded payload size in bytes
    pub max_bytes: usize,
    /// Wall-clock budget for the transcode
    pub deadline: Duration,
    /// FFmpeg binary (name resolved via PATH, or an explicit path)
    pub ffmpeg_bin: PathBuf,
    /// Codec/preset/quality settings
    pub encoding: VideoEncoding,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            max_bytes: 500 * 1024 * 1024,
            deadline: Duration::from_secs(600),
            ffmpeg_bin: PathBuf::from("ffmpeg"),
            encoding: VideoEncoding::default(),
        }
    }
}

impl VideoConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_bytes: env_parse("VIDEO_MAX_BYTES", defaults.max_bytes),
            deadline: Duration::from_secs(env_parse(
                "VIDEO_DEADLINE_SECS",
                defaults.deadline.as_secs(),
            )),
            ffmpeg_bin: std::env::var("FFMPEG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffmpeg_bin),
            encoding: VideoEncoding {
                codec: env_string("VIDEO_CODEC", defaults.encoding.codec),
                preset: env_string("VIDEO_PRESET", defaults.encoding.preset),
                crf: env_parse("VIDEO_CRF", defaults.encoding.crf),
                audio_codec: env_string("VIDEO_AUDIO_CODEC", defaults.encoding.audio_codec),
                audio_bitrate_full: env_string(
                    "VIDEO_AUDIO_BITRATE_FULL",
                    defaults.encoding.audio_bitrate_full,
                ),
                audio_bitrate_compact: env_string(
                    "VIDEO_AUDIO_BITRATE_COMPACT",
                    defaults.encoding.audio_bitrate_compact,
                ),
            },
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}
