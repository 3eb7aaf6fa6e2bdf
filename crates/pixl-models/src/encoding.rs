//! Video encoding configuration.

use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default encoding preset (speed over compression ratio)
pub const DEFAULT_PRESET: &str = "ultrafast";
/// Default CRF (Constant Rate Factor, lower is better quality)
pub const DEFAULT_CRF: u8 = 28;
/// Audio bitrate when the caller asks to preserve audio fidelity
pub const AUDIO_BITRATE_FULL: &str = "128k";
/// Audio bitrate for the compact mono rendition
pub const AUDIO_BITRATE_COMPACT: &str = "32k";

/// Video encoding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoEncoding {
    /// Video codec (e.g., "libx264")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Encoding preset (e.g., "ultrafast", "fast", "medium")
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Audio codec
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Audio bitrate when the caller asks to preserve audio fidelity
    #[serde(default = "default_audio_bitrate_full")]
    pub audio_bitrate_full: String,

    /// Audio bitrate for the compact mono rendition
    #[serde(default = "default_audio_bitrate_compact")]
    pub audio_bitrate_compact: String,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_audio_bitrate_full() -> String {
    AUDIO_BITRATE_FULL.to_string()
}
fn default_audio_bitrate_compact() -> String {
    AUDIO_BITRATE_COMPACT.to_string()
}

impl Default for VideoEncoding {
    fn default() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: DEFAULT_CRF,
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            audio_bitrate_full: AUDIO_BITRATE_FULL.to_string(),
            audio_bitrate_compact: AUDIO_BITRATE_COMPACT.to_string(),
        }
    }
}

impl VideoEncoding {
    /// Audio bitrate for a job, depending on whether audio is preserved.
    pub fn audio_bitrate(&self, preserve_audio: bool) -> &str {
        if preserve_audio {
            &self.audio_bitrate_full
        } else {
            &self.audio_bitrate_compact
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let enc = VideoEncoding::default();
        assert_eq!(enc.codec, "libx264");
        assert_eq!(enc.preset, "ultrafast");
        assert_eq!(enc.crf, 28);
        assert_eq!(enc.audio_codec, "aac");
    }

    #[test]
    fn test_audio_bitrate_selection() {
        let enc = VideoEncoding::default();
        assert_eq!(enc.audio_bitrate(true), "128k");
        assert_eq!(enc.audio_bitrate(false), "32k");
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let enc: VideoEncoding = serde_json::from_str("{}").unwrap();
        assert_eq!(enc.preset, DEFAULT_PRESET);
        assert_eq!(enc.crf, DEFAULT_CRF);
    }
}
