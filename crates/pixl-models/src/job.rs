//! Job descriptions and transform output.

use serde::{Deserialize, Serialize};

/// Default rendition height in pixels (144p).
pub const DEFAULT_TARGET_HEIGHT: u32 = 144;

/// An image transform job: the raw data-URL payload plus parameters.
#[derive(Debug, Clone)]
pub struct ImageJob {
    /// Inline payload as received (data-URL string).
    pub payload: String,
    /// Requested rendition height in pixels.
    pub target_height: u32,
}

impl ImageJob {
    pub fn new(payload: impl Into<String>, target_height: Option<u32>) -> Self {
        Self {
            payload: payload.into(),
            target_height: normalize_height(target_height),
        }
    }
}

/// A video transform job.
#[derive(Debug, Clone)]
pub struct VideoJob {
    /// Inline payload as received (data-URL string).
    pub payload: String,
    /// Requested rendition height in pixels.
    pub target_height: u32,
    /// Keep full-fidelity stereo audio instead of compact mono.
    pub preserve_audio: bool,
}

impl VideoJob {
    pub fn new(
        payload: impl Into<String>,
        target_height: Option<u32>,
        preserve_audio: bool,
    ) -> Self {
        Self {
            payload: payload.into(),
            target_height: normalize_height(target_height),
            preserve_audio,
        }
    }
}

/// An invalid or absent height falls back to the default rendition height.
fn normalize_height(height: Option<u32>) -> u32 {
    match height {
        Some(h) if h > 0 => h,
        _ => DEFAULT_TARGET_HEIGHT,
    }
}

/// Result of a successful transform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformOutput {
    /// Encoded rendition bytes.
    pub bytes: Vec<u8>,
    /// Mime type of the rendition.
    pub mime: String,
    /// Whether the rendition came from the result cache.
    pub cached: bool,
}

impl TransformOutput {
    pub fn fresh(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
            cached: false,
        }
    }

    pub fn cached(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
            cached: true,
        }
    }
}
