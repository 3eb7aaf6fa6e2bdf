//! API configuration.

use std::path::PathBuf;

use pixl_admission::AdmissionConfig;
use pixl_media::{ImageConfig, VideoConfig};

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Max request body size in bytes (must fit the video ceiling plus
    /// base64 overhead)
    pub max_body_size: usize,
    /// Result cache directory
    pub cache_dir: PathBuf,
    /// Scratch directory for transcode temp files
    pub scratch_dir: PathBuf,
    /// Environment (development/production)
    pub environment: String,
    /// Admission control knobs
    pub admission: AdmissionConfig,
    /// Image pipeline knobs
    pub image: ImageConfig,
    /// Video pipeline knobs
    pub video: VideoConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_body_size: 700 * 1024 * 1024,
            cache_dir: std::env::temp_dir().join("pixl-cache"),
            scratch_dir: std::env::temp_dir(),
            environment: "development".to_string(),
            admission: AdmissionConfig::default(),
            image: ImageConfig::default(),
            video: VideoConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            cache_dir: std::env::var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            scratch_dir: std::env::var("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.scratch_dir),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            admission: AdmissionConfig::from_env(),
            image: ImageConfig::from_env(),
            video: VideoConfig::from_env(),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}
