//! Application state.

use std::sync::Arc;

use pixl_admission::AdmissionController;
use pixl_cache::FsCache;
use pixl_media::{ImagePipeline, Scratch, VideoPipeline};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub admission: Arc<AdmissionController>,
    pub images: Arc<ImagePipeline>,
    pub videos: Arc<VideoPipeline>,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: ApiConfig) -> Self {
        let admission = AdmissionController::new(config.admission.clone());
        let cache = Arc::new(FsCache::new(&config.cache_dir));
        let scratch = Scratch::new(&config.scratch_dir);

        let images = Arc::new(ImagePipeline::new(cache.clone(), config.image.clone()));
        let videos = Arc::new(VideoPipeline::new(cache, scratch, config.video.clone()));

        Self {
            config,
            admission,
            images,
            videos,
        }
    }
}
