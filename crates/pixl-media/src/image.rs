//! Image transform pipeline.
//!
//! Deliberately degrades detail by resampling down to the target height and
//! back up to the original dimensions, so the output keeps its size but
//! reads as pixelated. Everything is in-memory; a lost deadline simply
//! drops the intermediate buffers.

use std::io::Cursor;
use std::sync::Arc;

use image::imageops::FilterType;
use image::io::Reader as ImageReader;
use image::{DynamicImage, ImageOutputFormat};
use tracing::{debug, info};

use pixl_cache::{ContentCache, JobKey};
use pixl_models::{DataUrl, ImageFormat, ImageJob, TransformOutput};

use crate::config::ImageConfig;
use crate::deadline::run_with_deadline;
use crate::error::{MediaError, MediaResult};

/// An image job that passed validation: decoded payload, accepted format,
/// probed dimensions.
#[derive(Debug)]
pub struct ValidatedImage {
    payload: Vec<u8>,
    format: ImageFormat,
    width: u32,
    height: u32,
    target_height: u32,
}

impl ValidatedImage {
    /// Source dimensions as probed during validation.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }
}

/// The pixelating image pipeline.
pub struct ImagePipeline {
    cache: Arc<dyn ContentCache>,
    config: ImageConfig,
}

impl ImagePipeline {
    pub fn new(cache: Arc<dyn ContentCache>, config: ImageConfig) -> Self {
        Self { cache, config }
    }

    /// Validate a job without doing any expensive work.
    ///
    /// Checks, in order: data-URL framing, mime allowlist, decoded size,
    /// pixel dimensions. Each failure is a hard rejection.
    pub fn validate(&self, job: &ImageJob) -> MediaResult<ValidatedImage> {
        let data = DataUrl::parse(&job.payload, "image")
            .map_err(|e| MediaError::invalid_input(e.to_string()))?;

        let format = ImageFormat::from_mime(data.mime())
            .ok_or_else(|| MediaError::UnsupportedFormat(data.mime().to_string()))?;

        let payload = data.into_bytes();
        if payload.len() > self.config.max_bytes {
            return Err(MediaError::TooLarge {
                size: payload.len(),
                limit: self.config.max_bytes,
            });
        }

        // Probe dimensions without a full decode
        let (width, height) = ImageReader::new(Cursor::new(&payload))
            .with_guessed_format()
            .map_err(MediaError::Io)?
            .into_dimensions()
            .map_err(|e| MediaError::unsupported_content(e.to_string()))?;

        if width == 0
            || height == 0
            || width > self.config.max_dimension
            || height > self.config.max_dimension
        {
            return Err(MediaError::InvalidDimensions {
                width,
                height,
                limit: self.config.max_dimension,
            });
        }

        Ok(ValidatedImage {
            payload,
            format,
            width,
            height,
            target_height: job.target_height,
        })
    }

    /// Run the resample under the configured deadline, consulting the cache
    /// on both sides of the expensive work.
    pub async fn execute(&self, validated: ValidatedImage) -> MediaResult<TransformOutput> {
        let key = self.job_key(&validated);

        if let Some(bytes) = self.cache.get(&key).await {
            return Ok(TransformOutput::cached(bytes, "image/jpeg"));
        }

        let config = self.config.clone();
        let (width, height) = validated.dimensions();
        let target_height = validated.target_height;
        let payload = validated.payload;

        let work = async move {
            tokio::task::spawn_blocking(move || {
                resample(&payload, width, height, target_height, &config)
            })
            .await
            .map_err(|e| MediaError::internal(format!("resample task failed: {}", e)))?
        };
        let bytes = run_with_deadline(work, self.config.deadline).await?;

        info!(
            width,
            height,
            target_height,
            output_bytes = bytes.len(),
            "Image pixelated"
        );

        self.cache.put(&key, &bytes).await;
        Ok(TransformOutput::fresh(bytes, "image/jpeg"))
    }

    /// Validate then execute.
    pub async fn process(&self, job: &ImageJob) -> MediaResult<TransformOutput> {
        let validated = self.validate(job)?;
        self.execute(validated).await
    }

    fn job_key(&self, validated: &ValidatedImage) -> JobKey {
        let blur = match self.config.blur_sigma {
            Some(sigma) => format!("{:.2}", sigma),
            None => "off".to_string(),
        };
        JobKey::compute(
            &validated.payload,
            &[
                ("op", "pixelate".to_string()),
                ("target_height", validated.target_height.to_string()),
                ("quality", self.config.jpeg_quality.to_string()),
                ("blur", blur),
            ],
        )
    }
}

/// Dimensions of the intermediate (downsampled) stage.
///
/// The scale factor is clamped to 1 so the downsample stage never enlarges;
/// both dimensions are floored at one pixel.
pub fn downsample_dimensions(width: u32, height: u32, target_height: u32) -> (u32, u32) {
    let scale = (target_height as f64 / height as f64).min(1.0);
    let small_w = ((width as f64 * scale).round() as u32).max(1);
    let small_h = ((height as f64 * scale).round() as u32).max(1);
    (small_w, small_h)
}

/// Two-stage resample: stretch-fit down to the intermediate size, soften,
/// then Lanczos back up to the original dimensions, encoded as JPEG.
fn resample(
    payload: &[u8],
    width: u32,
    height: u32,
    target_height: u32,
    config: &ImageConfig,
) -> MediaResult<Vec<u8>> {
    let img = image::load_from_memory(payload)
        .map_err(|e| MediaError::unsupported_content(e.to_string()))?;

    let (small_w, small_h) = downsample_dimensions(width, height, target_height);
    debug!(small_w, small_h, "Downsample stage");

    let down = img.resize_exact(small_w, small_h, FilterType::Triangle);
    let down = match config.blur_sigma {
        Some(sigma) => down.blur(sigma),
        None => down,
    };
    let up = down.resize_exact(width, height, FilterType::Lanczos3);

    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(up.to_rgb8());
    let mut out = Cursor::new(Vec::new());
    rgb.write_to(&mut out, ImageOutputFormat::Jpeg(config.jpeg_quality))
        .map_err(|e| MediaError::internal(format!("JPEG encode failed: {}", e)))?;

    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixl_cache::MemoryCache;
    use pixl_models::data_url::to_data_url;

    fn png_data_url(width: u32, height: u32) -> String {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageOutputFormat::Png).unwrap();
        to_data_url("image/png", &out.into_inner())
    }

    fn pipeline() -> ImagePipeline {
        ImagePipeline::new(Arc::new(MemoryCache::new()), ImageConfig::default())
    }

    #[test]
    fn test_downsample_dimensions_scales_by_height() {
        assert_eq!(downsample_dimensions(200, 100, 50), (100, 50));
        assert_eq!(downsample_dimensions(640, 480, 144), (192, 144));
    }

    #[test]
    fn test_downsample_never_enlarges() {
        assert_eq!(downsample_dimensions(200, 100, 100), (200, 100));
        assert_eq!(downsample_dimensions(200, 100, 500), (200, 100));
    }

    #[test]
    fn test_downsample_floors_at_one_pixel() {
        assert_eq!(downsample_dimensions(3, 2000, 1), (1, 1));
    }

    #[tokio::test]
    async fn test_pixelate_restores_original_dimensions() {
        let pipeline = pipeline();
        let job = ImageJob::new(png_data_url(200, 100), Some(50));

        let output = pipeline.process(&job).await.unwrap();
        assert_eq!(output.mime, "image/jpeg");
        assert!(!output.cached);

        let decoded = image::load_from_memory(&output.bytes).unwrap();
        assert_eq!(decoded.width(), 200);
        assert_eq!(decoded.height(), 100);
    }

    #[tokio::test]
    async fn test_target_above_source_height_is_clamped() {
        let pipeline = pipeline();
        let job = ImageJob::new(png_data_url(64, 32), Some(500));

        let output = pipeline.process(&job).await.unwrap();
        let decoded = image::load_from_memory(&output.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 32));
    }

    #[tokio::test]
    async fn test_second_run_hits_cache() {
        let cache = Arc::new(MemoryCache::new());
        let pipeline = ImagePipeline::new(Arc::clone(&cache) as Arc<dyn ContentCache>, ImageConfig::default());
        let job = ImageJob::new(png_data_url(40, 20), Some(10));

        let first = pipeline.process(&job).await.unwrap();
        assert!(!first.cached);
        assert_eq!(cache.len(), 1);

        let second = pipeline.process(&job).await.unwrap();
        assert!(second.cached);
        assert_eq!(second.bytes, first.bytes);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_rejects_non_data_url() {
        let pipeline = pipeline();
        let job = ImageJob::new("just some text", Some(50));
        assert!(matches!(
            pipeline.validate(&job),
            Err(MediaError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rejects_disallowed_mime() {
        let pipeline = pipeline();
        let job = ImageJob::new(to_data_url("image/webp", b"bytes"), Some(50));
        assert!(matches!(
            pipeline.validate(&job),
            Err(MediaError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_rejects_oversized_payload_before_decode() {
        let config = ImageConfig {
            max_bytes: 16,
            ..ImageConfig::default()
        };
        let pipeline = ImagePipeline::new(Arc::new(MemoryCache::new()), config);
        // Not a real image; the size check must fire before any decode
        let job = ImageJob::new(to_data_url("image/png", &[0u8; 64]), Some(50));
        assert!(matches!(
            pipeline.validate(&job),
            Err(MediaError::TooLarge { size: 64, limit: 16 })
        ));
    }

    #[test]
    fn test_rejects_oversized_dimensions() {
        let config = ImageConfig {
            max_dimension: 100,
            ..ImageConfig::default()
        };
        let pipeline = ImagePipeline::new(Arc::new(MemoryCache::new()), config);
        let job = ImageJob::new(png_data_url(200, 50), Some(20));
        assert!(matches!(
            pipeline.validate(&job),
            Err(MediaError::InvalidDimensions { width: 200, .. })
        ));
    }

    #[test]
    fn test_rejects_undecodable_bytes_as_unsupported_content() {
        let pipeline = pipeline();
        let job = ImageJob::new(to_data_url("image/png", b"definitely not a png"), Some(50));
        assert!(matches!(
            pipeline.validate(&job),
            Err(MediaError::UnsupportedContent(_))
        ));
    }

    #[tokio::test]
    async fn test_blur_stage_is_optional() {
        let config = ImageConfig {
            blur_sigma: None,
            ..ImageConfig::default()
        };
        let pipeline = ImagePipeline::new(Arc::new(MemoryCache::new()), config);
        let job = ImageJob::new(png_data_url(40, 20), Some(10));

        let output = pipeline.process(&job).await.unwrap();
        let decoded = image::load_from_memory(&output.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 20));
    }
}
