//! Video transform pipeline.
//!
//! Filesystem-backed: the payload is materialized to a unique scratch file,
//! transcoded with FFmpeg under a deadline, and both scratch files are
//! removed on every exit path.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio::fs;
use tracing::info;

use pixl_cache::{ContentCache, JobKey};
use pixl_models::{DataUrl, TransformOutput, VideoFormat, VideoJob};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::config::VideoConfig;
use crate::deadline::run_with_deadline;
use crate::error::{MediaError, MediaResult};
use crate::scratch::Scratch;

/// A video job that passed validation.
#[derive(Debug)]
pub struct ValidatedVideo {
    payload: Vec<u8>,
    format: VideoFormat,
    target_height: u32,
    preserve_audio: bool,
}

impl ValidatedVideo {
    pub fn format(&self) -> VideoFormat {
        self.format
    }

    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }
}

/// The downscaling video pipeline.
pub struct VideoPipeline {
    cache: Arc<dyn ContentCache>,
    scratch: Scratch,
    config: VideoConfig,
}

impl VideoPipeline {
    pub fn new(cache: Arc<dyn ContentCache>, scratch: Scratch, config: VideoConfig) -> Self {
        Self {
            cache,
            scratch,
            config,
        }
    }

    /// Validate a job without touching the filesystem.
    pub fn validate(&self, job: &VideoJob) -> MediaResult<ValidatedVideo> {
        let data = DataUrl::parse(&job.payload, "video")
            .map_err(|e| MediaError::invalid_input(e.to_string()))?;

        let format = VideoFormat::from_mime(data.mime())
            .ok_or_else(|| MediaError::UnsupportedFormat(data.mime().to_string()))?;

        let payload = data.into_bytes();
        if payload.len() > self.config.max_bytes {
            return Err(MediaError::TooLarge {
                size: payload.len(),
                limit: self.config.max_bytes,
            });
        }

        Ok(ValidatedVideo {
            payload,
            format,
            target_height: job.target_height,
            preserve_audio: job.preserve_audio,
        })
    }

    /// Transcode under the configured deadline.
    ///
    /// Scratch input and output are deleted whether the transcode succeeds,
    /// fails, or loses the deadline race.
    pub async fn execute(&self, validated: ValidatedVideo) -> MediaResult<TransformOutput> {
        let key = self.job_key(&validated);

        if let Some(bytes) = self.cache.get(&key).await {
            return Ok(TransformOutput::cached(bytes, "video/mp4"));
        }

        let input = self.scratch.allocate("pixl-in", "mp4");
        let output = self.scratch.allocate("pixl-out", "mp4");
        let started = Instant::now();
        let original_size = validated.payload.len();

        let result = run_with_deadline(
            self.transcode(validated, &input, &output),
            self.config.deadline,
        )
        .await;

        // Cleanup contract: both scratch files go away on every exit path
        self.scratch.discard(&[input.as_path(), output.as_path()]).await;

        let (bytes, preserve_audio) = result?;

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            original_bytes = original_size,
            processed_bytes = bytes.len(),
            audio = if preserve_audio { "full" } else { "compact" },
            "Video transcoded"
        );

        self.cache.put(&key, &bytes).await;
        Ok(TransformOutput::fresh(bytes, "video/mp4"))
    }

    /// Validate then execute.
    pub async fn process(&self, job: &VideoJob) -> MediaResult<TransformOutput> {
        let validated = self.validate(job)?;
        self.execute(validated).await
    }

    async fn transcode(
        &self,
        validated: ValidatedVideo,
        input: &Path,
        output: &Path,
    ) -> MediaResult<(Vec<u8>, bool)> {
        let preserve_audio = validated.preserve_audio;
        self.scratch.write(input, &validated.payload).await?;

        let cmd = self.build_command(&validated, input, output);
        FfmpegRunner::with_program(&self.config.ffmpeg_bin)
            .run(&cmd)
            .await?;

        let bytes = fs::read(output).await?;
        Ok((bytes, preserve_audio))
    }

    /// Build the transcode command: height-bounded scale with an even,
    /// aspect-preserving width, fixed codecs, speed-leaning preset,
    /// front-loaded container metadata.
    fn build_command(&self, validated: &ValidatedVideo, input: &Path, output: &Path) -> FfmpegCommand {
        let enc = &self.config.encoding;
        let cmd = FfmpegCommand::new(input, output)
            .video_filter(format!("scale=-2:{}", validated.target_height))
            .video_codec(&enc.codec)
            .audio_codec(&enc.audio_codec)
            .audio_bitrate(enc.audio_bitrate(validated.preserve_audio))
            .preset(&enc.preset)
            .crf(enc.crf)
            .faststart();

        if validated.preserve_audio {
            cmd
        } else {
            cmd.audio_channels(1)
        }
    }

    fn job_key(&self, validated: &ValidatedVideo) -> JobKey {
        JobKey::compute(
            &validated.payload,
            &[
                ("op", "transcode".to_string()),
                ("target_height", validated.target_height.to_string()),
                ("preserve_audio", validated.preserve_audio.to_string()),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixl_cache::MemoryCache;
    use pixl_models::data_url::to_data_url;
    use tempfile::TempDir;

    fn pipeline_with(dir: &TempDir) -> VideoPipeline {
        VideoPipeline::new(
            Arc::new(MemoryCache::new()),
            Scratch::new(dir.path()),
            VideoConfig::default(),
        )
    }

    fn mp4_job(bytes: &[u8]) -> VideoJob {
        VideoJob::new(to_data_url("video/mp4", bytes), Some(144), false)
    }

    #[test]
    fn test_rejects_non_data_url() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(&dir);
        let job = VideoJob::new("nope", None, false);
        assert!(matches!(
            pipeline.validate(&job),
            Err(MediaError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rejects_disallowed_mime() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(&dir);
        let job = VideoJob::new(to_data_url("video/x-msvideo", b"avi"), None, false);
        assert!(matches!(
            pipeline.validate(&job),
            Err(MediaError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_rejects_oversized_payload() {
        let dir = TempDir::new().unwrap();
        let config = VideoConfig {
            max_bytes: 8,
            ..VideoConfig::default()
        };
        let pipeline = VideoPipeline::new(
            Arc::new(MemoryCache::new()),
            Scratch::new(dir.path()),
            config,
        );
        let job = mp4_job(&[0u8; 32]);
        assert!(matches!(
            pipeline.validate(&job),
            Err(MediaError::TooLarge { size: 32, limit: 8 })
        ));
    }

    #[test]
    fn test_accepts_all_allowed_mimes() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(&dir);
        for mime in ["video/mp4", "video/webm", "video/quicktime"] {
            let job = VideoJob::new(to_data_url(mime, b"bytes"), None, false);
            assert!(pipeline.validate(&job).is_ok(), "{} should validate", mime);
        }
    }

    #[test]
    fn test_command_audio_modes() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(&dir);

        let compact = pipeline
            .validate(&VideoJob::new(to_data_url("video/mp4", b"x"), Some(144), false))
            .unwrap();
        let args = pipeline
            .build_command(&compact, Path::new("in.mp4"), Path::new("out.mp4"))
            .build_args();
        assert!(args.contains(&"32k".to_string()));
        assert!(args.contains(&"-ac".to_string()));
        assert!(args.contains(&"1".to_string()));

        let full = pipeline
            .validate(&VideoJob::new(to_data_url("video/mp4", b"x"), Some(144), true))
            .unwrap();
        let args = pipeline
            .build_command(&full, Path::new("in.mp4"), Path::new("out.mp4"))
            .build_args();
        assert!(args.contains(&"128k".to_string()));
        assert!(!args.contains(&"-ac".to_string()));
    }

    #[test]
    fn test_command_scales_to_target_height() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(&dir);
        let validated = pipeline
            .validate(&VideoJob::new(to_data_url("video/mp4", b"x"), Some(240), false))
            .unwrap();
        let args = pipeline
            .build_command(&validated, Path::new("in.mp4"), Path::new("out.mp4"))
            .build_args();
        assert!(args.contains(&"scale=-2:240".to_string()));
        assert!(args.contains(&"ultrafast".to_string()));
        assert!(args.contains(&"28".to_string()));
    }

    #[tokio::test]
    async fn test_failed_transcode_leaves_no_scratch_files() {
        // Garbage bytes fail the transcode whether or not ffmpeg is
        // installed; either way the scratch directory must end up empty.
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(&dir);

        let result = pipeline.process(&mp4_job(b"not really a video")).await;
        assert!(result.is_err());

        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(leftovers.is_empty(), "scratch files were not cleaned up");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_lost_deadline_returns_timeout_and_cleans_scratch() {
        use std::os::unix::fs::PermissionsExt;
        use std::time::Duration;

        // A transcoder that never finishes within the budget
        let dir = TempDir::new().unwrap();
        let stub = dir.path().join("ffmpeg-stall");
        std::fs::write(&stub, "#!/bin/sh\nsleep 5\n").unwrap();
        std::fs::set_permissions(&stub, std::fs::Permissions::from_mode(0o755)).unwrap();

        let scratch_root = dir.path().join("scratch");
        let config = VideoConfig {
            deadline: Duration::from_millis(200),
            ffmpeg_bin: stub,
            ..VideoConfig::default()
        };
        let pipeline = VideoPipeline::new(
            Arc::new(MemoryCache::new()),
            Scratch::new(&scratch_root),
            config,
        );

        let result = pipeline.process(&mp4_job(b"payload")).await;
        assert!(matches!(result, Err(MediaError::Timeout(_))));

        let leftovers: Vec<_> = std::fs::read_dir(&scratch_root).unwrap().collect();
        assert!(leftovers.is_empty(), "scratch files survived the timeout");
    }

    #[tokio::test]
    async fn test_cache_hit_skips_transcode() {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(MemoryCache::new());
        let pipeline = VideoPipeline::new(
            Arc::clone(&cache) as Arc<dyn ContentCache>,
            Scratch::new(dir.path()),
            VideoConfig::default(),
        );

        // Pre-seed the cache under the job's key; execute must return it
        // without touching FFmpeg or the scratch directory.
        let job = mp4_job(b"payload");
        let validated = pipeline.validate(&job).unwrap();
        let key = pipeline.job_key(&validated);
        cache.put(&key, b"rendition").await;

        let output = pipeline.execute(validated).await.unwrap();
        assert!(output.cached);
        assert_eq!(output.bytes, b"rendition");
        assert_eq!(output.mime, "video/mp4");
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_job_key_depends_on_audio_mode() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(&dir);

        let compact = pipeline
            .validate(&VideoJob::new(to_data_url("video/mp4", b"x"), Some(144), false))
            .unwrap();
        let full = pipeline
            .validate(&VideoJob::new(to_data_url("video/mp4", b"x"), Some(144), true))
            .unwrap();
        assert_ne!(pipeline.job_key(&compact), pipeline.job_key(&full));
    }
}
