use crate::error::TranscodeError;
use async_trait::async_trait;
use embox_core::MediaId;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::sync::Semaphore;

/// Extracts a single still frame from a video.
#[async_trait]
pub trait PosterFrameExtractor: Send + Sync {
    /// Return the first frame of `video` as PNG, scaled so neither side exceeds
    /// `max_dimension`.
    async fn extract_poster(
        &self,
        id: MediaId,
        video: &[u8],
        max_dimension: u32,
    ) -> Result<Vec<u8>, TranscodeError>;
}

/// Poster extraction through an ffmpeg child process.
///
/// Each run gets a private `media_{id}_*` working directory under `temp_root`, removed on
/// every exit path. Concurrent runs are capped by a semaphore and each one is killed when
/// it exceeds `timeout`.
pub struct FfmpegPosterExtractor {
    ffmpeg_path: String,
    temp_root: PathBuf,
    timeout: Duration,
    permits: Arc<Semaphore>,
}

impl FfmpegPosterExtractor {
    pub fn new(
        ffmpeg_path: impl Into<String>,
        temp_root: impl Into<PathBuf>,
        timeout: Duration,
        max_concurrent: usize,
    ) -> Result<Self, TranscodeError> {
        let ffmpeg_path = ffmpeg_path.into();

        let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
        if ffmpeg_path.is_empty() || ffmpeg_path.chars().any(|c| dangerous_chars.contains(&c)) {
            return Err(TranscodeError::InvalidConfig(format!(
                "Invalid ffmpeg_path: {:?}",
                ffmpeg_path
            )));
        }

        Ok(Self {
            ffmpeg_path,
            temp_root: temp_root.into(),
            timeout,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        })
    }

    fn scale_filter(max_dimension: u32) -> String {
        format!(
            "scale=w='min({m},iw)':h='min({m},ih)':force_original_aspect_ratio=decrease",
            m = max_dimension
        )
    }
}

#[async_trait]
impl PosterFrameExtractor for FfmpegPosterExtractor {
    #[tracing::instrument(skip(self, video), fields(
        media.id = id,
        video.size_bytes = video.len(),
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "poster"
    ))]
    async fn extract_poster(
        &self,
        id: MediaId,
        video: &[u8],
        max_dimension: u32,
    ) -> Result<Vec<u8>, TranscodeError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| TranscodeError::TranscodeFailed("transcoder is shutting down".into()))?;
        let start = Instant::now();

        let workdir = tempfile::Builder::new()
            .prefix(&format!("media_{}_", id))
            .tempdir_in(&self.temp_root)?;
        let input_path = workdir.path().join("orig");
        let output_path = workdir.path().join("poster.png");

        tokio::fs::write(&input_path, video).await?;

        let run = Command::new(&self.ffmpeg_path)
            .args(["-hide_banner", "-loglevel", "error", "-y", "-i"])
            .arg(&input_path)
            .arg("-vf")
            .arg(Self::scale_filter(max_dimension))
            .args(["-frames:v", "1"])
            .arg(&output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, run).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(TranscodeError::TranscodeFailed(format!(
                    "Failed to execute ffmpeg: {}",
                    e
                )))
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.timeout.as_secs_f64(),
                    "ffmpeg exceeded its time limit and was killed"
                );
                return Err(TranscodeError::TranscodeFailed(format!(
                    "ffmpeg timed out after {:.1}s",
                    self.timeout.as_secs_f64()
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranscodeError::TranscodeFailed(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let poster = tokio::fs::read(&output_path).await.map_err(|e| {
            TranscodeError::TranscodeFailed(format!("ffmpeg produced no poster frame: {}", e))
        })?;

        if let Err(e) = workdir.close() {
            tracing::warn!(error = %e, "Failed to remove transcode working directory");
        }

        tracing::debug!(
            poster_size_bytes = poster.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Poster frame extracted"
        );

        Ok(poster)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_script(dir: &Path, name: &str, body: &str) -> String {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    /// Fake decoder that writes a fixed PNG to its last argument.
    fn copying_ffmpeg(bin: &TempDir, delay_secs: f32) -> String {
        let img = RgbaImage::from_pixel(16, 9, Rgba([10, 20, 30, 255]));
        let fixture = bin.path().join("frame.png");
        img.save_with_format(&fixture, ImageFormat::Png).unwrap();

        write_script(
            bin.path(),
            "ffmpeg-ok",
            &format!(
                "sleep {}\nfor last; do :; done\ncp '{}' \"$last\"",
                delay_secs,
                fixture.display()
            ),
        )
    }

    fn leftovers(root: &Path, id: MediaId) -> Vec<String> {
        let prefix = format!("media_{}_", id);
        std::fs::read_dir(root)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with(&prefix))
            .collect()
    }

    #[tokio::test]
    async fn test_successful_run_returns_png_and_cleans_up() {
        let bin = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let extractor = FfmpegPosterExtractor::new(
            copying_ffmpeg(&bin, 0.0),
            scratch.path(),
            Duration::from_secs(10),
            2,
        )
        .unwrap();

        let poster = extractor
            .extract_poster(41, b"fake mp4 bytes", 512)
            .await
            .unwrap();

        assert_eq!(image::guess_format(&poster).unwrap(), ImageFormat::Png);
        let frame = image::load(Cursor::new(&poster), ImageFormat::Png).unwrap();
        assert_eq!((frame.width(), frame.height()), (16, 9));
        assert!(leftovers(scratch.path(), 41).is_empty());
    }

    #[tokio::test]
    async fn test_failing_decoder_is_transcode_failed_and_cleans_up() {
        let bin = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let ffmpeg = write_script(
            bin.path(),
            "ffmpeg-fail",
            "echo 'moov atom not found' >&2\nexit 1",
        );
        let extractor =
            FfmpegPosterExtractor::new(ffmpeg, scratch.path(), Duration::from_secs(10), 2).unwrap();

        let result = extractor.extract_poster(42, b"garbage", 512).await;

        match result {
            Err(TranscodeError::TranscodeFailed(msg)) => assert!(msg.contains("moov atom")),
            other => panic!("expected TranscodeFailed, got {:?}", other),
        }
        assert!(leftovers(scratch.path(), 42).is_empty());
    }

    #[tokio::test]
    async fn test_missing_output_is_transcode_failed() {
        let bin = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let ffmpeg = write_script(bin.path(), "ffmpeg-silent", "exit 0");
        let extractor =
            FfmpegPosterExtractor::new(ffmpeg, scratch.path(), Duration::from_secs(10), 2).unwrap();

        let result = extractor.extract_poster(43, b"x", 512).await;
        assert!(matches!(result, Err(TranscodeError::TranscodeFailed(_))));
        assert!(leftovers(scratch.path(), 43).is_empty());
    }

    #[tokio::test]
    async fn test_timeout_kills_decoder_and_cleans_up() {
        let bin = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let ffmpeg = write_script(bin.path(), "ffmpeg-hang", "sleep 30");
        let extractor =
            FfmpegPosterExtractor::new(ffmpeg, scratch.path(), Duration::from_millis(200), 2)
                .unwrap();

        let start = Instant::now();
        let result = extractor.extract_poster(44, b"x", 512).await;

        assert!(matches!(result, Err(TranscodeError::TranscodeFailed(_))));
        assert!(start.elapsed() < Duration::from_secs(10));
        assert!(leftovers(scratch.path(), 44).is_empty());
    }

    #[tokio::test]
    async fn test_concurrency_is_capped() {
        let bin = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let extractor = Arc::new(
            FfmpegPosterExtractor::new(
                copying_ffmpeg(&bin, 0.3),
                scratch.path(),
                Duration::from_secs(10),
                1,
            )
            .unwrap(),
        );

        let start = Instant::now();
        let (a, b) = tokio::join!(
            extractor.extract_poster(45, b"a", 512),
            extractor.extract_poster(46, b"b", 512)
        );
        a.unwrap();
        b.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(600));
    }

    #[test]
    fn test_rejects_dangerous_ffmpeg_path() {
        for path in ["ffmpeg; rm -rf /", "ffmpeg | cat", "$(ffmpeg)", ""] {
            assert!(matches!(
                FfmpegPosterExtractor::new(path, "/tmp", Duration::from_secs(1), 1),
                Err(TranscodeError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_scale_filter_bounds_both_sides_without_upscaling() {
        assert_eq!(
            FfmpegPosterExtractor::scale_filter(512),
            "scale=w='min(512,iw)':h='min(512,ih)':force_original_aspect_ratio=decrease"
        );
    }

    #[tokio::test]
    #[ignore = "requires ffmpeg on PATH"]
    async fn test_real_ffmpeg_extracts_first_frame() {
        let scratch = TempDir::new().unwrap();
        let clip = scratch.path().join("clip.mp4");
        let status = std::process::Command::new("ffmpeg")
            .args(["-hide_banner", "-loglevel", "error", "-f", "lavfi", "-i"])
            .arg("testsrc=size=1280x720:rate=5")
            .args(["-t", "1", "-pix_fmt", "yuv420p"])
            .arg(&clip)
            .status()
            .unwrap();
        assert!(status.success());

        let video = std::fs::read(&clip).unwrap();
        let extractor =
            FfmpegPosterExtractor::new("ffmpeg", scratch.path(), Duration::from_secs(30), 1)
                .unwrap();
        let poster = extractor.extract_poster(47, &video, 512).await.unwrap();

        let frame = image::load_from_memory(&poster).unwrap();
        assert_eq!((frame.width(), frame.height()), (512, 288));
        assert!(leftovers(scratch.path(), 47).is_empty());
    }
}
