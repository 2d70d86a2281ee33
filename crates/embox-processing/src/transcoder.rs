//! Thumbnail generation entry point
//!
//! Dispatches on media kind: images go straight through [`normalize_image`], videos first
//! have a poster frame pulled out by a [`PosterFrameExtractor`]. Other kinds have no
//! thumbnail.

use crate::error::TranscodeError;
use crate::image::normalize_image;
use crate::video::PosterFrameExtractor;
use bytes::Bytes;
use embox_core::constants::{DEFAULT_THUMBNAIL_MAX_DIMENSION, DEFAULT_THUMBNAIL_QUALITY};
use embox_core::{Config, MediaId, MediaKind};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailSettings {
    pub max_dimension: u32,
    /// Lossy WebP quality, 1-100
    pub quality: u8,
}

impl Default for ThumbnailSettings {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_THUMBNAIL_MAX_DIMENSION,
            quality: DEFAULT_THUMBNAIL_QUALITY,
        }
    }
}

impl From<&Config> for ThumbnailSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_dimension: config.thumbnail_max_dimension(),
            quality: config.thumbnail_quality(),
        }
    }
}

#[derive(Clone)]
pub struct ThumbnailTranscoder {
    poster: Arc<dyn PosterFrameExtractor>,
    settings: ThumbnailSettings,
}

impl ThumbnailTranscoder {
    pub fn new(poster: Arc<dyn PosterFrameExtractor>, settings: ThumbnailSettings) -> Self {
        Self { poster, settings }
    }

    pub fn settings(&self) -> ThumbnailSettings {
        self.settings
    }

    /// Produce the canonical WebP thumbnail of an original.
    ///
    /// CPU-bound image work runs on the blocking pool.
    #[tracing::instrument(skip(self, data), fields(media.id = id, media.kind = %kind, input_size_bytes = data.len()))]
    pub async fn normalize(
        &self,
        id: MediaId,
        kind: MediaKind,
        data: Bytes,
    ) -> Result<Vec<u8>, TranscodeError> {
        let source = match kind {
            MediaKind::Image => data,
            MediaKind::Video => Bytes::from(
                self.poster
                    .extract_poster(id, &data, self.settings.max_dimension)
                    .await?,
            ),
            MediaKind::Audio | MediaKind::Other => {
                return Err(TranscodeError::UnsupportedFormat(format!(
                    "{} media has no thumbnail",
                    kind
                )))
            }
        };

        let ThumbnailSettings {
            max_dimension,
            quality,
        } = self.settings;
        tokio::task::spawn_blocking(move || normalize_image(&source, max_dimension, quality))
            .await
            .map_err(|e| TranscodeError::TranscodeFailed(format!("Thumbnail task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut buffer = Vec::new();
        RgbaImage::from_pixel(width, height, Rgba([120, 40, 200, 255]))
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    struct FramePoster {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PosterFrameExtractor for FramePoster {
        async fn extract_poster(
            &self,
            _id: MediaId,
            _video: &[u8],
            _max_dimension: u32,
        ) -> Result<Vec<u8>, TranscodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(png(1280, 720))
        }
    }

    struct BrokenPoster;

    #[async_trait]
    impl PosterFrameExtractor for BrokenPoster {
        async fn extract_poster(
            &self,
            _id: MediaId,
            _video: &[u8],
            _max_dimension: u32,
        ) -> Result<Vec<u8>, TranscodeError> {
            Err(TranscodeError::TranscodeFailed("exit status: 1".to_string()))
        }
    }

    fn transcoder(poster: Arc<dyn PosterFrameExtractor>) -> ThumbnailTranscoder {
        ThumbnailTranscoder::new(
            poster,
            ThumbnailSettings {
                max_dimension: 256,
                quality: 75,
            },
        )
    }

    #[tokio::test]
    async fn test_image_is_normalized_without_poster() {
        let poster = Arc::new(FramePoster {
            calls: AtomicUsize::new(0),
        });
        let t = transcoder(poster.clone());

        let out = t
            .normalize(1, MediaKind::Image, Bytes::from(png(1024, 512)))
            .await
            .unwrap();

        let thumb = image::load_from_memory(&out).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (256, 128));
        assert_eq!(poster.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_video_goes_through_poster_frame() {
        let poster = Arc::new(FramePoster {
            calls: AtomicUsize::new(0),
        });
        let t = transcoder(poster.clone());

        let out = t
            .normalize(2, MediaKind::Video, Bytes::from_static(b"mp4"))
            .await
            .unwrap();

        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::WebP);
        let thumb = image::load_from_memory(&out).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (256, 144));
        assert_eq!(poster.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_poster_failure_propagates() {
        let t = transcoder(Arc::new(BrokenPoster));
        let result = t
            .normalize(3, MediaKind::Video, Bytes::from_static(b"mp4"))
            .await;
        assert!(matches!(result, Err(TranscodeError::TranscodeFailed(_))));
    }

    #[tokio::test]
    async fn test_audio_and_other_have_no_thumbnail() {
        let t = transcoder(Arc::new(BrokenPoster));
        for kind in [MediaKind::Audio, MediaKind::Other] {
            let result = t.normalize(4, kind, Bytes::from_static(b"ID3")).await;
            assert!(matches!(result, Err(TranscodeError::UnsupportedFormat(_))));
        }
    }

    #[test]
    fn test_default_settings() {
        let settings = ThumbnailSettings::default();
        assert_eq!(settings.max_dimension, 512);
        assert_eq!(settings.quality, 80);
    }
}
