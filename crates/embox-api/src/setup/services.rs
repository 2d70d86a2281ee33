//! Service initialization and application state setup

use crate::services::{MediaIngestPipeline, StreamingProxy};
use crate::state::AppState;
use anyhow::{Context, Result};
use bytes::Bytes;
use embox_core::Config;
use embox_db::{InMemoryMediaRepository, MediaRepository};
use embox_processing::{
    load_placeholder, FfmpegPosterExtractor, PosterFrameExtractor, ThumbnailSettings,
    ThumbnailTranscoder,
};
use embox_storage::{LocalThumbnailCache, RemoteStorage};
use std::sync::Arc;

/// Wire the transcoder, pipeline and proxy from configuration.
pub async fn initialize_services(
    config: &Config,
    remote: Arc<dyn RemoteStorage>,
    cache: LocalThumbnailCache,
) -> Result<Arc<AppState>> {
    let settings = ThumbnailSettings::from(config);

    let poster: Arc<dyn PosterFrameExtractor> = Arc::new(
        FfmpegPosterExtractor::new(
            config.ffmpeg_path(),
            config.transcode_temp_dir(),
            config.ffmpeg_timeout(),
            config.max_concurrent_transcodes(),
        )
        .context("Failed to configure poster extraction")?,
    );
    tracing::info!(
        ffmpeg_path = %config.ffmpeg_path(),
        max_concurrent_transcodes = config.max_concurrent_transcodes(),
        timeout_secs = config.ffmpeg_timeout().as_secs(),
        "Poster extraction configured"
    );

    let placeholder = load_placeholder(
        config.placeholder_path().map(|p| p.as_path()),
        settings.max_dimension,
        settings.quality,
    )
    .await
    .context("Failed to load placeholder image")?;

    let repository: Arc<dyn MediaRepository> = Arc::new(InMemoryMediaRepository::new());
    tracing::warn!("Using the in-memory media repository; metadata is lost on restart");

    Ok(build_state(
        repository,
        remote,
        ThumbnailTranscoder::new(poster, settings),
        cache,
        Bytes::from(placeholder),
    ))
}

/// Assemble [`AppState`] from already-built collaborators.
pub fn build_state(
    repository: Arc<dyn MediaRepository>,
    remote: Arc<dyn RemoteStorage>,
    transcoder: ThumbnailTranscoder,
    cache: LocalThumbnailCache,
    placeholder: Bytes,
) -> Arc<AppState> {
    let ingest = MediaIngestPipeline::new(
        repository.clone(),
        remote.clone(),
        transcoder,
        cache.clone(),
    );
    let proxy = StreamingProxy::new(repository.clone(), remote, cache, placeholder);

    Arc::new(AppState {
        repository,
        ingest: Arc::new(ingest),
        proxy: Arc::new(proxy),
    })
}
