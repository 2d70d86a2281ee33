//! Media ingestion and removal.
//!
//! Ordering matters on the write path: the metadata row is created first so the id exists,
//! then the original is uploaded. A failed upload deletes the row again, so no asset ever
//! points at a missing remote original. Everything after the upload is best-effort.

use bytes::Bytes;
use embox_core::{AppError, MediaAsset, MediaId, NewMediaAsset};
use embox_db::MediaRepository;
use embox_processing::ThumbnailTranscoder;
use embox_storage::{LocalThumbnailCache, RemoteStorage};
use std::sync::Arc;
use std::time::Instant;

/// Result of [`MediaIngestPipeline::ingest_batch`].
#[derive(Debug)]
pub struct BatchIngest {
    /// Assets created before the batch stopped, in input order
    pub created: Vec<MediaAsset>,
    /// The fatal error that stopped the batch, if any
    pub failure: Option<AppError>,
}

/// What a best-effort delete actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteSummary {
    pub requested: usize,
    /// Metadata rows removed
    pub removed: u64,
    /// Remote originals that could not be deleted and may be orphaned
    pub remote_failures: usize,
}

#[derive(Clone)]
pub struct MediaIngestPipeline {
    repository: Arc<dyn MediaRepository>,
    remote: Arc<dyn RemoteStorage>,
    transcoder: ThumbnailTranscoder,
    cache: LocalThumbnailCache,
}

impl MediaIngestPipeline {
    pub fn new(
        repository: Arc<dyn MediaRepository>,
        remote: Arc<dyn RemoteStorage>,
        transcoder: ThumbnailTranscoder,
        cache: LocalThumbnailCache,
    ) -> Self {
        Self {
            repository,
            remote,
            transcoder,
            cache,
        }
    }

    /// Persist, upload and thumbnail one file.
    ///
    /// Only metadata and upload failures are returned. A file that cannot be thumbnailed
    /// still becomes an asset, it just has no cached thumbnail.
    #[tracing::instrument(skip(self, new_asset, data), fields(media.kind = %new_asset.kind, size_bytes = data.len()))]
    pub async fn ingest(
        &self,
        new_asset: NewMediaAsset,
        data: Bytes,
    ) -> Result<MediaAsset, AppError> {
        let start = Instant::now();
        let asset = self.repository.create(new_asset).await?;
        let paths = asset.paths();

        if let Err(e) = self.remote.upload(&paths.remote, data.to_vec()).await {
            tracing::error!(
                error = %e,
                media_id = asset.id,
                remote_path = %paths.remote,
                "Upload of original failed, removing metadata row"
            );
            if let Err(cleanup) = self.repository.delete(&[asset.id]).await {
                tracing::error!(
                    error = %cleanup,
                    media_id = asset.id,
                    "Failed to remove metadata row after upload failure"
                );
            }
            return Err(e.into());
        }

        if asset.has_thumbnail() {
            self.store_thumbnail(&asset, &paths.local_thumbnail, data)
                .await;
        }

        tracing::info!(
            media_id = asset.id,
            remote_path = %paths.remote,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Media ingested"
        );

        Ok(asset)
    }

    async fn store_thumbnail(&self, asset: &MediaAsset, local_path: &str, data: Bytes) {
        let thumbnail = match self.transcoder.normalize(asset.id, asset.kind, data).await {
            Ok(thumbnail) => thumbnail,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    media_id = asset.id,
                    media_kind = %asset.kind,
                    "Thumbnail generation failed, asset kept without thumbnail"
                );
                return;
            }
        };

        if let Err(e) = self.cache.put(local_path, &thumbnail).await {
            tracing::warn!(
                error = %e,
                media_id = asset.id,
                local_path = %local_path,
                "Failed to cache thumbnail"
            );
        }
    }

    /// Ingest files one after another, stopping at the first fatal error.
    pub async fn ingest_batch(&self, items: Vec<(NewMediaAsset, Bytes)>) -> BatchIngest {
        let mut created = Vec::with_capacity(items.len());

        for (index, (new_asset, data)) in items.into_iter().enumerate() {
            match self.ingest(new_asset, data).await {
                Ok(asset) => created.push(asset),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        index,
                        created = created.len(),
                        "Batch upload stopped"
                    );
                    return BatchIngest {
                        created,
                        failure: Some(e),
                    };
                }
            }
        }

        BatchIngest {
            created,
            failure: None,
        }
    }

    /// Remove assets and their artifacts.
    ///
    /// Unknown ids are skipped. For each known asset the cached thumbnail and the remote
    /// original are removed if possible; failures are logged and do not stop the metadata
    /// rows from being deleted. Only a metadata-store failure is returned.
    #[tracing::instrument(skip(self), fields(requested = ids.len()))]
    pub async fn delete(&self, ids: &[MediaId]) -> Result<DeleteSummary, AppError> {
        let assets = self.repository.get_many(ids).await?;
        let mut remote_failures = 0;

        for asset in &assets {
            let paths = asset.paths();

            if let Err(e) = self.cache.remove(&paths.local_thumbnail).await {
                tracing::warn!(
                    error = %e,
                    media_id = asset.id,
                    local_path = %paths.local_thumbnail,
                    "Failed to remove cached thumbnail"
                );
            }

            if let Err(e) = self.remote.delete(&paths.remote).await {
                remote_failures += 1;
                tracing::error!(
                    error = %e,
                    media_id = asset.id,
                    remote_path = %paths.remote,
                    "Failed to delete remote original, it may be orphaned"
                );
            }
        }

        let found: Vec<MediaId> = assets.iter().map(|a| a.id).collect();
        let removed = self.repository.delete(&found).await?;

        tracing::info!(
            requested = ids.len(),
            removed,
            remote_failures,
            "Media deleted"
        );

        Ok(DeleteSummary {
            requested: ids.len(),
            removed,
            remote_failures,
        })
    }
}
