//! Storage setup and initialization

use anyhow::{Context, Result};
use embox_core::Config;
use embox_storage::{LocalThumbnailCache, RemoteStorage, SeafileClient, SeafileConfig};
use std::sync::Arc;

/// Build the remote object-store client and open the local thumbnail cache.
pub async fn setup_storage(
    config: &Config,
) -> Result<(Arc<dyn RemoteStorage>, LocalThumbnailCache)> {
    let client = SeafileClient::new(SeafileConfig::from(config))
        .context("Failed to create remote storage client")?;
    tracing::info!(
        base_url = %config.storage_url(),
        repo_id = %config.storage_repo_id(),
        "Remote storage client initialized"
    );

    let cache = LocalThumbnailCache::new(config.media_dir())
        .await
        .context("Failed to open thumbnail cache")?;
    tracing::info!(path = %cache.base_path().display(), "Thumbnail cache ready");

    Ok((Arc::new(client), cache))
}
