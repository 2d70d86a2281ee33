use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use embox_core::{AppError, Location, MediaAsset, MediaId, NewMediaAsset};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Fields a collaborator may change on an existing asset.
///
/// `captured_on` participates in path derivation: changing it after artifacts were
/// written leaves the remote original and cached thumbnail at the old paths.
#[derive(Debug, Clone, Default)]
pub struct MediaUpdate {
    pub caption: Option<String>,
    pub captured_on: Option<NaiveDate>,
    pub location: Option<Option<Location>>,
    pub is_public: Option<bool>,
}

/// Metadata store for media assets keyed by integer id.
#[async_trait]
pub trait MediaRepository: Send + Sync {
    /// Persist a new asset, allocating its id.
    async fn create(&self, new_asset: NewMediaAsset) -> Result<MediaAsset, AppError>;

    async fn get(&self, id: MediaId) -> Result<Option<MediaAsset>, AppError>;

    /// Fetch every asset among `ids` that exists; unknown ids are skipped.
    async fn get_many(&self, ids: &[MediaId]) -> Result<Vec<MediaAsset>, AppError>;

    async fn update(&self, id: MediaId, update: MediaUpdate) -> Result<MediaAsset, AppError>;

    /// Remove the rows for `ids`, returning how many existed.
    async fn delete(&self, ids: &[MediaId]) -> Result<u64, AppError>;
}

/// Process-local [`MediaRepository`]. Ids start at 1 and are never reused.
pub struct InMemoryMediaRepository {
    rows: RwLock<BTreeMap<MediaId, MediaAsset>>,
    next_id: AtomicU64,
}

impl InMemoryMediaRepository {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

impl Default for InMemoryMediaRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaRepository for InMemoryMediaRepository {
    #[tracing::instrument(skip(self, new_asset), fields(db.table = "media", db.operation = "insert"))]
    async fn create(&self, new_asset: NewMediaAsset) -> Result<MediaAsset, AppError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let asset = MediaAsset {
            id,
            captured_on: new_asset.captured_on,
            kind: new_asset.kind,
            file_ext: new_asset.file_ext,
            caption: new_asset.caption,
            orientation: new_asset.orientation,
            location: new_asset.location,
            is_public: new_asset.is_public,
            created_at: now,
            updated_at: now,
        };

        self.rows.write().await.insert(id, asset.clone());
        tracing::debug!(media_id = id, "Media row created");
        Ok(asset)
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: MediaId) -> Result<Option<MediaAsset>, AppError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn get_many(&self, ids: &[MediaId]) -> Result<Vec<MediaAsset>, AppError> {
        let rows = self.rows.read().await;
        Ok(ids.iter().filter_map(|id| rows.get(id).cloned()).collect())
    }

    #[tracing::instrument(skip(self, update), fields(db.table = "media", db.operation = "update", db.record_id = %id))]
    async fn update(&self, id: MediaId, update: MediaUpdate) -> Result<MediaAsset, AppError> {
        let mut rows = self.rows.write().await;
        let asset = rows
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Media {} not found", id)))?;

        if let Some(caption) = update.caption {
            asset.caption = caption;
        }
        if let Some(captured_on) = update.captured_on {
            asset.captured_on = captured_on;
        }
        if let Some(location) = update.location {
            asset.location = location;
        }
        if let Some(is_public) = update.is_public {
            asset.is_public = is_public;
        }
        asset.updated_at = Utc::now();

        Ok(asset.clone())
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "delete"))]
    async fn delete(&self, ids: &[MediaId]) -> Result<u64, AppError> {
        let mut rows = self.rows.write().await;
        let removed = ids.iter().filter(|id| rows.remove(id).is_some()).count() as u64;
        Ok(removed)
    }
}
