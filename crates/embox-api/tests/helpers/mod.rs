//! Test helpers: build the pipeline, proxy and router against in-process collaborators.
//!
//! Run from workspace root: `cargo test -p embox-api`.

#![allow(dead_code)]

pub mod fixtures;
pub mod storage;

use axum_test::TestServer;
use bytes::Bytes;
use embox_api::setup::{routes, services::build_state};
use embox_api::AppState;
use embox_db::{InMemoryMediaRepository, MediaRepository};
use embox_processing::{
    render_placeholder, PosterFrameExtractor, ThumbnailSettings, ThumbnailTranscoder,
};
use embox_storage::{LocalThumbnailCache, RemoteStorage};
use std::sync::Arc;
use tempfile::TempDir;

pub use storage::{FakePoster, MemoryRemote};

pub const MAX_DIMENSION: u32 = 384;

/// Collaborators plus the state built from them.
pub struct TestContext {
    pub state: Arc<AppState>,
    pub repository: Arc<InMemoryMediaRepository>,
    pub remote: Arc<MemoryRemote>,
    pub cache: LocalThumbnailCache,
    pub placeholder: Bytes,
    pub _media_dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_poster(Arc::new(FakePoster::new())).await
    }

    pub async fn with_poster(poster: Arc<dyn PosterFrameExtractor>) -> Self {
        let media_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let cache = LocalThumbnailCache::new(media_dir.path())
            .await
            .expect("Failed to create thumbnail cache");

        let repository = Arc::new(InMemoryMediaRepository::new());
        let remote = Arc::new(MemoryRemote::new());
        let settings = ThumbnailSettings {
            max_dimension: MAX_DIMENSION,
            quality: 80,
        };
        let placeholder = Bytes::from(render_placeholder(MAX_DIMENSION, 80).unwrap());

        let state = build_state(
            repository.clone() as Arc<dyn MediaRepository>,
            remote.clone() as Arc<dyn RemoteStorage>,
            ThumbnailTranscoder::new(poster, settings),
            cache.clone(),
            placeholder.clone(),
        );

        Self {
            state,
            repository,
            remote,
            cache,
            placeholder,
            _media_dir: media_dir,
        }
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(routes::setup_routes(self.state.clone())).expect("Failed to start test server")
    }
}
