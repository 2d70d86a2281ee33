//! Application state shared by every handler.

use crate::services::{MediaIngestPipeline, StreamingProxy};
use embox_db::MediaRepository;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn MediaRepository>,
    pub ingest: Arc<MediaIngestPipeline>,
    pub proxy: Arc<StreamingProxy>,
}
