//! Media services behind the HTTP handlers.

pub mod ingest;
pub mod streaming;

pub use ingest::{BatchIngest, DeleteSummary, MediaIngestPipeline};
pub use streaming::{passthrough_headers, ProxiedOriginal, StreamingProxy, Thumbnail};
