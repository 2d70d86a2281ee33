//! Metadata store collaborator
//!
//! The ingest pipeline and the streaming proxy only ever talk to the metadata store
//! through [`MediaRepository`]. The in-memory implementation backs the dev server and tests.

pub mod db;

pub use db::{InMemoryMediaRepository, MediaRepository, MediaUpdate};
