//! Repository implementations for media metadata
pub mod media;

pub use media::{InMemoryMediaRepository, MediaRepository, MediaUpdate};
