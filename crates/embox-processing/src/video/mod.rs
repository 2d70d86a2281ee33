//! Video path of the transcoder: poster-frame extraction through an external decoder.

pub mod poster;

pub use poster::{FfmpegPosterExtractor, PosterFrameExtractor};
