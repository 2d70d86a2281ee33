//! Embox Storage Library
//!
//! Two stores live here:
//!
//! - [`SeafileClient`], the [`RemoteStorage`] implementation holding every original. It
//!   speaks a token-authenticated HTTP protocol where uploads go through a short-lived
//!   upload link and downloads through a signed URL.
//! - [`LocalThumbnailCache`], a filesystem store of generated thumbnails.
//!
//! Keys for both are the slash-separated canonical paths from `embox_core::paths`.
//! Keys must not contain `..` or a leading `/`.

pub mod local;
pub mod protocol;
pub mod seafile;
pub mod traits;

// Re-export commonly used types
pub use local::LocalThumbnailCache;
pub use seafile::{SeafileClient, SeafileConfig};
pub use traits::{ByteStream, RemoteDownload, RemoteStorage, StorageError, StorageResult};
