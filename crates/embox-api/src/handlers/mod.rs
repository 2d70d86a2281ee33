pub mod media_delete;
pub mod media_file;
pub mod media_thumbnail;
pub mod media_upload;
