use embox_core::AppError;
use thiserror::Error;

/// Thumbnail generation errors
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// The bytes are not a raster image (or video) we can decode
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Encoder failure, decoder process failure or timeout
    #[error("Transcode failed: {0}")]
    TranscodeFailed(String),

    #[error("Invalid transcoder configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TranscodeError> for AppError {
    fn from(err: TranscodeError) -> Self {
        match err {
            TranscodeError::UnsupportedFormat(msg) => AppError::UnsupportedFormat(msg),
            TranscodeError::TranscodeFailed(msg) => AppError::TranscodeFailed(msg),
            TranscodeError::InvalidConfig(msg) => {
                AppError::Internal(format!("Invalid transcoder configuration: {}", msg))
            }
            TranscodeError::Io(e) => AppError::TranscodeFailed(format!("IO error: {}", e)),
        }
    }
}
