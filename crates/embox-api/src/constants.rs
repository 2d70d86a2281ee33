/// API path prefix
pub const API_PREFIX: &str = "/api";

/// Largest request body accepted on upload routes (1 GiB)
pub const MAX_UPLOAD_BYTES: usize = 1024 * 1024 * 1024;
