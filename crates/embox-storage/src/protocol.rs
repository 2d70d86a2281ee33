//! Response envelopes of the remote object-store API.
//!
//! The API answers some calls with a JSON object and others with a bare JSON string, so
//! each call gets its own type instead of a shared generic decode.

use serde::Deserialize;

/// `POST /auth-token/` → `{"token": "..."}`
#[derive(Debug, Deserialize)]
pub struct AuthTokenResponse {
    pub token: String,
}

/// `GET /repos/{repo}/upload-link/?p=...` → `"https://..."`
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct UploadLink(pub String);

/// `GET /repos/{repo}/file/?p=...` → `"https://..."`, a signed URL for the raw bytes.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct FileLink(pub String);

/// `DELETE /repos/{repo}/file/?p=...` → `"success"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Success,
    /// Anything other than the exact JSON string `"success"`, raw body kept for logging
    Unexpected(String),
}

impl DeleteOutcome {
    pub fn parse(body: &str) -> Self {
        match serde_json::from_str::<String>(body) {
            Ok(value) if value == "success" => DeleteOutcome::Success,
            _ => DeleteOutcome::Unexpected(body.to_string()),
        }
    }
}
