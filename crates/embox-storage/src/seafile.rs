//! Remote object store client
//!
//! Every control-plane call carries `Authorization: Token <t>`. The token is fetched
//! lazily, cached for the life of the client and dropped only when the server rejects it.

use crate::protocol::{AuthTokenResponse, DeleteOutcome, FileLink, UploadLink};
use crate::traits::{RemoteDownload, RemoteStorage, StorageError, StorageResult};
use async_trait::async_trait;
use embox_core::Config;
use futures::TryStreamExt;
use http::{header, HeaderMap, StatusCode};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const DELETE_ACCEPT: &str = "application/json; charset=utf-8; indent=4";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for [`SeafileClient`].
#[derive(Clone)]
pub struct SeafileConfig {
    /// API root, e.g. `https://sync.luckycloud.de/api2`
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub repo_id: String,
    /// Applied to auth, link requests, uploads and deletes. Streaming downloads are not
    /// bounded since they last as long as the client keeps reading.
    pub timeout: Duration,
}

impl fmt::Debug for SeafileConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeafileConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"***")
            .field("repo_id", &self.repo_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl From<&Config> for SeafileConfig {
    fn from(config: &Config) -> Self {
        Self {
            base_url: config.storage_url().to_string(),
            username: config.storage_username().to_string(),
            password: config.storage_password().to_string(),
            repo_id: config.storage_repo_id().to_string(),
            timeout: config.storage_timeout(),
        }
    }
}

/// [`RemoteStorage`] backed by a Seafile-style library ("repo").
pub struct SeafileClient {
    http: Client,
    config: SeafileConfig,
    token: Mutex<Option<String>>,
}

impl SeafileClient {
    pub fn new(config: SeafileConfig) -> StorageResult<Self> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config: SeafileConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
            token: Mutex::new(None),
        })
    }

    /// Start with a token obtained elsewhere instead of exchanging credentials on first use.
    pub fn with_token(self, token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
            ..self
        }
    }

    /// Return the cached token, exchanging the configured credentials for one if needed.
    ///
    /// The lock is held across the network call, so concurrent first callers wait for a
    /// single exchange and then all observe its token.
    pub async fn auth(&self) -> StorageResult<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        let start = Instant::now();
        let response = self
            .http
            .post(format!("{}/auth-token/", self.config.base_url))
            .form(&[
                ("username", self.config.username.as_str()),
                ("password", self.config.password.as_str()),
            ])
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| StorageError::AuthFailed(format!("Failed to request auth token: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::AuthFailed(format!(
                "status {}: {}",
                status, body
            )));
        }

        let AuthTokenResponse { token } = response.json().await.map_err(|e| {
            StorageError::AuthFailed(format!("Failed to decode auth response: {}", e))
        })?;

        tracing::info!(
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Remote storage token acquired"
        );

        *cached = Some(token.clone());
        Ok(token)
    }

    /// Drop the cached token; the next call re-authenticates.
    pub async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    /// Drop the cached token only if it is still `rejected`, so a token another caller
    /// already refreshed survives.
    async fn invalidate_if_current(&self, rejected: &str) {
        let mut cached = self.token.lock().await;
        if cached.as_deref() == Some(rejected) {
            *cached = None;
        }
    }

    /// Send an authenticated control-plane request. A 401 invalidates the token and the
    /// request is rebuilt and sent once more with a fresh one.
    async fn send_authenticated<F>(
        &self,
        on_error: fn(String) -> StorageError,
        build: F,
    ) -> StorageResult<Response>
    where
        F: Fn(&str) -> RequestBuilder,
    {
        let token = self.auth().await?;
        let response = build(&token)
            .send()
            .await
            .map_err(|e| on_error(format!("Request failed: {}", e)))?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::warn!("Remote storage rejected cached token, re-authenticating");
        self.invalidate_if_current(&token).await;

        let token = self.auth().await?;
        build(&token)
            .send()
            .await
            .map_err(|e| on_error(format!("Request failed: {}", e)))
    }

    fn repo_url(&self, endpoint: &str) -> String {
        format!(
            "{}/repos/{}/{}",
            self.config.base_url, self.config.repo_id, endpoint
        )
    }

    async fn upload_link(&self) -> StorageResult<String> {
        let response = self
            .send_authenticated(StorageError::UploadFailed, |token| {
                self.http
                    .get(self.repo_url("upload-link/"))
                    .query(&[("p", "/")])
                    .header(header::AUTHORIZATION, token_header(token))
                    .timeout(self.config.timeout)
            })
            .await?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::UploadFailed(format!(
                "Upload link request failed with status {}: {}",
                status, body
            )));
        }

        let UploadLink(url) = response.json().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to decode upload link: {}", e))
        })?;
        Ok(url)
    }

    async fn file_link(&self, path: &str) -> StorageResult<String> {
        let response = self
            .send_authenticated(StorageError::DownloadFailed, |token| {
                self.http
                    .get(self.repo_url("file/"))
                    .query(&[("p", repo_param(path))])
                    .header(header::AUTHORIZATION, token_header(token))
                    .timeout(self.config.timeout)
            })
            .await?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(StorageError::NotFound(path.to_string())),
            status => {
                let body = response.text().await.unwrap_or_default();
                return Err(StorageError::DownloadFailed(format!(
                    "File link request failed with status {}: {}",
                    status, body
                )));
            }
        }

        let FileLink(url) = response.json().await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to decode file link: {}", e))
        })?;
        Ok(url)
    }
}

#[async_trait]
impl RemoteStorage for SeafileClient {
    async fn upload(&self, path: &str, data: Vec<u8>) -> StorageResult<()> {
        validate_path(path)?;
        let start = Instant::now();
        let size = data.len();

        let (relative_path, filename) = match path.rsplit_once('/') {
            Some((dir, name)) => (Some(format!("{}/", dir)), name),
            None => (None, path),
        };

        let upload_url = self.upload_link().await?;
        let token = self.auth().await?;

        let mut form = Form::new()
            .part("file", Part::bytes(data).file_name(filename.to_string()))
            .text("parent_dir", "/");
        if let Some(relative_path) = relative_path {
            form = form.text("relative_path", relative_path);
        }
        form = form.text("replace", "1");

        let response = self
            .http
            .post(&upload_url)
            .header(header::AUTHORIZATION, token_header(&token))
            .multipart(form)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(format!("Failed to upload file: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                remote_path = %path,
                status = status.as_u16(),
                "Remote storage upload rejected"
            );
            return Err(StorageError::UploadFailed(format!(
                "status {}: {}",
                status, body
            )));
        }

        tracing::info!(
            remote_path = %path,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Remote storage upload successful"
        );

        Ok(())
    }

    async fn download(
        &self,
        path: &str,
        passthrough: HeaderMap,
    ) -> StorageResult<RemoteDownload> {
        validate_path(path)?;
        let start = Instant::now();

        let signed_url = self.file_link(path).await?;

        let response = self
            .http
            .get(&signed_url)
            .headers(passthrough)
            .send()
            .await
            .map_err(|e| StorageError::DownloadFailed(format!("Failed to open stream: {}", e)))?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::PARTIAL_CONTENT {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::DownloadFailed(format!(
                "Stream download failed with status {}: {}",
                status, body
            )));
        }

        tracing::debug!(
            remote_path = %path,
            status = status.as_u16(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Remote storage stream opened"
        );

        let headers = response.headers().clone();
        let body = response
            .bytes_stream()
            .map_err(|e| StorageError::DownloadFailed(format!("Failed to read chunk: {}", e)));

        Ok(RemoteDownload {
            status,
            headers,
            body: Box::pin(body),
        })
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        validate_path(path)?;
        let start = Instant::now();

        let response = self
            .send_authenticated(StorageError::DeleteFailed, |token| {
                self.http
                    .delete(self.repo_url("file/"))
                    .query(&[("p", repo_param(path))])
                    .header(header::AUTHORIZATION, token_header(token))
                    .header(header::ACCEPT, DELETE_ACCEPT)
                    .timeout(self.config.timeout)
            })
            .await?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StorageError::DeleteFailed(format!("Failed to read response: {}", e)))?;

        if status != StatusCode::OK {
            return Err(StorageError::DeleteFailed(format!(
                "status {}: {}",
                status, body
            )));
        }

        if let DeleteOutcome::Unexpected(body) = DeleteOutcome::parse(&body) {
            return Err(StorageError::DeleteFailed(format!(
                "Unexpected delete response: {}",
                body
            )));
        }

        tracing::info!(
            remote_path = %path,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Remote storage delete successful"
        );

        Ok(())
    }
}

fn token_header(token: &str) -> String {
    format!("Token {}", token)
}

/// Repo paths are absolute on the wire.
fn repo_param(path: &str) -> String {
    format!("/{}", path)
}

fn validate_path(path: &str) -> StorageResult<()> {
    if path.is_empty() || path.starts_with('/') || path.split('/').any(|s| s == "..") {
        return Err(StorageError::InvalidKey(format!(
            "Remote path is not a relative canonical path: {}",
            path
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("2024/05/01_1.jpg").is_ok());
        assert!(validate_path("").is_err());
        assert!(validate_path("/2024/05/01_1.jpg").is_err());
        assert!(validate_path("2024/../../etc/passwd").is_err());
    }

    #[test]
    fn test_debug_hides_password() {
        let config = SeafileConfig {
            base_url: "https://sync.example.com/api2".to_string(),
            username: "me".to_string(),
            password: "hunter2".to_string(),
            repo_id: "repo".to_string(),
            timeout: Duration::from_secs(5),
        };
        assert!(!format!("{:?}", config).contains("hunter2"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = SeafileClient::new(SeafileConfig {
            base_url: "https://sync.example.com/api2/".to_string(),
            username: "me".to_string(),
            password: "pw".to_string(),
            repo_id: "repo".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        assert_eq!(
            client.repo_url("file/"),
            "https://sync.example.com/api2/repos/repo/file/"
        );
    }
}
