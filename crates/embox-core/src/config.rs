//! Configuration module
//!
//! Configuration is read from the environment (optionally seeded from a `.env` file)
//! and validated once at startup.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{DEFAULT_THUMBNAIL_MAX_DIMENSION, DEFAULT_THUMBNAIL_QUALITY};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_STORAGE_URL: &str = "https://sync.luckycloud.de/api2";
const STORAGE_TIMEOUT_SECS: u64 = 30;
const FFMPEG_TIMEOUT_SECS: u64 = 60;
const MAX_CONCURRENT_TRANSCODES: usize = 2;

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self, anyhow::Error> {
        match value.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow::anyhow!(
                "LOG_FORMAT must be 'pretty' or 'json', got '{}'",
                other
            )),
        }
    }
}

/// Base configuration shared by every binary
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub environment: String,
    pub log_format: LogFormat,
}

/// Media service configuration
#[derive(Clone, Debug)]
pub struct MediaServiceConfig {
    pub base: BaseConfig,
    // Remote object store
    pub storage_url: String,
    pub storage_username: String,
    pub storage_password: String,
    pub storage_repo_id: String,
    pub storage_timeout_secs: u64,
    // Local thumbnail cache
    pub media_dir: PathBuf,
    // Thumbnail generation
    pub thumbnail_max_dimension: u32,
    pub thumbnail_quality: u8,
    pub ffmpeg_path: String,
    pub ffmpeg_timeout_secs: u64,
    pub max_concurrent_transcodes: usize,
    pub transcode_temp_dir: Option<PathBuf>,
    pub placeholder_path: Option<PathBuf>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<MediaServiceConfig>);

impl Config {
    fn as_media(&self) -> &MediaServiceConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.as_media().base.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = MediaServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_media().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.as_media().base.server_port
    }

    pub fn environment(&self) -> &str {
        &self.as_media().base.environment
    }

    pub fn log_format(&self) -> LogFormat {
        self.as_media().base.log_format
    }

    pub fn storage_url(&self) -> &str {
        &self.as_media().storage_url
    }

    pub fn storage_username(&self) -> &str {
        &self.as_media().storage_username
    }

    pub fn storage_password(&self) -> &str {
        &self.as_media().storage_password
    }

    pub fn storage_repo_id(&self) -> &str {
        &self.as_media().storage_repo_id
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_secs(self.as_media().storage_timeout_secs)
    }

    pub fn media_dir(&self) -> &PathBuf {
        &self.as_media().media_dir
    }

    pub fn thumbnail_max_dimension(&self) -> u32 {
        self.as_media().thumbnail_max_dimension
    }

    pub fn thumbnail_quality(&self) -> u8 {
        self.as_media().thumbnail_quality
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.as_media().ffmpeg_path
    }

    pub fn ffmpeg_timeout(&self) -> Duration {
        Duration::from_secs(self.as_media().ffmpeg_timeout_secs)
    }

    pub fn max_concurrent_transcodes(&self) -> usize {
        self.as_media().max_concurrent_transcodes
    }

    /// Directory for per-asset transcode scratch files; the OS temp dir when unset.
    pub fn transcode_temp_dir(&self) -> PathBuf {
        self.as_media()
            .transcode_temp_dir
            .clone()
            .unwrap_or_else(env::temp_dir)
    }

    pub fn placeholder_path(&self) -> Option<&PathBuf> {
        self.as_media().placeholder_path.as_ref()
    }
}

impl MediaServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            log_format: LogFormat::parse(
                &env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
            )?,
        };

        let config = MediaServiceConfig {
            base,
            storage_url: env::var("STORAGE_URL")
                .unwrap_or_else(|_| DEFAULT_STORAGE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            storage_username: env::var("STORAGE_USERNAME")
                .map_err(|_| anyhow::anyhow!("STORAGE_USERNAME must be set"))?,
            storage_password: env::var("STORAGE_PASSWORD")
                .map_err(|_| anyhow::anyhow!("STORAGE_PASSWORD must be set"))?,
            storage_repo_id: env::var("STORAGE_REPO_ID")
                .map_err(|_| anyhow::anyhow!("STORAGE_REPO_ID must be set"))?,
            storage_timeout_secs: env::var("STORAGE_TIMEOUT_SECS")
                .unwrap_or_else(|_| STORAGE_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(STORAGE_TIMEOUT_SECS),
            media_dir: PathBuf::from(
                env::var("MEDIA_DIR").unwrap_or_else(|_| "./media".to_string()),
            ),
            thumbnail_max_dimension: env::var("THUMBNAIL_MAX_DIMENSION")
                .unwrap_or_else(|_| DEFAULT_THUMBNAIL_MAX_DIMENSION.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("THUMBNAIL_MAX_DIMENSION must be a valid number"))?,
            thumbnail_quality: env::var("THUMBNAIL_QUALITY")
                .unwrap_or_else(|_| DEFAULT_THUMBNAIL_QUALITY.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("THUMBNAIL_QUALITY must be a number in 1..=100"))?,
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            ffmpeg_timeout_secs: env::var("FFMPEG_TIMEOUT_SECS")
                .unwrap_or_else(|_| FFMPEG_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(FFMPEG_TIMEOUT_SECS),
            max_concurrent_transcodes: env::var("MAX_CONCURRENT_TRANSCODES")
                .unwrap_or_else(|_| MAX_CONCURRENT_TRANSCODES.to_string())
                .parse()
                .unwrap_or(MAX_CONCURRENT_TRANSCODES),
            transcode_temp_dir: env::var("TRANSCODE_TEMP_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            placeholder_path: env::var("PLACEHOLDER_PATH")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.storage_username.trim().is_empty() {
            return Err(anyhow::anyhow!("STORAGE_USERNAME must not be empty"));
        }

        if self.storage_password.is_empty() {
            return Err(anyhow::anyhow!("STORAGE_PASSWORD must not be empty"));
        }

        if self.storage_repo_id.trim().is_empty() {
            return Err(anyhow::anyhow!("STORAGE_REPO_ID must not be empty"));
        }

        if !self.storage_url.starts_with("http://") && !self.storage_url.starts_with("https://") {
            return Err(anyhow::anyhow!(
                "STORAGE_URL must start with http:// or https://"
            ));
        }

        if !(1..=100).contains(&self.thumbnail_quality) {
            return Err(anyhow::anyhow!("THUMBNAIL_QUALITY must be in 1..=100"));
        }

        if self.thumbnail_max_dimension == 0 {
            return Err(anyhow::anyhow!(
                "THUMBNAIL_MAX_DIMENSION must be greater than zero"
            ));
        }

        if self.max_concurrent_transcodes == 0 {
            return Err(anyhow::anyhow!(
                "MAX_CONCURRENT_TRANSCODES must be greater than zero"
            ));
        }

        let dangerous_chars = [';', '&', '|', '$', '`', '(', ')', '<', '>', '\n', '\r'];
        if self
            .ffmpeg_path
            .chars()
            .any(|c| dangerous_chars.contains(&c))
        {
            return Err(anyhow::anyhow!("FFMPEG_PATH contains invalid characters"));
        }

        Ok(())
    }
}
