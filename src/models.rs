//! Data models and structures
//!
//! Defines the upload request handed to [`crate::upload::UploadService`], the
//! image source it reads from, the single terminal outcome it reports, and the
//! environment-driven configuration.

use crate::{Error, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Filename used for the image part when the source has no display name.
pub const FALLBACK_FILENAME: &str = "temp_image";

/// Content type used for the image part when the source carries none.
pub const WILDCARD_IMAGE_TYPE: &str = "image/*";

#[derive(Debug, Clone, PartialEq)]
pub enum ImageData {
    Bytes(Vec<u8>),
    File(PathBuf),
}

/// A named, readable image byte source.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSource {
    data: ImageData,
    display_name: Option<String>,
    content_type: Option<String>,
}

impl ImageSource {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            data: ImageData::Bytes(bytes),
            display_name: None,
            content_type: None,
        }
    }

    /// A file-backed source reports the file's own name as its display name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());

        Self {
            data: ImageData::File(path),
            display_name,
            content_type: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn data(&self) -> &ImageData {
        &self.data
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn filename(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => FALLBACK_FILENAME,
        }
    }

    pub fn content_type(&self) -> &str {
        self.content_type.as_deref().unwrap_or(WILDCARD_IMAGE_TYPE)
    }

    /// Load the full image into memory.
    pub async fn read_bytes(&self) -> Result<Vec<u8>> {
        match &self.data {
            ImageData::Bytes(bytes) => Ok(bytes.clone()),
            ImageData::File(path) => Ok(tokio::fs::read(path).await?),
        }
    }
}

/// One upload attempt. Built fresh per send and consumed by the service.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    id: Uuid,
    destination: Url,
    message: String,
    image: ImageSource,
}

impl UploadRequest {
    pub fn new(destination: &str, message: impl Into<String>, image: ImageSource) -> Result<Self> {
        let destination = parse_destination(destination)?;
        let message = message.into();
        if message.is_empty() {
            return Err(Error::EmptyMessage);
        }

        Ok(Self {
            id: Uuid::new_v4(),
            destination,
            message,
            image,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn destination(&self) -> &Url {
        &self.destination
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn image(&self) -> &ImageSource {
        &self.image
    }
}

fn parse_destination(raw: &str) -> Result<Url> {
    let invalid = |reason: String| Error::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{}'", other))),
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

/// The single terminal result of one upload attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum UploadOutcome {
    Success { status_code: u16 },
    Failure { reason: String },
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Success { .. })
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub default_url: Option<String>,
    pub timeout: Duration,
    pub cache_dir: PathBuf,
}

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let timeout_secs = match lookup("UPLOAD_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                Error::Config(format!("UPLOAD_TIMEOUT_SECS must be a number, got '{}'", raw))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            default_url: lookup("UPLOAD_URL").filter(|url| !url.is_empty()),
            timeout: Duration::from_secs(timeout_secs),
            cache_dir: lookup("UPLOAD_CACHE_DIR")
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(default_cache_dir),
        })
    }
}

fn default_cache_dir() -> PathBuf {
    std::env::temp_dir().join("snapsend")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cache_dir: default_cache_dir(),
        }
    }
}
