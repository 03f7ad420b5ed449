use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::body::Bytes;
use std::sync::Arc;

pub mod cloudinary;
pub mod local;

use crate::config::media::MediaConfig;

/// Media host errors
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("{0}")]
    EmptyFile(String),

    #[error("Upload request failed: {0}")]
    Request(String),

    #[error("Media host rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Unrecognized asset URL: {0}")]
    InvalidUrl(String),

    #[error("Storage error: {0}")]
    Io(String),
}

/// A file received from a multipart form, held in memory
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field_name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedFile {
    /// Lowercased extension of the client-supplied file name, if it looks sane
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name.as_deref()?;
        let (_, ext) = name.rsplit_once('.')?;
        if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// `image`, `video` or `raw`, from the declared content type
    pub fn resource_type(&self) -> &'static str {
        match self.content_type.as_deref() {
            Some(ct) if ct.starts_with("image/") => "image",
            Some(ct) if ct.starts_with("video/") => "video",
            _ => "raw",
        }
    }

    fn ensure_not_empty(&self) -> Result<(), MediaError> {
        if self.bytes.is_empty() {
            return Err(MediaError::EmptyFile(self.field_name.clone()));
        }
        Ok(())
    }
}

/// What the media host reports back for a stored asset
#[derive(Debug, Clone, PartialEq)]
pub struct MediaAsset {
    pub url: String,
    pub public_id: String,
    pub resource_type: String,
    /// Seconds; only known for videos processed by the host
    pub duration: Option<f64>,
}

#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload(&self, file: UploadedFile) -> Result<MediaAsset, MediaError>;

    /// Remove the asset behind a URL this host returned. `Ok(false)` when it was already gone.
    async fn delete(&self, url: &str) -> Result<bool, MediaError>;

    fn provider(&self) -> &'static str;
}

pub fn create_media_host(config: &MediaConfig) -> Result<Arc<dyn MediaHost>> {
    match config.provider.as_str() {
        "cloudinary" => {
            let settings = config
                .cloudinary
                .clone()
                .ok_or_else(|| anyhow!("Cloudinary provider selected but not configured"))?;
            Ok(Arc::new(cloudinary::CloudinaryHost::new(settings)?))
        }
        "local" => Ok(Arc::new(local::LocalMediaHost::new(
            &config.local.directory,
            &config.local.url_prefix,
        ))),
        other => Err(anyhow!("Unsupported media provider: {}", other)),
    }
}
