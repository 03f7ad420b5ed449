use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use super::{MediaAsset, MediaError, MediaHost, UploadedFile};

/// Stores uploads in a directory that the server exposes as static files
pub struct LocalMediaHost {
    directory: PathBuf,
    url_prefix: String,
}

impl LocalMediaHost {
    pub fn new(directory: impl AsRef<Path>, url_prefix: &str) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            url_prefix: format!("/{}", url_prefix.trim_matches('/')),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// File name inside the directory for a URL this host produced
    fn file_name_for(&self, url: &str) -> Option<String> {
        let path = url
            .split_once("://")
            .and_then(|(_, rest)| rest.find('/').map(|idx| &rest[idx..]))
            .unwrap_or(url);
        let name = path.strip_prefix(&self.url_prefix)?.strip_prefix('/')?;
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.starts_with('.') {
            return None;
        }
        Some(name.to_string())
    }
}

#[async_trait]
impl MediaHost for LocalMediaHost {
    async fn upload(&self, file: UploadedFile) -> Result<MediaAsset, MediaError> {
        file.ensure_not_empty()?;

        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|e| MediaError::Io(format!("Failed to create media directory: {e}")))?;

        let public_id = Uuid::new_v4().simple().to_string();
        let file_name = match file.extension() {
            Some(ext) => format!("{public_id}.{ext}"),
            None => public_id.clone(),
        };

        tokio::fs::write(self.directory.join(&file_name), &file.bytes)
            .await
            .map_err(|e| MediaError::Io(format!("Failed to store {}: {e}", file.field_name)))?;
        debug!("Stored {} bytes for {}", file.bytes.len(), file.field_name);

        Ok(MediaAsset {
            url: format!("{}/{}", self.url_prefix, file_name),
            public_id,
            resource_type: file.resource_type().to_string(),
            duration: None,
        })
    }

    async fn delete(&self, url: &str) -> Result<bool, MediaError> {
        let file_name = self
            .file_name_for(url)
            .ok_or_else(|| MediaError::InvalidUrl(url.to_string()))?;

        match tokio::fs::remove_file(self.directory.join(&file_name)).await {
            Ok(()) => {
                info!("Deleted local asset {}", file_name);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(MediaError::Io(format!("Failed to delete {file_name}: {e}"))),
        }
    }

    fn provider(&self) -> &'static str {
        "local"
    }
}
