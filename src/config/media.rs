use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub provider: String, // cloudinary, local
    pub max_upload_bytes: usize,
    pub cloudinary: Option<CloudinaryConfig>,
    pub local: LocalMediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalMediaConfig {
    pub directory: String,
    /// URL path the directory is mounted under.
    pub url_prefix: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            provider: "local".to_string(),
            max_upload_bytes: 100 * 1024 * 1024,
            cloudinary: None,
            local: LocalMediaConfig::default(),
        }
    }
}

impl Default for LocalMediaConfig {
    fn default() -> Self {
        Self {
            directory: "public/uploads".to_string(),
            url_prefix: "/uploads".to_string(),
        }
    }
}
