use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{MediaAsset, MediaError, MediaHost, UploadedFile};
use crate::config::media::CloudinaryConfig;

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Cloudinary upload API client using signed requests
pub struct CloudinaryHost {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    url: String,
    public_id: String,
    resource_type: String,
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryHost {
    pub fn new(config: CloudinaryConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, config })
    }

    /// SHA-256 over the `&`-joined sorted params with the API secret appended
    fn sign(&self, params: &[(&str, String)]) -> String {
        sign_params(params, &self.config.api_secret)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, MediaError> {
        let response = request
            .send()
            .await
            .map_err(|e| MediaError::Request(e.to_string()))?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(MediaError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

pub fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Split a delivery URL into `(resource_type, public_id)`.
///
/// `https://res.cloudinary.com/demo/video/upload/v1712/folder/clip.mp4`
/// yields `("video", "folder/clip")`.
pub fn public_id_from_url(url: &str) -> Option<(String, String)> {
    let (head, tail) = url.split_once("/upload/")?;
    let resource_type = head.rsplit('/').next().filter(|s| !s.is_empty())?;

    let mut segments: Vec<&str> = tail.split('/').filter(|s| !s.is_empty()).collect();
    if segments
        .first()
        .is_some_and(|s| s.len() > 1 && s.starts_with('v') && s[1..].chars().all(|c| c.is_ascii_digit()))
    {
        segments.remove(0);
    }
    let file = segments.pop()?;
    let stem = file.rsplit_once('.').map_or(file, |(stem, _)| stem);
    if stem.is_empty() {
        return None;
    }
    segments.push(stem);

    Some((resource_type.to_string(), segments.join("/")))
}

#[async_trait]
impl MediaHost for CloudinaryHost {
    async fn upload(&self, file: UploadedFile) -> Result<MediaAsset, MediaError> {
        file.ensure_not_empty()?;

        let timestamp = Utc::now().timestamp().to_string();
        let folder = self.config.folder.clone().unwrap_or_default();
        let signature = self.sign(&[("folder", folder.clone()), ("timestamp", timestamp.clone())]);

        let file_name = file
            .file_name
            .clone()
            .unwrap_or_else(|| file.field_name.clone());
        let mut part = Part::bytes(file.bytes.to_vec()).file_name(file_name);
        if let Some(content_type) = file.content_type.as_deref() {
            part = part
                .mime_str(content_type)
                .map_err(|e| MediaError::Request(e.to_string()))?;
        }

        let mut form = Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        if !folder.is_empty() {
            form = form.text("folder", folder);
        }

        let endpoint = format!("{API_BASE}/{}/auto/upload", self.config.cloud_name);
        debug!("Uploading {} to Cloudinary", file.field_name);
        let body = self.send(self.client.post(&endpoint).multipart(form)).await?;

        let uploaded: UploadResponse = serde_json::from_str(&body)
            .map_err(|e| MediaError::Request(format!("Unexpected upload response: {e}")))?;
        info!("File uploaded on Cloudinary: {}", uploaded.url);

        Ok(MediaAsset {
            url: uploaded.secure_url.unwrap_or(uploaded.url),
            public_id: uploaded.public_id,
            resource_type: uploaded.resource_type,
            duration: uploaded.duration,
        })
    }

    async fn delete(&self, url: &str) -> Result<bool, MediaError> {
        let (resource_type, public_id) =
            public_id_from_url(url).ok_or_else(|| MediaError::InvalidUrl(url.to_string()))?;

        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.sign(&[("public_id", public_id.clone()), ("timestamp", timestamp.clone())]);
        let params = [
            ("public_id", public_id.clone()),
            ("timestamp", timestamp),
            ("api_key", self.config.api_key.clone()),
            ("signature", signature),
            ("signature_algorithm", "sha256".to_string()),
        ];

        let endpoint = format!("{API_BASE}/{}/{resource_type}/destroy", self.config.cloud_name);
        let body = self.send(self.client.post(&endpoint).form(&params)).await?;

        let destroyed: DestroyResponse = serde_json::from_str(&body)
            .map_err(|e| MediaError::Request(format!("Unexpected destroy response: {e}")))?;
        match destroyed.result.as_str() {
            "ok" => {
                info!("Deleted Cloudinary asset {}", public_id);
                Ok(true)
            }
            other => {
                warn!("Cloudinary destroy for {} returned {}", public_id, other);
                Ok(false)
            }
        }
    }

    fn provider(&self) -> &'static str {
        "cloudinary"
    }
}
