use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::errors::{AppError, AppResult};
use crate::media::UploadedFile;

/// Text fields and files of a `multipart/form-data` request, read fully into memory
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Uploaded file is too large".to_string())
    } else {
        warn!("Multipart parsing error: {}", err);
        AppError::bad_request(format!("Invalid multipart request: {}", err.body_text()))
    }
}

impl MultipartForm {
    pub async fn from_multipart(mut multipart: Multipart, max_file_bytes: usize) -> AppResult<Self> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);

            if file_name.is_none() {
                let text = field.text().await.map_err(multipart_error)?;
                form.fields.insert(name, text);
                continue;
            }

            let bytes = field.bytes().await.map_err(multipart_error)?;
            if bytes.len() > max_file_bytes {
                return Err(AppError::PayloadTooLarge(format!(
                    "{name} exceeds the {max_file_bytes} byte upload limit"
                )));
            }
            // Browsers send an empty part when no file was chosen
            if bytes.is_empty() && file_name.as_deref().map_or(true, str::is_empty) {
                continue;
            }

            debug!("Received file field {} ({} bytes)", name, bytes.len());
            form.files.insert(
                name.clone(),
                UploadedFile {
                    field_name: name,
                    file_name,
                    content_type,
                    bytes,
                },
            );
        }

        Ok(form)
    }

    /// Raw value of a text field
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}
