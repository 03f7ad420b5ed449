use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::database::DbError;
use crate::media::MediaError;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    Internal(String),

    #[error("{message}")]
    ServiceUnavailable { message: String, errors: Vec<String> },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Media host error: {0}")]
    Media(String),

    #[error("JWT error: {0}")]
    Jwt(String),

    #[error("Validation error")]
    Validation(Vec<String>),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>, errors: Vec<String>) -> Self {
        AppError::ServiceUnavailable {
            message: message.into(),
            errors,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) | AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Media(_) => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Failure envelope shared by every endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status_code: u16,
    pub data: Option<()>,
    pub message: String,
    pub success: bool,
    pub errors: Vec<String>,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, message: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            data: None,
            message: message.into(),
            success: false,
            errors,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (message, errors) = match self {
            AppError::Internal(msg) => {
                error!("Internal server error: {}", msg);
                (msg, Vec::new())
            }
            AppError::Database(msg) => {
                error!("Database error: {}", msg);
                ("Something went wrong".to_string(), Vec::new())
            }
            AppError::Media(msg) => {
                error!("Media host error: {}", msg);
                ("Media host request failed".to_string(), Vec::new())
            }
            AppError::Jwt(msg) => {
                tracing::warn!("JWT error: {}", msg);
                ("Invalid access token".to_string(), Vec::new())
            }
            AppError::Validation(errors) => ("Validation failed".to_string(), errors),
            AppError::ServiceUnavailable { message, errors } => (message, errors),
            AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::PayloadTooLarge(msg) => (msg, Vec::new()),
        };

        (status, Json(ErrorResponse::new(status, message, errors))).into_response()
    }
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => AppError::not_found("Resource not found"),
            DbError::Duplicate(field) => AppError::Conflict(format!("{field} already exists")),
            DbError::Backend(msg) => AppError::Database(msg),
        }
    }
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::EmptyFile(name) => AppError::BadRequest(format!("{name} is empty")),
            other => AppError::Media(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let errors = err
            .field_errors()
            .iter()
            .map(|(field, errors)| {
                let error_messages: Vec<String> = errors
                    .iter()
                    .filter_map(|error| error.message.as_ref().map(|m| m.to_string()))
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<String>>();

        AppError::Validation(errors)
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::unauthorized("x").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::conflict("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Database("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_db_error_conversion() {
        assert!(matches!(AppError::from(DbError::NotFound), AppError::NotFound(_)));
        assert!(matches!(
            AppError::from(DbError::Duplicate("email".into())),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(DbError::Backend("down".into())),
            AppError::Database(_)
        ));
    }

    #[tokio::test]
    async fn test_error_envelope_shape() {
        let response = AppError::not_found("Video not found!").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["statusCode"], 404);
        assert_eq!(body["message"], "Video not found!");
        assert_eq!(body["success"], false);
        assert!(body["data"].is_null());
        assert!(body["errors"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_service_unavailable_carries_errors() {
        let response = AppError::service_unavailable(
            "Database unavailable",
            vec!["unhealthy".to_string()],
        )
        .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["statusCode"], 503);
        assert_eq!(body["success"], false);
        assert!(body["data"].is_null());
        assert_eq!(body["errors"][0], "unhealthy");
    }

    #[tokio::test]
    async fn test_database_error_hides_details() {
        let response = AppError::Database("connection refused on 10.0.0.1".into()).into_response();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Something went wrong");
    }
}
