use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

/// Standard success envelope
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
    #[serde(skip)]
    headers: HeaderMap,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn new(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            data,
            message: message.into(),
            success: status.is_success(),
            headers: HeaderMap::new(),
        }
    }

    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, data, message)
    }

    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CREATED, data, message)
    }

    /// Attach extra response headers (cookies).
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }
}

impl ApiResponse<Value> {
    /// Envelope whose `data` is an empty object.
    pub fn empty(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status, json!({}), message)
    }
}

impl<T> IntoResponse for ApiResponse<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::OK);
        if status == StatusCode::NO_CONTENT {
            return (status, self.headers).into_response();
        }
        let headers = self.headers.clone();
        (status, headers, Json(self)).into_response()
    }
}
