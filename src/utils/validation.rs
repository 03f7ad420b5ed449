use bson::oid::ObjectId;

use crate::errors::{AppError, AppResult};

/// Parse a path or query id, failing with the caller's message
pub fn parse_object_id(raw: &str, message: &str) -> AppResult<ObjectId> {
    ObjectId::parse_str(raw.trim()).map_err(|_| AppError::bad_request(message))
}

/// Trimmed value of a required text field
pub fn required_text(value: Option<&str>, message: &str) -> AppResult<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::bad_request(message))
}
