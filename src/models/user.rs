use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::serde_ext::{bson_datetime, hex_ids, object_id_as_hex, object_ids_as_hex};

/// User document as stored in the `users` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_name: String,
    pub full_name: String,
    pub email: String,
    /// bcrypt hash
    pub password: String,
    #[serde(default)]
    pub watch_history: Vec<ObjectId>,
    pub avatar: String,
    #[serde(default)]
    pub cover_image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to insert a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_name: String,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: String,
    pub cover_image: String,
}

impl User {
    pub fn new(new_user: NewUser) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            user_name: new_user.user_name.trim().to_lowercase(),
            full_name: new_user.full_name.trim().to_string(),
            email: new_user.email.trim().to_lowercase(),
            password: new_user.password_hash,
            watch_history: Vec::new(),
            avatar: new_user.avatar,
            cover_image: new_user.cover_image,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Convert to UserResponse (safe for API responses)
    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id.to_hex(),
            user_name: self.user_name.clone(),
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            avatar: self.avatar.clone(),
            cover_image: self.cover_image.clone(),
            watch_history: hex_ids(&self.watch_history),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn to_summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.to_hex(),
            user_name: self.user_name.clone(),
            full_name: self.full_name.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

/// User without password or refresh token
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(rename = "_id", deserialize_with = "object_id_as_hex")]
    pub id: String,
    pub user_name: String,
    pub full_name: String,
    pub email: String,
    pub avatar: String,
    #[serde(default)]
    pub cover_image: String,
    #[serde(default, deserialize_with = "object_ids_as_hex")]
    pub watch_history: Vec<String>,
    #[serde(deserialize_with = "bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Public owner card embedded in joined views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(rename = "_id", deserialize_with = "object_id_as_hex")]
    pub id: String,
    pub user_name: String,
    pub full_name: String,
    #[serde(default)]
    pub avatar: String,
}

/// Channel page: a user plus subscription counters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    #[serde(rename = "_id", deserialize_with = "object_id_as_hex")]
    pub id: String,
    pub user_name: String,
    pub full_name: String,
    pub email: String,
    pub avatar: String,
    #[serde(default)]
    pub cover_image: String,
    pub subscribers_count: i64,
    pub channels_subscribed_to_count: i64,
    pub is_subscribed: bool,
}

/// Text fields of the registration form, validated before any upload
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    #[validate(length(
        min = 5,
        max = 15,
        message = "Username must contain between 5 and 15 characters"
    ))]
    pub user_name: String,

    #[validate(length(min = 1, message = "fullName is missing !"))]
    pub full_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "password is missing !"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: Option<String>,
    pub user_name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub full_name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

/// Login / refresh payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}
