use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::serde_ext::{bson_datetime, object_id_as_hex};
use super::user::UserSummary;

/// Comment document as stored in the `comments` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub content: String,
    pub video: ObjectId,
    pub owner: ObjectId,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(content: String, video: ObjectId, owner: ObjectId) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            content,
            video,
            owner,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn to_response(&self) -> CommentResponse {
        CommentResponse {
            id: self.id.to_hex(),
            content: self.content.clone(),
            video: self.video.to_hex(),
            owner: self.owner.to_hex(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn with_owner(&self, owner: UserSummary) -> CommentWithOwner {
        CommentWithOwner {
            id: self.id.to_hex(),
            content: self.content.clone(),
            video: self.video.to_hex(),
            owner,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    #[serde(rename = "_id", deserialize_with = "object_id_as_hex")]
    pub id: String,
    pub content: String,
    #[serde(deserialize_with = "object_id_as_hex")]
    pub video: String,
    #[serde(deserialize_with = "object_id_as_hex")]
    pub owner: String,
    #[serde(deserialize_with = "bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentWithOwner {
    #[serde(rename = "_id", deserialize_with = "object_id_as_hex")]
    pub id: String,
    pub content: String,
    #[serde(deserialize_with = "object_id_as_hex")]
    pub video: String,
    pub owner: UserSummary,
    #[serde(deserialize_with = "bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddCommentRequest {
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentRequest {
    pub new_comment: Option<String>,
    pub content: Option<String>,
}

impl UpdateCommentRequest {
    pub fn text(&self) -> Option<&str> {
        self.new_comment
            .as_deref()
            .or(self.content.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
