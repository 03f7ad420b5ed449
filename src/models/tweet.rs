use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::serde_ext::{bson_datetime, object_id_as_hex};

/// Tweet document as stored in the `tweets` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tweet {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub content: String,
    pub owner: ObjectId,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Tweet {
    pub fn new(content: String, owner: ObjectId) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            content,
            owner,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn to_response(&self) -> TweetResponse {
        TweetResponse {
            id: self.id.to_hex(),
            content: self.content.clone(),
            owner: self.owner.to_hex(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetResponse {
    #[serde(rename = "_id", deserialize_with = "object_id_as_hex")]
    pub id: String,
    pub content: String,
    #[serde(deserialize_with = "object_id_as_hex")]
    pub owner: String,
    #[serde(deserialize_with = "bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TweetContent {
    #[serde(rename = "_id", deserialize_with = "object_id_as_hex")]
    pub id: String,
    pub content: String,
}

/// A user's public card with the text of every tweet they posted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTweets {
    #[serde(rename = "_id", deserialize_with = "object_id_as_hex")]
    pub id: String,
    pub user_name: String,
    pub full_name: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub tweets: Vec<TweetContent>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateTweetRequest {
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTweetRequest {
    pub new_content: Option<String>,
    pub content: Option<String>,
}

impl UpdateTweetRequest {
    pub fn text(&self) -> Option<&str> {
        self.new_content
            .as_deref()
            .or(self.content.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
