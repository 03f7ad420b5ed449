use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::serde_ext::{bson_datetime, hex_ids, object_id_as_hex};
use super::video::VideoResponse;

/// Playlist document; `videos` has set semantics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub videos: Vec<ObjectId>,
    pub owner: ObjectId,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Playlist {
    pub fn new(name: String, description: String, owner: ObjectId) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            name,
            description,
            videos: Vec::new(),
            owner,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn to_response(&self) -> PlaylistResponse {
        PlaylistResponse {
            id: self.id.to_hex(),
            name: self.name.clone(),
            description: self.description.clone(),
            videos: hex_ids(&self.videos),
            owner: self.owner.to_hex(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub videos: Vec<String>,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Playlist with its video ids resolved to full videos
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistWithVideos {
    #[serde(rename = "_id", deserialize_with = "object_id_as_hex")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub videos: Vec<VideoResponse>,
    #[serde(deserialize_with = "object_id_as_hex")]
    pub owner: String,
    #[serde(deserialize_with = "bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PlaylistRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}
