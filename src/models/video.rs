use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::serde_ext::{bson_datetime, object_id_as_hex};
use super::user::UserSummary;

/// Video document as stored in the `videos` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub video_file: String,
    pub thumbnail: String,
    pub title: String,
    pub description: String,
    /// Seconds, as reported by the media host
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub views: i64,
    #[serde(default = "default_published")]
    pub is_published: bool,
    pub owner: ObjectId,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

fn default_published() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct NewVideo {
    pub video_file: String,
    pub thumbnail: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub owner: ObjectId,
}

/// Title, description and the already-uploaded thumbnail for an edit
#[derive(Debug, Clone)]
pub struct VideoUpdate {
    pub title: String,
    pub description: String,
    pub thumbnail: String,
}

impl Video {
    pub fn new(new_video: NewVideo) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            video_file: new_video.video_file,
            thumbnail: new_video.thumbnail,
            title: new_video.title,
            description: new_video.description,
            duration: new_video.duration,
            views: 0,
            is_published: true,
            owner: new_video.owner,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn to_response(&self) -> VideoResponse {
        VideoResponse {
            id: self.id.to_hex(),
            video_file: self.video_file.clone(),
            thumbnail: self.thumbnail.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            duration: self.duration,
            views: self.views,
            is_published: self.is_published,
            owner: self.owner.to_hex(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn with_owner(&self, owner: UserSummary) -> VideoWithOwner {
        VideoWithOwner {
            id: self.id.to_hex(),
            video_file: self.video_file.clone(),
            thumbnail: self.thumbnail.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            duration: self.duration,
            views: self.views,
            is_published: self.is_published,
            owner,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    #[serde(rename = "_id", deserialize_with = "object_id_as_hex")]
    pub id: String,
    pub video_file: String,
    pub thumbnail: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub views: i64,
    #[serde(default = "default_published")]
    pub is_published: bool,
    #[serde(deserialize_with = "object_id_as_hex")]
    pub owner: String,
    #[serde(deserialize_with = "bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Video joined with its owner's public card
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoWithOwner {
    #[serde(rename = "_id", deserialize_with = "object_id_as_hex")]
    pub id: String,
    pub video_file: String,
    pub thumbnail: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub views: i64,
    #[serde(default = "default_published")]
    pub is_published: bool,
    pub owner: UserSummary,
    #[serde(deserialize_with = "bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoSortField {
    #[default]
    CreatedAt,
    Views,
    Duration,
    Title,
}

impl VideoSortField {
    pub fn field_name(&self) -> &'static str {
        match self {
            VideoSortField::CreatedAt => "createdAt",
            VideoSortField::Views => "views",
            VideoSortField::Duration => "duration",
            VideoSortField::Title => "title",
        }
    }
}

impl std::str::FromStr for VideoSortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" => Ok(VideoSortField::CreatedAt),
            "views" => Ok(VideoSortField::Views),
            "duration" => Ok(VideoSortField::Duration),
            "title" => Ok(VideoSortField::Title),
            _ => Err(format!("Invalid sort field: {}", s)),
        }
    }
}

/// Parsed filter for the video listing
#[derive(Debug, Clone, Default)]
pub struct VideoFilter {
    pub search: Option<String>,
    pub owner: Option<ObjectId>,
    /// Include unpublished videos (only when the caller lists their own channel)
    pub include_unpublished: bool,
    pub sort_by: VideoSortField,
    pub ascending: bool,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct VideoListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub query: Option<String>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
    pub user_id: Option<String>,
}
