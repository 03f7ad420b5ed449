use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Like document: one user liking exactly one video, comment or tweet
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub liked_by: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tweet: Option<ObjectId>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Video(ObjectId),
    Comment(ObjectId),
    Tweet(ObjectId),
}

impl LikeTarget {
    /// Field on the like document that references the target
    pub fn field_name(&self) -> &'static str {
        match self {
            LikeTarget::Video(_) => "video",
            LikeTarget::Comment(_) => "comment",
            LikeTarget::Tweet(_) => "tweet",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LikeTarget::Video(_) => "Video",
            LikeTarget::Comment(_) => "Comment",
            LikeTarget::Tweet(_) => "Tweet",
        }
    }

    pub fn id(&self) -> ObjectId {
        match self {
            LikeTarget::Video(id) | LikeTarget::Comment(id) | LikeTarget::Tweet(id) => *id,
        }
    }
}

impl Like {
    pub fn new(liked_by: ObjectId, target: LikeTarget) -> Self {
        let now = Utc::now();
        let mut like = Self {
            id: ObjectId::new(),
            liked_by,
            video: None,
            comment: None,
            tweet: None,
            created_at: now,
            updated_at: now,
        };
        match target {
            LikeTarget::Video(id) => like.video = Some(id),
            LikeTarget::Comment(id) => like.comment = Some(id),
            LikeTarget::Tweet(id) => like.tweet = Some(id),
        }
        like
    }

    pub fn matches(&self, liked_by: ObjectId, target: LikeTarget) -> bool {
        self.liked_by == liked_by
            && match target {
                LikeTarget::Video(id) => self.video == Some(id),
                LikeTarget::Comment(id) => self.comment == Some(id),
                LikeTarget::Tweet(id) => self.tweet == Some(id),
            }
    }
}

/// Outcome of a like toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
}
