use anyhow::Result;
use async_trait::async_trait;
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub mod memory;
pub mod mongodb;
pub mod pipelines;

use crate::config::database::DatabaseConfig;
use crate::models::{
    ChannelProfile, ChannelStats, ChannelSubscribers, Comment, CommentWithOwner, LikeTarget,
    PageRequest, Paginated, Playlist, PlaylistWithVideos, ToggleOutcome, Tweet, User,
    UserSummary, UserTweets, Video, VideoFilter, VideoResponse, VideoUpdate, VideoWithOwner,
};

/// Storage-level errors
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Document not found")]
    NotFound,

    #[error("Duplicate value for {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Backend(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Database health status
#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseHealth {
    pub status: String,
    pub database_type: String,
    pub connected: bool,
    pub response_time_ms: u64,
    pub details: Option<String>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user; fails with `Duplicate` when userName or email is taken
    async fn create_user(&self, user: User) -> DbResult<User>;

    async fn find_user_by_id(&self, id: ObjectId) -> DbResult<Option<User>>;

    /// Match on either identifier; `None` values are ignored
    async fn find_user_by_login(
        &self,
        email: Option<&str>,
        user_name: Option<&str>,
    ) -> DbResult<Option<User>>;

    async fn user_exists(&self, user_name: &str, email: &str) -> DbResult<bool>;

    async fn set_refresh_token(&self, id: ObjectId, token: Option<&str>) -> DbResult<()>;

    async fn update_password(&self, id: ObjectId, password_hash: &str) -> DbResult<()>;

    async fn update_account(&self, id: ObjectId, full_name: &str, email: &str) -> DbResult<User>;

    async fn set_avatar(&self, id: ObjectId, url: &str) -> DbResult<User>;

    async fn set_cover_image(&self, id: ObjectId, url: &str) -> DbResult<User>;

    async fn channel_profile(
        &self,
        user_name: &str,
        viewer: ObjectId,
    ) -> DbResult<Option<ChannelProfile>>;

    async fn watch_history(&self, id: ObjectId) -> DbResult<Vec<VideoWithOwner>>;

    async fn add_to_watch_history(&self, id: ObjectId, video: ObjectId) -> DbResult<()>;
}

#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn create_video(&self, video: Video) -> DbResult<Video>;

    async fn find_video_by_id(&self, id: ObjectId) -> DbResult<Option<Video>>;

    async fn video_with_owner(&self, id: ObjectId) -> DbResult<Option<VideoWithOwner>>;

    async fn list_videos(
        &self,
        filter: &VideoFilter,
        page: PageRequest,
    ) -> DbResult<Paginated<VideoWithOwner>>;

    async fn increment_views(&self, id: ObjectId) -> DbResult<()>;

    async fn update_video(&self, id: ObjectId, update: VideoUpdate) -> DbResult<Video>;

    /// Flip `isPublished` on a video the owner holds
    async fn toggle_publish(&self, id: ObjectId, owner: ObjectId) -> DbResult<Option<Video>>;

    /// Remove a video with its comments, the likes on both, and its playlist entries
    async fn delete_video(&self, id: ObjectId) -> DbResult<()>;

    async fn videos_by_owner(&self, owner: ObjectId) -> DbResult<Vec<VideoResponse>>;

    async fn channel_stats(&self, owner: ObjectId) -> DbResult<ChannelStats>;
}

#[async_trait]
pub trait TweetStore: Send + Sync {
    async fn create_tweet(&self, tweet: Tweet) -> DbResult<Tweet>;

    async fn find_tweet_by_id(&self, id: ObjectId) -> DbResult<Option<Tweet>>;

    async fn user_tweets(&self, user: ObjectId) -> DbResult<Option<UserTweets>>;

    async fn update_tweet(
        &self,
        id: ObjectId,
        owner: ObjectId,
        content: &str,
    ) -> DbResult<Option<Tweet>>;

    /// Delete an owned tweet and the likes on it
    async fn delete_tweet(&self, id: ObjectId, owner: ObjectId) -> DbResult<Option<Tweet>>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn create_comment(&self, comment: Comment) -> DbResult<Comment>;

    async fn find_comment_by_id(&self, id: ObjectId) -> DbResult<Option<Comment>>;

    async fn video_comments(
        &self,
        video: ObjectId,
        page: PageRequest,
    ) -> DbResult<Paginated<CommentWithOwner>>;

    async fn update_comment(&self, id: ObjectId, content: &str) -> DbResult<Comment>;

    async fn delete_comment(&self, id: ObjectId) -> DbResult<()>;
}

#[async_trait]
pub trait LikeStore: Send + Sync {
    async fn toggle_like(&self, user: ObjectId, target: LikeTarget) -> DbResult<ToggleOutcome>;

    async fn liked_videos(&self, user: ObjectId) -> DbResult<Vec<VideoWithOwner>>;
}

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn toggle_subscription(
        &self,
        subscriber: ObjectId,
        channel: ObjectId,
    ) -> DbResult<ToggleOutcome>;

    async fn channel_subscribers(&self, channel: ObjectId) -> DbResult<ChannelSubscribers>;

    async fn subscribed_channels(&self, subscriber: ObjectId) -> DbResult<Vec<UserSummary>>;
}

#[async_trait]
pub trait PlaylistStore: Send + Sync {
    async fn create_playlist(&self, playlist: Playlist) -> DbResult<Playlist>;

    async fn find_playlist_by_id(&self, id: ObjectId) -> DbResult<Option<Playlist>>;

    async fn update_playlist(
        &self,
        id: ObjectId,
        owner: ObjectId,
        name: &str,
        description: &str,
    ) -> DbResult<Option<Playlist>>;

    async fn delete_playlist(&self, id: ObjectId, owner: ObjectId) -> DbResult<bool>;

    async fn add_video_to_playlist(
        &self,
        id: ObjectId,
        owner: ObjectId,
        video: ObjectId,
    ) -> DbResult<Option<Playlist>>;

    async fn remove_video_from_playlist(
        &self,
        id: ObjectId,
        owner: ObjectId,
        video: ObjectId,
    ) -> DbResult<Option<Playlist>>;

    async fn user_playlists(&self, owner: ObjectId) -> DbResult<Vec<PlaylistWithVideos>>;
}

/// Every collection the platform persists, plus lifecycle hooks
#[async_trait]
pub trait PlatformDatabase:
    UserStore + VideoStore + TweetStore + CommentStore + LikeStore + SubscriptionStore + PlaylistStore
{
    /// Get database health status
    async fn health_check(&self) -> Result<DatabaseHealth>;

    /// Initialize database (create indexes, etc.)
    async fn initialize(&self) -> Result<()>;
}

/// Create database instance based on configuration
pub async fn create_database(config: &DatabaseConfig) -> Result<Box<dyn PlatformDatabase>> {
    match config.r#type.as_str() {
        "mongodb" => {
            let db = mongodb::MongoDatabase::new(&config.uri, &config.name, &config.pool).await?;
            db.initialize().await?;
            Ok(Box::new(db))
        }
        "memory" => {
            let db = memory::MemoryDatabase::new();
            db.initialize().await?;
            Ok(Box::new(db))
        }
        _ => Err(anyhow::anyhow!("Unsupported database type: {}", config.r#type)),
    }
}
