use anyhow::Result;
use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::Utc;
use std::cmp::Ordering;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::{
    CommentStore, DatabaseHealth, DbError, DbResult, LikeStore, PlatformDatabase, PlaylistStore,
    SubscriptionStore, TweetStore, UserStore, VideoStore,
};
use crate::models::{
    ChannelProfile, ChannelStats, ChannelSubscribers, Comment, CommentWithOwner, Like,
    LikeTarget, PageRequest, Paginated, Playlist, PlaylistWithVideos, Subscription,
    ToggleOutcome, Tweet, TweetContent, User, UserSummary, UserTweets, Video, VideoFilter,
    VideoResponse, VideoSortField, VideoUpdate, VideoWithOwner,
};

#[derive(Default)]
struct Collections {
    users: Vec<User>,
    videos: Vec<Video>,
    tweets: Vec<Tweet>,
    comments: Vec<Comment>,
    likes: Vec<Like>,
    subscriptions: Vec<Subscription>,
    playlists: Vec<Playlist>,
}

impl Collections {
    fn user(&self, id: ObjectId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn user_mut(&mut self, id: ObjectId) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == id)
    }

    fn summary(&self, id: ObjectId) -> Option<UserSummary> {
        self.user(id).map(User::to_summary)
    }

    /// Videos whose owner no longer exists are dropped, like an `$unwind` would
    fn with_owner(&self, video: &Video) -> Option<VideoWithOwner> {
        self.summary(video.owner).map(|owner| video.with_owner(owner))
    }

    fn video(&self, id: ObjectId) -> Option<&Video> {
        self.videos.iter().find(|v| v.id == id)
    }
}

/// In-process backend with the same observable behaviour as MongoDB
pub struct MemoryDatabase {
    collections: Arc<RwLock<Collections>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(Collections::default())),
        }
    }
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

fn newest_first<T>(items: &mut [&T], created_at: impl Fn(&T) -> (chrono::DateTime<Utc>, ObjectId)) {
    items.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
}

fn compare_videos(a: &Video, b: &Video, sort_by: VideoSortField) -> Ordering {
    let primary = match sort_by {
        VideoSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        VideoSortField::Views => a.views.cmp(&b.views),
        VideoSortField::Duration => a.duration.total_cmp(&b.duration),
        VideoSortField::Title => a.title.cmp(&b.title),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

fn matches_search(video: &Video, search: &str) -> bool {
    let needle = search.to_lowercase();
    video.title.to_lowercase().contains(&needle)
        || video.description.to_lowercase().contains(&needle)
}

/// Counts every matched item, then joins only the requested page; an item
/// whose join fails drops out of `docs` but still counts, as `$facet` does
fn paginate<S, T>(
    items: &[S],
    page: PageRequest,
    join: impl Fn(&S) -> Option<T>,
) -> Paginated<T> {
    let skip = usize::try_from(page.skip()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit).unwrap_or(usize::MAX);
    let docs = items.iter().skip(skip).take(limit).filter_map(join).collect();
    Paginated::new(docs, items.len() as u64, page)
}

#[async_trait]
impl UserStore for MemoryDatabase {
    async fn create_user(&self, user: User) -> DbResult<User> {
        let mut collections = self.collections.write().await;
        if collections.users.iter().any(|u| u.user_name == user.user_name) {
            return Err(DbError::Duplicate("userName".to_string()));
        }
        if collections.users.iter().any(|u| u.email == user.email) {
            return Err(DbError::Duplicate("email".to_string()));
        }
        collections.users.push(user.clone());
        debug!("Inserted user {}", user.id);
        Ok(user)
    }

    async fn find_user_by_id(&self, id: ObjectId) -> DbResult<Option<User>> {
        Ok(self.collections.read().await.user(id).cloned())
    }

    async fn find_user_by_login(
        &self,
        email: Option<&str>,
        user_name: Option<&str>,
    ) -> DbResult<Option<User>> {
        let email = email.map(|e| e.trim().to_lowercase());
        let user_name = user_name.map(|u| u.trim().to_lowercase());
        let collections = self.collections.read().await;

        Ok(collections
            .users
            .iter()
            .find(|u| {
                email.as_deref() == Some(u.email.as_str())
                    || user_name.as_deref() == Some(u.user_name.as_str())
            })
            .cloned())
    }

    async fn user_exists(&self, user_name: &str, email: &str) -> DbResult<bool> {
        let user_name = user_name.trim().to_lowercase();
        let email = email.trim().to_lowercase();
        let collections = self.collections.read().await;
        Ok(collections
            .users
            .iter()
            .any(|u| u.user_name == user_name || u.email == email))
    }

    async fn set_refresh_token(&self, id: ObjectId, token: Option<&str>) -> DbResult<()> {
        let mut collections = self.collections.write().await;
        let user = collections.user_mut(id).ok_or(DbError::NotFound)?;
        user.refresh_token = token.map(str::to_string);
        Ok(())
    }

    async fn update_password(&self, id: ObjectId, password_hash: &str) -> DbResult<()> {
        let mut collections = self.collections.write().await;
        let user = collections.user_mut(id).ok_or(DbError::NotFound)?;
        user.password = password_hash.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn update_account(&self, id: ObjectId, full_name: &str, email: &str) -> DbResult<User> {
        let email = email.trim().to_lowercase();
        let mut collections = self.collections.write().await;
        if collections.users.iter().any(|u| u.id != id && u.email == email) {
            return Err(DbError::Duplicate("email".to_string()));
        }

        let user = collections.user_mut(id).ok_or(DbError::NotFound)?;
        user.full_name = full_name.trim().to_string();
        user.email = email;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn set_avatar(&self, id: ObjectId, url: &str) -> DbResult<User> {
        let mut collections = self.collections.write().await;
        let user = collections.user_mut(id).ok_or(DbError::NotFound)?;
        user.avatar = url.to_string();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn set_cover_image(&self, id: ObjectId, url: &str) -> DbResult<User> {
        let mut collections = self.collections.write().await;
        let user = collections.user_mut(id).ok_or(DbError::NotFound)?;
        user.cover_image = url.to_string();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn channel_profile(
        &self,
        user_name: &str,
        viewer: ObjectId,
    ) -> DbResult<Option<ChannelProfile>> {
        let user_name = user_name.trim().to_lowercase();
        let collections = self.collections.read().await;
        let Some(user) = collections.users.iter().find(|u| u.user_name == user_name) else {
            return Ok(None);
        };

        let subscribers: Vec<&Subscription> = collections
            .subscriptions
            .iter()
            .filter(|s| s.channel == user.id)
            .collect();
        let subscribed_to = collections
            .subscriptions
            .iter()
            .filter(|s| s.subscriber == user.id)
            .count();

        Ok(Some(ChannelProfile {
            id: user.id.to_hex(),
            user_name: user.user_name.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
            cover_image: user.cover_image.clone(),
            subscribers_count: subscribers.len() as i64,
            channels_subscribed_to_count: subscribed_to as i64,
            is_subscribed: subscribers.iter().any(|s| s.subscriber == viewer),
        }))
    }

    async fn watch_history(&self, id: ObjectId) -> DbResult<Vec<VideoWithOwner>> {
        let collections = self.collections.read().await;
        let user = collections.user(id).ok_or(DbError::NotFound)?;

        Ok(user
            .watch_history
            .iter()
            .filter_map(|video_id| collections.video(*video_id))
            .filter_map(|video| collections.with_owner(video))
            .collect())
    }

    async fn add_to_watch_history(&self, id: ObjectId, video: ObjectId) -> DbResult<()> {
        let mut collections = self.collections.write().await;
        let user = collections.user_mut(id).ok_or(DbError::NotFound)?;
        if !user.watch_history.contains(&video) {
            user.watch_history.push(video);
        }
        Ok(())
    }
}

#[async_trait]
impl VideoStore for MemoryDatabase {
    async fn create_video(&self, video: Video) -> DbResult<Video> {
        self.collections.write().await.videos.push(video.clone());
        Ok(video)
    }

    async fn find_video_by_id(&self, id: ObjectId) -> DbResult<Option<Video>> {
        Ok(self.collections.read().await.video(id).cloned())
    }

    async fn video_with_owner(&self, id: ObjectId) -> DbResult<Option<VideoWithOwner>> {
        let collections = self.collections.read().await;
        Ok(collections.video(id).and_then(|v| collections.with_owner(v)))
    }

    async fn list_videos(
        &self,
        filter: &VideoFilter,
        page: PageRequest,
    ) -> DbResult<Paginated<VideoWithOwner>> {
        let collections = self.collections.read().await;
        let mut matched: Vec<&Video> = collections
            .videos
            .iter()
            .filter(|v| filter.owner.map_or(true, |owner| v.owner == owner))
            .filter(|v| filter.include_unpublished || v.is_published)
            .filter(|v| {
                filter
                    .search
                    .as_deref()
                    .map_or(true, |search| matches_search(v, search))
            })
            .collect();

        matched.sort_by(|a, b| {
            let ordering = compare_videos(a, b, filter.sort_by);
            if filter.ascending {
                ordering
            } else {
                ordering.reverse()
            }
        });

        Ok(paginate(&matched, page, |v| collections.with_owner(v)))
    }

    async fn increment_views(&self, id: ObjectId) -> DbResult<()> {
        let mut collections = self.collections.write().await;
        if let Some(video) = collections.videos.iter_mut().find(|v| v.id == id) {
            video.views += 1;
        }
        Ok(())
    }

    async fn update_video(&self, id: ObjectId, update: VideoUpdate) -> DbResult<Video> {
        let mut collections = self.collections.write().await;
        let video = collections
            .videos
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or(DbError::NotFound)?;
        video.title = update.title;
        video.description = update.description;
        video.thumbnail = update.thumbnail;
        video.updated_at = Utc::now();
        Ok(video.clone())
    }

    async fn toggle_publish(&self, id: ObjectId, owner: ObjectId) -> DbResult<Option<Video>> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .videos
            .iter_mut()
            .find(|v| v.id == id && v.owner == owner)
            .map(|video| {
                video.is_published = !video.is_published;
                video.updated_at = Utc::now();
                video.clone()
            }))
    }

    async fn delete_video(&self, id: ObjectId) -> DbResult<()> {
        let mut collections = self.collections.write().await;
        let before = collections.videos.len();
        collections.videos.retain(|v| v.id != id);
        if collections.videos.len() == before {
            return Err(DbError::NotFound);
        }

        let comment_ids: Vec<ObjectId> = collections
            .comments
            .iter()
            .filter(|c| c.video == id)
            .map(|c| c.id)
            .collect();
        collections.likes.retain(|like| {
            like.video != Some(id)
                && !like.comment.is_some_and(|comment| comment_ids.contains(&comment))
        });
        collections.comments.retain(|c| c.video != id);
        for playlist in collections.playlists.iter_mut() {
            playlist.videos.retain(|v| *v != id);
        }
        for user in collections.users.iter_mut() {
            user.watch_history.retain(|v| *v != id);
        }
        Ok(())
    }

    async fn videos_by_owner(&self, owner: ObjectId) -> DbResult<Vec<VideoResponse>> {
        let collections = self.collections.read().await;
        let mut videos: Vec<&Video> = collections.videos.iter().filter(|v| v.owner == owner).collect();
        newest_first(&mut videos, |v| (v.created_at, v.id));
        Ok(videos.into_iter().map(Video::to_response).collect())
    }

    async fn channel_stats(&self, owner: ObjectId) -> DbResult<ChannelStats> {
        let collections = self.collections.read().await;
        let videos: Vec<&Video> = collections.videos.iter().filter(|v| v.owner == owner).collect();
        let video_ids: Vec<ObjectId> = videos.iter().map(|v| v.id).collect();

        Ok(ChannelStats {
            total_videos: videos.len() as u64,
            total_views: videos.iter().map(|v| v.views).sum(),
            total_subscribers: collections
                .subscriptions
                .iter()
                .filter(|s| s.channel == owner)
                .count() as u64,
            total_likes: collections
                .likes
                .iter()
                .filter(|like| like.video.is_some_and(|video| video_ids.contains(&video)))
                .count() as u64,
        })
    }
}

#[async_trait]
impl TweetStore for MemoryDatabase {
    async fn create_tweet(&self, tweet: Tweet) -> DbResult<Tweet> {
        self.collections.write().await.tweets.push(tweet.clone());
        Ok(tweet)
    }

    async fn find_tweet_by_id(&self, id: ObjectId) -> DbResult<Option<Tweet>> {
        let collections = self.collections.read().await;
        Ok(collections.tweets.iter().find(|t| t.id == id).cloned())
    }

    async fn user_tweets(&self, user: ObjectId) -> DbResult<Option<UserTweets>> {
        let collections = self.collections.read().await;
        let Some(owner) = collections.user(user) else {
            return Ok(None);
        };

        let mut tweets: Vec<&Tweet> = collections.tweets.iter().filter(|t| t.owner == user).collect();
        newest_first(&mut tweets, |t| (t.created_at, t.id));

        Ok(Some(UserTweets {
            id: owner.id.to_hex(),
            user_name: owner.user_name.clone(),
            full_name: owner.full_name.clone(),
            avatar: owner.avatar.clone(),
            tweets: tweets
                .into_iter()
                .map(|t| TweetContent {
                    id: t.id.to_hex(),
                    content: t.content.clone(),
                })
                .collect(),
        }))
    }

    async fn update_tweet(
        &self,
        id: ObjectId,
        owner: ObjectId,
        content: &str,
    ) -> DbResult<Option<Tweet>> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .tweets
            .iter_mut()
            .find(|t| t.id == id && t.owner == owner)
            .map(|tweet| {
                tweet.content = content.to_string();
                tweet.updated_at = Utc::now();
                tweet.clone()
            }))
    }

    async fn delete_tweet(&self, id: ObjectId, owner: ObjectId) -> DbResult<Option<Tweet>> {
        let mut collections = self.collections.write().await;
        let Some(position) = collections
            .tweets
            .iter()
            .position(|t| t.id == id && t.owner == owner)
        else {
            return Ok(None);
        };

        let tweet = collections.tweets.remove(position);
        collections.likes.retain(|like| like.tweet != Some(id));
        Ok(Some(tweet))
    }
}

#[async_trait]
impl CommentStore for MemoryDatabase {
    async fn create_comment(&self, comment: Comment) -> DbResult<Comment> {
        self.collections.write().await.comments.push(comment.clone());
        Ok(comment)
    }

    async fn find_comment_by_id(&self, id: ObjectId) -> DbResult<Option<Comment>> {
        let collections = self.collections.read().await;
        Ok(collections.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn video_comments(
        &self,
        video: ObjectId,
        page: PageRequest,
    ) -> DbResult<Paginated<CommentWithOwner>> {
        let collections = self.collections.read().await;
        let mut comments: Vec<&Comment> =
            collections.comments.iter().filter(|c| c.video == video).collect();
        newest_first(&mut comments, |c| (c.created_at, c.id));

        Ok(paginate(&comments, page, |c| {
            collections.summary(c.owner).map(|owner| c.with_owner(owner))
        }))
    }

    async fn update_comment(&self, id: ObjectId, content: &str) -> DbResult<Comment> {
        let mut collections = self.collections.write().await;
        let comment = collections
            .comments
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(DbError::NotFound)?;
        comment.content = content.to_string();
        comment.updated_at = Utc::now();
        Ok(comment.clone())
    }

    async fn delete_comment(&self, id: ObjectId) -> DbResult<()> {
        let mut collections = self.collections.write().await;
        let before = collections.comments.len();
        collections.comments.retain(|c| c.id != id);
        if collections.comments.len() == before {
            return Err(DbError::NotFound);
        }
        collections.likes.retain(|like| like.comment != Some(id));
        Ok(())
    }
}

#[async_trait]
impl LikeStore for MemoryDatabase {
    async fn toggle_like(&self, user: ObjectId, target: LikeTarget) -> DbResult<ToggleOutcome> {
        let mut collections = self.collections.write().await;
        match collections.likes.iter().position(|like| like.matches(user, target)) {
            Some(position) => {
                collections.likes.remove(position);
                Ok(ToggleOutcome::Removed)
            }
            None => {
                collections.likes.push(Like::new(user, target));
                Ok(ToggleOutcome::Added)
            }
        }
    }

    async fn liked_videos(&self, user: ObjectId) -> DbResult<Vec<VideoWithOwner>> {
        let collections = self.collections.read().await;
        Ok(collections
            .likes
            .iter()
            .rev()
            .filter(|like| like.liked_by == user)
            .filter_map(|like| like.video)
            .filter_map(|video_id| collections.video(video_id))
            .filter(|video| video.is_published)
            .filter_map(|video| collections.with_owner(video))
            .collect())
    }
}

#[async_trait]
impl SubscriptionStore for MemoryDatabase {
    async fn toggle_subscription(
        &self,
        subscriber: ObjectId,
        channel: ObjectId,
    ) -> DbResult<ToggleOutcome> {
        let mut collections = self.collections.write().await;
        match collections
            .subscriptions
            .iter()
            .position(|s| s.subscriber == subscriber && s.channel == channel)
        {
            Some(position) => {
                collections.subscriptions.remove(position);
                Ok(ToggleOutcome::Removed)
            }
            None => {
                collections
                    .subscriptions
                    .push(Subscription::new(subscriber, channel));
                Ok(ToggleOutcome::Added)
            }
        }
    }

    async fn channel_subscribers(&self, channel: ObjectId) -> DbResult<ChannelSubscribers> {
        let collections = self.collections.read().await;
        let subscriptions: Vec<&Subscription> = collections
            .subscriptions
            .iter()
            .rev()
            .filter(|s| s.channel == channel)
            .collect();

        Ok(ChannelSubscribers {
            total: subscriptions.len() as u64,
            subscribers: subscriptions
                .iter()
                .filter_map(|s| collections.summary(s.subscriber))
                .collect(),
        })
    }

    async fn subscribed_channels(&self, subscriber: ObjectId) -> DbResult<Vec<UserSummary>> {
        let collections = self.collections.read().await;
        Ok(collections
            .subscriptions
            .iter()
            .rev()
            .filter(|s| s.subscriber == subscriber)
            .filter_map(|s| collections.summary(s.channel))
            .collect())
    }
}

#[async_trait]
impl PlaylistStore for MemoryDatabase {
    async fn create_playlist(&self, playlist: Playlist) -> DbResult<Playlist> {
        self.collections.write().await.playlists.push(playlist.clone());
        Ok(playlist)
    }

    async fn find_playlist_by_id(&self, id: ObjectId) -> DbResult<Option<Playlist>> {
        let collections = self.collections.read().await;
        Ok(collections.playlists.iter().find(|p| p.id == id).cloned())
    }

    async fn update_playlist(
        &self,
        id: ObjectId,
        owner: ObjectId,
        name: &str,
        description: &str,
    ) -> DbResult<Option<Playlist>> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .playlists
            .iter_mut()
            .find(|p| p.id == id && p.owner == owner)
            .map(|playlist| {
                playlist.name = name.to_string();
                playlist.description = description.to_string();
                playlist.updated_at = Utc::now();
                playlist.clone()
            }))
    }

    async fn delete_playlist(&self, id: ObjectId, owner: ObjectId) -> DbResult<bool> {
        let mut collections = self.collections.write().await;
        let before = collections.playlists.len();
        collections
            .playlists
            .retain(|p| !(p.id == id && p.owner == owner));
        Ok(collections.playlists.len() < before)
    }

    async fn add_video_to_playlist(
        &self,
        id: ObjectId,
        owner: ObjectId,
        video: ObjectId,
    ) -> DbResult<Option<Playlist>> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .playlists
            .iter_mut()
            .find(|p| p.id == id && p.owner == owner)
            .map(|playlist| {
                if !playlist.videos.contains(&video) {
                    playlist.videos.push(video);
                }
                playlist.updated_at = Utc::now();
                playlist.clone()
            }))
    }

    async fn remove_video_from_playlist(
        &self,
        id: ObjectId,
        owner: ObjectId,
        video: ObjectId,
    ) -> DbResult<Option<Playlist>> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .playlists
            .iter_mut()
            .find(|p| p.id == id && p.owner == owner)
            .map(|playlist| {
                playlist.videos.retain(|v| *v != video);
                playlist.updated_at = Utc::now();
                playlist.clone()
            }))
    }

    async fn user_playlists(&self, owner: ObjectId) -> DbResult<Vec<PlaylistWithVideos>> {
        let collections = self.collections.read().await;
        let mut playlists: Vec<&Playlist> =
            collections.playlists.iter().filter(|p| p.owner == owner).collect();
        newest_first(&mut playlists, |p| (p.created_at, p.id));

        Ok(playlists
            .into_iter()
            .map(|playlist| PlaylistWithVideos {
                id: playlist.id.to_hex(),
                name: playlist.name.clone(),
                description: playlist.description.clone(),
                videos: playlist
                    .videos
                    .iter()
                    .filter_map(|id| collections.video(*id))
                    .map(Video::to_response)
                    .collect(),
                owner: playlist.owner.to_hex(),
                created_at: playlist.created_at,
                updated_at: playlist.updated_at,
            })
            .collect())
    }
}

#[async_trait]
impl PlatformDatabase for MemoryDatabase {
    async fn health_check(&self) -> Result<DatabaseHealth> {
        let collections = self.collections.read().await;
        Ok(DatabaseHealth {
            status: "healthy".to_string(),
            database_type: "memory".to_string(),
            connected: true,
            response_time_ms: 0,
            details: Some(format!(
                "{} users, {} videos",
                collections.users.len(),
                collections.videos.len()
            )),
        })
    }

    async fn initialize(&self) -> Result<()> {
        Ok(())
    }
}
