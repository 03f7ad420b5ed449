use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{self, doc, oid::ObjectId, Bson, Document},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{ClientOptions, IndexOptions, ReturnDocument},
    Client, Collection, Database, IndexModel,
};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::pipelines::{self, COMMENTS, LIKES, PLAYLISTS, SUBSCRIPTIONS, TWEETS, USERS, VIDEOS};
use super::{
    CommentStore, DatabaseHealth, DbError, DbResult, LikeStore, PlatformDatabase, PlaylistStore,
    SubscriptionStore, TweetStore, UserStore, VideoStore,
};
use crate::config::database::PoolConfig;
use crate::models::{
    ChannelProfile, ChannelStats, ChannelSubscribers, Comment, CommentWithOwner, Like,
    LikeTarget, PageRequest, Paginated, Playlist, PlaylistWithVideos, Subscription,
    ToggleOutcome, Tweet, User, UserSummary, UserTweets, Video, VideoFilter, VideoResponse,
    VideoUpdate, VideoWithOwner,
};

const DUPLICATE_KEY: i32 = 11000;

pub struct MongoDatabase {
    database: Database,
    database_name: String,
    users: Collection<User>,
    videos: Collection<Video>,
    tweets: Collection<Tweet>,
    comments: Collection<Comment>,
    likes: Collection<Like>,
    subscriptions: Collection<Subscription>,
    playlists: Collection<Playlist>,
}

impl MongoDatabase {
    pub async fn new(connection_string: &str, database_name: &str, pool: &PoolConfig) -> Result<Self> {
        let mut client_options = ClientOptions::parse(connection_string)
            .await
            .context("Failed to parse MongoDB connection string")?;
        client_options.min_pool_size = Some(pool.min_connections);
        client_options.max_pool_size = Some(pool.max_connections);
        client_options.connect_timeout = Some(Duration::from_secs(pool.connect_timeout_secs));

        let client =
            Client::with_options(client_options).context("Failed to create MongoDB client")?;

        let database = client.database(database_name);
        info!("Using MongoDB database: {}", database_name);

        Ok(Self {
            users: database.collection(USERS),
            videos: database.collection(VIDEOS),
            tweets: database.collection(TWEETS),
            comments: database.collection(COMMENTS),
            likes: database.collection(LIKES),
            subscriptions: database.collection(SUBSCRIPTIONS),
            playlists: database.collection(PLAYLISTS),
            database_name: database_name.to_string(),
            database,
        })
    }

    async fn create_indexes(&self) -> Result<()> {
        let unique = |name: &str| {
            IndexOptions::builder()
                .unique(true)
                .name(name.to_string())
                .build()
        };
        let named = |name: &str| IndexOptions::builder().name(name.to_string()).build();

        self.users
            .create_indexes(vec![
                IndexModel::builder()
                    .keys(doc! { "userName": 1 })
                    .options(unique("userName_unique"))
                    .build(),
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique("email_unique"))
                    .build(),
            ])
            .await
            .context("Failed to create user indexes")?;

        self.videos
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "owner": 1, "createdAt": -1 })
                    .options(named("owner"))
                    .build(),
            )
            .await
            .context("Failed to create video indexes")?;

        self.tweets
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "owner": 1 })
                    .options(named("owner"))
                    .build(),
            )
            .await
            .context("Failed to create tweet indexes")?;

        self.comments
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "video": 1, "createdAt": -1 })
                    .options(named("video"))
                    .build(),
            )
            .await
            .context("Failed to create comment indexes")?;

        // One like per (user, target); each index only covers likes of that kind
        let like_indexes = ["video", "comment", "tweet"]
            .into_iter()
            .map(|target| {
                let mut keys = doc! { "likedBy": 1 };
                keys.insert(target, 1);
                let mut partial = Document::new();
                partial.insert(target, doc! { "$exists": true });

                IndexModel::builder()
                    .keys(keys)
                    .options(
                        IndexOptions::builder()
                            .unique(true)
                            .name(format!("likedBy_{target}_unique"))
                            .partial_filter_expression(partial)
                            .build(),
                    )
                    .build()
            })
            .collect::<Vec<_>>();
        self.likes
            .create_indexes(like_indexes)
            .await
            .context("Failed to create like indexes")?;

        self.subscriptions
            .create_indexes(vec![
                IndexModel::builder()
                    .keys(doc! { "subscriber": 1, "channel": 1 })
                    .options(unique("subscriber_channel_unique"))
                    .build(),
                IndexModel::builder()
                    .keys(doc! { "channel": 1 })
                    .options(named("channel"))
                    .build(),
            ])
            .await
            .context("Failed to create subscription indexes")?;

        self.playlists
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "owner": 1 })
                    .options(named("owner"))
                    .build(),
            )
            .await
            .context("Failed to create playlist indexes")?;

        Ok(())
    }

    async fn aggregate_docs(&self, collection: &str, pipeline: Vec<Document>) -> DbResult<Vec<Document>> {
        let cursor = self
            .database
            .collection::<Document>(collection)
            .aggregate(pipeline)
            .await
            .map_err(backend(&format!("aggregate {collection}")))?;

        cursor
            .try_collect()
            .await
            .map_err(backend(&format!("read {collection} aggregation")))
    }

    async fn aggregate_as<T: DeserializeOwned>(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> DbResult<Vec<T>> {
        self.aggregate_docs(collection, pipeline)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    /// Run a `$facet` pagination pipeline and build the page envelope
    async fn aggregate_page<T: DeserializeOwned>(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
        page: PageRequest,
    ) -> DbResult<Paginated<T>> {
        let facet = self
            .aggregate_docs(collection, pipeline)
            .await?
            .into_iter()
            .next()
            .unwrap_or_default();

        let total = facet_count(&facet, "total", "count");
        let docs = match facet.get_array("docs") {
            Ok(docs) => docs
                .iter()
                .filter_map(Bson::as_document)
                .cloned()
                .map(decode)
                .collect::<DbResult<Vec<T>>>()?,
            Err(_) => Vec::new(),
        };

        Ok(Paginated::new(docs, total, page))
    }

    async fn set_user_fields(&self, id: ObjectId, mut fields: Document) -> DbResult<User> {
        fields.insert("updatedAt", bson::DateTime::now());
        self.users
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": fields })
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    DbError::Duplicate(duplicate_field(&e))
                } else {
                    DbError::Backend(format!("Failed to update user: {e}"))
                }
            })?
            .ok_or(DbError::NotFound)
    }

    async fn update_owned_playlist(
        &self,
        id: ObjectId,
        owner: ObjectId,
        update: Document,
    ) -> DbResult<Option<Playlist>> {
        self.playlists
            .find_one_and_update(doc! { "_id": id, "owner": owner }, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(backend("update playlist"))
    }
}

fn backend(operation: &str) -> impl Fn(MongoError) -> DbError + '_ {
    move |e| DbError::Backend(format!("Failed to {operation}: {e}"))
}

fn decode<T: DeserializeOwned>(document: Document) -> DbResult<T> {
    bson::from_document(document)
        .map_err(|e| DbError::Backend(format!("Failed to decode document: {e}")))
}

fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == DUPLICATE_KEY,
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY,
        _ => false,
    }
}

/// Name of the field behind a duplicate key error, read from the index name
fn duplicate_field(err: &MongoError) -> String {
    let message = err.to_string();
    if message.contains("email") {
        "email".to_string()
    } else if message.contains("userName") {
        "userName".to_string()
    } else {
        "value".to_string()
    }
}

fn as_u64(value: Option<&Bson>) -> u64 {
    match value {
        Some(Bson::Int32(n)) => (*n).max(0) as u64,
        Some(Bson::Int64(n)) => (*n).max(0) as u64,
        Some(Bson::Double(n)) => n.max(0.0) as u64,
        _ => 0,
    }
}

/// Read `{ array: [{ field: n }] }`, the shape `$count` leaves inside a facet
fn facet_count(document: &Document, array: &str, field: &str) -> u64 {
    document
        .get_array(array)
        .ok()
        .and_then(|values| values.first())
        .and_then(Bson::as_document)
        .map(|counted| as_u64(counted.get(field)))
        .unwrap_or(0)
}

fn like_filter(user: ObjectId, target: LikeTarget) -> Document {
    let mut filter = doc! { "likedBy": user };
    filter.insert(target.field_name(), target.id());
    filter
}

#[async_trait]
impl UserStore for MongoDatabase {
    async fn create_user(&self, user: User) -> DbResult<User> {
        match self.users.insert_one(&user).await {
            Ok(_) => {
                debug!("Inserted user {}", user.id);
                Ok(user)
            }
            Err(e) if is_duplicate_key(&e) => Err(DbError::Duplicate(duplicate_field(&e))),
            Err(e) => Err(DbError::Backend(format!("Failed to create user: {e}"))),
        }
    }

    async fn find_user_by_id(&self, id: ObjectId) -> DbResult<Option<User>> {
        self.users
            .find_one(doc! { "_id": id })
            .await
            .map_err(backend("find user by ID"))
    }

    async fn find_user_by_login(
        &self,
        email: Option<&str>,
        user_name: Option<&str>,
    ) -> DbResult<Option<User>> {
        let mut branches = Vec::new();
        if let Some(email) = email {
            branches.push(doc! { "email": email.trim().to_lowercase() });
        }
        if let Some(user_name) = user_name {
            branches.push(doc! { "userName": user_name.trim().to_lowercase() });
        }
        if branches.is_empty() {
            return Ok(None);
        }

        self.users
            .find_one(doc! { "$or": branches })
            .await
            .map_err(backend("find user by login"))
    }

    async fn user_exists(&self, user_name: &str, email: &str) -> DbResult<bool> {
        let filter = doc! {
            "$or": [
                { "userName": user_name.trim().to_lowercase() },
                { "email": email.trim().to_lowercase() },
            ]
        };
        let count = self
            .users
            .count_documents(filter)
            .await
            .map_err(backend("check user existence"))?;
        Ok(count > 0)
    }

    async fn set_refresh_token(&self, id: ObjectId, token: Option<&str>) -> DbResult<()> {
        let update = match token {
            Some(token) => doc! { "$set": { "refreshToken": token } },
            None => doc! { "$unset": { "refreshToken": 1 } },
        };
        let result = self
            .users
            .update_one(doc! { "_id": id }, update)
            .await
            .map_err(backend("update refresh token"))?;
        if result.matched_count == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    async fn update_password(&self, id: ObjectId, password_hash: &str) -> DbResult<()> {
        self.set_user_fields(id, doc! { "password": password_hash })
            .await
            .map(|_| ())
    }

    async fn update_account(&self, id: ObjectId, full_name: &str, email: &str) -> DbResult<User> {
        self.set_user_fields(
            id,
            doc! { "fullName": full_name.trim(), "email": email.trim().to_lowercase() },
        )
        .await
    }

    async fn set_avatar(&self, id: ObjectId, url: &str) -> DbResult<User> {
        self.set_user_fields(id, doc! { "avatar": url }).await
    }

    async fn set_cover_image(&self, id: ObjectId, url: &str) -> DbResult<User> {
        self.set_user_fields(id, doc! { "coverImage": url }).await
    }

    async fn channel_profile(
        &self,
        user_name: &str,
        viewer: ObjectId,
    ) -> DbResult<Option<ChannelProfile>> {
        let mut profiles = self
            .aggregate_as::<ChannelProfile>(USERS, pipelines::channel_profile(user_name, viewer))
            .await?;
        Ok(if profiles.is_empty() { None } else { Some(profiles.remove(0)) })
    }

    async fn watch_history(&self, id: ObjectId) -> DbResult<Vec<VideoWithOwner>> {
        let Some(document) = self
            .aggregate_docs(USERS, pipelines::watch_history(id))
            .await?
            .into_iter()
            .next()
        else {
            return Err(DbError::NotFound);
        };

        match document.get_array("watchHistory") {
            Ok(videos) => videos
                .iter()
                .filter_map(Bson::as_document)
                .cloned()
                .map(decode)
                .collect(),
            Err(_) => Ok(Vec::new()),
        }
    }

    async fn add_to_watch_history(&self, id: ObjectId, video: ObjectId) -> DbResult<()> {
        self.users
            .update_one(doc! { "_id": id }, doc! { "$addToSet": { "watchHistory": video } })
            .await
            .map_err(backend("update watch history"))?;
        Ok(())
    }
}

#[async_trait]
impl VideoStore for MongoDatabase {
    async fn create_video(&self, video: Video) -> DbResult<Video> {
        self.videos
            .insert_one(&video)
            .await
            .map_err(backend("create video"))?;
        Ok(video)
    }

    async fn find_video_by_id(&self, id: ObjectId) -> DbResult<Option<Video>> {
        self.videos
            .find_one(doc! { "_id": id })
            .await
            .map_err(backend("find video by ID"))
    }

    async fn video_with_owner(&self, id: ObjectId) -> DbResult<Option<VideoWithOwner>> {
        let mut videos = self
            .aggregate_as::<VideoWithOwner>(VIDEOS, pipelines::video_with_owner(id))
            .await?;
        Ok(if videos.is_empty() { None } else { Some(videos.remove(0)) })
    }

    async fn list_videos(
        &self,
        filter: &VideoFilter,
        page: PageRequest,
    ) -> DbResult<Paginated<VideoWithOwner>> {
        self.aggregate_page(VIDEOS, pipelines::list_videos(filter, page), page)
            .await
    }

    async fn increment_views(&self, id: ObjectId) -> DbResult<()> {
        self.videos
            .update_one(doc! { "_id": id }, doc! { "$inc": { "views": 1_i64 } })
            .await
            .map_err(backend("increment views"))?;
        Ok(())
    }

    async fn update_video(&self, id: ObjectId, update: VideoUpdate) -> DbResult<Video> {
        self.videos
            .find_one_and_update(
                doc! { "_id": id },
                doc! {
                    "$set": {
                        "title": update.title,
                        "description": update.description,
                        "thumbnail": update.thumbnail,
                        "updatedAt": bson::DateTime::now(),
                    }
                },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(backend("update video"))?
            .ok_or(DbError::NotFound)
    }

    async fn toggle_publish(&self, id: ObjectId, owner: ObjectId) -> DbResult<Option<Video>> {
        self.videos
            .find_one_and_update(
                doc! { "_id": id, "owner": owner },
                pipelines::toggle_publish_update(),
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(backend("toggle publish status"))
    }

    async fn delete_video(&self, id: ObjectId) -> DbResult<()> {
        let comment_ids: Vec<ObjectId> = self
            .comments
            .find(doc! { "video": id })
            .await
            .map_err(backend("find video comments"))?
            .try_collect::<Vec<Comment>>()
            .await
            .map_err(backend("read video comments"))?
            .into_iter()
            .map(|comment| comment.id)
            .collect();

        self.likes
            .delete_many(doc! {
                "$or": [{ "video": id }, { "comment": { "$in": comment_ids } }]
            })
            .await
            .map_err(backend("delete video likes"))?;
        self.comments
            .delete_many(doc! { "video": id })
            .await
            .map_err(backend("delete video comments"))?;
        self.playlists
            .update_many(doc! { "videos": id }, doc! { "$pull": { "videos": id } })
            .await
            .map_err(backend("remove video from playlists"))?;
        self.users
            .update_many(doc! { "watchHistory": id }, doc! { "$pull": { "watchHistory": id } })
            .await
            .map_err(backend("remove video from watch history"))?;

        let result = self
            .videos
            .delete_one(doc! { "_id": id })
            .await
            .map_err(backend("delete video"))?;
        if result.deleted_count == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    async fn videos_by_owner(&self, owner: ObjectId) -> DbResult<Vec<VideoResponse>> {
        let videos: Vec<Video> = self
            .videos
            .find(doc! { "owner": owner })
            .sort(doc! { "createdAt": -1, "_id": -1 })
            .await
            .map_err(backend("find channel videos"))?
            .try_collect()
            .await
            .map_err(backend("read channel videos"))?;

        Ok(videos.iter().map(Video::to_response).collect())
    }

    async fn channel_stats(&self, owner: ObjectId) -> DbResult<ChannelStats> {
        let totals = self
            .aggregate_docs(VIDEOS, pipelines::channel_stats(owner))
            .await?
            .into_iter()
            .next()
            .unwrap_or_default();

        let total_subscribers = self
            .subscriptions
            .count_documents(doc! { "channel": owner })
            .await
            .map_err(backend("count subscribers"))?;

        Ok(ChannelStats {
            total_videos: as_u64(totals.get("totalVideos")),
            total_views: as_u64(totals.get("totalViews")) as i64,
            total_subscribers,
            total_likes: as_u64(totals.get("totalLikes")),
        })
    }
}

#[async_trait]
impl TweetStore for MongoDatabase {
    async fn create_tweet(&self, tweet: Tweet) -> DbResult<Tweet> {
        self.tweets
            .insert_one(&tweet)
            .await
            .map_err(backend("create tweet"))?;
        Ok(tweet)
    }

    async fn find_tweet_by_id(&self, id: ObjectId) -> DbResult<Option<Tweet>> {
        self.tweets
            .find_one(doc! { "_id": id })
            .await
            .map_err(backend("find tweet by ID"))
    }

    async fn user_tweets(&self, user: ObjectId) -> DbResult<Option<UserTweets>> {
        let mut found = self
            .aggregate_as::<UserTweets>(USERS, pipelines::user_tweets(user))
            .await?;
        Ok(if found.is_empty() { None } else { Some(found.remove(0)) })
    }

    async fn update_tweet(
        &self,
        id: ObjectId,
        owner: ObjectId,
        content: &str,
    ) -> DbResult<Option<Tweet>> {
        self.tweets
            .find_one_and_update(
                doc! { "_id": id, "owner": owner },
                doc! { "$set": { "content": content, "updatedAt": bson::DateTime::now() } },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(backend("update tweet"))
    }

    async fn delete_tweet(&self, id: ObjectId, owner: ObjectId) -> DbResult<Option<Tweet>> {
        let deleted = self
            .tweets
            .find_one_and_delete(doc! { "_id": id, "owner": owner })
            .await
            .map_err(backend("delete tweet"))?;

        if deleted.is_some() {
            self.likes
                .delete_many(doc! { "tweet": id })
                .await
                .map_err(backend("delete tweet likes"))?;
        }
        Ok(deleted)
    }
}

#[async_trait]
impl CommentStore for MongoDatabase {
    async fn create_comment(&self, comment: Comment) -> DbResult<Comment> {
        self.comments
            .insert_one(&comment)
            .await
            .map_err(backend("create comment"))?;
        Ok(comment)
    }

    async fn find_comment_by_id(&self, id: ObjectId) -> DbResult<Option<Comment>> {
        self.comments
            .find_one(doc! { "_id": id })
            .await
            .map_err(backend("find comment by ID"))
    }

    async fn video_comments(
        &self,
        video: ObjectId,
        page: PageRequest,
    ) -> DbResult<Paginated<CommentWithOwner>> {
        self.aggregate_page(COMMENTS, pipelines::video_comments(video, page), page)
            .await
    }

    async fn update_comment(&self, id: ObjectId, content: &str) -> DbResult<Comment> {
        self.comments
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": { "content": content, "updatedAt": bson::DateTime::now() } },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(backend("update comment"))?
            .ok_or(DbError::NotFound)
    }

    async fn delete_comment(&self, id: ObjectId) -> DbResult<()> {
        let result = self
            .comments
            .delete_one(doc! { "_id": id })
            .await
            .map_err(backend("delete comment"))?;
        if result.deleted_count == 0 {
            return Err(DbError::NotFound);
        }

        self.likes
            .delete_many(doc! { "comment": id })
            .await
            .map_err(backend("delete comment likes"))?;
        Ok(())
    }
}

#[async_trait]
impl LikeStore for MongoDatabase {
    async fn toggle_like(&self, user: ObjectId, target: LikeTarget) -> DbResult<ToggleOutcome> {
        let removed = self
            .likes
            .find_one_and_delete(like_filter(user, target))
            .await
            .map_err(backend("remove like"))?;
        if removed.is_some() {
            return Ok(ToggleOutcome::Removed);
        }

        match self.likes.insert_one(Like::new(user, target)).await {
            Ok(_) => Ok(ToggleOutcome::Added),
            // A concurrent request already liked it
            Err(e) if is_duplicate_key(&e) => Ok(ToggleOutcome::Added),
            Err(e) => Err(DbError::Backend(format!("Failed to create like: {e}"))),
        }
    }

    async fn liked_videos(&self, user: ObjectId) -> DbResult<Vec<VideoWithOwner>> {
        self.aggregate_as(LIKES, pipelines::liked_videos(user)).await
    }
}

#[async_trait]
impl SubscriptionStore for MongoDatabase {
    async fn toggle_subscription(
        &self,
        subscriber: ObjectId,
        channel: ObjectId,
    ) -> DbResult<ToggleOutcome> {
        let filter = doc! { "subscriber": subscriber, "channel": channel };
        let removed = self
            .subscriptions
            .find_one_and_delete(filter)
            .await
            .map_err(backend("remove subscription"))?;
        if removed.is_some() {
            return Ok(ToggleOutcome::Removed);
        }

        match self
            .subscriptions
            .insert_one(Subscription::new(subscriber, channel))
            .await
        {
            Ok(_) => Ok(ToggleOutcome::Added),
            Err(e) if is_duplicate_key(&e) => Ok(ToggleOutcome::Added),
            Err(e) => Err(DbError::Backend(format!("Failed to create subscription: {e}"))),
        }
    }

    async fn channel_subscribers(&self, channel: ObjectId) -> DbResult<ChannelSubscribers> {
        let facet = self
            .aggregate_docs(SUBSCRIPTIONS, pipelines::channel_subscribers(channel))
            .await?
            .into_iter()
            .next()
            .unwrap_or_default();

        let subscribers = match facet.get_array("subscribers") {
            Ok(values) => values
                .iter()
                .filter_map(Bson::as_document)
                .cloned()
                .map(decode)
                .collect::<DbResult<Vec<UserSummary>>>()?,
            Err(_) => Vec::new(),
        };

        Ok(ChannelSubscribers {
            subscribers,
            total: facet_count(&facet, "count", "total"),
        })
    }

    async fn subscribed_channels(&self, subscriber: ObjectId) -> DbResult<Vec<UserSummary>> {
        self.aggregate_as(SUBSCRIPTIONS, pipelines::subscribed_channels(subscriber))
            .await
    }
}

#[async_trait]
impl PlaylistStore for MongoDatabase {
    async fn create_playlist(&self, playlist: Playlist) -> DbResult<Playlist> {
        self.playlists
            .insert_one(&playlist)
            .await
            .map_err(backend("create playlist"))?;
        Ok(playlist)
    }

    async fn find_playlist_by_id(&self, id: ObjectId) -> DbResult<Option<Playlist>> {
        self.playlists
            .find_one(doc! { "_id": id })
            .await
            .map_err(backend("find playlist by ID"))
    }

    async fn update_playlist(
        &self,
        id: ObjectId,
        owner: ObjectId,
        name: &str,
        description: &str,
    ) -> DbResult<Option<Playlist>> {
        self.update_owned_playlist(
            id,
            owner,
            doc! {
                "$set": {
                    "name": name,
                    "description": description,
                    "updatedAt": bson::DateTime::now(),
                }
            },
        )
        .await
    }

    async fn delete_playlist(&self, id: ObjectId, owner: ObjectId) -> DbResult<bool> {
        let result = self
            .playlists
            .delete_one(doc! { "_id": id, "owner": owner })
            .await
            .map_err(backend("delete playlist"))?;
        Ok(result.deleted_count > 0)
    }

    async fn add_video_to_playlist(
        &self,
        id: ObjectId,
        owner: ObjectId,
        video: ObjectId,
    ) -> DbResult<Option<Playlist>> {
        self.update_owned_playlist(
            id,
            owner,
            doc! {
                "$addToSet": { "videos": video },
                "$set": { "updatedAt": bson::DateTime::now() },
            },
        )
        .await
    }

    async fn remove_video_from_playlist(
        &self,
        id: ObjectId,
        owner: ObjectId,
        video: ObjectId,
    ) -> DbResult<Option<Playlist>> {
        self.update_owned_playlist(
            id,
            owner,
            doc! {
                "$pull": { "videos": video },
                "$set": { "updatedAt": bson::DateTime::now() },
            },
        )
        .await
    }

    async fn user_playlists(&self, owner: ObjectId) -> DbResult<Vec<PlaylistWithVideos>> {
        self.aggregate_as(PLAYLISTS, pipelines::user_playlists(owner))
            .await
    }
}

#[async_trait]
impl PlatformDatabase for MongoDatabase {
    async fn health_check(&self) -> Result<DatabaseHealth> {
        let start = Instant::now();

        let result = self.database.run_command(doc! { "ping": 1 }).await;

        let response_time_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => Ok(DatabaseHealth {
                status: "healthy".to_string(),
                database_type: "mongodb".to_string(),
                connected: true,
                response_time_ms,
                details: Some(format!("Connected to database: {}", self.database_name)),
            }),
            Err(e) => Ok(DatabaseHealth {
                status: "unhealthy".to_string(),
                database_type: "mongodb".to_string(),
                connected: false,
                response_time_ms,
                details: Some(format!("Connection error: {e}")),
            }),
        }
    }

    async fn initialize(&self) -> Result<()> {
        self.create_indexes()
            .await
            .context("Failed to initialize database indexes")?;
        info!("MongoDB indexes ready");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facet_count_reads_int_widths() {
        let facet = doc! { "docs": [], "total": [{ "count": 42_i32 }] };
        assert_eq!(facet_count(&facet, "total", "count"), 42);

        let facet = doc! { "count": [{ "total": 7_i64 }] };
        assert_eq!(facet_count(&facet, "count", "total"), 7);
    }

    #[test]
    fn test_facet_count_empty_facet() {
        let facet = doc! { "docs": [], "total": [] };
        assert_eq!(facet_count(&facet, "total", "count"), 0);
        assert_eq!(facet_count(&Document::new(), "total", "count"), 0);
    }

    #[test]
    fn test_like_filter_targets_one_field() {
        let user = ObjectId::new();
        let comment = ObjectId::new();
        let filter = like_filter(user, LikeTarget::Comment(comment));

        assert_eq!(filter.get_object_id("likedBy").unwrap(), user);
        assert_eq!(filter.get_object_id("comment").unwrap(), comment);
        assert!(filter.get("video").is_none());
    }
}
