use axum::{
    extract::{Path, State},
    Extension, Json,
};
use tracing::{debug, info};

use crate::{
    errors::{AppError, AppResult},
    middleware::auth::CurrentUser,
    models::{CreateTweetRequest, Tweet, TweetResponse, UpdateTweetRequest, UserTweets},
    utils::{
        validation::{parse_object_id, required_text},
        ApiResponse,
    },
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/v1/tweets",
    tag = "tweets",
    security(("Bearer" = [])),
    request_body = CreateTweetRequest,
    responses(
        (status = 201, description = "Tweet created"),
        (status = 400, description = "Empty content")
    )
)]
pub async fn create_tweet(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateTweetRequest>,
) -> AppResult<ApiResponse<TweetResponse>> {
    let content = required_text(payload.content.as_deref(), "Content can not be empty")?;

    let tweet = state
        .database
        .create_tweet(Tweet::new(content, current.id))
        .await?;

    info!("Tweet {} created by {}", tweet.id, current.user.user_name);
    Ok(ApiResponse::created(tweet.to_response(), "Tweet created successfully!"))
}

#[utoipa::path(
    get,
    path = "/api/v1/tweets/user/{userId}",
    tag = "tweets",
    security(("Bearer" = [])),
    params(("userId" = String, Path, description = "Author id")),
    responses(
        (status = 200, description = "User card with their tweets"),
        (status = 400, description = "Invalid user id"),
        (status = 404, description = "User not found")
    )
)]
pub async fn user_tweets(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<UserTweets>> {
    let user_id = parse_object_id(&user_id, "User Id is missing!")?;

    let tweets = state
        .database
        .user_tweets(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found!"))?;

    debug!("Fetched {} tweets for {}", tweets.tweets.len(), tweets.user_name);
    Ok(ApiResponse::ok(tweets, "User tweets fetched successfully!"))
}

#[utoipa::path(
    patch,
    path = "/api/v1/tweets/{tweetId}",
    tag = "tweets",
    security(("Bearer" = [])),
    params(("tweetId" = String, Path, description = "Tweet id")),
    request_body = UpdateTweetRequest,
    responses(
        (status = 200, description = "Tweet updated"),
        (status = 400, description = "Invalid id or empty content"),
        (status = 404, description = "Tweet not found or not yours")
    )
)]
pub async fn update_tweet(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(tweet_id): Path<String>,
    Json(payload): Json<UpdateTweetRequest>,
) -> AppResult<ApiResponse<TweetResponse>> {
    let content = payload
        .text()
        .map(str::to_string)
        .ok_or_else(|| AppError::bad_request("Content is missing!"))?;
    let id = parse_object_id(&tweet_id, "TweetId is Invalid!")?;

    let tweet = state
        .database
        .update_tweet(id, current.id, &content)
        .await?
        .ok_or_else(|| AppError::not_found("Tweet not found!"))?;

    Ok(ApiResponse::ok(tweet.to_response(), "Tweet updated successfully!"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/tweets/{tweetId}",
    tag = "tweets",
    security(("Bearer" = [])),
    params(("tweetId" = String, Path, description = "Tweet id")),
    responses(
        (status = 200, description = "Tweet and its likes deleted"),
        (status = 404, description = "Tweet not found or not yours")
    )
)]
pub async fn delete_tweet(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(tweet_id): Path<String>,
) -> AppResult<ApiResponse<TweetResponse>> {
    let id = parse_object_id(&tweet_id, "Tweet Id is Invalid!")?;

    let tweet = state
        .database
        .delete_tweet(id, current.id)
        .await?
        .ok_or_else(|| AppError::not_found("Tweet not found!"))?;

    info!("Tweet {} deleted by {}", id, current.user.user_name);
    Ok(ApiResponse::ok(tweet.to_response(), "Tweet deleted successfully!"))
}
