use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension,
};
use serde_json::Value;
use tracing::debug;

use crate::{
    errors::{AppError, AppResult},
    middleware::auth::CurrentUser,
    models::{LikeTarget, ToggleOutcome, VideoWithOwner},
    utils::{validation::parse_object_id, ApiResponse},
    AppState,
};

/// Shared body of the three toggle endpoints
async fn toggle(
    state: &AppState,
    current: &CurrentUser,
    target: LikeTarget,
) -> AppResult<ApiResponse<Value>> {
    let exists = match target {
        LikeTarget::Video(id) => state.database.find_video_by_id(id).await?.is_some(),
        LikeTarget::Comment(id) => state.database.find_comment_by_id(id).await?.is_some(),
        LikeTarget::Tweet(id) => state.database.find_tweet_by_id(id).await?.is_some(),
    };
    if !exists {
        return Err(AppError::not_found(format!("{} not found!", target.label())));
    }

    let outcome = state.database.toggle_like(current.id, target).await?;
    debug!("{} {} like toggled by {}: {:?}", target.label(), target.id(), current.id, outcome);

    Ok(match outcome {
        ToggleOutcome::Removed => {
            ApiResponse::empty(StatusCode::OK, format!("{} unliked!", target.label()))
        }
        ToggleOutcome::Added => {
            ApiResponse::empty(StatusCode::CREATED, format!("{} Liked!", target.label()))
        }
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/likes/toggle/v/{videoId}",
    tag = "likes",
    security(("Bearer" = [])),
    params(("videoId" = String, Path, description = "Video id")),
    responses(
        (status = 200, description = "Like removed"),
        (status = 201, description = "Like added"),
        (status = 404, description = "Video not found")
    )
)]
pub async fn toggle_video_like(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(video_id): Path<String>,
) -> AppResult<ApiResponse<Value>> {
    let id = parse_object_id(&video_id, "Invalid video Id!")?;
    toggle(&state, &current, LikeTarget::Video(id)).await
}

#[utoipa::path(
    post,
    path = "/api/v1/likes/toggle/c/{commentId}",
    tag = "likes",
    security(("Bearer" = [])),
    params(("commentId" = String, Path, description = "Comment id")),
    responses(
        (status = 200, description = "Like removed"),
        (status = 201, description = "Like added"),
        (status = 404, description = "Comment not found")
    )
)]
pub async fn toggle_comment_like(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(comment_id): Path<String>,
) -> AppResult<ApiResponse<Value>> {
    let id = parse_object_id(&comment_id, "Invalid Comment Id!")?;
    toggle(&state, &current, LikeTarget::Comment(id)).await
}

#[utoipa::path(
    post,
    path = "/api/v1/likes/toggle/t/{tweetId}",
    tag = "likes",
    security(("Bearer" = [])),
    params(("tweetId" = String, Path, description = "Tweet id")),
    responses(
        (status = 200, description = "Like removed"),
        (status = 201, description = "Like added"),
        (status = 404, description = "Tweet not found")
    )
)]
pub async fn toggle_tweet_like(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(tweet_id): Path<String>,
) -> AppResult<ApiResponse<Value>> {
    let id = parse_object_id(&tweet_id, "Invalid Tweet Id!")?;
    toggle(&state, &current, LikeTarget::Tweet(id)).await
}

#[utoipa::path(
    get,
    path = "/api/v1/likes/videos",
    tag = "likes",
    security(("Bearer" = [])),
    responses(
        (status = 200, description = "Published videos the caller liked"),
        (status = 404, description = "No liked videos")
    )
)]
pub async fn liked_videos(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<ApiResponse<Vec<VideoWithOwner>>> {
    let videos = state.database.liked_videos(current.id).await?;
    if videos.is_empty() {
        return Err(AppError::not_found("Liked videos missing!"));
    }

    Ok(ApiResponse::ok(videos, "Liked Videos fetched successfully!"))
}
