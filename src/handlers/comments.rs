use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use bson::oid::ObjectId;
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    errors::{AppError, AppResult},
    middleware::auth::CurrentUser,
    models::{
        AddCommentRequest, Comment, CommentResponse, CommentWithOwner, PageQuery, PageRequest,
        Paginated, UpdateCommentRequest,
    },
    utils::{
        validation::{parse_object_id, required_text},
        ApiResponse,
    },
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/v1/comments/{videoId}",
    tag = "comments",
    security(("Bearer" = [])),
    params(("videoId" = String, Path, description = "Video id"), PageQuery),
    responses(
        (status = 200, description = "Page of comments, newest first"),
        (status = 400, description = "Invalid video id")
    )
)]
pub async fn video_comments(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Query(page): Query<PageQuery>,
) -> AppResult<ApiResponse<Paginated<CommentWithOwner>>> {
    let video_id = parse_object_id(&video_id, "Invalid videoId!")?;

    let comments = state
        .database
        .video_comments(video_id, PageRequest::from(page))
        .await?;

    Ok(ApiResponse::ok(comments, "Fetched video comments successfully!"))
}

#[utoipa::path(
    post,
    path = "/api/v1/comments/{videoId}",
    tag = "comments",
    security(("Bearer" = [])),
    params(("videoId" = String, Path, description = "Video id")),
    request_body = AddCommentRequest,
    responses(
        (status = 201, description = "Comment added"),
        (status = 400, description = "Invalid id or empty content"),
        (status = 404, description = "Video not found")
    )
)]
pub async fn add_comment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(video_id): Path<String>,
    Json(payload): Json<AddCommentRequest>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let content = required_text(payload.content.as_deref(), "Content cannot be empty!")?;
    let video_id = parse_object_id(&video_id, "Video ID is invalid!")?;

    if state.database.find_video_by_id(video_id).await?.is_none() {
        return Err(AppError::not_found("Video not found!"));
    }

    let comment = state
        .database
        .create_comment(Comment::new(content, video_id, current.id))
        .await?;

    info!("Comment {} added to video {}", comment.id, video_id);
    Ok(ApiResponse::created(comment.to_response(), "Comment added successfully!"))
}

/// Load a comment the caller wrote; 404 when missing, 403 when someone else's
async fn owned_comment(state: &AppState, id: ObjectId, caller: ObjectId) -> AppResult<Comment> {
    let comment = state
        .database
        .find_comment_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Comment not found!"))?;

    if comment.owner != caller {
        warn!("User {} tried to modify comment {} owned by {}", caller, id, comment.owner);
        return Err(AppError::forbidden("You are not the owner of this comment!"));
    }
    Ok(comment)
}

#[utoipa::path(
    patch,
    path = "/api/v1/comments/c/{commentId}",
    tag = "comments",
    security(("Bearer" = [])),
    params(("commentId" = String, Path, description = "Comment id")),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Comment updated"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Comment not found")
    )
)]
pub async fn update_comment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(comment_id): Path<String>,
    Json(payload): Json<UpdateCommentRequest>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let id = parse_object_id(&comment_id, "Invalid Comment Id")?;
    let content = payload
        .text()
        .map(str::to_string)
        .ok_or_else(|| AppError::bad_request("Content cannot be empty!"))?;

    owned_comment(&state, id, current.id).await?;
    let comment = state.database.update_comment(id, &content).await?;

    Ok(ApiResponse::ok(comment.to_response(), "Comment Updated successfully!"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/comments/c/{commentId}",
    tag = "comments",
    security(("Bearer" = [])),
    params(("commentId" = String, Path, description = "Comment id")),
    responses(
        (status = 204, description = "Comment and its likes deleted"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Comment not found")
    )
)]
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(comment_id): Path<String>,
) -> AppResult<ApiResponse<Value>> {
    let id = parse_object_id(&comment_id, "Invalid Comment Id")?;

    owned_comment(&state, id, current.id).await?;
    state.database.delete_comment(id).await?;

    info!("Comment {} deleted by {}", id, current.user.user_name);
    Ok(ApiResponse::empty(StatusCode::NO_CONTENT, "Comment deleted successfully!"))
}
