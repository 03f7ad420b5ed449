use axum::{extract::State, Extension};

use crate::{
    errors::AppResult,
    middleware::auth::CurrentUser,
    models::{ChannelStats, VideoResponse},
    utils::ApiResponse,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/stats",
    tag = "dashboard",
    security(("Bearer" = [])),
    responses((status = 200, description = "Totals for the caller's channel"))
)]
pub async fn channel_stats(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<ApiResponse<ChannelStats>> {
    let stats = state.database.channel_stats(current.id).await?;
    Ok(ApiResponse::ok(stats, "Channel stats fetched successfully!"))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/videos",
    tag = "dashboard",
    security(("Bearer" = [])),
    responses((status = 200, description = "Every video the caller uploaded, newest first"))
)]
pub async fn channel_videos(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<ApiResponse<Vec<VideoResponse>>> {
    let videos = state.database.videos_by_owner(current.id).await?;
    Ok(ApiResponse::ok(videos, "Channel Videos fetched successfully!"))
}
