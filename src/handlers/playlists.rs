use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    errors::{AppError, AppResult},
    middleware::auth::CurrentUser,
    models::{Playlist, PlaylistRequest, PlaylistResponse, PlaylistWithVideos},
    utils::{
        validation::{parse_object_id, required_text},
        ApiResponse,
    },
    AppState,
};

const NOT_FOUND_OR_FORBIDDEN: &str = "Playlist not found or forbidden!";

fn description_of(payload: &PlaylistRequest) -> Option<String> {
    payload.description.as_deref().map(|d| d.trim().to_string())
}

#[utoipa::path(
    post,
    path = "/api/v1/playlist",
    tag = "playlists",
    security(("Bearer" = [])),
    request_body = PlaylistRequest,
    responses(
        (status = 201, description = "Playlist created"),
        (status = 400, description = "Name missing")
    )
)]
pub async fn create_playlist(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<PlaylistRequest>,
) -> AppResult<ApiResponse<PlaylistResponse>> {
    let name = required_text(payload.name.as_deref(), "Name is required !")?;
    let description = description_of(&payload).unwrap_or_default();

    let playlist = state
        .database
        .create_playlist(Playlist::new(name, description, current.id))
        .await?;

    info!("Playlist {} created by {}", playlist.id, current.user.user_name);
    Ok(ApiResponse::created(playlist.to_response(), "Playlist created successfully!"))
}

#[utoipa::path(
    get,
    path = "/api/v1/playlist/{playlistId}",
    tag = "playlists",
    security(("Bearer" = [])),
    params(("playlistId" = String, Path, description = "Playlist id")),
    responses(
        (status = 200, description = "Playlist"),
        (status = 400, description = "Invalid playlist id"),
        (status = 404, description = "Playlist not found")
    )
)]
pub async fn get_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
) -> AppResult<ApiResponse<PlaylistResponse>> {
    let id = parse_object_id(&playlist_id, "Invalid Playlist Id!")?;

    let playlist = state
        .database
        .find_playlist_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Playlist not found!"))?;

    Ok(ApiResponse::ok(playlist.to_response(), "Playlist found!"))
}

#[utoipa::path(
    patch,
    path = "/api/v1/playlist/{playlistId}",
    tag = "playlists",
    security(("Bearer" = [])),
    params(("playlistId" = String, Path, description = "Playlist id")),
    request_body = PlaylistRequest,
    responses(
        (status = 200, description = "Playlist updated"),
        (status = 400, description = "Invalid id or name missing"),
        (status = 404, description = "Playlist not found or not yours")
    )
)]
pub async fn update_playlist(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(playlist_id): Path<String>,
    Json(payload): Json<PlaylistRequest>,
) -> AppResult<ApiResponse<PlaylistResponse>> {
    let id = parse_object_id(&playlist_id, "Invalid playlist Id!")?;
    let name = required_text(payload.name.as_deref(), "Name cannot be empty!")?;

    // An omitted description keeps the current one
    let description = match description_of(&payload) {
        Some(description) => description,
        None => state
            .database
            .find_playlist_by_id(id)
            .await?
            .filter(|p| p.owner == current.id)
            .map(|p| p.description)
            .ok_or_else(|| AppError::not_found(NOT_FOUND_OR_FORBIDDEN))?,
    };

    let playlist = state
        .database
        .update_playlist(id, current.id, &name, &description)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND_OR_FORBIDDEN))?;

    Ok(ApiResponse::ok(playlist.to_response(), "Playlist updated successfully!"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/playlist/{playlistId}",
    tag = "playlists",
    security(("Bearer" = [])),
    params(("playlistId" = String, Path, description = "Playlist id")),
    responses(
        (status = 204, description = "Playlist deleted"),
        (status = 404, description = "Playlist not found or not yours")
    )
)]
pub async fn delete_playlist(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(playlist_id): Path<String>,
) -> AppResult<ApiResponse<Value>> {
    let id = parse_object_id(&playlist_id, "Invalid playlist Id!")?;

    if !state.database.delete_playlist(id, current.id).await? {
        return Err(AppError::not_found(NOT_FOUND_OR_FORBIDDEN));
    }

    info!("Playlist {} deleted by {}", id, current.user.user_name);
    Ok(ApiResponse::empty(StatusCode::NO_CONTENT, "Playlist deleted successfully!"))
}

#[utoipa::path(
    patch,
    path = "/api/v1/playlist/add/{videoId}/{playlistId}",
    tag = "playlists",
    security(("Bearer" = [])),
    params(
        ("videoId" = String, Path, description = "Video id"),
        ("playlistId" = String, Path, description = "Playlist id")
    ),
    responses(
        (status = 200, description = "Video in playlist"),
        (status = 404, description = "Video missing, or playlist not found or not yours")
    )
)]
pub async fn add_video_to_playlist(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<PlaylistResponse>> {
    let video = parse_object_id(&video_id, "Invalid Video or Playlist Id !")?;
    let id = parse_object_id(&playlist_id, "Invalid Video or Playlist Id !")?;

    if state.database.find_video_by_id(video).await?.is_none() {
        return Err(AppError::not_found("Video not found!"));
    }

    let playlist = state
        .database
        .add_video_to_playlist(id, current.id, video)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND_OR_FORBIDDEN))?;

    debug!("Playlist {} now holds {} videos", id, playlist.videos.len());
    Ok(ApiResponse::ok(playlist.to_response(), "Video added to playlist!"))
}

#[utoipa::path(
    patch,
    path = "/api/v1/playlist/remove/{videoId}/{playlistId}",
    tag = "playlists",
    security(("Bearer" = [])),
    params(
        ("videoId" = String, Path, description = "Video id"),
        ("playlistId" = String, Path, description = "Playlist id")
    ),
    responses(
        (status = 200, description = "Video no longer in playlist"),
        (status = 404, description = "Playlist not found or not yours")
    )
)]
pub async fn remove_video_from_playlist(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<PlaylistResponse>> {
    let video = parse_object_id(&video_id, "Invalid Video or Playlist Id !")?;
    let id = parse_object_id(&playlist_id, "Invalid Video or Playlist Id !")?;

    let playlist = state
        .database
        .remove_video_from_playlist(id, current.id, video)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND_OR_FORBIDDEN))?;

    Ok(ApiResponse::ok(playlist.to_response(), "Video removed from playlist!"))
}

#[utoipa::path(
    get,
    path = "/api/v1/playlist/user/{userId}",
    tag = "playlists",
    security(("Bearer" = [])),
    params(("userId" = String, Path, description = "Owner id")),
    responses(
        (status = 200, description = "Playlists with their videos"),
        (status = 400, description = "Invalid user id")
    )
)]
pub async fn user_playlists(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<Vec<PlaylistWithVideos>>> {
    let owner = parse_object_id(&user_id, "Invalid user Id!")?;

    let playlists = state.database.user_playlists(owner).await?;
    Ok(ApiResponse::ok(playlists, "User playlist fetched successfully!"))
}
