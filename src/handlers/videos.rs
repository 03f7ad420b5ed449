use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Extension,
};
use bson::oid::ObjectId;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    errors::{AppError, AppResult},
    middleware::auth::CurrentUser,
    models::{
        NewVideo, PageRequest, Paginated, Video, VideoFilter, VideoListQuery, VideoResponse,
        VideoSortField, VideoUpdate, VideoWithOwner,
    },
    utils::{
        multipart::MultipartForm,
        validation::{parse_object_id, required_text},
        ApiResponse,
    },
    AppState,
};

use super::discard_asset;

/// Turn raw query parameters into a store filter for the given caller
fn video_filter(query: &VideoListQuery, caller: ObjectId) -> AppResult<VideoFilter> {
    let owner = query
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(|raw| parse_object_id(raw, "Invalid user Id!"))
        .transpose()?;

    let sort_by = match query.sort_by.as_deref().map(str::trim) {
        None | Some("") => VideoSortField::default(),
        Some(raw) => raw.parse::<VideoSortField>().map_err(AppError::bad_request)?,
    };

    let ascending = match query.sort_type.as_deref().map(str::trim) {
        None | Some("") => false,
        Some(raw) if raw.eq_ignore_ascii_case("asc") => true,
        Some(raw) if raw.eq_ignore_ascii_case("desc") => false,
        Some(raw) => {
            return Err(AppError::bad_request(format!(
                "Invalid sort type: {raw}, expected asc or desc"
            )))
        }
    };

    Ok(VideoFilter {
        search: query
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string),
        owner,
        include_unpublished: owner == Some(caller),
        sort_by,
        ascending,
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/videos",
    tag = "videos",
    security(("Bearer" = [])),
    params(VideoListQuery),
    responses(
        (status = 200, description = "Page of videos with owner cards"),
        (status = 400, description = "Invalid userId, sortBy or sortType")
    )
)]
pub async fn list_videos(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<VideoListQuery>,
) -> AppResult<ApiResponse<Paginated<VideoWithOwner>>> {
    let filter = video_filter(&query, current.id)?;
    let page = PageRequest::new(query.page, query.limit);
    debug!("Listing videos: {:?} {:?}", filter, page);

    let videos = state.database.list_videos(&filter, page).await?;
    Ok(ApiResponse::ok(videos, "Videos fetched successfully!"))
}

#[utoipa::path(
    post,
    path = "/api/v1/videos",
    tag = "videos",
    security(("Bearer" = [])),
    request_body(content = String, content_type = "multipart/form-data",
        description = "title, description plus videoFile and thumbnail files"),
    responses(
        (status = 201, description = "Video published"),
        (status = 400, description = "Missing field or file, or upload failed")
    )
)]
pub async fn publish_video(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    multipart: Multipart,
) -> AppResult<ApiResponse<VideoResponse>> {
    let mut form =
        MultipartForm::from_multipart(multipart, state.config.media.max_upload_bytes).await?;

    let title = required_text(form.text("title"), "Title or description is missing!")?;
    let description = required_text(form.text("description"), "Title or description is missing!")?;
    let video_file = form
        .take_file("videoFile")
        .ok_or_else(|| AppError::bad_request("Video File is missing from local server!"))?;
    let thumbnail_file = form
        .take_file("thumbnail")
        .ok_or_else(|| AppError::bad_request("Thumbnail is missing from local server!"))?;

    let video_asset = state.media.upload(video_file).await.map_err(|e| {
        warn!("Video upload failed: {}", e);
        AppError::bad_request("Video file not uploaded on cloudinary!")
    })?;

    let thumbnail_asset = match state.media.upload(thumbnail_file).await {
        Ok(asset) => asset,
        Err(e) => {
            warn!("Thumbnail upload failed: {}", e);
            discard_asset(&state, &video_asset.url).await;
            return Err(AppError::bad_request("Thumbnail not uploaded on cloudinary!"));
        }
    };

    let video = state
        .database
        .create_video(Video::new(NewVideo {
            video_file: video_asset.url,
            thumbnail: thumbnail_asset.url,
            title,
            description,
            duration: video_asset.duration.unwrap_or_default(),
            owner: current.id,
        }))
        .await?;

    info!("Video {} published by {}", video.id, current.user.user_name);
    Ok(ApiResponse::created(video.to_response(), "Video published successfully!"))
}

#[utoipa::path(
    get,
    path = "/api/v1/videos/{videoId}",
    tag = "videos",
    security(("Bearer" = [])),
    params(("videoId" = String, Path, description = "Video id")),
    responses(
        (status = 200, description = "Video with owner card; counts a view"),
        (status = 400, description = "Invalid video id"),
        (status = 404, description = "No such video, or unpublished and not yours")
    )
)]
pub async fn get_video(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(video_id): Path<String>,
) -> AppResult<ApiResponse<VideoWithOwner>> {
    let id = parse_object_id(&video_id, "Invalid video Id!")?;

    let mut video = state
        .database
        .video_with_owner(id)
        .await?
        .ok_or_else(|| AppError::not_found("No video found!"))?;

    if !video.is_published && video.owner.id != current.user.id {
        return Err(AppError::not_found("No video found!"));
    }

    state.database.increment_views(id).await?;
    state.database.add_to_watch_history(current.id, id).await?;
    video.views += 1;

    Ok(ApiResponse::ok(video, "Video fetched successfully!"))
}

/// Load a video the caller owns; 404 when missing, 403 when someone else's
async fn owned_video(
    state: &AppState,
    id: ObjectId,
    caller: ObjectId,
    action: &str,
) -> AppResult<Video> {
    let video = state
        .database
        .find_video_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Video not found!"))?;

    if video.owner != caller {
        warn!("User {} tried to {} video {} owned by {}", caller, action, id, video.owner);
        return Err(AppError::forbidden(format!(
            "You are not allowed to {action} this video!"
        )));
    }
    Ok(video)
}

#[utoipa::path(
    patch,
    path = "/api/v1/videos/{videoId}",
    tag = "videos",
    security(("Bearer" = [])),
    params(("videoId" = String, Path, description = "Video id")),
    request_body(content = String, content_type = "multipart/form-data",
        description = "title, description plus a thumbnail file"),
    responses(
        (status = 200, description = "Video updated"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Video not found")
    )
)]
pub async fn update_video(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(video_id): Path<String>,
    multipart: Multipart,
) -> AppResult<ApiResponse<VideoResponse>> {
    let id = parse_object_id(&video_id, "Invalid video Id!")?;
    let mut form =
        MultipartForm::from_multipart(multipart, state.config.media.max_upload_bytes).await?;

    let title = required_text(form.text("title"), "Title or description is missing!")?;
    let description = required_text(form.text("description"), "Title or description is missing!")?;

    let existing = owned_video(&state, id, current.id, "update").await?;

    let thumbnail_file = form
        .take_file("thumbnail")
        .ok_or_else(|| AppError::bad_request("Thumbnail not uploaded on local Server!"))?;
    let thumbnail = state.media.upload(thumbnail_file).await.map_err(|e| {
        warn!("Thumbnail upload failed: {}", e);
        AppError::bad_request("Error while uploading thumbnail to cloudinary!")
    })?;

    let video = state
        .database
        .update_video(
            id,
            VideoUpdate {
                title,
                description,
                thumbnail: thumbnail.url,
            },
        )
        .await?;
    discard_asset(&state, &existing.thumbnail).await;

    Ok(ApiResponse::ok(video.to_response(), "Video details updated successfully!"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/videos/{videoId}",
    tag = "videos",
    security(("Bearer" = [])),
    params(("videoId" = String, Path, description = "Video id")),
    responses(
        (status = 200, description = "Video and everything hanging off it deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Video not found")
    )
)]
pub async fn delete_video(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(video_id): Path<String>,
) -> AppResult<ApiResponse<Value>> {
    let id = parse_object_id(&video_id, "Invalid video Id!")?;
    let video = owned_video(&state, id, current.id, "delete").await?;

    state.database.delete_video(id).await?;
    discard_asset(&state, &video.video_file).await;
    discard_asset(&state, &video.thumbnail).await;

    info!("Video {} deleted by {}", id, current.user.user_name);
    Ok(ApiResponse::empty(StatusCode::OK, "Video deleted successfully!"))
}

#[utoipa::path(
    patch,
    path = "/api/v1/videos/toggle/publish/{videoId}",
    tag = "videos",
    security(("Bearer" = [])),
    params(("videoId" = String, Path, description = "Video id")),
    responses(
        (status = 200, description = "isPublished flipped"),
        (status = 404, description = "Video not found or not yours")
    )
)]
pub async fn toggle_publish(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(video_id): Path<String>,
) -> AppResult<ApiResponse<VideoResponse>> {
    let id = parse_object_id(&video_id, "Invalid Video Id!")?;

    let video = state
        .database
        .toggle_publish(id, current.id)
        .await?
        .ok_or_else(|| AppError::not_found("Video not found!"))?;

    debug!("Video {} isPublished={}", id, video.is_published);
    Ok(ApiResponse::ok(video.to_response(), "Publish Toggled"))
}
