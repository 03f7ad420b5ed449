use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension,
};
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    errors::{AppError, AppResult},
    middleware::auth::CurrentUser,
    models::{ChannelSubscribers, ToggleOutcome, UserSummary},
    utils::{validation::parse_object_id, ApiResponse},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/v1/subscriptions/c/{channelId}",
    tag = "subscriptions",
    security(("Bearer" = [])),
    params(("channelId" = String, Path, description = "Channel (user) id")),
    responses(
        (status = 200, description = "Unsubscribed"),
        (status = 201, description = "Subscribed"),
        (status = 400, description = "Invalid id or own channel"),
        (status = 404, description = "Channel not found")
    )
)]
pub async fn toggle_subscription(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(channel_id): Path<String>,
) -> AppResult<ApiResponse<Value>> {
    let channel = parse_object_id(&channel_id, "Invalid channel id!")?;
    if channel == current.id {
        warn!("User {} tried to subscribe to their own channel", current.id);
        return Err(AppError::bad_request("You cannot subscribe to your own channel!"));
    }

    if state.database.find_user_by_id(channel).await?.is_none() {
        return Err(AppError::not_found("Channel not found!"));
    }

    let outcome = state
        .database
        .toggle_subscription(current.id, channel)
        .await?;
    info!("Subscription {} -> {}: {:?}", current.id, channel, outcome);

    Ok(match outcome {
        ToggleOutcome::Removed => ApiResponse::empty(StatusCode::OK, "Channel unsubscribed!"),
        ToggleOutcome::Added => ApiResponse::empty(StatusCode::CREATED, "Channel Subscribed!"),
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/subscriptions/c/{channelId}",
    tag = "subscriptions",
    security(("Bearer" = [])),
    params(("channelId" = String, Path, description = "Channel (user) id")),
    responses(
        (status = 200, description = "Subscriber cards and total"),
        (status = 400, description = "Invalid channel id")
    )
)]
pub async fn channel_subscribers(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> AppResult<ApiResponse<ChannelSubscribers>> {
    let channel = parse_object_id(&channel_id, "Invalid Channel ID!")?;

    let subscribers = state.database.channel_subscribers(channel).await?;
    Ok(ApiResponse::ok(
        subscribers,
        "Channel Subscribers fetched successfully!",
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/subscriptions/u/{subscriberId}",
    tag = "subscriptions",
    security(("Bearer" = [])),
    params(("subscriberId" = String, Path, description = "Subscriber (user) id")),
    responses(
        (status = 200, description = "Channels the user subscribes to"),
        (status = 400, description = "Invalid subscriber id"),
        (status = 404, description = "No subscriptions")
    )
)]
pub async fn subscribed_channels(
    State(state): State<AppState>,
    Path(subscriber_id): Path<String>,
) -> AppResult<ApiResponse<Vec<UserSummary>>> {
    let subscriber = parse_object_id(&subscriber_id, "Invalid Subscriber Id!")?;

    let channels = state.database.subscribed_channels(subscriber).await?;
    if channels.is_empty() {
        return Err(AppError::not_found("Subscribed Channels not found!"));
    }

    Ok(ApiResponse::ok(
        channels,
        "Subscribed channels fetched successfully!",
    ))
}
