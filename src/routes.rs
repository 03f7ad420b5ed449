use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    handlers::{comments, dashboard, health, likes, playlists, subscriptions, tweets, users, videos},
    middleware::{auth::verify_jwt, cors::create_cors_layer},
    models, AppState,
};

// OpenAPI documentation configuration
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::ready_check,
        users::register,
        users::login,
        users::logout,
        users::refresh_token,
        users::change_password,
        users::current_user,
        users::update_account,
        users::update_avatar,
        users::update_cover_image,
        users::channel_profile,
        users::watch_history,
        videos::list_videos,
        videos::publish_video,
        videos::get_video,
        videos::update_video,
        videos::delete_video,
        videos::toggle_publish,
        tweets::create_tweet,
        tweets::user_tweets,
        tweets::update_tweet,
        tweets::delete_tweet,
        comments::video_comments,
        comments::add_comment,
        comments::update_comment,
        comments::delete_comment,
        likes::toggle_video_like,
        likes::toggle_comment_like,
        likes::toggle_tweet_like,
        likes::liked_videos,
        subscriptions::toggle_subscription,
        subscriptions::channel_subscribers,
        subscriptions::subscribed_channels,
        playlists::create_playlist,
        playlists::get_playlist,
        playlists::update_playlist,
        playlists::delete_playlist,
        playlists::add_video_to_playlist,
        playlists::remove_video_from_playlist,
        playlists::user_playlists,
        dashboard::channel_stats,
        dashboard::channel_videos,
    ),
    components(
        schemas(
            models::RegisterUserRequest,
            models::LoginRequest,
            models::RefreshTokenRequest,
            models::ChangePasswordRequest,
            models::UpdateAccountRequest,
            models::VideoListQuery,
            models::CreateTweetRequest,
            models::UpdateTweetRequest,
            models::AddCommentRequest,
            models::UpdateCommentRequest,
            models::PlaylistRequest,
        )
    ),
    tags(
        (name = "health", description = "Service health"),
        (name = "users", description = "Accounts, sessions and channel profiles"),
        (name = "videos", description = "Video upload, listing and publishing"),
        (name = "tweets", description = "Short text posts"),
        (name = "comments", description = "Comments on videos"),
        (name = "likes", description = "Likes on videos, comments and tweets"),
        (name = "subscriptions", description = "Channel subscriptions"),
        (name = "playlists", description = "User playlists"),
        (name = "dashboard", description = "Creator dashboard")
    ),
    info(
        title = "VideoTube API",
        version = "0.1.0",
        description = "Video sharing platform backend",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    modifiers(&SecurityAddon),
    servers((url = "http://localhost:4000", description = "Local development server"))
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token; the accessToken cookie works too"))
                        .build(),
                ),
            )
        }
    }
}

/// Build the full application router
pub fn create_router(state: AppState) -> Router {
    // Routes reachable without a session
    let public_routes = Router::new()
        .route("/api/v1/healthcheck", get(health::health_check))
        .route("/api/v1/healthcheck/ready", get(health::ready_check))
        .route("/api/v1/users/register", post(users::register))
        .route("/api/v1/users/login", post(users::login))
        .route("/api/v1/users/refresh-token", post(users::refresh_token));

    let user_routes = Router::new()
        .route("/api/v1/users/logout", post(users::logout))
        .route("/api/v1/users/change-password", post(users::change_password))
        .route("/api/v1/users/current-user", get(users::current_user))
        .route("/api/v1/users/update-account", patch(users::update_account))
        .route("/api/v1/users/avatar", patch(users::update_avatar))
        .route("/api/v1/users/cover-image", patch(users::update_cover_image))
        .route("/api/v1/users/c/:userName", get(users::channel_profile))
        .route("/api/v1/users/history", get(users::watch_history));

    let video_routes = Router::new()
        .route(
            "/api/v1/videos",
            get(videos::list_videos).post(videos::publish_video),
        )
        .route(
            "/api/v1/videos/:videoId",
            get(videos::get_video)
                .patch(videos::update_video)
                .delete(videos::delete_video),
        )
        .route(
            "/api/v1/videos/toggle/publish/:videoId",
            patch(videos::toggle_publish),
        );

    let tweet_routes = Router::new()
        .route("/api/v1/tweets", post(tweets::create_tweet))
        .route("/api/v1/tweets/user/:userId", get(tweets::user_tweets))
        .route(
            "/api/v1/tweets/:tweetId",
            patch(tweets::update_tweet).delete(tweets::delete_tweet),
        );

    let comment_routes = Router::new()
        .route(
            "/api/v1/comments/:videoId",
            get(comments::video_comments).post(comments::add_comment),
        )
        .route(
            "/api/v1/comments/c/:commentId",
            patch(comments::update_comment).delete(comments::delete_comment),
        );

    let like_routes = Router::new()
        .route("/api/v1/likes/toggle/v/:videoId", post(likes::toggle_video_like))
        .route("/api/v1/likes/toggle/c/:commentId", post(likes::toggle_comment_like))
        .route("/api/v1/likes/toggle/t/:tweetId", post(likes::toggle_tweet_like))
        .route("/api/v1/likes/videos", get(likes::liked_videos));

    let subscription_routes = Router::new()
        .route(
            "/api/v1/subscriptions/c/:channelId",
            get(subscriptions::channel_subscribers).post(subscriptions::toggle_subscription),
        )
        .route(
            "/api/v1/subscriptions/u/:subscriberId",
            get(subscriptions::subscribed_channels),
        );

    let playlist_routes = Router::new()
        .route("/api/v1/playlist", post(playlists::create_playlist))
        .route(
            "/api/v1/playlist/:playlistId",
            get(playlists::get_playlist)
                .patch(playlists::update_playlist)
                .delete(playlists::delete_playlist),
        )
        .route(
            "/api/v1/playlist/add/:videoId/:playlistId",
            patch(playlists::add_video_to_playlist),
        )
        .route(
            "/api/v1/playlist/remove/:videoId/:playlistId",
            patch(playlists::remove_video_from_playlist),
        )
        .route("/api/v1/playlist/user/:userId", get(playlists::user_playlists));

    let dashboard_routes = Router::new()
        .route("/api/v1/dashboard/stats", get(dashboard::channel_stats))
        .route("/api/v1/dashboard/videos", get(dashboard::channel_videos));

    // Everything below requires a valid access token
    let protected_routes = Router::new()
        .merge(user_routes)
        .merge(video_routes)
        .merge(tweet_routes)
        .merge(comment_routes)
        .merge(like_routes)
        .merge(subscription_routes)
        .merge(playlist_routes)
        .merge(dashboard_routes)
        .route_layer(from_fn_with_state(state.clone(), verify_jwt));

    let mut app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // Uploads stored on local disk are served back from the same process
    if state.config.media.provider == "local" {
        let local = &state.config.media.local;
        let mount = format!("/{}", local.url_prefix.trim_matches('/'));
        app = app.nest_service(&mount, ServeDir::new(&local.directory));
    }

    app.fallback_service(ServeDir::new(&state.config.server.public_dir))
        .layer(DefaultBodyLimit::max(state.config.media.max_upload_bytes))
        .layer(create_cors_layer(state.config.server.cors_origin.as_deref()))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route_group() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        for path in [
            "/api/v1/healthcheck",
            "/api/v1/users/register",
            "/api/v1/videos/{videoId}",
            "/api/v1/tweets/user/{userId}",
            "/api/v1/comments/c/{commentId}",
            "/api/v1/likes/toggle/v/{videoId}",
            "/api/v1/subscriptions/u/{subscriberId}",
            "/api/v1/playlist/add/{videoId}/{playlistId}",
            "/api/v1/dashboard/stats",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("Bearer"));
    }
}
