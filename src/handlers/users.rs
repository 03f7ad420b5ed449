use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use serde_json::Value;
use tracing::{debug, error, info, warn};
use validator::Validate;

use crate::{
    database::DbError,
    errors::{AppError, AppResult},
    middleware::auth::CurrentUser,
    models::{
        AuthResponse, ChangePasswordRequest, ChannelProfile, LoginRequest, NewUser,
        RefreshTokenRequest, RegisterUserRequest, TokenPair, UpdateAccountRequest, User,
        UserResponse, VideoWithOwner,
    },
    utils::{
        cookies::{auth_cookies, clear_auth_cookies, read_cookie, REFRESH_TOKEN_COOKIE},
        multipart::MultipartForm,
        validation::required_text,
        ApiResponse,
    },
    AppState,
};

use super::discard_asset;

/// Issue a token pair, persist the refresh token and build the matching cookies
async fn issue_tokens(state: &AppState, user: &User) -> AppResult<(TokenPair, HeaderMap)> {
    let tokens = state.tokens.generate_token_pair(user).map_err(|e| {
        error!("Token generation failed: {:?}", e);
        AppError::internal("Something went wrong while generating tokens")
    })?;

    state
        .database
        .set_refresh_token(user.id, Some(&tokens.refresh_token))
        .await?;

    let cookies = auth_cookies(
        &tokens.access_token,
        state.tokens.access_token_expiry(),
        &tokens.refresh_token,
        state.tokens.refresh_token_expiry(),
        state.config.auth.secure_cookies,
    );
    Ok((tokens, cookies))
}

// Registration endpoint
#[utoipa::path(
    post,
    path = "/api/v1/users/register",
    tag = "users",
    request_body(content = RegisterUserRequest, content_type = "multipart/form-data",
        description = "userName, fullName, email, password plus avatar and optional coverImage files"),
    responses(
        (status = 201, description = "User registered"),
        (status = 400, description = "Missing or invalid field"),
        (status = 409, description = "userName or email taken")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<ApiResponse<UserResponse>> {
    let mut form =
        MultipartForm::from_multipart(multipart, state.config.media.max_upload_bytes).await?;

    let request = RegisterUserRequest {
        user_name: required_text(form.text("userName"), "Username is missing !")?.to_lowercase(),
        full_name: required_text(form.text("fullName"), "fullName is missing !")?,
        email: required_text(form.text("email"), "email is missing !")?.to_lowercase(),
        password: required_text(form.text("password"), "password is missing !")?,
    };
    debug!("Registration attempt for user: {}", request.user_name);
    request.validate()?;

    if state
        .database
        .user_exists(&request.user_name, &request.email)
        .await?
    {
        warn!("Registration attempt with existing userName or email: {}", request.email);
        return Err(AppError::conflict("User with username or email already exists "));
    }

    let password_hash = state
        .passwords
        .hash_password_blocking(request.password.clone())
        .await
        .map_err(|e| {
            error!("Password hashing failed: {:?}", e);
            AppError::internal("Something went wrong while registering the user")
        })?;

    let avatar_file = form
        .take_file("avatar")
        .ok_or_else(|| AppError::bad_request("Avatar is missing in local server !"))?;
    let avatar = state.media.upload(avatar_file).await.map_err(|e| {
        warn!("Avatar upload failed: {}", e);
        AppError::bad_request("Avatar not uploaded to cloudinary !")
    })?;

    let cover_image = match form.take_file("coverImage") {
        Some(file) => match state.media.upload(file).await {
            Ok(asset) => asset.url,
            Err(e) => {
                warn!("Cover image upload failed, continuing without it: {}", e);
                String::new()
            }
        },
        None => String::new(),
    };

    let user = User::new(NewUser {
        user_name: request.user_name,
        full_name: request.full_name,
        email: request.email,
        password_hash,
        avatar: avatar.url.clone(),
        cover_image: cover_image.clone(),
    });

    // A concurrent registration can still win the unique index
    let created = match state.database.create_user(user).await {
        Ok(created) => created,
        Err(e) => {
            discard_asset(&state, &avatar.url).await;
            discard_asset(&state, &cover_image).await;
            return Err(match e {
                DbError::Duplicate(_) => {
                    AppError::conflict("User with username or email already exists ")
                }
                other => other.into(),
            });
        }
    };

    info!("User registered successfully: {}", created.user_name);
    Ok(ApiResponse::created(
        created.to_response(),
        "User registered successfully !",
    ))
}

// Login endpoint
#[utoipa::path(
    post,
    path = "/api/v1/users/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; auth cookies set"),
        (status = 400, description = "Missing credentials"),
        (status = 401, description = "Unknown user or wrong password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<ApiResponse<AuthResponse>> {
    let password = required_text(payload.password.as_deref(), "Password is missing !")?;

    let email = payload
        .email
        .as_deref()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty());
    let user_name = payload
        .user_name
        .as_deref()
        .map(|u| u.trim().to_lowercase())
        .filter(|u| !u.is_empty());
    if email.is_none() && user_name.is_none() {
        return Err(AppError::bad_request("Email is missing !"));
    }
    debug!("Login attempt for: {:?}", email.as_deref().or(user_name.as_deref()));

    let user = state
        .database
        .find_user_by_login(email.as_deref(), user_name.as_deref())
        .await?
        .ok_or_else(|| {
            warn!("Login attempt for unknown user");
            AppError::unauthorized("User with this email does not exist!")
        })?;

    let valid = state
        .passwords
        .verify_password_blocking(password, user.password.clone())
        .await
        .map_err(|e| {
            error!("Password verification failed: {:?}", e);
            AppError::internal("Something went wrong while logging in")
        })?;
    if !valid {
        warn!("Invalid password for user: {}", user.user_name);
        return Err(AppError::unauthorized("Password is incorrect!"));
    }

    let (tokens, cookies) = issue_tokens(&state, &user).await?;
    info!("User logged in: {}", user.user_name);

    Ok(ApiResponse::ok(
        AuthResponse {
            user: user.to_response(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        },
        "User loggedIn successful !",
    )
    .with_headers(cookies))
}

// Logout endpoint
#[utoipa::path(
    post,
    path = "/api/v1/users/logout",
    tag = "users",
    security(("Bearer" = [])),
    responses((status = 200, description = "Logged out; auth cookies cleared"))
)]
pub async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<ApiResponse<Value>> {
    state.database.set_refresh_token(current.id, None).await?;
    info!("User logged out: {}", current.user.user_name);

    Ok(ApiResponse::empty(StatusCode::OK, "User Logged out!")
        .with_headers(clear_auth_cookies(state.config.auth.secure_cookies)))
}

// Token rotation endpoint
#[utoipa::path(
    post,
    path = "/api/v1/users/refresh-token",
    tag = "users",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New token pair issued"),
        (status = 401, description = "Missing, invalid or already rotated refresh token")
    )
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<RefreshTokenRequest>>,
) -> AppResult<ApiResponse<TokenPair>> {
    let incoming = read_cookie(&headers, REFRESH_TOKEN_COOKIE)
        .or_else(|| body.and_then(|Json(b)| b.refresh_token))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::unauthorized("User not authenticated !"))?;

    let claims = state.tokens.verify_refresh_token(&incoming).map_err(|e| {
        warn!("Refresh token rejected: {:?}", e);
        AppError::unauthorized("Invalid refresh Token!")
    })?;

    let user_id = bson::oid::ObjectId::parse_str(&claims.id)
        .map_err(|_| AppError::unauthorized("Invalid refresh Token!"))?;
    let user = state
        .database
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("Invalid refresh Token!"))?;

    if user.refresh_token.as_deref() != Some(incoming.as_str()) {
        warn!("Stale refresh token presented for user: {}", user.user_name);
        return Err(AppError::unauthorized("Refresh Token expired or used!"));
    }

    let (tokens, cookies) = issue_tokens(&state, &user).await?;
    debug!("Rotated tokens for user: {}", user.user_name);

    Ok(ApiResponse::ok(tokens, "Access token refreshed!").with_headers(cookies))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/change-password",
    tag = "users",
    security(("Bearer" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Missing fields, same password or wrong old password")
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<ApiResponse<Value>> {
    let (Some(old_password), Some(new_password)) = (
        payload.old_password.filter(|p| !p.is_empty()),
        payload.new_password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::bad_request("Both the fields are required!"));
    };
    if old_password == new_password {
        return Err(AppError::bad_request("Both the passwords can't be same!"));
    }

    let user = state
        .database
        .find_user_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found!"))?;

    let valid = state
        .passwords
        .verify_password_blocking(old_password, user.password.clone())
        .await
        .map_err(|e| {
            error!("Password verification failed: {:?}", e);
            AppError::internal("Something went wrong while changing the password")
        })?;
    if !valid {
        return Err(AppError::bad_request("Invalid old password!"));
    }

    let password_hash = state
        .passwords
        .hash_password_blocking(new_password)
        .await
        .map_err(|e| {
            error!("Password hashing failed: {:?}", e);
            AppError::internal("Something went wrong while changing the password")
        })?;
    state.database.update_password(user.id, &password_hash).await?;

    info!("Password changed for user: {}", user.user_name);
    Ok(ApiResponse::empty(StatusCode::OK, "Password changed successfully !"))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/current-user",
    tag = "users",
    security(("Bearer" = [])),
    responses((status = 200, description = "The authenticated user"))
)]
pub async fn current_user(
    Extension(current): Extension<CurrentUser>,
) -> ApiResponse<UserResponse> {
    ApiResponse::ok(current.user, "current user fetched successfully!")
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/update-account",
    tag = "users",
    security(("Bearer" = [])),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated"),
        (status = 400, description = "Missing or invalid field"),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn update_account(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<UpdateAccountRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    let full_name = required_text(payload.full_name.as_deref(), "All the fields are required!")?;
    let email = required_text(payload.email.as_deref(), "All the fields are required!")?
        .to_lowercase();
    UpdateAccountRequest {
        full_name: Some(full_name.clone()),
        email: Some(email.clone()),
    }
    .validate()?;

    let user = state
        .database
        .update_account(current.id, &full_name, &email)
        .await
        .map_err(|e| match e {
            DbError::Duplicate(_) => AppError::conflict("User with this email already exists"),
            DbError::NotFound => AppError::not_found("User not found!"),
            other => other.into(),
        })?;

    info!("Account updated for user: {}", user.user_name);
    Ok(ApiResponse::ok(user.to_response(), "Account Updated successfully!"))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/avatar",
    tag = "users",
    security(("Bearer" = [])),
    request_body(content = String, content_type = "multipart/form-data",
        description = "avatar file"),
    responses(
        (status = 200, description = "Avatar replaced"),
        (status = 400, description = "File missing, upload failed or old avatar not deleted")
    )
)]
pub async fn update_avatar(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    multipart: Multipart,
) -> AppResult<ApiResponse<UserResponse>> {
    let mut form =
        MultipartForm::from_multipart(multipart, state.config.media.max_upload_bytes).await?;
    let file = form
        .take_file("avatar")
        .ok_or_else(|| AppError::bad_request("Avatar file is missing from local server!"))?;

    let asset = state.media.upload(file).await.map_err(|e| {
        warn!("Avatar upload failed: {}", e);
        AppError::bad_request("Failed to upload file to cloudinary!")
    })?;

    let old_avatar = current.user.avatar;
    let user = state.database.set_avatar(current.id, &asset.url).await?;

    if !old_avatar.is_empty() {
        if let Err(e) = state.media.delete(&old_avatar).await {
            error!("Failed to delete old avatar {}: {}", old_avatar, e);
            return Err(AppError::bad_request(
                "Error while deleting the old avatar from cloudinary!",
            ));
        }
    }

    Ok(ApiResponse::ok(user.to_response(), "Avatar updated successfully!"))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/cover-image",
    tag = "users",
    security(("Bearer" = [])),
    request_body(content = String, content_type = "multipart/form-data",
        description = "coverImage file"),
    responses(
        (status = 200, description = "Cover image replaced"),
        (status = 400, description = "File missing or upload failed")
    )
)]
pub async fn update_cover_image(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    multipart: Multipart,
) -> AppResult<ApiResponse<UserResponse>> {
    let mut form =
        MultipartForm::from_multipart(multipart, state.config.media.max_upload_bytes).await?;
    let file = form
        .take_file("coverImage")
        .ok_or_else(|| AppError::bad_request("Cover Image file is missing from local server!"))?;

    let asset = state.media.upload(file).await.map_err(|e| {
        warn!("Cover image upload failed: {}", e);
        AppError::bad_request("Failed to upload file to cloudinary!")
    })?;

    let user = state.database.set_cover_image(current.id, &asset.url).await?;
    discard_asset(&state, &current.user.cover_image).await;

    Ok(ApiResponse::ok(user.to_response(), "Cover Image updated successfully!"))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/c/{userName}",
    tag = "users",
    security(("Bearer" = [])),
    params(("userName" = String, Path, description = "Channel user name")),
    responses(
        (status = 200, description = "Channel profile with subscription counters"),
        (status = 404, description = "Channel does not exist")
    )
)]
pub async fn channel_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(user_name): Path<String>,
) -> AppResult<ApiResponse<ChannelProfile>> {
    let user_name = required_text(Some(&user_name), "Username is missing !")?;

    let profile = state
        .database
        .channel_profile(&user_name, current.id)
        .await?
        .ok_or_else(|| AppError::not_found("Channel does not exist!"))?;

    Ok(ApiResponse::ok(profile, "User channel fetched successfully!"))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/history",
    tag = "users",
    security(("Bearer" = [])),
    responses((status = 200, description = "Watched videos with owner cards"))
)]
pub async fn watch_history(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<ApiResponse<Vec<VideoWithOwner>>> {
    let history = state.database.watch_history(current.id).await?;
    Ok(ApiResponse::ok(history, "Watch history fetched successfully!"))
}
