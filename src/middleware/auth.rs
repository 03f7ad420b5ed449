use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use bson::oid::ObjectId;
use tracing::{error, warn};

use crate::errors::AppError;
use crate::models::UserResponse;
use crate::utils::cookies::{read_cookie, ACCESS_TOKEN_COOKIE};
use crate::AppState;

/// The authenticated caller, inserted into request extensions by `verify_jwt`
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: ObjectId,
    pub user: UserResponse,
}

/// Access token from the `accessToken` cookie, else from `Authorization: Bearer`
fn access_token(request: &Request) -> Option<String> {
    read_cookie(request.headers(), ACCESS_TOKEN_COOKIE).or_else(|| {
        request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .and_then(|header| header.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    })
}

/// JWT authentication middleware
/// Rejects the request unless it carries a valid access token for an existing user
pub async fn verify_jwt(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = access_token(&request) else {
        warn!("Request without access token: {}", request.uri().path());
        return Err(AppError::unauthorized("Unauthorized request"));
    };

    let claims = state.tokens.verify_access_token(&token).map_err(|e| {
        warn!("Invalid JWT token: {:?}", e);
        AppError::unauthorized("Invalid access token")
    })?;

    let user_id = ObjectId::parse_str(&claims.id)
        .map_err(|_| AppError::unauthorized("Invalid access token"))?;

    let user = match state.database.find_user_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!("Token for non-existent user: {}", claims.id);
            return Err(AppError::unauthorized("Invalid access token"));
        }
        Err(e) => {
            error!("Database error during token validation: {:?}", e);
            return Err(e.into());
        }
    };

    request.extensions_mut().insert(CurrentUser {
        id: user.id,
        user: user.to_response(),
    });

    Ok(next.run(request).await)
}
