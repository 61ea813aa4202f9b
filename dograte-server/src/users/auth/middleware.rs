use axum::{
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use dograte_core::domain::User;
use tracing::{debug, warn};

use super::{
    cookies::{REFRESH_COOKIE, clear_refresh_cookie},
    jwt::{TokenError, TokenKind},
};
use crate::infra::{app_state::AppState, errors::AppError};

pub const LOGIN_REQUIRED: &str = "Unauthorized, please log in";

/// Accepts a valid access token, otherwise falls back to the refresh cookie
/// and hands out a fresh access token in the `authorization` response header.
pub async fn require_access(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_access_token(&request)
        && let Some(user) = user_from_access_token(&state, &token).await
    {
        request.extensions_mut().insert(user);
        return next.run(request).await;
    }

    let Some(cookie) = jar.get(REFRESH_COOKIE) else {
        return AppError::unauthorized(LOGIN_REQUIRED).into_response();
    };
    let refresh = cookie.value().to_string();

    let claims = match state.tokens.decode(&refresh) {
        Ok(claims) if claims.kind == TokenKind::Refresh => claims,
        Ok(_) | Err(TokenError::Invalid) | Err(TokenError::Signing(_)) => {
            return (
                clear_refresh_cookie(jar),
                AppError::bad_request("Bad Token"),
            )
                .into_response();
        }
        Err(TokenError::Expired(claims)) => {
            if let Ok(user_id) = claims.user_id()
                && let Err(err) = state.repos.users.delete_token(user_id).await
            {
                warn!(error = %err, "failed to drop expired refresh token");
            }
            return AppError::unauthorized(LOGIN_REQUIRED).into_response();
        }
    };

    let Ok(user_id) = claims.user_id() else {
        return (
            clear_refresh_cookie(jar),
            AppError::bad_request("Bad Token"),
        )
            .into_response();
    };

    let user = match state.repos.users.get_user_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return AppError::unauthorized("No user found, please register").into_response();
        }
        Err(err) => return AppError::from(err).into_response(),
    };

    if user.token.as_deref() != Some(refresh.as_str()) {
        debug!(user = %user.id, "refresh cookie does not match the stored token");
        return AppError::unauthorized("Unauthorized").into_response();
    }

    let access = match state.tokens.access_token(user.id) {
        Ok(token) => token,
        Err(err) => {
            return AppError::internal(format!("Failed to issue access token: {err}"))
                .into_response();
        }
    };

    request.extensions_mut().insert(user);
    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&access) {
        response.headers_mut().insert(header::AUTHORIZATION, value);
    }
    response
}

/// Attaches the caller when a valid access token is present; never rejects.
pub async fn optional_access(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_access_token(&request)
        && let Some(user) = user_from_access_token(&state, &token).await
    {
        request.extensions_mut().insert(user);
    }

    next.run(request).await
}

/// Must run after [`require_access`].
pub async fn require_admin(request: Request, next: Next) -> Response {
    match request.extensions().get::<User>() {
        Some(user) if user.rank.is_admin() => next.run(request).await,
        Some(_) => AppError::forbidden("Admin access required").into_response(),
        None => AppError::unauthorized(LOGIN_REQUIRED).into_response(),
    }
}

/// `Bearer <token>` or the bare token.
fn extract_access_token(request: &Request) -> Option<String> {
    let value = request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .trim();
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!token.is_empty()).then(|| token.to_string())
}

async fn user_from_access_token(state: &AppState, token: &str) -> Option<User> {
    let user_id = state.tokens.validate_access(token).ok()?;
    match state.repos.users.get_user_by_id(user_id).await {
        Ok(user) => user,
        Err(err) => {
            warn!(error = %err, "user lookup for access token failed");
            None
        }
    }
}
