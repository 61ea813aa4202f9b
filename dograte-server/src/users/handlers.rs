use axum::{Extension, Json, extract::State};
use axum_extra::extract::cookie::CookieJar;
use dograte_core::{
    CoreError, ObjectId,
    domain::{NewUser, Rank, RegisterRequest, User, UserSummary, ValidationError},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::auth::{
    cookies::{REFRESH_COOKIE, clear_refresh_cookie, refresh_cookie},
    jwt::TokenError,
    password::{hash_password, verify_password},
};
use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};

const BAD_CREDENTIALS: &str = "Username or Password is incorrect";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: &'static str,
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: UserSummary,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserRequest {
    pub user_id: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<Json<RegisterResponse>> {
    let request = request.validate()?;

    let users = &state.repos.users;
    if users.get_user_by_username(&request.username).await?.is_some() {
        return Err(AppError::bad_request("That Username is taken"));
    }
    if users.get_user_by_email(&request.email).await?.is_some() {
        return Err(AppError::bad_request("That Email is taken"));
    }

    let password_hash = hash_password(&request.password)?;
    let user = users
        .create_user(NewUser {
            username: request.username,
            email: request.email,
            password_hash,
            rank: Rank::User,
        })
        .await
        .map_err(|err| match err {
            // Lost a race with a concurrent registration
            CoreError::Conflict(_) => AppError::bad_request("That Username is taken"),
            other => other.into(),
        })?;

    state.repos.favourites.create_favourites(user.id).await?;
    info!(user = %user.id, "registered new user");

    Ok(Json(RegisterResponse {
        message: "New User added",
        user: user.summary(),
    }))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<LoginResponse>)> {
    let user = state
        .repos
        .users
        .get_user_by_username(&request.username)
        .await?
        .ok_or_else(|| AppError::unauthorized(BAD_CREDENTIALS))?;

    if !verify_password(&request.password, &user.password) {
        return Err(AppError::unauthorized(BAD_CREDENTIALS));
    }

    let refresh = state
        .tokens
        .refresh_token(user.id)
        .map_err(|err| AppError::internal(format!("Failed to issue refresh token: {err}")))?;
    let access = state
        .tokens
        .access_token(user.id)
        .map_err(|err| AppError::internal(format!("Failed to issue access token: {err}")))?;

    state.repos.users.save_token(user.id, &refresh).await?;
    info!(user = %user.id, "user logged in");

    let jar = jar.add(refresh_cookie(refresh, state.secure_cookies()));
    Ok((
        jar,
        Json(LoginResponse {
            message: "You have logged in",
            access_token: access,
        }),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<MessageResponse>)> {
    let Some(cookie) = jar.get(REFRESH_COOKIE) else {
        return Err(AppError::unauthorized("Invalid jwt"));
    };

    let subject = match state.tokens.decode(cookie.value()) {
        Ok(claims) | Err(TokenError::Expired(claims)) => claims.user_id().ok(),
        Err(_) => None,
    };
    if let Some(user_id) = subject
        && let Err(err) = state.repos.users.delete_token(user_id).await
    {
        warn!(error = %err, "failed to clear stored refresh token on logout");
    }

    Ok((
        clear_refresh_cookie(jar),
        Json(MessageResponse {
            message: "You have logged out",
        }),
    ))
}

pub async fn current_user(Extension(user): Extension<User>) -> Json<UserSummary> {
    Json(user.summary())
}

pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserSummary>>> {
    let users = state.repos.users.list_users().await?;
    Ok(Json(users.iter().map(User::summary).collect()))
}

/// Removes the user's ratings from every photo they touched, then the user.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Json(request): Json<DeleteUserRequest>,
) -> AppResult<Json<MessageResponse>> {
    let user_id = ObjectId::parse_str(&request.user_id)
        .map_err(|_| ValidationError::InvalidId(request.user_id.clone()))?;

    let user = state
        .repos
        .users
        .get_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    for url_id in &user.urls {
        match state.repos.dogs.delete_user_rating(*url_id, user.id).await {
            Ok(_) | Err(CoreError::NotFound(_)) => {}
            Err(err) => return Err(err.into()),
        }
    }
    state.repos.favourites.delete_favourites(user.id).await?;
    state.repos.users.delete_user(user.id).await?;

    info!(admin = %admin.id, user = %user.id, ratings = user.urls.len(), "deleted user");
    Ok(Json(MessageResponse {
        message: "User deleted",
    }))
}
