use axum::{Extension, Json, extract::State};
use dograte_core::domain::{FavouriteDog, User, validation::validate_breed};
use serde::Deserialize;
use tracing::debug;

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};
use crate::users::handlers::MessageResponse;

#[derive(Debug, Clone, Deserialize)]
pub struct FavouriteRequest {
    pub breed: String,
}

pub async fn list_favourites(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<Vec<FavouriteDog>>> {
    let dogs = state
        .repos
        .favourites
        .get_favourites(user.id)
        .await?
        .ok_or_else(|| AppError::not_found("No favourites found!"))?;

    Ok(Json(dogs.iter().map(FavouriteDog::from).collect()))
}

/// Creates the dog record for the breed when it does not exist yet.
pub async fn add_favourite(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<FavouriteRequest>,
) -> AppResult<Json<MessageResponse>> {
    validate_breed(&request.breed)?;
    let dog = state.repos.dogs.save_dog(&request.breed).await?;
    state.repos.favourites.add_favourite(user.id, dog.id).await?;
    debug!(user = %user.id, breed = %dog.breed, "added favourite");

    Ok(Json(MessageResponse {
        message: "Item added to favorites",
    }))
}

pub async fn remove_favourite(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<FavouriteRequest>,
) -> AppResult<Json<MessageResponse>> {
    let dog = state
        .repos
        .dogs
        .find_dog_by_breed(&request.breed)
        .await?
        .ok_or_else(|| AppError::not_found("Dog not found"))?;
    state
        .repos
        .favourites
        .remove_favourite(user.id, dog.id)
        .await?;

    Ok(Json(MessageResponse {
        message: "Dog Deleted",
    }))
}
