use std::sync::Arc;

use axum::{Extension, Json, extract::State};
use dograte_core::{
    ObjectId,
    domain::{BreedFilter, RatedUrl, SingleUrlRating, SortedQuery, TableRow, User},
    domain::validation::validate_sample_size,
    seed::{BreedSeeder, SeedReport},
};
use tracing::info;

use super::requests::{
    BreedRequest, CountResponse, MoreSampleRequest, RandomImageResponse, RateDogRequest,
    SampleRequest, UrlRequest,
};
use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};

fn caller(user: Option<Extension<User>>) -> Option<ObjectId> {
    user.map(|Extension(user)| user.id)
}

async fn single_url_rating(
    state: &AppState,
    url: &str,
    user: ObjectId,
) -> AppResult<SingleUrlRating> {
    state
        .repos
        .dogs
        .single_url(url, user)
        .await?
        .ok_or_else(|| AppError::not_found("Url not found"))
}

/// Records the photo for the caller, applies the rating, and files the photo
/// under its breed slot when a breed is given.
pub async fn rate_dog(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<RateDogRequest>,
) -> AppResult<Json<SingleUrlRating>> {
    request.validate()?;
    let dogs = &state.repos.dogs;

    let photo = dogs.save_url_with_user(&request.url, user.id).await?;
    if let Some(rating) = request.rating {
        dogs.update_url_rating(&request.url, user.id, rating).await?;
    }
    state
        .repos
        .users
        .save_url_id_to_user(user.id, photo.id)
        .await?;

    if let Some(breed) = &request.breed {
        let mut dog = dogs.save_dog(breed).await?;
        if let Some(sub_breed) = &request.sub_breed {
            dog = dogs.save_sub_breed(dog.id, sub_breed).await?;
        }
        let index = dog.slot_for(request.sub_breed.as_deref()).unwrap_or(0);
        dogs.save_url_ids_to_dog(&[photo.id], dog.id, index).await?;
    }

    single_url_rating(&state, &request.url, user.id)
        .await
        .map(Json)
}

/// Also takes the photo off the caller's list, so it leaves the `/dogs/user`
/// views and counts.
pub async fn delete_rating(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<UrlRequest>,
) -> AppResult<Json<SingleUrlRating>> {
    let photo = state
        .repos
        .dogs
        .find_url_rating(&request.url)
        .await?
        .ok_or_else(|| AppError::not_found("Url not found"))?;

    state.repos.dogs.delete_user_rating(photo.id, user.id).await?;
    state
        .repos
        .users
        .remove_url_id_from_user(user.id, photo.id)
        .await?;

    single_url_rating(&state, &request.url, user.id)
        .await
        .map(Json)
}

pub async fn url_rating(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<UrlRequest>,
) -> AppResult<Json<SingleUrlRating>> {
    single_url_rating(&state, &request.url, user.id)
        .await
        .map(Json)
}

pub async fn random_sample(
    State(state): State<AppState>,
    user: Option<Extension<User>>,
    Json(request): Json<SampleRequest>,
) -> AppResult<Json<Vec<RatedUrl>>> {
    request.validate()?;
    let docs = state
        .repos
        .dogs
        .random_docs(request.sample_size, caller(user))
        .await?;
    Ok(Json(docs))
}

pub async fn random_sample_more(
    State(state): State<AppState>,
    user: Option<Extension<User>>,
    Json(request): Json<MoreSampleRequest>,
) -> AppResult<Json<Vec<RatedUrl>>> {
    validate_sample_size(request.sample_size)?;
    let docs = state
        .repos
        .dogs
        .random_with_exclusions(&request.loaded_urls, request.sample_size, caller(user))
        .await?;
    Ok(Json(docs))
}

pub async fn all_sorted(
    State(state): State<AppState>,
    user: Option<Extension<User>>,
    Json(query): Json<SortedQuery>,
) -> AppResult<Json<Vec<RatedUrl>>> {
    query.validate()?;
    let docs = state.repos.dogs.all_sorted(&query, caller(user)).await?;
    Ok(Json(docs))
}

pub async fn user_sorted(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(query): Json<SortedQuery>,
) -> AppResult<Json<Vec<RatedUrl>>> {
    query.validate()?;
    let url_ids = state.repos.users.get_user_urls(user.id).await?;
    let docs = state
        .repos
        .dogs
        .user_sorted(user.id, &url_ids, &query)
        .await?;
    Ok(Json(docs))
}

pub async fn max_count(State(state): State<AppState>) -> AppResult<Json<CountResponse>> {
    let count = state.repos.dogs.count_all().await?;
    Ok(Json(CountResponse { count }))
}

pub async fn user_max_count(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<CountResponse>> {
    let url_ids = state.repos.users.get_user_urls(user.id).await?;
    Ok(Json(CountResponse {
        count: url_ids.len() as u64,
    }))
}

pub async fn filtered_max_count(
    State(state): State<AppState>,
    Json(filter): Json<BreedFilter>,
) -> AppResult<Json<CountResponse>> {
    let count = state.repos.dogs.filtered_count(&filter).await?;
    Ok(Json(CountResponse { count }))
}

pub async fn user_filtered_max_count(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(filter): Json<BreedFilter>,
) -> AppResult<Json<CountResponse>> {
    let url_ids = state.repos.users.get_user_urls(user.id).await?;
    let count = state
        .repos
        .dogs
        .filtered_count_user(&filter, &url_ids)
        .await?;
    Ok(Json(CountResponse { count }))
}

pub async fn table(State(state): State<AppState>) -> AppResult<Json<Vec<TableRow>>> {
    Ok(Json(state.repos.dogs.table().await?))
}

pub async fn user_table(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<Vec<TableRow>>> {
    let url_ids = state.repos.users.get_user_urls(user.id).await?;
    Ok(Json(state.repos.dogs.user_table(&url_ids).await?))
}

pub async fn random_image(State(state): State<AppState>) -> AppResult<Json<RandomImageResponse>> {
    let url = state.images.random_image().await?;
    Ok(Json(RandomImageResponse {
        message: url,
        status: "success",
    }))
}

pub async fn breed_image(
    State(state): State<AppState>,
    Json(request): Json<BreedRequest>,
) -> AppResult<Json<String>> {
    request.validate()?;
    let sub_breed = request.sub_breed.as_deref();
    if !state.images.is_breed(&request.breed, sub_breed).await? {
        return Err(AppError::not_found("Bad Breed"));
    }
    let url = state
        .images
        .random_breed_image(&request.breed, sub_breed)
        .await?;
    Ok(Json(url))
}

pub async fn store_all_breeds(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
) -> AppResult<Json<SeedReport>> {
    info!(admin = %admin.id, "seeding breeds from the dog image api");
    let seeder = BreedSeeder::new(Arc::clone(&state.repos.dogs), Arc::clone(&state.images));
    let report = seeder.store_all_breeds().await?;
    Ok(Json(report))
}
