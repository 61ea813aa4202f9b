use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use super::paths::{relative, v1};
use crate::{
    AppState,
    dogs::handlers as dogs,
    favourites::handlers as favourites,
    users::{
        auth::{optional_access, require_access, require_admin},
        handlers as users,
    },
};

/// Create all v1 API routes
pub fn create_v1_router(state: AppState) -> Router<AppState> {
    Router::new()
        // Public authentication endpoints
        .route(relative(v1::users::REGISTER), post(users::register))
        .route(relative(v1::LOGIN), post(users::login))
        .route(relative(v1::LOGOUT), get(users::logout))
        // Public dog views
        .route(relative(v1::dogs::MAX_COUNT), get(dogs::max_count))
        .route(
            relative(v1::dogs::FILTERED_MAX_COUNT),
            post(dogs::filtered_max_count),
        )
        .route(relative(v1::dogs::TABLE), get(dogs::table))
        .merge(create_browse_routes(state.clone()))
        .merge(create_protected_routes(state.clone()))
        .merge(create_admin_routes(state))
}

/// Browse endpoints overlay `myRating` when the caller is signed in
fn create_browse_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(relative(v1::dogs::ALL), post(dogs::random_sample))
        .route(relative(v1::dogs::ALL_MORE), post(dogs::random_sample_more))
        .route(relative(v1::dogs::ALL_SORTED), post(dogs::all_sorted))
        .route_layer(middleware::from_fn_with_state(state, optional_access))
}

/// Create protected routes that require authentication
fn create_protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(relative(v1::users::CURRENT), get(users::current_user))
        // Ratings
        .route(relative(v1::dogs::RATE), post(dogs::rate_dog))
        .route(relative(v1::dogs::RATING), delete(dogs::delete_rating))
        .route(relative(v1::dogs::URL), post(dogs::url_rating))
        // The caller's photos
        .route(relative(v1::dogs::user::SORTED), post(dogs::user_sorted))
        .route(relative(v1::dogs::user::MAX_COUNT), get(dogs::user_max_count))
        .route(
            relative(v1::dogs::user::FILTERED_MAX_COUNT),
            post(dogs::user_filtered_max_count),
        )
        .route(relative(v1::dogs::user::TABLE), get(dogs::user_table))
        // Image provider
        .route(relative(v1::dogs::RANDOM), get(dogs::random_image))
        .route(relative(v1::dogs::BREED), post(dogs::breed_image))
        // Favourites
        .route(
            relative(v1::dogs::FAVOURITES),
            get(favourites::list_favourites)
                .post(favourites::add_favourite)
                .delete(favourites::remove_favourite),
        )
        .route_layer(middleware::from_fn_with_state(state, require_access))
}

/// Create admin routes; `require_access` runs first and attaches the user
fn create_admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(relative(v1::users::admin::ALL), get(users::list_users))
        .route(
            relative(v1::users::admin::DELETE_USER),
            post(users::delete_user),
        )
        .route(
            relative(v1::dogs::admin::STORE_ALL_BREEDS),
            post(dogs::store_all_breeds),
        )
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state, require_access))
}
