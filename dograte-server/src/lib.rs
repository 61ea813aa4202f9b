//! # Dograte Server
//!
//! HTTP backend for rating dog photos.
//!
//! ## Overview
//!
//! - **Ratings**: signed-in users rate photos from the public dog image API;
//!   every photo keeps per-user ratings and a running count of raters.
//! - **Browsing**: random samples, sorted and filtered listings, counts and a
//!   per-breed table, each with a variant scoped to the caller's photos.
//! - **Favourites**: users keep a list of favourite breeds.
//! - **Auth**: short-lived access tokens in the `authorization` header backed by
//!   an HTTP-only refresh cookie that silently mints new access tokens.
//!
//! ## Architecture
//!
//! The server is built on Axum and uses:
//! - MongoDB for persistent storage (an in-memory store for tests and demos)
//! - dog.ceo for breed lists and photo urls
//! - Argon2 password hashes and HS256 JWTs

pub mod dogs;
pub mod favourites;
pub mod infra;
pub mod routes;
pub mod users;

pub use infra::app_state::AppState;

use axum::{
    Router,
    extract::State,
    http::{HeaderValue, Method, StatusCode, header},
    response::Json,
    routing::get,
};
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, warn};

/// Build the full application router: health probes, the versioned API, CORS
/// and request tracing.
pub fn create_app(state: AppState) -> Router {
    let cors_layer = cors_layer(&state);

    Router::new()
        .route("/ping", get(ping_handler))
        .route("/health", get(health_handler))
        .merge(routes::create_api_router(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer),
        )
        .with_state(state)
}

// Permissive in dev, allow-list otherwise
fn cors_layer(state: &AppState) -> CorsLayer {
    let config = state.config();
    if config.dev_mode {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "skipping unparsable CORS origin");
                None
            }
        })
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([header::AUTHORIZATION]);

    if origins.is_empty() {
        // Credentials cannot be combined with a wildcard origin
        return layer.allow_origin(AllowOrigin::any());
    }

    layer
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(config.cors.allow_credentials)
}

async fn ping_handler() -> Json<Value> {
    debug!("Ping endpoint called");
    Json(json!({
        "status": "ok",
        "message": "dograte is running",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let mut health_status = json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {}
    });

    let backend = state.repos.health.backend();
    match state.repos.health.ping().await {
        Ok(()) => {
            health_status["checks"]["database"] = json!({
                "status": "healthy",
                "backend": backend
            });
            Ok(Json(health_status))
        }
        Err(err) => {
            warn!(error = %err, "health check failed");
            health_status["status"] = json!("unhealthy");
            health_status["checks"]["database"] = json!({
                "status": "unhealthy",
                "backend": backend,
                "error": err.to_string()
            });
            Err((StatusCode::SERVICE_UNAVAILABLE, Json(health_status)))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use dograte_core::{
        database::{InMemoryStore, Repositories},
        providers::{DogImageSource, ProviderError},
    };
    use std::collections::BTreeMap;
    use tower::ServiceExt;

    use super::*;
    use crate::infra::config::Config;

    struct NoImages;

    #[async_trait]
    impl DogImageSource for NoImages {
        async fn list_all_breeds(&self) -> Result<BTreeMap<String, Vec<String>>, ProviderError> {
            Ok(BTreeMap::new())
        }
        async fn random_image(&self) -> Result<String, ProviderError> {
            Ok(String::new())
        }
        async fn random_breed_image(
            &self,
            _breed: &str,
            _sub_breed: Option<&str>,
        ) -> Result<String, ProviderError> {
            Ok(String::new())
        }
        async fn breed_images(
            &self,
            _breed: &str,
            _sub_breed: Option<&str>,
        ) -> Result<Vec<String>, ProviderError> {
            Ok(Vec::new())
        }
    }

    fn production_app() -> Router {
        let mut config = Config::for_dev("a-perfectly-long-and-random-production-secret");
        config.dev_mode = false;
        config.cors.allowed_origins = vec!["https://dogs.example".to_string()];
        let state = AppState::new(
            Repositories::in_memory(InMemoryStore::new()),
            Arc::new(NoImages),
            Arc::new(config),
        );
        create_app(state)
    }

    #[tokio::test]
    async fn cors_allows_listed_origins_with_credentials() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/v1/login")
            .header(header::ORIGIN, "https://dogs.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();

        let response = production_app().oneshot(request).await.unwrap();
        let headers = response.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://dogs.example"
        );
        assert_eq!(
            headers
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn cors_ignores_unlisted_origins() {
        let request = Request::builder()
            .uri("/ping")
            .header(header::ORIGIN, "https://elsewhere.example")
            .body(Body::empty())
            .unwrap();

        let response = production_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
    }
}
