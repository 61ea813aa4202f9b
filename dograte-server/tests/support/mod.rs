#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue, header};
use axum_test::{TestRequest, TestResponse, TestServer};
use dograte_core::{
    database::{InMemoryStore, Repositories},
    domain::{NewUser, Rank},
    providers::{DogImageSource, ProviderError},
};
use dograte_server::{
    AppState, create_app,
    infra::config::Config,
    routes::paths::v1,
    users::auth::password::hash_password,
};
use serde_json::{Value, json};

pub const JWT_SECRET: &str = "route-tests-secret-that-is-32-chars!";
pub const PASSWORD: &str = "hunter22";

/// Serves a fixed catalogue: `akita` plus `hound` with two sub-breeds.
#[derive(Debug, Default)]
pub struct StubImages;

#[async_trait]
impl DogImageSource for StubImages {
    async fn list_all_breeds(&self) -> Result<BTreeMap<String, Vec<String>>, ProviderError> {
        Ok(BTreeMap::from([
            ("akita".to_string(), Vec::new()),
            (
                "hound".to_string(),
                vec!["afghan".to_string(), "basset".to_string()],
            ),
        ]))
    }

    async fn random_image(&self) -> Result<String, ProviderError> {
        Ok(photo("akita", 0))
    }

    async fn random_breed_image(
        &self,
        breed: &str,
        sub_breed: Option<&str>,
    ) -> Result<String, ProviderError> {
        Ok(photo(&slot_name(breed, sub_breed), 0))
    }

    async fn breed_images(
        &self,
        breed: &str,
        sub_breed: Option<&str>,
    ) -> Result<Vec<String>, ProviderError> {
        let slot = slot_name(breed, sub_breed);
        Ok((0..3).map(|n| photo(&slot, n)).collect())
    }
}

fn slot_name(breed: &str, sub_breed: Option<&str>) -> String {
    match sub_breed {
        Some(sub) => format!("{breed}-{sub}"),
        None => breed.to_string(),
    }
}

pub fn photo(slot: &str, n: usize) -> String {
    format!("https://images.dog.ceo/breeds/{slot}/{n}.jpg")
}

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
}

pub fn test_app() -> TestApp {
    test_app_with(|_| {})
}

pub fn test_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let mut config = Config::for_dev(JWT_SECRET);
    configure(&mut config);
    let config = Arc::new(config);
    let state = AppState::new(
        Repositories::in_memory(InMemoryStore::new()),
        Arc::new(StubImages),
        config,
    );
    let server = TestServer::new(create_app(state.clone())).expect("test server");
    TestApp { server, state }
}

/// A signed-in caller: the access token plus the refresh cookie from login.
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
}

impl Session {
    pub fn bearer(&self) -> (HeaderName, HeaderValue) {
        let value = HeaderValue::from_str(&format!("Bearer {}", self.access_token))
            .expect("header value");
        (header::AUTHORIZATION, value)
    }

    pub fn cookie(&self) -> (HeaderName, HeaderValue) {
        let value = HeaderValue::from_str(&format!("refresh-token={}", self.refresh_token))
            .expect("header value");
        (header::COOKIE, value)
    }

    /// Sends the access token only.
    pub fn authorize(&self, request: TestRequest) -> TestRequest {
        let (name, value) = self.bearer();
        request.add_header(name, value)
    }

    /// Sends the refresh cookie only.
    pub fn with_cookie(&self, request: TestRequest) -> TestRequest {
        let (name, value) = self.cookie();
        request.add_header(name, value)
    }
}

impl TestApp {
    pub async fn register(&self, username: &str) -> TestResponse {
        self.server
            .post(v1::users::REGISTER)
            .json(&json!({
                "username": username,
                "email": format!("{username}@dogs.io"),
                "password": PASSWORD
            }))
            .await
    }

    pub async fn login(&self, username: &str) -> Session {
        let response = self
            .server
            .post(v1::LOGIN)
            .json(&json!({ "username": username, "password": PASSWORD }))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        Session {
            access_token: body["accessToken"]
                .as_str()
                .expect("access token")
                .to_string(),
            refresh_token: response.cookie("refresh-token").value().to_string(),
        }
    }

    pub async fn register_and_login(&self, username: &str) -> Session {
        self.register(username).await.assert_status_ok();
        self.login(username).await
    }

    /// Admins cannot be created over HTTP.
    pub async fn admin_session(&self, username: &str) -> Session {
        let password_hash = hash_password(PASSWORD).expect("hash");
        let admin = self
            .state
            .repos
            .users
            .create_user(NewUser {
                username: username.to_string(),
                email: format!("{username}@dogs.io"),
                password_hash,
                rank: Rank::Admin,
            })
            .await
            .expect("create admin");
        self.state
            .repos
            .favourites
            .create_favourites(admin.id)
            .await
            .expect("create favourites");
        self.login(username).await
    }
}

pub fn error_message(response: &TestResponse) -> String {
    let body: Value = response.json();
    body["error"]["message"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}
