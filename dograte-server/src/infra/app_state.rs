use std::{fmt, sync::Arc};

use dograte_core::{database::Repositories, providers::DogImageSource};

use crate::infra::config::Config;
use crate::users::auth::jwt::TokenService;

#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub images: Arc<dyn DogImageSource>,
    pub tokens: Arc<TokenService>,
    pub config: Arc<Config>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("repos", &self.repos)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(repos: Repositories, images: Arc<dyn DogImageSource>, config: Arc<Config>) -> Self {
        let tokens = Arc::new(TokenService::from_config(&config.auth));
        Self {
            repos,
            images,
            tokens,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn secure_cookies(&self) -> bool {
        self.config.auth.secure_cookies
    }
}
