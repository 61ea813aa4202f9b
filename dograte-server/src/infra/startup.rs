use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use dograte_core::{
    database::{InMemoryStore, MongoDatabase, Repositories},
    providers::{DogApiClient, DogImageSource},
};
use tracing::{info, warn};

use crate::infra::{app_state::AppState, config::Config};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    InMemory,
}

/// Work that runs once the store is open and before the listener binds.
#[async_trait]
pub trait StartupHooks: Send + Sync {
    async fn run(&self, state: &AppState, mongo: Option<&MongoDatabase>) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct ProdStartupHooks;

#[async_trait]
impl StartupHooks for ProdStartupHooks {
    async fn run(&self, state: &AppState, mongo: Option<&MongoDatabase>) -> Result<()> {
        if let Some(database) = mongo {
            database
                .ensure_indexes()
                .await
                .context("failed to create MongoDB indexes")?;
        }

        match state.repos.health.ping().await {
            Ok(()) => info!(backend = state.repos.health.backend(), "store reachable"),
            Err(err) => warn!(error = %err, "store ping failed after startup"),
        }
        Ok(())
    }
}

pub async fn connect_mongo(config: &Config) -> Result<MongoDatabase> {
    MongoDatabase::connect(&config.database.uri, &config.database.name)
        .await
        .with_context(|| format!("failed to connect to MongoDB database '{}'", config.database.name))
}

pub fn dog_api_client(config: &Config) -> Result<Arc<dyn DogImageSource>> {
    let client = DogApiClient::new(&config.dog_api.base_url)
        .with_context(|| format!("invalid DOG_API_BASE_URL '{}'", config.dog_api.base_url))?;
    Ok(Arc::new(client))
}

#[derive(Debug)]
pub struct ResourceBootstrap {
    pub state: AppState,
    pub mongo: Option<MongoDatabase>,
}

pub async fn wire_app_resources(
    config: Arc<Config>,
    backend: StoreBackend,
) -> Result<ResourceBootstrap> {
    let images = dog_api_client(&config)?;

    let (repos, mongo) = match backend {
        StoreBackend::Mongo => {
            let database = connect_mongo(&config).await?;
            (Repositories::mongo(database.clone()), Some(database))
        }
        StoreBackend::InMemory => {
            warn!("using the in-memory store; data is discarded on shutdown");
            (Repositories::in_memory(InMemoryStore::new()), None)
        }
    };

    let state = AppState::new(repos, images, config);
    Ok(ResourceBootstrap { state, mongo })
}
