//! MongoDB adapter for the repository ports.

mod dogs;
mod favourites;
mod users;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Bson, Document, doc},
    options::{ClientOptions, IndexOptions},
};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::ports::StoreHealth;
use crate::domain::{
    Dog, Favourite, UrlRating, User,
    dogs::{DOGS_COLLECTION, URL_RATINGS_COLLECTION},
    favourites::FAVOURITES_COLLECTION,
    users::USERS_COLLECTION,
};
use crate::error::{CoreError, Result};

const APP_NAME: &str = "dograte";

#[derive(Clone, Debug)]
pub struct MongoDatabase {
    database: Database,
}

impl MongoDatabase {
    /// Connects and pings; fails fast when the server is unreachable.
    pub async fn connect(uri: &str, database_name: &str) -> Result<Self> {
        let mut options = ClientOptions::parse(uri).await?;
        options.app_name = Some(APP_NAME.to_string());

        let client = Client::with_options(options)?;
        let database = client.database(database_name);
        database.run_command(doc! { "ping": 1 }).await?;

        info!(database = database_name, "connected to MongoDB");
        Ok(Self { database })
    }

    pub(crate) fn dogs(&self) -> Collection<Dog> {
        self.database.collection(DOGS_COLLECTION)
    }

    pub(crate) fn url_ratings(&self) -> Collection<UrlRating> {
        self.database.collection(URL_RATINGS_COLLECTION)
    }

    pub(crate) fn users(&self) -> Collection<User> {
        self.database.collection(USERS_COLLECTION)
    }

    pub(crate) fn favourites(&self) -> Collection<Favourite> {
        self.database.collection(FAVOURITES_COLLECTION)
    }

    /// Creates the unique indexes the repositories rely on for upserts and
    /// duplicate detection. Safe to run repeatedly.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let unique = || IndexOptions::builder().unique(true).build();
        let model = |keys: Document| {
            IndexModel::builder().keys(keys).options(unique()).build()
        };

        self.dogs().create_index(model(doc! { "breed": 1 })).await?;
        self.url_ratings().create_index(model(doc! { "url": 1 })).await?;
        self.users().create_index(model(doc! { "username": 1 })).await?;
        self.users().create_index(model(doc! { "email": 1 })).await?;
        self.favourites().create_index(model(doc! { "user": 1 })).await?;

        info!("MongoDB indexes in place");
        Ok(())
    }
}

#[async_trait]
impl StoreHealth for MongoDatabase {
    async fn ping(&self) -> Result<()> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "mongodb"
    }
}

/// Runs `pipeline` on `collection` and decodes every output document.
pub(crate) async fn run_pipeline<C, T>(
    collection: &Collection<C>,
    pipeline: Vec<Document>,
) -> Result<Vec<T>>
where
    C: Send + Sync,
    T: DeserializeOwned,
{
    debug!(
        collection = collection.name(),
        stages = pipeline.len(),
        "running aggregation"
    );
    let documents: Vec<Document> =
        collection.aggregate(pipeline).await?.try_collect().await?;
    documents
        .into_iter()
        .map(|document| {
            mongodb::bson::from_document(document).map_err(CoreError::from)
        })
        .collect()
}

/// Reads the number a trailing `$count` stage produced; no rows means zero.
pub(crate) fn read_count(rows: &[Document], field: &str) -> u64 {
    rows.first()
        .and_then(|row| match row.get(field) {
            Some(Bson::Int32(n)) => u64::try_from(*n).ok(),
            Some(Bson::Int64(n)) => u64::try_from(*n).ok(),
            Some(Bson::Double(n)) if *n >= 0.0 => Some(*n as u64),
            _ => None,
        })
        .unwrap_or(0)
}
