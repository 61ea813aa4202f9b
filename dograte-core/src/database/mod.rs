pub mod memory;
pub mod mongo;
pub mod ports;

use std::fmt;
use std::sync::Arc;

pub use memory::InMemoryStore;
pub use mongo::MongoDatabase;
pub use ports::{DogRepository, FavouriteRepository, StoreHealth, UserRepository};

/// The repositories a running server needs, behind trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub dogs: Arc<dyn DogRepository>,
    pub users: Arc<dyn UserRepository>,
    pub favourites: Arc<dyn FavouriteRepository>,
    pub health: Arc<dyn StoreHealth>,
}

impl Repositories {
    pub fn mongo(database: MongoDatabase) -> Self {
        let database = Arc::new(database);
        Self {
            dogs: database.clone(),
            users: database.clone(),
            favourites: database.clone(),
            health: database,
        }
    }

    pub fn in_memory(store: InMemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            dogs: store.clone(),
            users: store.clone(),
            favourites: store.clone(),
            health: store,
        }
    }
}

impl fmt::Debug for Repositories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repositories")
            .field("backend", &self.health.backend())
            .finish_non_exhaustive()
    }
}
