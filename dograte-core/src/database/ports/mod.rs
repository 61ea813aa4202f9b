//! Repository ports. Adapters live in `database::mongo` and
//! `database::memory`.

pub mod dogs;
pub mod favourites;
pub mod users;

use async_trait::async_trait;

use crate::error::Result;

pub use dogs::DogRepository;
pub use favourites::FavouriteRepository;
pub use users::UserRepository;

/// Liveness probe for the backing store.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<()>;
    /// Short backend label for health output.
    fn backend(&self) -> &'static str;
}
