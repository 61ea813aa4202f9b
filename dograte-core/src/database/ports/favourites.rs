use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::domain::Dog;
use crate::error::Result;

#[async_trait]
pub trait FavouriteRepository: Send + Sync {
    /// Creates the empty favourites document for a new user.
    async fn create_favourites(&self, user: ObjectId) -> Result<()>;
    async fn add_favourite(&self, user: ObjectId, dog: ObjectId) -> Result<()>;
    /// `None` when the user has no favourites document. Dogs that no longer
    /// exist are left out.
    async fn get_favourites(&self, user: ObjectId) -> Result<Option<Vec<Dog>>>;
    async fn remove_favourite(&self, user: ObjectId, dog: ObjectId) -> Result<()>;
    async fn delete_favourites(&self, user: ObjectId) -> Result<()>;
}
