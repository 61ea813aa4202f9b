use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::domain::{NewUser, User};
use crate::error::Result;

// Accounts, their touched photos and the stored refresh token
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `CoreError::Conflict` when username or email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User>;
    async fn get_user_by_id(&self, id: ObjectId) -> Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn list_users(&self) -> Result<Vec<User>>;
    /// Returns whether a user was removed.
    async fn delete_user(&self, id: ObjectId) -> Result<bool>;

    async fn save_url_id_to_user(&self, user: ObjectId, url_id: ObjectId) -> Result<()>;
    /// No-op when the user or the id is unknown.
    async fn remove_url_id_from_user(&self, user: ObjectId, url_id: ObjectId) -> Result<()>;
    async fn get_user_urls(&self, user: ObjectId) -> Result<Vec<ObjectId>>;

    async fn save_token(&self, user: ObjectId, token: &str) -> Result<()>;
    async fn delete_token(&self, user: ObjectId) -> Result<()>;
}
