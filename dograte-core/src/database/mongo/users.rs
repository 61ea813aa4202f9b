use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use tracing::warn;

use super::MongoDatabase;
use crate::database::ports::UserRepository;
use crate::domain::{NewUser, User};
use crate::error::{CoreError, Result, is_duplicate_key};

#[async_trait]
impl UserRepository for MongoDatabase {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let user = user.into_user();
        match self.users().insert_one(&user).await {
            Ok(_) => Ok(user),
            Err(err) if is_duplicate_key(&err) => {
                warn!(username = %user.username, "duplicate user insert rejected");
                Err(CoreError::Conflict(
                    "username or email already registered".to_string(),
                ))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn get_user_by_id(&self, id: ObjectId) -> Result<Option<User>> {
        Ok(self.users().find_one(doc! { "_id": id }).await?)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.users().find_one(doc! { "username": username }).await?)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users().find_one(doc! { "email": email }).await?)
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let users = self
            .users()
            .find(doc! {})
            .sort(doc! { "username": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(users)
    }

    async fn delete_user(&self, id: ObjectId) -> Result<bool> {
        let result = self.users().delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn save_url_id_to_user(&self, user: ObjectId, url_id: ObjectId) -> Result<()> {
        let result = self
            .users()
            .update_one(doc! { "_id": user }, doc! { "$addToSet": { "urls": url_id } })
            .await?;
        if result.matched_count == 0 {
            return Err(CoreError::NotFound(format!("user {user}")));
        }
        Ok(())
    }

    async fn remove_url_id_from_user(&self, user: ObjectId, url_id: ObjectId) -> Result<()> {
        self.users()
            .update_one(doc! { "_id": user }, doc! { "$pull": { "urls": url_id } })
            .await?;
        Ok(())
    }

    async fn get_user_urls(&self, user: ObjectId) -> Result<Vec<ObjectId>> {
        self.get_user_by_id(user)
            .await?
            .map(|u| u.urls)
            .ok_or_else(|| CoreError::NotFound(format!("user {user}")))
    }

    async fn save_token(&self, user: ObjectId, token: &str) -> Result<()> {
        let result = self
            .users()
            .update_one(doc! { "_id": user }, doc! { "$set": { "token": token } })
            .await?;
        if result.matched_count == 0 {
            return Err(CoreError::NotFound(format!("user {user}")));
        }
        Ok(())
    }

    async fn delete_token(&self, user: ObjectId) -> Result<()> {
        self.users()
            .update_one(doc! { "_id": user }, doc! { "$unset": { "token": "" } })
            .await?;
        Ok(())
    }
}
