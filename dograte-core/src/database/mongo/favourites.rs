use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};

use super::MongoDatabase;
use crate::database::ports::FavouriteRepository;
use crate::domain::{Dog, Favourite};
use crate::error::{Result, is_duplicate_key};

#[async_trait]
impl FavouriteRepository for MongoDatabase {
    async fn create_favourites(&self, user: ObjectId) -> Result<()> {
        match self.favourites().insert_one(Favourite::new(user)).await {
            Ok(_) => Ok(()),
            // Already present; creation is idempotent.
            Err(err) if is_duplicate_key(&err) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn add_favourite(&self, user: ObjectId, dog: ObjectId) -> Result<()> {
        self.favourites()
            .update_one(
                doc! { "user": user },
                doc! { "$addToSet": { "dogs": dog } },
            )
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn get_favourites(&self, user: ObjectId) -> Result<Option<Vec<Dog>>> {
        let Some(favourite) = self.favourites().find_one(doc! { "user": user }).await? else {
            return Ok(None);
        };
        if favourite.dogs.is_empty() {
            return Ok(Some(Vec::new()));
        }

        let found: Vec<Dog> = self
            .dogs()
            .find(doc! { "_id": { "$in": favourite.dogs.clone() } })
            .await?
            .try_collect()
            .await?;

        // Keep the order the user added them in.
        let ordered = favourite
            .dogs
            .iter()
            .filter_map(|id| found.iter().find(|dog| dog.id == *id).cloned())
            .collect();
        Ok(Some(ordered))
    }

    async fn remove_favourite(&self, user: ObjectId, dog: ObjectId) -> Result<()> {
        self.favourites()
            .update_one(doc! { "user": user }, doc! { "$pull": { "dogs": dog } })
            .await?;
        Ok(())
    }

    async fn delete_favourites(&self, user: ObjectId) -> Result<()> {
        self.favourites().delete_one(doc! { "user": user }).await?;
        Ok(())
    }
}
