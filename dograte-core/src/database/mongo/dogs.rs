use std::collections::HashMap;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{Bson, Document, doc, oid::ObjectId},
    options::ReturnDocument,
};
use tracing::{debug, warn};

use super::{MongoDatabase, read_count, run_pipeline};
use crate::aggregate::pipelines::{self, COUNT_FIELD};
use crate::database::ports::DogRepository;
use crate::domain::{
    BreedFilter, Dog, RatedUrl, SingleUrlRating, SortedQuery, TableRow,
    UrlRating,
    dogs::NewUrlRating,
    validation::{
        SUB_BREED_MAX_COUNT, ValidationError, validate_breed, validate_rating,
        validate_url,
    },
};
use crate::error::{CoreError, Result, is_duplicate_key};

fn empty_slots() -> Bson {
    Bson::Array(vec![Bson::Array(Vec::new())])
}

#[async_trait]
impl DogRepository for MongoDatabase {
    async fn save_dog(&self, breed: &str) -> Result<Dog> {
        validate_breed(breed)?;

        let upserted = self
            .dogs()
            .find_one_and_update(
                doc! { "breed": breed },
                doc! { "$setOnInsert": { "subBreed": [], "urlData": empty_slots() } },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await;

        match upserted {
            Ok(Some(dog)) => Ok(dog),
            Ok(None) => self
                .find_dog_by_breed(breed)
                .await?
                .ok_or_else(|| CoreError::NotFound(format!("dog {breed}"))),
            // Two concurrent upserts: the loser reads the winner's document.
            Err(err) if is_duplicate_key(&err) => self
                .find_dog_by_breed(breed)
                .await?
                .ok_or_else(|| CoreError::NotFound(format!("dog {breed}"))),
            Err(err) => Err(err.into()),
        }
    }

    async fn find_dog_by_breed(&self, breed: &str) -> Result<Option<Dog>> {
        Ok(self.dogs().find_one(doc! { "breed": breed }).await?)
    }

    async fn find_dog_by_id(&self, id: ObjectId) -> Result<Option<Dog>> {
        Ok(self.dogs().find_one(doc! { "_id": id }).await?)
    }

    async fn save_sub_breed(&self, dog_id: ObjectId, sub_breed: &str) -> Result<Dog> {
        validate_breed(sub_breed)?;

        let current = self
            .find_dog_by_id(dog_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("dog {dog_id}")))?;
        if !current.sub_breed.iter().any(|s| s == sub_breed)
            && current.sub_breed.len() >= SUB_BREED_MAX_COUNT
        {
            return Err(ValidationError::TooManySubBreeds {
                max: SUB_BREED_MAX_COUNT,
            }
            .into());
        }

        let dog = self
            .dogs()
            .find_one_and_update(
                doc! { "_id": dog_id },
                doc! { "$addToSet": { "subBreed": sub_breed } },
            )
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("dog {dog_id}")))?;

        let Some(index) = dog.slot_for(Some(sub_breed)) else {
            return Ok(dog);
        };
        if dog.url_data.len() > index {
            return Ok(dog);
        }

        // Only create the slot if it is still missing, so existing ids survive.
        let slot = format!("urlData.{index}");
        let mut missing_slot = doc! { "_id": dog_id };
        missing_slot.insert(slot.clone(), doc! { "$exists": false });
        let mut set_slot = Document::new();
        set_slot.insert(slot, Bson::Array(Vec::new()));
        self.dogs()
            .update_one(missing_slot, doc! { "$set": set_slot })
            .await?;

        self.find_dog_by_id(dog_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("dog {dog_id}")))
    }

    async fn save_url_ids_to_dog(
        &self,
        url_ids: &[ObjectId],
        dog_id: ObjectId,
        index: usize,
    ) -> Result<()> {
        let ids: Vec<Bson> = url_ids.iter().copied().map(Bson::ObjectId).collect();
        let mut add_ids = Document::new();
        add_ids.insert(format!("urlData.{index}"), doc! { "$each": ids });
        let result = self
            .dogs()
            .update_one(doc! { "_id": dog_id }, doc! { "$addToSet": add_ids })
            .await?;

        if result.matched_count == 0 {
            return Err(CoreError::NotFound(format!("dog {dog_id}")));
        }
        Ok(())
    }

    async fn find_url_rating(&self, url: &str) -> Result<Option<UrlRating>> {
        Ok(self.url_ratings().find_one(doc! { "url": url }).await?)
    }

    async fn save_url_with_user(&self, url: &str, user: ObjectId) -> Result<UrlRating> {
        validate_url(url)?;

        let saved = self
            .url_ratings()
            .find_one_and_update(
                doc! { "url": url, "userRatingData.userId": { "$ne": user } },
                doc! {
                    "$push": { "userRatingData": { "userId": user, "rating": Bson::Null } },
                    "$setOnInsert": { "numberOfRates": 0_i64 },
                },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await;

        match saved {
            Ok(Some(rating)) => Ok(rating),
            Ok(None) => self
                .find_url_rating(url)
                .await?
                .ok_or_else(|| CoreError::NotFound(format!("url {url}"))),
            // The url exists and already carries this user's entry.
            Err(err) if is_duplicate_key(&err) => self
                .find_url_rating(url)
                .await?
                .ok_or_else(|| CoreError::NotFound(format!("url {url}"))),
            Err(err) => Err(err.into()),
        }
    }

    async fn update_url_rating(
        &self,
        url: &str,
        user: ObjectId,
        rating: f64,
    ) -> Result<UrlRating> {
        validate_rating(rating)?;

        let first_rating = self
            .url_ratings()
            .update_one(
                doc! {
                    "url": url,
                    "userRatingData": { "$elemMatch": { "userId": user, "rating": Bson::Null } },
                },
                doc! { "$inc": { "numberOfRates": 1_i64 } },
            )
            .await?;
        debug!(url, first = first_rating.modified_count > 0, "recording rating");

        self.url_ratings()
            .find_one_and_update(
                doc! { "url": url, "userRatingData.userId": user },
                doc! { "$set": { "userRatingData.$.rating": rating } },
            )
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("no rating entry for {url}")))
    }

    async fn delete_user_rating(&self, url_id: ObjectId, user: ObjectId) -> Result<UrlRating> {
        let pull = doc! { "userRatingData": { "userId": user } };

        let rated = self
            .url_ratings()
            .update_one(
                doc! {
                    "_id": url_id,
                    "userRatingData": { "$elemMatch": { "userId": user, "rating": { "$ne": Bson::Null } } },
                },
                doc! { "$pull": pull.clone(), "$inc": { "numberOfRates": -1_i64 } },
            )
            .await?;

        if rated.modified_count == 0 {
            self.url_ratings()
                .update_one(doc! { "_id": url_id }, doc! { "$pull": pull })
                .await?;
        }

        self.url_ratings()
            .find_one(doc! { "_id": url_id })
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("url {url_id}")))
    }

    async fn save_many_urls(&self, urls: &[String]) -> Result<Vec<ObjectId>> {
        if urls.is_empty() {
            return Ok(Vec::new());
        }
        for url in urls {
            validate_url(url)?;
        }

        let documents: Vec<NewUrlRating> = urls.iter().map(NewUrlRating::new).collect();
        match self
            .url_ratings()
            .clone_with_type::<NewUrlRating>()
            .insert_many(documents)
            .ordered(false)
            .await
        {
            Ok(result) => debug!(inserted = result.inserted_ids.len(), "stored urls"),
            Err(err) if is_duplicate_key(&err) => {
                debug!("some urls already stored; resolving existing ids")
            }
            Err(err) => return Err(err.into()),
        }

        let stored: Vec<UrlRating> = self
            .url_ratings()
            .find(doc! { "url": { "$in": urls.to_vec() } })
            .await?
            .try_collect()
            .await?;
        let by_url: HashMap<&str, ObjectId> =
            stored.iter().map(|r| (r.url.as_str(), r.id)).collect();

        let mut ids = Vec::with_capacity(urls.len());
        for url in urls {
            match by_url.get(url.as_str()) {
                Some(id) if !ids.contains(id) => ids.push(*id),
                Some(_) => {}
                None => warn!(url, "url missing after insert"),
            }
        }
        Ok(ids)
    }

    async fn random_docs(&self, size: u32, user: Option<ObjectId>) -> Result<Vec<RatedUrl>> {
        run_pipeline(&self.dogs(), pipelines::random_docs(size, user)).await
    }

    async fn random_with_exclusions(
        &self,
        loaded_urls: &[String],
        size: u32,
        user: Option<ObjectId>,
    ) -> Result<Vec<RatedUrl>> {
        run_pipeline(
            &self.dogs(),
            pipelines::random_with_exclusions(loaded_urls, size, user),
        )
        .await
    }

    async fn all_sorted(
        &self,
        query: &SortedQuery,
        user: Option<ObjectId>,
    ) -> Result<Vec<RatedUrl>> {
        query.validate()?;
        run_pipeline(&self.dogs(), pipelines::all_sorted(query, user)).await
    }

    async fn user_sorted(
        &self,
        user: ObjectId,
        url_ids: &[ObjectId],
        query: &SortedQuery,
    ) -> Result<Vec<RatedUrl>> {
        query.validate()?;
        if url_ids.is_empty() {
            return Ok(Vec::new());
        }
        run_pipeline(&self.dogs(), pipelines::user_sorted(url_ids, user, query)).await
    }

    async fn table(&self) -> Result<Vec<TableRow>> {
        run_pipeline(&self.dogs(), pipelines::table()).await
    }

    async fn user_table(&self, url_ids: &[ObjectId]) -> Result<Vec<TableRow>> {
        if url_ids.is_empty() {
            return Ok(Vec::new());
        }
        run_pipeline(&self.dogs(), pipelines::user_table(url_ids)).await
    }

    async fn single_url(&self, url: &str, user: ObjectId) -> Result<Option<SingleUrlRating>> {
        let rows: Vec<SingleUrlRating> =
            run_pipeline(&self.url_ratings(), pipelines::single_url(url, user)).await?;
        Ok(rows.into_iter().next())
    }

    async fn count_all(&self) -> Result<u64> {
        Ok(self.url_ratings().count_documents(doc! {}).await?)
    }

    async fn filtered_count(&self, filter: &BreedFilter) -> Result<u64> {
        let rows: Vec<Document> =
            run_pipeline(&self.dogs(), pipelines::filtered_count(filter)).await?;
        Ok(read_count(&rows, COUNT_FIELD))
    }

    async fn filtered_count_user(
        &self,
        filter: &BreedFilter,
        url_ids: &[ObjectId],
    ) -> Result<u64> {
        let rows: Vec<Document> = run_pipeline(
            &self.dogs(),
            pipelines::filtered_count_user(filter, url_ids),
        )
        .await?;
        Ok(read_count(&rows, COUNT_FIELD))
    }
}
