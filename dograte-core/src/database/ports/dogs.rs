use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::domain::{
    BreedFilter, Dog, RatedUrl, SingleUrlRating, SortedQuery, TableRow,
    UrlRating,
};
use crate::error::Result;

// Dog records, photo ratings and the read views built from both.
#[async_trait]
pub trait DogRepository: Send + Sync {
    /// Upserts by breed; new dogs start with one empty photo slot.
    async fn save_dog(&self, breed: &str) -> Result<Dog>;
    async fn find_dog_by_breed(&self, breed: &str) -> Result<Option<Dog>>;
    async fn find_dog_by_id(&self, id: ObjectId) -> Result<Option<Dog>>;
    /// Adds the sub-breed once and makes sure its photo slot exists.
    async fn save_sub_breed(&self, dog_id: ObjectId, sub_breed: &str) -> Result<Dog>;
    /// Set semantics: ids already in the slot are not duplicated.
    async fn save_url_ids_to_dog(
        &self,
        url_ids: &[ObjectId],
        dog_id: ObjectId,
        index: usize,
    ) -> Result<()>;

    // Photo ratings
    async fn find_url_rating(&self, url: &str) -> Result<Option<UrlRating>>;
    /// Upserts the photo and gives `user` an unrated entry if missing.
    async fn save_url_with_user(&self, url: &str, user: ObjectId) -> Result<UrlRating>;
    /// `numberOfRates` grows only when the entry goes from unrated to rated.
    async fn update_url_rating(
        &self,
        url: &str,
        user: ObjectId,
        rating: f64,
    ) -> Result<UrlRating>;
    /// Removes the user's entry; the counter drops only if it was rated.
    async fn delete_user_rating(&self, url_id: ObjectId, user: ObjectId) -> Result<UrlRating>;
    /// Inserts unknown urls and returns ids for every given url, in order.
    async fn save_many_urls(&self, urls: &[String]) -> Result<Vec<ObjectId>>;

    // Views
    async fn random_docs(&self, size: u32, user: Option<ObjectId>) -> Result<Vec<RatedUrl>>;
    async fn random_with_exclusions(
        &self,
        loaded_urls: &[String],
        size: u32,
        user: Option<ObjectId>,
    ) -> Result<Vec<RatedUrl>>;
    async fn all_sorted(
        &self,
        query: &SortedQuery,
        user: Option<ObjectId>,
    ) -> Result<Vec<RatedUrl>>;
    async fn user_sorted(
        &self,
        user: ObjectId,
        url_ids: &[ObjectId],
        query: &SortedQuery,
    ) -> Result<Vec<RatedUrl>>;
    async fn table(&self) -> Result<Vec<TableRow>>;
    async fn user_table(&self, url_ids: &[ObjectId]) -> Result<Vec<TableRow>>;
    async fn single_url(&self, url: &str, user: ObjectId) -> Result<Option<SingleUrlRating>>;
    async fn count_all(&self) -> Result<u64>;
    async fn filtered_count(&self, filter: &BreedFilter) -> Result<u64>;
    async fn filtered_count_user(
        &self,
        filter: &BreedFilter,
        url_ids: &[ObjectId],
    ) -> Result<u64>;
}
