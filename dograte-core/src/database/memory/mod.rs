//! In-memory adapter used by tests and `--in-memory` development runs.

mod views;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::Mutex;

use super::ports::{DogRepository, FavouriteRepository, StoreHealth, UserRepository};
use crate::domain::{
    BreedFilter, Dog, Favourite, NewUser, RatedUrl, SingleUrlRating,
    SortedQuery, TableRow, UrlRating, User, UserRating,
    validation::{
        SUB_BREED_MAX_COUNT, ValidationError, validate_breed, validate_rating,
        validate_url,
    },
};
use crate::error::{CoreError, Result};

#[derive(Debug, Default)]
struct MemoryState {
    /// Insertion order, like a collection scan.
    dogs: Vec<Dog>,
    url_ratings: HashMap<ObjectId, UrlRating>,
    url_index: HashMap<String, ObjectId>,
    users: Vec<User>,
    favourites: HashMap<ObjectId, Favourite>,
}

impl MemoryState {
    fn dog_mut(&mut self, id: ObjectId) -> Result<&mut Dog> {
        self.dogs
            .iter_mut()
            .find(|dog| dog.id == id)
            .ok_or_else(|| CoreError::NotFound(format!("dog {id}")))
    }

    fn rating_by_url_mut(&mut self, url: &str) -> Option<&mut UrlRating> {
        let id = self.url_index.get(url)?;
        self.url_ratings.get_mut(id)
    }

    fn user_mut(&mut self, id: ObjectId) -> Result<&mut User> {
        self.users
            .iter_mut()
            .find(|user| user.id == id)
            .ok_or_else(|| CoreError::NotFound(format!("user {id}")))
    }

    fn insert_url(&mut self, url: &str) -> ObjectId {
        if let Some(id) = self.url_index.get(url) {
            return *id;
        }
        let rating = UrlRating::new(url);
        let id = rating.id;
        self.url_index.insert(url.to_string(), id);
        self.url_ratings.insert(id, rating);
        id
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreHealth for InMemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[async_trait]
impl DogRepository for InMemoryStore {
    async fn save_dog(&self, breed: &str) -> Result<Dog> {
        validate_breed(breed)?;
        let mut state = self.state.lock().await;
        if let Some(dog) = state.dogs.iter().find(|dog| dog.breed == breed) {
            return Ok(dog.clone());
        }
        let dog = Dog::new(breed);
        state.dogs.push(dog.clone());
        Ok(dog)
    }

    async fn find_dog_by_breed(&self, breed: &str) -> Result<Option<Dog>> {
        let state = self.state.lock().await;
        Ok(state.dogs.iter().find(|dog| dog.breed == breed).cloned())
    }

    async fn find_dog_by_id(&self, id: ObjectId) -> Result<Option<Dog>> {
        let state = self.state.lock().await;
        Ok(state.dogs.iter().find(|dog| dog.id == id).cloned())
    }

    async fn save_sub_breed(&self, dog_id: ObjectId, sub_breed: &str) -> Result<Dog> {
        validate_breed(sub_breed)?;
        let mut state = self.state.lock().await;
        let dog = state.dog_mut(dog_id)?;

        let index = match dog.slot_for(Some(sub_breed)) {
            Some(index) => index,
            None => {
                if dog.sub_breed.len() >= SUB_BREED_MAX_COUNT {
                    return Err(ValidationError::TooManySubBreeds {
                        max: SUB_BREED_MAX_COUNT,
                    }
                    .into());
                }
                dog.sub_breed.push(sub_breed.to_string());
                dog.sub_breed.len() - 1
            }
        };
        while dog.url_data.len() <= index {
            dog.url_data.push(Vec::new());
        }
        Ok(dog.clone())
    }

    async fn save_url_ids_to_dog(
        &self,
        url_ids: &[ObjectId],
        dog_id: ObjectId,
        index: usize,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        let dog = state.dog_mut(dog_id)?;
        while dog.url_data.len() <= index {
            dog.url_data.push(Vec::new());
        }
        let slot = &mut dog.url_data[index];
        for id in url_ids {
            if !slot.contains(id) {
                slot.push(*id);
            }
        }
        Ok(())
    }

    async fn find_url_rating(&self, url: &str) -> Result<Option<UrlRating>> {
        let state = self.state.lock().await;
        Ok(state
            .url_index
            .get(url)
            .and_then(|id| state.url_ratings.get(id))
            .cloned())
    }

    async fn save_url_with_user(&self, url: &str, user: ObjectId) -> Result<UrlRating> {
        validate_url(url)?;
        let mut state = self.state.lock().await;
        let id = state.insert_url(url);
        let rating = state
            .url_ratings
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(format!("url {url}")))?;
        if rating.entry_for(user).is_none() {
            rating.user_rating_data.push(UserRating {
                user_id: user,
                rating: None,
            });
        }
        Ok(rating.clone())
    }

    async fn update_url_rating(
        &self,
        url: &str,
        user: ObjectId,
        rating: f64,
    ) -> Result<UrlRating> {
        validate_rating(rating)?;
        let mut state = self.state.lock().await;
        let photo = state
            .rating_by_url_mut(url)
            .ok_or_else(|| CoreError::NotFound(format!("no rating entry for {url}")))?;
        let entry = photo
            .user_rating_data
            .iter_mut()
            .find(|entry| entry.user_id == user)
            .ok_or_else(|| CoreError::NotFound(format!("no rating entry for {url}")))?;

        let first_rating = entry.rating.is_none();
        entry.rating = Some(rating);
        if first_rating {
            photo.number_of_rates += 1;
        }
        Ok(photo.clone())
    }

    async fn delete_user_rating(&self, url_id: ObjectId, user: ObjectId) -> Result<UrlRating> {
        let mut state = self.state.lock().await;
        let photo = state
            .url_ratings
            .get_mut(&url_id)
            .ok_or_else(|| CoreError::NotFound(format!("url {url_id}")))?;

        let was_rated = photo.entry_for(user).is_some_and(|e| e.rating.is_some());
        photo.user_rating_data.retain(|entry| entry.user_id != user);
        if was_rated {
            photo.number_of_rates -= 1;
        }
        Ok(photo.clone())
    }

    async fn save_many_urls(&self, urls: &[String]) -> Result<Vec<ObjectId>> {
        for url in urls {
            validate_url(url)?;
        }
        let mut state = self.state.lock().await;
        let mut ids = Vec::with_capacity(urls.len());
        for url in urls {
            let id = state.insert_url(url);
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    async fn random_docs(&self, size: u32, user: Option<ObjectId>) -> Result<Vec<RatedUrl>> {
        let state = self.state.lock().await;
        let rows = views::join_photos(&state.dogs, &state.url_ratings, None);
        Ok(views::sample(&rows, size, user))
    }

    async fn random_with_exclusions(
        &self,
        loaded_urls: &[String],
        size: u32,
        user: Option<ObjectId>,
    ) -> Result<Vec<RatedUrl>> {
        let excluded: HashSet<&str> = loaded_urls.iter().map(String::as_str).collect();
        let state = self.state.lock().await;
        let rows: Vec<_> = views::join_photos(&state.dogs, &state.url_ratings, None)
            .into_iter()
            .filter(|row| !excluded.contains(row.rating.url.as_str()))
            .collect();
        Ok(views::sample(&rows, size, user))
    }

    async fn all_sorted(
        &self,
        query: &SortedQuery,
        user: Option<ObjectId>,
    ) -> Result<Vec<RatedUrl>> {
        query.validate()?;
        let state = self.state.lock().await;
        let rows = views::filter_breed(
            views::join_photos(&state.dogs, &state.url_ratings, None),
            query.filtered_breed.as_ref(),
        );
        let formatted = rows.iter().map(|row| row.format(user)).collect();
        Ok(views::sort_and_page(formatted, query, true))
    }

    async fn user_sorted(
        &self,
        user: ObjectId,
        url_ids: &[ObjectId],
        query: &SortedQuery,
    ) -> Result<Vec<RatedUrl>> {
        query.validate()?;
        let only: HashSet<ObjectId> = url_ids.iter().copied().collect();
        let state = self.state.lock().await;
        let rows = views::filter_breed(
            views::join_photos(&state.dogs, &state.url_ratings, Some(&only)),
            query.filtered_breed.as_ref(),
        );
        let formatted = rows.iter().map(|row| row.format(Some(user))).collect();
        Ok(views::sort_and_page(formatted, query, false))
    }

    async fn table(&self) -> Result<Vec<TableRow>> {
        let state = self.state.lock().await;
        let rows = views::join_photos(&state.dogs, &state.url_ratings, None);
        Ok(views::table_rows(&rows))
    }

    async fn user_table(&self, url_ids: &[ObjectId]) -> Result<Vec<TableRow>> {
        let only: HashSet<ObjectId> = url_ids.iter().copied().collect();
        let state = self.state.lock().await;
        let rows = views::join_photos(&state.dogs, &state.url_ratings, Some(&only));
        Ok(views::table_rows(&rows))
    }

    async fn single_url(&self, url: &str, user: ObjectId) -> Result<Option<SingleUrlRating>> {
        let state = self.state.lock().await;
        let photo = state
            .url_index
            .get(url)
            .and_then(|id| state.url_ratings.get(id));
        Ok(photo.map(|photo| SingleUrlRating {
            number_of_rates: photo.number_of_rates,
            average_rating: photo.average_rating(),
            my_rating: photo.entry_for(user).and_then(|entry| entry.rating),
        }))
    }

    async fn count_all(&self) -> Result<u64> {
        let state = self.state.lock().await;
        Ok(state.url_ratings.len() as u64)
    }

    async fn filtered_count(&self, filter: &BreedFilter) -> Result<u64> {
        let state = self.state.lock().await;
        let rows = views::filter_breed(
            views::join_photos(&state.dogs, &state.url_ratings, None),
            Some(filter),
        );
        Ok(rows.len() as u64)
    }

    async fn filtered_count_user(
        &self,
        filter: &BreedFilter,
        url_ids: &[ObjectId],
    ) -> Result<u64> {
        let only: HashSet<ObjectId> = url_ids.iter().copied().collect();
        let state = self.state.lock().await;
        let rows = views::filter_breed(
            views::join_photos(&state.dogs, &state.url_ratings, Some(&only)),
            Some(filter),
        );
        Ok(rows.len() as u64)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut state = self.state.lock().await;
        if state
            .users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(CoreError::Conflict(
                "username or email already registered".to_string(),
            ));
        }
        let user = user.into_user();
        state.users.push(user.clone());
        Ok(user)
    }

    async fn get_user_by_id(&self, id: ObjectId) -> Result<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let state = self.state.lock().await;
        let mut users = state.users.clone();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn delete_user(&self, id: ObjectId) -> Result<bool> {
        let mut state = self.state.lock().await;
        let before = state.users.len();
        state.users.retain(|u| u.id != id);
        Ok(state.users.len() != before)
    }

    async fn save_url_id_to_user(&self, user: ObjectId, url_id: ObjectId) -> Result<()> {
        let mut state = self.state.lock().await;
        let user = state.user_mut(user)?;
        if !user.urls.contains(&url_id) {
            user.urls.push(url_id);
        }
        Ok(())
    }

    async fn remove_url_id_from_user(&self, user: ObjectId, url_id: ObjectId) -> Result<()> {
        let mut state = self.state.lock().await;
        if let Ok(user) = state.user_mut(user) {
            user.urls.retain(|id| *id != url_id);
        }
        Ok(())
    }

    async fn get_user_urls(&self, user: ObjectId) -> Result<Vec<ObjectId>> {
        let mut state = self.state.lock().await;
        Ok(state.user_mut(user)?.urls.clone())
    }

    async fn save_token(&self, user: ObjectId, token: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.user_mut(user)?.token = Some(token.to_string());
        Ok(())
    }

    async fn delete_token(&self, user: ObjectId) -> Result<()> {
        let mut state = self.state.lock().await;
        if let Ok(user) = state.user_mut(user) {
            user.token = None;
        }
        Ok(())
    }
}

#[async_trait]
impl FavouriteRepository for InMemoryStore {
    async fn create_favourites(&self, user: ObjectId) -> Result<()> {
        let mut state = self.state.lock().await;
        state
            .favourites
            .entry(user)
            .or_insert_with(|| Favourite::new(user));
        Ok(())
    }

    async fn add_favourite(&self, user: ObjectId, dog: ObjectId) -> Result<()> {
        let mut state = self.state.lock().await;
        let favourite = state
            .favourites
            .entry(user)
            .or_insert_with(|| Favourite::new(user));
        if !favourite.dogs.contains(&dog) {
            favourite.dogs.push(dog);
        }
        Ok(())
    }

    async fn get_favourites(&self, user: ObjectId) -> Result<Option<Vec<Dog>>> {
        let state = self.state.lock().await;
        Ok(state.favourites.get(&user).map(|favourite| {
            favourite
                .dogs
                .iter()
                .filter_map(|id| state.dogs.iter().find(|dog| dog.id == *id).cloned())
                .collect()
        }))
    }

    async fn remove_favourite(&self, user: ObjectId, dog: ObjectId) -> Result<()> {
        let mut state = self.state.lock().await;
        if let Some(favourite) = state.favourites.get_mut(&user) {
            favourite.dogs.retain(|id| *id != dog);
        }
        Ok(())
    }

    async fn delete_favourites(&self, user: ObjectId) -> Result<()> {
        let mut state = self.state.lock().await;
        state.favourites.remove(&user);
        Ok(())
    }
}
