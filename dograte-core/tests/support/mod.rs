#![allow(dead_code)]

use dograte_core::{
    ObjectId,
    database::{DogRepository, InMemoryStore, UserRepository},
    domain::{NewUser, Rank},
};

pub const LINKED_BREEDS: usize = 30;
pub const URLS_PER_BREED: usize = 5;
pub const ORPHAN_URLS: usize = 50;

pub fn photo_url(breed: &str, n: usize) -> String {
    format!("https://images.dog.ceo/breeds/{breed}/{n}.jpg")
}

pub fn breed_name(i: usize) -> String {
    format!("breed{i:02}")
}

/// 30 breeds with 5 photos each plus 50 photos no dog references.
pub async fn seeded_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    seed_breeds(&store).await;
    store
}

pub async fn seed_breeds<S: DogRepository + ?Sized>(store: &S) {
    for i in 0..LINKED_BREEDS {
        let breed = breed_name(i);
        let dog = store.save_dog(&breed).await.expect("save dog");
        let urls: Vec<String> = (0..URLS_PER_BREED).map(|n| photo_url(&breed, n)).collect();
        let ids = store.save_many_urls(&urls).await.expect("save urls");
        store
            .save_url_ids_to_dog(&ids, dog.id, 0)
            .await
            .expect("link urls");
    }
    let orphans: Vec<String> = (0..ORPHAN_URLS).map(|n| photo_url("orphan", n)).collect();
    store.save_many_urls(&orphans).await.expect("save orphans");
}

/// `hound` with `afghan` (3 photos) and `basset` (2 photos).
pub async fn add_hound<S: DogRepository + ?Sized>(store: &S) {
    let dog = store.save_dog("hound").await.expect("save hound");
    for (sub, count) in [("afghan", 3), ("basset", 2)] {
        let dog = store.save_sub_breed(dog.id, sub).await.expect("save sub-breed");
        let index = dog.slot_for(Some(sub)).expect("slot");
        let urls: Vec<String> = (0..count)
            .map(|n| photo_url(&format!("hound-{sub}"), n))
            .collect();
        let ids = store.save_many_urls(&urls).await.expect("save urls");
        store
            .save_url_ids_to_dog(&ids, dog.id, index)
            .await
            .expect("link urls");
    }
}

pub async fn create_user<S: UserRepository + ?Sized>(store: &S, name: &str) -> ObjectId {
    store
        .create_user(NewUser {
            username: name.to_string(),
            email: format!("{name}@dogs.io"),
            password_hash: "not-a-real-hash".to_string(),
            rank: Rank::User,
        })
        .await
        .expect("create user")
        .id
}

/// Opens the photo for `user`, rates it, and records it on the user.
pub async fn rate<S>(store: &S, user: ObjectId, url: &str, rating: f64)
where
    S: DogRepository + UserRepository + ?Sized,
{
    let photo = store.save_url_with_user(url, user).await.expect("save url");
    store
        .update_url_rating(url, user, rating)
        .await
        .expect("rate url");
    store
        .save_url_id_to_user(user, photo.id)
        .await
        .expect("record url on user");
}
