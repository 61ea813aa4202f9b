mod support;

use std::collections::HashSet;

use dograte_core::{
    database::{DogRepository, FavouriteRepository, UserRepository},
    domain::{BreedFilter, SortMode, SortOrder, SortedQuery},
};

use support::*;

#[tokio::test]
async fn random_sample_only_returns_linked_photos() {
    let store = seeded_store().await;

    let sample = store.random_docs(160, None).await.unwrap();
    assert_eq!(sample.len(), LINKED_BREEDS * URLS_PER_BREED);

    let unique: HashSet<&str> = sample.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(unique.len(), sample.len());
    assert!(sample.iter().all(|r| !r.url.contains("orphan")));
    assert!(sample.iter().all(|r| r.my_rating.is_none()));
}

#[tokio::test]
async fn random_with_exclusions_never_repeats_loaded_photos() {
    let store = seeded_store().await;

    let first = store.random_docs(100, None).await.unwrap();
    let loaded: Vec<String> = first.iter().map(|r| r.url.clone()).collect();

    let more = store
        .random_with_exclusions(&loaded, 100, None)
        .await
        .unwrap();
    assert_eq!(more.len(), 50);
    assert!(more.iter().all(|r| !loaded.contains(&r.url)));
}

#[tokio::test]
async fn counts_cover_all_and_filtered_photos() {
    let store = seeded_store().await;
    add_hound(&store).await;

    let total = (LINKED_BREEDS * URLS_PER_BREED + ORPHAN_URLS + 5) as u64;
    assert_eq!(store.count_all().await.unwrap(), total);

    let plain = BreedFilter {
        breed: breed_name(0),
        sub_breed: None,
    };
    assert_eq!(store.filtered_count(&plain).await.unwrap(), 5);

    let afghan = BreedFilter {
        breed: "hound".into(),
        sub_breed: Some("afghan".into()),
    };
    assert_eq!(store.filtered_count(&afghan).await.unwrap(), 3);

    // Exact match: no sub-breed selects nothing on a breed that has them.
    let hound = BreedFilter {
        breed: "hound".into(),
        sub_breed: None,
    };
    assert_eq!(store.filtered_count(&hound).await.unwrap(), 0);
}

#[tokio::test]
async fn sorted_by_average_hides_unrated_and_overlays_my_rating() {
    let store = seeded_store().await;
    let alice = create_user(&store, "alice").await;
    let bob = create_user(&store, "bob").await;

    let top = photo_url(&breed_name(3), 1);
    let middle = photo_url(&breed_name(7), 2);
    let low = photo_url(&breed_name(9), 0);
    rate(&store, alice, &top, 5.0).await;
    rate(&store, bob, &top, 4.0).await;
    rate(&store, alice, &middle, 3.0).await;
    rate(&store, bob, &low, 1.0).await;

    let query = SortedQuery {
        sort_mode: SortMode::AverageRating,
        sort_order: SortOrder::Descending,
        ..SortedQuery::default()
    };
    let page = store.all_sorted(&query, Some(alice)).await.unwrap();

    let urls: Vec<&str> = page.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls, vec![top.as_str(), middle.as_str(), low.as_str()]);
    assert_eq!(page[0].average_rating, Some(4.5));
    assert_eq!(page[0].number_of_rates, 2);
    assert_eq!(page[0].my_rating, Some(5.0));
    assert_eq!(page[2].my_rating, None);

    let anonymous = store.all_sorted(&query, None).await.unwrap();
    assert!(anonymous.iter().all(|r| r.my_rating.is_none()));
}

#[tokio::test]
async fn sorted_by_breed_pages_with_url_tie_break() {
    let store = seeded_store().await;

    let query = SortedQuery {
        sort_mode: SortMode::Breed,
        sort_order: SortOrder::Ascending,
        skip_count: 5,
        sample_size: 7,
        filtered_breed: None,
    };
    let page = store.all_sorted(&query, None).await.unwrap();
    assert_eq!(page.len(), 7);
    assert!(page[..5].iter().all(|r| r.breed == breed_name(1)));
    assert_eq!(page[0].url, photo_url(&breed_name(1), 0));
    assert_eq!(page[5].url, photo_url(&breed_name(2), 0));
}

#[tokio::test]
async fn user_views_only_see_the_users_photos() {
    let store = seeded_store().await;
    let carol = create_user(&store, "carol").await;

    let first = photo_url(&breed_name(4), 0);
    let second = photo_url(&breed_name(4), 3);
    let other = photo_url(&breed_name(12), 1);
    rate(&store, carol, &first, 2.0).await;
    rate(&store, carol, &second, 4.0).await;
    rate(&store, carol, &other, 5.0).await;

    // Opened but never rated: still part of the user's list.
    let opened = photo_url(&breed_name(20), 4);
    let photo = store.save_url_with_user(&opened, carol).await.unwrap();
    store.save_url_id_to_user(carol, photo.id).await.unwrap();

    let ids = store.get_user_urls(carol).await.unwrap();
    assert_eq!(ids.len(), 4);

    let query = SortedQuery {
        sort_mode: SortMode::MyRating,
        sort_order: SortOrder::Descending,
        ..SortedQuery::default()
    };
    let mine = store.user_sorted(carol, &ids, &query).await.unwrap();
    let ratings: Vec<Option<f64>> = mine.iter().map(|r| r.my_rating).collect();
    assert_eq!(ratings, vec![Some(5.0), Some(4.0), Some(2.0), None]);

    let filter = BreedFilter {
        breed: breed_name(4),
        sub_breed: None,
    };
    assert_eq!(store.filtered_count_user(&filter, &ids).await.unwrap(), 2);

    let table = store.user_table(&ids).await.unwrap();
    let breeds: Vec<String> = table.iter().map(|row| row.breed.clone()).collect();
    assert_eq!(breeds, vec![breed_name(4), breed_name(12), breed_name(20)]);
    assert_eq!(table[0].average_rating, Some(3.0));
    assert_eq!(table[0].number_of_rates, 2);
    assert_eq!(table[2].average_rating, None);
}

#[tokio::test]
async fn table_groups_each_sub_breed_separately() {
    let store = seeded_store().await;
    add_hound(&store).await;
    let dave = create_user(&store, "dave").await;
    rate(&store, dave, &photo_url("hound-afghan", 0), 4.0).await;
    rate(&store, dave, &photo_url("hound-afghan", 2), 2.0).await;

    let table = store.table().await.unwrap();
    assert_eq!(table.len(), LINKED_BREEDS + 2);

    let hound: Vec<_> = table.iter().filter(|row| row.breed == "hound").collect();
    assert_eq!(hound.len(), 2);
    assert_eq!(hound[0].sub_breed.as_deref(), Some("afghan"));
    assert_eq!(hound[0].average_rating, Some(3.0));
    assert_eq!(hound[0].number_of_rates, 2);
    assert_eq!(hound[1].sub_breed.as_deref(), Some("basset"));
    assert_eq!(hound[1].average_rating, None);

    let query = SortedQuery {
        filtered_breed: Some(BreedFilter {
            breed: "hound".into(),
            sub_breed: Some("basset".into()),
        }),
        ..SortedQuery::default()
    };
    let basset = store.all_sorted(&query, None).await.unwrap();
    assert_eq!(basset.len(), 2);
    assert!(basset.iter().all(|r| r.sub_breed.as_deref() == Some("basset")));
}

#[tokio::test]
async fn favourites_keep_order_and_skip_missing_dogs() {
    let store = seeded_store().await;
    let erin = create_user(&store, "erin").await;
    assert!(store.get_favourites(erin).await.unwrap().is_none());

    store.create_favourites(erin).await.unwrap();
    assert_eq!(store.get_favourites(erin).await.unwrap(), Some(Vec::new()));

    let second = store.find_dog_by_breed(&breed_name(2)).await.unwrap().unwrap();
    let first = store.find_dog_by_breed(&breed_name(1)).await.unwrap().unwrap();
    store.add_favourite(erin, second.id).await.unwrap();
    store.add_favourite(erin, first.id).await.unwrap();
    store.add_favourite(erin, second.id).await.unwrap();
    store.add_favourite(erin, dograte_core::ObjectId::new()).await.unwrap();

    let dogs = store.get_favourites(erin).await.unwrap().unwrap();
    let breeds: Vec<&str> = dogs.iter().map(|d| d.breed.as_str()).collect();
    assert_eq!(breeds, vec!["breed02", "breed01"]);

    store.remove_favourite(erin, second.id).await.unwrap();
    let dogs = store.get_favourites(erin).await.unwrap().unwrap();
    assert_eq!(dogs.len(), 1);
}

#[tokio::test]
async fn save_many_urls_returns_ids_for_existing_urls() {
    let store = seeded_store().await;
    let urls = vec![
        photo_url(&breed_name(0), 0),
        "https://images.dog.ceo/breeds/new/0.jpg".to_string(),
        photo_url(&breed_name(0), 0),
    ];
    let ids = store.save_many_urls(&urls).await.unwrap();
    assert_eq!(ids.len(), 2);

    let existing = store.find_url_rating(&urls[0]).await.unwrap().unwrap();
    assert_eq!(ids[0], existing.id);
}
