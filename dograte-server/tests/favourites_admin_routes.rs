mod support;

use axum::http::StatusCode;
use dograte_server::routes::paths::v1;
use serde_json::{Value, json};

use support::*;

#[tokio::test]
async fn favourites_add_list_and_remove() {
    let app = test_app();
    let alice = app.register_and_login("alice").await;

    let response = alice.authorize(app.server.get(v1::dogs::FAVOURITES)).await;
    response.assert_status_ok();
    let dogs: Vec<Value> = response.json();
    assert!(dogs.is_empty());

    for breed in ["hound", "akita", "hound"] {
        let response = alice
            .authorize(app.server.post(v1::dogs::FAVOURITES))
            .json(&json!({ "breed": breed }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["message"], "Item added to favorites");
    }

    let response = alice.authorize(app.server.get(v1::dogs::FAVOURITES)).await;
    let dogs: Vec<Value> = response.json();
    let breeds: Vec<&str> = dogs.iter().filter_map(|d| d["breed"].as_str()).collect();
    assert_eq!(breeds, vec!["hound", "akita"]);

    let response = alice
        .authorize(app.server.delete(v1::dogs::FAVOURITES))
        .json(&json!({ "breed": "hound" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Dog Deleted");

    let response = alice.authorize(app.server.get(v1::dogs::FAVOURITES)).await;
    let dogs: Vec<Value> = response.json();
    assert_eq!(dogs.len(), 1);
    assert_eq!(dogs[0]["breed"], "akita");
}

#[tokio::test]
async fn favourites_missing_document_is_not_found() {
    let app = test_app();
    let alice = app.register_and_login("alice").await;
    let user = app
        .state
        .repos
        .users
        .get_user_by_username("alice")
        .await
        .unwrap()
        .unwrap();
    app.state
        .repos
        .favourites
        .delete_favourites(user.id)
        .await
        .unwrap();

    let response = alice.authorize(app.server.get(v1::dogs::FAVOURITES)).await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(error_message(&response), "No favourites found!");
}

#[tokio::test]
async fn admin_routes_reject_regular_users() {
    let app = test_app();
    let alice = app.register_and_login("alice").await;

    let response = alice.authorize(app.server.get(v1::users::admin::ALL)).await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = app.server.get(v1::users::admin::ALL).await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_seeds_breeds_and_lists_users() {
    let app = test_app();
    let admin = app.admin_session("admin").await;
    app.register("alice").await.assert_status_ok();

    let response = admin
        .authorize(app.server.post(v1::dogs::admin::STORE_ALL_BREEDS))
        .await;
    response.assert_status_ok();
    let report: Value = response.json();
    assert_eq!(report["breeds"], 2);
    assert_eq!(report["subBreeds"], 2);
    assert_eq!(report["urls"], 9);

    let response = app.server.get(v1::dogs::MAX_COUNT).await;
    let body: Value = response.json();
    assert_eq!(body["count"], 9);

    let response = admin.authorize(app.server.get(v1::users::admin::ALL)).await;
    response.assert_status_ok();
    let users: Vec<Value> = response.json();
    let names: Vec<&str> = users.iter().filter_map(|u| u["username"].as_str()).collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"admin"));
    assert!(names.contains(&"alice"));
}

#[tokio::test]
async fn deleting_a_user_removes_their_ratings() {
    let app = test_app();
    let admin = app.admin_session("admin").await;
    let alice = app.register_and_login("alice").await;
    let url = photo("akita", 0);

    alice
        .authorize(app.server.post(v1::dogs::RATE))
        .json(&json!({ "url": url, "breed": "akita", "rating": 5 }))
        .await
        .assert_status_ok();

    let user = app
        .state
        .repos
        .users
        .get_user_by_username("alice")
        .await
        .unwrap()
        .unwrap();

    let response = admin
        .authorize(app.server.post(v1::users::admin::DELETE_USER))
        .json(&json!({ "userId": user.id.to_hex() }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "User deleted");

    let summary = app
        .state
        .repos
        .dogs
        .single_url(&url, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(summary.number_of_rates, 0);
    assert_eq!(summary.average_rating, None);

    let response = admin
        .authorize(app.server.post(v1::users::admin::DELETE_USER))
        .json(&json!({ "userId": user.id.to_hex() }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = admin
        .authorize(app.server.post(v1::users::admin::DELETE_USER))
        .json(&json!({ "userId": "not-an-id" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}
