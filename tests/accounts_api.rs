mod common;

use axum::http::{Method, StatusCode};
use discourse::db::users;
use regex::Regex;
use serde_json::json;

use common::{spawn, PASSWORD};

#[tokio::test]
async fn registration_tokens_authenticate_the_new_user() {
    let app = spawn().await;
    let (status, body) = app
        .call(
            Method::POST,
            "/api/register/",
            None,
            Some(json!({ "username": "alice", "email": "alice@example.com", "password": PASSWORD })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User created successfully");
    let access = body["tokens"]["access"].as_str().unwrap();
    assert!(body["tokens"]["refresh"].is_string());

    let (status, chats) = app.get("/user_chats/", access).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(chats, json!([]));

    let alice = app.user_id("alice").await;
    let (status, me) = app.get(&format!("/users/{alice}/"), access).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me, json!({ "id": alice, "username": "alice", "profile_picture": null }));
}

#[tokio::test]
async fn duplicate_registration_is_rejected_every_time() {
    let app = spawn().await;
    app.register("alice").await;

    for _ in 0..2 {
        let (status, body) = app
            .call(
                Method::POST,
                "/api/register/",
                None,
                Some(json!({ "username": "alice", "email": "alice@example.com", "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["username"], json!(["A user with that username already exists."]));
        assert_eq!(body["email"], json!(["A user with that email already exists."]));
    }
}

#[tokio::test]
async fn malformed_registration_reports_fields() {
    let app = spawn().await;
    let (status, body) = app
        .call(
            Method::POST,
            "/api/register/",
            None,
            Some(json!({ "username": "al", "email": "not-an-email", "password": "short" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["username"], json!(["Username must be at least 4 characters long."]));
    assert_eq!(body["email"], json!(["Enter a valid email address."]));
    assert_eq!(body["password"], json!(["Password must be at least 8 characters long."]));
}

#[tokio::test]
async fn token_pair_obtain_and_refresh() {
    let app = spawn().await;
    app.register("alice").await;

    let (status, _) = app
        .call(
            Method::POST,
            "/api/token/",
            None,
            Some(json!({ "username": "alice", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, pair) = app
        .call(
            Method::POST,
            "/api/token/",
            None,
            Some(json!({ "username": "alice", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let refresh = pair["refresh"].as_str().unwrap();

    // a refresh token is not an access token
    let (status, _) = app.get("/user_chats/", refresh).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, renewed) = app
        .call(Method::POST, "/api/token/refresh/", None, Some(json!({ "refresh": refresh })))
        .await;
    assert_eq!(status, StatusCode::OK);
    let access = renewed["access"].as_str().unwrap();
    assert_eq!(app.get("/user_chats/", access).await.0, StatusCode::OK);

    let (status, _) = app
        .call(Method::POST, "/api/token/refresh/", None, Some(json!({ "refresh": access })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = spawn().await;

    let (status, body) = app.call(Method::GET, "/user_chats/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["detail"].is_string());

    assert_eq!(app.get("/users/", "garbage").await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(app.call(Method::GET, "/", None, None).await.0, StatusCode::OK);
}

#[tokio::test]
async fn guest_gets_generated_identity_and_welcome_chat() {
    let app = spawn().await;
    let (status, body) = app.call(Method::POST, "/api/guest/create/", None, None).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], "Guest user created successfully");
    let access = body["tokens"]["access"].as_str().unwrap();

    let (status, chats) = app.get("/user_chats/", access).await;
    assert_eq!(status, StatusCode::OK);
    let chats = chats.as_array().unwrap();
    assert_eq!(chats.len(), 1);

    let last = &chats[0]["last_message"];
    assert_eq!(last["message"], "Welcome to Discourse!");
    assert_eq!(last["sender"], "other");
    assert_eq!(last["read"], false);

    let names: Vec<&str> = chats[0]["participants"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["username"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"host"));
    let guest_name = names.iter().find(|name| **name != "host").unwrap();
    assert!(Regex::new(r"^guest_[0-9a-f]{8}$").unwrap().is_match(guest_name));

    let guest = users::find_by_username(app.store.pool(), guest_name).await.unwrap().unwrap();
    assert!(guest.guest);

    let session_id = chats[0]["id"].as_i64().unwrap();
    let (_, log) = app.get(&format!("/chat_sessions/{session_id}/messages/"), access).await;
    let log = log.as_array().unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0]["sender"], app.user_id("host").await);
}

#[tokio::test]
async fn deleted_account_loses_access() {
    let app = spawn().await;
    let token = app.register("alice").await;

    let (status, _) = app.call(Method::DELETE, "/delete-account/", Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert!(users::find_by_username(app.store.pool(), "alice").await.unwrap().is_none());
    assert_eq!(app.get("/user_chats/", &token).await.0, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn users_may_only_change_themselves() {
    let app = spawn().await;
    let alice = app.register("alice").await;
    app.register("bobby").await;
    let bob_id = app.user_id("bobby").await;
    let alice_id = app.user_id("alice").await;

    let (status, _) = app
        .call(Method::PATCH, &format!("/users/{bob_id}/"), Some(alice.as_str()), Some(json!({ "username": "evil" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.call(Method::DELETE, &format!("/users/{bob_id}/"), Some(alice.as_str()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .call(Method::PATCH, &format!("/users/{alice_id}/"), Some(alice.as_str()), Some(json!({ "username": "bobby" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["username"], json!(["A user with that username already exists."]));

    let (status, body) = app
        .call(Method::PATCH, &format!("/users/{alice_id}/"), Some(alice.as_str()), Some(json!({ "username": "alicia" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alicia");

    let (status, list) = app.get("/users/", &alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 3);
}
