#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use discourse::{app, auth::accounts, config::Config, db::Store, AppState};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

pub const PASSWORD: &str = "Password1!";

pub struct TestApp {
    pub router: Router,
    pub store: Store,
    pub config: Config,
    pub media: TempDir,
}

pub async fn spawn() -> TestApp {
    spawn_with(|_| {}).await
}

/// Builds the app after letting the caller adjust the config. A `host` user
/// is always registered first and wired up as the guest welcome partner.
pub async fn spawn_with(adjust: impl FnOnce(&mut Config)) -> TestApp {
    let media = tempfile::tempdir().expect("media dir");
    let store = Store::open_in_memory().await.expect("store");
    let mut config = Config::for_tests(media.path());

    let host = accounts::register(&store, &config, Some("host"), Some("host@example.com"), Some(PASSWORD))
        .await
        .expect("host user");
    config.guest_host_user_id = Some(host.id);
    adjust(&mut config);

    let router = app(AppState::new(store.clone(), config.clone()));
    TestApp { router, store, config, media }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, Some(token), None).await
    }

    /// Registers `username` and returns its access token.
    pub async fn register(&self, username: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/register/",
                None,
                Some(json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": PASSWORD,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register {username}: {body}");
        body["tokens"]["access"].as_str().expect("access token").to_owned()
    }

    pub async fn user_id(&self, username: &str) -> i64 {
        discourse::db::users::find_by_username(self.store.pool(), username)
            .await
            .expect("query")
            .expect("user exists")
            .id
    }
}
