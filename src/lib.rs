pub mod appresult;
pub mod auth;
pub mod chats;
pub mod config;
pub mod db;
pub mod index;
pub mod logging;
pub mod profiles;
pub mod tasks;
pub mod timesince;
pub mod validate;

use std::sync::Arc;

use axum::{extract::FromRef, middleware, routing::get, Router};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub use appresult::{AppError, AppResult, FieldErrors};

use auth::TokenKeys;
use config::Config;
use db::Store;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub store: Store,
    pub config: Arc<Config>,
    pub keys: TokenKeys,
}

impl AppState {
    pub fn new(store: Store, config: Config) -> Self {
        AppState {
            keys: TokenKeys::new(&config),
            config: Arc::new(config),
            store,
        }
    }
}

/// Full route table. Everything merged into `protected` sits behind token auth.
pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .merge(chats::router())
        .merge(profiles::router(&state.config))
        .merge(tasks::router())
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_auth));

    Router::new()
        .route("/", get(index::api_root))
        .merge(auth::router())
        .merge(protected)
        .nest_service("/media", ServeDir::new(&state.config.media_root))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
