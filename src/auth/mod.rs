pub mod accounts;
mod guest;
mod login;
mod middleware;
mod refresh;
mod register;
pub mod tokens;

use axum::{routing::post, Router};
use serde::{Deserialize, Serialize};

use crate::AppState;

pub use middleware::{require_auth, CurrentUser};
pub use tokens::{Claims, TokenKeys, TokenPair, TokenType};

/// Body returned when an account is created.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountCreated {
    pub tokens: TokenPair,
    pub message: String,
}

/// Routes that do not require a token.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/register/", post(register::register))
        .route("/api/guest/create/", post(guest::create_guest))
        .route("/api/token/", post(login::obtain_pair))
        .route("/api/token/refresh/", post(refresh::refresh))
}
