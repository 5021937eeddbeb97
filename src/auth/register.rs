use std::sync::Arc;

use axum::{debug_handler, extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::{config::Config, db::Store, AppResult, AppState};

use super::{accounts, AccountCreated, TokenKeys};

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterRequest {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn register(
    State(store): State<Store>,
    State(config): State<Arc<Config>>,
    State(keys): State<TokenKeys>,
    Json(RegisterRequest { username, email, password }): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AccountCreated>)> {
    let user = accounts::register(
        &store,
        &config,
        username.as_deref(),
        email.as_deref(),
        password.as_deref(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(AccountCreated {
            tokens: keys.issue_pair(&user)?,
            message: "User created successfully".to_owned(),
        }),
    ))
}
