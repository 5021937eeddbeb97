use std::sync::Arc;

use axum::{debug_handler, extract::State, http::StatusCode, Json};

use crate::{config::Config, db::Store, AppError, AppResult, AppState};

use super::{accounts, AccountCreated, TokenKeys};

#[debug_handler(state = AppState)]
pub(crate) async fn create_guest(
    State(store): State<Store>,
    State(config): State<Arc<Config>>,
    State(keys): State<TokenKeys>,
) -> AppResult<(StatusCode, Json<AccountCreated>)> {
    let (guest, password) = accounts::create_guest(&store, &config).await?;

    // tokens come from the generated credential, as for any other login
    let Some(user) = accounts::authenticate(&store, &guest.username, &password).await? else {
        return Err(AppError::Internal(anyhow::anyhow!(
            "generated credential for {} did not authenticate",
            guest.username
        )));
    };

    Ok((
        StatusCode::CREATED,
        Json(AccountCreated {
            tokens: keys.issue_pair(&user)?,
            message: "Guest user created successfully".to_owned(),
        }),
    ))
}
