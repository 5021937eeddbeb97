use axum::{debug_handler, extract::State, Json};
use serde::Deserialize;

use crate::{db::Store, validate, AppError, AppResult, AppState, FieldErrors};

use super::{accounts, TokenKeys, TokenPair};

#[derive(Debug, Deserialize)]
pub(crate) struct ObtainPairRequest {
    username: Option<String>,
    password: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn obtain_pair(
    State(store): State<Store>,
    State(keys): State<TokenKeys>,
    Json(ObtainPairRequest { username, password }): Json<ObtainPairRequest>,
) -> AppResult<Json<TokenPair>> {
    let mut errors = FieldErrors::new();
    validate::field(&mut errors, "username", username.as_deref(), &[]);
    validate::field(&mut errors, "password", password.as_deref(), &[]);
    errors.into_result()?;

    let (Some(username), Some(password)) = (username, password) else {
        return Err(AppError::BadRequest("incomplete credentials".into()));
    };

    let Some(user) = accounts::authenticate(&store, &username, &password).await? else {
        return Err(AppError::unauthorized(
            "No active account found with the given credentials",
        ));
    };

    tracing::info!(user_id = user.id, "token pair issued");
    Ok(Json(keys.issue_pair(&user)?))
}
