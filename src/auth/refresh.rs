use axum::{debug_handler, extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{
    db::{users, Store},
    AppError, AppResult, AppState, FieldErrors,
};

use super::{TokenKeys, TokenType};

#[derive(Debug, Deserialize)]
pub(crate) struct RefreshRequest {
    refresh: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AccessToken {
    access: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn refresh(
    State(store): State<Store>,
    State(keys): State<TokenKeys>,
    Json(RefreshRequest { refresh }): Json<RefreshRequest>,
) -> AppResult<Json<AccessToken>> {
    let Some(refresh) = refresh else {
        return Err(AppError::Validation(FieldErrors::single("refresh", "This field is required.")));
    };

    let claims = keys.verify(&refresh, TokenType::Refresh)?;
    let Some(user) = users::find(store.pool(), claims.user_id()?).await? else {
        return Err(AppError::unauthorized("User not found"));
    };

    Ok(Json(AccessToken {
        access: keys.issue(&user, TokenType::Access)?,
    }))
}
