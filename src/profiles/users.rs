use std::sync::Arc;

use axum::{
    debug_handler,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    auth::{accounts, CurrentUser},
    config::Config,
    db::{self, users, Store},
    validate, AppError, AppResult, AppState, FieldErrors,
};

use super::UserView;

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateUserRequest {
    username: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn list_users(
    State(store): State<Store>,
    _user: CurrentUser,
) -> AppResult<Json<Vec<UserView>>> {
    let all = users::list(store.pool()).await?;
    Ok(Json(all.iter().map(UserView::from).collect()))
}

#[debug_handler(state = AppState)]
pub(crate) async fn get_user(
    State(store): State<Store>,
    Path(id): Path<i64>,
    _user: CurrentUser,
) -> AppResult<Json<UserView>> {
    let user = users::find(store.pool(), id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(UserView::from(&user)))
}

/// Only the username is writable, and only on one's own record.
#[debug_handler(state = AppState)]
pub(crate) async fn update_user(
    State(store): State<Store>,
    Path(id): Path<i64>,
    CurrentUser(me): CurrentUser,
    Json(UpdateUserRequest { username }): Json<UpdateUserRequest>,
) -> AppResult<Json<UserView>> {
    if users::find(store.pool(), id).await?.is_none() {
        return Err(AppError::NotFound);
    }
    if id != me.id {
        return Err(AppError::Forbidden);
    }

    let Some(username) = username.filter(|name| *name != me.username) else {
        return Ok(Json(UserView::from(&me)));
    };

    let mut errors = FieldErrors::new();
    validate::field(&mut errors, "username", Some(&username), validate::USERNAME_RULES);
    if !errors.has("username") && users::username_taken(store.pool(), &username).await? {
        errors.add("username", accounts::USERNAME_TAKEN);
    }
    errors.into_result()?;

    let updated = users::rename(store.pool(), me.id, &username)
        .await
        .map_err(|err| match db::unique_violation(&err) {
            Some(_) => AppError::Validation(FieldErrors::single("username", accounts::USERNAME_TAKEN)),
            None => AppError::Database(err),
        })?
        .ok_or(AppError::NotFound)?;

    tracing::info!(user_id = me.id, username = %updated.username, "user renamed");
    Ok(Json(UserView::from(&updated)))
}

#[debug_handler(state = AppState)]
pub(crate) async fn delete_user(
    State(store): State<Store>,
    State(config): State<Arc<Config>>,
    Path(id): Path<i64>,
    CurrentUser(me): CurrentUser,
) -> AppResult<StatusCode> {
    if users::find(store.pool(), id).await?.is_none() {
        return Err(AppError::NotFound);
    }
    if id != me.id {
        return Err(AppError::Forbidden);
    }

    accounts::delete_account(&store, &config, &me).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Deletes the caller's own account, no confirmation step.
#[debug_handler(state = AppState)]
pub(crate) async fn delete_account(
    State(store): State<Store>,
    State(config): State<Arc<Config>>,
    CurrentUser(me): CurrentUser,
) -> AppResult<StatusCode> {
    accounts::delete_account(&store, &config, &me).await?;
    Ok(StatusCode::NO_CONTENT)
}
