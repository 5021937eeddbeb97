use axum::{
    debug_handler,
    extract::{Path, State},
    Json,
};

use crate::{
    auth::CurrentUser,
    db::{users, Message, Store},
    AppError, AppResult, AppState,
};

use super::{access, sessions_of, SessionView};

/// Opens (or starts) the conversation with another user and returns its history.
#[debug_handler(state = AppState)]
pub(crate) async fn chat_with(
    State(store): State<Store>,
    Path(other_user_id): Path<i64>,
    CurrentUser(me): CurrentUser,
) -> AppResult<Json<Vec<Message>>> {
    if users::find(store.pool(), other_user_id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let session = access::get_or_create_session(&store, me.id, other_user_id).await?;
    Ok(Json(access::list_messages(&store, session.id).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn user_chats(
    State(store): State<Store>,
    CurrentUser(me): CurrentUser,
) -> AppResult<Json<Vec<SessionView>>> {
    Ok(Json(sessions_of(&store, me.id).await?))
}
