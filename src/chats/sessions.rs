use std::collections::BTreeSet;

use axum::{
    debug_handler,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    auth::CurrentUser,
    db::{self, sessions, users, ChatSession, Message, Store},
    AppError, AppResult, AppState, FieldErrors,
};

use super::{access, session_view, sessions_of, SessionView};

#[derive(Debug, Deserialize)]
pub(crate) struct CreateSessionRequest {
    #[serde(default)]
    participants: Vec<i64>,
}

/// Sessions are only visible to their participants; anyone else gets `NotFound`.
async fn find_visible(store: &Store, id: i64, user_id: i64) -> AppResult<ChatSession> {
    let session = sessions::find(store.pool(), id).await?.ok_or(AppError::NotFound)?;
    if !sessions::is_participant(store.pool(), id, user_id).await? {
        return Err(AppError::NotFound);
    }
    Ok(session)
}

#[debug_handler(state = AppState)]
pub(crate) async fn list_sessions(
    State(store): State<Store>,
    CurrentUser(me): CurrentUser,
) -> AppResult<Json<Vec<SessionView>>> {
    Ok(Json(sessions_of(&store, me.id).await?))
}

/// Creates a session holding the caller plus the listed users.
#[debug_handler(state = AppState)]
pub(crate) async fn create_session(
    State(store): State<Store>,
    CurrentUser(me): CurrentUser,
    Json(CreateSessionRequest { participants }): Json<CreateSessionRequest>,
) -> AppResult<(StatusCode, Json<SessionView>)> {
    let members: BTreeSet<i64> = participants.into_iter().chain([me.id]).collect();

    let mut errors = FieldErrors::new();
    for &id in &members {
        if users::find(store.pool(), id).await?.is_none() {
            errors.add("participants", format!("Invalid pk \"{id}\" - object does not exist."));
        }
    }
    errors.into_result()?;

    let mut tx = store.begin().await?;
    let session = sessions::insert(&mut *tx, db::now()).await?;
    for &id in &members {
        sessions::add_participant(&mut *tx, session.id, id).await?;
    }
    tx.commit().await?;

    tracing::info!(session_id = session.id, members = members.len(), "chat session created");
    Ok((StatusCode::CREATED, Json(session_view(&store, &session, me.id).await?)))
}

#[debug_handler(state = AppState)]
pub(crate) async fn get_session(
    State(store): State<Store>,
    Path(id): Path<i64>,
    CurrentUser(me): CurrentUser,
) -> AppResult<Json<SessionView>> {
    let session = find_visible(&store, id, me.id).await?;
    Ok(Json(session_view(&store, &session, me.id).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn session_messages(
    State(store): State<Store>,
    Path(id): Path<i64>,
    CurrentUser(me): CurrentUser,
) -> AppResult<Json<Vec<Message>>> {
    find_visible(&store, id, me.id).await?;
    Ok(Json(access::list_messages(&store, id).await?))
}

/// Deletes the session together with all of its messages.
#[debug_handler(state = AppState)]
pub(crate) async fn delete_session(
    State(store): State<Store>,
    Path(id): Path<i64>,
    CurrentUser(me): CurrentUser,
) -> AppResult<StatusCode> {
    find_visible(&store, id, me.id).await?;

    if !sessions::delete(store.pool(), id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(session_id = id, user_id = me.id, "chat session deleted");
    Ok(StatusCode::NO_CONTENT)
}
