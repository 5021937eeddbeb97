use axum::{
    debug_handler,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{
    auth::CurrentUser,
    db::{self, messages, sessions, Message, Store},
    AppError, AppResult, AppState, FieldErrors,
};

#[derive(Debug, Deserialize)]
pub(crate) struct SendMessageRequest {
    chat_session: Option<i64>,
    content: Option<String>,
}

/// `read` is the only field a message may change after it was sent.
#[derive(Debug, Deserialize)]
pub(crate) struct UpdateMessageRequest {
    read: Option<bool>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

async fn find_visible(store: &Store, id: i64, user_id: i64) -> AppResult<Message> {
    let message = messages::find(store.pool(), id).await?.ok_or(AppError::NotFound)?;
    if !sessions::is_participant(store.pool(), message.chat_session, user_id).await? {
        return Err(AppError::NotFound);
    }
    Ok(message)
}

/// Every message from the caller's sessions, oldest first.
#[debug_handler(state = AppState)]
pub(crate) async fn list_messages(
    State(store): State<Store>,
    CurrentUser(me): CurrentUser,
) -> AppResult<Json<Vec<Message>>> {
    Ok(Json(messages::visible_to(store.pool(), me.id).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn send_message(
    State(store): State<Store>,
    CurrentUser(me): CurrentUser,
    Json(SendMessageRequest { chat_session, content }): Json<SendMessageRequest>,
) -> AppResult<(StatusCode, Json<Message>)> {
    let Some(session_id) = chat_session else {
        return Err(AppError::Validation(FieldErrors::single(
            "chat_session",
            "This field is required.",
        )));
    };

    if !sessions::is_participant(store.pool(), session_id, me.id).await? {
        return Err(AppError::Validation(FieldErrors::single(
            "chat_session",
            format!("Invalid pk \"{session_id}\" - object does not exist."),
        )));
    }

    let message = messages::insert(store.pool(), session_id, me.id, content.as_deref(), db::now()).await?;

    tracing::debug!(message_id = message.id, session_id, sender = me.id, "message sent");
    Ok((StatusCode::CREATED, Json(message)))
}

#[debug_handler(state = AppState)]
pub(crate) async fn get_message(
    State(store): State<Store>,
    Path(id): Path<i64>,
    CurrentUser(me): CurrentUser,
) -> AppResult<Json<Message>> {
    Ok(Json(find_visible(&store, id, me.id).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn update_message(
    State(store): State<Store>,
    Path(id): Path<i64>,
    CurrentUser(me): CurrentUser,
    Json(UpdateMessageRequest { read, rest }): Json<UpdateMessageRequest>,
) -> AppResult<Json<Message>> {
    let message = find_visible(&store, id, me.id).await?;

    let mut errors = FieldErrors::new();
    for field in rest.keys() {
        errors.add(field, "This field cannot be changed.");
    }
    errors.into_result()?;

    let Some(read) = read else {
        return Ok(Json(message));
    };

    let updated = messages::set_read(store.pool(), id, read).await?.ok_or(AppError::NotFound)?;
    Ok(Json(updated))
}
