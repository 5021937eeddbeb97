pub mod access;
mod conversations;
mod messages;
mod sessions;

use axum::{routing::get, Router};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    db::{self, ChatSession, Store},
    profiles::UserView,
    AppResult, AppState,
};

use access::Summary;

/// A session as listed to one of its participants.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub participants: Vec<UserView>,
    pub last_message: Option<Summary>,
}

pub(crate) async fn session_view(
    store: &Store,
    session: &ChatSession,
    viewer_id: i64,
) -> AppResult<SessionView> {
    let participants = db::sessions::participants(store.pool(), session.id).await?;

    Ok(SessionView {
        id: session.id,
        created_at: session.created_at,
        participants: participants.iter().map(UserView::from).collect(),
        last_message: access::summarize(store, session.id, viewer_id).await?,
    })
}

pub(crate) async fn sessions_of(store: &Store, viewer_id: i64) -> AppResult<Vec<SessionView>> {
    let sessions = db::sessions::for_user(store.pool(), viewer_id).await?;

    let mut views = Vec::with_capacity(sessions.len());
    for session in &sessions {
        views.push(session_view(store, session, viewer_id).await?);
    }
    Ok(views)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chat/{other_user_id}/", get(conversations::chat_with))
        .route("/user_chats/", get(conversations::user_chats))
        .route(
            "/chat_sessions/",
            get(sessions::list_sessions).post(sessions::create_session),
        )
        .route(
            "/chat_sessions/{id}/",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/chat_sessions/{id}/messages/", get(sessions::session_messages))
        .route(
            "/messages/",
            get(messages::list_messages).post(messages::send_message),
        )
        .route(
            "/messages/{id}/",
            get(messages::get_message).patch(messages::update_message),
        )
}
