//! Lookups that bridge users and the session directory.

use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    db::{self, messages, sessions, ChatSession, Message, Store},
    timesince::timesince,
    AppError, AppResult,
};

/// Returns the session shared by both users, creating it on first contact.
///
/// When several sessions already hold the pair, the oldest (lowest id) wins.
/// Two first-contact requests racing each other can both create a session.
pub async fn get_or_create_session(store: &Store, user_a: i64, user_b: i64) -> AppResult<ChatSession> {
    if let Some(session) = sessions::find_shared(store.pool(), user_a, user_b).await? {
        return Ok(session);
    }

    let mut tx = store.begin().await?;
    let session = sessions::insert(&mut *tx, db::now()).await?;
    sessions::add_participant(&mut *tx, session.id, user_a).await?;
    sessions::add_participant(&mut *tx, session.id, user_b).await?;
    tx.commit().await?;

    tracing::info!(session_id = session.id, user_a, user_b, "chat session created");
    Ok(session)
}

/// Messages of a session, oldest first. Unknown sessions are `NotFound`.
pub async fn list_messages(store: &Store, session_id: i64) -> AppResult<Vec<Message>> {
    if sessions::find(store.pool(), session_id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    Ok(messages::for_session(store.pool(), session_id).await?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Author {
    #[serde(rename = "self")]
    Viewer,
    #[serde(rename = "other")]
    Other,
}

/// Latest message of a session as seen by one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// `None` when another participant sent a message without text.
    pub message: Option<String>,
    /// Relative age, e.g. `"3 days"`.
    pub timestamp: String,
    #[serde(with = "time::serde::rfc3339")]
    pub exact_time: OffsetDateTime,
    pub read: bool,
    pub id: i64,
    pub sender: Author,
}

pub async fn summarize(store: &Store, session_id: i64, viewer_id: i64) -> AppResult<Option<Summary>> {
    let latest = messages::latest(store.pool(), session_id).await?;
    Ok(latest.map(|message| summary_of(&message, viewer_id, db::now())))
}

pub fn summary_of(message: &Message, viewer_id: i64, now: OffsetDateTime) -> Summary {
    let (text, sender) = if message.sender == viewer_id {
        let content = message.content.as_deref().unwrap_or_default();
        (Some(format!("You: {content}")), Author::Viewer)
    } else {
        (message.content.clone(), Author::Other)
    };

    Summary {
        message: text,
        timestamp: timesince(message.timestamp, now),
        exact_time: message.timestamp,
        read: message.read,
        id: message.id,
        sender,
    }
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use crate::db::{users, NewUser, User};

    use super::*;

    async fn user(store: &Store, name: &str) -> User {
        users::insert(
            store.pool(),
            &NewUser {
                username: name,
                email: &format!("{name}@example.com"),
                password_hash: "x",
                guest: false,
            },
            db::now(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn second_lookup_returns_same_session() {
        let store = Store::open_in_memory().await.unwrap();
        let (alice, bob) = (user(&store, "alice").await, user(&store, "bobby").await);

        let first = get_or_create_session(&store, alice.id, bob.id).await.unwrap();
        let second = get_or_create_session(&store, bob.id, alice.id).await.unwrap();
        assert_eq!(first.id, second.id);

        let members = sessions::participants(store.pool(), first.id).await.unwrap();
        assert_eq!(members.len(), 2);
    }

    #[tokio::test]
    async fn duplicate_sessions_resolve_to_oldest() {
        let store = Store::open_in_memory().await.unwrap();
        let (alice, bob) = (user(&store, "alice").await, user(&store, "bobby").await);

        let mut ids = Vec::new();
        for _ in 0..2 {
            let session = sessions::insert(store.pool(), db::now()).await.unwrap();
            sessions::add_participant(store.pool(), session.id, alice.id).await.unwrap();
            sessions::add_participant(store.pool(), session.id, bob.id).await.unwrap();
            ids.push(session.id);
        }

        let found = get_or_create_session(&store, alice.id, bob.id).await.unwrap();
        assert_eq!(found.id, ids[0]);
    }

    #[tokio::test]
    async fn messages_come_back_in_timestamp_order() {
        let store = Store::open_in_memory().await.unwrap();
        let (alice, bob) = (user(&store, "alice").await, user(&store, "bobby").await);
        let session = get_or_create_session(&store, alice.id, bob.id).await.unwrap();

        let base = db::now();
        for (offset, sender) in [(5, alice.id), (1, bob.id), (3, alice.id), (3, bob.id)] {
            messages::insert(store.pool(), session.id, sender, Some("x"), base + Duration::seconds(offset))
                .await
                .unwrap();
        }

        let log = list_messages(&store, session.id).await.unwrap();
        assert_eq!(log.len(), 4);
        assert!(log.windows(2).all(|pair| pair[0].timestamp <= pair[1].timestamp));
    }

    #[tokio::test]
    async fn deleted_session_is_not_found() {
        let store = Store::open_in_memory().await.unwrap();
        let (alice, bob) = (user(&store, "alice").await, user(&store, "bobby").await);
        let session = get_or_create_session(&store, alice.id, bob.id).await.unwrap();
        messages::insert(store.pool(), session.id, alice.id, Some("hi"), db::now()).await.unwrap();

        assert!(sessions::delete(store.pool(), session.id).await.unwrap());

        assert!(matches!(list_messages(&store, session.id).await, Err(AppError::NotFound)));
        let (orphans,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages WHERE chat_session_id=?")
            .bind(session.id)
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn summary_depends_on_viewer() {
        let store = Store::open_in_memory().await.unwrap();
        let (alice, bob) = (user(&store, "alice").await, user(&store, "bobby").await);
        let session = get_or_create_session(&store, alice.id, bob.id).await.unwrap();

        assert!(summarize(&store, session.id, alice.id).await.unwrap().is_none());

        let earlier = db::now() - Duration::hours(2);
        messages::insert(store.pool(), session.id, bob.id, Some("old"), earlier).await.unwrap();
        messages::insert(store.pool(), session.id, alice.id, Some("latest"), db::now()).await.unwrap();

        let own = summarize(&store, session.id, alice.id).await.unwrap().unwrap();
        assert_eq!(own.sender, Author::Viewer);
        assert_eq!(own.message.as_deref(), Some("You: latest"));
        assert_eq!(own.timestamp, "0 minutes");

        let theirs = summarize(&store, session.id, bob.id).await.unwrap().unwrap();
        assert_eq!(theirs.sender, Author::Other);
        assert_eq!(theirs.message.as_deref(), Some("latest"));
        assert_eq!(theirs.id, own.id);
    }

    #[tokio::test]
    async fn chatting_with_yourself_gets_a_private_session() {
        let store = Store::open_in_memory().await.unwrap();
        let (alice, bob) = (user(&store, "alice").await, user(&store, "bobby").await);
        let shared = get_or_create_session(&store, alice.id, bob.id).await.unwrap();
        messages::insert(store.pool(), shared.id, bob.id, Some("to alice"), db::now()).await.unwrap();

        let own = get_or_create_session(&store, alice.id, alice.id).await.unwrap();
        assert_ne!(own.id, shared.id);
        let members = sessions::participants(store.pool(), own.id).await.unwrap();
        assert_eq!(members.iter().map(|u| u.id).collect::<Vec<_>>(), [alice.id]);
        assert!(list_messages(&store, own.id).await.unwrap().is_empty());

        let again = get_or_create_session(&store, alice.id, alice.id).await.unwrap();
        assert_eq!(again.id, own.id);
        let found = get_or_create_session(&store, bob.id, alice.id).await.unwrap();
        assert_eq!(found.id, shared.id);
    }

    #[test]
    fn empty_content_from_others_has_no_text() {
        let at = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let message = Message {
            id: 4,
            chat_session: 1,
            sender: 5,
            content: None,
            timestamp: at,
            read: false,
        };
        let json = serde_json::to_value(summary_of(&message, 2, at)).unwrap();
        assert_eq!(json["sender"], "other");
        assert_eq!(json["message"], serde_json::Value::Null);
    }

    #[test]
    fn summary_serializes_labels() {
        let at = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let message = Message {
            id: 3,
            chat_session: 1,
            sender: 2,
            content: None,
            timestamp: at,
            read: true,
        };
        let json = serde_json::to_value(summary_of(&message, 2, at + Duration::days(3))).unwrap();
        assert_eq!(json["sender"], "self");
        assert_eq!(json["timestamp"], "3 days");
        assert_eq!(json["message"], "You: ");
        assert_eq!(json["read"], true);
    }
}
