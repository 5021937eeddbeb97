use serde::Serialize;
use sqlx::{sqlite::SqliteRow, FromRow, Row, SqliteExecutor};
use time::OffsetDateTime;

use super::{from_micros, to_micros};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: i64,
    pub chat_session: i64,
    pub sender: i64,
    pub content: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub read: bool,
}

impl FromRow<'_, SqliteRow> for Message {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        Ok(Message {
            id: row.try_get("id")?,
            chat_session: row.try_get("chat_session_id")?,
            sender: row.try_get("sender_id")?,
            content: row.try_get("content")?,
            timestamp: from_micros(row.try_get("timestamp")?)?,
            read: row.try_get("read")?,
        })
    }
}

pub async fn insert(
    db: impl SqliteExecutor<'_>,
    session_id: i64,
    sender_id: i64,
    content: Option<&str>,
    at: OffsetDateTime,
) -> sqlx::Result<Message> {
    sqlx::query_as(
        "INSERT INTO messages (chat_session_id,sender_id,content,timestamp,read) VALUES (?,?,?,?,0)
         RETURNING id,chat_session_id,sender_id,content,timestamp,read",
    )
    .bind(session_id)
    .bind(sender_id)
    .bind(content)
    .bind(to_micros(at))
    .fetch_one(db)
    .await
}

pub async fn find(db: impl SqliteExecutor<'_>, id: i64) -> sqlx::Result<Option<Message>> {
    sqlx::query_as("SELECT id,chat_session_id,sender_id,content,timestamp,read FROM messages WHERE id=?")
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Oldest first; messages sharing a timestamp keep insertion order.
pub async fn for_session(db: impl SqliteExecutor<'_>, session_id: i64) -> sqlx::Result<Vec<Message>> {
    sqlx::query_as(
        "SELECT id,chat_session_id,sender_id,content,timestamp,read FROM messages
         WHERE chat_session_id=?
         ORDER BY timestamp ASC, id ASC",
    )
    .bind(session_id)
    .fetch_all(db)
    .await
}

pub async fn latest(db: impl SqliteExecutor<'_>, session_id: i64) -> sqlx::Result<Option<Message>> {
    sqlx::query_as(
        "SELECT id,chat_session_id,sender_id,content,timestamp,read FROM messages
         WHERE chat_session_id=?
         ORDER BY timestamp DESC, id DESC
         LIMIT 1",
    )
    .bind(session_id)
    .fetch_optional(db)
    .await
}

/// Messages from every session `user_id` takes part in.
pub async fn visible_to(db: impl SqliteExecutor<'_>, user_id: i64) -> sqlx::Result<Vec<Message>> {
    sqlx::query_as(
        "SELECT m.id,m.chat_session_id,m.sender_id,m.content,m.timestamp,m.read FROM messages m
         JOIN chat_session_participants p ON p.chat_session_id=m.chat_session_id
         WHERE p.user_id=?
         ORDER BY m.timestamp ASC, m.id ASC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn set_read(
    db: impl SqliteExecutor<'_>,
    id: i64,
    read: bool,
) -> sqlx::Result<Option<Message>> {
    sqlx::query_as(
        "UPDATE messages SET read=? WHERE id=?
         RETURNING id,chat_session_id,sender_id,content,timestamp,read",
    )
    .bind(read)
    .bind(id)
    .fetch_optional(db)
    .await
}
