use sqlx::{sqlite::SqliteRow, FromRow, Row, SqliteExecutor};
use time::OffsetDateTime;

use super::{from_micros, to_micros, User};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSession {
    pub id: i64,
    pub created_at: OffsetDateTime,
}

impl FromRow<'_, SqliteRow> for ChatSession {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        Ok(ChatSession {
            id: row.try_get("id")?,
            created_at: from_micros(row.try_get("created_at")?)?,
        })
    }
}

pub async fn insert(db: impl SqliteExecutor<'_>, at: OffsetDateTime) -> sqlx::Result<ChatSession> {
    sqlx::query_as("INSERT INTO chat_sessions (created_at) VALUES (?) RETURNING id,created_at")
        .bind(to_micros(at))
        .fetch_one(db)
        .await
}

pub async fn add_participant(
    db: impl SqliteExecutor<'_>,
    session_id: i64,
    user_id: i64,
) -> sqlx::Result<()> {
    sqlx::query("INSERT OR IGNORE INTO chat_session_participants (chat_session_id,user_id) VALUES (?,?)")
        .bind(session_id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn find(db: impl SqliteExecutor<'_>, id: i64) -> sqlx::Result<Option<ChatSession>> {
    sqlx::query_as("SELECT id,created_at FROM chat_sessions WHERE id=?")
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Lowest-id session whose participants include both users. When both ids are
/// the same user only a session holding that user alone matches.
pub async fn find_shared(
    db: impl SqliteExecutor<'_>,
    user_a: i64,
    user_b: i64,
) -> sqlx::Result<Option<ChatSession>> {
    sqlx::query_as(
        "SELECT s.id,s.created_at FROM chat_sessions s
         WHERE EXISTS (SELECT 1 FROM chat_session_participants p WHERE p.chat_session_id=s.id AND p.user_id=?)
           AND EXISTS (SELECT 1 FROM chat_session_participants p WHERE p.chat_session_id=s.id AND p.user_id=?)
           AND (? <> ? OR (SELECT COUNT(*) FROM chat_session_participants p WHERE p.chat_session_id=s.id)=1)
         ORDER BY s.id
         LIMIT 1",
    )
    .bind(user_a)
    .bind(user_b)
    .bind(user_a)
    .bind(user_b)
    .fetch_optional(db)
    .await
}

pub async fn for_user(db: impl SqliteExecutor<'_>, user_id: i64) -> sqlx::Result<Vec<ChatSession>> {
    sqlx::query_as(
        "SELECT s.id,s.created_at FROM chat_sessions s
         JOIN chat_session_participants p ON p.chat_session_id=s.id
         WHERE p.user_id=?
         ORDER BY s.id",
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn participants(db: impl SqliteExecutor<'_>, session_id: i64) -> sqlx::Result<Vec<User>> {
    sqlx::query_as(
        "SELECT u.id,u.username,u.email,u.password_hash,u.profile_picture,u.guest,u.date_joined
         FROM users u
         JOIN chat_session_participants p ON p.user_id=u.id
         WHERE p.chat_session_id=?
         ORDER BY u.id",
    )
    .bind(session_id)
    .fetch_all(db)
    .await
}

pub async fn is_participant(
    db: impl SqliteExecutor<'_>,
    session_id: i64,
    user_id: i64,
) -> sqlx::Result<bool> {
    Ok(
        sqlx::query("SELECT 1 FROM chat_session_participants WHERE chat_session_id=? AND user_id=?")
            .bind(session_id)
            .bind(user_id)
            .fetch_optional(db)
            .await?
            .is_some(),
    )
}

/// Cascades to the session's messages and participant rows.
pub async fn delete(db: impl SqliteExecutor<'_>, id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM chat_sessions WHERE id=?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
