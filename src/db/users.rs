use sqlx::{sqlite::SqliteRow, FromRow, Row, SqliteExecutor};
use time::OffsetDateTime;

use super::{from_micros, to_micros};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    /// Path relative to the media root.
    pub profile_picture: Option<String>,
    pub guest: bool,
    pub date_joined: OffsetDateTime,
}

impl FromRow<'_, SqliteRow> for User {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        Ok(User {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            profile_picture: row.try_get("profile_picture")?,
            guest: row.try_get("guest")?,
            date_joined: from_micros(row.try_get("date_joined")?)?,
        })
    }
}

pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub guest: bool,
}

pub async fn insert(
    db: impl SqliteExecutor<'_>,
    new: &NewUser<'_>,
    at: OffsetDateTime,
) -> sqlx::Result<User> {
    sqlx::query_as(
        "INSERT INTO users (username,email,password_hash,guest,date_joined) VALUES (?,?,?,?,?)
         RETURNING id,username,email,password_hash,profile_picture,guest,date_joined",
    )
    .bind(new.username)
    .bind(new.email)
    .bind(new.password_hash)
    .bind(new.guest)
    .bind(to_micros(at))
    .fetch_one(db)
    .await
}

pub async fn find(db: impl SqliteExecutor<'_>, id: i64) -> sqlx::Result<Option<User>> {
    sqlx::query_as(
        "SELECT id,username,email,password_hash,profile_picture,guest,date_joined FROM users WHERE id=?",
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn find_by_username(
    db: impl SqliteExecutor<'_>,
    username: &str,
) -> sqlx::Result<Option<User>> {
    sqlx::query_as(
        "SELECT id,username,email,password_hash,profile_picture,guest,date_joined FROM users WHERE username=?",
    )
    .bind(username)
    .fetch_optional(db)
    .await
}

pub async fn list(db: impl SqliteExecutor<'_>) -> sqlx::Result<Vec<User>> {
    sqlx::query_as(
        "SELECT id,username,email,password_hash,profile_picture,guest,date_joined FROM users ORDER BY id",
    )
    .fetch_all(db)
    .await
}

pub async fn username_taken(db: impl SqliteExecutor<'_>, username: &str) -> sqlx::Result<bool> {
    Ok(sqlx::query("SELECT 1 FROM users WHERE username=?")
        .bind(username)
        .fetch_optional(db)
        .await?
        .is_some())
}

pub async fn email_taken(db: impl SqliteExecutor<'_>, email: &str) -> sqlx::Result<bool> {
    Ok(sqlx::query("SELECT 1 FROM users WHERE email=?")
        .bind(email)
        .fetch_optional(db)
        .await?
        .is_some())
}

pub async fn rename(
    db: impl SqliteExecutor<'_>,
    id: i64,
    username: &str,
) -> sqlx::Result<Option<User>> {
    sqlx::query_as(
        "UPDATE users SET username=? WHERE id=?
         RETURNING id,username,email,password_hash,profile_picture,guest,date_joined",
    )
    .bind(username)
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn set_profile_picture(
    db: impl SqliteExecutor<'_>,
    id: i64,
    path: Option<&str>,
) -> sqlx::Result<Option<User>> {
    sqlx::query_as(
        "UPDATE users SET profile_picture=? WHERE id=?
         RETURNING id,username,email,password_hash,profile_picture,guest,date_joined",
    )
    .bind(path)
    .bind(id)
    .fetch_optional(db)
    .await
}

/// Cascades to sent messages, session memberships and tasks.
pub async fn delete(db: impl SqliteExecutor<'_>, id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id=?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
