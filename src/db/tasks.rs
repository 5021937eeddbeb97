use serde::Serialize;
use sqlx::{sqlite::SqliteRow, FromRow, Row, SqliteExecutor};
use time::OffsetDateTime;

use super::{from_micros, to_micros};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: i64,
    pub user: i64,
    pub task_name: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl FromRow<'_, SqliteRow> for Task {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        Ok(Task {
            id: row.try_get("id")?,
            user: row.try_get("user_id")?,
            task_name: row.try_get("task_name")?,
            description: row.try_get("description")?,
            created_at: from_micros(row.try_get("created_at")?)?,
        })
    }
}

pub async fn insert(
    db: impl SqliteExecutor<'_>,
    user_id: i64,
    task_name: &str,
    description: Option<&str>,
    at: OffsetDateTime,
) -> sqlx::Result<Task> {
    sqlx::query_as(
        "INSERT INTO tasks (user_id,task_name,description,created_at) VALUES (?,?,?,?)
         RETURNING id,user_id,task_name,description,created_at",
    )
    .bind(user_id)
    .bind(task_name)
    .bind(description)
    .bind(to_micros(at))
    .fetch_one(db)
    .await
}

pub async fn find_owned(
    db: impl SqliteExecutor<'_>,
    id: i64,
    user_id: i64,
) -> sqlx::Result<Option<Task>> {
    sqlx::query_as(
        "SELECT id,user_id,task_name,description,created_at FROM tasks WHERE id=? AND user_id=?",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
}

pub async fn for_user(db: impl SqliteExecutor<'_>, user_id: i64) -> sqlx::Result<Vec<Task>> {
    sqlx::query_as(
        "SELECT id,user_id,task_name,description,created_at FROM tasks WHERE user_id=? ORDER BY id",
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn update_owned(
    db: impl SqliteExecutor<'_>,
    id: i64,
    user_id: i64,
    task_name: &str,
    description: Option<&str>,
) -> sqlx::Result<Option<Task>> {
    sqlx::query_as(
        "UPDATE tasks SET task_name=?, description=? WHERE id=? AND user_id=?
         RETURNING id,user_id,task_name,description,created_at",
    )
    .bind(task_name)
    .bind(description)
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
}

pub async fn delete_owned(db: impl SqliteExecutor<'_>, id: i64, user_id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM tasks WHERE id=? AND user_id=?")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
