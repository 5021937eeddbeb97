use axum::{
    debug_handler,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::{
    auth::CurrentUser,
    db::{self, tasks, Store, Task},
    AppError, AppResult, AppState, FieldErrors,
};

const TASK_NAME_MAX: usize = 255;

#[derive(Debug, Deserialize)]
pub(crate) struct TaskRequest {
    task_name: Option<String>,
    #[serde(default, with = "double_option")]
    description: Option<Option<String>>,
}

/// Distinguishes an absent `description` from an explicit `null`.
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer).map(Some)
    }
}

fn check_name(errors: &mut FieldErrors, name: &str) {
    if name.trim().is_empty() {
        errors.add("task_name", "This field may not be blank.");
    } else if name.chars().count() > TASK_NAME_MAX {
        errors.add(
            "task_name",
            format!("Ensure this field has no more than {TASK_NAME_MAX} characters."),
        );
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tasks/", get(list_tasks).post(create_task))
        .route("/tasks/{id}/", get(get_task).patch(update_task).delete(delete_task))
}

#[debug_handler(state = AppState)]
async fn list_tasks(
    State(store): State<Store>,
    CurrentUser(me): CurrentUser,
) -> AppResult<Json<Vec<Task>>> {
    Ok(Json(tasks::for_user(store.pool(), me.id).await?))
}

/// The caller becomes the owner; any `user` in the body is ignored.
#[debug_handler(state = AppState)]
async fn create_task(
    State(store): State<Store>,
    CurrentUser(me): CurrentUser,
    Json(TaskRequest { task_name, description }): Json<TaskRequest>,
) -> AppResult<(StatusCode, Json<Task>)> {
    let mut errors = FieldErrors::new();
    match &task_name {
        Some(name) => check_name(&mut errors, name),
        None => errors.add("task_name", "This field is required."),
    }
    errors.into_result()?;

    let task_name = task_name.unwrap_or_default();
    let description = description.flatten();
    let task = tasks::insert(store.pool(), me.id, &task_name, description.as_deref(), db::now()).await?;

    Ok((StatusCode::CREATED, Json(task)))
}

#[debug_handler(state = AppState)]
async fn get_task(
    State(store): State<Store>,
    Path(id): Path<i64>,
    CurrentUser(me): CurrentUser,
) -> AppResult<Json<Task>> {
    let task = tasks::find_owned(store.pool(), id, me.id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(task))
}

#[debug_handler(state = AppState)]
async fn update_task(
    State(store): State<Store>,
    Path(id): Path<i64>,
    CurrentUser(me): CurrentUser,
    Json(TaskRequest { task_name, description }): Json<TaskRequest>,
) -> AppResult<Json<Task>> {
    let current = tasks::find_owned(store.pool(), id, me.id).await?.ok_or(AppError::NotFound)?;

    let mut errors = FieldErrors::new();
    if let Some(name) = &task_name {
        check_name(&mut errors, name);
    }
    errors.into_result()?;

    let task_name = task_name.unwrap_or(current.task_name);
    let description = description.unwrap_or(current.description);

    let task = tasks::update_owned(store.pool(), id, me.id, &task_name, description.as_deref())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(task))
}

#[debug_handler(state = AppState)]
async fn delete_task(
    State(store): State<Store>,
    Path(id): Path<i64>,
    CurrentUser(me): CurrentUser,
) -> AppResult<StatusCode> {
    if !tasks::delete_owned(store.pool(), id, me.id).await? {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}
