use axum::{debug_handler, Json};
use serde_json::{json, Value};

/// Entry point listing the browsable collections.
#[debug_handler]
pub async fn api_root() -> Json<Value> {
    Json(json!({
        "users": "/users/",
        "chat_sessions": "/chat_sessions/",
        "messages": "/messages/",
        "tasks": "/tasks/",
        "user_chats": "/user_chats/",
    }))
}
