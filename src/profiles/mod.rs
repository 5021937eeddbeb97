mod avatar;
mod users;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::{config::Config, db::User, AppState};

pub(crate) use avatar::remove_media;

/// Public face of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: i64,
    pub username: String,
    /// `/media/...` URL of the avatar.
    pub profile_picture: Option<String>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        UserView {
            id: user.id,
            username: user.username.clone(),
            profile_picture: user
                .profile_picture
                .as_ref()
                .map(|path| format!("/media/{path}")),
        }
    }
}

pub fn router(config: &Config) -> Router<AppState> {
    // leave headroom so oversized images reach our own size check
    let upload_limit = config.avatar_max_bytes.saturating_mul(2).saturating_add(64 * 1024);

    Router::new()
        .route("/users/", get(users::list_users))
        .route(
            "/users/{id}/",
            get(users::get_user).patch(users::update_user).delete(users::delete_user),
        )
        .route("/delete-account/", delete(users::delete_account))
        .route(
            "/upload_profile_picture/",
            post(avatar::upload_profile_picture).layer(DefaultBodyLimit::max(upload_limit)),
        )
}
