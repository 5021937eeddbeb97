use rand::Rng;
use uuid::Uuid;

use crate::{
    config::Config,
    db::{self, messages, sessions, users, NewUser, Store, User},
    profiles, validate, AppError, AppResult, FieldErrors,
};

pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const EMAIL_TAKEN: &str = "A user with that email already exists.";

const GUEST_PASSWORD_LEN: usize = 20;

/// Checks the credentials against every field rule and creates the account.
pub async fn register(
    store: &Store,
    config: &Config,
    username: Option<&str>,
    email: Option<&str>,
    password: Option<&str>,
) -> AppResult<User> {
    let mut errors = FieldErrors::new();
    validate::field(&mut errors, "username", username, validate::USERNAME_RULES);
    validate::field(&mut errors, "email", email, validate::EMAIL_RULES);
    validate::field(&mut errors, "password", password, validate::PASSWORD_RULES);

    if let Some(username) = username.filter(|_| !errors.has("username")) {
        if users::username_taken(store.pool(), username).await? {
            errors.add("username", USERNAME_TAKEN);
        }
    }
    if let Some(email) = email.filter(|_| !errors.has("email")) {
        if users::email_taken(store.pool(), email).await? {
            errors.add("email", EMAIL_TAKEN);
        }
    }
    errors.into_result()?;

    // every field is present once validation passed
    let (Some(username), Some(email), Some(password)) = (username, email, password) else {
        return Err(AppError::BadRequest("incomplete credentials".into()));
    };

    let password_hash = hash_password(password.to_owned(), config.bcrypt_cost).await?;
    let user = users::insert(
        store.pool(),
        &NewUser { username, email, password_hash: &password_hash, guest: false },
        db::now(),
    )
    .await
    .map_err(conflict_to_validation)?;

    tracing::info!(user_id = user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Provisions a guest with generated credentials and a welcome conversation
/// with the configured host. Returns the plaintext password alongside the user.
pub async fn create_guest(store: &Store, config: &Config) -> AppResult<(User, String)> {
    let host_id = config
        .guest_host_user_id
        .ok_or_else(|| AppError::Config("GUEST_HOST_USER_ID is not set".into()))?;

    let username = format!("guest_{}", &Uuid::new_v4().simple().to_string()[..8]);
    let email = format!("{username}@example.com");
    let password = random_password();

    let mut errors = FieldErrors::new();
    errors.extend("username", validate::apply(validate::USERNAME_RULES, &username));
    errors.extend("password", validate::apply(validate::PASSWORD_RULES, &password));
    errors.into_result()?;

    let password_hash = hash_password(password.clone(), config.bcrypt_cost).await?;

    let mut tx = store.begin().await?;

    let Some(host) = users::find(&mut *tx, host_id).await? else {
        return Err(AppError::Config(format!("guest host user {host_id} does not exist")));
    };

    let user = users::insert(
        &mut *tx,
        &NewUser { username: &username, email: &email, password_hash: &password_hash, guest: true },
        db::now(),
    )
    .await
    .map_err(conflict_to_validation)?;

    let session = sessions::insert(&mut *tx, db::now()).await?;
    sessions::add_participant(&mut *tx, session.id, user.id).await?;
    sessions::add_participant(&mut *tx, session.id, host.id).await?;
    messages::insert(
        &mut *tx,
        session.id,
        host.id,
        Some(&config.guest_welcome_message),
        db::now(),
    )
    .await?;

    tx.commit().await?;

    tracing::info!(user_id = user.id, session_id = session.id, "guest created");
    Ok((user, password))
}

/// `None` when the username is unknown or the password does not match.
pub async fn authenticate(store: &Store, username: &str, password: &str) -> AppResult<Option<User>> {
    let Some(user) = users::find_by_username(store.pool(), username).await? else {
        return Ok(None);
    };

    if verify_password(password.to_owned(), user.password_hash.clone()).await? {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

/// Removes the account; the store cascades to messages, memberships and tasks.
pub async fn delete_account(store: &Store, config: &Config, user: &User) -> AppResult<()> {
    if !users::delete(store.pool(), user.id).await? {
        return Err(AppError::NotFound);
    }

    if let Some(path) = &user.profile_picture {
        profiles::remove_media(config, path).await;
    }

    tracing::info!(user_id = user.id, username = %user.username, "account deleted");
    Ok(())
}

pub async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    Ok(tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??)
}

pub async fn verify_password(password: String, hash: String) -> AppResult<bool> {
    Ok(tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??)
}

fn random_password() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(GUEST_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

/// Maps a unique-constraint failure on insert back onto the offending field.
fn conflict_to_validation(err: sqlx::Error) -> AppError {
    match db::unique_violation(&err) {
        Some(message) if message.contains("users.username") => {
            AppError::Validation(FieldErrors::single("username", USERNAME_TAKEN))
        }
        Some(message) if message.contains("users.email") => {
            AppError::Validation(FieldErrors::single("email", EMAIL_TAKEN))
        }
        _ => AppError::Database(err),
    }
}
