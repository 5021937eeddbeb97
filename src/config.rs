use std::{path::PathBuf, str::FromStr};

use crate::{AppError, AppResult};

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub bind_addr: String,

    pub jwt_secret: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
    pub bcrypt_cost: u32,

    /// Partner of every guest's welcome conversation.
    pub guest_host_user_id: Option<i64>,
    pub guest_welcome_message: String,

    pub media_root: PathBuf,
    pub avatar_max_bytes: usize,
    pub avatar_max_dimension: u32,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenv::dotenv().ok();

        let jwt_secret = dotenv::var("JWT_SECRET")
            .map_err(|_| AppError::Config("JWT_SECRET missing".into()))?;

        Ok(Config {
            database_url: dotenv::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://discourse.db?mode=rwc".to_owned()),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 16)?,
            bind_addr: dotenv::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned()),
            jwt_secret,
            access_token_minutes: parse_var("ACCESS_TOKEN_MINUTES", 5)?,
            refresh_token_days: parse_var("REFRESH_TOKEN_DAYS", 1)?,
            bcrypt_cost: parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            guest_host_user_id: match dotenv::var("GUEST_HOST_USER_ID") {
                Ok(raw) => Some(parse_value("GUEST_HOST_USER_ID", &raw)?),
                Err(_) => None,
            },
            guest_welcome_message: dotenv::var("GUEST_WELCOME_MESSAGE")
                .unwrap_or_else(|_| "Welcome to Discourse!".to_owned()),
            media_root: dotenv::var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("media")),
            avatar_max_bytes: parse_var("AVATAR_MAX_BYTES", 10 * 1024 * 1024)?,
            avatar_max_dimension: parse_var("AVATAR_MAX_DIMENSION", 8000)?,
        })
    }

    /// Defaults suitable for tests: in-memory store, cheap hashing.
    pub fn for_tests(media_root: impl Into<PathBuf>) -> Self {
        Config {
            database_url: "sqlite::memory:".to_owned(),
            db_max_connections: 1,
            bind_addr: "127.0.0.1:0".to_owned(),
            jwt_secret: "test-secret".to_owned(),
            access_token_minutes: 5,
            refresh_token_days: 1,
            bcrypt_cost: 4,
            guest_host_user_id: None,
            guest_welcome_message: "Welcome to Discourse!".to_owned(),
            media_root: media_root.into(),
            avatar_max_bytes: 10 * 1024 * 1024,
            avatar_max_dimension: 8000,
        }
    }
}

fn parse_var<T: FromStr>(key: &str, default: T) -> AppResult<T> {
    match dotenv::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> AppResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{key} has an invalid value: {raw}")))
}
