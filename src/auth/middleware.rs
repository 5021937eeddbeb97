use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::{
    db::{users, Store, User},
    AppError, AppResult,
};

use super::tokens::{TokenKeys, TokenType};

/// The user a request was authenticated as. Only present behind [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AppError::unauthorized("Authentication credentials were not provided."))
    }
}

pub async fn require_auth(
    State(store): State<Store>,
    State(keys): State<TokenKeys>,
    mut req: Request,
    next: Next,
) -> AppResult<Response> {
    let token = bearer_token(req.headers())?;
    let claims = keys.verify(token, TokenType::Access)?;

    let Some(user) = users::find(store.pool(), claims.user_id()?).await? else {
        return Err(AppError::unauthorized("User not found"));
    };

    tracing::debug!(user_id = user.id, "authenticated request");
    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> AppResult<&str> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Err(AppError::unauthorized("Authentication credentials were not provided."));
    };

    let value = value
        .to_str()
        .map_err(|_| AppError::unauthorized("Authorization header is not valid text"))?;

    match value.split_once(' ') {
        Some(("Bearer", token)) if !token.is_empty() && !token.contains(' ') => Ok(token),
        _ => Err(AppError::unauthorized(
            "Authorization header must contain two space-delimited values",
        )),
    }
}
