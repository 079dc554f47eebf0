//! Token authentication for every API route.
//!
//! Callers send `Authorization: Token <key>` (`Bearer <key>` is accepted too).
//! The key must belong to an active user; otherwise the request is answered
//! with 401 before any handler runs.

use crate::{
    api::AppState,
    core::users,
    entities::user,
    errors::{Error, Result},
};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use tracing::debug;

/// The user a request was authenticated as, stored in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub user::Model);

fn unauthorized(message: &str) -> Error {
    Error::Unauthorized {
        message: message.to_string(),
    }
}

/// Extracts the token key from the `Authorization` header.
///
/// # Errors
/// Returns `Error::Unauthorized` when the header is absent, uses another
/// scheme, or does not hold exactly one key.
pub fn token_from_headers(headers: &HeaderMap) -> Result<String> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Err(unauthorized("Authentication credentials were not provided."));
    };
    let value = value
        .to_str()
        .map_err(|_| unauthorized("Invalid token header. Token string should not contain invalid characters."))?;

    let mut parts = value.split_whitespace();
    let scheme = parts.next().unwrap_or_default();
    if !scheme.eq_ignore_ascii_case("token") && !scheme.eq_ignore_ascii_case("bearer") {
        return Err(unauthorized("Authentication credentials were not provided."));
    }

    match (parts.next(), parts.next()) {
        (Some(key), None) => Ok(key.to_string()),
        (None, _) => Err(unauthorized("Invalid token header. No credentials provided.")),
        (Some(_), Some(_)) => Err(unauthorized(
            "Invalid token header. Token string should not contain spaces.",
        )),
    }
}

/// Middleware rejecting requests without a valid token.
pub async fn require_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let key = token_from_headers(request.headers())?;
    let user = users::authenticate_token(state.db.as_ref(), &key).await?;
    debug!("Authenticated request as {}", user.username);

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}
