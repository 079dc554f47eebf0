//! User directory - Users that own orders, and the API tokens they authenticate with.
//!
//! Each user holds at most one token. Tokens are 40 random alphanumeric
//! characters, issued by the `create-user` admin command.

use crate::{
    entities::{AuthToken, User, auth_token, user},
    errors::{Error, Result},
};
use rand::{Rng, distributions::Alphanumeric};
use sea_orm::{Set, prelude::*};
use tracing::{info, instrument};

/// Length of an issued token key
pub const TOKEN_LEN: usize = 40;

/// Creates an active user.
///
/// # Errors
/// Returns an error if the username is blank or already taken.
#[instrument(skip(db))]
pub async fn create_user<C: ConnectionTrait>(
    db: &C,
    username: &str,
    email: &str,
) -> Result<user::Model> {
    let username = username.trim();
    if username.is_empty() {
        return Err(Error::Validation {
            message: "Username cannot be empty".to_string(),
        });
    }
    if get_user_by_username(db, username).await?.is_some() {
        return Err(Error::Validation {
            message: format!("A user named '{username}' already exists"),
        });
    }

    let user = user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(email.trim().to_string()),
        is_active: Set(true),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };
    let user = user.insert(db).await?;
    info!("Created user {} ({})", user.id, user.username);
    Ok(user)
}

/// Retrieves a user by id.
pub async fn get_user_by_id<C: ConnectionTrait>(db: &C, user_id: i64) -> Result<Option<user::Model>> {
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Retrieves a user by username.
pub async fn get_user_by_username<C: ConnectionTrait>(
    db: &C,
    username: &str,
) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await
        .map_err(Into::into)
}

fn generate_token_key() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Returns the user's token, issuing one if the user has none yet.
///
/// # Errors
/// Returns `UserNotFound` if the user does not exist.
#[instrument(skip(db))]
pub async fn get_or_create_token<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
) -> Result<auth_token::Model> {
    get_user_by_id(db, user_id)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            id: user_id.to_string(),
        })?;

    if let Some(existing) = AuthToken::find()
        .filter(auth_token::Column::UserId.eq(user_id))
        .one(db)
        .await?
    {
        return Ok(existing);
    }

    let token = auth_token::ActiveModel {
        key: Set(generate_token_key()),
        user_id: Set(user_id),
        created_at: Set(chrono::Utc::now().naive_utc()),
    };
    let token = token.insert(db).await?;
    info!("Issued API token for user {}", user_id);
    Ok(token)
}

/// Resolves a token key to its active owner.
///
/// # Errors
/// Returns `Unauthorized` for an unknown key or an inactive user.
pub async fn authenticate_token<C: ConnectionTrait>(db: &C, key: &str) -> Result<user::Model> {
    let found = AuthToken::find_by_id(key.to_string())
        .find_also_related(User)
        .one(db)
        .await?;

    match found {
        Some((_, Some(user))) if user.is_active => Ok(user),
        Some((_, Some(_))) => Err(Error::Unauthorized {
            message: "User inactive or deleted.".to_string(),
        }),
        _ => Err(Error::Unauthorized {
            message: "Invalid token.".to_string(),
        }),
    }
}
