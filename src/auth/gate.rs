use sqlx::SqlitePool;

use super::password::verify_password;
use super::token::TokenService;
use crate::error::{AppError, AppResult};
use crate::models::user::User;

/// Resolves HTTP Basic credentials to a user.
///
/// `credential` is tried as a token first. If that fails it is treated as a
/// username and `secret` must match the stored password hash.
pub async fn authenticate(
    db: &SqlitePool,
    tokens: &TokenService,
    credential: &str,
    secret: &str,
) -> AppResult<User> {
    if let Some(user_id) = tokens.verify(credential) {
        if let Some(user) = User::find(db, user_id).await? {
            return Ok(user);
        }
    }

    let user = User::find_by_username(db, credential)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !verify_password(secret, &user.password_hash)? {
        return Err(AppError::Unauthorized);
    }

    Ok(user)
}
