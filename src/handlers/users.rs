use axum::{extract::State, Extension, Json};
use validator::Validate;

use super::{created, Created};
use crate::auth::{gate, middleware::ActingUser, password::hash_password};
use crate::db::is_unique_violation;
use crate::error::{required, AppError, AppResult};
use crate::extract::{AppJson, AppPath};
use crate::models::user::{
    AuthenticateRequest, AuthenticateResponse, NewUserRequest, TokenResponse, User, UserResponse,
};
use crate::AppState;

pub async fn new_user(
    State(state): State<AppState>,
    AppJson(body): AppJson<NewUserRequest>,
) -> AppResult<Created<UserResponse>> {
    body.validate()?;
    let username = required(body.username, "username")?;
    let password = required(body.password, "password")?;

    if User::find_by_username(&state.db, &username).await?.is_some() {
        return Err(AppError::Duplicate(format!("username {}", username)));
    }

    let password_hash = hash_password(&password)?;
    let user = User::insert(&state.db, &username, &password_hash)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Duplicate(format!("username {}", username))
            } else {
                e.into()
            }
        })?;

    tracing::info!(user_id = user.id, "User registered");

    Ok(created(
        state.config.resource_url("users", user.id),
        UserResponse {
            username: user.username,
        },
    ))
}

pub async fn get_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<UserResponse>> {
    let user = User::find(&state.db, id)
        .await?
        .ok_or(AppError::Missing("user"))?;

    Ok(Json(UserResponse {
        username: user.username,
    }))
}

pub async fn get_auth_token(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
) -> AppResult<Json<TokenResponse>> {
    let ttl = state.config.token_ttl_secs;
    let token = state.tokens.issue(acting.id, ttl)?;

    tracing::info!(user_id = acting.id, username = %acting.username, ttl, "Token issued");

    Ok(Json(TokenResponse {
        token,
        duration: ttl,
    }))
}

/// Checks credentials without opening a session: `1` if they are valid.
pub async fn authenticate(
    State(state): State<AppState>,
    AppJson(body): AppJson<AuthenticateRequest>,
) -> AppResult<Json<AuthenticateResponse>> {
    let username = required(body.username, "username")?;
    let password = body.password.unwrap_or_default();

    let authenticate_result =
        match gate::authenticate(&state.db, &state.tokens, &username, &password).await {
            Ok(_) => 1,
            Err(AppError::Unauthorized) => 0,
            Err(e) => return Err(e),
        };

    Ok(Json(AuthenticateResponse {
        authenticate_result,
    }))
}
