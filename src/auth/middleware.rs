use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Basic, Authorization},
    TypedHeader,
};

use super::gate;
use crate::error::AppError;
use crate::AppState;

/// The user every protected handler acts on behalf of.
#[derive(Debug, Clone)]
pub struct ActingUser {
    pub id: i64,
    pub username: String,
}

pub async fn require_auth(
    State(state): State<AppState>,
    credentials: Option<TypedHeader<Authorization<Basic>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(basic)) = credentials.ok_or(AppError::Unauthorized)?;

    let user = match gate::authenticate(&state.db, &state.tokens, basic.username(), basic.password())
        .await
    {
        Ok(user) => user,
        Err(AppError::Unauthorized) => {
            tracing::warn!(path = %req.uri().path(), "Authentication failed");
            return Err(AppError::Unauthorized);
        }
        Err(e) => return Err(e),
    };

    req.extensions_mut().insert(ActingUser {
        id: user.id,
        username: user.username,
    });
    Ok(next.run(req).await)
}
