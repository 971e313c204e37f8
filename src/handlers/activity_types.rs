use axum::{extract::State, Extension, Json};

use super::{created, Created, DeleteResponse};
use crate::auth::middleware::ActingUser;
use crate::db::is_foreign_key_violation;
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath};
use crate::models::activity_type::{ActivityType, ActivityTypeRequest, NewActivityType};
use crate::models::{owned_by, Owned};
use crate::AppState;

pub async fn list_activity_types(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
) -> AppResult<Json<Vec<ActivityType>>> {
    let types = sqlx::query_as::<_, ActivityType>(
        "SELECT * FROM activity_types WHERE user_id = ? ORDER BY name ASC, id ASC",
    )
    .bind(acting.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(types))
}

/// Case-insensitive substring match on the name, caller's rows only.
pub async fn search_activity_types(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    AppPath(term): AppPath<String>,
) -> AppResult<Json<Vec<ActivityType>>> {
    let types = sqlx::query_as::<_, ActivityType>(
        r#"
        SELECT * FROM activity_types
        WHERE user_id = ? AND instr(lower(name), lower(?)) > 0
        ORDER BY name ASC, id ASC
        "#,
    )
    .bind(acting.id)
    .bind(&term)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(types))
}

pub async fn new_activity_type(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    AppJson(body): AppJson<ActivityTypeRequest>,
) -> AppResult<Created<ActivityType>> {
    let new = NewActivityType::try_from(body)?;
    let activity_type = ActivityType::insert(&state.db, acting.id, &new).await?;

    tracing::info!(
        user_id = acting.id,
        activity_type_id = activity_type.id,
        "Activity type created"
    );

    Ok(created(
        state.config.resource_url("activity_types", activity_type.id),
        activity_type,
    ))
}

pub async fn get_activity_type(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<ActivityType>> {
    let activity_type = owned_by(ActivityType::find(&state.db, id).await?, acting.id)?;
    Ok(Json(activity_type))
}

pub async fn update_activity_type(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    AppPath(id): AppPath<i64>,
    AppJson(body): AppJson<ActivityTypeRequest>,
) -> AppResult<Json<ActivityType>> {
    owned_by(ActivityType::find(&state.db, id).await?, acting.id)?;
    let new = NewActivityType::try_from(body)?;

    let activity_type = ActivityType::update(&state.db, id, &new)
        .await?
        .ok_or(AppError::Missing(ActivityType::KIND))?;

    Ok(Json(activity_type))
}

pub async fn delete_activity_type(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<DeleteResponse>> {
    owned_by(ActivityType::find(&state.db, id).await?, acting.id)?;

    let in_use = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM activities WHERE activity_type_id = ?",
    )
    .bind(id)
    .fetch_one(&state.db)
    .await?;

    if in_use > 0 {
        return Err(AppError::InUse(format!(
            "activity type {} has {} activities",
            id, in_use
        )));
    }

    sqlx::query("DELETE FROM activity_types WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::InUse(format!("activity type {}", id))
            } else {
                e.into()
            }
        })?;

    tracing::info!(user_id = acting.id, activity_type_id = id, "Activity type deleted");

    Ok(DeleteResponse::new(id))
}
