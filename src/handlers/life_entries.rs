use axum::{extract::State, Extension, Json};

use super::{created, Created, DeleteResponse};
use crate::auth::middleware::ActingUser;
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath};
use crate::models::day::Day;
use crate::models::life_entry::{LifeEntry, LifeEntryRequest, LifeEntryView, NewLifeEntry};
use crate::models::{owned_by, parent_owned_by, Owned};
use crate::AppState;

pub async fn list_life_entries(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
) -> AppResult<Json<Vec<LifeEntry>>> {
    let entries = sqlx::query_as::<_, LifeEntry>(
        r#"
        SELECT life_entries.* FROM life_entries
        JOIN days ON days.id = life_entries.day_id
        WHERE life_entries.user_id = ?
        ORDER BY days.date ASC, life_entries.start_time ASC, life_entries.id ASC
        "#,
    )
    .bind(acting.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(entries))
}

pub async fn new_life_entry(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    AppJson(body): AppJson<LifeEntryRequest>,
) -> AppResult<Created<LifeEntryView>> {
    let new = NewLifeEntry::try_from(body)?;
    parent_owned_by(Day::find(&state.db, new.day_id).await?, acting.id, new.day_id)?;

    let entry = LifeEntry::insert(&state.db, acting.id, &new).await?;

    tracing::info!(
        user_id = acting.id,
        life_entry_id = entry.id,
        day_id = entry.day_id,
        "Life entry created"
    );

    Ok(created(
        state.config.resource_url("life_entries", entry.id),
        LifeEntryView {
            entry,
            life_entry_activities: Vec::new(),
        },
    ))
}

pub async fn get_life_entry(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<LifeEntryView>> {
    let entry = owned_by(LifeEntry::find(&state.db, id).await?, acting.id)?;
    Ok(Json(LifeEntryView::load(&state.db, entry).await?))
}

pub async fn update_life_entry(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    AppPath(id): AppPath<i64>,
    AppJson(body): AppJson<LifeEntryRequest>,
) -> AppResult<Json<LifeEntryView>> {
    owned_by(LifeEntry::find(&state.db, id).await?, acting.id)?;
    let new = NewLifeEntry::try_from(body)?;
    parent_owned_by(Day::find(&state.db, new.day_id).await?, acting.id, new.day_id)?;

    let entry = LifeEntry::update(&state.db, id, &new)
        .await?
        .ok_or(AppError::Missing(LifeEntry::KIND))?;

    Ok(Json(LifeEntryView::load(&state.db, entry).await?))
}

/// Deletes the entry together with its life entry activities.
pub async fn delete_life_entry(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<DeleteResponse>> {
    owned_by(LifeEntry::find(&state.db, id).await?, acting.id)?;

    let mut tx = state.db.begin().await?;

    let removed = sqlx::query("DELETE FROM life_entry_activities WHERE life_entry_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    sqlx::query("DELETE FROM life_entries WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(
        user_id = acting.id,
        life_entry_id = id,
        life_entry_activities = removed,
        "Life entry deleted"
    );

    Ok(DeleteResponse::new(id))
}
