use axum::{extract::State, Extension, Json};

use super::{created, Created, DeleteResponse};
use crate::auth::middleware::ActingUser;
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath};
use crate::models::activity::Activity;
use crate::models::life_entry::LifeEntry;
use crate::models::life_entry_activity::{
    LifeEntryActivity, LifeEntryActivityRequest, LifeEntryActivityView, NewLifeEntryActivity,
};
use crate::models::{owned_by, parent_owned_by, Owned};
use crate::AppState;

/// Both referenced rows must exist and belong to the acting user.
async fn check_parents(state: &AppState, user_id: i64, new: &NewLifeEntryActivity) -> AppResult<()> {
    parent_owned_by(
        LifeEntry::find(&state.db, new.life_entry_id).await?,
        user_id,
        new.life_entry_id,
    )?;
    parent_owned_by(
        Activity::find(&state.db, new.activity_id).await?,
        user_id,
        new.activity_id,
    )?;
    Ok(())
}

pub async fn list_life_entry_activities(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
) -> AppResult<Json<Vec<LifeEntryActivity>>> {
    let rows = sqlx::query_as::<_, LifeEntryActivity>(
        "SELECT * FROM life_entry_activities WHERE user_id = ? ORDER BY life_entry_id ASC, id ASC",
    )
    .bind(acting.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows))
}

pub async fn new_life_entry_activity(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    AppJson(body): AppJson<LifeEntryActivityRequest>,
) -> AppResult<Created<LifeEntryActivityView>> {
    let new = NewLifeEntryActivity::try_from(body)?;
    check_parents(&state, acting.id, &new).await?;

    let row = LifeEntryActivity::insert(&state.db, acting.id, &new).await?;

    tracing::info!(
        user_id = acting.id,
        life_entry_activity_id = row.id,
        life_entry_id = row.life_entry_id,
        "Life entry activity created"
    );

    let location = state.config.resource_url("life_entry_activities", row.id);
    Ok(created(location, LifeEntryActivityView::load(&state.db, row).await?))
}

pub async fn get_life_entry_activity(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<LifeEntryActivityView>> {
    let row = owned_by(LifeEntryActivity::find(&state.db, id).await?, acting.id)?;
    Ok(Json(LifeEntryActivityView::load(&state.db, row).await?))
}

pub async fn update_life_entry_activity(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    AppPath(id): AppPath<i64>,
    AppJson(body): AppJson<LifeEntryActivityRequest>,
) -> AppResult<Json<LifeEntryActivityView>> {
    owned_by(LifeEntryActivity::find(&state.db, id).await?, acting.id)?;
    let new = NewLifeEntryActivity::try_from(body)?;
    check_parents(&state, acting.id, &new).await?;

    let row = LifeEntryActivity::update(&state.db, id, &new)
        .await?
        .ok_or(AppError::Missing(LifeEntryActivity::KIND))?;

    Ok(Json(LifeEntryActivityView::load(&state.db, row).await?))
}

pub async fn delete_life_entry_activity(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<DeleteResponse>> {
    owned_by(LifeEntryActivity::find(&state.db, id).await?, acting.id)?;

    sqlx::query("DELETE FROM life_entry_activities WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    tracing::info!(user_id = acting.id, life_entry_activity_id = id, "Life entry activity deleted");

    Ok(DeleteResponse::new(id))
}
