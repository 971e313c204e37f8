use axum::{extract::State, Extension, Json};
use chrono::NaiveDate;

use super::{created, Created, DeleteResponse};
use crate::auth::middleware::ActingUser;
use crate::db::{is_foreign_key_violation, is_unique_violation};
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath};
use crate::models::day::{Day, DayRequest, DayView, NewDay};
use crate::models::{owned_by, Owned};
use crate::AppState;

/// How `GET /api/days/:key` addresses a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayKey {
    Id(i64),
    Date(NaiveDate),
}

impl std::str::FromStr for DayKey {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = raw.parse::<i64>() {
            return Ok(DayKey::Id(id));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(DayKey::Date)
            .map_err(|_| AppError::Validation(format!("{:?} is neither an id nor a YYYY-MM-DD date", raw)))
    }
}

fn duplicate_date(date: NaiveDate) -> AppError {
    AppError::Duplicate(format!("day {}", date))
}

pub async fn list_days(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
) -> AppResult<Json<Vec<Day>>> {
    let days = sqlx::query_as::<_, Day>(
        "SELECT * FROM days WHERE user_id = ? ORDER BY date DESC",
    )
    .bind(acting.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(days))
}

pub async fn new_day(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    AppJson(body): AppJson<DayRequest>,
) -> AppResult<Created<DayView>> {
    let new = NewDay::try_from(body)?;

    // One day per date and user; other users may log the same date.
    if Day::find_by_date(&state.db, acting.id, new.date).await?.is_some() {
        return Err(duplicate_date(new.date));
    }

    let day = Day::insert(&state.db, acting.id, &new).await.map_err(|e| {
        if is_unique_violation(&e) {
            duplicate_date(new.date)
        } else {
            e.into()
        }
    })?;

    tracing::info!(user_id = acting.id, day_id = day.id, date = %day.date, "Day created");

    Ok(created(
        state.config.resource_url("days", day.id),
        DayView {
            day,
            life_entries: Vec::new(),
        },
    ))
}

pub async fn get_day(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    AppPath(key): AppPath<String>,
) -> AppResult<Json<DayView>> {
    let day = match key.parse::<DayKey>()? {
        DayKey::Id(id) => owned_by(Day::find(&state.db, id).await?, acting.id)?,
        DayKey::Date(date) => Day::find_by_date(&state.db, acting.id, date)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No day logged for {}", date)))?,
    };

    Ok(Json(DayView::load(&state.db, day).await?))
}

pub async fn update_day(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    AppPath(id): AppPath<i64>,
    AppJson(body): AppJson<DayRequest>,
) -> AppResult<Json<DayView>> {
    let existing = owned_by(Day::find(&state.db, id).await?, acting.id)?;
    let new = NewDay::try_from(body)?;

    if new.date != existing.date
        && Day::find_by_date(&state.db, acting.id, new.date).await?.is_some()
    {
        return Err(duplicate_date(new.date));
    }

    let day = Day::update(&state.db, id, &new)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                duplicate_date(new.date)
            } else {
                AppError::from(e)
            }
        })?
        .ok_or(AppError::Missing(Day::KIND))?;

    Ok(Json(DayView::load(&state.db, day).await?))
}

pub async fn delete_day(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<DeleteResponse>> {
    owned_by(Day::find(&state.db, id).await?, acting.id)?;

    let entries = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM life_entries WHERE day_id = ?")
        .bind(id)
        .fetch_one(&state.db)
        .await?;

    if entries > 0 {
        return Err(AppError::InUse(format!("day {} has {} life entries", id, entries)));
    }

    sqlx::query("DELETE FROM days WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::InUse(format!("day {}", id))
            } else {
                e.into()
            }
        })?;

    tracing::info!(user_id = acting.id, day_id = id, "Day deleted");

    Ok(DeleteResponse::new(id))
}
