use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};

use super::life_entry_activity::{LifeEntryActivity, LifeEntryActivityView};
use super::Owned;
use crate::error::{required, AppError};
use crate::time_format;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LifeEntry {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub created_date: DateTime<Utc>,
    pub day_id: i64,
    #[serde(with = "time_format")]
    pub start_time: NaiveTime,
    #[serde(with = "time_format::option")]
    pub end_time: Option<NaiveTime>,
}

impl Owned for LifeEntry {
    const KIND: &'static str = "life entry";

    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

#[derive(Debug, Serialize)]
pub struct LifeEntryView {
    #[serde(flatten)]
    pub entry: LifeEntry,
    pub life_entry_activities: Vec<LifeEntryActivityView>,
}

impl LifeEntryView {
    pub async fn load(db: &SqlitePool, entry: LifeEntry) -> sqlx::Result<Self> {
        let rows = sqlx::query_as::<_, LifeEntryActivity>(
            "SELECT * FROM life_entry_activities WHERE life_entry_id = ? ORDER BY id ASC",
        )
        .bind(entry.id)
        .fetch_all(db)
        .await?;

        let mut life_entry_activities = Vec::with_capacity(rows.len());
        for row in rows {
            life_entry_activities.push(LifeEntryActivityView::load(db, row).await?);
        }

        Ok(Self {
            entry,
            life_entry_activities,
        })
    }
}

/// Body of POST and PUT /api/life_entries. Times are `HH:MM:SS`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LifeEntryRequest {
    pub day_id: Option<i64>,
    #[serde(default, with = "time_format::option")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "time_format::option")]
    pub end_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLifeEntry {
    pub day_id: i64,
    pub start_time: NaiveTime,
    pub end_time: Option<NaiveTime>,
}

impl TryFrom<LifeEntryRequest> for NewLifeEntry {
    type Error = AppError;

    fn try_from(body: LifeEntryRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            day_id: required(body.day_id, "day_id")?,
            start_time: required(body.start_time, "start_time")?,
            end_time: body.end_time,
        })
    }
}

impl LifeEntry {
    pub async fn find<'e, E>(db: E, id: i64) -> sqlx::Result<Option<Self>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, LifeEntry>("SELECT * FROM life_entries WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn insert<'e, E>(db: E, user_id: i64, new: &NewLifeEntry) -> sqlx::Result<Self>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, LifeEntry>(
            r#"
            INSERT INTO life_entries (user_id, created_date, day_id, start_time, end_time)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(Utc::now())
        .bind(new.day_id)
        .bind(new.start_time)
        .bind(new.end_time)
        .fetch_one(db)
        .await
    }

    pub async fn update<'e, E>(db: E, id: i64, new: &NewLifeEntry) -> sqlx::Result<Option<Self>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, LifeEntry>(
            r#"
            UPDATE life_entries SET
                day_id = ?,
                start_time = ?,
                end_time = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(new.day_id)
        .bind(new.start_time)
        .bind(new.end_time)
        .bind(id)
        .fetch_optional(db)
        .await
    }
}
