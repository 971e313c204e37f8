use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use validator::Validate;

use super::life_entry::{LifeEntry, LifeEntryView};
use super::Owned;
use crate::error::{required, AppError};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Day {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub created_date: DateTime<Utc>,
    pub date: NaiveDate,
    pub note: Option<String>,
}

impl Owned for Day {
    const KIND: &'static str = "day";

    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

/// A day with its life entries (and their activities) inlined.
#[derive(Debug, Serialize)]
pub struct DayView {
    #[serde(flatten)]
    pub day: Day,
    pub life_entries: Vec<LifeEntryView>,
}

impl DayView {
    pub async fn load(db: &SqlitePool, day: Day) -> sqlx::Result<Self> {
        let entries = sqlx::query_as::<_, LifeEntry>(
            "SELECT * FROM life_entries WHERE day_id = ? ORDER BY start_time ASC, id ASC",
        )
        .bind(day.id)
        .fetch_all(db)
        .await?;

        let mut life_entries = Vec::with_capacity(entries.len());
        for entry in entries {
            life_entries.push(LifeEntryView::load(db, entry).await?);
        }

        Ok(Self { day, life_entries })
    }
}

/// Body of POST and PUT /api/days.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct DayRequest {
    pub date: Option<NaiveDate>,
    #[validate(length(max = 4096, message = "Note is limited to 4096 characters"))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewDay {
    pub date: NaiveDate,
    pub note: Option<String>,
}

impl TryFrom<DayRequest> for NewDay {
    type Error = AppError;

    fn try_from(body: DayRequest) -> Result<Self, Self::Error> {
        body.validate()?;
        Ok(Self {
            date: required(body.date, "date")?,
            note: body.note,
        })
    }
}

impl Day {
    pub async fn find<'e, E>(db: E, id: i64) -> sqlx::Result<Option<Self>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Day>("SELECT * FROM days WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn find_by_date<'e, E>(db: E, user_id: i64, date: NaiveDate) -> sqlx::Result<Option<Self>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Day>("SELECT * FROM days WHERE user_id = ? AND date = ?")
            .bind(user_id)
            .bind(date)
            .fetch_optional(db)
            .await
    }

    pub async fn insert<'e, E>(db: E, user_id: i64, new: &NewDay) -> sqlx::Result<Self>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Day>(
            r#"
            INSERT INTO days (user_id, created_date, date, note)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(Utc::now())
        .bind(new.date)
        .bind(&new.note)
        .fetch_one(db)
        .await
    }

    /// `None` if the day was deleted since it was looked up.
    pub async fn update<'e, E>(db: E, id: i64, new: &NewDay) -> sqlx::Result<Option<Self>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Day>(
            r#"
            UPDATE days SET
                date = ?,
                note = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(new.date)
        .bind(&new.note)
        .bind(id)
        .fetch_optional(db)
        .await
    }
}
