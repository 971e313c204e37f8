use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use validator::Validate;

use super::activity::{Activity, ActivityView};
use super::Owned;
use crate::error::{required, AppError};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LifeEntryActivity {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub created_date: DateTime<Utc>,
    pub life_entry_id: i64,
    pub activity_id: i64,
    pub description: Option<String>,
    pub quantity: Option<f64>,
    pub rating: Option<i64>,
}

impl Owned for LifeEntryActivity {
    const KIND: &'static str = "life entry activity";

    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

#[derive(Debug, Serialize)]
pub struct LifeEntryActivityView {
    #[serde(flatten)]
    pub row: LifeEntryActivity,
    pub activity: ActivityView,
}

impl LifeEntryActivityView {
    pub async fn load(db: &SqlitePool, row: LifeEntryActivity) -> sqlx::Result<Self> {
        let activity = Activity::find(db, row.activity_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        let activity = ActivityView::load(db, activity).await?;
        Ok(Self { row, activity })
    }
}

/// Body of POST and PUT /api/life_entry_activities.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct LifeEntryActivityRequest {
    pub life_entry_id: Option<i64>,
    pub activity_id: Option<i64>,
    #[validate(length(max = 1024, message = "Description is limited to 1024 characters"))]
    pub description: Option<String>,
    #[validate(range(min = 0.0, message = "Quantity must not be negative"))]
    pub quantity: Option<f64>,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLifeEntryActivity {
    pub life_entry_id: i64,
    pub activity_id: i64,
    pub description: Option<String>,
    pub quantity: Option<f64>,
    pub rating: Option<i64>,
}

impl TryFrom<LifeEntryActivityRequest> for NewLifeEntryActivity {
    type Error = AppError;

    fn try_from(body: LifeEntryActivityRequest) -> Result<Self, Self::Error> {
        body.validate()?;
        Ok(Self {
            life_entry_id: required(body.life_entry_id, "life_entry_id")?,
            activity_id: required(body.activity_id, "activity_id")?,
            description: body.description,
            quantity: body.quantity,
            rating: body.rating,
        })
    }
}

impl LifeEntryActivity {
    pub async fn find<'e, E>(db: E, id: i64) -> sqlx::Result<Option<Self>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, LifeEntryActivity>("SELECT * FROM life_entry_activities WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn insert<'e, E>(
        db: E,
        user_id: i64,
        new: &NewLifeEntryActivity,
    ) -> sqlx::Result<Self>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, LifeEntryActivity>(
            r#"
            INSERT INTO life_entry_activities
                (user_id, created_date, life_entry_id, activity_id, description, quantity, rating)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(Utc::now())
        .bind(new.life_entry_id)
        .bind(new.activity_id)
        .bind(&new.description)
        .bind(new.quantity)
        .bind(new.rating)
        .fetch_one(db)
        .await
    }

    pub async fn update<'e, E>(
        db: E,
        id: i64,
        new: &NewLifeEntryActivity,
    ) -> sqlx::Result<Option<Self>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, LifeEntryActivity>(
            r#"
            UPDATE life_entry_activities SET
                life_entry_id = ?,
                activity_id = ?,
                description = ?,
                quantity = ?,
                rating = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(new.life_entry_id)
        .bind(new.activity_id)
        .bind(&new.description)
        .bind(new.quantity)
        .bind(new.rating)
        .bind(id)
        .fetch_optional(db)
        .await
    }
}
