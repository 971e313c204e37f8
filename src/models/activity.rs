use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use validator::Validate;

use super::activity_type::ActivityType;
use super::Owned;
use crate::error::{required, AppError};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Activity {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub created_date: DateTime<Utc>,
    pub name: String,
    pub activity_type_id: i64,
}

impl Owned for Activity {
    const KIND: &'static str = "activity";

    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

/// An activity with its type inlined.
#[derive(Debug, Serialize)]
pub struct ActivityView {
    #[serde(flatten)]
    pub activity: Activity,
    pub activity_type: ActivityType,
}

impl ActivityView {
    pub async fn load(db: &SqlitePool, activity: Activity) -> sqlx::Result<Self> {
        let activity_type = ActivityType::find(db, activity.activity_type_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        Ok(Self {
            activity,
            activity_type,
        })
    }

    pub async fn load_all(db: &SqlitePool, activities: Vec<Activity>) -> sqlx::Result<Vec<Self>> {
        let mut result = Vec::with_capacity(activities.len());
        for activity in activities {
            result.push(Self::load(db, activity).await?);
        }
        Ok(result)
    }
}

/// Body of POST and PUT /api/activities.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ActivityRequest {
    #[validate(length(min = 1, max = 128, message = "Name must be 1-128 characters"))]
    pub name: Option<String>,
    pub activity_type_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub name: String,
    pub activity_type_id: i64,
}

impl TryFrom<ActivityRequest> for NewActivity {
    type Error = AppError;

    fn try_from(body: ActivityRequest) -> Result<Self, Self::Error> {
        body.validate()?;
        Ok(Self {
            name: required(body.name, "name")?,
            activity_type_id: required(body.activity_type_id, "activity_type_id")?,
        })
    }
}

impl Activity {
    pub async fn find<'e, E>(db: E, id: i64) -> sqlx::Result<Option<Self>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Activity>("SELECT * FROM activities WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn insert<'e, E>(db: E, user_id: i64, new: &NewActivity) -> sqlx::Result<Self>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Activity>(
            r#"
            INSERT INTO activities (user_id, created_date, name, activity_type_id)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(Utc::now())
        .bind(&new.name)
        .bind(new.activity_type_id)
        .fetch_one(db)
        .await
    }

    pub async fn update<'e, E>(db: E, id: i64, new: &NewActivity) -> sqlx::Result<Option<Self>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Activity>(
            r#"
            UPDATE activities SET
                name = ?,
                activity_type_id = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&new.name)
        .bind(new.activity_type_id)
        .bind(id)
        .fetch_optional(db)
        .await
    }
}
