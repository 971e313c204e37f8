use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite};
use validator::Validate;

use super::Owned;
use crate::error::{required, AppError};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ActivityType {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub created_date: DateTime<Utc>,
    pub name: String,
    pub show_quantity: bool,
    pub show_rating: bool,
}

impl Owned for ActivityType {
    const KIND: &'static str = "activity type";

    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

/// Body of POST and PUT /api/activity_types. The flags default to false.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ActivityTypeRequest {
    #[validate(length(min = 1, max = 128, message = "Name must be 1-128 characters"))]
    pub name: Option<String>,
    #[serde(default)]
    pub show_quantity: bool,
    #[serde(default)]
    pub show_rating: bool,
}

/// Every mutable field of an activity type, already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivityType {
    pub name: String,
    pub show_quantity: bool,
    pub show_rating: bool,
}

impl TryFrom<ActivityTypeRequest> for NewActivityType {
    type Error = AppError;

    fn try_from(body: ActivityTypeRequest) -> Result<Self, Self::Error> {
        body.validate()?;
        Ok(Self {
            name: required(body.name, "name")?,
            show_quantity: body.show_quantity,
            show_rating: body.show_rating,
        })
    }
}

impl ActivityType {
    pub async fn find<'e, E>(db: E, id: i64) -> sqlx::Result<Option<Self>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, ActivityType>("SELECT * FROM activity_types WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// First type with exactly this name owned by `user_id`.
    pub async fn find_by_name<'e, E>(db: E, user_id: i64, name: &str) -> sqlx::Result<Option<Self>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, ActivityType>(
            "SELECT * FROM activity_types WHERE user_id = ? AND name = ? ORDER BY id LIMIT 1",
        )
        .bind(user_id)
        .bind(name)
        .fetch_optional(db)
        .await
    }

    pub async fn insert<'e, E>(db: E, user_id: i64, new: &NewActivityType) -> sqlx::Result<Self>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, ActivityType>(
            r#"
            INSERT INTO activity_types (user_id, created_date, name, show_quantity, show_rating)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(Utc::now())
        .bind(&new.name)
        .bind(new.show_quantity)
        .bind(new.show_rating)
        .fetch_one(db)
        .await
    }

    /// Replaces every mutable field. `None` when the row is gone.
    pub async fn update<'e, E>(db: E, id: i64, new: &NewActivityType) -> sqlx::Result<Option<Self>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, ActivityType>(
            r#"
            UPDATE activity_types SET
                name = ?,
                show_quantity = ?,
                show_rating = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&new.name)
        .bind(new.show_quantity)
        .bind(new.show_rating)
        .bind(id)
        .fetch_optional(db)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_default_to_false() {
        let body: ActivityTypeRequest = serde_json::from_str(r#"{"name":"Food"}"#).unwrap();
        let new = NewActivityType::try_from(body).unwrap();
        assert_eq!(
            new,
            NewActivityType {
                name: "Food".into(),
                show_quantity: false,
                show_rating: false,
            }
        );
    }

    #[test]
    fn test_name_is_required() {
        let body: ActivityTypeRequest = serde_json::from_str(r#"{"show_rating":true}"#).unwrap();
        assert!(matches!(
            NewActivityType::try_from(body),
            Err(AppError::MissingField("name"))
        ));
    }

    #[test]
    fn test_name_length_is_checked() {
        let body = ActivityTypeRequest {
            name: Some("x".repeat(129)),
            show_quantity: false,
            show_rating: false,
        };
        assert!(matches!(
            NewActivityType::try_from(body),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result = serde_json::from_str::<ActivityTypeRequest>(r#"{"name":"Food","colour":"red"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_owner_is_not_serialized() {
        let row = ActivityType {
            id: 3,
            user_id: 9,
            created_date: Utc::now(),
            name: "Sport".into(),
            show_quantity: true,
            show_rating: false,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["name"], "Sport");
        assert!(json.get("user_id").is_none());
    }

    #[tokio::test]
    async fn test_update_of_deleted_row_is_none() {
        let db = crate::db::memory_pool().await.unwrap();
        crate::db::migrate(&db).await.unwrap();
        let user = crate::models::user::User::insert(&db, "alice", "hash")
            .await
            .unwrap();
        let new = NewActivityType {
            name: "Food".into(),
            show_quantity: true,
            show_rating: false,
        };

        let row = ActivityType::insert(&db, user.id, &new).await.unwrap();
        let renamed = NewActivityType {
            name: "Meals".into(),
            ..new.clone()
        };
        let updated = ActivityType::update(&db, row.id, &renamed).await.unwrap();
        assert_eq!(updated.map(|t| t.name), Some("Meals".to_string()));

        sqlx::query("DELETE FROM activity_types WHERE id = ?")
            .bind(row.id)
            .execute(&db)
            .await
            .unwrap();
        assert!(ActivityType::update(&db, row.id, &new).await.unwrap().is_none());
    }
}
