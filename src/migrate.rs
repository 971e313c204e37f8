//! One-off import of the legacy food diary (`LH_Eatings`) into the current
//! schema. Every distinct meal description becomes an activity under the
//! user's food activity type.

use std::path::Path;

use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::models::activity::{Activity, NewActivity};
use crate::models::activity_type::{ActivityType, NewActivityType};
use crate::models::user::User;

pub const FOOD_TYPE_NAME: &str = "Nourriture";

const LEGACY_MEALS_QUERY: &str = r#"
    SELECT TRIM(LunchDescription) AS name FROM LH_Eatings WHERE TRIM(LunchDescription) <> ''
    UNION
    SELECT TRIM(DinnerDescription) AS name FROM LH_Eatings WHERE TRIM(DinnerDescription) <> ''
    UNION
    SELECT TRIM(SupperDescription) AS name FROM LH_Eatings WHERE TRIM(SupperDescription) <> ''
    ORDER BY name
"#;

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("destination user {0} does not exist")]
    UnknownUser(i64),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub activity_type_id: i64,
    pub created_type: bool,
    pub inserted: usize,
    pub skipped: usize,
}

/// Opens the legacy database without any chance of writing to it.
pub async fn open_legacy(path: &Path) -> sqlx::Result<SqlitePool> {
    let options = SqliteConnectOptions::new().filename(path).read_only(true);
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
}

/// Distinct, non-blank lunch, dinner and supper descriptions.
pub async fn legacy_meal_names(legacy: &SqlitePool) -> sqlx::Result<Vec<String>> {
    sqlx::query_scalar::<_, String>(LEGACY_MEALS_QUERY)
        .fetch_all(legacy)
        .await
}

/// Inserts `names` as food activities of `user_id` in a single transaction.
///
/// Names already present under the food type are skipped, so running the
/// import twice is harmless. With `dry_run` the transaction is rolled back.
pub async fn import_meals(
    target: &SqlitePool,
    user_id: i64,
    names: &[String],
    dry_run: bool,
) -> Result<MigrationReport, MigrationError> {
    let mut tx = target.begin().await?;

    if User::find(&mut *tx, user_id).await?.is_none() {
        return Err(MigrationError::UnknownUser(user_id));
    }

    let (food_type, created_type) =
        match ActivityType::find_by_name(&mut *tx, user_id, FOOD_TYPE_NAME).await? {
            Some(existing) => (existing, false),
            None => {
                let new = NewActivityType {
                    name: FOOD_TYPE_NAME.to_string(),
                    show_quantity: true,
                    show_rating: true,
                };
                (ActivityType::insert(&mut *tx, user_id, &new).await?, true)
            }
        };
    tracing::info!(
        activity_type_id = food_type.id,
        created = created_type,
        "Using food activity type"
    );

    let mut report = MigrationReport {
        activity_type_id: food_type.id,
        created_type,
        inserted: 0,
        skipped: 0,
    };

    for name in names {
        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM activities WHERE user_id = ? AND activity_type_id = ? AND name = ?",
        )
        .bind(user_id)
        .bind(food_type.id)
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;

        if existing > 0 {
            tracing::debug!(name = %name, "Activity already present");
            report.skipped += 1;
            continue;
        }

        let new = NewActivity {
            name: name.clone(),
            activity_type_id: food_type.id,
        };
        let activity = Activity::insert(&mut *tx, user_id, &new).await?;
        tracing::debug!(activity_id = activity.id, name = %name, "Activity imported");
        report.inserted += 1;
    }

    if dry_run {
        tx.rollback().await?;
        tracing::info!("Dry run, changes rolled back");
    } else {
        tx.commit().await?;
    }

    Ok(report)
}
