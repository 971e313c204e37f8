use sqlx::migrate::{MigrateError, Migrator};
use sqlx::SqlitePool;

mod pool;

pub use pool::{create_pool, memory_pool};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub async fn migrate(db: &SqlitePool) -> Result<(), MigrateError> {
    MIGRATOR.run(db).await
}

/// Newest migration compiled into this binary.
pub fn expected_schema_version() -> Option<i64> {
    MIGRATOR.iter().map(|m| m.version).max()
}

/// Newest migration successfully applied to `db`, `None` on a blank database.
pub async fn applied_schema_version(db: &SqlitePool) -> sqlx::Result<Option<i64>> {
    let tracked = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_one(db)
    .await?;
    if tracked == 0 {
        return Ok(None);
    }

    sqlx::query_scalar::<_, Option<i64>>(
        "SELECT MAX(version) FROM _sqlx_migrations WHERE success = 1",
    )
    .fetch_one(db)
    .await
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}
