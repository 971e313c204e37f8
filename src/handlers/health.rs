use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::db;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Readiness {
    pub status: &'static str,
    pub database: &'static str,
    /// Latest applied migration.
    pub schema_version: Option<i64>,
    pub expected_schema_version: Option<i64>,
}

pub async fn health_check() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Ready once the database answers and carries every embedded migration.
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<Readiness>) {
    let expected = db::expected_schema_version();

    let readiness = match db::applied_schema_version(&state.db).await {
        Ok(applied) if applied == expected => Readiness {
            status: "ready",
            database: "ok",
            schema_version: applied,
            expected_schema_version: expected,
        },
        Ok(applied) => {
            tracing::warn!(?applied, ?expected, "Schema is behind the binary");
            Readiness {
                status: "migrations_pending",
                database: "ok",
                schema_version: applied,
                expected_schema_version: expected,
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Readiness check failed");
            Readiness {
                status: "not_ready",
                database: "unreachable",
                schema_version: None,
                expected_schema_version: expected,
            }
        }
    };

    let status = if readiness.status == "ready" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(readiness))
}
