//! Personal life-tracking API: activity types, activities, days and
//! timed life entries, all scoped to the authenticated user.

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod migrate;
pub mod models;
pub mod time_format;

#[cfg(test)]
pub(crate) mod test_support;

use auth::token::TokenService;
use config::Config;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<Config>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: Config) -> Self {
        let tokens = TokenService::new(&config.secret_key);
        Self {
            db,
            config: Arc::new(config),
            tokens: Arc::new(tokens),
        }
    }
}

pub fn router(state: AppState) -> Router {
    use handlers::{
        activities, activity_types, days, health, life_entries, life_entry_activities, users,
    };

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/readyz", get(health::readyz))
        .route("/api/users", post(users::new_user))
        .route("/api/users/:id", get(users::get_user))
        .route("/api/authenticate", post(users::authenticate));

    let protected_routes = Router::new()
        .route("/api/token", get(users::get_auth_token))
        // Activity types
        .route(
            "/api/activity_types",
            get(activity_types::list_activity_types).post(activity_types::new_activity_type),
        )
        .route(
            "/api/activity_types/:id",
            get(activity_types::get_activity_type)
                .put(activity_types::update_activity_type)
                .delete(activity_types::delete_activity_type),
        )
        .route(
            "/api/activity_types/search/:term",
            get(activity_types::search_activity_types),
        )
        // Activities
        .route(
            "/api/activities",
            get(activities::list_activities).post(activities::new_activity),
        )
        .route(
            "/api/activities/:id",
            get(activities::get_activity)
                .put(activities::update_activity)
                .delete(activities::delete_activity),
        )
        .route(
            "/api/activities/search/:term",
            get(activities::search_activities),
        )
        // Days: `:key` is either a numeric id or a YYYY-MM-DD date
        .route("/api/days", get(days::list_days).post(days::new_day))
        .route(
            "/api/days/:key",
            get(days::get_day)
                .put(days::update_day)
                .delete(days::delete_day),
        )
        // Life entries
        .route(
            "/api/life_entries",
            get(life_entries::list_life_entries).post(life_entries::new_life_entry),
        )
        .route(
            "/api/life_entries/:id",
            get(life_entries::get_life_entry)
                .put(life_entries::update_life_entry)
                .delete(life_entries::delete_life_entry),
        )
        // Life entry activities
        .route(
            "/api/life_entry_activities",
            get(life_entry_activities::list_life_entry_activities)
                .post(life_entry_activities::new_life_entry_activity),
        )
        .route(
            "/api/life_entry_activities/:id",
            get(life_entry_activities::get_life_entry_activity)
                .put(life_entry_activities::update_life_entry_activity)
                .delete(life_entry_activities::delete_life_entry_activity),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    let cors = cors_layer(&state.config);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(hv) => Some(hv),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ])
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::test_support::{send, test_app};

    #[tokio::test]
    async fn test_protected_routes_challenge() {
        let app = test_app().await;
        for uri in [
            "/api/token",
            "/api/activity_types",
            "/api/activities/search/x",
            "/api/days/2024-01-01",
            "/api/life_entries/1",
            "/api/life_entry_activities",
        ] {
            let resp = send(&app, Method::GET, uri, None, None).await;
            assert_eq!(resp.status, StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = test_app().await;
        let resp = send(&app, Method::GET, "/api/nothing-here", None, None).await;
        assert_eq!(resp.status, StatusCode::NOT_FOUND);
    }
}
