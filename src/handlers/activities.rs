use axum::{extract::State, Extension, Json};

use super::{created, Created, DeleteResponse};
use crate::auth::middleware::ActingUser;
use crate::db::is_foreign_key_violation;
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath};
use crate::models::activity::{Activity, ActivityRequest, ActivityView, NewActivity};
use crate::models::activity_type::ActivityType;
use crate::models::{owned_by, parent_owned_by, Owned};
use crate::AppState;

pub async fn list_activities(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
) -> AppResult<Json<Vec<ActivityView>>> {
    let activities = sqlx::query_as::<_, Activity>(
        "SELECT * FROM activities WHERE user_id = ? ORDER BY name ASC, id ASC",
    )
    .bind(acting.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ActivityView::load_all(&state.db, activities).await?))
}

pub async fn search_activities(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    AppPath(term): AppPath<String>,
) -> AppResult<Json<Vec<ActivityView>>> {
    let activities = sqlx::query_as::<_, Activity>(
        r#"
        SELECT * FROM activities
        WHERE user_id = ? AND instr(lower(name), lower(?)) > 0
        ORDER BY name ASC, id ASC
        "#,
    )
    .bind(acting.id)
    .bind(&term)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ActivityView::load_all(&state.db, activities).await?))
}

pub async fn new_activity(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    AppJson(body): AppJson<ActivityRequest>,
) -> AppResult<Created<ActivityView>> {
    let new = NewActivity::try_from(body)?;
    let activity_type = parent_owned_by(
        ActivityType::find(&state.db, new.activity_type_id).await?,
        acting.id,
        new.activity_type_id,
    )?;

    let activity = Activity::insert(&state.db, acting.id, &new).await?;

    tracing::info!(
        user_id = acting.id,
        activity_id = activity.id,
        activity_type_id = activity_type.id,
        "Activity created"
    );

    Ok(created(
        state.config.resource_url("activities", activity.id),
        ActivityView {
            activity,
            activity_type,
        },
    ))
}

pub async fn get_activity(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<ActivityView>> {
    let activity = owned_by(Activity::find(&state.db, id).await?, acting.id)?;
    Ok(Json(ActivityView::load(&state.db, activity).await?))
}

pub async fn update_activity(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    AppPath(id): AppPath<i64>,
    AppJson(body): AppJson<ActivityRequest>,
) -> AppResult<Json<ActivityView>> {
    owned_by(Activity::find(&state.db, id).await?, acting.id)?;
    let new = NewActivity::try_from(body)?;
    let activity_type = parent_owned_by(
        ActivityType::find(&state.db, new.activity_type_id).await?,
        acting.id,
        new.activity_type_id,
    )?;

    let activity = Activity::update(&state.db, id, &new)
        .await?
        .ok_or(AppError::Missing(Activity::KIND))?;

    Ok(Json(ActivityView {
        activity,
        activity_type,
    }))
}

pub async fn delete_activity(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<DeleteResponse>> {
    owned_by(Activity::find(&state.db, id).await?, acting.id)?;

    let in_use = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM life_entry_activities WHERE activity_id = ?",
    )
    .bind(id)
    .fetch_one(&state.db)
    .await?;

    if in_use > 0 {
        return Err(AppError::InUse(format!(
            "activity {} is logged {} times",
            id, in_use
        )));
    }

    sqlx::query("DELETE FROM activities WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::InUse(format!("activity {}", id))
            } else {
                e.into()
            }
        })?;

    tracing::info!(user_id = acting.id, activity_id = id, "Activity deleted");

    Ok(DeleteResponse::new(id))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use axum::Router;
    use serde_json::json;

    use crate::test_support::{login, send, test_app, token_auth};

    async fn new_type(app: &Router, token: &str, name: &str) -> i64 {
        send(
            app,
            Method::POST,
            "/api/activity_types",
            token_auth(token),
            Some(json!({ "name": name })),
        )
        .await
        .created_id()
    }

    #[tokio::test]
    async fn test_create_nests_type() {
        let app = test_app().await;
        let token = login(&app, "alice").await;
        let type_id = new_type(&app, &token, "Food").await;

        let resp = send(
            &app,
            Method::POST,
            "/api/activities",
            token_auth(&token),
            Some(json!({"name": "Breakfast", "activity_type_id": type_id})),
        )
        .await;
        let id = resp.created_id();
        assert_eq!(resp.body["activity_type"]["id"], type_id);

        let got = send(
            &app,
            Method::GET,
            &format!("/api/activities/{}", id),
            token_auth(&token),
            None,
        )
        .await;
        assert_eq!(got.status, StatusCode::OK);
        assert_eq!(got.body["name"], "Breakfast");
        assert_eq!(got.body["activity_type"]["name"], "Food");
    }

    #[tokio::test]
    async fn test_parent_checks() {
        let app = test_app().await;
        let alice = login(&app, "alice").await;
        let bob = login(&app, "bob").await;
        let alice_type = new_type(&app, &alice, "Food").await;

        let resp = send(
            &app,
            Method::POST,
            "/api/activities",
            token_auth(&alice),
            Some(json!({"name": "Lunch", "activity_type_id": 999})),
        )
        .await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);

        let resp = send(
            &app,
            Method::POST,
            "/api/activities",
            token_auth(&bob),
            Some(json!({"name": "Lunch", "activity_type_id": alice_type})),
        )
        .await;
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_update_moves_between_types() {
        let app = test_app().await;
        let token = login(&app, "alice").await;
        let food = new_type(&app, &token, "Food").await;
        let sport = new_type(&app, &token, "Sport").await;

        let id = send(
            &app,
            Method::POST,
            "/api/activities",
            token_auth(&token),
            Some(json!({"name": "Walk", "activity_type_id": food})),
        )
        .await
        .created_id();
        let uri = format!("/api/activities/{}", id);

        let resp = send(
            &app,
            Method::PUT,
            &uri,
            token_auth(&token),
            Some(json!({"name": "Long walk", "activity_type_id": sport})),
        )
        .await;
        assert_eq!(resp.status, StatusCode::OK);

        let got = send(&app, Method::GET, &uri, token_auth(&token), None).await;
        assert_eq!(got.body["name"], "Long walk");
        assert_eq!(got.body["activity_type_id"], sport);
        assert_eq!(got.body["activity_type"]["name"], "Sport");

        let resp = send(
            &app,
            Method::PUT,
            &uri,
            token_auth(&token),
            Some(json!({"name": "No type"})),
        )
        .await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search_and_list() {
        let app = test_app().await;
        let alice = login(&app, "alice").await;
        let bob = login(&app, "bob").await;
        let alice_type = new_type(&app, &alice, "Food").await;
        let bob_type = new_type(&app, &bob, "Food").await;

        for name in ["Cabbage soup", "Toast"] {
            send(
                &app,
                Method::POST,
                "/api/activities",
                token_auth(&alice),
                Some(json!({ "name": name, "activity_type_id": alice_type })),
            )
            .await
            .created_id();
        }
        send(
            &app,
            Method::POST,
            "/api/activities",
            token_auth(&bob),
            Some(json!({"name": "cabbage", "activity_type_id": bob_type})),
        )
        .await
        .created_id();

        let resp = send(
            &app,
            Method::GET,
            "/api/activities/search/CABB",
            token_auth(&alice),
            None,
        )
        .await;
        let found = resp.body.as_array().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["name"], "Cabbage soup");
        assert_eq!(found[0]["activity_type"]["id"], alice_type);

        let resp = send(&app, Method::GET, "/api/activities", token_auth(&alice), None).await;
        let names: Vec<&str> = resp
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Cabbage soup", "Toast"]);
    }

    #[tokio::test]
    async fn test_other_user_is_unauthorized() {
        let app = test_app().await;
        let alice = login(&app, "alice").await;
        let bob = login(&app, "bob").await;
        let alice_type = new_type(&app, &alice, "Food").await;
        let bob_type = new_type(&app, &bob, "Food").await;

        let id = send(
            &app,
            Method::POST,
            "/api/activities",
            token_auth(&alice),
            Some(json!({"name": "Soup", "activity_type_id": alice_type})),
        )
        .await
        .created_id();
        let uri = format!("/api/activities/{}", id);

        let resp = send(&app, Method::GET, &uri, token_auth(&bob), None).await;
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

        let resp = send(
            &app,
            Method::PUT,
            &uri,
            token_auth(&bob),
            Some(json!({"name": "Stolen", "activity_type_id": bob_type})),
        )
        .await;
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

        let resp = send(&app, Method::DELETE, &uri, token_auth(&bob), None).await;
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

        let resp = send(&app, Method::GET, &uri, token_auth(&alice), None).await;
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.body["name"], "Soup");

        let resp = send(&app, Method::GET, "/api/activities/soup", token_auth(&alice), None).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert_eq!(resp.body["error"]["code"], 400);
    }

    #[tokio::test]
    async fn test_delete_refused_while_logged() {
        let app = test_app().await;
        let token = login(&app, "alice").await;
        let type_id = new_type(&app, &token, "Food").await;

        let activity = send(
            &app,
            Method::POST,
            "/api/activities",
            token_auth(&token),
            Some(json!({"name": "Soup", "activity_type_id": type_id})),
        )
        .await
        .created_id();
        let day = send(
            &app,
            Method::POST,
            "/api/days",
            token_auth(&token),
            Some(json!({"date": "2024-02-02"})),
        )
        .await
        .created_id();
        let entry = send(
            &app,
            Method::POST,
            "/api/life_entries",
            token_auth(&token),
            Some(json!({"day_id": day, "start_time": "12:00:00"})),
        )
        .await
        .created_id();
        let logged = send(
            &app,
            Method::POST,
            "/api/life_entry_activities",
            token_auth(&token),
            Some(json!({"life_entry_id": entry, "activity_id": activity})),
        )
        .await
        .created_id();

        let uri = format!("/api/activities/{}", activity);
        let resp = send(&app, Method::DELETE, &uri, token_auth(&token), None).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);

        let resp = send(&app, Method::GET, &uri, token_auth(&token), None).await;
        assert_eq!(resp.status, StatusCode::OK);

        let resp = send(
            &app,
            Method::DELETE,
            &format!("/api/life_entry_activities/{}", logged),
            token_auth(&token),
            None,
        )
        .await;
        assert_eq!(resp.status, StatusCode::OK);

        let resp = send(&app, Method::DELETE, &uri, token_auth(&token), None).await;
        assert_eq!(resp.status, StatusCode::OK);
    }
}
