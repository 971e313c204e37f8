use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use axum_extra::headers::{Authorization, Header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use crate::config::Config;
use crate::{db, router, AppState};

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn location(&self) -> &str {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    /// Id at the end of the `Location` header.
    pub fn created_id(&self) -> i64 {
        assert_eq!(self.status, StatusCode::CREATED, "body: {}", self.body);
        self.location()
            .rsplit('/')
            .next()
            .and_then(|id| id.parse().ok())
            .expect("Location ends with an id")
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 0,
        public_url: "http://lifelog.test".into(),
        cors_origins: vec![],
        secret_key: "test-secret".into(),
        token_ttl_secs: 600,
    }
}

pub async fn test_app() -> Router {
    let pool = db::memory_pool().await.expect("in-memory pool");
    db::migrate(&pool).await.expect("migrations");
    router(AppState::new(pool, test_config()))
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    auth: Option<(&str, &str)>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some((user, pass)) = auth {
        let mut values = Vec::new();
        Authorization::basic(user, pass).encode(&mut values);
        for value in values {
            builder = builder.header(header::AUTHORIZATION, value);
        }
    }

    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).expect("valid request"))
        .await
        .expect("infallible");

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("readable body")
        .to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    TestResponse {
        status,
        headers,
        body,
    }
}

/// Registers `username` with password `pw` and returns the new user id.
pub async fn register(app: &Router, username: &str) -> i64 {
    send(
        app,
        Method::POST,
        "/api/users",
        None,
        Some(serde_json::json!({ "username": username, "password": "pw" })),
    )
    .await
    .created_id()
}

/// Registers `username` and trades the password for a token.
pub async fn login(app: &Router, username: &str) -> String {
    register(app, username).await;
    let resp = send(app, Method::GET, "/api/token", Some((username, "pw")), None).await;
    assert_eq!(resp.status, StatusCode::OK);
    resp.body["token"]
        .as_str()
        .expect("token string")
        .to_string()
}

/// Basic credentials for a token.
pub fn token_auth(token: &str) -> Option<(&str, &str)> {
    Some((token, "unused"))
}
