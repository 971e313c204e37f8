pub mod activities;
pub mod activity_types;
pub mod days;
pub mod health;
pub mod life_entries;
pub mod life_entry_activities;
pub mod users;

use axum::{
    http::{header::LOCATION, HeaderName, StatusCode},
    Json,
};
use serde::Serialize;

/// 201 with the new resource's absolute URL in `Location`.
pub type Created<T> = (StatusCode, [(HeaderName, String); 1], Json<T>);

pub fn created<T>(location: String, body: T) -> Created<T> {
    (StatusCode::CREATED, [(LOCATION, location)], Json(body))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub id: i64,
}

impl DeleteResponse {
    pub fn new(id: i64) -> Json<Self> {
        Json(Self { deleted: true, id })
    }
}
