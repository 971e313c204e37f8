pub mod activity;
pub mod activity_type;
pub mod day;
pub mod life_entry;
pub mod life_entry_activity;
pub mod user;

use crate::error::{AppError, AppResult};

/// A row that belongs to exactly one user.
pub trait Owned {
    /// Human readable name used in error messages.
    const KIND: &'static str;

    fn owner_id(&self) -> i64;
}

/// Resolves a row looked up by id on behalf of `user_id`.
///
/// A missing row is a bad request, somebody else's row is unauthorized.
pub fn owned_by<T: Owned>(row: Option<T>, user_id: i64) -> AppResult<T> {
    let row = row.ok_or(AppError::Missing(T::KIND))?;
    if row.owner_id() != user_id {
        return Err(AppError::NotOwner);
    }
    Ok(row)
}

/// Like [`owned_by`], for a parent referenced from a request body.
pub fn parent_owned_by<T: Owned>(row: Option<T>, user_id: i64, parent_id: i64) -> AppResult<T> {
    let row = row.ok_or_else(|| AppError::ParentNotFound(format!("{} {}", T::KIND, parent_id)))?;
    if row.owner_id() != user_id {
        return Err(AppError::NotOwner);
    }
    Ok(row)
}
