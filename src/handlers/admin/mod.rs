// src/handlers/admin/mod.rs
//
// Admin-only handlers. Every route here sits behind both the auth and the
// admin middleware.

pub mod categories;
pub mod exams;
pub mod questions;
pub mod stats;

use sqlx::{Sqlite, SqliteExecutor};

use crate::error::AppError;

/// Name of an exam, or `NotFound`.
pub(crate) async fn exam_name<'e>(
    executor: impl SqliteExecutor<'e>,
    exam_id: i64,
) -> Result<String, AppError> {
    sqlx::query_scalar::<Sqlite, String>("SELECT name FROM exams WHERE id = ?")
        .bind(exam_id)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound(format!("Exam {} not found", exam_id)))
}

/// Name of a category, or `NotFound`.
pub(crate) async fn category_name<'e>(
    executor: impl SqliteExecutor<'e>,
    category_id: i64,
) -> Result<String, AppError> {
    sqlx::query_scalar::<Sqlite, String>("SELECT name FROM categories WHERE id = ?")
        .bind(category_id)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound(format!("Category {} not found", category_id)))
}

/// Maps a storage error on an admin write, turning unique violations into a
/// named conflict.
pub(crate) fn conflict_or_log(e: sqlx::Error, what: &str, conflict_message: String) -> AppError {
    match AppError::from(e) {
        AppError::Conflict(_) => AppError::Conflict(conflict_message),
        other => {
            tracing::error!("Failed to {}: {:?}", what, other);
            other
        }
    }
}
