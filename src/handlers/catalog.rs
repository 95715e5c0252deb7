// src/handlers/catalog.rs

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        category::{Category, CategoryListParams, CategoryListResponse},
        exam::{Exam, ExamListResponse},
    },
};

pub(crate) const EXAM_COLUMNS: &str = "id, name, category, description, created_at";
pub(crate) const CATEGORY_COLUMNS: &str = "id, name, description, question_count, created_at";

/// Public exam picker.
pub async fn list_exams(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let exams = sqlx::query_as::<_, Exam>(&format!("SELECT {EXAM_COLUMNS} FROM exams ORDER BY name"))
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list exams: {:?}", e);
            AppError::from(e)
        })?;

    Ok(Json(ExamListResponse { exams }))
}

/// Lists categories, optionally only those mapped to `?exam_id=`.
pub async fn list_categories(
    State(pool): State<SqlitePool>,
    Query(params): Query<CategoryListParams>,
) -> Result<impl IntoResponse, AppError> {
    let categories = match params.exam_id {
        Some(exam_id) => {
            sqlx::query_as::<_, Category>(
                "SELECT c.id, c.name, c.description, c.question_count, c.created_at
                 FROM categories c
                 JOIN exam_categories ec ON ec.category_id = c.id
                 WHERE ec.exam_id = ?
                 ORDER BY c.name",
            )
            .bind(exam_id)
            .fetch_all(&pool)
            .await
        }
        None => {
            sqlx::query_as::<_, Category>(&format!(
                "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name"
            ))
            .fetch_all(&pool)
            .await
        }
    }
    .map_err(|e| {
        tracing::error!("Failed to list categories: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(CategoryListResponse { categories }))
}
