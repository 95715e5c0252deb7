// src/handlers/admin/categories.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use validator::Validate;

use super::{category_name, conflict_or_log};
use crate::{
    error::AppError,
    handlers::catalog::CATEGORY_COLUMNS,
    models::{
        category::{
            Category, CategoryListResponse, CategoryWithExams, CreateCategoryRequest,
            UpdateCategoryRequest,
        },
        stats::{CategoryDeletionImpact, NamedRef},
    },
    utils::{extract::AppJson, html::clean_html},
};

/// Lists every category together with the ids of the exams it is mapped to.
/// Admin only.
pub async fn list_categories(
    State(pool): State<SqlitePool>,
) -> Result<impl IntoResponse, AppError> {
    let categories = sqlx::query_as::<_, Category>(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name"
    ))
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list categories: {:?}", e);
        AppError::from(e)
    })?;

    let mappings: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT category_id, exam_id FROM exam_categories ORDER BY exam_id",
    )
    .fetch_all(&pool)
    .await?;

    let mut exams_by_category: HashMap<i64, Vec<i64>> = HashMap::new();
    for (category_id, exam_id) in mappings {
        exams_by_category.entry(category_id).or_default().push(exam_id);
    }

    let categories = categories
        .into_iter()
        .map(|category| CategoryWithExams {
            exam_ids: exams_by_category.remove(&category.id).unwrap_or_default(),
            category,
        })
        .collect();

    Ok(Json(CategoryListResponse { categories }))
}

/// Creates a new category.
/// Admin only. Duplicate names are `RES_002`.
pub async fn create_category(
    State(pool): State<SqlitePool>,
    AppJson(payload): AppJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let name = payload.name.trim().to_string();

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO categories (name, description) VALUES (?, ?) RETURNING id",
    )
    .bind(&name)
    .bind(clean_html(&payload.description))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        conflict_or_log(e, "create category", format!("Category '{}' already exists", name))
    })?;

    tracing::info!(category_id = id, "Category created");

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// Updates a category by ID and returns the stored row.
/// `question_count` is maintained by question creation and cannot be set here.
pub async fn update_category(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let conflict_name = payload.name.clone().unwrap_or_default();

    if payload.name.is_some() || payload.description.is_some() {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE categories SET ");
        let mut separated = builder.separated(", ");

        if let Some(name) = payload.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name.trim().to_string());
        }

        if let Some(description) = payload.description {
            separated.push("description = ");
            separated.push_bind_unseparated(clean_html(&description));
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);

        let result = builder.build().execute(&pool).await.map_err(|e| {
            conflict_or_log(
                e,
                "update category",
                format!("Category '{}' already exists", conflict_name),
            )
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }
    }

    let category = sqlx::query_as::<_, Category>(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound(format!("Category {} not found", id)))?;

    Ok(Json(category))
}

/// Deletes a category and its exam mappings.
///
/// Refused with `RES_002` while the category still owns questions, since
/// questions are never deleted.
pub async fn delete_category(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = pool.begin().await?;

    let name = category_name(&mut *tx, id).await?;

    let questions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE category_id = ?")
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

    if questions > 0 {
        return Err(AppError::Conflict(format!(
            "Category '{}' still has {} questions and cannot be deleted",
            name, questions
        )));
    }

    sqlx::query("DELETE FROM exam_categories WHERE category_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await.map_err(|e| {
        tracing::error!("Failed to commit category deletion: {:?}", e);
        AppError::from(e)
    })?;

    tracing::info!(category_id = id, "Category deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Pre-flight report of what `delete_category` would touch.
pub async fn category_deletion_impact(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let category_name = category_name(&pool, id).await?;

    let exams_using_category = sqlx::query_as::<_, NamedRef>(
        "SELECT e.id, e.name
         FROM exams e
         JOIN exam_categories ec ON ec.exam_id = e.id
         WHERE ec.category_id = ?
         ORDER BY e.name",
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    let questions_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE category_id = ?")
            .bind(id)
            .fetch_one(&pool)
            .await?;

    Ok(Json(CategoryDeletionImpact {
        category_id: id,
        category_name,
        exam_mappings_to_remove: exams_using_category.len() as i64,
        exams_using_category,
        questions_count,
        can_delete: questions_count == 0,
    }))
}
