// src/handlers/admin/exams.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use validator::Validate;

use super::{category_name, conflict_or_log, exam_name};
use crate::{
    error::AppError,
    handlers::catalog::EXAM_COLUMNS,
    models::{
        answer::SuccessResponse,
        category::{Category, CategoryListResponse},
        exam::{CreateExamRequest, Exam, ExamListResponse, UpdateExamRequest},
        stats::{ExamDeletionImpact, NamedRef},
    },
    utils::{extract::AppJson, html::clean_html},
};

/// Lists all exams, newest first.
/// Admin only.
pub async fn list_exams(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let exams = sqlx::query_as::<_, Exam>(&format!(
        "SELECT {EXAM_COLUMNS} FROM exams ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list exams: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(ExamListResponse { exams }))
}

/// Creates a new exam.
/// Admin only. Duplicate names are `RES_002`.
pub async fn create_exam(
    State(pool): State<SqlitePool>,
    AppJson(payload): AppJson<CreateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let name = payload.name.trim().to_string();

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO exams (name, category, description) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(&name)
    .bind(payload.category.trim())
    .bind(clean_html(&payload.description))
    .fetch_one(&pool)
    .await
    .map_err(|e| conflict_or_log(e, "create exam", format!("Exam '{}' already exists", name)))?;

    tracing::info!(exam_id = id, "Exam created");

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// Updates an exam by ID and returns the stored row.
/// Admin only.
pub async fn update_exam(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<UpdateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let conflict_name = payload.name.clone().unwrap_or_default();

    if payload.name.is_some() || payload.category.is_some() || payload.description.is_some() {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE exams SET ");
        let mut separated = builder.separated(", ");

        if let Some(name) = payload.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name.trim().to_string());
        }

        if let Some(category) = payload.category {
            separated.push("category = ");
            separated.push_bind_unseparated(category.trim().to_string());
        }

        if let Some(description) = payload.description {
            separated.push("description = ");
            separated.push_bind_unseparated(clean_html(&description));
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);

        let result = builder.build().execute(&pool).await.map_err(|e| {
            conflict_or_log(e, "update exam", format!("Exam '{}' already exists", conflict_name))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Exam {} not found", id)));
        }
    }

    let exam = sqlx::query_as::<_, Exam>(&format!("SELECT {EXAM_COLUMNS} FROM exams WHERE id = ?"))
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound(format!("Exam {} not found", id)))?;

    Ok(Json(exam))
}

/// Deletes an exam.
///
/// Removes its category mappings, clears the exam from every user that had
/// it as preparation focus, then deletes the row. Categories and questions
/// are left in place, possibly orphaned. All in one transaction.
pub async fn delete_exam(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = pool.begin().await?;

    exam_name(&mut *tx, id).await?;

    let mappings = sqlx::query("DELETE FROM exam_categories WHERE exam_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let users = sqlx::query("UPDATE users SET exam_id = NULL WHERE exam_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    sqlx::query("DELETE FROM exams WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await.map_err(|e| {
        tracing::error!("Failed to commit exam deletion: {:?}", e);
        AppError::from(e)
    })?;

    tracing::info!(exam_id = id, mappings, users, "Exam deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Pre-flight report of what `delete_exam` would touch.
pub async fn exam_deletion_impact(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exam_name = exam_name(&pool, id).await?;

    let category_mappings_to_remove: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM exam_categories WHERE exam_id = ?")
            .bind(id)
            .fetch_one(&pool)
            .await?;

    let users_assigned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE exam_id = ?")
        .bind(id)
        .fetch_one(&pool)
        .await?;

    // Categories mapped to this exam and to no other.
    let orphaned_categories = sqlx::query_as::<_, NamedRef>(
        "SELECT c.id, c.name
         FROM categories c
         JOIN exam_categories ec ON ec.category_id = c.id AND ec.exam_id = ?
         WHERE NOT EXISTS (
             SELECT 1 FROM exam_categories other
             WHERE other.category_id = c.id AND other.exam_id <> ?
         )
         ORDER BY c.name",
    )
    .bind(id)
    .bind(id)
    .fetch_all(&pool)
    .await?;

    let questions_no_longer_accessible: i64 = sqlx::query_scalar(
        "SELECT COUNT(*)
         FROM questions q
         JOIN exam_categories ec ON ec.category_id = q.category_id AND ec.exam_id = ?
         WHERE NOT EXISTS (
             SELECT 1 FROM exam_categories other
             WHERE other.category_id = q.category_id AND other.exam_id <> ?
         )",
    )
    .bind(id)
    .bind(id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(ExamDeletionImpact {
        exam_id: id,
        exam_name,
        category_mappings_to_remove,
        users_assigned,
        questions_no_longer_accessible,
        orphaned_categories_count: orphaned_categories.len() as i64,
        orphaned_categories,
    }))
}

/// Categories mapped to an exam.
pub async fn list_exam_categories(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    exam_name(&pool, id).await?;

    let categories = sqlx::query_as::<_, Category>(
        "SELECT c.id, c.name, c.description, c.question_count, c.created_at
         FROM categories c
         JOIN exam_categories ec ON ec.category_id = c.id
         WHERE ec.exam_id = ?
         ORDER BY c.name",
    )
    .bind(id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list exam categories: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(CategoryListResponse { categories }))
}

/// Maps a category to an exam. An existing mapping is `RES_002`.
pub async fn add_exam_category(
    State(pool): State<SqlitePool>,
    Path((exam_id, category_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let exam = exam_name(&pool, exam_id).await?;
    let category = category_name(&pool, category_id).await?;

    sqlx::query("INSERT INTO exam_categories (exam_id, category_id) VALUES (?, ?)")
        .bind(exam_id)
        .bind(category_id)
        .execute(&pool)
        .await
        .map_err(|e| {
            conflict_or_log(
                e,
                "map category",
                format!("Category '{}' is already mapped to '{}'", category, exam),
            )
        })?;

    Ok((StatusCode::CREATED, Json(SuccessResponse::ok())))
}

/// Removes a category from an exam. The category itself is kept.
pub async fn remove_exam_category(
    State(pool): State<SqlitePool>,
    Path((exam_id, category_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM exam_categories WHERE exam_id = ? AND category_id = ?")
        .bind(exam_id)
        .bind(category_id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to unmap category: {:?}", e);
            AppError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Mapping not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
