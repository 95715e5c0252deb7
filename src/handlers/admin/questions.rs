// src/handlers/admin/questions.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sqlx::SqlitePool;
use validator::Validate;

use super::category_name;
use crate::{error::AppError, models::question::CreateQuestionRequest, utils::extract::AppJson};

/// Default score for a question created without `points`.
const DEFAULT_POINTS: i64 = 10;

fn non_blank(option: Option<String>) -> Option<String> {
    option
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Creates a new question.
///
/// Admin only. Questions cannot be edited or deleted afterwards. The
/// category's `question_count` is bumped in the same transaction.
pub async fn create_question(
    State(pool): State<SqlitePool>,
    AppJson(payload): AppJson<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if !payload.has_correct_option() {
        return Err(AppError::BadRequest(format!(
            "correct_answer '{}' does not name a present option",
            payload.correct_answer
        )));
    }

    let mut tx = pool.begin().await?;

    category_name(&mut *tx, payload.category_id).await?;

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO questions
         (category_id, question_format, question_text,
          option_a, option_b, option_c, option_d,
          correct_answer, explanation, difficulty, points)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING id",
    )
    .bind(payload.category_id)
    .bind(payload.question_format)
    .bind(payload.question_text.trim())
    .bind(non_blank(payload.option_a))
    .bind(non_blank(payload.option_b))
    .bind(non_blank(payload.option_c))
    .bind(non_blank(payload.option_d))
    .bind(payload.correct_answer.trim().to_lowercase())
    .bind(payload.explanation.trim())
    .bind(payload.difficulty)
    .bind(payload.points.unwrap_or(DEFAULT_POINTS))
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::from(e)
    })?;

    sqlx::query("UPDATE categories SET question_count = question_count + 1 WHERE id = ?")
        .bind(payload.category_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}
