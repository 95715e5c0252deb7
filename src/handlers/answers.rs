// src/handlers/answers.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::answer::{CorrectAnswersResponse, SaveAnswerRequest, SuccessResponse},
    utils::{extract::AppJson, jwt::Claims},
};

/// Appends one answer attempt for the authenticated user.
///
/// `selected_answer` is null for a timeout. The reported `is_correct` is
/// stored as sent. Rows are never updated, so a question can be attempted
/// any number of times.
pub async fn save_answer(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    AppJson(req): AppJson<SaveAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = req.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let selected_answer = req
        .selected_answer
        .as_deref()
        .map(|a| a.trim().to_lowercase());

    sqlx::query(
        "INSERT INTO user_answers (user_id, question_id, selected_answer, is_correct)
         VALUES (?, ?, ?, ?)",
    )
    .bind(claims.user_id)
    .bind(req.question_id)
    .bind(selected_answer)
    .bind(req.is_correct)
    .execute(&pool)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::NotFound(_) => {
            AppError::NotFound(format!("Question {} not found", req.question_id))
        }
        other => {
            tracing::error!("Failed to save answer: {:?}", other);
            other
        }
    })?;

    Ok(Json(SuccessResponse::ok()))
}

/// Distinct ids of questions the user has answered correctly at least once.
pub async fn list_correct_answers(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let correct_answers = sqlx::query_scalar::<_, i64>(
        "SELECT DISTINCT question_id FROM user_answers
         WHERE user_id = ? AND is_correct = 1
         ORDER BY question_id",
    )
    .bind(claims.user_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list correct answers: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(CorrectAnswersResponse { correct_answers }))
}
