// src/handlers/stats.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use sqlx::SqlitePool;

use crate::{error::AppError, models::stats::UserStats, utils::jwt::Claims};

/// Answer totals for the authenticated user, from a single aggregate query.
/// Timeouts are stored as incorrect answers and count toward the totals.
pub async fn get_stats(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let (total_answered, correct_answers): (i64, i64) = sqlx::query_as(
        "SELECT
            COUNT(*),
            COALESCE(SUM(CASE WHEN is_correct THEN 1 ELSE 0 END), 0)
        FROM user_answers
        WHERE user_id = ?",
    )
    .bind(claims.user_id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to aggregate stats: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(UserStats {
        total_answered,
        correct_answers,
        wrong_answers: total_answered - correct_answers,
    }))
}
