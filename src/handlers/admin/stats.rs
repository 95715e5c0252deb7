// src/handlers/admin/stats.rs

use axum::{Json, extract::State, response::IntoResponse};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::stats::{
        CategoryQuestionCount, DailyStats, ExamQuestionCount, OrphanedCategory,
        QuestionLibraryStats,
    },
};

/// Question totals per category and per exam, plus categories no exam uses.
pub async fn question_library_stats(
    State(pool): State<SqlitePool>,
) -> Result<impl IntoResponse, AppError> {
    let total_questions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
        .fetch_one(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count questions: {:?}", e);
            AppError::from(e)
        })?;

    let questions_by_category = sqlx::query_as::<_, CategoryQuestionCount>(
        "SELECT c.id AS category_id, c.name AS category_name, COUNT(q.id) AS question_count
         FROM categories c
         LEFT JOIN questions q ON q.category_id = c.id
         GROUP BY c.id, c.name
         ORDER BY c.name",
    )
    .fetch_all(&pool)
    .await?;

    let questions_by_exam = sqlx::query_as::<_, ExamQuestionCount>(
        "SELECT e.id AS exam_id, e.name AS exam_name, COUNT(q.id) AS question_count
         FROM exams e
         LEFT JOIN exam_categories ec ON ec.exam_id = e.id
         LEFT JOIN questions q ON q.category_id = ec.category_id
         GROUP BY e.id, e.name
         ORDER BY e.name",
    )
    .fetch_all(&pool)
    .await?;

    let orphaned_categories = sqlx::query_as::<_, OrphanedCategory>(
        "SELECT c.id, c.name, COUNT(q.id) AS question_count
         FROM categories c
         LEFT JOIN questions q ON q.category_id = c.id
         WHERE NOT EXISTS (SELECT 1 FROM exam_categories ec WHERE ec.category_id = c.id)
         GROUP BY c.id, c.name
         ORDER BY c.name",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(QuestionLibraryStats {
        total_questions,
        questions_by_category,
        questions_by_exam,
        orphaned_categories_count: orphaned_categories.len() as i64,
        orphaned_categories,
    }))
}

/// Platform activity for the current UTC day.
pub async fn daily_stats(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let (total_users, total_questions, questions_created_today): (i64, i64, i64) = sqlx::query_as(
        "SELECT
            (SELECT COUNT(*) FROM users),
            (SELECT COUNT(*) FROM questions),
            (SELECT COUNT(*) FROM questions WHERE date(created_at) = date('now'))",
    )
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to compute daily stats: {:?}", e);
        AppError::from(e)
    })?;

    let (answers_today, correct_answers_today): (i64, i64) = sqlx::query_as(
        "SELECT
            COUNT(*),
            COALESCE(SUM(CASE WHEN is_correct THEN 1 ELSE 0 END), 0)
         FROM user_answers
         WHERE date(created_at) = date('now')",
    )
    .fetch_one(&pool)
    .await?;

    Ok(Json(DailyStats {
        total_users,
        total_questions,
        questions_created_today,
        answers_today,
        correct_answers_today,
    }))
}
