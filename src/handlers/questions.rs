// src/handlers/questions.rs

use axum::{Json, extract::State, response::IntoResponse};
use sqlx::{Sqlite, SqlitePool};
use validator::Validate;

use crate::{
    config::{DEFAULT_QUESTION_COUNT, QUESTION_FETCH_MULTIPLIER},
    error::AppError,
    models::question::{ALL_CATEGORIES, GenerateQuestionsRequest, GenerateQuestionsResponse, Question},
    utils::extract::AppJson,
};

/// Returns a batch of candidate questions for the feed.
///
/// * `category == "all"` matches every category, or the exam's mapped
///   categories when `exam_id` is given.
/// * A named category must exist (404). With an `exam_id` it is intersected
///   with the exam's mappings; an empty intersection is an empty list.
/// * Up to `count * QUESTION_FETCH_MULTIPLIER` newest questions are taken
///   per matched category. Ordering is newest first; the client shuffles.
pub async fn generate_questions(
    State(pool): State<SqlitePool>,
    AppJson(req): AppJson<GenerateQuestionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = req.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let count = req.count.unwrap_or(DEFAULT_QUESTION_COUNT);
    let category_ids = resolve_category_ids(&pool, req.category.trim(), req.exam_id).await?;

    if category_ids.is_empty() {
        return Ok(Json(GenerateQuestionsResponse { questions: vec![] }));
    }

    let questions = fetch_newest_per_category(&pool, &category_ids, count * QUESTION_FETCH_MULTIPLIER)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch questions: {:?}", e);
            AppError::from(e)
        })?;

    tracing::debug!(
        category = %req.category,
        exam_id = ?req.exam_id,
        returned = questions.len(),
        "Generated question batch"
    );

    Ok(Json(GenerateQuestionsResponse { questions }))
}

/// Maps the requested category (and optional exam) to concrete category ids.
async fn resolve_category_ids(
    pool: &SqlitePool,
    category: &str,
    exam_id: Option<i64>,
) -> Result<Vec<i64>, AppError> {
    if let Some(exam_id) = exam_id {
        sqlx::query_scalar::<_, i64>("SELECT id FROM exams WHERE id = ?")
            .bind(exam_id)
            .fetch_optional(pool)
            .await?
            .ok_or(AppError::NotFound(format!("Exam {} not found", exam_id)))?;
    }

    if category.eq_ignore_ascii_case(ALL_CATEGORIES) {
        let ids = match exam_id {
            Some(exam_id) => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT category_id FROM exam_categories WHERE exam_id = ? ORDER BY category_id",
                )
                .bind(exam_id)
                .fetch_all(pool)
                .await?
            }
            None => {
                sqlx::query_scalar::<_, i64>("SELECT id FROM categories ORDER BY id")
                    .fetch_all(pool)
                    .await?
            }
        };
        return Ok(ids);
    }

    let category_id = sqlx::query_scalar::<_, i64>("SELECT id FROM categories WHERE name = ?")
        .bind(category)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound(format!("Category '{}' not found", category)))?;

    let Some(exam_id) = exam_id else {
        return Ok(vec![category_id]);
    };

    let mapped = sqlx::query_scalar::<_, i64>(
        "SELECT category_id FROM exam_categories WHERE exam_id = ? AND category_id = ?",
    )
    .bind(exam_id)
    .bind(category_id)
    .fetch_optional(pool)
    .await?;

    Ok(mapped.into_iter().collect())
}

/// Newest `per_category` questions of each category, ties broken by id.
async fn fetch_newest_per_category(
    pool: &SqlitePool,
    category_ids: &[i64],
    per_category: i64,
) -> Result<Vec<Question>, sqlx::Error> {
    // Use QueryBuilder for dynamic IN clause
    let mut query_builder = sqlx::QueryBuilder::<Sqlite>::new(
        "SELECT
            id, category_id, question_format, question_text,
            option_a, option_b, option_c, option_d,
            correct_answer, explanation, difficulty, points, created_at
        FROM (
            SELECT q.*, ROW_NUMBER() OVER (
                PARTITION BY q.category_id
                ORDER BY q.created_at DESC, q.id DESC
            ) AS rank_in_category
            FROM questions q
            WHERE q.category_id IN (",
    );

    let mut separated = query_builder.separated(",");
    for id in category_ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")) WHERE rank_in_category <= ");
    query_builder.push_bind(per_category);
    query_builder.push(" ORDER BY created_at DESC, id DESC");

    query_builder.build_query_as::<Question>().fetch_all(pool).await
}
