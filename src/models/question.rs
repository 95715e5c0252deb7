// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// Option keys in display order.
pub const OPTION_KEYS: [&str; 4] = ["a", "b", "c", "d"];

/// Category name that selects every category (or every category of the exam).
pub const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum QuestionFormat {
    #[default]
    MultipleChoice,
    Statement,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// Represents the 'questions' table in the database.
/// Rows are immutable once inserted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: i64,

    pub category_id: i64,

    pub question_format: QuestionFormat,

    /// The text content of the question.
    pub question_text: String,

    pub option_a: Option<String>,
    pub option_b: Option<String>,
    pub option_c: Option<String>,
    pub option_d: Option<String>,

    /// Key of the correct option ('a'..'d').
    pub correct_answer: String,

    /// Explanation shown once the question is answered.
    pub explanation: String,

    pub difficulty: Difficulty,

    /// Score awarded for a correct answer.
    pub points: i64,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Question {
    pub fn is_correct(&self, answer: &str) -> bool {
        answer.trim().eq_ignore_ascii_case(self.correct_answer.trim())
    }
}

/// DTO for the generate endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenerateQuestionsRequest {
    /// Category name, or "all".
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(range(min = 1, max = 50))]
    pub count: Option<i64>,
    pub exam_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateQuestionsResponse {
    pub questions: Vec<Question>,
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CreateQuestionRequest {
    pub category_id: i64,
    #[serde(default)]
    pub question_format: QuestionFormat,
    #[validate(length(min = 1, max = 2000))]
    pub question_text: String,
    #[validate(length(max = 500))]
    pub option_a: Option<String>,
    #[validate(length(max = 500))]
    pub option_b: Option<String>,
    #[validate(length(max = 500))]
    pub option_c: Option<String>,
    #[validate(length(max = 500))]
    pub option_d: Option<String>,
    #[validate(custom(function = validate_option_key))]
    pub correct_answer: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub explanation: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[validate(range(min = 1, max = 100))]
    pub points: Option<i64>,
}

impl CreateQuestionRequest {
    /// The option named by `correct_answer` must actually be present.
    pub fn has_correct_option(&self) -> bool {
        let options = [&self.option_a, &self.option_b, &self.option_c, &self.option_d];
        OPTION_KEYS
            .iter()
            .position(|k| k.eq_ignore_ascii_case(self.correct_answer.trim()))
            .and_then(|i| options[i].as_ref())
            .is_some_and(|text| !text.trim().is_empty())
    }
}

fn validate_option_key(key: &str) -> Result<(), validator::ValidationError> {
    if !OPTION_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key.trim())) {
        return Err(validator::ValidationError::new("invalid_option_key"));
    }
    Ok(())
}
