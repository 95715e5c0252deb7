// src/models/answer.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// DTO for recording one answer attempt.
/// `selected_answer` is null when the question timed out or was skipped.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SaveAnswerRequest {
    pub question_id: i64,
    #[validate(length(max = 10))]
    pub selected_answer: Option<String>,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Ids of questions the user has answered correctly at least once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectAnswersResponse {
    pub correct_answers: Vec<i64>,
}
