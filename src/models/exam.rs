// src/models/exam.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'exams' table in the database.
/// An exam is a preparation track mapped to many categories.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Exam {
    pub id: i64,

    pub name: String,

    /// Free-text grouping label (e.g. "UPSC", "State PSC").
    pub category: String,

    pub description: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamListResponse {
    pub exams: Vec<Exam>,
}

/// DTO for creating a new exam.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateExamRequest {
    #[validate(length(min = 1, max = 100, message = "Exam name must be between 1 and 100 chars"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub category: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,
}

/// DTO for updating an exam. Fields are optional.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateExamRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}
