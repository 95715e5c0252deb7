// src/models/category.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'categories' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: i64,

    pub name: String,

    pub description: String,

    /// Denormalized number of questions in this category.
    /// Incremented in the same transaction that inserts a question.
    pub question_count: i64,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Admin listing row: a category plus the exams it is mapped to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryWithExams {
    #[serde(flatten)]
    pub category: Category,
    pub exam_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryListResponse<T = Category> {
    pub categories: Vec<T>,
}

/// Query parameters for listing categories.
#[derive(Debug, Deserialize)]
pub struct CategoryListParams {
    pub exam_id: Option<i64>,
}

/// DTO for creating a new category.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Category name must be between 1 and 100 chars"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,
}

/// DTO for updating a category. Fields are optional.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}
