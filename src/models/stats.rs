// src/models/stats.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Per-user answer totals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_answered: i64,
    pub correct_answers: i64,
    pub wrong_answers: i64,
}

/// Minimal reference to an exam or category, used in impact reports.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct NamedRef {
    pub id: i64,
    pub name: String,
}

/// What deleting an exam would touch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamDeletionImpact {
    pub exam_id: i64,
    pub exam_name: String,
    pub category_mappings_to_remove: i64,
    /// Users whose `exam_id` will be cleared.
    pub users_assigned: i64,
    /// Questions reachable only through this exam's categories.
    pub questions_no_longer_accessible: i64,
    /// Categories mapped to this exam and to no other.
    pub orphaned_categories: Vec<NamedRef>,
    pub orphaned_categories_count: i64,
}

/// What deleting a category would touch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDeletionImpact {
    pub category_id: i64,
    pub category_name: String,
    pub exam_mappings_to_remove: i64,
    pub exams_using_category: Vec<NamedRef>,
    pub questions_count: i64,
    /// Categories that still own questions cannot be deleted.
    pub can_delete: bool,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct CategoryQuestionCount {
    pub category_id: i64,
    pub category_name: String,
    pub question_count: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct ExamQuestionCount {
    pub exam_id: i64,
    pub exam_name: String,
    pub question_count: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct OrphanedCategory {
    pub id: i64,
    pub name: String,
    pub question_count: i64,
}

/// Admin view over the whole question library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionLibraryStats {
    pub total_questions: i64,
    pub questions_by_category: Vec<CategoryQuestionCount>,
    pub questions_by_exam: Vec<ExamQuestionCount>,
    pub orphaned_categories: Vec<OrphanedCategory>,
    pub orphaned_categories_count: i64,
}

/// Admin dashboard counters for the current UTC day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyStats {
    pub total_users: i64,
    pub total_questions: i64,
    pub questions_created_today: i64,
    pub answers_today: i64,
    pub correct_answers_today: i64,
}
