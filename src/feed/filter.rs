// src/feed/filter.rs

use std::collections::HashSet;

use rand::{Rng, seq::SliceRandom};

use super::config::FeedPreferences;
use crate::models::question::{Question, QuestionFormat};

/// Client-side filtering of a fetched batch, in order: drop excluded ids,
/// then (if enabled) everything that is not a statement, then (if set)
/// every other difficulty.
pub fn apply_filters(
    batch: Vec<Question>,
    excluded: &HashSet<i64>,
    preferences: &FeedPreferences,
) -> Vec<Question> {
    batch
        .into_iter()
        .filter(|q| !excluded.contains(&q.id))
        .filter(|q| !preferences.statement_only || q.question_format == QuestionFormat::Statement)
        .filter(|q| preferences.difficulty.is_none_or(|d| q.difficulty == d))
        .collect()
}

/// Uniform random permutation (Fisher-Yates).
pub fn shuffle_with<R: Rng + ?Sized>(questions: &mut [Question], rng: &mut R) {
    questions.shuffle(rng);
}

pub fn shuffle(questions: &mut [Question]) {
    shuffle_with(questions, &mut rand::thread_rng());
}
