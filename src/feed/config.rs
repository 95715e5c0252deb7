// src/feed/config.rs

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::question::Difficulty;

/// When to move on automatically after an answer has been saved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoAdvance {
    /// Only after a correct answer; a wrong answer waits for the user.
    #[default]
    CorrectOnly,
    Always,
    Never,
}

impl AutoAdvance {
    pub fn applies(self, correct: bool) -> bool {
        match self {
            AutoAdvance::CorrectOnly => correct,
            AutoAdvance::Always => true,
            AutoAdvance::Never => false,
        }
    }
}

/// User-tunable feed settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPreferences {
    /// Keep only statement-format questions.
    pub statement_only: bool,
    /// Keep only questions of this difficulty.
    pub difficulty: Option<Difficulty>,
    /// Let the user scroll past a question they have not answered.
    pub allow_scroll_without_answer: bool,
    pub auto_advance: AutoAdvance,
}

impl FeedPreferences {
    /// Whether switching from `other` changes which questions qualify.
    pub fn filters_differ(&self, other: &FeedPreferences) -> bool {
        self.statement_only != other.statement_only || self.difficulty != other.difficulty
    }
}

/// Fixed feed tuning.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Seconds per question.
    pub time_limit: u32,
    /// Prefetch once the active index is this close to the end.
    pub prefetch_threshold: usize,
    pub initial_batch: i64,
    /// Batch size for the single retry when a load filters down to nothing.
    pub escalated_batch: i64,
    pub prefetch_batch: i64,
    pub auto_advance_delay: Duration,
    pub tick_period: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            time_limit: 30,
            prefetch_threshold: 5,
            initial_batch: 5,
            escalated_batch: 10,
            prefetch_batch: 5,
            auto_advance_delay: Duration::from_secs(2),
            tick_period: Duration::from_secs(1),
        }
    }
}
