// src/feed/state.rs

use crate::models::question::Question;

/// Where a question is in its life. There is no way back to `Unanswered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionPhase {
    Unanswered { time_left: u32 },
    Answered { correct: bool, explanation_visible: bool },
}

/// One card of the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionState {
    question: Question,
    selected_answer: Option<String>,
    show_explanation: bool,
    time_left: u32,
    answered_correctly: Option<bool>,
    is_answered: bool,
}

impl QuestionState {
    pub fn new(question: Question, time_limit: u32) -> Self {
        Self {
            question,
            selected_answer: None,
            show_explanation: false,
            time_left: time_limit,
            answered_correctly: None,
            is_answered: false,
        }
    }

    pub fn question(&self) -> &Question {
        &self.question
    }

    /// `None` for an unanswered question and for a timeout.
    pub fn selected_answer(&self) -> Option<&str> {
        self.selected_answer.as_deref()
    }

    pub fn show_explanation(&self) -> bool {
        self.show_explanation
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn answered_correctly(&self) -> Option<bool> {
        self.answered_correctly
    }

    pub fn is_answered(&self) -> bool {
        self.is_answered
    }

    pub fn phase(&self) -> QuestionPhase {
        match self.answered_correctly {
            Some(correct) if self.is_answered => QuestionPhase::Answered {
                correct,
                explanation_visible: self.show_explanation,
            },
            _ => QuestionPhase::Unanswered {
                time_left: self.time_left,
            },
        }
    }

    /// One second off the clock. Returns true when this tick ran it out, in
    /// which case the question is now answered incorrectly.
    pub(crate) fn tick(&mut self) -> bool {
        if self.is_answered {
            return false;
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            self.finish(None, false);
            return true;
        }
        false
    }

    /// Locks in an answer. Returns whether the answer is correct, or `None`
    /// if the question was already answered.
    pub(crate) fn answer(&mut self, selected: &str) -> Option<bool> {
        if self.is_answered {
            return None;
        }
        let correct = self.question.is_correct(selected);
        self.finish(Some(selected.trim().to_lowercase()), correct);
        Some(correct)
    }

    fn finish(&mut self, selected: Option<String>, correct: bool) {
        self.selected_answer = selected;
        self.answered_correctly = Some(correct);
        self.show_explanation = true;
        self.is_answered = true;
    }
}
