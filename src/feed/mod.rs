// src/feed/mod.rs
//
// Client-side feed: a rolling list of questions with per-question
// countdowns, background prefetch and answer reporting.

pub mod config;
pub mod controller;
pub mod countdown;
pub mod filter;
pub mod source;
pub mod state;

pub use config::{AutoAdvance, FeedConfig, FeedPreferences};
pub use controller::{
    AnswerOutcome, FeedController, FeedSnapshot, FeedStatus, LoadOutcome, ScrollDecision,
    TickOutcome,
};
pub use countdown::Countdown;
pub use source::QuestionSource;
pub use state::{QuestionPhase, QuestionState};
