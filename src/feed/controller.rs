// src/feed/controller.rs

use std::{
    collections::HashSet,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use tokio::task::JoinHandle;

use super::{
    config::{FeedConfig, FeedPreferences},
    filter::{apply_filters, shuffle},
    source::QuestionSource,
    state::QuestionState,
};
use crate::{
    client::{ClientError, friendly_message},
    models::{
        answer::SaveAnswerRequest,
        question::{ALL_CATEGORIES, GenerateQuestionsRequest, Question},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    Idle,
    Loading,
    Ready,
    /// The last load found nothing to show.
    Empty,
    /// A call was rejected for authentication; the user must sign in again.
    SignedOut,
}

/// Result of a load or prefetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// This many questions were put into the feed.
    Loaded(usize),
    /// Nothing qualified, even after escalating the batch size.
    Empty,
    /// Prefetch was not needed or one was already in flight.
    Skipped,
    /// A newer load started while this one was waiting; its result was dropped.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDecision {
    /// The active index is now this one.
    Accepted(usize),
    /// The scroll is not allowed; put the viewport back on this index.
    SnapBack(usize),
    /// A programmatic scroll is in progress, or the target does not exist.
    Ignored,
}

#[derive(Debug)]
pub enum TickOutcome {
    /// Nothing is counting down.
    Idle,
    Ticked { index: usize, time_left: u32 },
    /// The active question ran out of time. The handle resolves once the
    /// timeout has been reported, with whether that succeeded.
    TimedOut { index: usize, saved: JoinHandle<bool> },
}

#[derive(Debug)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub points_awarded: i64,
    /// Resolves once the answer has been reported (and, when the auto
    /// advance policy applies, after the advance), with whether the report
    /// succeeded.
    pub persisted: JoinHandle<bool>,
}

/// Read-only copy of the feed for rendering.
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub questions: Vec<QuestionState>,
    pub current_index: usize,
    pub category: String,
    pub exam_id: Option<i64>,
    pub preferences: FeedPreferences,
    pub score: i64,
    pub streak: u32,
    pub total_answered: u32,
    pub status: FeedStatus,
    pub error: Option<String>,
    pub scroll_to_top_requested: bool,
    pub category_bar_auto_scroll: bool,
    pub generation: u64,
}

struct FeedInner {
    questions: Vec<QuestionState>,
    current_index: usize,
    category: String,
    exam_id: Option<i64>,
    preferences: FeedPreferences,
    score: i64,
    streak: u32,
    total_answered: u32,
    status: FeedStatus,
    error: Option<String>,
    programmatic_scroll: bool,
    scroll_to_top_requested: bool,
    category_bar_auto_scroll: bool,
}

/// What a load asks the source for, captured before the first await.
struct BatchPlan {
    category: String,
    exam_id: Option<i64>,
    preferences: FeedPreferences,
    count: i64,
    escalate_to: Option<i64>,
    /// Ids already in the feed, kept out of an appended batch.
    loaded: HashSet<i64>,
}

/// Clears the single-flight flag when a prefetch finishes, however it ends.
struct PrefetchGuard<'a>(&'a AtomicBool);

impl Drop for PrefetchGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives one user's feed.
///
/// State lives behind a mutex that is never held across an await. Every
/// full load bumps `generation`; a response that comes back under an older
/// generation is discarded, so the newest load always wins.
pub struct FeedController<S: QuestionSource + 'static> {
    source: Arc<S>,
    config: FeedConfig,
    inner: Mutex<FeedInner>,
    prefetching: AtomicBool,
    generation: AtomicU64,
}

impl<S: QuestionSource + 'static> FeedController<S> {
    pub fn new(source: Arc<S>, config: FeedConfig, preferences: FeedPreferences) -> Arc<Self> {
        Arc::new(Self {
            source,
            config,
            inner: Mutex::new(FeedInner {
                questions: Vec::new(),
                current_index: 0,
                category: ALL_CATEGORIES.to_string(),
                exam_id: None,
                preferences,
                score: 0,
                streak: 0,
                total_answered: 0,
                status: FeedStatus::Idle,
                error: None,
                programmatic_scroll: false,
                scroll_to_top_requested: false,
                category_bar_auto_scroll: true,
            }),
            prefetching: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, FeedInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        let inner = self.state();
        FeedSnapshot {
            questions: inner.questions.clone(),
            current_index: inner.current_index,
            category: inner.category.clone(),
            exam_id: inner.exam_id,
            preferences: inner.preferences.clone(),
            score: inner.score,
            streak: inner.streak,
            total_answered: inner.total_answered,
            status: inner.status,
            error: inner.error.clone(),
            scroll_to_top_requested: inner.scroll_to_top_requested,
            category_bar_auto_scroll: inner.category_bar_auto_scroll,
            generation: self.current_generation(),
        }
    }

    /// Replaces the feed with a fresh batch for the current category.
    pub async fn load_initial(self: &Arc<Self>) -> Result<LoadOutcome, ClientError> {
        self.reload(false).await
    }

    /// Loads `category` in the background. The old list stays visible until
    /// the new one has arrived; then the index resets and a scroll to the top
    /// is requested.
    pub async fn switch_category(
        self: &Arc<Self>,
        category: &str,
        exam_id: Option<i64>,
    ) -> Result<LoadOutcome, ClientError> {
        {
            let mut inner = self.state();
            inner.category = category.to_string();
            inner.exam_id = exam_id;
        }
        self.reload(true).await
    }

    /// Stores new preferences, reloading when they change which questions
    /// qualify.
    pub async fn set_preferences(
        self: &Arc<Self>,
        preferences: FeedPreferences,
    ) -> Result<LoadOutcome, ClientError> {
        let reload = {
            let mut inner = self.state();
            let reload = inner.preferences.filters_differ(&preferences);
            inner.preferences = preferences;
            reload
        };
        if reload {
            self.reload(false).await
        } else {
            Ok(LoadOutcome::Skipped)
        }
    }

    async fn reload(self: &Arc<Self>, scroll_to_top: bool) -> Result<LoadOutcome, ClientError> {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

        let plan = {
            let mut inner = self.state();
            inner.status = FeedStatus::Loading;
            inner.error = None;
            BatchPlan {
                category: inner.category.clone(),
                exam_id: inner.exam_id,
                preferences: inner.preferences.clone(),
                count: self.config.initial_batch,
                escalate_to: Some(self.config.escalated_batch),
                loaded: HashSet::new(),
            }
        };

        let result = self.fetch_batch(plan).await;

        if generation != self.current_generation() {
            tracing::warn!(generation, "Discarding stale feed load");
            return Ok(LoadOutcome::Stale);
        }

        let loaded = {
            let mut inner = self.state();
            let batch = match result {
                Ok(batch) => batch,
                Err(err) => {
                    Self::record_error(&mut inner, &err);
                    return Err(err);
                }
            };

            let loaded = batch.len();
            inner.questions = batch
                .into_iter()
                .map(|q| QuestionState::new(q, self.config.time_limit))
                .collect();
            inner.current_index = 0;

            if scroll_to_top {
                inner.scroll_to_top_requested = true;
                inner.category_bar_auto_scroll = false;
                inner.programmatic_scroll = true;
            }

            if loaded == 0 {
                inner.status = FeedStatus::Empty;
                inner.error = Some("No questions available.".to_string());
                return Ok(LoadOutcome::Empty);
            }
            inner.status = FeedStatus::Ready;
            loaded
        };

        // A short first batch already sits near the end.
        self.schedule_prefetch();
        Ok(LoadOutcome::Loaded(loaded))
    }

    /// Whether the active index is close enough to the end to fetch more.
    pub fn needs_prefetch(&self) -> bool {
        let inner = self.state();
        !inner.questions.is_empty()
            && inner.current_index + self.config.prefetch_threshold >= inner.questions.len()
    }

    /// Spawns a background prefetch when the active index is near the end.
    /// A prefetch that comes back stale is retried against the feed that
    /// replaced it.
    fn schedule_prefetch(self: &Arc<Self>) {
        if !self.needs_prefetch() || self.prefetching.load(Ordering::Acquire) {
            return;
        }
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match controller.maybe_prefetch().await {
                    Ok(LoadOutcome::Stale) => continue,
                    Ok(LoadOutcome::Loaded(appended)) => {
                        tracing::debug!(appended, "Background prefetch finished");
                        break;
                    }
                    Ok(_) => break,
                    Err(err) => {
                        tracing::debug!(error = %err, "Background prefetch failed");
                        break;
                    }
                }
            }
        });
    }

    /// Appends a batch when the end of the feed is near. Concurrent triggers
    /// while one prefetch is in flight are dropped, not queued.
    pub async fn maybe_prefetch(&self) -> Result<LoadOutcome, ClientError> {
        if !self.needs_prefetch() {
            return Ok(LoadOutcome::Skipped);
        }

        if self
            .prefetching
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(LoadOutcome::Skipped);
        }
        let _guard = PrefetchGuard(&self.prefetching);

        let generation = self.current_generation();

        let plan = {
            let inner = self.state();
            BatchPlan {
                category: inner.category.clone(),
                exam_id: inner.exam_id,
                preferences: inner.preferences.clone(),
                count: self.config.prefetch_batch,
                escalate_to: None,
                loaded: inner.questions.iter().map(|s| s.question().id).collect(),
            }
        };

        let result = self.fetch_batch(plan).await;

        if generation != self.current_generation() {
            tracing::warn!(generation, "Discarding stale prefetch");
            return Ok(LoadOutcome::Stale);
        }

        let mut inner = self.state();
        match result {
            Ok(batch) => {
                let appended = batch.len();
                let time_limit = self.config.time_limit;
                inner
                    .questions
                    .extend(batch.into_iter().map(|q| QuestionState::new(q, time_limit)));
                if appended > 0 {
                    inner.status = FeedStatus::Ready;
                }
                Ok(LoadOutcome::Loaded(appended))
            }
            Err(err) => {
                Self::record_error(&mut inner, &err);
                Err(err)
            }
        }
    }

    /// Exclusion set, batch, filters, one escalation if allowed, shuffle.
    async fn fetch_batch(&self, plan: BatchPlan) -> Result<Vec<Question>, ClientError> {
        let mut excluded = self.source.correct_answers().await?;
        excluded.extend(plan.loaded.iter().copied());

        let mut request = GenerateQuestionsRequest {
            category: plan.category,
            count: Some(plan.count),
            exam_id: plan.exam_id,
        };

        let batch = self.source.generate_questions(&request).await?;
        let mut kept = apply_filters(batch, &excluded, &plan.preferences);

        if kept.is_empty() {
            if let Some(escalated) = plan.escalate_to {
                tracing::debug!(count = escalated, "Batch filtered to nothing, escalating");
                request.count = Some(escalated);
                let batch = self.source.generate_questions(&request).await?;
                kept = apply_filters(batch, &excluded, &plan.preferences);
            }
        }

        shuffle(&mut kept);
        Ok(kept)
    }

    fn record_error(inner: &mut FeedInner, err: &ClientError) {
        tracing::warn!(error = %err, "Feed request failed");
        inner.error = Some(friendly_message(err));
        inner.status = if err.is_auth_failure() {
            FeedStatus::SignedOut
        } else if inner.questions.is_empty() {
            FeedStatus::Empty
        } else {
            FeedStatus::Ready
        };
    }

    /// One second of the active question's countdown. Only the active,
    /// unanswered question is ever decremented.
    pub fn tick(self: &Arc<Self>) -> TickOutcome {
        let (index, question_id) = {
            let mut inner = self.state();
            let index = inner.current_index;
            let Some(state) = inner.questions.get_mut(index) else {
                return TickOutcome::Idle;
            };
            if state.is_answered() {
                return TickOutcome::Idle;
            }
            if !state.tick() {
                return TickOutcome::Ticked {
                    index,
                    time_left: state.time_left(),
                };
            }
            let question_id = state.question().id;
            inner.streak = 0;
            inner.total_answered += 1;
            (index, question_id)
        };

        tracing::debug!(question_id, "Question timed out");

        let request = SaveAnswerRequest {
            question_id,
            selected_answer: None,
            is_correct: false,
        };
        let controller = Arc::clone(self);
        let saved = tokio::spawn(async move { controller.persist(request).await });

        TickOutcome::TimedOut { index, saved }
    }

    /// Locks in an answer for the question at `index`.
    ///
    /// Returns `None` if there is no such question or it is already answered.
    /// The answer is reported in the background; once that succeeds the
    /// auto-advance policy may move to the next question after a delay.
    pub fn submit_answer(self: &Arc<Self>, index: usize, selected: &str) -> Option<AnswerOutcome> {
        let generation = self.current_generation();

        let (correct, points_awarded, question_id, auto_advance) = {
            let mut inner = self.state();
            let state = inner.questions.get_mut(index)?;
            let correct = state.answer(selected)?;
            let question_id = state.question().id;
            let points = if correct { state.question().points } else { 0 };

            inner.score += points;
            inner.streak = if correct { inner.streak + 1 } else { 0 };
            inner.total_answered += 1;
            (correct, points, question_id, inner.preferences.auto_advance)
        };

        let request = SaveAnswerRequest {
            question_id,
            selected_answer: Some(selected.trim().to_lowercase()),
            is_correct: correct,
        };
        let controller = Arc::clone(self);
        let delay = self.config.auto_advance_delay;

        let persisted = tokio::spawn(async move {
            let saved = controller.persist(request).await;
            if saved && auto_advance.applies(correct) {
                tokio::time::sleep(delay).await;
                controller.advance_from(index, generation);
            }
            saved
        });

        Some(AnswerOutcome {
            correct,
            points_awarded,
            persisted,
        })
    }

    async fn persist(&self, request: SaveAnswerRequest) -> bool {
        match self.source.save_answer(&request).await {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(
                    question_id = request.question_id,
                    error = %err,
                    "Failed to save answer"
                );
                if err.is_auth_failure() {
                    Self::record_error(&mut self.state(), &err);
                }
                false
            }
        }
    }

    /// Auto-advance target: only if the feed was not replaced meanwhile and
    /// the user is still on the answered question.
    fn advance_from(self: &Arc<Self>, index: usize, generation: u64) {
        if generation != self.current_generation() {
            return;
        }
        {
            let mut inner = self.state();
            if inner.current_index != index || index + 1 >= inner.questions.len() {
                return;
            }
            inner.current_index = index + 1;
            inner.programmatic_scroll = true;
        }
        self.schedule_prefetch();
    }

    /// User-initiated move to the next question. Refused while the active
    /// question is unanswered, unless free scrolling is enabled.
    pub fn next_question(self: &Arc<Self>) -> Option<usize> {
        let next = {
            let mut inner = self.state();
            let current = inner.current_index;
            let answered = inner.questions.get(current).is_some_and(|s| s.is_answered());
            if !answered && !inner.preferences.allow_scroll_without_answer {
                return None;
            }
            if current + 1 >= inner.questions.len() {
                return None;
            }
            inner.current_index = current + 1;
            inner.programmatic_scroll = true;
            current + 1
        };
        self.schedule_prefetch();
        Some(next)
    }

    /// The user scrolled so that `index` is in view.
    ///
    /// Without free scrolling a forward move may not pass an unanswered
    /// question: the view snaps back to the first one between the active
    /// question and `index`.
    pub fn on_scroll(self: &Arc<Self>, index: usize) -> ScrollDecision {
        let decision = {
            let mut inner = self.state();
            if inner.programmatic_scroll {
                return ScrollDecision::Ignored;
            }

            let current = inner.current_index;
            if index == current {
                return ScrollDecision::Accepted(current);
            }
            if index >= inner.questions.len() {
                return ScrollDecision::Ignored;
            }

            let blocked = if index > current && !inner.preferences.allow_scroll_without_answer {
                (current..index).find(|&i| !inner.questions[i].is_answered())
            } else {
                None
            };

            match blocked {
                Some(at) if at == current => return ScrollDecision::SnapBack(current),
                Some(at) => {
                    inner.current_index = at;
                    ScrollDecision::SnapBack(at)
                }
                None => {
                    inner.current_index = index;
                    ScrollDecision::Accepted(index)
                }
            }
        };
        self.schedule_prefetch();
        decision
    }

    /// The viewport finished a programmatic scroll.
    pub fn scroll_settled(&self) {
        let mut inner = self.state();
        inner.programmatic_scroll = false;
        inner.scroll_to_top_requested = false;
        inner.category_bar_auto_scroll = true;
    }
}
