// tests/feed_tests.rs

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use civils_daily::{
    client::{ClientError, friendly_message},
    error::ErrorCode,
    feed::{
        AutoAdvance, Countdown, FeedConfig, FeedController, FeedPreferences, FeedStatus,
        LoadOutcome, QuestionSource, ScrollDecision, TickOutcome,
    },
    models::{
        answer::SaveAnswerRequest,
        question::{ALL_CATEGORIES, Difficulty, GenerateQuestionsRequest, Question, QuestionFormat},
    },
};
use tokio::sync::Notify;

/// In-memory question source. Every question's correct option is "a".
#[derive(Default)]
struct MockSource {
    library: Vec<(String, Question)>,
    correct: Mutex<HashSet<i64>>,
    saves: Mutex<Vec<SaveAnswerRequest>>,
    requests: Mutex<Vec<GenerateQuestionsRequest>>,
    /// The next generate call parks until `release` is notified.
    hold_next: AtomicBool,
    held: Notify,
    release: Notify,
    fail_next: Mutex<Option<ClientError>>,
}

impl MockSource {
    fn with_categories(categories: &[(&str, usize)]) -> Self {
        let mut library = Vec::new();
        let mut id = 0;
        for (name, count) in categories {
            for _ in 0..*count {
                id += 1;
                library.push((name.to_string(), question(id)));
            }
        }
        Self {
            library,
            ..Self::default()
        }
    }

    fn mark_correct(&self, ids: impl IntoIterator<Item = i64>) {
        self.correct.lock().unwrap().extend(ids);
    }

    fn saves(&self) -> Vec<SaveAnswerRequest> {
        self.saves.lock().unwrap().clone()
    }

    fn requested_counts(&self) -> Vec<i64> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r.count)
            .collect()
    }

    fn category_of(&self, id: i64) -> &str {
        self.library
            .iter()
            .find(|(_, q)| q.id == id)
            .map(|(c, _)| c.as_str())
            .unwrap()
    }
}

#[async_trait]
impl QuestionSource for MockSource {
    async fn correct_answers(&self) -> Result<HashSet<i64>, ClientError> {
        Ok(self.correct.lock().unwrap().clone())
    }

    async fn generate_questions(
        &self,
        request: &GenerateQuestionsRequest,
    ) -> Result<Vec<Question>, ClientError> {
        self.requests.lock().unwrap().push(request.clone());

        if self.hold_next.swap(false, Ordering::SeqCst) {
            self.held.notify_one();
            self.release.notified().await;
        }

        if let Some(err) = self.fail_next.lock().unwrap().take() {
            return Err(err);
        }

        // Newest first, at most count * 3 per category.
        let per_category = request.count.unwrap_or(2) as usize * 3;
        let mut taken: HashMap<String, usize> = HashMap::new();
        Ok(self
            .library
            .iter()
            .rev()
            .filter(|(c, _)| request.category == ALL_CATEGORIES || *c == request.category)
            .filter(|(c, _)| {
                let n = taken.entry(c.clone()).or_default();
                *n += 1;
                *n <= per_category
            })
            .map(|(_, q)| q.clone())
            .collect())
    }

    async fn save_answer(&self, request: &SaveAnswerRequest) -> Result<(), ClientError> {
        if request.is_correct {
            self.mark_correct([request.question_id]);
        }
        self.saves.lock().unwrap().push(request.clone());
        Ok(())
    }
}

fn question(id: i64) -> Question {
    Question {
        id,
        category_id: 1,
        question_format: if id % 2 == 0 {
            QuestionFormat::Statement
        } else {
            QuestionFormat::MultipleChoice
        },
        question_text: format!("Question {id}"),
        option_a: Some("Right".to_string()),
        option_b: Some("Wrong".to_string()),
        option_c: None,
        option_d: None,
        correct_answer: "a".to_string(),
        explanation: String::new(),
        difficulty: Difficulty::Medium,
        points: 10,
        created_at: None,
    }
}

fn test_config() -> FeedConfig {
    FeedConfig {
        time_limit: 3,
        initial_batch: 1,
        escalated_batch: 10,
        prefetch_batch: 1,
        ..FeedConfig::default()
    }
}

fn feed(source: &Arc<MockSource>, preferences: FeedPreferences) -> Arc<FeedController<MockSource>> {
    FeedController::new(Arc::clone(source), test_config(), preferences)
}

fn ids(controller: &FeedController<MockSource>) -> Vec<i64> {
    controller
        .snapshot()
        .questions
        .iter()
        .map(|s| s.question().id)
        .collect()
}

#[tokio::test(start_paused = true)]
async fn correctly_answered_questions_never_come_back() {
    let source = Arc::new(MockSource::with_categories(&[("Polity", 6)]));
    source.mark_correct([6, 5]);
    let controller = feed(&source, FeedPreferences::default());

    assert_eq!(controller.load_initial().await.unwrap(), LoadOutcome::Loaded(1));
    assert_eq!(ids(&controller), vec![4]);

    let outcome = controller.submit_answer(0, "A").unwrap();
    assert!(outcome.correct);
    assert_eq!(outcome.points_awarded, 10);
    assert!(outcome.persisted.await.unwrap());

    for _ in 0..2 {
        controller.load_initial().await.unwrap();
        let loaded = ids(&controller);
        assert_eq!(loaded.len(), 3);
        assert!(loaded.iter().all(|id| ![4, 5, 6].contains(id)));
    }
}

#[tokio::test]
async fn preference_filters_apply_to_every_load() {
    let source = Arc::new(MockSource::with_categories(&[("Economy", 6)]));
    let controller = feed(&source, FeedPreferences::default());
    controller.load_initial().await.unwrap();

    let outcome = controller
        .set_preferences(FeedPreferences {
            statement_only: true,
            ..FeedPreferences::default()
        })
        .await
        .unwrap();
    assert!(matches!(outcome, LoadOutcome::Loaded(_)));
    assert!(
        controller
            .snapshot()
            .questions
            .iter()
            .all(|s| s.question().question_format == QuestionFormat::Statement)
    );

    // Only the scrolling rule changes: no reload.
    let requests = source.requested_counts().len();
    let outcome = controller
        .set_preferences(FeedPreferences {
            statement_only: true,
            allow_scroll_without_answer: true,
            ..FeedPreferences::default()
        })
        .await
        .unwrap();
    assert_eq!(outcome, LoadOutcome::Skipped);
    assert_eq!(source.requested_counts().len(), requests);
}

#[tokio::test]
async fn timeout_is_reported_once() {
    let source = Arc::new(MockSource::with_categories(&[("Geography", 3)]));
    let controller = feed(&source, FeedPreferences::default());
    controller.load_initial().await.unwrap();

    assert!(matches!(controller.tick(), TickOutcome::Ticked { index: 0, time_left: 2 }));
    assert!(matches!(controller.tick(), TickOutcome::Ticked { index: 0, time_left: 1 }));

    let TickOutcome::TimedOut { index, saved } = controller.tick() else {
        panic!("expected the third tick to time out");
    };
    assert_eq!(index, 0);
    assert!(saved.await.unwrap());

    assert!(matches!(controller.tick(), TickOutcome::Idle));

    let saves = source.saves();
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0].selected_answer, None);
    assert!(!saves[0].is_correct);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.total_answered, 1);
    assert_eq!(snapshot.streak, 0);
    assert_eq!(snapshot.questions[0].answered_correctly(), Some(false));
    assert!(snapshot.questions[0].show_explanation());

    // Timeouts do not move the feed on.
    assert_eq!(snapshot.current_index, 0);
}

#[tokio::test]
async fn concurrent_prefetches_issue_one_request() {
    let source = Arc::new(MockSource::with_categories(&[("History", 20)]));
    let config = FeedConfig {
        prefetch_batch: 3,
        ..test_config()
    };
    let controller = FeedController::new(Arc::clone(&source), config, FeedPreferences::default());
    controller.load_initial().await.unwrap();
    assert!(controller.needs_prefetch());

    source.hold_next.store(true, Ordering::SeqCst);
    let (first, second, ()) = tokio::join!(
        controller.maybe_prefetch(),
        controller.maybe_prefetch(),
        async {
            source.held.notified().await;
            source.release.notify_one();
        }
    );

    // Nine newest, minus the three already in the feed.
    assert_eq!(first.unwrap(), LoadOutcome::Loaded(6));
    assert_eq!(second.unwrap(), LoadOutcome::Skipped);
    assert_eq!(source.requested_counts(), vec![1, 3]);

    let loaded = ids(&controller);
    let unique: HashSet<i64> = loaded.iter().copied().collect();
    assert_eq!(loaded.len(), 9);
    assert_eq!(unique.len(), 9);
}

#[tokio::test(start_paused = true)]
async fn answering_towards_the_end_prefetches_on_its_own() {
    let source = Arc::new(MockSource::with_categories(&[("History", 30)]));
    let config = FeedConfig {
        initial_batch: 3,
        prefetch_batch: 5,
        ..test_config()
    };
    let controller = FeedController::new(Arc::clone(&source), config, FeedPreferences::default());
    assert_eq!(controller.load_initial().await.unwrap(), LoadOutcome::Loaded(9));
    assert!(!controller.needs_prefetch());

    for i in 0..5 {
        let outcome = controller.submit_answer(i, "a").unwrap();
        assert!(outcome.persisted.await.unwrap());
    }

    // Reaching the fifth question from the end fetched the next batch.
    assert_eq!(source.requested_counts(), vec![3, 5]);
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.current_index, 5);
    assert_eq!(snapshot.questions.len(), 15);
}

#[tokio::test]
async fn newest_category_switch_wins() {
    let source = Arc::new(MockSource::with_categories(&[("Art", 4), ("Science", 4)]));
    let controller = feed(&source, FeedPreferences::default());

    source.hold_next.store(true, Ordering::SeqCst);
    let slow = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.switch_category("Art", None).await })
    };
    source.held.notified().await;

    let fast = controller.switch_category("Science", None).await.unwrap();
    assert_eq!(fast, LoadOutcome::Loaded(3));

    source.release.notify_one();
    assert_eq!(slow.await.unwrap().unwrap(), LoadOutcome::Stale);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.category, "Science");
    assert_eq!(snapshot.status, FeedStatus::Ready);
    assert!(
        snapshot
            .questions
            .iter()
            .all(|s| source.category_of(s.question().id) == "Science")
    );
}

#[tokio::test]
async fn empty_batch_escalates_once_on_load_only() {
    let source = Arc::new(MockSource::with_categories(&[("Ethics", 6)]));
    source.mark_correct([4, 5, 6]);
    let controller = feed(&source, FeedPreferences::default());

    assert_eq!(controller.load_initial().await.unwrap(), LoadOutcome::Loaded(3));
    assert_eq!(source.requested_counts(), vec![1, 10]);

    assert_eq!(controller.maybe_prefetch().await.unwrap(), LoadOutcome::Loaded(0));
    assert_eq!(source.requested_counts(), vec![1, 10, 1]);
}

#[tokio::test]
async fn nothing_left_marks_the_feed_empty() {
    let source = Arc::new(MockSource::with_categories(&[("Ethics", 2)]));
    source.mark_correct([1, 2]);
    let controller = feed(&source, FeedPreferences::default());

    assert_eq!(controller.load_initial().await.unwrap(), LoadOutcome::Empty);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.status, FeedStatus::Empty);
    assert!(snapshot.error.is_some());
    assert!(!controller.needs_prefetch());
    assert!(matches!(controller.tick(), TickOutcome::Idle));
}

#[tokio::test(start_paused = true)]
async fn unanswered_question_blocks_forward_scroll() {
    let source = Arc::new(MockSource::with_categories(&[("Polity", 3)]));
    let controller = feed(&source, FeedPreferences::default());
    controller.load_initial().await.unwrap();

    assert_eq!(controller.on_scroll(1), ScrollDecision::SnapBack(0));
    assert_eq!(controller.next_question(), None);

    let outcome = controller.submit_answer(0, "b").unwrap();
    assert!(!outcome.correct);
    assert!(outcome.persisted.await.unwrap());
    // Wrong answers wait for the user.
    assert_eq!(controller.snapshot().current_index, 0);
    assert_eq!(controller.snapshot().streak, 0);

    assert_eq!(controller.next_question(), Some(1));
    assert_eq!(controller.on_scroll(0), ScrollDecision::Ignored);
    controller.scroll_settled();
    assert_eq!(controller.on_scroll(0), ScrollDecision::Accepted(0));
    assert_eq!(controller.on_scroll(7), ScrollDecision::Ignored);

    // Answering twice is refused.
    assert!(controller.submit_answer(0, "a").is_none());
}

#[tokio::test(start_paused = true)]
async fn forward_fling_stops_at_the_first_unanswered_question() {
    let source = Arc::new(MockSource::with_categories(&[("Polity", 3)]));
    let controller = feed(&source, FeedPreferences::default());
    controller.load_initial().await.unwrap();

    let outcome = controller.submit_answer(0, "b").unwrap();
    assert!(outcome.persisted.await.unwrap());

    assert_eq!(controller.on_scroll(2), ScrollDecision::SnapBack(1));
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.current_index, 1);
    assert!(!snapshot.questions[1].is_answered());

    // Going back to an answered question does not open a way past it.
    assert_eq!(controller.on_scroll(0), ScrollDecision::Accepted(0));
    assert_eq!(controller.on_scroll(2), ScrollDecision::SnapBack(1));
    assert!(matches!(controller.tick(), TickOutcome::Ticked { index: 1, time_left: 2 }));
}

#[tokio::test]
async fn free_scrolling_skips_the_gate() {
    let source = Arc::new(MockSource::with_categories(&[("Polity", 3)]));
    let controller = feed(
        &source,
        FeedPreferences {
            allow_scroll_without_answer: true,
            ..FeedPreferences::default()
        },
    );
    controller.load_initial().await.unwrap();

    assert_eq!(controller.on_scroll(2), ScrollDecision::Accepted(2));
    assert_eq!(controller.snapshot().current_index, 2);
}

async fn index_after_answer(policy: AutoAdvance, answer: &str) -> usize {
    let source = Arc::new(MockSource::with_categories(&[("Science", 3)]));
    let controller = feed(
        &source,
        FeedPreferences {
            auto_advance: policy,
            ..FeedPreferences::default()
        },
    );
    controller.load_initial().await.unwrap();

    let outcome = controller.submit_answer(0, answer).unwrap();
    assert!(outcome.persisted.await.unwrap());
    controller.snapshot().current_index
}

#[tokio::test(start_paused = true)]
async fn auto_advance_follows_policy() {
    assert_eq!(index_after_answer(AutoAdvance::CorrectOnly, "a").await, 1);
    assert_eq!(index_after_answer(AutoAdvance::CorrectOnly, "b").await, 0);
    assert_eq!(index_after_answer(AutoAdvance::Always, "b").await, 1);
    assert_eq!(index_after_answer(AutoAdvance::Never, "a").await, 0);
}

#[tokio::test(start_paused = true)]
async fn auto_advance_waits_for_the_delay() {
    let source = Arc::new(MockSource::with_categories(&[("Science", 3)]));
    let controller = feed(&source, FeedPreferences::default());
    controller.load_initial().await.unwrap();

    let outcome = controller.submit_answer(0, "a").unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(controller.snapshot().current_index, 0);

    assert!(outcome.persisted.await.unwrap());
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.current_index, 1);
    assert_eq!(snapshot.score, 10);
    assert_eq!(snapshot.streak, 1);

    // Programmatic scroll in flight: the viewport's own events are ignored.
    assert_eq!(controller.on_scroll(0), ScrollDecision::Ignored);
    controller.scroll_settled();
    assert_eq!(controller.on_scroll(1), ScrollDecision::Accepted(1));
}

#[tokio::test]
async fn switching_category_requests_scroll_to_top() {
    let source = Arc::new(MockSource::with_categories(&[("Art", 3), ("Science", 3)]));
    let controller = feed(&source, FeedPreferences::default());
    controller.load_initial().await.unwrap();
    assert!(controller.snapshot().category_bar_auto_scroll);

    controller.switch_category("Art", None).await.unwrap();

    let snapshot = controller.snapshot();
    assert!(snapshot.scroll_to_top_requested);
    assert!(!snapshot.category_bar_auto_scroll);
    assert_eq!(snapshot.current_index, 0);
    assert_eq!(controller.on_scroll(0), ScrollDecision::Ignored);

    controller.scroll_settled();
    let snapshot = controller.snapshot();
    assert!(!snapshot.scroll_to_top_requested);
    assert!(snapshot.category_bar_auto_scroll);
}

#[tokio::test]
async fn rejected_session_signs_the_feed_out() {
    let source = Arc::new(MockSource::with_categories(&[("Polity", 3)]));
    let err = ClientError::Api {
        status: 401,
        code: Some(ErrorCode::ExpiredToken),
        message: "Token expired".to_string(),
    };
    *source.fail_next.lock().unwrap() = Some(err.clone());
    let controller = feed(&source, FeedPreferences::default());

    assert!(controller.load_initial().await.is_err());

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.status, FeedStatus::SignedOut);
    assert_eq!(snapshot.error, Some(friendly_message(&err)));
}

#[tokio::test(start_paused = true)]
async fn countdown_times_out_the_active_question() {
    let source = Arc::new(MockSource::with_categories(&[("Polity", 3)]));
    let controller = feed(&source, FeedPreferences::default());
    controller.load_initial().await.unwrap();

    let countdown = Countdown::start(Arc::clone(&controller));
    assert!(countdown.is_running());

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(controller.snapshot().questions[0].time_left(), 2);

    tokio::time::sleep(Duration::from_secs(3)).await;
    let snapshot = controller.snapshot();
    assert!(snapshot.questions[0].is_answered());
    assert_eq!(source.saves().len(), 1);

    assert_eq!(controller.next_question(), Some(1));
    drop(countdown);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(controller.snapshot().questions[1].time_left(), 3);
}
