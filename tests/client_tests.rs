// tests/client_tests.rs

mod common;

use std::{sync::Arc, time::Duration};

use civils_daily::{
    client::{ApiClient, ClientConfig, ClientError, RetryPolicy, Session, friendly_message},
    error::ErrorCode,
    feed::{AutoAdvance, FeedConfig, FeedController, FeedPreferences, FeedStatus, LoadOutcome},
    models::{answer::SaveAnswerRequest, question::GenerateQuestionsRequest},
    utils::jwt::sign_jwt,
};
use common::{TestApp, spawn_app, unique_email};

fn client_for(app: &TestApp) -> ApiClient {
    ApiClient::new(ClientConfig {
        retry: RetryPolicy::none(),
        ..ClientConfig::with_base_url(app.url(""))
    })
    .expect("Failed to build client")
}

#[tokio::test]
async fn signup_keeps_the_session() {
    let app = spawn_app().await;
    let client = client_for(&app);
    let email = unique_email();

    assert!(!client.is_authenticated());
    let auth = client.signup(&email, "password123").await.unwrap();
    assert_eq!(auth.user.email, email);

    assert!(client.is_authenticated());
    let user = client.current_user().unwrap();
    assert_eq!(user.email, email);
    assert_eq!(user.user_id, auth.user.id);

    let me = client.me().await.unwrap();
    assert_eq!(me.id, auth.user.id);
    assert_eq!(me.exam_id, None);

    let exam = app.insert_exam("UPSC Prelims").await;
    let exams = client.exams().await.unwrap();
    assert_eq!(exams.len(), 1);

    client.set_exam(Some(exam)).await.unwrap();
    assert_eq!(client.me().await.unwrap().exam_id, Some(exam));

    client.logout();
    assert!(client.current_user().is_none());
    assert!(matches!(client.me().await, Err(ClientError::NotSignedIn)));

    client.login(&email, "password123").await.unwrap();
    assert!(client.is_authenticated());
}

#[tokio::test]
async fn wrong_password_reports_friendly_message() {
    let app = spawn_app().await;
    let client = client_for(&app);
    let email = unique_email();
    app.signup(&email, "password123").await;

    let err = client.login(&email, "nope-nope").await.unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::InvalidCredentials));
    assert_eq!(friendly_message(&err), "Invalid email or password. Please try again.");
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn answering_through_the_client() {
    let app = spawn_app().await;
    let client = client_for(&app);
    client.signup(&unique_email(), "password123").await.unwrap();

    let category = app.insert_category("Environment").await;
    let first = app.insert_question(category, "Which gas dominates the atmosphere?").await;
    app.insert_question(category, "Which layer holds ozone?").await;

    let categories = client.categories(None).await.unwrap();
    assert_eq!(categories[0].name, "Environment");
    assert_eq!(categories[0].question_count, 2);

    let questions = client
        .generate_questions(&GenerateQuestionsRequest {
            category: "Environment".to_string(),
            count: Some(1),
            exam_id: None,
        })
        .await
        .unwrap();
    assert_eq!(questions.len(), 2);

    client
        .save_answer(&SaveAnswerRequest {
            question_id: first,
            selected_answer: Some("a".to_string()),
            is_correct: true,
        })
        .await
        .unwrap();

    assert_eq!(client.correct_answers().await.unwrap(), vec![first]);

    let stats = client.stats().await.unwrap();
    assert_eq!(stats.total_answered, 1);
    assert_eq!(stats.correct_answers, 1);
    assert_eq!(stats.wrong_answers, 0);
}

#[tokio::test]
async fn rejected_token_clears_the_session() {
    let app = spawn_app().await;
    let client = client_for(&app);

    let forged = sign_jwt(1, "someone@example.com", "user", "not-the-server-secret", 600).unwrap();
    client.set_session(Session::new(forged));
    assert!(client.is_authenticated());

    let err = client.stats().await.unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::InvalidToken));
    assert!(err.is_auth_failure());
    assert!(client.session().is_none());
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let client = ApiClient::new(ClientConfig {
        base_url: "http://127.0.0.1:1/api".to_string(),
        request_timeout: Duration::from_secs(2),
        retry: RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(10),
            ..RetryPolicy::default()
        },
    })
    .unwrap();

    let err = client.exams().await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)));
    assert!(err.is_retryable());
    assert_eq!(
        friendly_message(&err),
        "Network request failed. Please check your internet connection and try again."
    );
}

#[tokio::test]
async fn feed_runs_against_the_live_api() {
    let app = spawn_app().await;
    let client = Arc::new(client_for(&app));
    client.signup(&unique_email(), "password123").await.unwrap();

    let category = app.insert_category("Art & Culture").await;
    for i in 0..4 {
        app.insert_question(category, &format!("Dance form {i}?")).await;
    }

    let controller = FeedController::new(
        Arc::clone(&client),
        FeedConfig::default(),
        FeedPreferences {
            auto_advance: AutoAdvance::Never,
            ..FeedPreferences::default()
        },
    );

    let outcome = controller.switch_category("Art & Culture", None).await.unwrap();
    assert_eq!(outcome, LoadOutcome::Loaded(4));
    assert_eq!(controller.snapshot().status, FeedStatus::Ready);

    let answered = controller.snapshot().questions[0].question().id;
    let outcome = controller.submit_answer(0, "a").unwrap();
    assert!(outcome.correct);
    assert!(outcome.persisted.await.unwrap());

    assert_eq!(client.correct_answers().await.unwrap(), vec![answered]);

    // The solved question is excluded from the next load.
    assert_eq!(controller.load_initial().await.unwrap(), LoadOutcome::Loaded(3));
    assert!(
        controller
            .snapshot()
            .questions
            .iter()
            .all(|s| s.question().id != answered)
    );

    client.logout();
    assert!(controller.load_initial().await.is_err());
    assert_eq!(controller.snapshot().status, FeedStatus::SignedOut);
}
