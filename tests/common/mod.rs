// tests/common/mod.rs
#![allow(dead_code)]

use civils_daily::{
    config::Config,
    models::user::ROLE_ADMIN,
    routes,
    state::AppState,
    utils::jwt::sign_jwt,
};
use serde_json::{Value, json};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

pub const JWT_SECRET: &str = "test_secret_for_integration_tests";

pub struct TestApp {
    /// e.g. "http://127.0.0.1:12345"
    pub address: String,
    pub pool: SqlitePool,
    pub config: Config,
    pub client: reqwest::Client,
}

/// Spawns the app on a random port, backed by a fresh in-memory database.
pub async fn spawn_app() -> TestApp {
    // A single connection that never expires keeps the in-memory database alive.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        port: 0,
        admin_email: None,
        admin_password: None,
    };

    let state = AppState {
        pool: pool.clone(),
        config: config.clone(),
    };
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        pool,
        config,
        client: reqwest::Client::new(),
    }
}

pub fn unique_email() -> String {
    format!("u_{}@example.com", &uuid::Uuid::new_v4().to_string()[..8])
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.address, path)
    }

    /// Signs up through the API and returns `(user_id, token)`.
    pub async fn signup(&self, email: &str, password: &str) -> (i64, String) {
        let response = self
            .client
            .post(self.url("/auth/signup"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201);

        let body: Value = response.json().await.unwrap();
        (
            body["user"]["id"].as_i64().unwrap(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    pub async fn user_token(&self) -> String {
        self.signup(&unique_email(), "password123").await.1
    }

    /// Admin account inserted directly; the token is signed with the test secret.
    pub async fn admin_token(&self) -> String {
        let email = unique_email();
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (email, password_hash, role) VALUES (?, 'not-a-login', ?) RETURNING id",
        )
        .bind(&email)
        .bind(ROLE_ADMIN)
        .fetch_one(&self.pool)
        .await
        .unwrap();

        sign_jwt(id, &email, ROLE_ADMIN, JWT_SECRET, 600).unwrap()
    }

    pub async fn insert_exam(&self, name: &str) -> i64 {
        sqlx::query_scalar("INSERT INTO exams (name, category) VALUES (?, 'UPSC') RETURNING id")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn insert_category(&self, name: &str) -> i64 {
        sqlx::query_scalar("INSERT INTO categories (name) VALUES (?) RETURNING id")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn map_category(&self, exam_id: i64, category_id: i64) {
        sqlx::query("INSERT INTO exam_categories (exam_id, category_id) VALUES (?, ?)")
            .bind(exam_id)
            .bind(category_id)
            .execute(&self.pool)
            .await
            .unwrap();
    }

    /// Inserts a multiple-choice question whose correct option is "a".
    pub async fn insert_question(&self, category_id: i64, text: &str) -> i64 {
        self.insert_question_with(category_id, text, "multiple_choice", "medium")
            .await
    }

    pub async fn insert_question_with(
        &self,
        category_id: i64,
        text: &str,
        format: &str,
        difficulty: &str,
    ) -> i64 {
        let id = sqlx::query_scalar(
            "INSERT INTO questions
             (category_id, question_format, question_text, option_a, option_b, correct_answer, difficulty)
             VALUES (?, ?, ?, 'Right', 'Wrong', 'a', ?)
             RETURNING id",
        )
        .bind(category_id)
        .bind(format)
        .bind(text)
        .bind(difficulty)
        .fetch_one(&self.pool)
        .await
        .unwrap();

        sqlx::query("UPDATE categories SET question_count = question_count + 1 WHERE id = ?")
            .bind(category_id)
            .execute(&self.pool)
            .await
            .unwrap();

        id
    }
}
