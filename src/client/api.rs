// src/client/api.rs

use std::{env, sync::RwLock, time::Duration};

use reqwest::{Client, Method, Response};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;

use super::{error::ClientError, retry::RetryPolicy, session::Session};
use crate::{
    error::ErrorCode,
    models::{
        answer::{CorrectAnswersResponse, SaveAnswerRequest, SuccessResponse},
        category::{Category, CategoryListResponse},
        exam::{Exam, ExamListResponse},
        question::{GenerateQuestionsRequest, GenerateQuestionsResponse, Question},
        stats::UserStats,
        user::{AuthResponse, MeResponse},
    },
    utils::jwt::Claims,
};

const DEFAULT_API_URL: &str = "http://localhost:3001/api";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL including the `/api` prefix, without a trailing slash.
    pub base_url: String,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Reads `CIVILS_API_URL`, falling back to the local dev server.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            base_url: env::var("CIVILS_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            ..Self::default()
        }
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

/// Error body produced by the server's `AppError`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    error_code: Option<String>,
}

/// HTTP client for the quiz API.
///
/// Each instance owns its session. An authentication failure on any call
/// signs the instance out.
pub struct ApiClient {
    http: Client,
    base_url: String,
    retry: RetryPolicy,
    session: RwLock<Option<Session>>,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry: config.retry,
            session: RwLock::new(None),
        })
    }

    pub fn session(&self) -> Option<Session> {
        self.session.read().ok().and_then(|s| s.clone())
    }

    pub fn set_session(&self, session: Session) {
        if let Ok(mut guard) = self.session.write() {
            *guard = Some(session);
        }
    }

    pub fn logout(&self) {
        if let Ok(mut guard) = self.session.write() {
            guard.take();
        }
    }

    /// True when a token is held and its payload does not look expired.
    pub fn is_authenticated(&self) -> bool {
        self.session().is_some_and(|s| !s.is_expired())
    }

    /// Unverified identity of the signed-in user, for display only.
    pub fn current_user(&self) -> Option<Claims> {
        self.session()
            .filter(|s| !s.is_expired())
            .and_then(|s| s.claims())
    }

    pub async fn signup(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let auth: AuthResponse = self
            .send(
                Method::POST,
                "/auth/signup",
                Some(json!({ "email": email, "password": password })),
                false,
            )
            .await?;
        self.set_session(Session::new(auth.token.clone()));
        Ok(auth)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let auth: AuthResponse = self
            .send(
                Method::POST,
                "/auth/login",
                Some(json!({ "email": email, "password": password })),
                false,
            )
            .await?;
        self.set_session(Session::new(auth.token.clone()));
        Ok(auth)
    }

    pub async fn me(&self) -> Result<MeResponse, ClientError> {
        self.send(Method::GET, "/auth/me", None, true).await
    }

    pub async fn set_exam(&self, exam_id: Option<i64>) -> Result<(), ClientError> {
        let _: SuccessResponse = self
            .send(Method::PUT, "/auth/me/exam", Some(json!({ "exam_id": exam_id })), true)
            .await?;
        Ok(())
    }

    pub async fn exams(&self) -> Result<Vec<Exam>, ClientError> {
        let list: ExamListResponse = self.send(Method::GET, "/exams", None, false).await?;
        Ok(list.exams)
    }

    pub async fn categories(&self, exam_id: Option<i64>) -> Result<Vec<Category>, ClientError> {
        let path = match exam_id {
            Some(id) => format!("/categories?exam_id={}", id),
            None => "/categories".to_string(),
        };
        let list: CategoryListResponse = self.send(Method::GET, &path, None, true).await?;
        Ok(list.categories)
    }

    pub async fn generate_questions(
        &self,
        request: &GenerateQuestionsRequest,
    ) -> Result<Vec<Question>, ClientError> {
        let body = serde_json::to_value(request).map_err(|e| ClientError::Decode(e.to_string()))?;
        let batch: GenerateQuestionsResponse = self
            .send(Method::POST, "/questions/generate", Some(body), true)
            .await?;
        Ok(batch.questions)
    }

    pub async fn save_answer(&self, request: &SaveAnswerRequest) -> Result<(), ClientError> {
        let body = serde_json::to_value(request).map_err(|e| ClientError::Decode(e.to_string()))?;
        let _: SuccessResponse = self.send(Method::POST, "/answers", Some(body), true).await?;
        Ok(())
    }

    pub async fn correct_answers(&self) -> Result<Vec<i64>, ClientError> {
        let list: CorrectAnswersResponse = self
            .send(Method::GET, "/answers/correct", None, true)
            .await?;
        Ok(list.correct_answers)
    }

    pub async fn stats(&self) -> Result<UserStats, ClientError> {
        self.send(Method::GET, "/stats", None, true).await
    }

    /// Bearer token for an authenticated call. An expired local token signs
    /// the client out before any request is made.
    fn bearer(&self) -> Result<String, ClientError> {
        let session = self.session().ok_or(ClientError::NotSignedIn)?;
        if session.is_expired() {
            self.logout();
            return Err(ClientError::SessionExpired);
        }
        Ok(session.token().to_string())
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        authenticated: bool,
    ) -> Result<T, ClientError> {
        let token = if authenticated {
            Some(self.bearer()?)
        } else {
            None
        };
        let url = format!("{}{}", self.base_url, path);

        let result = self
            .retry
            .run(|| {
                let mut request = self.http.request(method.clone(), &url);
                if let Some(token) = &token {
                    request = request.bearer_auth(token);
                }
                if let Some(body) = &body {
                    request = request.json(body);
                }
                async move { read_response(request.send().await?).await }
            })
            .await;

        if let Err(err) = &result {
            if authenticated && err.is_auth_failure() {
                tracing::info!(error = %err, "Session rejected, signing out");
                self.logout();
            }
        }

        result
    }
}

async fn read_response<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();

    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()));
    }

    let text = response.text().await.unwrap_or_default();
    let (message, code) = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => (
            body.error,
            body.error_code.and_then(|c| c.parse::<ErrorCode>().ok()),
        ),
        Err(_) => (text, None),
    };

    Err(ClientError::Api {
        status: status.as_u16(),
        code,
        message,
    })
}
