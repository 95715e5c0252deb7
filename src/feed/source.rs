// src/feed/source.rs

use std::collections::HashSet;

use async_trait::async_trait;

use crate::{
    client::{ApiClient, ClientError},
    models::{
        answer::SaveAnswerRequest,
        question::{GenerateQuestionsRequest, Question},
    },
};

/// Where the feed gets questions from and reports answers to.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Ids the user has already answered correctly.
    async fn correct_answers(&self) -> Result<HashSet<i64>, ClientError>;

    async fn generate_questions(
        &self,
        request: &GenerateQuestionsRequest,
    ) -> Result<Vec<Question>, ClientError>;

    async fn save_answer(&self, request: &SaveAnswerRequest) -> Result<(), ClientError>;
}

#[async_trait]
impl QuestionSource for ApiClient {
    async fn correct_answers(&self) -> Result<HashSet<i64>, ClientError> {
        Ok(ApiClient::correct_answers(self).await?.into_iter().collect())
    }

    async fn generate_questions(
        &self,
        request: &GenerateQuestionsRequest,
    ) -> Result<Vec<Question>, ClientError> {
        ApiClient::generate_questions(self, request).await
    }

    async fn save_answer(&self, request: &SaveAnswerRequest) -> Result<(), ClientError> {
        ApiClient::save_answer(self, request).await
    }
}
