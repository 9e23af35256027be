use axum::async_trait;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::Entity::{Question, ValidationErrors};
use crate::Filter::QuestionQuery;
use crate::Validation::QuestionDraft;

mod memory;
mod postgres;
pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("'{0}' is not a valid question id")]
    MalformedId(String),
    #[error("{0}")]
    Validation(#[from] ValidationErrors),
    #[error("Failed to fetch Postgres connection, {0}")]
    Pool(String),
    #[error("Query failed, {0}")]
    Query(#[from] diesel::result::Error),
    #[error("Stored question could not be decoded, {0}")]
    Corrupt(#[from] serde_json::Error),
}

pub fn parse_question_id(id: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(id).map_err(|_| RepositoryError::MalformedId(id.to_owned()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub limit: u32,
}

impl PageWindow {
    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64).saturating_mul(self.limit as i64)
    }

    pub fn limit(&self) -> i64 {
        self.limit as i64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionPage {
    pub questions: Vec<Question>,
    pub total: u64,
}

impl QuestionPage {
    pub fn empty() -> Self {
        Self { questions: Vec::new(), total: 0 }
    }
}

#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuestionStats {
    pub total: u64,
    pub published: u64,
    pub draft: u64,
}

impl QuestionStats {
    pub fn tally(&mut self, is_published: bool, count: u64) {
        self.total += count;
        match is_published {
            true => self.published += count,
            false => self.draft += count,
        }
    }
}

/// Storage of questions. Ids arrive as the raw path segment, implementations
/// reject anything that is not a uuid with `MalformedId`.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Validates the draft as a whole entity, assigns its id and timestamp
    /// and stores it.
    async fn create(&self, draft: QuestionDraft) -> Result<Question, RepositoryError>;

    /// One page of the matching questions, most recently updated first, and
    /// the number of questions matching overall.
    async fn list(&self, query: &QuestionQuery, window: PageWindow) -> Result<QuestionPage, RepositoryError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Question>, RepositoryError>;

    /// Applies the supplied fields of `patch` and re-validates the result.
    /// Nothing is written when the merged question is invalid.
    async fn update(&self, id: &str, patch: QuestionDraft) -> Result<Option<Question>, RepositoryError>;

    async fn delete(&self, id: &str) -> Result<bool, RepositoryError>;

    async fn stats(&self) -> Result<QuestionStats, RepositoryError>;

    async fn distinct_categories(&self) -> Result<Vec<String>, RepositoryError>;

    async fn distinct_tags(&self) -> Result<Vec<String>, RepositoryError>;

    async fn by_author(&self, email: &str) -> Result<Vec<Question>, RepositoryError>;

    async fn set_published(&self, id: &str, is_published: bool) -> Result<Option<Question>, RepositoryError>;

    async fn close(&self);
}
