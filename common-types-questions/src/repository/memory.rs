use ::std::cmp::Reverse;
use ::std::collections::{BTreeSet, HashMap};
use axum::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{
    parse_question_id,
    PageWindow,
    QuestionPage,
    QuestionRepository,
    QuestionStats,
    RepositoryError,
};
use crate::{
    Entity::{Question, QuestionFields},
    Filter::QuestionQuery,
    Validation::QuestionDraft,
};

/// Questions held in process. Used by the tests and by development mode
/// when no database is configured.
#[derive(Default)]
pub struct MemoryRepository {
    questions: RwLock<HashMap<Uuid, Question>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.questions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.read().is_empty()
    }

    // Same order as the database: newest first, id breaks ties
    fn matching(&self, query: &QuestionQuery) -> Vec<Question> {
        let mut questions: Vec<Question> = self.questions.read()
            .values()
            .filter(|question| query.matches(question))
            .cloned()
            .collect();
        questions.sort_by_key(|question| Reverse((question.updated_at, question.id)));
        questions
    }
}

#[async_trait]
impl QuestionRepository for MemoryRepository {
    async fn create(&self, draft: QuestionDraft) -> Result<Question, RepositoryError> {
        let question = Question::new(QuestionFields::from_draft(draft)?);
        self.questions.write().insert(question.id, question.clone());
        Ok(question)
    }

    async fn list(&self, query: &QuestionQuery, window: PageWindow) -> Result<QuestionPage, RepositoryError> {
        let matching = self.matching(query);
        let total = matching.len() as u64;
        let offset = usize::try_from(window.offset()).unwrap_or(usize::MAX);
        let questions = matching.into_iter()
            .skip(offset)
            .take(window.limit as usize)
            .collect();
        Ok(QuestionPage { questions, total })
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Question>, RepositoryError> {
        let id = parse_question_id(id)?;
        Ok(self.questions.read().get(&id).cloned())
    }

    async fn update(&self, id: &str, patch: QuestionDraft) -> Result<Option<Question>, RepositoryError> {
        let id = parse_question_id(id)?;
        let mut questions = self.questions.write();
        let Some(stored) = questions.get_mut(&id) else {
            return Ok(None)
        };
        let merged = stored.merged(patch)?;
        *stored = merged.clone();
        Ok(Some(merged))
    }

    async fn delete(&self, id: &str) -> Result<bool, RepositoryError> {
        let id = parse_question_id(id)?;
        Ok(self.questions.write().remove(&id).is_some())
    }

    async fn stats(&self) -> Result<QuestionStats, RepositoryError> {
        let mut stats = QuestionStats::default();
        for question in self.questions.read().values() {
            stats.tally(question.fields.is_published, 1);
        }
        Ok(stats)
    }

    async fn distinct_categories(&self) -> Result<Vec<String>, RepositoryError> {
        let categories: BTreeSet<String> = self.questions.read()
            .values()
            .map(|question| question.fields.category.clone())
            .filter(|category| !category.is_empty())
            .collect();
        Ok(categories.into_iter().collect())
    }

    async fn distinct_tags(&self) -> Result<Vec<String>, RepositoryError> {
        let tags: BTreeSet<String> = self.questions.read()
            .values()
            .flat_map(|question| question.fields.tags.iter().cloned())
            .filter(|tag| !tag.is_empty())
            .collect();
        Ok(tags.into_iter().collect())
    }

    async fn by_author(&self, email: &str) -> Result<Vec<Question>, RepositoryError> {
        Ok(self.matching(&QuestionQuery::by_author(email)))
    }

    async fn set_published(&self, id: &str, is_published: bool) -> Result<Option<Question>, RepositoryError> {
        let id = parse_question_id(id)?;
        let mut questions = self.questions.write();
        let Some(stored) = questions.get_mut(&id) else {
            return Ok(None)
        };
        *stored = stored.with_published(is_published);
        Ok(Some(stored.clone()))
    }

    async fn close(&self) {
        tracing::info!("Dropping {} in-memory questions", self.len());
    }
}
