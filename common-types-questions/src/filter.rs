use serde::Deserialize;

use crate::db_schema::hooked_sql_types::{Difficulty, QuestionType, Visibility};
use crate::Entity::Question;

/// Raw list filters, exactly as they arrive in the query string.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct QuestionFilters {
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub visibility: Option<String>,
    #[serde(rename = "type")]
    pub question_type: Option<String>,
    pub tags: Option<String>,
    #[serde(rename = "isPublished")]
    pub is_published: Option<String>,
    #[serde(rename = "myQuestionsOnly")]
    pub my_questions_only: Option<String>,
    #[serde(rename = "authorEmail")]
    pub author_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Category(String),
    Difficulty(Difficulty),
    Visibility(Visibility),
    Type(QuestionType),
    // Matches when the question carries at least one of these tags
    AnyTag(Vec<String>),
    Published(bool),
    AuthorEmail(String),
    Never,
}

impl Clause {
    pub fn matches(&self, question: &Question) -> bool {
        let fields = &question.fields;
        match self {
            Clause::Category(category) => fields.category == *category,
            Clause::Difficulty(difficulty) => fields.difficulty == *difficulty,
            Clause::Visibility(visibility) => fields.visibility == *visibility,
            Clause::Type(question_type) => fields.question_type == *question_type,
            Clause::AnyTag(tags) => fields.tags.iter().any(|tag| tags.contains(tag)),
            Clause::Published(is_published) => fields.is_published == *is_published,
            Clause::AuthorEmail(email) => fields.author_email == *email,
            Clause::Never => false,
        }
    }
}

/// A conjunction of clauses. Building one never touches storage, the
/// repositories decide how to evaluate it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionQuery {
    clauses: Vec<Clause>,
}

impl QuestionQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_author(email: &str) -> Self {
        Self {
            clauses: vec![Clause::AuthorEmail(email.to_owned())],
        }
    }

    pub fn and(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    pub(crate) fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_unsatisfiable(&self) -> bool {
        self.clauses.contains(&Clause::Never)
    }

    pub fn matches(&self, question: &Question) -> bool {
        self.clauses.iter().all(|clause| clause.matches(question))
    }
}

fn provided(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

// An unknown enum value can never equal a stored one
fn enum_clause<T: ::std::str::FromStr>(value: &str, wrap: fn(T) -> Clause) -> Clause {
    match value.parse::<T>() {
        Ok(parsed) => wrap(parsed),
        Err(_) => {
            tracing::debug!("Filter value '{value}' matches no question");
            Clause::Never
        },
    }
}

pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_owned)
        .collect()
}

pub fn build_query(filters: &QuestionFilters) -> QuestionQuery {
    let mut query = QuestionQuery::all();

    if let Some(category) = provided(&filters.category) {
        query = query.and(Clause::Category(category.to_owned()));
    }
    if let Some(difficulty) = provided(&filters.difficulty) {
        query = query.and(enum_clause(difficulty, Clause::Difficulty));
    }
    if let Some(visibility) = provided(&filters.visibility) {
        query = query.and(enum_clause(visibility, Clause::Visibility));
    }
    if let Some(question_type) = provided(&filters.question_type) {
        query = query.and(enum_clause(question_type, Clause::Type));
    }
    if let Some(tags) = provided(&filters.tags) {
        let tags = split_tags(tags);
        if !tags.is_empty() {
            query = query.and(Clause::AnyTag(tags));
        }
    }
    if let Some(is_published) = provided(&filters.is_published) {
        query = query.and(Clause::Published(is_published == "true"));
    }
    if provided(&filters.my_questions_only) == Some("true") {
        match provided(&filters.author_email) {
            Some(email) => query = query.and(Clause::AuthorEmail(email.to_owned())),
            None => tracing::debug!("myQuestionsOnly was requested without an authorEmail, ignoring"),
        }
    }
    query
}
