use ::std::collections::BTreeMap;
use ::std::fmt;
use chrono::{DateTime, SubsecRound, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use common_types::{
    Envelope::FieldError,
    Question::{CorrectAnswer, MatchPair},
};

use crate::db_schema::hooked_sql_types::{Difficulty, QuestionType, Visibility};
use crate::Validation::QuestionDraft;

/// Every entity-level violation found in a question, reported together.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{}", Violations(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

struct Violations<'a>(&'a [FieldError]);

impl fmt::Display for Violations<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let described = self.0.iter()
            .map(|violation| format!("{}: {}", violation.field, violation.message))
            .collect::<Vec<String>>();
        write!(f, "{}", described.join(", "))
    }
}

fn violation<F: ToString, M: ToString>(field: F, message: M) -> FieldError {
    FieldError {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn pairs_are_complete(value: &Vec<MatchPair>, _: &()) -> garde::Result {
    if value.iter().any(|pair| pair.column_a.is_empty() || pair.column_b.is_empty()) {
        return Err(garde::Error::new("every match pair needs both columnA and columnB"));
    }
    Ok(())
}

fn non_negative_if_present(value: &Option<f64>, _: &()) -> garde::Result {
    match value {
        Some(value) if *value < 0.0 => Err(garde::Error::new("lower than 0")),
        _ => Ok(()),
    }
}

/// Fields a new question cannot be created without, by wire name.
pub const REQUIRED_FIELDS: [&str; 9] = [
    "title",
    "type",
    "difficulty",
    "category",
    "author",
    "authorEmail",
    "content",
    "points",
    "estimatedTime",
];

// Must follow the serde renames below, garde reports rust field names
const WIRE_NAMES: [(&str, &str); 9] = [
    ("question_type", "type"),
    ("author_email", "authorEmail"),
    ("match_pairs", "matchPairs"),
    ("correct_answer", "correctAnswer"),
    ("correct_matches", "correctMatches"),
    ("estimated_time", "estimatedTime"),
    ("negative_marks", "negativeMarks"),
    ("author_notes", "authorNotes"),
    ("is_published", "isPublished"),
];

fn wire_name(path: &str) -> &str {
    WIRE_NAMES.iter()
        .find(|(rust, _)| *rust == path)
        .map_or(path, |(_, wire)| *wire)
}

/// The stored shape of a question, minus the fields the system assigns.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Validate)]
pub struct QuestionFields {
    #[garde(length(min = 5))]
    pub title: String,
    #[serde(rename = "type")]
    #[garde(skip)]
    pub question_type: QuestionType,
    #[garde(skip)]
    pub difficulty: Difficulty,
    #[garde(length(min = 1))]
    pub category: String,
    #[garde(skip)]
    pub visibility: Visibility,
    #[garde(length(min = 1))]
    pub author: String,
    #[serde(rename = "authorEmail")]
    #[garde(length(min = 1))]
    pub author_email: String,
    #[garde(skip)]
    pub tags: Vec<String>,
    #[garde(length(min = 10))]
    pub content: String,
    #[garde(skip)]
    pub options: Vec<String>,
    #[serde(rename = "matchPairs")]
    #[garde(custom(pairs_are_complete))]
    pub match_pairs: Vec<MatchPair>,
    #[serde(rename = "correctAnswer", skip_serializing_if = "Option::is_none")]
    #[garde(skip)]
    pub correct_answer: Option<CorrectAnswer>,
    #[serde(rename = "correctMatches", skip_serializing_if = "Option::is_none")]
    #[garde(skip)]
    pub correct_matches: Option<BTreeMap<String, String>>,
    #[garde(range(min = 0.0))]
    pub points: f64,
    #[serde(rename = "estimatedTime")]
    #[garde(range(min = 0.0))]
    pub estimated_time: f64,
    #[serde(rename = "negativeMarks", skip_serializing_if = "Option::is_none")]
    #[garde(custom(non_negative_if_present))]
    pub negative_marks: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[garde(skip)]
    pub explanation: Option<String>,
    #[serde(rename = "authorNotes", skip_serializing_if = "Option::is_none")]
    #[garde(skip)]
    pub author_notes: Option<String>,
    #[serde(rename = "isPublished")]
    #[garde(skip)]
    pub is_published: bool,
}

impl QuestionFields {
    // Placeholder values, only ever returned after every required field
    // has been overwritten
    fn blank() -> Self {
        Self {
            title: String::new(),
            question_type: QuestionType::Descriptive,
            difficulty: Difficulty::Easy,
            category: String::new(),
            visibility: Visibility::default(),
            author: String::new(),
            author_email: String::new(),
            tags: Vec::new(),
            content: String::new(),
            options: Vec::new(),
            match_pairs: Vec::new(),
            correct_answer: None,
            correct_matches: None,
            points: 0.0,
            estimated_time: 0.0,
            negative_marks: None,
            explanation: None,
            author_notes: None,
            is_published: false,
        }
    }

    /// Builds the fields of a new question. Missing required fields, unknown
    /// enum values and constraint violations are all collected.
    pub fn from_draft(draft: QuestionDraft) -> Result<Self, ValidationErrors> {
        let mut errors = Vec::new();
        let present = [
            draft.title.is_some(),
            draft.question_type.is_some(),
            draft.difficulty.is_some(),
            draft.category.is_some(),
            draft.author.is_some(),
            draft.author_email.is_some(),
            draft.content.is_some(),
            draft.points.is_some(),
            draft.estimated_time.is_some(),
        ];
        for (field, present) in REQUIRED_FIELDS.into_iter().zip(present) {
            if !present {
                errors.push(violation(field, format!("{field} is required")));
            }
        }

        let mut fields = Self::blank();
        fields.assign(draft, &mut errors);
        fields.collect_violations(&mut errors);
        match errors.is_empty() {
            true => Ok(fields),
            false => Err(ValidationErrors(errors)),
        }
    }

    /// Merges the supplied fields of `patch` and re-checks the whole result.
    /// `self` is left untouched when the merge is rejected.
    pub fn merged(&self, patch: QuestionDraft) -> Result<Self, ValidationErrors> {
        let mut errors = Vec::new();
        let mut fields = self.clone();
        fields.assign(patch, &mut errors);
        fields.collect_violations(&mut errors);
        match errors.is_empty() {
            true => Ok(fields),
            false => Err(ValidationErrors(errors)),
        }
    }

    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();
        self.collect_violations(&mut errors);
        match errors.is_empty() {
            true => Ok(()),
            false => Err(ValidationErrors(errors)),
        }
    }

    fn assign(&mut self, draft: QuestionDraft, errors: &mut Vec<FieldError>) {
        fn parse_into<T: ::std::str::FromStr<Err = String>>(target: &mut T, field: &str, value: Option<String>, errors: &mut Vec<FieldError>) {
            if let Some(value) = value {
                match value.parse() {
                    Ok(parsed) => *target = parsed,
                    Err(reason) => errors.push(violation(field, reason)),
                }
            }
        }

        parse_into(&mut self.question_type, "type", draft.question_type, errors);
        parse_into(&mut self.difficulty, "difficulty", draft.difficulty, errors);
        parse_into(&mut self.visibility, "visibility", draft.visibility, errors);

        if let Some(title) = draft.title { self.title = title; }
        if let Some(category) = draft.category { self.category = category; }
        if let Some(author) = draft.author { self.author = author; }
        if let Some(author_email) = draft.author_email { self.author_email = author_email; }
        if let Some(tags) = draft.tags { self.tags = tags; }
        if let Some(content) = draft.content { self.content = content; }
        if let Some(options) = draft.options { self.options = options; }
        if let Some(match_pairs) = draft.match_pairs { self.match_pairs = match_pairs; }
        if let Some(points) = draft.points { self.points = points; }
        if let Some(estimated_time) = draft.estimated_time { self.estimated_time = estimated_time; }
        if let Some(is_published) = draft.is_published { self.is_published = is_published; }
        if draft.correct_answer.is_some() { self.correct_answer = draft.correct_answer; }
        if draft.correct_matches.is_some() { self.correct_matches = draft.correct_matches; }
        if draft.negative_marks.is_some() { self.negative_marks = draft.negative_marks; }
        if draft.explanation.is_some() { self.explanation = draft.explanation; }
        if draft.author_notes.is_some() { self.author_notes = draft.author_notes; }
    }

    // A field that already failed (missing, bad enum) is not reported twice
    fn collect_violations(&self, errors: &mut Vec<FieldError>) {
        let Err(report) = self.validate(&()) else {
            return;
        };
        for (path, error) in report.iter() {
            let path = path.to_string();
            let field = wire_name(&path);
            if errors.iter().any(|existing| existing.field == field) {
                continue;
            }
            errors.push(violation(field, error));
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Question {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: QuestionFields,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

// Postgres keeps microseconds, so does everything else
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

impl Question {
    pub fn new(fields: QuestionFields) -> Self {
        Self {
            id: Uuid::new_v4(),
            fields,
            updated_at: now(),
        }
    }

    /// The stored question after a partial update, stamped with a fresh
    /// `updated_at`.
    pub fn merged(&self, patch: QuestionDraft) -> Result<Self, ValidationErrors> {
        Ok(Self {
            id: self.id,
            fields: self.fields.merged(patch)?,
            updated_at: now(),
        })
    }

    pub fn with_published(&self, is_published: bool) -> Self {
        let mut question = self.clone();
        question.fields.is_published = is_published;
        question.updated_at = now();
        question
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> QuestionDraft {
        QuestionDraft {
            title: Some("Solve for x".to_string()),
            question_type: Some("Descriptive".to_string()),
            difficulty: Some("Medium".to_string()),
            category: Some("Algebra".to_string()),
            author: Some("Ada".to_string()),
            author_email: Some("ada@example.com".to_string()),
            content: Some("Solve 2x + 3 = 7 and show your working.".to_string()),
            points: Some(4.0),
            estimated_time: Some(5.0),
            ..Default::default()
        }
    }

    fn fields_of(errors: &ValidationErrors) -> Vec<&str> {
        errors.0.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn visibility_defaults_to_draft() {
        let fields = QuestionFields::from_draft(draft()).unwrap();
        assert_eq!(fields.visibility, Visibility::Draft);
        assert!(!fields.is_published);
        assert!(fields.tags.is_empty());
    }

    #[test]
    fn zero_points_are_allowed() {
        let fields = QuestionFields::from_draft(QuestionDraft { points: Some(0.0), estimated_time: Some(0.0), ..draft() }).unwrap();
        assert_eq!(fields.points, 0.0);
    }

    #[test]
    fn every_violation_is_reported() {
        let errors = QuestionFields::from_draft(QuestionDraft {
            title: Some("abc".to_string()),
            difficulty: Some("Impossible".to_string()),
            estimated_time: Some(-1.0),
            negative_marks: Some(-0.5),
            author: None,
            ..draft()
        }).unwrap_err();
        let fields = fields_of(&errors);
        assert!(fields.contains(&"title"));
        assert!(fields.contains(&"difficulty"));
        assert!(fields.contains(&"estimatedTime"));
        assert!(fields.contains(&"negativeMarks"));
        assert!(fields.contains(&"author"));
    }

    #[test]
    fn missing_field_is_reported_once() {
        let errors = QuestionFields::from_draft(QuestionDraft { title: None, ..draft() }).unwrap_err();
        assert_eq!(fields_of(&errors), vec!["title"]);
        assert_eq!(errors.0[0].message, "title is required");
    }

    #[test]
    fn merge_rejects_unknown_enum_and_keeps_original() {
        let fields = QuestionFields::from_draft(draft()).unwrap();
        let errors = fields.merged(QuestionDraft { visibility: Some("Secret".to_string()), ..Default::default() }).unwrap_err();
        assert_eq!(fields_of(&errors), vec!["visibility"]);
        assert_eq!(fields.visibility, Visibility::Draft);
    }

    #[test]
    fn merge_only_touches_supplied_fields() {
        let fields = QuestionFields::from_draft(draft()).unwrap();
        let merged = fields.merged(QuestionDraft {
            tags: Some(vec!["linear".to_string()]),
            is_published: Some(true),
            ..Default::default()
        }).unwrap();
        assert_eq!(merged.title, fields.title);
        assert_eq!(merged.tags, vec!["linear".to_string()]);
        assert!(merged.is_published);
    }

    #[test]
    fn incomplete_match_pair_is_rejected() {
        let fields = QuestionFields::from_draft(draft()).unwrap();
        let errors = fields.merged(QuestionDraft {
            match_pairs: Some(vec![MatchPair { column_a: "H2O".to_string(), column_b: String::new() }]),
            ..Default::default()
        }).unwrap_err();
        assert_eq!(fields_of(&errors), vec!["matchPairs"]);
    }

    #[test]
    fn merged_question_keeps_id_and_moves_timestamp_forward() {
        let question = Question::new(QuestionFields::from_draft(draft()).unwrap());
        let merged = question.merged(QuestionDraft { points: Some(8.0), ..Default::default() }).unwrap();
        assert_eq!(merged.id, question.id);
        assert!(merged.updated_at >= question.updated_at);
        assert_eq!(merged.fields.points, 8.0);
    }

    #[test]
    fn serializes_with_wire_names() {
        let question = Question::new(QuestionFields::from_draft(draft()).unwrap());
        let body = serde_json::to_value(&question).unwrap();
        assert_eq!(body["type"], "Descriptive");
        assert_eq!(body["authorEmail"], "ada@example.com");
        assert_eq!(body["estimatedTime"], 5.0);
        assert_eq!(body["isPublished"], false);
        assert!(body.get("updatedAt").is_some());
        assert!(body.get("negativeMarks").is_none());
    }

    #[test]
    fn wire_names_match_serialized_keys() {
        let mut question = Question::new(QuestionFields::from_draft(draft()).unwrap());
        question.fields.correct_answer = Some(CorrectAnswer::Single("x = 2".to_string()));
        question.fields.correct_matches = Some(BTreeMap::from([("H2O".to_string(), "Water".to_string())]));
        question.fields.negative_marks = Some(1.0);
        question.fields.author_notes = Some("from the 2019 paper".to_string());
        let body = serde_json::to_value(&question).unwrap();
        for (rust, wire) in WIRE_NAMES {
            assert_eq!(wire_name(rust), wire);
            assert!(body.get(wire).is_some(), "{wire} is not serialized");
        }
        assert_eq!(wire_name("title"), "title");
    }

    #[test]
    fn required_fields_are_serialized_keys() {
        let question = Question::new(QuestionFields::from_draft(draft()).unwrap());
        let body = serde_json::to_value(&question).unwrap();
        for field in REQUIRED_FIELDS {
            assert!(body.get(field).is_some(), "{field} is not serialized");
        }
    }
}
