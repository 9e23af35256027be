use ::std::collections::BTreeMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use common_types::Question::{CorrectAnswer, MatchPair};

use crate::db_schema::hooked_sql_types::{Difficulty, QuestionType, Visibility};

lazy_static!{
    static ref EMAIL_PATTERN: Regex = Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern compiles");
}

/// A question as submitted by the authoring form. Nothing is required at
/// this point, the step validators and the entity decide what is missing.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct QuestionDraft {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub question_type: Option<String>,
    pub difficulty: Option<String>,
    pub category: Option<String>,
    pub visibility: Option<String>,
    pub author: Option<String>,
    #[serde(rename = "authorEmail")]
    pub author_email: Option<String>,
    pub tags: Option<Vec<String>>,
    pub content: Option<String>,
    pub options: Option<Vec<String>>,
    #[serde(rename = "matchPairs")]
    pub match_pairs: Option<Vec<MatchPair>>,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: Option<CorrectAnswer>,
    #[serde(rename = "correctMatches")]
    pub correct_matches: Option<BTreeMap<String, String>>,
    pub points: Option<f64>,
    #[serde(rename = "estimatedTime")]
    pub estimated_time: Option<f64>,
    #[serde(rename = "negativeMarks")]
    pub negative_marks: Option<f64>,
    pub explanation: Option<String>,
    #[serde(rename = "authorNotes")]
    pub author_notes: Option<String>,
    #[serde(rename = "isPublished")]
    pub is_published: Option<bool>,
}

impl QuestionDraft {
    fn parsed_type(&self) -> Option<QuestionType> {
        self.question_type.as_deref().and_then(|t| t.parse().ok())
    }

    fn has_answer(&self) -> bool {
        self.correct_answer.as_ref().is_some_and(|answer| !answer.is_blank())
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepError {
    #[error("Question title must be at least 5 characters long")]
    TitleTooShort,
    #[error("Question type is required")]
    MissingType,
    #[error("Invalid question type")]
    InvalidType,
    #[error("Invalid difficulty level")]
    InvalidDifficulty,
    #[error("Category is required")]
    MissingCategory,
    #[error("Invalid visibility setting")]
    InvalidVisibility,
    #[error("Author is required")]
    MissingAuthor,
    #[error("Valid author email is required")]
    InvalidAuthorEmail,
    #[error("Question content must be at least 10 characters long")]
    ContentTooShort,
    #[error("At least 2 options are required for MCQ questions")]
    TooFewOptions,
    #[error("Correct answer is required for MCQ questions")]
    MissingChoiceAnswer,
    #[error("At least 2 match pairs are required for Match Following questions")]
    TooFewMatchPairs,
    #[error("Correct answer is required for True/False questions")]
    MissingTrueFalseAnswer,
    #[error("Points are required and must be non-negative")]
    InvalidPoints,
    #[error("Estimated time is required and must be non-negative")]
    InvalidEstimatedTime,
    #[error("Negative marks must be non-negative")]
    InvalidNegativeMarks,
}

/// One page of the three page authoring form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Classification,
    Content,
    Scoring,
}

impl Step {
    pub const ALL: [Step; 3] = [Step::Classification, Step::Content, Step::Scoring];

    pub fn from_number(number: u8) -> Option<Step> {
        match number {
            1 => Some(Step::Classification),
            2 => Some(Step::Content),
            3 => Some(Step::Scoring),
            _ => None,
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            Step::Classification => 1,
            Step::Content => 2,
            Step::Scoring => 3,
        }
    }

    pub fn validate(&self, draft: &QuestionDraft) -> Result<(), StepError> {
        match self {
            Step::Classification => validate_classification(draft),
            Step::Content => validate_content(draft),
            Step::Scoring => validate_scoring(draft),
        }
    }
}

/// Runs the three steps in order and stops at the first rule that fails.
pub fn validate_complete(draft: &QuestionDraft) -> Result<(), StepError> {
    Step::ALL.iter().try_for_each(|step| step.validate(draft))
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn shorter_than(value: &Option<String>, min: usize) -> bool {
    value.as_deref().map_or(true, |v| v.trim().chars().count() < min)
}

fn is_member<T: ::std::str::FromStr>(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| v.parse::<T>().is_ok())
}

pub fn validate_classification(draft: &QuestionDraft) -> Result<(), StepError> {
    if shorter_than(&draft.title, 5) {
        return Err(StepError::TitleTooShort);
    }
    if is_blank(&draft.question_type) {
        return Err(StepError::MissingType);
    }
    if !is_member::<QuestionType>(&draft.question_type) {
        return Err(StepError::InvalidType);
    }
    if !is_member::<Difficulty>(&draft.difficulty) {
        return Err(StepError::InvalidDifficulty);
    }
    if is_blank(&draft.category) {
        return Err(StepError::MissingCategory);
    }
    if !is_member::<Visibility>(&draft.visibility) {
        return Err(StepError::InvalidVisibility);
    }
    if is_blank(&draft.author) {
        return Err(StepError::MissingAuthor);
    }
    if !draft.author_email.as_deref().is_some_and(|email| EMAIL_PATTERN.is_match(email)) {
        return Err(StepError::InvalidAuthorEmail);
    }
    Ok(())
}

// The answer structure a question needs depends only on its type, taken
// from the draft itself so this step also runs on its own
pub fn validate_content(draft: &QuestionDraft) -> Result<(), StepError> {
    if shorter_than(&draft.content, 10) {
        return Err(StepError::ContentTooShort);
    }
    match draft.parsed_type() {
        Some(QuestionType::SingleChoiceMcq | QuestionType::MultipleChoice) => {
            if draft.options.as_ref().map_or(0, Vec::len) < 2 {
                return Err(StepError::TooFewOptions);
            }
            if !draft.has_answer() {
                return Err(StepError::MissingChoiceAnswer);
            }
        },
        Some(QuestionType::MatchFollowing) => {
            if draft.match_pairs.as_ref().map_or(0, Vec::len) < 2 {
                return Err(StepError::TooFewMatchPairs);
            }
        },
        Some(QuestionType::TrueFalse) => {
            if !draft.has_answer() {
                return Err(StepError::MissingTrueFalseAnswer);
            }
        },
        Some(QuestionType::Descriptive) | None => (),
    }
    Ok(())
}

pub fn validate_scoring(draft: &QuestionDraft) -> Result<(), StepError> {
    if !draft.points.is_some_and(|points| points >= 0.0) {
        return Err(StepError::InvalidPoints);
    }
    if !draft.estimated_time.is_some_and(|minutes| minutes >= 0.0) {
        return Err(StepError::InvalidEstimatedTime);
    }
    if draft.negative_marks.is_some_and(|marks| marks < 0.0) {
        return Err(StepError::InvalidNegativeMarks);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mcq() -> QuestionDraft {
        QuestionDraft {
            title: Some("Capital of France".to_string()),
            question_type: Some("Single Choice MCQ".to_string()),
            difficulty: Some("Easy".to_string()),
            category: Some("Geography".to_string()),
            visibility: Some("Public".to_string()),
            author: Some("Grace".to_string()),
            author_email: Some("grace@example.com".to_string()),
            tags: Some(vec!["europe".to_string()]),
            content: Some("Which city is the capital of France?".to_string()),
            options: Some(vec!["Paris".to_string(), "Lyon".to_string()]),
            correct_answer: Some(CorrectAnswer::Single("Paris".to_string())),
            points: Some(1.0),
            estimated_time: Some(1.0),
            ..Default::default()
        }
    }

    #[test]
    fn complete_mcq_passes_every_step() {
        assert_eq!(validate_complete(&mcq()), Ok(()));
    }

    #[test]
    fn four_character_title_is_rejected() {
        let draft = QuestionDraft { title: Some("Quiz".to_string()), ..mcq() };
        let err = validate_complete(&draft).unwrap_err();
        assert_eq!(err.to_string(), "Question title must be at least 5 characters long");
    }

    #[test]
    fn title_is_measured_after_trimming() {
        let draft = QuestionDraft { title: Some("  Quiz   ".to_string()), ..mcq() };
        assert_eq!(validate_classification(&draft), Err(StepError::TitleTooShort));
    }

    #[test]
    fn classification_checks_run_in_order() {
        let draft = QuestionDraft {
            question_type: None,
            difficulty: Some("Impossible".to_string()),
            ..mcq()
        };
        assert_eq!(validate_classification(&draft), Err(StepError::MissingType));

        let draft = QuestionDraft { question_type: Some("Essay".to_string()), ..draft };
        assert_eq!(validate_classification(&draft), Err(StepError::InvalidType));

        let draft = QuestionDraft { question_type: Some("Descriptive".to_string()), ..draft };
        assert_eq!(validate_classification(&draft), Err(StepError::InvalidDifficulty));
    }

    #[test]
    fn empty_type_counts_as_missing() {
        let draft = QuestionDraft { question_type: Some(String::new()), ..mcq() };
        assert_eq!(validate_classification(&draft), Err(StepError::MissingType));
        let draft = QuestionDraft { question_type: Some("  ".to_string()), ..mcq() };
        assert_eq!(validate_classification(&draft), Err(StepError::MissingType));
    }

    #[test]
    fn visibility_must_be_supplied() {
        let draft = QuestionDraft { visibility: None, ..mcq() };
        assert_eq!(validate_classification(&draft), Err(StepError::InvalidVisibility));
    }

    #[test]
    fn blank_author_and_bad_email_are_rejected() {
        let draft = QuestionDraft { author: Some("   ".to_string()), ..mcq() };
        assert_eq!(validate_classification(&draft), Err(StepError::MissingAuthor));

        let draft = QuestionDraft { author_email: Some("grace@example".to_string()), ..mcq() };
        assert_eq!(validate_classification(&draft), Err(StepError::InvalidAuthorEmail));
    }

    #[test]
    fn single_option_mcq_is_rejected() {
        let draft = QuestionDraft { options: Some(vec!["Paris".to_string()]), ..mcq() };
        let err = validate_complete(&draft).unwrap_err();
        assert_eq!(err.to_string(), "At least 2 options are required for MCQ questions");
    }

    #[test]
    fn mcq_needs_an_answer_even_with_options() {
        let draft = QuestionDraft { correct_answer: Some(CorrectAnswer::Single(String::new())), ..mcq() };
        assert_eq!(validate_content(&draft), Err(StepError::MissingChoiceAnswer));
    }

    #[test]
    fn multiple_choice_accepts_a_list_of_answers() {
        let draft = QuestionDraft {
            question_type: Some("Multiple Choice".to_string()),
            correct_answer: Some(CorrectAnswer::Multiple(vec!["Paris".to_string()])),
            ..mcq()
        };
        assert_eq!(validate_content(&draft), Ok(()));
    }

    #[test]
    fn match_following_needs_two_pairs() {
        let pair = MatchPair { column_a: "Fe".to_string(), column_b: "Iron".to_string() };
        let draft = QuestionDraft {
            question_type: Some("Match Following".to_string()),
            options: None,
            correct_answer: None,
            match_pairs: Some(vec![pair.clone()]),
            ..mcq()
        };
        assert_eq!(validate_content(&draft), Err(StepError::TooFewMatchPairs));

        let draft = QuestionDraft { match_pairs: Some(vec![pair.clone(), pair]), ..draft };
        assert_eq!(validate_content(&draft), Ok(()));
    }

    #[test]
    fn true_false_needs_an_answer() {
        let draft = QuestionDraft {
            question_type: Some("True/False".to_string()),
            correct_answer: None,
            ..mcq()
        };
        assert_eq!(validate_content(&draft), Err(StepError::MissingTrueFalseAnswer));
    }

    #[test]
    fn content_step_ignores_unknown_type() {
        let draft = QuestionDraft {
            question_type: Some("Essay".to_string()),
            options: None,
            correct_answer: None,
            ..mcq()
        };
        assert_eq!(validate_content(&draft), Ok(()));
    }

    #[test]
    fn descriptive_only_needs_content() {
        let draft = QuestionDraft {
            question_type: Some("Descriptive".to_string()),
            content: Some("too short".to_string()),
            options: None,
            correct_answer: None,
            ..mcq()
        };
        assert_eq!(validate_content(&draft), Err(StepError::ContentTooShort));
    }

    #[test]
    fn scoring_accepts_zero_and_rejects_negatives() {
        let draft = QuestionDraft { points: Some(0.0), estimated_time: Some(0.0), ..mcq() };
        assert_eq!(validate_scoring(&draft), Ok(()));

        let draft = QuestionDraft { points: None, ..mcq() };
        assert_eq!(validate_scoring(&draft), Err(StepError::InvalidPoints));

        let draft = QuestionDraft { estimated_time: Some(-2.0), ..mcq() };
        assert_eq!(validate_scoring(&draft), Err(StepError::InvalidEstimatedTime));

        let draft = QuestionDraft { negative_marks: Some(-0.25), ..mcq() };
        assert_eq!(validate_scoring(&draft), Err(StepError::InvalidNegativeMarks));
    }

    #[test]
    fn first_failing_step_wins() {
        let draft = QuestionDraft {
            title: Some("Tiny".to_string()),
            content: None,
            points: None,
            ..mcq()
        };
        assert_eq!(validate_complete(&draft), Err(StepError::TitleTooShort));
    }

    #[test]
    fn steps_are_numbered_from_one() {
        assert_eq!(Step::from_number(2), Some(Step::Content));
        assert_eq!(Step::from_number(4), None);
        assert!(Step::ALL.iter().all(|step| Step::from_number(step.number()) == Some(*step)));
    }
}
