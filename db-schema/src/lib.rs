pub mod sql_types {
    #[derive(diesel::query_builder::QueryId, diesel::sql_types::SqlType)]
    #[diesel(postgres_type(name = "question_type"))]
    pub struct QuestionTypeMapping;

    #[derive(diesel::query_builder::QueryId, diesel::sql_types::SqlType)]
    #[diesel(postgres_type(name = "difficulty_level"))]
    pub struct DifficultyMapping;

    #[derive(diesel::query_builder::QueryId, diesel::sql_types::SqlType)]
    #[diesel(postgres_type(name = "question_visibility"))]
    pub struct VisibilityMapping;
}

pub mod hooked_sql_types {
    use ::std::fmt;
    use ::std::str;
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Hash, Clone, Copy, diesel_derive_enum::DbEnum)]
    #[ExistingTypePath = "crate::sql_types::QuestionTypeMapping"]
    pub enum QuestionType {
        #[serde(rename = "Single Choice MCQ")]
        #[db_rename = "Single Choice MCQ"]
        SingleChoiceMcq,
        #[serde(rename = "Multiple Choice")]
        #[db_rename = "Multiple Choice"]
        MultipleChoice,
        #[serde(rename = "True/False")]
        #[db_rename = "True/False"]
        TrueFalse,
        #[serde(rename = "Descriptive")]
        #[db_rename = "Descriptive"]
        Descriptive,
        #[serde(rename = "Match Following")]
        #[db_rename = "Match Following"]
        MatchFollowing,
    }

    impl QuestionType {
        pub fn as_str(&self) -> &'static str {
            match self {
                QuestionType::SingleChoiceMcq => "Single Choice MCQ",
                QuestionType::MultipleChoice => "Multiple Choice",
                QuestionType::TrueFalse => "True/False",
                QuestionType::Descriptive => "Descriptive",
                QuestionType::MatchFollowing => "Match Following",
            }
        }
    }

    impl fmt::Display for QuestionType {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "{}", self.as_str())
        }
    }

    impl str::FromStr for QuestionType {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s {
                "Single Choice MCQ" => Ok(QuestionType::SingleChoiceMcq),
                "Multiple Choice" => Ok(QuestionType::MultipleChoice),
                "True/False" => Ok(QuestionType::TrueFalse),
                "Descriptive" => Ok(QuestionType::Descriptive),
                "Match Following" => Ok(QuestionType::MatchFollowing),
                _ => Err(format!("'{}' is not a valid question type", s)),
            }
        }
    }

    #[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Hash, Clone, Copy, diesel_derive_enum::DbEnum)]
    #[ExistingTypePath = "crate::sql_types::DifficultyMapping"]
    pub enum Difficulty {
        #[db_rename = "Easy"]
        Easy,
        #[db_rename = "Medium"]
        Medium,
        #[db_rename = "Hard"]
        Hard,
    }

    impl fmt::Display for Difficulty {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    impl str::FromStr for Difficulty {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s {
                "Easy" => Ok(Difficulty::Easy),
                "Medium" => Ok(Difficulty::Medium),
                "Hard" => Ok(Difficulty::Hard),
                _ => Err(format!("'{}' is not a valid difficulty", s)),
            }
        }
    }

    #[derive(Deserialize, Serialize, Debug, Default, PartialEq, Eq, Hash, Clone, Copy, diesel_derive_enum::DbEnum)]
    #[ExistingTypePath = "crate::sql_types::VisibilityMapping"]
    pub enum Visibility {
        #[db_rename = "Public"]
        Public,
        #[db_rename = "Private"]
        Private,
        #[db_rename = "Shared"]
        Shared,
        #[default]
        #[db_rename = "Draft"]
        Draft,
    }

    impl fmt::Display for Visibility {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    impl str::FromStr for Visibility {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s {
                "Public" => Ok(Visibility::Public),
                "Private" => Ok(Visibility::Private),
                "Shared" => Ok(Visibility::Shared),
                "Draft" => Ok(Visibility::Draft),
                _ => Err(format!("'{}' is not a valid visibility", s)),
            }
        }
    }
}

diesel::table! {
    use diesel::sql_types::*;
    use super::sql_types::QuestionTypeMapping;
    use super::sql_types::DifficultyMapping;
    use super::sql_types::VisibilityMapping;

    questions (id) {
        id -> Uuid,
        title -> Text,
        questiontype -> QuestionTypeMapping,
        difficulty -> DifficultyMapping,
        category -> Text,
        visibility -> VisibilityMapping,
        author -> Text,
        authoremail -> Text,
        tags -> Array<Text>,
        content -> Text,
        options -> Array<Text>,
        matchpairs -> Jsonb,
        correctanswer -> Nullable<Jsonb>,
        correctmatches -> Nullable<Jsonb>,
        points -> Float8,
        estimatedtime -> Float8,
        negativemarks -> Nullable<Float8>,
        explanation -> Nullable<Text>,
        authornotes -> Nullable<Text>,
        ispublished -> Bool,
        updatedat -> Timestamptz,
    }
}
