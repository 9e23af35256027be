use db_schema;

pub type E = Box<dyn ::std::error::Error + Send + Sync + 'static>;

mod question;
mod validation;
mod filter;
mod repository;
mod routes;
mod middleware;

#[allow(non_snake_case)]
pub mod Routes {
    pub use crate::routes::*;
}

#[allow(non_snake_case)]
pub mod Middleware {
    pub use crate::middleware::*;
}

#[allow(non_snake_case)]
pub mod Schema {
    pub use crate::db_schema::*;
}

#[allow(non_snake_case)]
pub mod Entity {
    pub use crate::question::*;
}

#[allow(non_snake_case)]
pub mod Validation {
    pub use crate::validation::*;
}

#[allow(non_snake_case)]
pub mod Filter {
    pub use crate::filter::*;
}

#[allow(non_snake_case)]
pub mod Repository {
    pub use crate::repository::*;
}

#[allow(non_snake_case)]
pub mod Response {
    use axum::{
        extract::rejection::JsonRejection,
        http::StatusCode,
        Json,
    };
    use common_types::Envelope::{FieldError, Response as Envelope};

    use crate::Repository::RepositoryError;

    pub type ServerResponse = (StatusCode, Json<Envelope<()>>);

    pub fn status_response<E: ToString>(status: StatusCode, error: E) -> ServerResponse {
        (status, Json(Envelope::failure(error)))
    }

    pub fn internal_server_error<E: ToString>(err: E) -> ServerResponse {
        status_response(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn not_found() -> ServerResponse {
        status_response(StatusCode::NOT_FOUND, "Question not found")
    }

    pub fn validation_failed(details: Vec<FieldError>) -> ServerResponse {
        (StatusCode::BAD_REQUEST, Json(Envelope::failure("Validation failed").with_details(details)))
    }

    pub fn invalid_body<M: ToString>(message: M) -> ServerResponse {
        let details = vec![FieldError {
            field: "body".to_string(),
            message: message.to_string(),
        }];
        (StatusCode::BAD_REQUEST, Json(Envelope::failure("Invalid request body").with_details(details)))
    }

    pub fn malformed_body(rejection: JsonRejection) -> ServerResponse {
        tracing::info!("Rejected request body, {rejection}");
        invalid_body(rejection.body_text())
    }

    // Internal failures are logged here and replaced with `context`, nothing
    // from the storage layer is sent back to the client
    pub fn repository_failure(err: RepositoryError, context: &'static str) -> ServerResponse {
        match err {
            RepositoryError::MalformedId(id) => {
                tracing::info!("Rejected malformed question id '{id}'");
                status_response(StatusCode::BAD_REQUEST, "Invalid question ID format")
            },
            RepositoryError::Validation(errors) => {
                tracing::info!("Validation failed with reason: {errors}");
                validation_failed(errors.0)
            },
            err => {
                tracing::error!("{context}, {err}");
                internal_server_error(context)
            },
        }
    }
}

#[allow(non_snake_case)]
pub mod DB {
    use ::std::collections::BTreeMap;
    use chrono::{DateTime, Utc};
    use diesel::prelude::*;
    use uuid::Uuid;
    use common_types::Question::{CorrectAnswer, MatchPair};

    use crate::db_schema::{
        questions,
        hooked_sql_types::{Difficulty, QuestionType, Visibility},
    };
    use crate::Entity::{Question, QuestionFields};

    // One row of `questions`. The answer structures are stored as jsonb
    #[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
    #[diesel(table_name = questions)]
    #[diesel(treat_none_as_null = true)]
    #[allow(non_snake_case)]
    pub struct QuestionRecord {
        pub id: Uuid,
        pub title: String,
        pub questiontype: QuestionType,
        pub difficulty: Difficulty,
        pub category: String,
        pub visibility: Visibility,
        pub author: String,
        pub authoremail: String,
        pub tags: Vec<String>,
        pub content: String,
        pub options: Vec<String>,
        pub matchpairs: serde_json::Value,
        pub correctanswer: Option<serde_json::Value>,
        pub correctmatches: Option<serde_json::Value>,
        pub points: f64,
        pub estimatedtime: f64,
        pub negativemarks: Option<f64>,
        pub explanation: Option<String>,
        pub authornotes: Option<String>,
        pub ispublished: bool,
        pub updatedat: DateTime<Utc>,
    }

    impl TryFrom<&Question> for QuestionRecord {
        type Error = serde_json::Error;

        fn try_from(question: &Question) -> Result<Self, Self::Error> {
            let fields = &question.fields;
            Ok(Self {
                id: question.id,
                title: fields.title.clone(),
                questiontype: fields.question_type,
                difficulty: fields.difficulty,
                category: fields.category.clone(),
                visibility: fields.visibility,
                author: fields.author.clone(),
                authoremail: fields.author_email.clone(),
                tags: fields.tags.clone(),
                content: fields.content.clone(),
                options: fields.options.clone(),
                matchpairs: serde_json::to_value(&fields.match_pairs)?,
                correctanswer: fields.correct_answer.as_ref().map(serde_json::to_value).transpose()?,
                correctmatches: fields.correct_matches.as_ref().map(serde_json::to_value).transpose()?,
                points: fields.points,
                estimatedtime: fields.estimated_time,
                negativemarks: fields.negative_marks,
                explanation: fields.explanation.clone(),
                authornotes: fields.author_notes.clone(),
                ispublished: fields.is_published,
                updatedat: question.updated_at,
            })
        }
    }

    impl TryFrom<QuestionRecord> for Question {
        type Error = serde_json::Error;

        fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
            let match_pairs: Vec<MatchPair> = serde_json::from_value(record.matchpairs)?;
            let correct_answer: Option<CorrectAnswer> = record.correctanswer.map(serde_json::from_value).transpose()?;
            let correct_matches: Option<BTreeMap<String, String>> = record.correctmatches.map(serde_json::from_value).transpose()?;
            Ok(Question {
                id: record.id,
                fields: QuestionFields {
                    title: record.title,
                    question_type: record.questiontype,
                    difficulty: record.difficulty,
                    category: record.category,
                    visibility: record.visibility,
                    author: record.author,
                    author_email: record.authoremail,
                    tags: record.tags,
                    content: record.content,
                    options: record.options,
                    match_pairs,
                    correct_answer,
                    correct_matches,
                    points: record.points,
                    estimated_time: record.estimatedtime,
                    negative_marks: record.negativemarks,
                    explanation: record.explanation,
                    author_notes: record.authornotes,
                    is_published: record.ispublished,
                },
                updated_at: record.updatedat,
            })
        }
    }
}

#[allow(non_snake_case)]
pub mod State {
    use ::std::sync::Arc;
    use ::std::time::Duration;
    use diesel::{ConnectionError, ConnectionResult};
    use diesel_async::{
        pooled_connection::{
            ManagerConfig,
            AsyncDieselConnectionManager,
            deadpool::Pool,
        },
        AsyncPgConnection,
    };
    use futures_util::{future::BoxFuture, FutureExt};

    use crate::Constants::*;
    use crate::Middleware::rate_limit::RateLimiter;
    use crate::Repository::{MemoryRepository, PostgresRepository, QuestionRepository};

    pub struct InternalAppState {
        pub questions: Arc<dyn QuestionRepository>,
        pub rate_limiter: RateLimiter,
    }
    pub type AppState = Arc<InternalAppState>;

    pub fn with_repository<R: QuestionRepository + 'static>(repository: R, rate_limiter: RateLimiter) -> AppState {
        Arc::new(InternalAppState {
            questions: Arc::new(repository),
            rate_limiter,
        })
    }

    pub async fn make_state() -> Result<AppState, crate::E> {
        let rate_limiter = RateLimiter::new(*RATE_LIMIT_MAX_REQUESTS, Duration::from_secs(*RATE_LIMIT_WINDOW_SEC));

        let Some(database_url) = DATABASE_URL.as_deref() else {
            if *DEVELOPMENT_MODE {
                tracing::warn!("DATABASE_URL is not set, questions are kept in memory and lost on exit");
                return Ok(with_repository(MemoryRepository::new(), rate_limiter));
            }
            return Err("No environment variable for DATABASE_URL".into());
        };

        // Create our connection pool
        tracing::info!("Setting up Postgres connection pool");
        let manager = match *DATABASE_REQUIRE_TLS {
            true => {
                let mut config = ManagerConfig::default();
                config.custom_setup = Box::new(establish_connection);
                AsyncDieselConnectionManager::<AsyncPgConnection>::new_with_config(database_url, config)
            },
            false => AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url),
        };
        let pool = Pool::builder(manager).max_size(*DATABASE_POOL_SIZE).build()?;

        // Fail at startup rather than on the first request
        tracing::info!("Checking Postgres is reachable");
        drop(pool.get().await?);

        tracing::info!("Creating AppState");
        Ok(with_repository(PostgresRepository::new(pool), rate_limiter))
    }

    pub fn establish_connection(config: &str) -> BoxFuture<ConnectionResult<AsyncPgConnection>> {
        let fut = async {
            // We first set up the way we want rustls to work.
            let rustls_config = rustls::ClientConfig::builder()
                .with_safe_defaults()
                .with_root_certificates(root_certs()?)
                .with_no_client_auth();
            let tls = tokio_postgres_rustls::MakeRustlsConnect::new(rustls_config);
            let (client, conn) = tokio_postgres::connect(config, tls)
                .await
                .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;
            tokio::spawn(async move {
                if let Err(e) = conn.await {
                    tracing::error!("Database connection: {e}");
                }
            });
            AsyncPgConnection::try_from(client).await
        };
        fut.boxed()
    }

    pub fn root_certs() -> ConnectionResult<rustls::RootCertStore> {
        let mut roots = rustls::RootCertStore::empty();
        let certs = rustls_native_certs::load_native_certs()
            .map_err(|e| ConnectionError::BadConnection(format!("Certs not loadable, {e}")))?;
        let certs: Vec<_> = certs.into_iter().map(|cert| cert.0).collect();
        roots.add_parsable_certificates(&certs);
        Ok(roots)
    }
}

#[allow(non_snake_case)]
pub mod Constants {
    use lazy_static::lazy_static;

    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_PAGE_SIZE: u32 = 10;
    pub const MAX_PAGE_SIZE: u32 = 100;

    fn var_or<T: ::std::str::FromStr + ::std::fmt::Display>(name: &str, default: T) -> T {
        match dotenvy::var(name) {
            Ok(raw) => match raw.parse() {
                Ok(value) => {
                    tracing::info!("Using custom {name}: {raw}");
                    value
                },
                Err(_) => {
                    tracing::info!("Failed to parse {name}, using default, {default}");
                    default
                },
            },
            Err(_) => default,
        }
    }

    // WARNING: These are global variables that get
    // initialised at the entry point, and should not
    // be written to after
    lazy_static!{
        pub static ref DATABASE_URL: Option<String> = {
            dotenvy::var("DATABASE_URL").ok()
        };
        pub static ref DATABASE_REQUIRE_TLS: bool = var_or("DATABASE_REQUIRE_TLS", true);
        pub static ref DATABASE_POOL_SIZE: usize = var_or("DATABASE_POOL_SIZE", 16);
        pub static ref DEVELOPMENT_MODE: bool = var_or("DEVELOPMENT_MODE", false);
        pub static ref PORT: u16 = var_or("PORT", 5000);
        pub static ref ORIGIN_URL: String = {
            dotenvy::var("ORIGIN_URL").unwrap_or("*".to_owned())
        };
        pub static ref RATE_LIMIT_MAX_REQUESTS: u32 = var_or("RATE_LIMIT_MAX_REQUESTS", 100);
        pub static ref RATE_LIMIT_WINDOW_SEC: u64 = var_or("RATE_LIMIT_WINDOW_SEC", 15 * 60);
    }
}
