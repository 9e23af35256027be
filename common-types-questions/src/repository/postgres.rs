use axum::async_trait;
use diesel::dsl::{count_star, sql};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::{Bool, Text};
use diesel::{sql_query, QueryableByName};
use diesel_async::{
    pooled_connection::deadpool::{Object, Pool},
    scoped_futures::ScopedFutureExt,
    AsyncPgConnection,
    RunQueryDsl,
};

use super::{
    parse_question_id,
    PageWindow,
    QuestionPage,
    QuestionRepository,
    QuestionStats,
    RepositoryError,
};
use crate::{
    Schema::questions,
    DB::QuestionRecord,
    Entity::{now, Question, QuestionFields},
    Filter::{Clause, QuestionQuery},
    Validation::QuestionDraft,
};

type PostgresConnection = Object<AsyncPgConnection>;

#[derive(QueryableByName)]
struct TagRow {
    #[diesel(sql_type = Text)]
    tag: String,
}

pub struct PostgresRepository {
    pool: Pool<AsyncPgConnection>,
}

impl PostgresRepository {
    pub fn new(pool: Pool<AsyncPgConnection>) -> Self {
        Self { pool }
    }

    async fn connection(&self) -> Result<PostgresConnection, RepositoryError> {
        self.pool.get().await.map_err(|err| RepositoryError::Pool(err.to_string()))
    }
}

fn filtered(query: &QuestionQuery) -> questions::BoxedQuery<'static, Pg> {
    let mut statement = questions::table.into_boxed();
    for clause in query.clauses() {
        statement = match clause {
            Clause::Category(category) => statement.filter(questions::category.eq(category.clone())),
            Clause::Difficulty(difficulty) => statement.filter(questions::difficulty.eq(*difficulty)),
            Clause::Visibility(visibility) => statement.filter(questions::visibility.eq(*visibility)),
            Clause::Type(question_type) => statement.filter(questions::questiontype.eq(*question_type)),
            Clause::AnyTag(tags) => statement.filter(questions::tags.overlaps_with(tags.clone())),
            Clause::Published(is_published) => statement.filter(questions::ispublished.eq(*is_published)),
            Clause::AuthorEmail(email) => statement.filter(questions::authoremail.eq(email.clone())),
            Clause::Never => statement.filter(sql::<Bool>("FALSE")),
        };
    }
    statement
}

fn newest_first(statement: questions::BoxedQuery<'static, Pg>) -> questions::BoxedQuery<'static, Pg> {
    statement.order((questions::updatedat.desc(), questions::id.desc()))
}

fn page_of(query: &QuestionQuery, window: PageWindow) -> questions::BoxedQuery<'static, Pg> {
    newest_first(filtered(query))
        .offset(window.offset())
        .limit(window.limit())
}

fn decode(records: Vec<QuestionRecord>) -> Result<Vec<Question>, RepositoryError> {
    records.into_iter()
        .map(|record| Question::try_from(record).map_err(RepositoryError::from))
        .collect()
}

#[async_trait]
impl QuestionRepository for PostgresRepository {
    async fn create(&self, draft: QuestionDraft) -> Result<Question, RepositoryError> {
        let question = Question::new(QuestionFields::from_draft(draft)?);
        let record = QuestionRecord::try_from(&question)?;
        let mut conn = self.connection().await?;
        diesel::insert_into(questions::table)
            .values(&record)
            .execute(&mut conn)
            .await?;
        Ok(question)
    }

    async fn list(&self, query: &QuestionQuery, window: PageWindow) -> Result<QuestionPage, RepositoryError> {
        if query.is_unsatisfiable() {
            return Ok(QuestionPage::empty())
        }
        let mut conn = self.connection().await?;
        let records = page_of(query, window)
            .select(QuestionRecord::as_select())
            .load::<QuestionRecord>(&mut conn)
            .await?;
        let total = filtered(query)
            .count()
            .get_result::<i64>(&mut conn)
            .await?;
        Ok(QuestionPage {
            questions: decode(records)?,
            total: total.max(0) as u64,
        })
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Question>, RepositoryError> {
        let id = parse_question_id(id)?;
        let mut conn = self.connection().await?;
        let record = questions::table
            .find(id)
            .select(QuestionRecord::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(record.map(Question::try_from).transpose()?)
    }

    async fn update(&self, id: &str, patch: QuestionDraft) -> Result<Option<Question>, RepositoryError> {
        let id = parse_question_id(id)?;
        let mut conn = self.connection().await?;
        conn.build_transaction()
            .read_committed()
            .run::<_, RepositoryError, _>(|conn| async move {
                // Concurrent updates of the same question queue up here
                let record = questions::table
                    .find(id)
                    .select(QuestionRecord::as_select())
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;
                let Some(record) = record else {
                    return Ok(None)
                };
                let merged = Question::try_from(record)?.merged(patch)?;
                diesel::update(questions::table.find(id))
                    .set(&QuestionRecord::try_from(&merged)?)
                    .execute(conn)
                    .await?;
                Ok(Some(merged))
            }.scope_boxed())
            .await
    }

    async fn delete(&self, id: &str) -> Result<bool, RepositoryError> {
        let id = parse_question_id(id)?;
        let mut conn = self.connection().await?;
        let deleted = diesel::delete(questions::table.find(id))
            .execute(&mut conn)
            .await?;
        Ok(deleted > 0)
    }

    async fn stats(&self) -> Result<QuestionStats, RepositoryError> {
        let mut conn = self.connection().await?;
        let counts = questions::table
            .group_by(questions::ispublished)
            .select((questions::ispublished, count_star()))
            .load::<(bool, i64)>(&mut conn)
            .await?;
        let mut stats = QuestionStats::default();
        for (is_published, count) in counts {
            stats.tally(is_published, count.max(0) as u64);
        }
        Ok(stats)
    }

    async fn distinct_categories(&self) -> Result<Vec<String>, RepositoryError> {
        let mut conn = self.connection().await?;
        Ok(questions::table
            .select(questions::category)
            .filter(questions::category.ne(""))
            .distinct()
            .load::<String>(&mut conn)
            .await?)
    }

    async fn distinct_tags(&self) -> Result<Vec<String>, RepositoryError> {
        let mut conn = self.connection().await?;
        let rows = sql_query("SELECT DISTINCT tag FROM questions CROSS JOIN LATERAL unnest(tags) AS tag WHERE tag <> ''")
            .load::<TagRow>(&mut conn)
            .await?;
        Ok(rows.into_iter().map(|row| row.tag).collect())
    }

    async fn by_author(&self, email: &str) -> Result<Vec<Question>, RepositoryError> {
        let mut conn = self.connection().await?;
        let records = newest_first(filtered(&QuestionQuery::by_author(email)))
            .select(QuestionRecord::as_select())
            .load::<QuestionRecord>(&mut conn)
            .await?;
        decode(records)
    }

    async fn set_published(&self, id: &str, is_published: bool) -> Result<Option<Question>, RepositoryError> {
        let id = parse_question_id(id)?;
        let mut conn = self.connection().await?;
        let record = diesel::update(questions::table.find(id))
            .set((
                questions::ispublished.eq(is_published),
                questions::updatedat.eq(now()),
            ))
            .returning(QuestionRecord::as_returning())
            .get_result(&mut conn)
            .await
            .optional()?;
        Ok(record.map(Question::try_from).transpose()?)
    }

    async fn close(&self) {
        tracing::info!("Closing Postgres connection pool");
        self.pool.close();
    }
}
