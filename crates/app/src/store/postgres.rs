//! `PostgreSQL` document store.
//!
//! Documents live in one `documents` table as JSONB, keyed by collection and
//! `_id`. Field names and values are always bound, never spliced into SQL.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, types::Json};

use crate::store::{
    Condition, Context, Cursor, Document, Filter, FindOptions, ID_FIELD, Sort, SortDirection,
    Store, StoreError, StoreResult, string_field,
};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Append `WHERE collection = .. AND <conditions>` to `builder`.
fn push_where(builder: &mut QueryBuilder<'_, Postgres>, collection: &str, filter: &Filter) {
    builder
        .push(" WHERE collection = ")
        .push_bind(collection.to_owned());

    for condition in filter.conditions() {
        builder.push(" AND ");

        match condition {
            Condition::Eq { field, value } => {
                builder
                    .push("(body ->> ")
                    .push_bind(*field)
                    .push(") = ")
                    .push_bind(value.clone());
            }
            Condition::Contains { field, needle } => {
                builder
                    .push("strpos(lower(body ->> ")
                    .push_bind(*field)
                    .push("), lower(")
                    .push_bind(needle.clone())
                    .push(")) > 0");
            }
            Condition::Exists { field, exists } => {
                builder
                    .push("(jsonb_typeof(body -> ")
                    .push_bind(*field)
                    .push(") = 'string' AND (body ->> ")
                    .push_bind(*field)
                    .push(") <> '')");

                if *exists {
                    builder.push(" IS TRUE");
                } else {
                    builder.push(" IS NOT TRUE");
                }
            }
            Condition::Gte { field, value } => {
                builder
                    .push("(body ->> ")
                    .push_bind(*field)
                    .push(") COLLATE \"C\" >= ")
                    .push_bind(value.clone());
            }
            Condition::Lt { field, value } => {
                builder
                    .push("(body ->> ")
                    .push_bind(*field)
                    .push(") COLLATE \"C\" < ")
                    .push_bind(value.clone());
            }
        }
    }
}

/// Absent values first when ascending and last when descending, then insertion order.
fn push_order(builder: &mut QueryBuilder<'_, Postgres>, sort: Option<Sort>) {
    builder.push(" ORDER BY ");

    if let Some(sort) = sort {
        builder
            .push("(body ->> ")
            .push_bind(sort.field)
            .push(") COLLATE \"C\" ");

        builder.push(match sort.direction {
            SortDirection::Ascending => "ASC NULLS FIRST, ",
            SortDirection::Descending => "DESC NULLS LAST, ",
        });
    }

    builder.push("seq ASC");
}

/// Subquery selecting the `seq` of the first document matching `filter`.
fn push_first_match(builder: &mut QueryBuilder<'_, Postgres>, collection: &str, filter: &Filter) {
    builder.push(" WHERE seq = (SELECT seq FROM documents");
    push_where(builder, collection, filter);
    builder.push(" ORDER BY seq ASC LIMIT 1)");
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn to_u64(value: i64) -> StoreResult<u64> {
    u64::try_from(value).map_err(|error| StoreError::Decode(error.to_string()))
}

#[async_trait]
impl Store for PgStore {
    async fn count(&self, ctx: &Context, collection: &str, filter: &Filter) -> StoreResult<u64> {
        ctx.guard(async {
            let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM documents");
            push_where(&mut builder, collection, filter);

            let count: i64 = builder
                .build_query_scalar()
                .fetch_one(&self.pool)
                .await?;

            to_u64(count)
        })
        .await
    }

    async fn insert_one(
        &self,
        ctx: &Context,
        collection: &str,
        document: Document,
    ) -> StoreResult<()> {
        ctx.guard(async {
            let id = string_field(&document, ID_FIELD)
                .ok_or(StoreError::MissingId)?
                .to_owned();

            sqlx::query("INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)")
                .bind(collection)
                .bind(id)
                .bind(Json(&document))
                .execute(&self.pool)
                .await?;

            Ok(())
        })
        .await
    }

    async fn update_one(
        &self,
        ctx: &Context,
        collection: &str,
        filter: &Filter,
        mut patch: Document,
    ) -> StoreResult<()> {
        patch.remove(ID_FIELD);

        ctx.guard(async {
            let mut builder = QueryBuilder::new("UPDATE documents SET body = body || ");
            builder.push_bind(Json(patch));
            push_first_match(&mut builder, collection, filter);

            builder.build().execute(&self.pool).await?;

            Ok(())
        })
        .await
    }

    async fn delete_one(
        &self,
        ctx: &Context,
        collection: &str,
        filter: &Filter,
    ) -> StoreResult<()> {
        ctx.guard(async {
            let mut builder = QueryBuilder::new("DELETE FROM documents");
            push_first_match(&mut builder, collection, filter);

            builder.build().execute(&self.pool).await?;

            Ok(())
        })
        .await
    }

    async fn delete_many(
        &self,
        ctx: &Context,
        collection: &str,
        filter: &Filter,
    ) -> StoreResult<u64> {
        ctx.guard(async {
            let mut builder = QueryBuilder::new("DELETE FROM documents");
            push_where(&mut builder, collection, filter);

            let result = builder.build().execute(&self.pool).await?;

            Ok(result.rows_affected())
        })
        .await
    }

    async fn find_one(
        &self,
        ctx: &Context,
        collection: &str,
        filter: &Filter,
    ) -> StoreResult<Document> {
        ctx.guard(async {
            let mut builder = QueryBuilder::new("SELECT body FROM documents");
            push_where(&mut builder, collection, filter);
            push_order(&mut builder, None);
            builder.push(" LIMIT 1");

            builder
                .build_query_scalar::<Json<Document>>()
                .fetch_optional(&self.pool)
                .await?
                .map(|Json(document)| document)
                .ok_or(StoreError::NotFound)
        })
        .await
    }

    async fn find(
        &self,
        ctx: &Context,
        collection: &str,
        filter: &Filter,
        options: FindOptions,
    ) -> StoreResult<Cursor> {
        ctx.guard(async {
            let mut builder = QueryBuilder::new("SELECT body FROM documents");
            push_where(&mut builder, collection, filter);
            push_order(&mut builder, options.sort);

            if let Some(limit) = options.limit {
                builder.push(" LIMIT ").push_bind(to_i64(limit));
            }

            builder.push(" OFFSET ").push_bind(to_i64(options.skip));

            let rows = builder
                .build_query_scalar::<Json<Document>>()
                .fetch_all(&self.pool)
                .await?;

            Ok(Cursor::new(rows.into_iter().map(|Json(document)| document)))
        })
        .await
    }
}
