//! Generic collection queries built from resource descriptors.
//!
//! Table and column names come from the static resource registry; every
//! caller-supplied value is bound. Rows are returned as `to_jsonb(t)`.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Postgres, QueryBuilder};

use crate::application::access::ListScope;
use crate::application::query::{CollectionQuery, FieldFilter, FilterValue};
use crate::application::repos::{CollectionRepo, FetchedRows, RepoError};
use crate::domain::resources::{OwnershipPath, ResourceDescriptor};

use super::{PostgresRepositories, map_sqlx_error};

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &FieldFilter) {
    qb.push(" AND t.");
    qb.push(filter.field);
    match &filter.value {
        FilterValue::Bool(value) => {
            qb.push(" = ");
            qb.push_bind(*value);
        }
        FilterValue::Integer(value) => {
            qb.push(" = ");
            qb.push_bind(*value);
        }
        FilterValue::Text(value) => {
            qb.push("::text = ");
            qb.push_bind(value.clone());
        }
    }
}

/// Escape LIKE metacharacters so the search text matches literally.
fn like_escape(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len());
    for ch in search.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn push_search(qb: &mut QueryBuilder<'_, Postgres>, fields: &[&'static str], search: &str) {
    if fields.is_empty() {
        return;
    }
    let pattern = format!("%{}%", like_escape(search));
    qb.push(" AND (");
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        qb.push("t.");
        qb.push(*field);
        qb.push("::text ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" ESCAPE '\\'");
    }
    qb.push(")");
}

/// `t.cart_id IN (SELECT id FROM carts WHERE user_id = $n)` for indirect paths,
/// `t.user_id = $n` for direct ones.
fn push_ownership(qb: &mut QueryBuilder<'_, Postgres>, path: &OwnershipPath, owner_id: i64) {
    qb.push(" AND ");
    let mut qualifier = "t.";
    for hop in path.hops {
        qb.push(qualifier);
        qb.push(hop.column);
        qb.push(" IN (SELECT id FROM ");
        qb.push(hop.table);
        qb.push(" WHERE ");
        qualifier = "";
    }
    qb.push(qualifier);
    qb.push(path.owner_column);
    qb.push(" = ");
    qb.push_bind(owner_id);
    for _ in path.hops {
        qb.push(")");
    }
}

fn push_scope(qb: &mut QueryBuilder<'_, Postgres>, scope: &ListScope) {
    match scope {
        ListScope::Everything => {}
        ListScope::Nothing => {
            qb.push(" AND FALSE");
        }
        ListScope::Owned { path, owner_id } => push_ownership(qb, path, *owner_id),
        ListScope::Matching { column, value } => {
            qb.push(" AND t.");
            qb.push(*column);
            qb.push("::text = ");
            qb.push_bind(*value);
        }
    }
}

fn push_conditions(
    qb: &mut QueryBuilder<'_, Postgres>,
    descriptor: &ResourceDescriptor,
    query: &CollectionQuery,
) {
    qb.push(" WHERE TRUE");
    for filter in &query.filters {
        push_filter(qb, filter);
    }
    if let Some(search) = query.search.as_deref() {
        push_search(qb, descriptor.search_fields, search);
    }
    push_scope(qb, &query.scope);
}

fn page_query<'q>(
    descriptor: &ResourceDescriptor,
    query: &CollectionQuery,
) -> QueryBuilder<'q, Postgres> {
    let mut qb = QueryBuilder::new("SELECT to_jsonb(t) FROM ");
    qb.push(descriptor.table);
    qb.push(" t");
    push_conditions(&mut qb, descriptor, query);

    qb.push(" ORDER BY ");
    for term in &query.ordering {
        qb.push("t.");
        qb.push(term.field);
        qb.push(if term.descending { " DESC, " } else { " ASC, " });
    }
    qb.push("t.id ASC");

    qb.push(" LIMIT ");
    qb.push_bind(i64::from(query.page.limit));
    qb.push(" OFFSET ");
    qb.push_bind(i64::try_from(query.page.offset).unwrap_or(i64::MAX));
    qb
}

fn count_query<'q>(
    descriptor: &ResourceDescriptor,
    query: &CollectionQuery,
) -> QueryBuilder<'q, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM ");
    qb.push(descriptor.table);
    qb.push(" t");
    push_conditions(&mut qb, descriptor, query);
    qb
}

fn row_query<'q>(
    descriptor: &ResourceDescriptor,
    scope: &ListScope,
    id: i64,
) -> QueryBuilder<'q, Postgres> {
    let mut qb = QueryBuilder::new("SELECT to_jsonb(t) FROM ");
    qb.push(descriptor.table);
    qb.push(" t WHERE t.id = ");
    qb.push_bind(id);
    push_scope(&mut qb, scope);
    qb
}

#[async_trait]
impl CollectionRepo for PostgresRepositories {
    async fn fetch_page(
        &self,
        descriptor: &ResourceDescriptor,
        query: &CollectionQuery,
    ) -> Result<FetchedRows, RepoError> {
        let total: i64 = count_query(descriptor, query)
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let rows: Vec<Value> = page_query(descriptor, query)
            .build_query_scalar()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(FetchedRows {
            rows,
            total: Self::convert_count(total)?,
        })
    }

    async fn find_row(
        &self,
        descriptor: &ResourceDescriptor,
        scope: &ListScope,
        id: i64,
    ) -> Result<Option<Value>, RepoError> {
        row_query(descriptor, scope, id)
            .build_query_scalar()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)
    }
}
