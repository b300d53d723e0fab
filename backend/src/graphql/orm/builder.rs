//! SQL query builder for the book listing
//!
//! Collects WHERE fragments written with named placeholders (`:name`), an
//! ORDER BY mapping and pagination, then rewrites the placeholders to the
//! numbered `?N` form sqlx binds positionally.

use std::collections::BTreeMap;

use sqlx::SqlitePool;
use sqlx::sqlite::SqliteRow;
use thiserror::Error;

use super::fields::{self, BOOK_ALIAS};
use super::filter::{CompiledFilter, TypedValue};
use super::sort::OrderBy;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlaceholderError {
    #[error("no value bound for placeholder ':{0}'")]
    MissingParameter(String),
}

/// Rewrite `:name` placeholders to `?1`, `?2`, ... and collect the values in
/// binding order. A name used twice is bound twice.
///
/// Placeholders inside single-quoted literals or double-quoted identifiers are left alone.
pub fn bind_named(
    sql: &str,
    parameters: &BTreeMap<String, TypedValue>,
) -> Result<(String, Vec<TypedValue>), PlaceholderError> {
    let mut out = String::with_capacity(sql.len());
    let mut values = Vec::new();
    let mut chars = sql.char_indices().peekable();
    let mut quote: Option<char> = None;

    while let Some((i, c)) = chars.next() {
        match (quote, c) {
            (None, '\'' | '"') => quote = Some(c),
            (Some(q), _) if q == c => quote = None,
            (None, ':') => {
                let start = i + c.len_utf8();
                let mut end = start;
                while let Some(&(j, n)) = chars.peek() {
                    if n.is_ascii_alphanumeric() || n == '_' {
                        end = j + n.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }

                if end > start {
                    let name = &sql[start..end];
                    let value = parameters
                        .get(name)
                        .ok_or_else(|| PlaceholderError::MissingParameter(name.to_string()))?;
                    values.push(value.clone());
                    out.push_str(&format!("?{}", values.len()));
                    continue;
                }
            }
            _ => {}
        }
        out.push(c);
    }

    Ok((out, values))
}

/// Bind typed values onto any sqlx query in order.
macro_rules! bind_typed {
    ($query:expr, $values:expr) => {{
        let mut query = $query;
        for value in $values {
            query = match value {
                TypedValue::Integer(i) => query.bind(*i),
                TypedValue::Date(d) => query.bind(*d),
                TypedValue::Text(s) => query.bind(s.clone()),
            };
        }
        query
    }};
}

/// Paginated, filtered SELECT over `books AS "Book"`.
#[derive(Debug, Clone, Default)]
pub struct ListingQuery {
    where_clauses: Vec<String>,
    parameters: BTreeMap<String, TypedValue>,
    order_terms: Vec<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl ListingQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// AND a fragment with named placeholders into the WHERE clause.
    pub fn where_named(mut self, fragment: &str, parameters: BTreeMap<String, TypedValue>) -> Self {
        if !fragment.is_empty() {
            self.where_clauses.push(format!("({})", fragment));
            self.parameters.extend(parameters);
        }
        self
    }

    /// AND a compiled client filter into the WHERE clause.
    pub fn filter(self, compiled: &CompiledFilter) -> Self {
        self.where_named(&compiled.sql_fragment, compiled.parameters.clone())
    }

    /// Add ORDER BY terms; fields outside the sort allow-list are dropped.
    pub fn order_by(mut self, order: &OrderBy) -> Self {
        for (field, direction) in order.iter() {
            if fields::is_sortable(field) {
                self.order_terms.push(format!(
                    "\"{}\".\"{}\" {}",
                    BOOK_ALIAS,
                    field,
                    direction.to_sql()
                ));
            } else {
                tracing::warn!(field = %field, "Sort field not allowed, ignoring");
            }
        }
        self
    }

    pub fn paginate(mut self, limit: i64, offset: i64) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    fn where_sql(&self) -> String {
        if self.where_clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.where_clauses.join(" AND "))
        }
    }

    /// Build the SELECT and its bind values.
    pub fn build_sql(&self) -> Result<(String, Vec<TypedValue>), PlaceholderError> {
        let mut sql = format!("SELECT \"{0}\".* FROM books AS \"{0}\"", BOOK_ALIAS);
        sql.push_str(&self.where_sql());

        // id keeps pages stable when the requested order has ties
        let tiebreak = format!("\"{}\".\"id\" ASC", BOOK_ALIAS);
        sql.push_str(" ORDER BY ");
        if !self.order_terms.is_empty() {
            sql.push_str(&self.order_terms.join(", "));
            sql.push_str(", ");
        }
        sql.push_str(&tiebreak);

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = self.offset
            && offset > 0
        {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        bind_named(&sql, &self.parameters)
    }

    /// Build the COUNT query over the same WHERE clause.
    pub fn build_count_sql(&self) -> Result<(String, Vec<TypedValue>), PlaceholderError> {
        let sql = format!(
            "SELECT COUNT(*) FROM books AS \"{}\"{}",
            BOOK_ALIAS,
            self.where_sql()
        );
        bind_named(&sql, &self.parameters)
    }

    pub async fn fetch_all<O>(&self, pool: &SqlitePool) -> anyhow::Result<Vec<O>>
    where
        O: for<'r> sqlx::FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let (sql, values) = self.build_sql()?;
        tracing::debug!(sql = %sql, params = values.len(), "Executing listing query");

        let query = bind_typed!(sqlx::query_as::<_, O>(&sql), &values);
        Ok(query.fetch_all(pool).await?)
    }

    pub async fn count(&self, pool: &SqlitePool) -> anyhow::Result<i64> {
        let (sql, values) = self.build_count_sql()?;
        tracing::debug!(sql = %sql, "Executing listing count");

        let query = bind_typed!(sqlx::query_scalar::<_, i64>(&sql), &values);
        Ok(query.fetch_one(pool).await?)
    }
}
