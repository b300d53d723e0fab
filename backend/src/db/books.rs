//! Books repository
//!
//! The paginated listing combines a free-text search clause with the
//! compiled client filter and sort (see `graphql::orm`).

use std::collections::BTreeMap;

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::{FromRow, SqlitePool};

use super::authors::get_or_create_on;
use super::sqlite_helpers::{escape_like, now_iso8601};
use crate::graphql::orm::{CompiledFilter, ListingQuery, OrderBy, TypedValue};

/// Placeholder name of the search term in `SEARCH_CLAUSE`.
const SEARCH_PARAM: &str = "searchQuery";

/// Case-insensitive substring match on title, ISBNs and author names.
const SEARCH_CLAUSE: &str = r#""Book"."title" LIKE '%' || :searchQuery || '%' ESCAPE '\'
    OR "Book"."isbn" LIKE '%' || :searchQuery || '%' ESCAPE '\'
    OR "Book"."isbn13" LIKE '%' || :searchQuery || '%' ESCAPE '\'
    OR EXISTS (
        SELECT 1 FROM book_authors ba
        JOIN authors a ON a."id" = ba."authorId"
        WHERE ba."bookId" = "Book"."id"
          AND (a."firstName" LIKE '%' || :searchQuery || '%' ESCAPE '\'
               OR a."lastName" LIKE '%' || :searchQuery || '%' ESCAPE '\')
    )"#;

const BOOK_COLUMNS: &str = r#""id", "title", "bookCoverUrl", "isbn", "isbn13", "languageCode", "numPages", "publicationDate", "publisher", "goodreadsRatings", "categoryId", "createdAt", "updatedAt""#;

#[derive(Debug, Clone, FromRow)]
#[sqlx(rename_all = "camelCase")]
pub struct BookRecord {
    pub id: i64,
    pub title: String,
    pub book_cover_url: Option<String>,
    pub isbn: String,
    pub isbn13: String,
    pub language_code: String,
    pub num_pages: i64,
    pub publication_date: NaiveDate,
    pub publisher: String,
    pub goodreads_ratings: i64,
    pub category_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct CreateBook {
    pub title: String,
    pub book_cover_url: Option<String>,
    pub isbn: String,
    pub isbn13: String,
    pub language_code: String,
    pub num_pages: i64,
    pub publication_date: NaiveDate,
    pub publisher: String,
    pub goodreads_ratings: i64,
    pub category_id: Option<i64>,
    /// (first name, last name) pairs, created on demand
    pub authors: Vec<(String, String)>,
}

/// One page request against the book listing.
#[derive(Debug, Clone, Default)]
pub struct BookListing {
    pub search: Option<String>,
    pub filter: CompiledFilter,
    pub order_by: OrderBy,
    pub limit: i64,
    pub offset: i64,
}

impl BookListing {
    fn query(&self) -> ListingQuery {
        let mut query = ListingQuery::new();

        if let Some(term) = self.search.as_deref().map(str::trim)
            && !term.is_empty()
        {
            let mut params = BTreeMap::new();
            params.insert(SEARCH_PARAM.to_string(), TypedValue::Text(escape_like(term)));
            query = query.where_named(SEARCH_CLAUSE, params);
        }

        query.filter(&self.filter).order_by(&self.order_by)
    }
}

pub struct BookRepository {
    pool: SqlitePool,
}

impl BookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// One page of books plus the total number of matches
    pub async fn list(&self, listing: &BookListing) -> Result<(Vec<BookRecord>, i64)> {
        let query = listing.query();
        let total = query.count(&self.pool).await?;
        let books = query
            .paginate(listing.limit, listing.offset)
            .fetch_all::<BookRecord>(&self.pool)
            .await?;

        tracing::debug!(
            returned = books.len(),
            total = total,
            offset = listing.offset,
            "Listed books"
        );

        Ok((books, total))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<BookRecord>> {
        let record = sqlx::query_as::<_, BookRecord>(&format!(
            "SELECT {} FROM books WHERE \"id\" = ?",
            BOOK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Books by ID, for batch lookups
    pub async fn list_by_ids(&self, ids: &[i64]) -> Result<Vec<BookRecord>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM books WHERE \"id\" IN ({}) ORDER BY \"id\"",
            BOOK_COLUMNS, placeholders
        );

        let mut query = sqlx::query_as::<_, BookRecord>(&sql);
        for id in ids {
            query = query.bind(id);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Insert a book and link its authors in one transaction
    pub async fn create(&self, book: CreateBook) -> Result<BookRecord> {
        let now = now_iso8601();
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            r#"
            INSERT INTO books ("title", "bookCoverUrl", "isbn", "isbn13", "languageCode", "numPages",
                               "publicationDate", "publisher", "goodreadsRatings", "categoryId",
                               "createdAt", "updatedAt")
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&book.title)
        .bind(&book.book_cover_url)
        .bind(&book.isbn)
        .bind(&book.isbn13)
        .bind(&book.language_code)
        .bind(book.num_pages)
        .bind(book.publication_date)
        .bind(&book.publisher)
        .bind(book.goodreads_ratings)
        .bind(book.category_id)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for (first_name, last_name) in &book.authors {
            let author_id = get_or_create_on(&mut *tx, first_name, last_name).await?;
            sqlx::query(
                r#"INSERT OR IGNORE INTO book_authors ("bookId", "authorId") VALUES (?, ?)"#,
            )
            .bind(id)
            .bind(author_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to create book"))
    }

    /// Distinct language codes in the catalog, sorted
    pub async fn language_codes(&self) -> Result<Vec<String>> {
        let codes = sqlx::query_scalar::<_, String>(
            r#"SELECT DISTINCT "languageCode" FROM books ORDER BY "languageCode""#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(codes)
    }
}
