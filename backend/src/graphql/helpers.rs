// Helper functions shared across GraphQL query/mutation modules.

use std::fmt::Display;

use crate::db::{AuthorRecord, BookRecord, CategoryRecord, ReviewRecord, UserRecord};
use crate::graphql::types::{Author, Book, Category, FieldError, Review, User};
use crate::services;

/// Map an internal error to a GraphQL error
pub(crate) fn gql_err(e: impl Display) -> async_graphql::Error {
    async_graphql::Error::new(e.to_string())
}

/// OpenLibrary cover image for an ISBN (small size)
pub(crate) fn open_library_cover_url(isbn: &str) -> String {
    format!("http://covers.openlibrary.org/b/isbn/{}-S.jpg", isbn)
}

/// Convert a BookRecord from the database to a GraphQL Book type
pub(crate) fn to_book(r: BookRecord) -> Book {
    let book_cover_url = r
        .book_cover_url
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| open_library_cover_url(&r.isbn));

    Book {
        id: r.id,
        title: r.title,
        book_cover_url,
        isbn: r.isbn,
        isbn13: r.isbn13,
        language_code: r.language_code,
        num_pages: r.num_pages,
        publication_date: r.publication_date,
        publisher: r.publisher,
        goodreads_ratings: r.goodreads_ratings,
        category_id: r.category_id,
        created_at: r.created_at,
        updated_at: r.updated_at,
    }
}

pub(crate) fn to_review(r: ReviewRecord) -> Review {
    Review {
        review_item_id: r.review_item_id,
        reviewed_by_id: r.reviewed_by_id,
        rating: r.rating,
        text: r.text,
        created_at: r.created_at,
        updated_at: r.updated_at,
    }
}

pub(crate) fn to_user(r: UserRecord) -> User {
    User {
        id: r.id,
        email: r.email,
        first_name: r.first_name,
        last_name: r.last_name,
        nationality: r.nationality,
        created_at: r.created_at,
        updated_at: r.updated_at,
    }
}

impl From<AuthorRecord> for Author {
    fn from(r: AuthorRecord) -> Self {
        Self {
            id: r.id,
            first_name: r.first_name,
            last_name: r.last_name,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl From<CategoryRecord> for Category {
    fn from(r: CategoryRecord) -> Self {
        Self {
            id: r.id,
            category_name: r.category_name,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl From<services::FieldError> for FieldError {
    fn from(e: services::FieldError) -> Self {
        Self {
            field: e.field,
            message: e.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(cover: Option<&str>) -> BookRecord {
        BookRecord {
            id: 1,
            title: "Dune".to_string(),
            book_cover_url: cover.map(str::to_string),
            isbn: "0441013597".to_string(),
            isbn13: "9780441013597".to_string(),
            language_code: "eng".to_string(),
            num_pages: 604,
            publication_date: NaiveDate::from_ymd_opt(1965, 8, 1).unwrap(),
            publisher: "Ace".to_string(),
            goodreads_ratings: 0,
            category_id: None,
            created_at: "2024-01-01T00:00:00.000Z".to_string(),
            updated_at: "2024-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn test_cover_falls_back_to_open_library() {
        assert_eq!(
            to_book(record(None)).book_cover_url,
            "http://covers.openlibrary.org/b/isbn/0441013597-S.jpg"
        );
        assert_eq!(
            to_book(record(Some(""))).book_cover_url,
            "http://covers.openlibrary.org/b/isbn/0441013597-S.jpg"
        );
        assert_eq!(
            to_book(record(Some("https://img.example/dune.jpg"))).book_cover_url,
            "https://img.example/dune.jpg"
        );
    }
}
