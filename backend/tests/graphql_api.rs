//! End-to-end tests of the HTTP router and GraphQL schema
//!
//! Each test runs against a fresh in-memory database:
//! - Health routes
//! - Register/login cookie flow
//! - Book listing with search, filters and sorts
//! - Review mutations behind the session guard

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tower::ServiceExt;

use bookshelf::config::Config;
use bookshelf::db::{CreateBook, Database};
use bookshelf::{AppState, build_app};

// ============================================================================
// Harness
// ============================================================================

struct TestApp {
    router: Router,
    db: Database,
}

impl TestApp {
    async fn new() -> Self {
        let db = Database::connect_in_memory().await.unwrap();
        db.migrate().await.unwrap();

        let config = Arc::new(Config {
            bcrypt_cost: 4,
            ..Config::default()
        });
        let router = build_app(AppState::new(config, db.clone())).unwrap();

        Self { router, db }
    }

    async fn seed_books(&self) {
        let fantasy = self.db.categories().create("Fantasy").await.unwrap();
        let books = [
            ("Dune", "0441013597", 604, "1965-08-01", "eng", "Frank", "Herbert", None),
            ("The Hobbit", "0618260307", 366, "1937-09-21", "eng", "J.R.R.", "Tolkien", Some(fantasy.id)),
            ("Le Petit Prince", "2070612759", 96, "1943-04-06", "fre", "Antoine", "de Saint-Exupéry", None),
            ("The Silmarillion", "0618391118", 386, "1977-09-15", "eng", "J.R.R.", "Tolkien", Some(fantasy.id)),
        ];

        for (title, isbn, pages, published, language, first, last, category_id) in books {
            self.db
                .books()
                .create(CreateBook {
                    title: title.to_string(),
                    book_cover_url: None,
                    isbn: isbn.to_string(),
                    isbn13: format!("978{}", isbn),
                    language_code: language.to_string(),
                    num_pages: pages,
                    publication_date: NaiveDate::parse_from_str(published, "%Y-%m-%d").unwrap(),
                    publisher: "Test Press".to_string(),
                    goodreads_ratings: 0,
                    category_id,
                    authors: vec![(first.to_string(), last.to_string())],
                })
                .await
                .unwrap();
        }
    }

    /// POST a GraphQL document; returns the JSON body and any Set-Cookie header
    async fn graphql(&self, query: &str, variables: Value, cookie: Option<&str>) -> (Value, Option<String>) {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/graphql")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let body = json!({ "query": query, "variables": variables }).to_string();
        let response = self
            .router
            .clone()
            .oneshot(builder.body(Body::from(body)).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();

        (serde_json::from_slice(&bytes).unwrap(), set_cookie)
    }

    /// Register a user and return the `name=value` pair of the session cookie
    async fn register(&self, email: &str) -> String {
        let (body, set_cookie) = self
            .graphql(
                REGISTER,
                json!({ "options": {
                    "email": email,
                    "firstName": "Ada",
                    "lastName": "Lovelace",
                    "password": "hunter22",
                }}),
                None,
            )
            .await;

        assert!(body["data"]["register"]["errors"].is_null(), "{body}");
        let set_cookie = set_cookie.expect("register sets the session cookie");
        set_cookie.split(';').next().unwrap().to_string()
    }
}

const REGISTER: &str = r#"
mutation Register($options: RegisterOptions!) {
  register(options: $options) {
    errors { field message }
    user { id email firstName }
  }
}"#;

const BOOKS: &str = r#"
query Books($options: PaginatedBooksInput!) {
  books(options: $options) {
    totalCount
    books { title numPages bookCoverUrl authors { lastName } }
  }
}"#;

fn titles(body: &Value) -> Vec<String> {
    body["data"]["books"]["books"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_routes() {
    let app = TestApp::new().await;

    for path in ["/healthz", "/readyz"] {
        let response = app
            .router
            .clone()
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{path}");
    }
}

// ============================================================================
// Accounts
// ============================================================================

#[tokio::test]
async fn test_register_sets_cookie_and_me_resolves() {
    let app = TestApp::new().await;
    let cookie = app.register("ada@example.com").await;
    assert!(cookie.starts_with("bookshelf.sid="));

    let (body, _) = app.graphql("{ me { email firstName } }", json!({}), Some(&cookie)).await;
    assert_eq!(body["data"]["me"]["email"], "ada@example.com");

    let (anonymous, _) = app.graphql("{ me { email } }", json!({}), None).await;
    assert!(anonymous["data"]["me"].is_null());
}

#[tokio::test]
async fn test_register_validation_and_duplicates() {
    let app = TestApp::new().await;
    app.register("ada@example.com").await;

    let (body, set_cookie) = app
        .graphql(
            REGISTER,
            json!({ "options": {
                "email": "ada@example.com",
                "firstName": "Ada",
                "lastName": "Lovelace",
                "password": "hunter22",
            }}),
            None,
        )
        .await;
    assert_eq!(
        body["data"]["register"]["errors"],
        json!([{ "field": "email", "message": "email address already taken" }])
    );
    assert!(set_cookie.is_none());

    let (body, _) = app
        .graphql(
            REGISTER,
            json!({ "options": {
                "email": "nope",
                "firstName": "A",
                "lastName": "B",
                "password": "hunter22",
            }}),
            None,
        )
        .await;
    assert_eq!(
        body["data"]["register"]["errors"],
        json!([{ "field": "email", "message": "invalid email" }])
    );
}

#[tokio::test]
async fn test_login_and_logout() {
    let app = TestApp::new().await;
    app.register("ada@example.com").await;

    let login = r#"
      mutation Login($email: String!, $password: String!) {
        login(email: $email, password: $password) { errors { field message } user { email } }
      }"#;

    let (body, set_cookie) = app
        .graphql(login, json!({ "email": "ada@example.com", "password": "wrong" }), None)
        .await;
    assert_eq!(
        body["data"]["login"]["errors"],
        json!([{ "field": "password", "message": "incorrect password" }])
    );
    assert!(set_cookie.is_none());

    let (body, set_cookie) = app
        .graphql(login, json!({ "email": "ada@example.com", "password": "hunter22" }), None)
        .await;
    assert_eq!(body["data"]["login"]["user"]["email"], "ada@example.com");
    let cookie = set_cookie.unwrap().split(';').next().unwrap().to_string();

    let (body, cleared) = app.graphql("mutation { logout }", json!({}), Some(&cookie)).await;
    assert_eq!(body["data"]["logout"], true);
    assert!(cleared.unwrap().contains("Max-Age=0"));

    let (me, _) = app.graphql("{ me { email } }", json!({}), Some(&cookie)).await;
    assert!(me["data"]["me"].is_null());
}

// ============================================================================
// Book listing
// ============================================================================

#[tokio::test]
async fn test_books_range_filter_and_sort() {
    let app = TestApp::new().await;
    app.seed_books().await;

    let (body, _) = app
        .graphql(
            BOOKS,
            json!({ "options": {
                "limit": 10,
                "sort": [{ "sortField": "publicationDate", "sortValue": "DESC" }],
                "filter": [
                    { "filterField": "numPages", "filterPredicate": "moreThan", "filterValue": "100" },
                    { "filterField": "numPages", "filterPredicate": "lessThan", "filterValue": "500" },
                ],
            }}),
            None,
        )
        .await;

    assert_eq!(body["data"]["books"]["totalCount"], 2);
    assert_eq!(titles(&body), vec!["The Silmarillion", "The Hobbit"]);
    assert_eq!(
        body["data"]["books"]["books"][0]["bookCoverUrl"],
        "http://covers.openlibrary.org/b/isbn/0618391118-S.jpg"
    );
}

#[tokio::test]
async fn test_books_invalid_inputs_are_ignored() {
    let app = TestApp::new().await;
    app.seed_books().await;

    let (body, _) = app
        .graphql(
            BOOKS,
            json!({ "options": {
                "limit": 2,
                "offset": 1,
                "sort": [{ "sortField": "title; DROP TABLE books", "sortValue": "ASC" }],
                "filter": [
                    { "filterField": "unknownField", "filterPredicate": "equal", "filterValue": "x" },
                    { "filterField": "numPages", "filterPredicate": "moreThan", "filterValue": "lots" },
                ],
            }}),
            None,
        )
        .await;

    assert!(body["errors"].is_null(), "{body}");
    assert_eq!(body["data"]["books"]["totalCount"], 4);
    assert_eq!(titles(&body), vec!["The Hobbit", "Le Petit Prince"]);
}

#[tokio::test]
async fn test_books_search_with_language_filter() {
    let app = TestApp::new().await;
    app.seed_books().await;

    let (body, _) = app
        .graphql(
            BOOKS,
            json!({ "options": {
                "limit": 10,
                "searchQuery": "tolkien",
                "sort": [{ "sortField": "numPages", "sortValue": "DESC" }],
                "filter": [
                    { "filterField": "languageCode", "filterPredicate": "equal", "filterValue": "eng" },
                ],
            }}),
            None,
        )
        .await;

    assert_eq!(titles(&body), vec!["The Silmarillion", "The Hobbit"]);
    assert_eq!(body["data"]["books"]["books"][0]["authors"], json!([{ "lastName": "Tolkien" }]));
}

#[tokio::test]
async fn test_catalog_queries() {
    let app = TestApp::new().await;
    app.seed_books().await;

    let (body, _) = app
        .graphql(
            "{ languageCodes categories { categoryName } book(id: 2) { title category { categoryName } } }",
            json!({}),
            None,
        )
        .await;

    assert_eq!(body["data"]["languageCodes"], json!(["eng", "fre"]));
    assert_eq!(body["data"]["categories"], json!([{ "categoryName": "Fantasy" }]));
    assert_eq!(body["data"]["book"]["title"], "The Hobbit");
    assert_eq!(body["data"]["book"]["category"]["categoryName"], "Fantasy");
}

// ============================================================================
// Reviews
// ============================================================================

#[tokio::test]
async fn test_review_lifecycle() {
    let app = TestApp::new().await;
    app.seed_books().await;
    let cookie = app.register("ada@example.com").await;

    let create = r#"
      mutation { createReview(bookId: 1, input: { rating: 4, text: "Spice" }) {
        rating text reviewedBy { email } reviewItem { title }
      } }"#;
    let (body, _) = app.graphql(create, json!({}), Some(&cookie)).await;
    assert_eq!(
        body["data"]["createReview"],
        json!({
            "rating": 4.0,
            "text": "Spice",
            "reviewedBy": { "email": "ada@example.com" },
            "reviewItem": { "title": "Dune" },
        })
    );

    let (body, _) = app
        .graphql("{ book(id: 1) { averageRating yourReview { rating } } }", json!({}), Some(&cookie))
        .await;
    assert_eq!(body["data"]["book"]["averageRating"], 4.0);
    assert_eq!(body["data"]["book"]["yourReview"]["rating"], 4.0);

    let (body, _) = app
        .graphql("{ book(id: 1) { yourReview { rating } } }", json!({}), None)
        .await;
    assert!(body["data"]["book"]["yourReview"].is_null());

    let (body, _) = app
        .graphql(
            "mutation { updateReview(bookId: 1, input: { rating: 5 }) { rating text } }",
            json!({}),
            Some(&cookie),
        )
        .await;
    assert_eq!(body["data"]["updateReview"], json!({ "rating": 5.0, "text": null }));

    let (body, _) = app
        .graphql(
            "mutation { updateReview(bookId: 2, input: { rating: 5 }) { rating } }",
            json!({}),
            Some(&cookie),
        )
        .await;
    assert!(body["data"]["updateReview"].is_null());

    let (body, _) = app.graphql("{ reviews { totalCount } }", json!({}), None).await;
    assert_eq!(body["data"]["reviews"]["totalCount"], 1);

    let (body, _) = app
        .graphql("mutation { deleteReview(bookId: 1) }", json!({}), Some(&cookie))
        .await;
    assert_eq!(body["data"]["deleteReview"], true);

    let (body, _) = app
        .graphql("{ book(id: 1) { averageRating } }", json!({}), None)
        .await;
    assert!(body["data"]["book"]["averageRating"].is_null());
}

#[tokio::test]
async fn test_book_page_resolves_relations_per_book() {
    let app = TestApp::new().await;
    app.seed_books().await;
    let ada = app.register("ada@example.com").await;
    let bob = app.register("bob@example.com").await;

    for (cookie, book_id, rating) in [(&ada, 1, 4), (&ada, 2, 5), (&bob, 1, 2)] {
        let (body, _) = app
            .graphql(
                &format!("mutation {{ createReview(bookId: {book_id}, input: {{ rating: {rating} }}) {{ rating }} }}"),
                json!({}),
                Some(cookie.as_str()),
            )
            .await;
        assert!(body["errors"].is_null(), "{body}");
    }

    let query = r#"
      query Books($options: PaginatedBooksInput!) {
        books(options: $options) {
          books {
            title averageRating
            yourReview { rating }
            reviews { rating }
            category { categoryName }
            authors { lastName }
          }
        }
      }"#;
    let (body, _) = app
        .graphql(query, json!({ "options": { "limit": 4 } }), Some(&ada))
        .await;
    let books = body["data"]["books"]["books"].as_array().unwrap();
    assert_eq!(books.len(), 4, "{body}");

    let summary: Vec<_> = books
        .iter()
        .map(|b| {
            (
                b["title"].as_str().unwrap(),
                b["averageRating"].as_f64(),
                b["yourReview"]["rating"].as_f64(),
                b["reviews"].as_array().unwrap().len(),
                b["category"]["categoryName"].as_str(),
                b["authors"][0]["lastName"].as_str().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Dune", Some(3.0), Some(4.0), 2, None, "Herbert"),
            ("The Hobbit", Some(5.0), Some(5.0), 1, Some("Fantasy"), "Tolkien"),
            ("Le Petit Prince", None, None, 0, None, "de Saint-Exupéry"),
            ("The Silmarillion", None, None, 0, Some("Fantasy"), "Tolkien"),
        ]
    );
}

#[tokio::test]
async fn test_review_mutations_require_session() {
    let app = TestApp::new().await;
    app.seed_books().await;

    let (body, _) = app
        .graphql(
            "mutation { createReview(bookId: 1, input: { rating: 3 }) { rating } }",
            json!({}),
            Some("bookshelf.sid=forged"),
        )
        .await;

    assert_eq!(body["errors"][0]["message"], "not authenticated");
    assert_eq!(body["errors"][0]["extensions"]["code"], "UNAUTHORIZED");
}
