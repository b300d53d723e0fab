//! Column registry for the book listing
//!
//! One static table decides which `Book` columns clients may filter and sort
//! on, and which scalar kind a filter value must parse as.

/// Alias the listing query gives the books table.
pub const BOOK_ALIAS: &str = "Book";

/// Scalar kind a filter value is coerced to before binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Integer,
    Date,
    String,
}

/// A column exposed to listing clients.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ScalarKind,
    /// Filterable columns are also sortable; the reverse does not hold.
    pub filterable: bool,
}

/// Allow-list of book columns for filtering and sorting.
pub const BOOK_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec {
        name: "numPages",
        kind: ScalarKind::Integer,
        filterable: true,
    },
    ColumnSpec {
        name: "publicationDate",
        kind: ScalarKind::Date,
        filterable: true,
    },
    ColumnSpec {
        name: "languageCode",
        kind: ScalarKind::String,
        filterable: true,
    },
    ColumnSpec {
        name: "createdAt",
        kind: ScalarKind::Date,
        filterable: false,
    },
    ColumnSpec {
        name: "updatedAt",
        kind: ScalarKind::Date,
        filterable: false,
    },
];

fn lookup(field: &str) -> Option<&'static ColumnSpec> {
    BOOK_COLUMNS.iter().find(|c| c.name == field)
}

/// Scalar kind of a filterable field, or `None` if the field is not in the filter allow-list.
pub fn filter_kind(field: &str) -> Option<ScalarKind> {
    lookup(field).filter(|c| c.filterable).map(|c| c.kind)
}

/// Whether the field may appear in an ORDER BY clause.
pub fn is_sortable(field: &str) -> bool {
    lookup(field).is_some()
}
