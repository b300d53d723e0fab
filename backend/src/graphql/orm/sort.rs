//! Sort translation for the book listing

use async_graphql::Enum;

/// Sort direction as clients send it.
#[derive(Enum, Copy, Clone, Debug, Default, Eq, PartialEq)]
#[graphql(name = "SortDirection")]
pub enum SortDirection {
    #[default]
    #[graphql(name = "ASC")]
    Asc,
    #[graphql(name = "DESC")]
    Desc,
}

impl SortDirection {
    /// Convert to SQL order string
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// One client sort, as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortTuple {
    pub field: String,
    pub direction: SortDirection,
}

impl SortTuple {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// Ordered field -> direction mapping.
///
/// A field keeps the position of its first occurrence; a later occurrence
/// only replaces the direction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderBy {
    entries: Vec<(String, SortDirection)>,
}

impl OrderBy {
    pub fn insert(&mut self, field: &str, direction: SortDirection) {
        match self.entries.iter_mut().find(|(f, _)| f == field) {
            Some(entry) => entry.1 = direction,
            None => self.entries.push((field.to_string(), direction)),
        }
    }

    pub fn get(&self, field: &str) -> Option<SortDirection> {
        self.entries
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, d)| *d)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SortDirection)> {
        self.entries.iter().map(|(f, d)| (f.as_str(), *d))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the ORDER BY mapping from client sorts.
///
/// Fields are not validated here; the query builder only renders
/// allow-listed columns.
pub fn translate_sorts(sorts: &[SortTuple]) -> OrderBy {
    let mut order = OrderBy::default();
    for sort in sorts {
        order.insert(&sort.field, sort.direction);
    }
    order
}
