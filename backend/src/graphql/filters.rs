//! Listing inputs for the `books` query
//!
//! Inputs arrive as loosely typed strings and are turned into translator
//! tuples here; see `orm` for the SQL side.

use async_graphql::InputObject;

use super::orm::{
    CompiledFilter, FilterTuple, OrderBy, Predicate, SortDirection, SortTuple, translate_filters,
    translate_sorts,
};

/// Filter options to filter on books
#[derive(InputObject, Debug, Clone)]
pub struct FilterInput {
    /// Field to filter on: "numPages", "languageCode" or "publicationDate"
    pub filter_field: String,
    /// Predicate, e.g. "moreThan", "equal", "lessThanOrEqual"
    pub filter_predicate: String,
    pub filter_value: String,
}

/// Sort option for books
#[derive(InputObject, Debug, Clone)]
pub struct SortInput {
    /// Field to sort on, must be a field on Book
    pub sort_field: String,
    pub sort_value: SortDirection,
}

#[derive(InputObject, Debug, Clone)]
pub struct PaginatedBooksInput {
    pub limit: i64,
    #[graphql(default = 0)]
    pub offset: i64,
    #[graphql(default)]
    pub sort: Vec<SortInput>,
    pub search_query: Option<String>,
    #[graphql(default)]
    pub filter: Vec<FilterInput>,
}

impl PaginatedBooksInput {
    /// Compile the client filters; unknown predicates are dropped
    pub fn compiled_filter(&self) -> CompiledFilter {
        let tuples: Vec<FilterTuple> = self
            .filter
            .iter()
            .filter_map(|f| match f.filter_predicate.parse::<Predicate>() {
                Ok(predicate) => Some(FilterTuple::new(
                    f.filter_field.clone(),
                    predicate,
                    f.filter_value.clone(),
                )),
                Err(e) => {
                    tracing::warn!(field = %f.filter_field, error = %e, "Dropping filter");
                    None
                }
            })
            .collect();

        translate_filters(&tuples)
    }

    pub fn order_by(&self) -> OrderBy {
        let tuples: Vec<SortTuple> = self
            .sort
            .iter()
            .map(|s| SortTuple::new(s.sort_field.clone(), s.sort_value))
            .collect();

        translate_sorts(&tuples)
    }

    /// Limit clamped to 0..=max and a non-negative offset
    pub fn page(&self, max_page_size: i64) -> (i64, i64) {
        (self.limit.clamp(0, max_page_size), self.offset.max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphql::orm::TypedValue;
    use pretty_assertions::assert_eq;

    fn filter(field: &str, predicate: &str, value: &str) -> FilterInput {
        FilterInput {
            filter_field: field.to_string(),
            filter_predicate: predicate.to_string(),
            filter_value: value.to_string(),
        }
    }

    fn input(filters: Vec<FilterInput>, sorts: Vec<SortInput>) -> PaginatedBooksInput {
        PaginatedBooksInput {
            limit: 20,
            offset: 0,
            sort: sorts,
            search_query: None,
            filter: filters,
        }
    }

    #[test]
    fn test_inputs_compile_to_range() {
        let options = input(
            vec![
                filter("numPages", "moreThan", "100"),
                filter("numPages", "lessThan", "500"),
            ],
            vec![SortInput {
                sort_field: "publicationDate".to_string(),
                sort_value: SortDirection::Desc,
            }],
        );

        let compiled = options.compiled_filter();
        assert_eq!(
            compiled.sql_fragment,
            "\"Book\".\"numPages\" BETWEEN :numPages AND :numPages2"
        );
        assert_eq!(compiled.parameters.get("numPages"), Some(&TypedValue::Integer(100)));
        assert_eq!(compiled.parameters.get("numPages2"), Some(&TypedValue::Integer(500)));
        assert_eq!(options.order_by().get("publicationDate"), Some(SortDirection::Desc));
    }

    #[test]
    fn test_unknown_predicate_is_dropped() {
        let options = input(
            vec![
                filter("numPages", "approximately", "100"),
                filter("languageCode", "equal", "eng"),
            ],
            vec![],
        );

        let compiled = options.compiled_filter();
        assert_eq!(compiled.sql_fragment, "\"Book\".\"languageCode\" = :languageCode");
        assert_eq!(compiled.parameters.len(), 1);
    }

    #[test]
    fn test_page_is_clamped() {
        let mut options = input(vec![], vec![]);
        options.limit = 5000;
        options.offset = -3;
        assert_eq!(options.page(100), (100, 0));
    }
}
