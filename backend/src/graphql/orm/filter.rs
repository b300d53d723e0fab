//! Filter translation for the book listing
//!
//! Turns client filter tuples (field, predicate, raw value) into a
//! parameterized WHERE fragment with named placeholders. Two filters on the
//! same field that form a lower/upper bound pair are merged into a single
//! BETWEEN condition.
//!
//! Translation is best-effort: a filter with an unknown field, an unknown
//! predicate or a value that does not parse is logged and left out of the
//! query. It never fails the request.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate};
use thiserror::Error;

use super::fields::{self, BOOK_ALIAS, ScalarKind};

/// SQL operator produced for a merged range.
pub const RANGE_OPERATOR: &str = "BETWEEN";

// ============================================================================
// Errors
// ============================================================================

/// Reasons a filter is left out of the compiled query.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("unknown filter field '{0}'")]
    UnknownField(String),

    #[error("value '{value}' is not a valid {kind:?} for field '{field}'")]
    UnparseableValue {
        field: String,
        value: String,
        kind: ScalarKind,
    },

    #[error("filters on '{0}' do not form a lower/upper bound pair")]
    UnmergeableRangePair(String),

    #[error("unknown filter predicate '{0}'")]
    UnknownPredicate(String),

    #[error("'between' on '{0}' needs a lower and an upper bound filter")]
    StandaloneRange(String),
}

// ============================================================================
// Predicates
// ============================================================================

/// Comparison requested by a client filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    MoreThan,
    LessThan,
    MoreThanOrEqual,
    LessThanOrEqual,
    Equal,
    Not,
    Like,
    Between,
}

impl Predicate {
    /// The camelCase name clients send.
    pub fn as_str(&self) -> &'static str {
        match self {
            Predicate::MoreThan => "moreThan",
            Predicate::LessThan => "lessThan",
            Predicate::MoreThanOrEqual => "moreThanOrEqual",
            Predicate::LessThanOrEqual => "lessThanOrEqual",
            Predicate::Equal => "equal",
            Predicate::Not => "not",
            Predicate::Like => "like",
            Predicate::Between => "between",
        }
    }

    pub fn is_lower_bound(self) -> bool {
        matches!(self, Predicate::MoreThan | Predicate::MoreThanOrEqual)
    }

    pub fn is_upper_bound(self) -> bool {
        matches!(self, Predicate::LessThan | Predicate::LessThanOrEqual)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Predicate {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "moreThan" => Ok(Predicate::MoreThan),
            "lessThan" => Ok(Predicate::LessThan),
            "moreThanOrEqual" => Ok(Predicate::MoreThanOrEqual),
            "lessThanOrEqual" => Ok(Predicate::LessThanOrEqual),
            "equal" => Ok(Predicate::Equal),
            "not" => Ok(Predicate::Not),
            "like" => Ok(Predicate::Like),
            "between" => Ok(Predicate::Between),
            other => Err(FilterError::UnknownPredicate(other.to_string())),
        }
    }
}

/// Map a predicate to its SQL operator.
///
/// Predicates without a symbol render as their uppercased name (`like` ->
/// `LIKE`, `between` -> `BETWEEN`).
pub fn predicate_to_sql_operator(predicate: Predicate) -> String {
    match predicate {
        Predicate::MoreThan => ">".to_string(),
        Predicate::LessThan => "<".to_string(),
        Predicate::MoreThanOrEqual => ">=".to_string(),
        Predicate::LessThanOrEqual => "<=".to_string(),
        Predicate::Equal => "=".to_string(),
        Predicate::Not => "<>".to_string(),
        other => other.as_str().to_uppercase(),
    }
}

// ============================================================================
// Values
// ============================================================================

/// A filter value after coercion to its column's scalar kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    Integer(i64),
    Date(NaiveDate),
    Text(String),
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Integer(i) => write!(f, "{}", i),
            TypedValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            TypedValue::Text(s) => f.write_str(s),
        }
    }
}

/// Parse a date the way clients and the catalog data write them.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| NaiveDate::parse_from_str(raw, "%m/%d/%Y").ok())
}

/// Coerce a raw filter value to the scalar kind registered for `field`.
pub fn coerce_value(field: &str, raw: &str) -> Result<TypedValue, FilterError> {
    let kind = fields::filter_kind(field).ok_or_else(|| FilterError::UnknownField(field.to_string()))?;
    let unparseable = || FilterError::UnparseableValue {
        field: field.to_string(),
        value: raw.to_string(),
        kind,
    };

    match kind {
        ScalarKind::Integer => raw
            .trim()
            .parse::<i64>()
            .map(TypedValue::Integer)
            .map_err(|_| unparseable()),
        ScalarKind::Date => parse_date(raw.trim())
            .map(TypedValue::Date)
            .ok_or_else(unparseable),
        ScalarKind::String => Ok(TypedValue::Text(raw.to_string())),
    }
}

// ============================================================================
// Filters
// ============================================================================

/// One client filter, as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterTuple {
    pub field: String,
    pub predicate: Predicate,
    pub value: String,
}

impl FilterTuple {
    pub fn new(field: impl Into<String>, predicate: Predicate, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            predicate,
            value: value.into(),
        }
    }
}

/// Two bound filters on one field, merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeFilter {
    pub field: String,
    pub lower: TypedValue,
    pub upper: TypedValue,
}

/// Operand of a compiled condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Single(TypedValue),
    Range(TypedValue, TypedValue),
}

/// WHERE fragment with its named parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledFilter {
    pub sql_fragment: String,
    pub parameters: BTreeMap<String, TypedValue>,
}

impl CompiledFilter {
    pub fn is_empty(&self) -> bool {
        self.sql_fragment.is_empty()
    }
}

/// Merge a lower-bound and an upper-bound filter on the same field.
///
/// Either argument may hold the lower bound. Anything other than exactly one
/// lower and one upper bound, or a value that fails coercion, is unmergeable.
pub fn try_merge_range(a: &FilterTuple, b: &FilterTuple) -> Result<RangeFilter, FilterError> {
    if a.field != b.field {
        return Err(FilterError::UnmergeableRangePair(a.field.clone()));
    }

    let (lower, upper) = if a.predicate.is_lower_bound() && b.predicate.is_upper_bound() {
        (a, b)
    } else if b.predicate.is_lower_bound() && a.predicate.is_upper_bound() {
        (b, a)
    } else {
        return Err(FilterError::UnmergeableRangePair(a.field.clone()));
    };

    Ok(RangeFilter {
        field: a.field.clone(),
        lower: coerce_value(&lower.field, &lower.value)?,
        upper: coerce_value(&upper.field, &upper.value)?,
    })
}

/// Compile one condition against the `Book` alias, using the field name as placeholder.
pub fn compile_filter(field: &str, operator: &str, value: FilterValue) -> CompiledFilter {
    compile_filter_as(field, field, operator, value)
}

/// Compile one condition with an explicit placeholder name.
fn compile_filter_as(field: &str, param: &str, operator: &str, value: FilterValue) -> CompiledFilter {
    let column = format!("\"{}\".\"{}\"", BOOK_ALIAS, field);
    let mut parameters = BTreeMap::new();

    let sql_fragment = match value {
        FilterValue::Range(lower, upper) if operator == RANGE_OPERATOR => {
            let upper_param = format!("{}2", param);
            let sql = format!("{} {} :{} AND :{}", column, operator, param, upper_param);
            parameters.insert(param.to_string(), lower);
            parameters.insert(upper_param, upper);
            sql
        }
        // A range only renders as BETWEEN under the BETWEEN operator
        FilterValue::Range(value, _) | FilterValue::Single(value) => {
            parameters.insert(param.to_string(), value);
            format!("{} {} :{}", column, operator, param)
        }
    };

    CompiledFilter {
        sql_fragment,
        parameters,
    }
}

/// Resolve filter `index` to a predicate and operand, merging it with the
/// first later filter on the same field when the two form a range.
fn resolve_condition(
    filters: &[FilterTuple],
    index: usize,
    consumed: &mut HashSet<usize>,
) -> Result<(Predicate, FilterValue), FilterError> {
    let filter = &filters[index];

    let partner = (index + 1..filters.len()).find(|&j| filters[j].field == filter.field);
    if let Some(j) = partner {
        match try_merge_range(filter, &filters[j]) {
            Ok(range) => {
                consumed.insert(j);
                return Ok((Predicate::Between, FilterValue::Range(range.lower, range.upper)));
            }
            Err(e) => {
                tracing::debug!(
                    field = %filter.field,
                    reason = %e,
                    "Range merge skipped, filters compile independently"
                );
            }
        }
    }

    if filter.predicate == Predicate::Between {
        return Err(FilterError::StandaloneRange(filter.field.clone()));
    }

    let value = coerce_value(&filter.field, &filter.value)?;
    Ok((filter.predicate, FilterValue::Single(value)))
}

/// Pick a placeholder name whose single and range forms (`name`, `name2`)
/// are both unused by earlier conditions.
fn placeholder_for(field: &str, index: usize, parameters: &BTreeMap<String, TypedValue>) -> String {
    let taken = |name: &str| {
        parameters.contains_key(name) || parameters.contains_key(&format!("{}2", name))
    };
    if !taken(field) {
        return field.to_string();
    }

    let mut candidate = format!("{}_{}", field, index);
    while taken(&candidate) {
        candidate.push('_');
    }
    candidate
}

/// Translate client filters into one WHERE fragment joined with `AND`.
///
/// At most two filters per field are expected; a third filter on a field
/// that already merged into a range compiles on its own.
pub fn translate_filters(filters: &[FilterTuple]) -> CompiledFilter {
    let mut consumed = HashSet::new();
    let mut fragments = Vec::new();
    let mut parameters = BTreeMap::new();

    for (index, filter) in filters.iter().enumerate() {
        if consumed.contains(&index) {
            continue;
        }

        let (predicate, value) = match resolve_condition(filters, index, &mut consumed) {
            Ok(condition) => condition,
            Err(e) => {
                tracing::warn!(
                    field = %filter.field,
                    predicate = %filter.predicate,
                    value = %filter.value,
                    reason = %e,
                    "Invalid filter not included"
                );
                continue;
            }
        };

        let operator = predicate_to_sql_operator(predicate);
        let param = placeholder_for(&filter.field, index, &parameters);
        let compiled = compile_filter_as(&filter.field, &param, &operator, value);

        fragments.push(compiled.sql_fragment);
        parameters.extend(compiled.parameters);
    }

    CompiledFilter {
        sql_fragment: fragments.join(" AND "),
        parameters,
    }
}
