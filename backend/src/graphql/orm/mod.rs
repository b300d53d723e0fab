//! Book listing query layer
//!
//! Translates the structured filter and sort input of the `books` query into
//! SQL for the persistence layer:
//! - `fields`: the column allow-list and the scalar kind of each column
//! - `filter`: filter tuples to a WHERE fragment with named placeholders,
//!   merging lower/upper bound pairs into BETWEEN
//! - `sort`: sort tuples to an ordered ORDER BY mapping
//! - `builder`: assembles the final parameterized SELECT and COUNT queries

mod builder;
pub mod fields;
mod filter;
mod sort;

pub use builder::*;
pub use fields::{BOOK_ALIAS, ScalarKind};
pub use filter::*;
pub use sort::*;
