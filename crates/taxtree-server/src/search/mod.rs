//! Typed search over flat record tables
//!
//! A request arrives as a sparse [`SearchSpec`]: field name to optional
//! value. [`compile`] resolves each present field against the record kind's
//! declared types and produces a conjunction of [`Predicate`]s together with
//! validated pagination bounds. SQL rendering happens in [`crate::db::search`].

pub mod compiler;
pub mod field;
pub mod page;
pub mod schema;
pub mod spec;

use thiserror::Error;

pub use compiler::{compile, CompiledSearch, Predicate, PredicateOp, SqlValue};
pub use field::FieldKind;
pub use page::{PageRequest, PaginationLimits};
pub use schema::{FieldDef, RecordKind, RecordSchema, ResolvedField};
pub use spec::{Scalar, SearchSpec, SearchValue};

/// Client-side problems with a search request. All map to `400`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SearchError {
    #[error("Invalid value for '{field}': expected {expected}, got '{value}'")]
    InvalidValue {
        field: String,
        expected: FieldKind,
        value: String,
    },

    #[error("Field '{field}' is not a date or datetime and does not accept a range")]
    RangeNotSupported { field: String },

    #[error("Range for '{field}' must be a pair of non-null bounds")]
    MalformedRange { field: String },

    #[error("Range for '{field}' is inverted: {lower} is after {upper}")]
    InvertedRange {
        field: String,
        lower: String,
        upper: String,
    },

    #[error("Unsupported value for '{field}': {reason}")]
    UnsupportedValue { field: String, reason: String },

    #[error("Invalid '{name}' parameter: {value}")]
    InvalidParameter { name: String, value: String },

    #[error("Search body must be a JSON object")]
    NotAnObject,
}
