//! Student Query Engine.
//!
//! # Responsibility
//! - Pure, read-only operations over a student collection snapshot:
//!   name search, grade sort, course filter and offset/limit pagination.
//!
//! # Invariants
//! - Operations never mutate the snapshot and never return partial results.
//! - Caller mistakes are reported as `MissingParameter` / `InvalidParameter`.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod pagination;
pub mod student_query;

pub type QueryResult<T> = Result<T, QueryError>;

/// Caller-side query argument errors. No side effects are ever involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A required query parameter was absent or empty.
    MissingParameter(&'static str),
    /// A query parameter was outside its accepted domain.
    InvalidParameter { name: &'static str, value: String },
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingParameter(name) => write!(f, "`{name}` query parameter is required"),
            Self::InvalidParameter { name, value } => {
                write!(f, "invalid `{name}` query parameter: `{value}`")
            }
        }
    }
}

impl Error for QueryError {}
