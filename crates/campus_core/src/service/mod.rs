//! Core use-case services.
//!
//! # Responsibility
//! - Check cross-entity references (`guard`) and run dependent writes as
//!   atomic units (`coordinator`).
//! - Expose records and student-collection use-cases to callers.
//!
//! # Invariants
//! - Every reference check of a dependent write runs inside the same
//!   transaction as the write itself.
//! - Errors are scoped to the operation that raised them; nothing is retried.

use crate::credential::CredentialError;
use crate::db::DbError;
use crate::model::{EntityKind, ValidationError};
use crate::query::QueryError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod coordinator;
pub mod guard;
pub mod records_service;
pub mod student_service;

use guard::Reference;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error taxonomy surfaced to callers of the records services.
#[derive(Debug)]
pub enum ServiceError {
    /// Point lookup found nothing.
    NotFound { kind: EntityKind, key: String },
    /// A dependent write named a row that does not exist; nothing was written.
    ReferenceNotFound(Reference),
    /// Input failed write-time validation; nothing was written.
    Validation(ValidationError),
    /// Caller supplied an absent or out-of-domain query argument.
    Query(QueryError),
    /// The store rejected a write step; the unit was rolled back.
    WriteFailed {
        step: &'static str,
        cause: RepoError,
    },
    /// Connection or transaction infrastructure failed.
    StoreUnavailable(DbError),
    Credential(CredentialError),
    /// Read-path failure not covered above.
    Repo(RepoError),
}

impl ServiceError {
    pub(crate) fn not_found(kind: EntityKind, key: impl ToString) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { kind, key } => write!(f, "{kind} not found: {key}"),
            Self::ReferenceNotFound(reference) => {
                write!(f, "referenced {reference} does not exist")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::Query(err) => write!(f, "{err}"),
            Self::WriteFailed { step, cause } => write!(f, "write step `{step}` failed: {cause}"),
            Self::StoreUnavailable(err) => write!(f, "{err}"),
            Self::Credential(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound { .. } => None,
            Self::ReferenceNotFound(_) => None,
            Self::Validation(err) => Some(err),
            Self::Query(err) => Some(err),
            Self::WriteFailed { cause, .. } => Some(cause),
            Self::StoreUnavailable(err) => Some(err),
            Self::Credential(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind, id } => Self::not_found(kind, id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<QueryError> for ServiceError {
    fn from(value: QueryError) -> Self {
        Self::Query(value)
    }
}

impl From<CredentialError> for ServiceError {
    fn from(value: CredentialError) -> Self {
        Self::Credential(value)
    }
}
