//! Student collection store contract and implementations.
//!
//! # Responsibility
//! - Give the in-memory, JSON-file and relational student variants one
//!   contract: get all / get by id / append / replace / remove / persist.
//! - Own id assignment for the non-relational variants (`IdPolicy`).
//!
//! # Invariants
//! - Writes validate the student before mutating anything.
//! - Reads return snapshots; callers never hold references into the store.
//! - The JSON file variant has no locking: concurrent writers on one file
//!   can lose updates.

use crate::model::student::{NewStudent, Student};
use crate::model::{EntityId, ValidationError};
use crate::repo::RepoError;
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod file;
mod memory;
mod relational;

pub use file::JsonFileStudentStore;
pub use memory::MemoryStudentStore;

pub type CollectionResult<T> = Result<T, CollectionError>;

#[derive(Debug)]
pub enum CollectionError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    NotFound(EntityId),
    Validation(ValidationError),
    Repo(RepoError),
}

impl Display for CollectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "student file `{}` i/o failed: {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "student file `{}` is not valid json: {source}", path.display())
            }
            Self::NotFound(id) => write!(f, "student not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CollectionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::NotFound(_) => None,
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<ValidationError> for CollectionError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for CollectionError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { id, .. } => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// Storage contract shared by every student collection variant.
pub trait StudentStore {
    /// Full snapshot in collection order.
    fn get_all(&self) -> CollectionResult<Vec<Student>>;
    fn get_by_id(&self, id: EntityId) -> CollectionResult<Option<Student>>;
    /// Assigns an id, stores the student and returns it as stored.
    fn append(&mut self, student: NewStudent) -> CollectionResult<Student>;
    /// Replaces the stored record with the same id.
    fn replace_by_id(&mut self, student: Student) -> CollectionResult<Student>;
    /// Removes one record, compacting the collection.
    fn remove_by_id(&mut self, id: EntityId) -> CollectionResult<Student>;
    /// Flushes the collection to durable storage, if any.
    fn persist(&mut self) -> CollectionResult<()>;
}

/// Id assignment strategy for collection stores without a database key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdPolicy {
    /// `len + 1`. Reuses ids after a delete; collisions are logged.
    CollectionLength,
    /// One more than the largest id ever observed; never reuses ids.
    #[default]
    HighWaterMark,
}

#[derive(Debug, Clone)]
pub(crate) struct IdAllocator {
    policy: IdPolicy,
    high_water: EntityId,
}

impl IdAllocator {
    pub(crate) fn new(policy: IdPolicy) -> Self {
        Self {
            policy,
            high_water: 0,
        }
    }

    pub(crate) fn observe(&mut self, students: &[Student]) {
        if let Some(max) = students.iter().map(|student| student.id).max() {
            self.high_water = self.high_water.max(max);
        }
    }

    pub(crate) fn next_id(&mut self, students: &[Student]) -> EntityId {
        match self.policy {
            IdPolicy::CollectionLength => {
                let id = EntityId::try_from(students.len()).unwrap_or(EntityId::MAX) + 1;
                if students.iter().any(|student| student.id == id) {
                    warn!(
                        "event=student_id_collision module=collection status=warn policy=collection_length id={id}"
                    );
                }
                self.high_water = self.high_water.max(id);
                id
            }
            IdPolicy::HighWaterMark => {
                self.observe(students);
                self.high_water += 1;
                self.high_water
            }
        }
    }
}

pub(crate) fn position_of(students: &[Student], id: EntityId) -> CollectionResult<usize> {
    students
        .iter()
        .position(|student| student.id == id)
        .ok_or(CollectionError::NotFound(id))
}

#[cfg(test)]
mod tests {
    use super::{IdAllocator, IdPolicy};
    use crate::model::student::{NewStudent, Student};
    use chrono::NaiveDate;

    fn student(id: i64) -> Student {
        NewStudent {
            name: format!("student {id}"),
            age: 20,
            grade: 5.0,
            email: format!("s{id}@uni.edu"),
            address: "addr".to_string(),
            phone: "555".to_string(),
            enrollment_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            courses: Vec::new(),
        }
        .into_student(id)
    }

    #[test]
    fn collection_length_policy_reuses_ids_after_delete() {
        let mut ids = IdAllocator::new(IdPolicy::CollectionLength);
        // ids 1 and 3 remain after deleting 2
        let remaining = vec![student(1), student(3)];
        assert_eq!(ids.next_id(&remaining), 3);
    }

    #[test]
    fn high_water_policy_never_reuses_ids() {
        let mut ids = IdAllocator::new(IdPolicy::HighWaterMark);
        let all = vec![student(1), student(2), student(3)];
        ids.observe(&all);
        let after_delete = vec![student(1), student(2)];
        assert_eq!(ids.next_id(&after_delete), 4);
        assert_eq!(ids.next_id(&after_delete), 5);
    }
}
