//! Transactional write coordinator.
//!
//! # Responsibility
//! - Run an ordered sequence of dependent write steps as one atomic unit
//!   against a single pooled connection.
//!
//! # Protocol
//! 1. Acquire a connection and open an IMMEDIATE transaction.
//! 2. Verify every declared reference of every step inside that
//!    transaction; the first missing one aborts the unit before any write.
//! 3. Run steps in declaration order; the first failing step rolls the
//!    whole unit back.
//! 4. Commit and return the written entities in step order.
//! 5. The connection returns to the pool on every exit path.

use super::guard::{GuardError, Reference, ReferentialGuard};
use super::{ServiceError, ServiceResult};
use crate::db::Store;
use crate::model::course::Course;
use crate::model::department::Department;
use crate::model::enrollment::Enrollment;
use crate::model::instructor::Instructor;
use crate::model::student::Student;
use crate::model::user::User;
use crate::model::{EntityId, EntityKind};
use crate::repo::{RepoError, RepoResult};
use log::{info, warn};
use rusqlite::{Connection, Transaction};
use std::time::Instant;

/// Entity produced by one write step.
#[derive(Debug, Clone, PartialEq)]
pub enum Written {
    User(User),
    Credential { user_id: EntityId },
    Student(Student),
    Instructor(Instructor),
    Department(Department),
    Course(Course),
    Enrollment(Enrollment),
    /// A step that removed a row.
    Deleted(Reference),
}

impl Written {
    /// Kind of the entity written; `None` for credential rows.
    pub fn kind(&self) -> Option<EntityKind> {
        match self {
            Self::User(_) => Some(EntityKind::User),
            Self::Credential { .. } => None,
            Self::Student(_) => Some(EntityKind::Student),
            Self::Instructor(_) => Some(EntityKind::Instructor),
            Self::Department(_) => Some(EntityKind::Department),
            Self::Course(_) => Some(EntityKind::Course),
            Self::Enrollment(_) => Some(EntityKind::Enrollment),
            Self::Deleted(reference) => Some(reference.kind),
        }
    }

    pub fn as_user(&self) -> Option<&User> {
        match self {
            Self::User(user) => Some(user),
            _ => None,
        }
    }
}

type StepAction<'a> = Box<dyn FnOnce(&Connection, &[Written]) -> RepoResult<Written> + 'a>;

/// One write of a unit: its references and the action performing it.
pub struct WriteStep<'a> {
    label: &'static str,
    references: Vec<Reference>,
    action: StepAction<'a>,
}

impl<'a> WriteStep<'a> {
    /// `action` receives the open transaction and the entities written by
    /// earlier steps.
    pub fn new(
        label: &'static str,
        action: impl FnOnce(&Connection, &[Written]) -> RepoResult<Written> + 'a,
    ) -> Self {
        Self {
            label,
            references: Vec::new(),
            action: Box::new(action),
        }
    }

    /// Declares a reference that must resolve before any step runs.
    pub fn requires(mut self, reference: Reference) -> Self {
        self.references.push(reference);
        self
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}

/// Ordered set of steps committed or rolled back together.
pub struct WriteUnit<'a> {
    name: &'static str,
    steps: Vec<WriteStep<'a>>,
}

impl<'a> WriteUnit<'a> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: WriteStep<'a>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

pub struct WriteCoordinator<'s> {
    store: &'s Store,
}

impl<'s> WriteCoordinator<'s> {
    pub fn new(store: &'s Store) -> Self {
        Self { store }
    }

    /// Executes the unit atomically.
    ///
    /// # Errors
    /// - `StoreUnavailable` when no connection/transaction can be opened.
    /// - `ReferenceNotFound` when a declared reference does not resolve.
    /// - `WriteFailed` when a step or the commit is rejected by the store.
    /// - `NotFound` / `Validation` when a step reports them; the unit is
    ///   rolled back first. These describe the caller's input rather than a
    ///   store rejection, so they carry no step label and match the errors
    ///   point lookups return. The failing step is still logged.
    pub fn execute(&self, unit: WriteUnit<'_>) -> ServiceResult<Vec<Written>> {
        let started_at = Instant::now();
        let unit_name = unit.name;

        let mut conn = self
            .store
            .acquire()
            .map_err(ServiceError::StoreUnavailable)?;
        let tx = conn.begin().map_err(ServiceError::StoreUnavailable)?;

        let guard = ReferentialGuard::new(&*tx);
        for step in &unit.steps {
            match guard.verify(&step.references) {
                Ok(()) => {}
                Err(GuardError::Missing(reference)) => {
                    warn!(
                        "event=write_unit module=service status=rejected unit={unit_name} step={} missing_kind={} missing_id={}",
                        step.label, reference.kind, reference.id
                    );
                    rollback(tx, unit_name);
                    return Err(ServiceError::ReferenceNotFound(reference));
                }
                Err(GuardError::Lookup(cause)) => {
                    rollback(tx, unit_name);
                    return Err(ServiceError::WriteFailed {
                        step: "reference_check",
                        cause,
                    });
                }
            }
        }

        let mut written = Vec::with_capacity(unit.steps.len());
        for step in unit.steps {
            let label = step.label;
            match (step.action)(&*tx, &written) {
                Ok(entity) => written.push(entity),
                Err(cause) => {
                    warn!(
                        "event=write_unit module=service status=rolled_back unit={unit_name} step={label} error={cause}"
                    );
                    rollback(tx, unit_name);
                    return Err(step_failure(label, cause));
                }
            }
        }

        tx.commit().map_err(|err| ServiceError::WriteFailed {
            step: "commit",
            cause: RepoError::from(err),
        })?;

        info!(
            "event=write_unit module=service status=ok unit={unit_name} steps={} duration_ms={}",
            written.len(),
            started_at.elapsed().as_millis()
        );
        Ok(written)
    }
}

fn rollback(tx: Transaction<'_>, unit_name: &str) {
    if let Err(err) = tx.rollback() {
        warn!(
            "event=write_unit module=service status=error unit={unit_name} error_code=rollback_failed error={err}"
        );
    }
}

fn step_failure(step: &'static str, cause: RepoError) -> ServiceError {
    match cause {
        RepoError::Validation(err) => ServiceError::Validation(err),
        RepoError::NotFound { kind, id } => ServiceError::not_found(kind, id),
        other => ServiceError::WriteFailed { step, cause: other },
    }
}

/// Pulls the entity written by step `index` out of a unit's results.
pub(crate) fn take_written(written: Vec<Written>, index: usize) -> ServiceResult<Written> {
    written.into_iter().nth(index).ok_or_else(|| {
        ServiceError::Repo(RepoError::InvalidData(format!(
            "write unit returned no entity for step {index}"
        )))
    })
}
