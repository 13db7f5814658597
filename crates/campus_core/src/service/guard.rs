//! Referential guard: application-level foreign-key existence checks.
//!
//! # Responsibility
//! - Resolve each proposed reference through its owning repository.
//!
//! # Invariants
//! - Performs reads only; calling it repeatedly without intervening writes
//!   yields the same outcome.
//! - Uses the connection it is given (normally the write transaction), so
//!   the check and the dependent write share one isolation scope.

use crate::model::{EntityId, EntityKind};
use crate::repo::course_repo::{CourseRepository, SqliteCourseRepository};
use crate::repo::department_repo::{DepartmentRepository, SqliteDepartmentRepository};
use crate::repo::enrollment_repo::{EnrollmentRepository, SqliteEnrollmentRepository};
use crate::repo::instructor_repo::{InstructorRepository, SqliteInstructorRepository};
use crate::repo::student_repo::{SqliteStudentRepository, StudentRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::repo::{RepoError, RepoResult};
use rusqlite::Connection;
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// A foreign-key value a write depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Reference {
    pub kind: EntityKind,
    pub id: EntityId,
}

impl Reference {
    pub fn new(kind: EntityKind, id: EntityId) -> Self {
        Self { kind, id }
    }

    pub fn student(id: EntityId) -> Self {
        Self::new(EntityKind::Student, id)
    }

    pub fn course(id: EntityId) -> Self {
        Self::new(EntityKind::Course, id)
    }

    pub fn instructor(id: EntityId) -> Self {
        Self::new(EntityKind::Instructor, id)
    }

    pub fn department(id: EntityId) -> Self {
        Self::new(EntityKind::Department, id)
    }

    pub fn user(id: EntityId) -> Self {
        Self::new(EntityKind::User, id)
    }
}

impl Display for Reference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// Guard outcome when a reference cannot be confirmed.
#[derive(Debug)]
pub enum GuardError {
    /// First reference that does not resolve.
    Missing(Reference),
    /// The lookup itself failed.
    Lookup(RepoError),
}

impl From<RepoError> for GuardError {
    fn from(value: RepoError) -> Self {
        Self::Lookup(value)
    }
}

pub struct ReferentialGuard<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ReferentialGuard<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Returns whether the referenced row exists.
    pub fn exists(&self, reference: Reference) -> RepoResult<bool> {
        let id = reference.id;
        let found = match reference.kind {
            EntityKind::User => SqliteUserRepository::new(self.conn).get_user(id)?.is_some(),
            EntityKind::Student => SqliteStudentRepository::new(self.conn)
                .get_student(id)?
                .is_some(),
            EntityKind::Instructor => SqliteInstructorRepository::new(self.conn)
                .get_instructor(id)?
                .is_some(),
            EntityKind::Department => SqliteDepartmentRepository::new(self.conn)
                .get_department(id)?
                .is_some(),
            EntityKind::Course => SqliteCourseRepository::new(self.conn)
                .get_course(id)?
                .is_some(),
            EntityKind::Enrollment => SqliteEnrollmentRepository::new(self.conn)
                .get_enrollment(id)?
                .is_some(),
        };
        Ok(found)
    }

    /// Checks references in order and stops at the first missing one.
    pub fn verify(&self, references: &[Reference]) -> Result<(), GuardError> {
        for reference in references {
            if !self.exists(*reference)? {
                return Err(GuardError::Missing(*reference));
            }
        }
        Ok(())
    }
}
