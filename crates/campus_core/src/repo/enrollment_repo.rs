//! Enrollment repository.
//!
//! # Invariants
//! - Inserts rely on the caller having verified both references in the
//!   same transaction; SQLite foreign keys are the last line of defence.
//! - Duplicate (student, course) pairs are allowed.

use super::RepoResult;
use crate::model::enrollment::{Enrollment, NewEnrollment};
use crate::model::EntityId;
use rusqlite::{params, Connection, OptionalExtension, Row};

const ENROLLMENT_COLUMNS: &str = "enrollment_id, student_id, course_id, grade";

pub trait EnrollmentRepository {
    fn create_enrollment(&self, enrollment: &NewEnrollment) -> RepoResult<Enrollment>;
    fn get_enrollment(&self, id: EntityId) -> RepoResult<Option<Enrollment>>;
    fn list_enrollments_by_student(&self, student_id: EntityId) -> RepoResult<Vec<Enrollment>>;
}

pub struct SqliteEnrollmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEnrollmentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EnrollmentRepository for SqliteEnrollmentRepository<'_> {
    fn create_enrollment(&self, enrollment: &NewEnrollment) -> RepoResult<Enrollment> {
        enrollment.validate()?;

        let created = self.conn.query_row(
            &format!(
                "INSERT INTO enrollments (student_id, course_id, grade)
                 VALUES (?1, ?2, ?3)
                 RETURNING {ENROLLMENT_COLUMNS};"
            ),
            params![enrollment.student_id, enrollment.course_id, enrollment.grade],
            parse_enrollment_row,
        )?;

        Ok(created)
    }

    fn get_enrollment(&self, id: EntityId) -> RepoResult<Option<Enrollment>> {
        let enrollment = self
            .conn
            .query_row(
                &format!("SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE enrollment_id = ?1;"),
                [id],
                parse_enrollment_row,
            )
            .optional()?;
        Ok(enrollment)
    }

    fn list_enrollments_by_student(&self, student_id: EntityId) -> RepoResult<Vec<Enrollment>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ENROLLMENT_COLUMNS}
             FROM enrollments
             WHERE student_id = ?1
             ORDER BY enrollment_id ASC;"
        ))?;
        let enrollments = stmt
            .query_map([student_id], parse_enrollment_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(enrollments)
    }
}

fn parse_enrollment_row(row: &Row<'_>) -> rusqlite::Result<Enrollment> {
    Ok(Enrollment {
        id: row.get("enrollment_id")?,
        student_id: row.get("student_id")?,
        course_id: row.get("course_id")?,
        grade: row.get("grade")?,
    })
}
