//! Instructor repository.

use super::RepoResult;
use crate::model::instructor::{Instructor, NewInstructor};
use crate::model::EntityId;
use rusqlite::{params, Connection, OptionalExtension, Row};

const INSTRUCTOR_COLUMNS: &str =
    "instructor_id, first_name, last_name, email, phone_number, hire_date";

pub trait InstructorRepository {
    fn create_instructor(&self, instructor: &NewInstructor) -> RepoResult<Instructor>;
    fn get_instructor(&self, id: EntityId) -> RepoResult<Option<Instructor>>;
    fn list_instructors(&self) -> RepoResult<Vec<Instructor>>;
}

pub struct SqliteInstructorRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteInstructorRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl InstructorRepository for SqliteInstructorRepository<'_> {
    fn create_instructor(&self, instructor: &NewInstructor) -> RepoResult<Instructor> {
        instructor.validate()?;

        let created = self.conn.query_row(
            &format!(
                "INSERT INTO instructors (first_name, last_name, email, phone_number, hire_date)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 RETURNING {INSTRUCTOR_COLUMNS};"
            ),
            params![
                instructor.first_name.as_str(),
                instructor.last_name.as_str(),
                instructor.email.as_str(),
                instructor.phone_number.as_str(),
                instructor.hire_date,
            ],
            parse_instructor_row,
        )?;

        Ok(created)
    }

    fn get_instructor(&self, id: EntityId) -> RepoResult<Option<Instructor>> {
        let instructor = self
            .conn
            .query_row(
                &format!("SELECT {INSTRUCTOR_COLUMNS} FROM instructors WHERE instructor_id = ?1;"),
                [id],
                parse_instructor_row,
            )
            .optional()?;
        Ok(instructor)
    }

    fn list_instructors(&self) -> RepoResult<Vec<Instructor>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {INSTRUCTOR_COLUMNS} FROM instructors ORDER BY instructor_id ASC;"
        ))?;
        let instructors = stmt
            .query_map([], parse_instructor_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(instructors)
    }
}

fn parse_instructor_row(row: &Row<'_>) -> rusqlite::Result<Instructor> {
    Ok(Instructor {
        id: row.get("instructor_id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        email: row.get("email")?,
        phone_number: row.get("phone_number")?,
        hire_date: row.get("hire_date")?,
    })
}
