//! Student repository for the relational variant.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `students` table.
//! - Serialize the free-form `courses` set as a JSON text array.
//!
//! # Invariants
//! - Write paths call `validate()` before SQL mutations.
//! - Ids come from `AUTOINCREMENT` and are never reused.

use super::{RepoError, RepoResult};
use crate::model::student::{normalize_courses, NewStudent, Student};
use crate::model::{EntityId, EntityKind};
use rusqlite::{params, Connection, OptionalExtension, Row};

const STUDENT_COLUMNS: &str =
    "student_id, name, age, grade, email, address, phone, enrollment_date, courses";

/// Repository interface for student rows.
pub trait StudentRepository {
    fn create_student(&self, student: &NewStudent) -> RepoResult<Student>;
    fn get_student(&self, id: EntityId) -> RepoResult<Option<Student>>;
    /// Lists all students ordered by id.
    fn list_students(&self) -> RepoResult<Vec<Student>>;
    /// Replaces every mutable column of an existing student.
    fn update_student(&self, student: &Student) -> RepoResult<()>;
    fn delete_student(&self, id: EntityId) -> RepoResult<Student>;
}

/// SQLite-backed student repository.
pub struct SqliteStudentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStudentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl StudentRepository for SqliteStudentRepository<'_> {
    fn create_student(&self, student: &NewStudent) -> RepoResult<Student> {
        student.validate()?;
        let courses = encode_courses(&normalize_courses(&student.courses))?;

        let created = self.conn.query_row(
            &format!(
                "INSERT INTO students (
                    name, age, grade, email, address, phone, enrollment_date, courses
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 RETURNING {STUDENT_COLUMNS};"
            ),
            params![
                student.name.as_str(),
                student.age,
                student.grade,
                student.email.as_str(),
                student.address.as_str(),
                student.phone.as_str(),
                student.enrollment_date,
                courses,
            ],
            |row| Ok(parse_student_row(row)),
        )??;

        Ok(created)
    }

    fn get_student(&self, id: EntityId) -> RepoResult<Option<Student>> {
        let student = self
            .conn
            .query_row(
                &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE student_id = ?1;"),
                [id],
                |row| Ok(parse_student_row(row)),
            )
            .optional()?;
        student.transpose()
    }

    fn list_students(&self) -> RepoResult<Vec<Student>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students ORDER BY student_id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut students = Vec::new();
        while let Some(row) = rows.next()? {
            students.push(parse_student_row(row)?);
        }
        Ok(students)
    }

    fn update_student(&self, student: &Student) -> RepoResult<()> {
        student.validate()?;
        let courses = encode_courses(&normalize_courses(&student.courses))?;

        let changed = self.conn.execute(
            "UPDATE students
             SET
                name = ?1,
                age = ?2,
                grade = ?3,
                email = ?4,
                address = ?5,
                phone = ?6,
                enrollment_date = ?7,
                courses = ?8
             WHERE student_id = ?9;",
            params![
                student.name.as_str(),
                student.age,
                student.grade,
                student.email.as_str(),
                student.address.as_str(),
                student.phone.as_str(),
                student.enrollment_date,
                courses,
                student.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::Student,
                id: student.id,
            });
        }

        Ok(())
    }

    fn delete_student(&self, id: EntityId) -> RepoResult<Student> {
        let deleted = self
            .conn
            .query_row(
                &format!("DELETE FROM students WHERE student_id = ?1 RETURNING {STUDENT_COLUMNS};"),
                [id],
                |row| Ok(parse_student_row(row)),
            )
            .optional()?;

        match deleted {
            Some(student) => student,
            None => Err(RepoError::NotFound {
                kind: EntityKind::Student,
                id,
            }),
        }
    }
}

fn encode_courses(courses: &[String]) -> RepoResult<String> {
    serde_json::to_string(courses)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode courses: {err}")))
}

fn parse_student_row(row: &Row<'_>) -> RepoResult<Student> {
    let courses_text: String = row.get("courses")?;
    let courses: Vec<String> = serde_json::from_str(&courses_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid courses value `{courses_text}` in students.courses"
        ))
    })?;

    Ok(Student {
        id: row.get("student_id")?,
        name: row.get("name")?,
        age: row.get("age")?,
        grade: row.get("grade")?,
        email: row.get("email")?,
        address: row.get("address")?,
        phone: row.get("phone")?,
        enrollment_date: row.get("enrollment_date")?,
        courses,
    })
}
