//! Course repository.

use super::RepoResult;
use crate::model::course::{Course, NewCourse};
use crate::model::EntityId;
use rusqlite::{params, Connection, OptionalExtension, Row};

const COURSE_COLUMNS: &str =
    "course_id, course_name, course_description, credits, department_id";

pub trait CourseRepository {
    fn create_course(&self, course: &NewCourse) -> RepoResult<Course>;
    fn get_course(&self, id: EntityId) -> RepoResult<Option<Course>>;
    /// Lists courses of one department ordered by id. Unknown departments
    /// yield an empty list.
    fn list_courses_by_department(&self, department_id: EntityId) -> RepoResult<Vec<Course>>;
}

pub struct SqliteCourseRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCourseRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CourseRepository for SqliteCourseRepository<'_> {
    fn create_course(&self, course: &NewCourse) -> RepoResult<Course> {
        course.validate()?;

        let created = self.conn.query_row(
            &format!(
                "INSERT INTO courses (course_name, course_description, credits, department_id)
                 VALUES (?1, ?2, ?3, ?4)
                 RETURNING {COURSE_COLUMNS};"
            ),
            params![
                course.course_name.trim(),
                course.course_description.as_str(),
                course.credits,
                course.department_id,
            ],
            parse_course_row,
        )?;

        Ok(created)
    }

    fn get_course(&self, id: EntityId) -> RepoResult<Option<Course>> {
        let course = self
            .conn
            .query_row(
                &format!("SELECT {COURSE_COLUMNS} FROM courses WHERE course_id = ?1;"),
                [id],
                parse_course_row,
            )
            .optional()?;
        Ok(course)
    }

    fn list_courses_by_department(&self, department_id: EntityId) -> RepoResult<Vec<Course>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COURSE_COLUMNS}
             FROM courses
             WHERE department_id = ?1
             ORDER BY course_id ASC;"
        ))?;
        let courses = stmt
            .query_map([department_id], parse_course_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(courses)
    }
}

fn parse_course_row(row: &Row<'_>) -> rusqlite::Result<Course> {
    Ok(Course {
        id: row.get("course_id")?,
        course_name: row.get("course_name")?,
        course_description: row.get("course_description")?,
        credits: row.get("credits")?,
        department_id: row.get("department_id")?,
    })
}
