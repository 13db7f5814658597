//! Department repository.
//!
//! Does not check that `department_head` exists; callers run the
//! referential guard inside the same transaction first.

use super::RepoResult;
use crate::model::department::{Department, NewDepartment};
use crate::model::EntityId;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub trait DepartmentRepository {
    fn create_department(&self, department: &NewDepartment) -> RepoResult<Department>;
    fn get_department(&self, id: EntityId) -> RepoResult<Option<Department>>;
}

pub struct SqliteDepartmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDepartmentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl DepartmentRepository for SqliteDepartmentRepository<'_> {
    fn create_department(&self, department: &NewDepartment) -> RepoResult<Department> {
        department.validate()?;

        let created = self.conn.query_row(
            "INSERT INTO departments (department_name, department_head)
             VALUES (?1, ?2)
             RETURNING department_id, department_name, department_head;",
            params![
                department.department_name.trim(),
                department.department_head
            ],
            parse_department_row,
        )?;

        Ok(created)
    }

    fn get_department(&self, id: EntityId) -> RepoResult<Option<Department>> {
        let department = self
            .conn
            .query_row(
                "SELECT department_id, department_name, department_head
                 FROM departments
                 WHERE department_id = ?1;",
                [id],
                parse_department_row,
            )
            .optional()?;
        Ok(department)
    }
}

fn parse_department_row(row: &Row<'_>) -> rusqlite::Result<Department> {
    Ok(Department {
        id: row.get("department_id")?,
        department_name: row.get("department_name")?,
        department_head: row.get("department_head")?,
    })
}
