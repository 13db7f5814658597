//! Records use-cases for the relational variant.
//!
//! # Responsibility
//! - Register users (user row + hashed credential) atomically.
//! - Create departments, courses and enrollments behind reference checks.
//! - Serve point lookups and parent-scoped listings.
//!
//! # Invariants
//! - Every create runs as a `WriteUnit`, so even single inserts are atomic.
//! - Validation runs before a connection is acquired.
//! - Plaintext passwords are hashed before entering a write unit and are
//!   never logged.

use super::coordinator::{take_written, WriteCoordinator, WriteStep, WriteUnit, Written};
use super::guard::Reference;
use super::{ServiceError, ServiceResult};
use crate::credential::{hash_password, verify_password};
use crate::db::Store;
use crate::model::course::{Course, NewCourse};
use crate::model::department::{Department, NewDepartment};
use crate::model::enrollment::{Enrollment, NewEnrollment};
use crate::model::instructor::{Instructor, NewInstructor};
use crate::model::student::{NewStudent, Student};
use crate::model::user::{NewUser, User};
use crate::model::{EntityId, EntityKind};
use crate::query::QueryError;
use crate::repo::course_repo::{CourseRepository, SqliteCourseRepository};
use crate::repo::department_repo::{DepartmentRepository, SqliteDepartmentRepository};
use crate::repo::enrollment_repo::{EnrollmentRepository, SqliteEnrollmentRepository};
use crate::repo::instructor_repo::{InstructorRepository, SqliteInstructorRepository};
use crate::repo::student_repo::{SqliteStudentRepository, StudentRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::repo::{RepoError, RepoResult};
use log::info;
use rusqlite::Connection;

/// Records service over a pooled store.
#[derive(Clone)]
pub struct RecordsService {
    store: Store,
}

impl RecordsService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Runs a read on a scoped connection.
    fn read<T>(&self, f: impl FnOnce(&Connection) -> RepoResult<T>) -> ServiceResult<T> {
        let conn = self
            .store
            .acquire()
            .map_err(ServiceError::StoreUnavailable)?;
        Ok(f(&conn)?)
    }

    fn write_one(&self, unit: WriteUnit<'_>) -> ServiceResult<Written> {
        let written = WriteCoordinator::new(&self.store).execute(unit)?;
        take_written(written, 0)
    }

    // ---- users ----

    /// Creates the user row and its credential row in one unit.
    pub fn register_user(&self, user: &NewUser) -> ServiceResult<User> {
        user.validate()?;
        let password_hash = hash_password(&user.password)?;

        let unit = WriteUnit::new("register_user")
            .step(WriteStep::new("insert_user", |conn, _| {
                SqliteUserRepository::new(conn)
                    .create_user(user)
                    .map(Written::User)
            }))
            .step(WriteStep::new("insert_credential", |conn, written| {
                let user_id = written
                    .iter()
                    .find_map(Written::as_user)
                    .map(|user| user.id)
                    .ok_or_else(|| {
                        RepoError::InvalidData("credential step ran without a user".to_string())
                    })?;
                SqliteUserRepository::new(conn).store_credential(user_id, &password_hash)?;
                Ok(Written::Credential { user_id })
            }));

        match self.write_one(unit)? {
            Written::User(created) => {
                info!(
                    "event=user_register module=service status=ok user_id={}",
                    created.id
                );
                Ok(created)
            }
            other => Err(unexpected(EntityKind::User, &other)),
        }
    }

    /// Checks a password for the user with `email`.
    ///
    /// Returns `NotFound` for unknown emails and `Ok(false)` on mismatch.
    pub fn verify_user_password(&self, email: &str, password: &str) -> ServiceResult<bool> {
        let (user, hash) = self.read(|conn| {
            let repo = SqliteUserRepository::new(conn);
            let Some(user) = repo.get_user_by_email(email)? else {
                return Ok((None, None));
            };
            let hash = repo.credential_hash(user.id)?;
            Ok((Some(user), hash))
        })?;

        let user = user.ok_or_else(|| ServiceError::not_found(EntityKind::User, email))?;
        let hash = hash.ok_or_else(|| {
            ServiceError::Repo(RepoError::InvalidData(format!(
                "user {} has no credential row",
                user.id
            )))
        })?;
        Ok(verify_password(password, &hash)?)
    }

    pub fn get_user(&self, id: EntityId) -> ServiceResult<User> {
        self.read(|conn| SqliteUserRepository::new(conn).get_user(id))?
            .ok_or_else(|| ServiceError::not_found(EntityKind::User, id))
    }

    pub fn get_user_by_email(&self, email: &str) -> ServiceResult<User> {
        self.read(|conn| SqliteUserRepository::new(conn).get_user_by_email(email))?
            .ok_or_else(|| ServiceError::not_found(EntityKind::User, email))
    }

    pub fn list_users(&self) -> ServiceResult<Vec<User>> {
        self.read(|conn| SqliteUserRepository::new(conn).list_users())
    }

    /// Case-insensitive first-name substring search.
    pub fn search_users(&self, name: Option<&str>) -> ServiceResult<Vec<User>> {
        let name = match name {
            Some(name) if !name.is_empty() => name,
            _ => return Err(QueryError::MissingParameter("name").into()),
        };
        self.read(|conn| SqliteUserRepository::new(conn).search_users_by_first_name(name))
    }

    /// Deletes a user together with its credential row.
    pub fn delete_user(&self, id: EntityId) -> ServiceResult<User> {
        let unit = WriteUnit::new("delete_user").step(WriteStep::new("delete_user", move |conn, _| {
            SqliteUserRepository::new(conn)
                .delete_user(id)
                .map(Written::User)
        }));

        match self.write_one(unit)? {
            Written::User(deleted) => Ok(deleted),
            other => Err(unexpected(EntityKind::User, &other)),
        }
    }

    // ---- students ----

    pub fn create_student(&self, student: &NewStudent) -> ServiceResult<Student> {
        student.validate()?;
        let unit = WriteUnit::new("create_student").step(WriteStep::new("insert_student", |conn, _| {
            SqliteStudentRepository::new(conn)
                .create_student(student)
                .map(Written::Student)
        }));

        match self.write_one(unit)? {
            Written::Student(created) => Ok(created),
            other => Err(unexpected(EntityKind::Student, &other)),
        }
    }

    pub fn get_student(&self, id: EntityId) -> ServiceResult<Student> {
        self.read(|conn| SqliteStudentRepository::new(conn).get_student(id))?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Student, id))
    }

    pub fn list_students(&self) -> ServiceResult<Vec<Student>> {
        self.read(|conn| SqliteStudentRepository::new(conn).list_students())
    }

    // ---- instructors ----

    pub fn create_instructor(&self, instructor: &NewInstructor) -> ServiceResult<Instructor> {
        instructor.validate()?;
        let unit = WriteUnit::new("create_instructor").step(WriteStep::new(
            "insert_instructor",
            |conn, _| {
                SqliteInstructorRepository::new(conn)
                    .create_instructor(instructor)
                    .map(Written::Instructor)
            },
        ));

        match self.write_one(unit)? {
            Written::Instructor(created) => Ok(created),
            other => Err(unexpected(EntityKind::Instructor, &other)),
        }
    }

    pub fn get_instructor(&self, id: EntityId) -> ServiceResult<Instructor> {
        self.read(|conn| SqliteInstructorRepository::new(conn).get_instructor(id))?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Instructor, id))
    }

    pub fn list_instructors(&self) -> ServiceResult<Vec<Instructor>> {
        self.read(|conn| SqliteInstructorRepository::new(conn).list_instructors())
    }

    // ---- departments ----

    /// Creates a department once its head instructor is confirmed.
    pub fn create_department(&self, department: &NewDepartment) -> ServiceResult<Department> {
        department.validate()?;
        let unit = WriteUnit::new("create_department").step(
            WriteStep::new("insert_department", |conn, _| {
                SqliteDepartmentRepository::new(conn)
                    .create_department(department)
                    .map(Written::Department)
            })
            .requires(Reference::instructor(department.department_head)),
        );

        match self.write_one(unit)? {
            Written::Department(created) => Ok(created),
            other => Err(unexpected(EntityKind::Department, &other)),
        }
    }

    pub fn get_department(&self, id: EntityId) -> ServiceResult<Department> {
        self.read(|conn| SqliteDepartmentRepository::new(conn).get_department(id))?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Department, id))
    }

    // ---- courses ----

    /// Creates a course once its department is confirmed.
    pub fn create_course(&self, course: &NewCourse) -> ServiceResult<Course> {
        course.validate()?;
        let unit = WriteUnit::new("create_course").step(
            WriteStep::new("insert_course", |conn, _| {
                SqliteCourseRepository::new(conn)
                    .create_course(course)
                    .map(Written::Course)
            })
            .requires(Reference::department(course.department_id)),
        );

        match self.write_one(unit)? {
            Written::Course(created) => Ok(created),
            other => Err(unexpected(EntityKind::Course, &other)),
        }
    }

    pub fn get_course(&self, id: EntityId) -> ServiceResult<Course> {
        self.read(|conn| SqliteCourseRepository::new(conn).get_course(id))?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Course, id))
    }

    /// Courses of one department; an empty list is a valid answer.
    pub fn courses_for_department(&self, department_id: EntityId) -> ServiceResult<Vec<Course>> {
        self.read(|conn| SqliteCourseRepository::new(conn).list_courses_by_department(department_id))
    }

    // ---- enrollments ----

    /// Enrolls a student in a course once both rows are confirmed.
    pub fn create_enrollment(&self, enrollment: &NewEnrollment) -> ServiceResult<Enrollment> {
        enrollment.validate()?;
        let unit = WriteUnit::new("create_enrollment").step(
            WriteStep::new("insert_enrollment", |conn, _| {
                SqliteEnrollmentRepository::new(conn)
                    .create_enrollment(enrollment)
                    .map(Written::Enrollment)
            })
            .requires(Reference::student(enrollment.student_id))
            .requires(Reference::course(enrollment.course_id)),
        );

        match self.write_one(unit)? {
            Written::Enrollment(created) => Ok(created),
            other => Err(unexpected(EntityKind::Enrollment, &other)),
        }
    }

    pub fn get_enrollment(&self, id: EntityId) -> ServiceResult<Enrollment> {
        self.read(|conn| SqliteEnrollmentRepository::new(conn).get_enrollment(id))?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Enrollment, id))
    }

    pub fn enrollments_for_student(&self, student_id: EntityId) -> ServiceResult<Vec<Enrollment>> {
        self.read(|conn| {
            SqliteEnrollmentRepository::new(conn).list_enrollments_by_student(student_id)
        })
    }
}

fn unexpected(expected: EntityKind, written: &Written) -> ServiceError {
    ServiceError::Repo(RepoError::InvalidData(format!(
        "write unit produced {:?} where a {expected} was expected",
        written.kind()
    )))
}
