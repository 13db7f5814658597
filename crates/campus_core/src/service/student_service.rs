//! Student collection use-case service.
//!
//! # Responsibility
//! - Provide the student CRUD and query entry points over any
//!   `StudentStore` variant.
//! - Run the query engine over store snapshots.
//!
//! # Invariants
//! - Writes validate the merged record before the store is touched.
//! - Query operations never mutate the store.

use crate::collection::{CollectionError, StudentStore};
use crate::model::student::{NewStudent, Student, StudentPatch};
use crate::model::{EntityId, ValidationError};
use crate::query::pagination::{paginate, Page, PageRequest};
use crate::query::student_query::{filter_by_course, search_by_name, sort_by_grade, StudentQuery};
use crate::query::QueryError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StudentServiceResult<T> = Result<T, StudentServiceError>;

#[derive(Debug)]
pub enum StudentServiceError {
    NotFound(EntityId),
    Validation(ValidationError),
    Query(QueryError),
    Store(CollectionError),
}

impl Display for StudentServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "student not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Query(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StudentServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Validation(err) => Some(err),
            Self::Query(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<CollectionError> for StudentServiceError {
    fn from(value: CollectionError) -> Self {
        match value {
            CollectionError::NotFound(id) => Self::NotFound(id),
            CollectionError::Validation(err) => Self::Validation(err),
            other => Self::Store(other),
        }
    }
}

impl From<ValidationError> for StudentServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<QueryError> for StudentServiceError {
    fn from(value: QueryError) -> Self {
        Self::Query(value)
    }
}

/// Use-case service wrapper over a student store.
pub struct StudentService<S: StudentStore> {
    store: S,
}

impl<S: StudentStore> StudentService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    pub fn list_students(&self) -> StudentServiceResult<Vec<Student>> {
        Ok(self.store.get_all()?)
    }

    pub fn get_student(&self, id: EntityId) -> StudentServiceResult<Student> {
        self.store
            .get_by_id(id)?
            .ok_or(StudentServiceError::NotFound(id))
    }

    /// Validates and appends a student; the store assigns the id.
    pub fn add_student(&mut self, student: NewStudent) -> StudentServiceResult<Student> {
        student.validate()?;
        let created = self.store.append(student)?;
        info!(
            "event=student_add module=service status=ok student_id={}",
            created.id
        );
        Ok(created)
    }

    /// Replaces every field of an existing student, keeping its id.
    pub fn replace_student(
        &mut self,
        id: EntityId,
        fields: NewStudent,
    ) -> StudentServiceResult<Student> {
        fields.validate()?;
        let mut current = self.get_student(id)?;
        current.replace_with(fields);
        Ok(self.store.replace_by_id(current)?)
    }

    /// Merges a partial update and validates the merged record.
    pub fn patch_student(
        &mut self,
        id: EntityId,
        patch: StudentPatch,
    ) -> StudentServiceResult<Student> {
        let mut current = self.get_student(id)?;
        current.apply_patch(patch);
        current.validate()?;
        Ok(self.store.replace_by_id(current)?)
    }

    pub fn delete_student(&mut self, id: EntityId) -> StudentServiceResult<Student> {
        let removed = self.store.remove_by_id(id)?;
        info!(
            "event=student_delete module=service status=ok student_id={}",
            removed.id
        );
        Ok(removed)
    }

    pub fn search_by_name(&self, name: Option<&str>) -> StudentServiceResult<Vec<Student>> {
        let students = self.store.get_all()?;
        Ok(search_by_name(&students, name)?)
    }

    pub fn sorted_by_grade(&self, order: Option<&str>) -> StudentServiceResult<Vec<Student>> {
        let students = self.store.get_all()?;
        Ok(sort_by_grade(&students, order)?)
    }

    pub fn filtered_by_course(&self, course: Option<&str>) -> StudentServiceResult<Vec<Student>> {
        let students = self.store.get_all()?;
        Ok(filter_by_course(&students, course)?)
    }

    pub fn paginated(&self, request: PageRequest) -> StudentServiceResult<Page<Student>> {
        let students = self.store.get_all()?;
        Ok(paginate(&students, request))
    }

    pub fn query(&self, query: &StudentQuery) -> StudentServiceResult<Vec<Student>> {
        let students = self.store.get_all()?;
        Ok(query.run(&students)?)
    }

    pub fn query_paged(
        &self,
        query: &StudentQuery,
        request: PageRequest,
    ) -> StudentServiceResult<Page<Student>> {
        let students = self.store.get_all()?;
        Ok(query.run_paged(&students, request)?)
    }
}
