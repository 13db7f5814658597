//! Relational variant of the student collection contract.
//!
//! Ids come from the database (`AUTOINCREMENT`), so `IdPolicy` does not
//! apply, and `persist` is a no-op because each statement autocommits.

use super::{CollectionError, CollectionResult, StudentStore};
use crate::model::student::{NewStudent, Student};
use crate::model::EntityId;
use crate::repo::student_repo::{SqliteStudentRepository, StudentRepository};

impl StudentStore for SqliteStudentRepository<'_> {
    fn get_all(&self) -> CollectionResult<Vec<Student>> {
        Ok(self.list_students()?)
    }

    fn get_by_id(&self, id: EntityId) -> CollectionResult<Option<Student>> {
        Ok(self.get_student(id)?)
    }

    fn append(&mut self, student: NewStudent) -> CollectionResult<Student> {
        Ok(self.create_student(&student)?)
    }

    fn replace_by_id(&mut self, student: Student) -> CollectionResult<Student> {
        self.update_student(&student)?;
        self.get_student(student.id)?
            .ok_or(CollectionError::NotFound(student.id))
    }

    fn remove_by_id(&mut self, id: EntityId) -> CollectionResult<Student> {
        Ok(self.delete_student(id)?)
    }

    fn persist(&mut self) -> CollectionResult<()> {
        Ok(())
    }
}
