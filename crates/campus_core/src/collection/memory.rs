//! In-memory student collection.

use super::{position_of, CollectionResult, IdAllocator, IdPolicy, StudentStore};
use crate::model::student::{NewStudent, Student};
use crate::model::EntityId;

#[derive(Debug, Clone)]
pub struct MemoryStudentStore {
    students: Vec<Student>,
    ids: IdAllocator,
}

impl MemoryStudentStore {
    pub fn new(policy: IdPolicy) -> Self {
        Self::with_students(Vec::new(), policy)
    }

    /// Seeds the store with existing records; they are not re-validated.
    pub fn with_students(students: Vec<Student>, policy: IdPolicy) -> Self {
        let mut ids = IdAllocator::new(policy);
        ids.observe(&students);
        Self { students, ids }
    }
}

impl Default for MemoryStudentStore {
    fn default() -> Self {
        Self::new(IdPolicy::default())
    }
}

impl StudentStore for MemoryStudentStore {
    fn get_all(&self) -> CollectionResult<Vec<Student>> {
        Ok(self.students.clone())
    }

    fn get_by_id(&self, id: EntityId) -> CollectionResult<Option<Student>> {
        Ok(self.students.iter().find(|student| student.id == id).cloned())
    }

    fn append(&mut self, student: NewStudent) -> CollectionResult<Student> {
        student.validate()?;
        let id = self.ids.next_id(&self.students);
        let stored = student.into_student(id);
        self.students.push(stored.clone());
        Ok(stored)
    }

    fn replace_by_id(&mut self, student: Student) -> CollectionResult<Student> {
        student.validate()?;
        let index = position_of(&self.students, student.id)?;
        self.students[index] = student.clone();
        Ok(student)
    }

    fn remove_by_id(&mut self, id: EntityId) -> CollectionResult<Student> {
        let index = position_of(&self.students, id)?;
        Ok(self.students.remove(index))
    }

    fn persist(&mut self) -> CollectionResult<()> {
        Ok(())
    }
}
