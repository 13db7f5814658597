//! JSON-file student collection.
//!
//! # Invariants
//! - The file holds one JSON array of student records.
//! - Every operation re-reads the whole file; every mutation rewrites it
//!   in full (pretty-printed, two-space indent).
//! - A missing file is an empty collection; it is created on first write.

use super::{
    position_of, CollectionError, CollectionResult, IdAllocator, IdPolicy, StudentStore,
};
use crate::model::student::{NewStudent, Student};
use crate::model::EntityId;
use log::{debug, error};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct JsonFileStudentStore {
    path: PathBuf,
    ids: IdAllocator,
}

impl JsonFileStudentStore {
    /// Opens the store, failing fast when an existing file is unreadable.
    pub fn open(path: impl AsRef<Path>, policy: IdPolicy) -> CollectionResult<Self> {
        let mut store = Self {
            path: path.as_ref().to_path_buf(),
            ids: IdAllocator::new(policy),
        };
        let students = store.load()?;
        store.ids.observe(&students);
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> CollectionResult<Vec<Student>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(CollectionError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&raw).map_err(|source| CollectionError::Json {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, students: &[Student]) -> CollectionResult<()> {
        let body = serde_json::to_string_pretty(students).map_err(|source| {
            CollectionError::Json {
                path: self.path.clone(),
                source,
            }
        })?;
        std::fs::write(&self.path, body).map_err(|source| {
            error!(
                "event=collection_write module=collection status=error path={} error={}",
                self.path.display(),
                source
            );
            CollectionError::Io {
                path: self.path.clone(),
                source,
            }
        })?;
        debug!(
            "event=collection_write module=collection status=ok count={}",
            students.len()
        );
        Ok(())
    }
}

impl StudentStore for JsonFileStudentStore {
    fn get_all(&self) -> CollectionResult<Vec<Student>> {
        self.load()
    }

    fn get_by_id(&self, id: EntityId) -> CollectionResult<Option<Student>> {
        Ok(self.load()?.into_iter().find(|student| student.id == id))
    }

    fn append(&mut self, student: NewStudent) -> CollectionResult<Student> {
        student.validate()?;
        let mut students = self.load()?;
        let id = self.ids.next_id(&students);
        let stored = student.into_student(id);
        students.push(stored.clone());
        self.write(&students)?;
        Ok(stored)
    }

    fn replace_by_id(&mut self, student: Student) -> CollectionResult<Student> {
        student.validate()?;
        let mut students = self.load()?;
        let index = position_of(&students, student.id)?;
        students[index] = student.clone();
        self.write(&students)?;
        Ok(student)
    }

    fn remove_by_id(&mut self, id: EntityId) -> CollectionResult<Student> {
        let mut students = self.load()?;
        let index = position_of(&students, id)?;
        let removed = students.remove(index);
        self.ids.observe(std::slice::from_ref(&removed));
        self.write(&students)?;
        Ok(removed)
    }

    fn persist(&mut self) -> CollectionResult<()> {
        let students = self.load()?;
        self.write(&students)
    }
}
