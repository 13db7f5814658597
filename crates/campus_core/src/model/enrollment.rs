//! Enrollment join model between students and courses.
//!
//! # Invariants
//! - `student_id` and `course_id` reference existing rows at creation time.
//! - No uniqueness is enforced per (student, course) pair.

use super::{require_grade, EntityId, ValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: EntityId,
    pub student_id: EntityId,
    pub course_id: EntityId,
    pub grade: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEnrollment {
    pub student_id: EntityId,
    pub course_id: EntityId,
    #[serde(default)]
    pub grade: Option<f64>,
}

impl NewEnrollment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(grade) = self.grade {
            require_grade(grade)?;
        }
        Ok(())
    }
}
