//! Course model.
//!
//! # Invariants
//! - `department_id` references an existing department at creation time.
//! - `credits > 0`.

use super::{require_text, EntityId, ValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: EntityId,
    pub course_name: String,
    pub course_description: String,
    pub credits: i64,
    pub department_id: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
    pub course_name: String,
    pub course_description: String,
    pub credits: i64,
    pub department_id: EntityId,
}

impl NewCourse {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("courseName", &self.course_name)?;
        if self.credits <= 0 {
            return Err(ValidationError::NonPositiveCredits(self.credits));
        }
        Ok(())
    }
}
