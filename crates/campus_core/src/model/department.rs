//! Department model.
//!
//! # Invariants
//! - `department_head` references an existing instructor at creation time.

use super::{require_text, EntityId, ValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: EntityId,
    pub department_name: String,
    /// Instructor id.
    pub department_head: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDepartment {
    pub department_name: String,
    pub department_head: EntityId,
}

impl NewDepartment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("departmentName", &self.department_name)
    }
}
