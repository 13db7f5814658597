//! Instructor model. Instructors may head departments.

use super::{require_email, require_text, EntityId, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instructor {
    pub id: EntityId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub hire_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInstructor {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub hire_date: NaiveDate,
}

impl NewInstructor {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("firstName", &self.first_name)?;
        require_text("lastName", &self.last_name)?;
        require_email(&self.email)?;
        require_text("phoneNumber", &self.phone_number)?;
        Ok(())
    }
}
