//! Student domain model.
//!
//! # Invariants
//! - `age >= 1` and `0 <= grade <= 10` whenever validated on write.
//! - `courses` is a free-form set of course identifiers: duplicates are
//!   dropped, order is irrelevant, and identifiers are not checked against
//!   the course relation.

use super::{require_email, require_grade, require_text, EntityId, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Persisted student record.
///
/// Serialized with camelCase keys to match the collection file format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: EntityId,
    pub name: String,
    pub age: u32,
    pub grade: f64,
    pub email: String,
    pub address: String,
    pub phone: String,
    pub enrollment_date: NaiveDate,
    #[serde(default)]
    pub courses: Vec<String>,
}

/// Write model for creating or fully replacing a student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    pub name: String,
    pub age: u32,
    pub grade: f64,
    pub email: String,
    pub address: String,
    pub phone: String,
    pub enrollment_date: NaiveDate,
    #[serde(default)]
    pub courses: Vec<String>,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentPatch {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub grade: Option<f64>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub enrollment_date: Option<NaiveDate>,
    pub courses: Option<Vec<String>>,
}

impl NewStudent {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(
            &self.name,
            self.age,
            self.grade,
            &self.email,
            &self.address,
            &self.phone,
        )
    }

    /// Binds this write model to a store-assigned id.
    pub fn into_student(self, id: EntityId) -> Student {
        Student {
            id,
            name: self.name,
            age: self.age,
            grade: self.grade,
            email: self.email,
            address: self.address,
            phone: self.phone,
            enrollment_date: self.enrollment_date,
            courses: normalize_courses(&self.courses),
        }
    }
}

impl Student {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(
            &self.name,
            self.age,
            self.grade,
            &self.email,
            &self.address,
            &self.phone,
        )
    }

    /// Returns whether `course` is one of this student's course identifiers.
    pub fn takes_course(&self, course: &str) -> bool {
        self.courses.iter().any(|item| item == course)
    }

    /// Replaces every field except `id`.
    pub fn replace_with(&mut self, fields: NewStudent) {
        let id = self.id;
        *self = fields.into_student(id);
    }

    /// Applies a partial update in place. The caller validates afterwards.
    pub fn apply_patch(&mut self, patch: StudentPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(age) = patch.age {
            self.age = age;
        }
        if let Some(grade) = patch.grade {
            self.grade = grade;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(address) = patch.address {
            self.address = address;
        }
        if let Some(phone) = patch.phone {
            self.phone = phone;
        }
        if let Some(enrollment_date) = patch.enrollment_date {
            self.enrollment_date = enrollment_date;
        }
        if let Some(courses) = patch.courses {
            self.courses = normalize_courses(&courses);
        }
    }
}

/// Trims identifiers, drops blanks and duplicates, keeps first occurrence.
pub fn normalize_courses(courses: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(courses.len());
    for course in courses {
        let trimmed = course.trim();
        if trimmed.is_empty() || normalized.iter().any(|item| item == trimmed) {
            continue;
        }
        normalized.push(trimmed.to_string());
    }
    normalized
}

fn validate_fields(
    name: &str,
    age: u32,
    grade: f64,
    email: &str,
    address: &str,
    phone: &str,
) -> Result<(), ValidationError> {
    require_text("name", name)?;
    if age < 1 {
        return Err(ValidationError::AgeOutOfRange(age));
    }
    require_grade(grade)?;
    require_email(email)?;
    require_text("address", address)?;
    require_text("phone", phone)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{normalize_courses, NewStudent, StudentPatch};
    use crate::model::ValidationError;
    use chrono::NaiveDate;

    fn sample() -> NewStudent {
        NewStudent {
            name: "Anna".to_string(),
            age: 20,
            grade: 8.5,
            email: "anna@uni.edu".to_string(),
            address: "1 Main St".to_string(),
            phone: "555-0100".to_string(),
            enrollment_date: NaiveDate::from_ymd_opt(2023, 9, 1).unwrap(),
            courses: vec!["math".to_string()],
        }
    }

    #[test]
    fn zero_age_is_rejected() {
        let mut student = sample();
        student.age = 0;
        assert_eq!(student.validate(), Err(ValidationError::AgeOutOfRange(0)));
    }

    #[test]
    fn patch_touches_only_given_fields() {
        let mut student = sample().into_student(7);
        student.apply_patch(StudentPatch {
            grade: Some(9.0),
            courses: Some(vec!["art".to_string(), "art".to_string()]),
            ..StudentPatch::default()
        });
        assert_eq!(student.id, 7);
        assert_eq!(student.name, "Anna");
        assert_eq!(student.grade, 9.0);
        assert_eq!(student.courses, vec!["art".to_string()]);
    }

    #[test]
    fn normalize_courses_dedupes_and_trims() {
        let courses = vec![
            " math ".to_string(),
            "".to_string(),
            "math".to_string(),
            "physics".to_string(),
        ];
        assert_eq!(
            normalize_courses(&courses),
            vec!["math".to_string(), "physics".to_string()]
        );
    }

    #[test]
    fn collection_file_shape_uses_camel_case() {
        let student = sample().into_student(1);
        let value = serde_json::to_value(&student).unwrap();
        assert_eq!(value["enrollmentDate"], "2023-09-01");
        assert_eq!(value["courses"][0], "math");
    }
}
