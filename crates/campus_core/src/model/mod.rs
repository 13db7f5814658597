//! Academic records domain model.
//!
//! # Responsibility
//! - Define entity shapes for users, students, instructors, departments,
//!   courses and enrollments.
//! - Provide write-time validation (`validate()`) shared by every store.
//!
//! # Invariants
//! - Entity ids are store-assigned and immutable once assigned.
//! - `Student.grade` stays within `0..=10` and `Student.age >= 1` on write.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod course;
pub mod department;
pub mod enrollment;
pub mod instructor;
pub mod student;
pub mod user;

/// Surrogate key shared by every entity kind.
pub type EntityId = i64;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Entity kinds, used to name the target of lookups and references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Student,
    Instructor,
    Department,
    Course,
    Enrollment,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Student => "student",
            Self::Instructor => "instructor",
            Self::Department => "department",
            Self::Course => "course",
            Self::Enrollment => "enrollment",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-level validation failures raised before any write.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyField(&'static str),
    InvalidEmail(String),
    AgeOutOfRange(u32),
    GradeOutOfRange(f64),
    NonPositiveCredits(i64),
    EmptyPassword,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "`{field}` is required"),
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
            Self::AgeOutOfRange(value) => {
                write!(f, "age must be a positive integer, got {value}")
            }
            Self::GradeOutOfRange(value) => {
                write!(f, "grade must be between 0 and 10, got {value}")
            }
            Self::NonPositiveCredits(value) => {
                write!(f, "credits must be greater than 0, got {value}")
            }
            Self::EmptyPassword => write!(f, "password cannot be empty"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}

pub(crate) fn require_email(value: &str) -> Result<(), ValidationError> {
    require_text("email", value)?;
    if !EMAIL_RE.is_match(value.trim()) {
        return Err(ValidationError::InvalidEmail(value.to_string()));
    }
    Ok(())
}

pub(crate) fn require_grade(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || !(0.0..=10.0).contains(&value) {
        return Err(ValidationError::GradeOutOfRange(value));
    }
    Ok(())
}
