//! Search, sort and filter operations over a student snapshot.
//!
//! # Invariants
//! - Name search is a case-insensitive substring match preserving order.
//! - Grade sort is stable: equal grades keep their relative order.
//! - Course filter is an exact identifier match; no match is an empty result.

use super::pagination::{paginate, Page, PageRequest};
use super::{QueryError, QueryResult};
use crate::model::student::Student;

/// Grade sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Parses `asc`/`desc`; an absent value means `asc`.
    pub fn parse(raw: Option<&str>) -> QueryResult<Self> {
        match raw {
            None | Some("asc") => Ok(Self::Asc),
            Some("desc") => Ok(Self::Desc),
            Some(other) => Err(QueryError::InvalidParameter {
                name: "sortOrder",
                value: other.to_string(),
            }),
        }
    }
}

/// Returns students whose name contains `term`, ignoring case.
pub fn search_by_name(students: &[Student], term: Option<&str>) -> QueryResult<Vec<Student>> {
    let term = required("name", term)?.to_lowercase();
    Ok(students
        .iter()
        .filter(|student| student.name.to_lowercase().contains(&term))
        .cloned()
        .collect())
}

/// Returns the snapshot ordered by grade in the requested direction.
pub fn sort_by_grade(students: &[Student], order: Option<&str>) -> QueryResult<Vec<Student>> {
    let order = SortOrder::parse(order)?;
    Ok(sorted(students.to_vec(), order))
}

/// Returns students whose course set contains `course` exactly.
pub fn filter_by_course(students: &[Student], course: Option<&str>) -> QueryResult<Vec<Student>> {
    let course = required("course", course)?;
    Ok(students
        .iter()
        .filter(|student| student.takes_course(course))
        .cloned()
        .collect())
}

/// Chained query: course filter, then name search, then grade sort.
///
/// Each criterion is optional; a criterion that is present keeps the
/// contract of its standalone operation (an empty `name` or `course` is
/// still `MissingParameter`, an unknown `sort_order` is `InvalidParameter`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentQuery {
    pub name: Option<String>,
    pub course: Option<String>,
    pub sort_order: Option<String>,
}

impl StudentQuery {
    pub fn run(&self, students: &[Student]) -> QueryResult<Vec<Student>> {
        let order = match self.sort_order.as_deref() {
            Some(raw) => Some(SortOrder::parse(Some(raw))?),
            None => None,
        };

        let mut selected = match self.course.as_deref() {
            Some(course) => filter_by_course(students, Some(course))?,
            None => students.to_vec(),
        };
        if let Some(name) = self.name.as_deref() {
            selected = search_by_name(&selected, Some(name))?;
        }
        if let Some(order) = order {
            selected = sorted(selected, order);
        }
        Ok(selected)
    }

    /// Runs the query and paginates the result.
    pub fn run_paged(
        &self,
        students: &[Student],
        request: PageRequest,
    ) -> QueryResult<Page<Student>> {
        let selected = self.run(students)?;
        Ok(paginate(&selected, request))
    }
}

fn sorted(mut students: Vec<Student>, order: SortOrder) -> Vec<Student> {
    match order {
        SortOrder::Asc => students.sort_by(|a, b| a.grade.total_cmp(&b.grade)),
        SortOrder::Desc => students.sort_by(|a, b| b.grade.total_cmp(&a.grade)),
    }
    students
}

fn required<'a>(name: &'static str, value: Option<&'a str>) -> QueryResult<&'a str> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(QueryError::MissingParameter(name)),
    }
}
