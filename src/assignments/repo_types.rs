use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use sqlx::FromRow;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Lifecycle of an assignment. Stored as lower-case text; parsing ignores
/// case so rows written as "In Progress" still load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssignmentStatus {
    InProgress,
    Submitted,
    Graded,
}

impl AssignmentStatus {
    pub const ALL: [AssignmentStatus; 3] = [
        AssignmentStatus::InProgress,
        AssignmentStatus::Submitted,
        AssignmentStatus::Graded,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentStatus::InProgress => "in progress",
            AssignmentStatus::Submitted => "submitted",
            AssignmentStatus::Graded => "graded",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AssignmentStatus::InProgress => "In Progress",
            AssignmentStatus::Submitted => "Submitted",
            AssignmentStatus::Graded => "Graded",
        }
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssignmentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        AssignmentStatus::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow::anyhow!("unknown assignment status {:?}", s))
    }
}

/// Raw `assignment` row; `status` is free text in the store.
#[derive(Debug, FromRow)]
pub struct AssignmentRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub due_date: PrimitiveDateTime,
    pub status: String,
    pub grade: Option<f64>,
    pub instructor_id: i64,
    pub student_id: Option<i64>,
    pub submission: Option<String>,
    pub submitted_on: Option<OffsetDateTime>,
    pub graded_on: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Assignment {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub due_date: PrimitiveDateTime,
    pub status: AssignmentStatus,
    pub grade: Option<f64>,
    pub instructor_id: i64,
    pub student_id: Option<i64>,
    pub submission: Option<String>,
    pub submitted_on: Option<OffsetDateTime>,
    pub graded_on: Option<OffsetDateTime>,
}

impl TryFrom<AssignmentRow> for Assignment {
    type Error = anyhow::Error;

    fn try_from(r: AssignmentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            status: r.status.parse()?,
            id: r.id,
            title: r.title,
            description: r.description,
            due_date: r.due_date,
            grade: r.grade,
            instructor_id: r.instructor_id,
            student_id: r.student_id,
            submission: r.submission,
            submitted_on: r.submitted_on,
            graded_on: r.graded_on,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_casing_parses_to_same_status() {
        assert_eq!("In Progress".parse::<AssignmentStatus>().unwrap(), AssignmentStatus::InProgress);
        assert_eq!("in progress".parse::<AssignmentStatus>().unwrap(), AssignmentStatus::InProgress);
        assert_eq!("GRADED".parse::<AssignmentStatus>().unwrap(), AssignmentStatus::Graded);
        assert!("done".parse::<AssignmentStatus>().is_err());
    }

    #[test]
    fn canonical_text_is_lower_case() {
        for st in AssignmentStatus::ALL {
            assert_eq!(st.as_str(), st.as_str().to_lowercase());
            assert_eq!(st.to_string().parse::<AssignmentStatus>().unwrap(), st);
        }
    }
}
