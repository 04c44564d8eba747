use sqlx::SqlitePool;
use time::OffsetDateTime;

use crate::assignments::repo_types::{Assignment, AssignmentStatus};

#[derive(Debug)]
pub enum GradeOutcome {
    Graded(Assignment),
    NotFound,
    /// The assignment belongs to another instructor.
    NotOwner,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Submitted(Assignment),
    NotFound,
    Refused(SubmitRefusal),
}

/// Reasons a student may neither open nor submit an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRefusal {
    AlreadyGraded,
    /// Linked to a different student.
    AssignedToOther,
}

/// Set the grade and status an instructor entered. `graded_on` is stamped
/// whenever the resulting status is graded.
pub async fn update_grade(
    db: &SqlitePool,
    instructor_id: i64,
    assignment_id: i64,
    grade: Option<f64>,
    status: AssignmentStatus,
) -> anyhow::Result<GradeOutcome> {
    let Some(existing) = Assignment::find_by_id(db, assignment_id).await? else {
        return Ok(GradeOutcome::NotFound);
    };
    if existing.instructor_id != instructor_id {
        return Ok(GradeOutcome::NotOwner);
    }
    let graded_on = (status == AssignmentStatus::Graded).then(OffsetDateTime::now_utc);
    match Assignment::record_grade(db, assignment_id, grade, status, graded_on).await? {
        Some(updated) => Ok(GradeOutcome::Graded(updated)),
        None => Ok(GradeOutcome::NotFound),
    }
}

/// Grade and close an assignment. Re-grading overwrites the previous grade.
pub async fn grade(
    db: &SqlitePool,
    instructor_id: i64,
    assignment_id: i64,
    grade: f64,
) -> anyhow::Result<GradeOutcome> {
    update_grade(db, instructor_id, assignment_id, Some(grade), AssignmentStatus::Graded).await
}

/// Why `student_id` may not open or submit this assignment, if anything.
pub fn submission_refusal(assignment: &Assignment, student_id: i64) -> Option<SubmitRefusal> {
    if assignment.status == AssignmentStatus::Graded {
        return Some(SubmitRefusal::AlreadyGraded);
    }
    if assignment.student_id.is_some_and(|owner| owner != student_id) {
        return Some(SubmitRefusal::AssignedToOther);
    }
    None
}

/// Record a student's work. `submitted_on` is stamped when the status is submitted.
pub async fn submit(
    db: &SqlitePool,
    student_id: i64,
    assignment_id: i64,
    status: AssignmentStatus,
    submission: Option<&str>,
) -> anyhow::Result<SubmitOutcome> {
    let Some(existing) = Assignment::find_by_id(db, assignment_id).await? else {
        return Ok(SubmitOutcome::NotFound);
    };
    if let Some(refusal) = submission_refusal(&existing, student_id) {
        return Ok(SubmitOutcome::Refused(refusal));
    }
    let submitted_on = (status == AssignmentStatus::Submitted).then(OffsetDateTime::now_utc);
    match Assignment::record_submission(db, assignment_id, student_id, status, submission, submitted_on).await? {
        Some(updated) => Ok(SubmitOutcome::Submitted(updated)),
        None => Ok(SubmitOutcome::NotFound),
    }
}
