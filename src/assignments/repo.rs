use anyhow::Context;
use sqlx::SqlitePool;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::assignments::repo_types::{Assignment, AssignmentRow, AssignmentStatus};

const ASSIGNMENT_COLUMNS: &str = "id, title, description, due_date, status, grade, instructor_id, \
     student_id, submission, submitted_on, graded_on";

pub struct NewAssignment<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub due_date: PrimitiveDateTime,
    pub instructor_id: i64,
    pub student_id: Option<i64>,
}

fn convert(rows: Vec<AssignmentRow>) -> anyhow::Result<Vec<Assignment>> {
    rows.into_iter().map(Assignment::try_from).collect()
}

impl Assignment {
    pub async fn create(db: &SqlitePool, new: NewAssignment<'_>) -> anyhow::Result<Assignment> {
        let row = sqlx::query_as::<_, AssignmentRow>(&format!(
            r#"
            INSERT INTO assignment (title, description, due_date, status, instructor_id, student_id)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            ASSIGNMENT_COLUMNS
        ))
        .bind(new.title)
        .bind(new.description)
        .bind(new.due_date)
        .bind(AssignmentStatus::InProgress.as_str())
        .bind(new.instructor_id)
        .bind(new.student_id)
        .fetch_one(db)
        .await
        .context("insert assignment")?;
        row.try_into()
    }

    pub async fn find_by_id(db: &SqlitePool, id: i64) -> anyhow::Result<Option<Assignment>> {
        let row = sqlx::query_as::<_, AssignmentRow>(&format!(
            "SELECT {} FROM assignment WHERE id = ?",
            ASSIGNMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        row.map(Assignment::try_from).transpose()
    }

    pub async fn list_all(db: &SqlitePool) -> anyhow::Result<Vec<Assignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(&format!(
            "SELECT {} FROM assignment ORDER BY due_date, id",
            ASSIGNMENT_COLUMNS
        ))
        .fetch_all(db)
        .await?;
        convert(rows)
    }

    pub async fn list_by_instructor(db: &SqlitePool, instructor_id: i64) -> anyhow::Result<Vec<Assignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(&format!(
            "SELECT {} FROM assignment WHERE instructor_id = ? ORDER BY due_date, id",
            ASSIGNMENT_COLUMNS
        ))
        .bind(instructor_id)
        .fetch_all(db)
        .await?;
        convert(rows)
    }

    /// Overwrite grade and status. `graded_on` is only replaced when given.
    pub async fn record_grade(
        db: &SqlitePool,
        id: i64,
        grade: Option<f64>,
        status: AssignmentStatus,
        graded_on: Option<OffsetDateTime>,
    ) -> anyhow::Result<Option<Assignment>> {
        let row = sqlx::query_as::<_, AssignmentRow>(&format!(
            r#"
            UPDATE assignment
               SET grade = ?, status = ?, graded_on = COALESCE(?, graded_on)
             WHERE id = ?
            RETURNING {}
            "#,
            ASSIGNMENT_COLUMNS
        ))
        .bind(grade)
        .bind(status.as_str())
        .bind(graded_on)
        .bind(id)
        .fetch_optional(db)
        .await?;
        row.map(Assignment::try_from).transpose()
    }

    /// Store a student's work and link the assignment to them.
    pub async fn record_submission(
        db: &SqlitePool,
        id: i64,
        student_id: i64,
        status: AssignmentStatus,
        submission: Option<&str>,
        submitted_on: Option<OffsetDateTime>,
    ) -> anyhow::Result<Option<Assignment>> {
        let row = sqlx::query_as::<_, AssignmentRow>(&format!(
            r#"
            UPDATE assignment
               SET student_id = ?, status = ?, submission = ?,
                   submitted_on = COALESCE(?, submitted_on)
             WHERE id = ?
            RETURNING {}
            "#,
            ASSIGNMENT_COLUMNS
        ))
        .bind(student_id)
        .bind(status.as_str())
        .bind(submission)
        .bind(submitted_on)
        .bind(id)
        .fetch_optional(db)
        .await?;
        row.map(Assignment::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use crate::users::repo_types::{Role, User};
    use time::macros::datetime;

    #[tokio::test]
    async fn new_assignment_starts_in_progress() {
        let state = AppState::for_tests().await;
        let inst = User::create(&state.db, "inst01", "h", Role::Instructor).await.unwrap();
        let a = Assignment::create(
            &state.db,
            NewAssignment {
                title: "Essay",
                description: "Write 500 words",
                due_date: datetime!(2026-12-01 17:00),
                instructor_id: inst.id,
                student_id: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(a.status, AssignmentStatus::InProgress);
        assert_eq!(a.due_date, datetime!(2026-12-01 17:00));
        assert!(a.grade.is_none() && a.submission.is_none());

        let loaded = Assignment::find_by_id(&state.db, a.id).await.unwrap().unwrap();
        assert_eq!(loaded.title, "Essay");
        assert!(Assignment::find_by_id(&state.db, a.id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn legacy_status_rows_load() {
        let state = AppState::for_tests().await;
        let inst = User::create(&state.db, "inst01", "h", Role::Instructor).await.unwrap();
        sqlx::query(
            "INSERT INTO assignment (title, description, due_date, status, instructor_id) VALUES (?, ?, ?, 'In Progress', ?)",
        )
        .bind("Old")
        .bind("From before")
        .bind(datetime!(2026-01-01 08:00))
        .bind(inst.id)
        .execute(&state.db)
        .await
        .unwrap();

        let all = Assignment::list_by_instructor(&state.db, inst.id).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].status, AssignmentStatus::InProgress);
    }
}
