use sqlx::SqlitePool;
use time::OffsetDateTime;

use crate::lessons::repo_types::Lesson;
use crate::users::repo_types::User;

const LESSON_COLUMNS: &str = "id, title, content, instructor_id, created_at";

impl Lesson {
    pub async fn create(
        db: &SqlitePool,
        instructor_id: i64,
        title: &str,
        content: &str,
    ) -> anyhow::Result<Lesson> {
        let lesson = sqlx::query_as::<_, Lesson>(&format!(
            r#"
            INSERT INTO lesson (title, content, instructor_id, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING {}
            "#,
            LESSON_COLUMNS
        ))
        .bind(title)
        .bind(content)
        .bind(instructor_id)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(db)
        .await?;
        Ok(lesson)
    }

    pub async fn find_by_id(db: &SqlitePool, id: i64) -> anyhow::Result<Option<Lesson>> {
        let lesson = sqlx::query_as::<_, Lesson>(&format!("SELECT {} FROM lesson WHERE id = ?", LESSON_COLUMNS))
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(lesson)
    }

    pub async fn list_all(db: &SqlitePool) -> anyhow::Result<Vec<Lesson>> {
        let rows = sqlx::query_as::<_, Lesson>(&format!("SELECT {} FROM lesson ORDER BY id", LESSON_COLUMNS))
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    pub async fn list_by_instructor(db: &SqlitePool, instructor_id: i64) -> anyhow::Result<Vec<Lesson>> {
        let rows = sqlx::query_as::<_, Lesson>(&format!(
            "SELECT {} FROM lesson WHERE instructor_id = ? ORDER BY id",
            LESSON_COLUMNS
        ))
        .bind(instructor_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Add a student to the lesson. Returns false when already enrolled.
    pub async fn enroll(db: &SqlitePool, lesson_id: i64, student_id: i64) -> anyhow::Result<bool> {
        let res = sqlx::query("INSERT OR IGNORE INTO student_lessons (student_id, lesson_id) VALUES (?, ?)")
            .bind(student_id)
            .bind(lesson_id)
            .execute(db)
            .await?;
        Ok(res.rows_affected() == 1)
    }

    pub async fn enrolled_students(db: &SqlitePool, lesson_id: i64) -> anyhow::Result<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.username, u.password_hash, u.role, u.created_at
              FROM user u
              JOIN student_lessons sl ON sl.student_id = u.id
             WHERE sl.lesson_id = ?
             ORDER BY u.username
            "#,
        )
        .bind(lesson_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn enrolled_lesson_ids(db: &SqlitePool, student_id: i64) -> anyhow::Result<Vec<i64>> {
        let rows: Vec<(i64,)> = sqlx::query_as("SELECT lesson_id FROM student_lessons WHERE student_id = ?")
            .bind(student_id)
            .fetch_all(db)
            .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use crate::users::repo_types::Role;

    #[tokio::test]
    async fn enrollment_is_idempotent_and_cascades_on_student_delete() {
        let state = AppState::for_tests().await;
        let inst = User::create(&state.db, "inst01", "h", Role::Instructor).await.unwrap();
        let stud = User::create(&state.db, "stud01", "h", Role::Student).await.unwrap();
        let lesson = Lesson::create(&state.db, inst.id, "Fractions", "Halves and quarters")
            .await
            .unwrap();

        assert!(Lesson::enroll(&state.db, lesson.id, stud.id).await.unwrap());
        assert!(!Lesson::enroll(&state.db, lesson.id, stud.id).await.unwrap());
        assert_eq!(
            Lesson::enrolled_lesson_ids(&state.db, stud.id).await.unwrap(),
            vec![lesson.id]
        );

        User::delete(&state.db, stud.id).await.unwrap();
        assert!(Lesson::enrolled_students(&state.db, lesson.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_by_instructor_only_returns_own_lessons() {
        let state = AppState::for_tests().await;
        let a = User::create(&state.db, "inst-a", "h", Role::Instructor).await.unwrap();
        let b = User::create(&state.db, "inst-b", "h", Role::Instructor).await.unwrap();
        Lesson::create(&state.db, a.id, "Mine", "x").await.unwrap();
        Lesson::create(&state.db, b.id, "Theirs", "y").await.unwrap();

        let mine = Lesson::list_by_instructor(&state.db, a.id).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].title, "Mine");
        assert_eq!(Lesson::list_all(&state.db).await.unwrap().len(), 2);
    }
}
