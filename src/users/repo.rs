use sqlx::SqlitePool;
use time::OffsetDateTime;

use crate::users::repo_types::{Role, User};

const USER_COLUMNS: &str = "id, username, password_hash, role, created_at";

impl User {
    pub async fn find_by_username(db: &SqlitePool, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM user WHERE username = ?",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &SqlitePool, id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM user WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    pub async fn list_all(db: &SqlitePool) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!("SELECT {} FROM user ORDER BY id", USER_COLUMNS))
            .fetch_all(db)
            .await?;
        Ok(users)
    }

    pub async fn list_by_role(db: &SqlitePool, role: Role) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM user WHERE role = ? ORDER BY username",
            USER_COLUMNS
        ))
        .bind(role)
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    /// Insert a user. A taken username surfaces as the store's unique-constraint error.
    pub async fn create(
        db: &SqlitePool,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO user (username, password_hash, role, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(username)
        .bind(password_hash)
        .bind(role)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Overwrite username and role; replace the hash only when one is given.
    pub async fn update(
        db: &SqlitePool,
        id: i64,
        username: &str,
        password_hash: Option<&str>,
        role: Role,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE user
               SET username = ?,
                   password_hash = COALESCE(?, password_hash),
                   role = ?
             WHERE id = ?
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(username)
        .bind(password_hash)
        .bind(role)
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Hard delete; returns the number of removed rows.
    pub async fn delete(db: &SqlitePool, id: i64) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM user WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;
        Ok(res.rows_affected())
    }

    /// Lessons plus assignments this user owns as instructor.
    pub async fn owned_content_count(db: &SqlitePool, id: i64) -> anyhow::Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT (SELECT COUNT(*) FROM lesson WHERE instructor_id = ?1)
                 + (SELECT COUNT(*) FROM assignment WHERE instructor_id = ?1)
            "#,
        )
        .bind(id)
        .fetch_one(db)
        .await?;
        Ok(count)
    }
}

/// True when the error chain carries a UNIQUE constraint violation from the store.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map(|e| e.is_unique_violation())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;

    #[tokio::test]
    async fn duplicate_username_hits_unique_constraint() {
        let state = AppState::for_tests().await;
        User::create(&state.db, "teach01", "hash", Role::Instructor)
            .await
            .expect("first insert");
        let err = User::create(&state.db, "teach01", "other", Role::Student)
            .await
            .unwrap_err();
        assert!(is_unique_violation(&err));

        let all = User::list_all(&state.db).await.unwrap();
        assert_eq!(all.iter().filter(|u| u.username == "teach01").count(), 1);
    }

    #[tokio::test]
    async fn update_keeps_hash_when_none_given() {
        let state = AppState::for_tests().await;
        let user = User::create(&state.db, "stud01", "hash-1", Role::Student)
            .await
            .unwrap();

        let updated = User::update(&state.db, user.id, "stud01b", None, Role::Instructor)
            .await
            .unwrap()
            .expect("row exists");
        assert_eq!(updated.username, "stud01b");
        assert_eq!(updated.role, Role::Instructor);
        assert_eq!(updated.password_hash, "hash-1");

        let updated = User::update(&state.db, user.id, "stud01b", Some("hash-2"), Role::Instructor)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.password_hash, "hash-2");

        assert!(User::update(&state.db, 9999, "ghost", None, Role::Student)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn list_by_role_filters() {
        let state = AppState::for_tests().await;
        User::create(&state.db, "s-b", "h", Role::Student).await.unwrap();
        User::create(&state.db, "s-a", "h", Role::Student).await.unwrap();
        User::create(&state.db, "i-a", "h", Role::Instructor).await.unwrap();

        let students = User::list_by_role(&state.db, Role::Student).await.unwrap();
        let names: Vec<_> = students.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, ["s-a", "s-b"]);
    }
}
