use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// Lesson authored by one instructor.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Lesson {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub instructor_id: i64,
    pub created_at: OffsetDateTime,
}
