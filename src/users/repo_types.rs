use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// Closed set of roles. Stored upper-case in the `user.role` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Instructor,
    Student,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Instructor, Role::Student];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Instructor => "INSTRUCTOR",
            Role::Student => "STUDENT",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Instructor => "Instructor",
            Role::Student => "Student",
        }
    }

    /// Landing page for a logged-in user of this role.
    pub fn dashboard_path(self) -> &'static str {
        match self {
            Role::Admin => "/admin_dashboard",
            Role::Instructor => "/instructor_dashboard",
            Role::Student => "/student_dashboard",
        }
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown role {:?}", s))
    }
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 PHC string
    pub role: Role,
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_text_roundtrip_is_exact() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("admin".parse::<Role>().is_err());
        assert!("TUTOR".parse::<Role>().is_err());
    }

    #[test]
    fn each_role_has_its_own_dashboard() {
        assert_eq!(Role::Admin.dashboard_path(), "/admin_dashboard");
        assert_eq!(Role::Instructor.dashboard_path(), "/instructor_dashboard");
        assert_eq!(Role::Student.dashboard_path(), "/student_dashboard");
    }
}
