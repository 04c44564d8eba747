use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use super::session::{SessionKeys, SESSION_COOKIE};
use crate::cookies::parse_cookie;
use crate::error::AppError;
use crate::state::AppState;
use crate::users::repo_types::{Role, User};

/// The logged-in user, re-read from the store on every request so role edits
/// and deletions apply immediately.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Like [`CurrentUser`] but never rejects.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl CurrentUser {
    /// Role gate: a mismatch sends the caller back to their own dashboard.
    pub fn require(&self, role: Role) -> Result<&User, AppError> {
        if self.0.role == role {
            return Ok(&self.0);
        }
        warn!(
            user_id = self.0.id,
            role = self.0.role.as_str(),
            required = role.as_str(),
            "permission denied"
        );
        Err(AppError::Forbidden {
            home: self.0.role.dashboard_path(),
        })
    }
}

async fn session_user(parts: &Parts, state: &AppState) -> Result<Option<User>, AppError> {
    let Some(token) = parse_cookie(&parts.headers, SESSION_COOKIE) else {
        return Ok(None);
    };
    let keys = SessionKeys::from_ref(state);
    let user_id = match keys.verify(&token) {
        Ok(id) => id,
        Err(_) => {
            warn!("invalid or expired session token");
            return Ok(None);
        }
    };
    Ok(User::find_by_id(&state.db, user_id).await?)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match session_user(parts, state).await? {
            Some(user) => Ok(CurrentUser(user)),
            None => Err(AppError::Unauthenticated {
                next: parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_else(|| parts.uri.path().to_string()),
            }),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(session_user(parts, state).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn user(role: Role) -> CurrentUser {
        CurrentUser(User {
            id: 5,
            username: "someone".into(),
            password_hash: String::new(),
            role,
            created_at: OffsetDateTime::now_utc(),
        })
    }

    #[test]
    fn require_accepts_matching_role() {
        assert!(user(Role::Instructor).require(Role::Instructor).is_ok());
    }

    #[test]
    fn require_sends_mismatch_home() {
        for (role, home) in [
            (Role::Instructor, "/instructor_dashboard"),
            (Role::Student, "/student_dashboard"),
        ] {
            match user(role).require(Role::Admin) {
                Err(AppError::Forbidden { home: h }) => assert_eq!(h, home),
                other => panic!("expected Forbidden, got {:?}", other.map(|u| u.id)),
            }
        }
    }
}
