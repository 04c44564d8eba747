use anyhow::Context;
use sqlx::SqlitePool;
use tracing::{info, instrument};

use crate::auth::password::hash_password;
use crate::config::AdminSeed;
use crate::users::repo::is_unique_violation;
use crate::users::repo_types::{Role, User};

#[derive(Debug, thiserror::Error)]
pub enum UserWriteError {
    #[error("username already taken")]
    UsernameTaken,
    #[error("user not found")]
    NotFound,
    #[error("admins cannot change their own role")]
    SelfDemotion,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Seed the bootstrap administrator unless a user with that name already exists.
/// Returns true when a row was inserted.
#[instrument(skip(db, seed), fields(username = %seed.username))]
pub async fn ensure_admin(db: &SqlitePool, seed: &AdminSeed) -> anyhow::Result<bool> {
    if User::find_by_username(db, &seed.username).await?.is_some() {
        return Ok(false);
    }
    let hash = hash_password(&seed.password)?;
    User::create(db, &seed.username, &hash, Role::Admin)
        .await
        .context("seed admin user")?;
    info!("seeded admin account");
    Ok(true)
}

pub async fn create_user(
    db: &SqlitePool,
    username: &str,
    password: &str,
    role: Role,
) -> Result<User, UserWriteError> {
    let hash = hash_password(password)?;
    match User::create(db, username, &hash, role).await {
        Ok(user) => Ok(user),
        Err(e) if is_unique_violation(&e) => Err(UserWriteError::UsernameTaken),
        Err(e) => Err(e.into()),
    }
}

/// `acting_admin` may rename themselves but must stay an admin, so the
/// store always keeps at least the account doing the editing.
pub async fn update_user(
    db: &SqlitePool,
    acting_admin: i64,
    id: i64,
    username: &str,
    new_password: Option<&str>,
    role: Role,
) -> Result<User, UserWriteError> {
    if id == acting_admin && role != Role::Admin {
        return Err(UserWriteError::SelfDemotion);
    }
    let hash = new_password.map(hash_password).transpose()?;
    match User::update(db, id, username, hash.as_deref(), role).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(UserWriteError::NotFound),
        Err(e) if is_unique_violation(&e) => Err(UserWriteError::UsernameTaken),
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug)]
pub enum DeleteOutcome {
    Deleted(User),
    NotFound,
    /// Admins cannot remove the account they are logged in with.
    SelfDelete,
    /// The user still owns lessons or assignments as instructor.
    OwnsContent(User),
}

/// Delete policy: instructors with content are kept; students are removed
/// and the store clears their assignment links and enrollments.
pub async fn delete_user(db: &SqlitePool, acting_admin: i64, id: i64) -> anyhow::Result<DeleteOutcome> {
    if id == acting_admin {
        return Ok(DeleteOutcome::SelfDelete);
    }
    let Some(user) = User::find_by_id(db, id).await? else {
        return Ok(DeleteOutcome::NotFound);
    };
    if User::owned_content_count(db, id).await? > 0 {
        return Ok(DeleteOutcome::OwnsContent(user));
    }
    User::delete(db, id).await?;
    Ok(DeleteOutcome::Deleted(user))
}
