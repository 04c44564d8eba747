use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Form, Router,
};
use sqlx::SqlitePool;
use tracing::{info, instrument, warn};

use super::{
    dto::{CreateUserForm, EditUserForm},
    repo_types::{Role, User},
    services::{self, DeleteOutcome, UserWriteError},
    views,
};
use crate::{
    auth::extractors::CurrentUser,
    error::{AppError, AppResult},
    flash::{self, Flash, IncomingFlash},
    state::AppState,
    validation::FormErrors,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin_dashboard", get(admin_dashboard).post(admin_create_user))
        .route("/create_user", get(create_user_page).post(create_user))
        .route("/edit_user/:id", get(edit_user_page).post(edit_user))
        .route("/delete_user/:id", get(delete_user))
}

/// Validate and insert; a taken username comes back as a field error.
async fn try_create(db: &SqlitePool, form: &CreateUserForm) -> AppResult<Result<User, FormErrors>> {
    let role = match form.validated() {
        Ok(role) => role,
        Err(errors) => return Ok(Err(errors)),
    };
    match services::create_user(db, &form.username, &form.password, role).await {
        Ok(user) => {
            info!(user_id = user.id, role = user.role.as_str(), "user created");
            Ok(Ok(user))
        }
        Err(UserWriteError::UsernameTaken) => {
            let mut errors = FormErrors::default();
            errors.add("username", "Username is already taken");
            Ok(Err(errors))
        }
        Err(UserWriteError::Other(e)) => Err(e.into()),
        Err(other) => Err(anyhow::Error::new(other).into()),
    }
}

#[instrument(skip_all)]
pub async fn admin_dashboard(
    State(state): State<AppState>,
    user: CurrentUser,
    flash: IncomingFlash,
) -> AppResult<Response> {
    let admin = user.require(Role::Admin)?;
    let users = User::list_all(&state.db).await?;
    Ok(views::admin_dashboard(admin, &users, &CreateUserForm::default(), &FormErrors::default(), flash)
        .into_response())
}

#[instrument(skip_all)]
pub async fn admin_create_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<CreateUserForm>,
) -> AppResult<Response> {
    let admin = user.require(Role::Admin)?;
    let form = form.normalize();
    match try_create(&state.db, &form).await? {
        Ok(_) => flash::redirect("/admin_dashboard", Flash::success("User created successfully!")),
        Err(errors) => {
            let users = User::list_all(&state.db).await?;
            Ok(views::admin_dashboard(admin, &users, &form, &errors, IncomingFlash(None))
                .with_status(StatusCode::UNPROCESSABLE_ENTITY)
                .into_response())
        }
    }
}

#[instrument(skip_all)]
pub async fn create_user_page(user: CurrentUser) -> AppResult<Response> {
    let admin = user.require(Role::Admin)?;
    Ok(views::create_user(admin, &CreateUserForm::default(), &FormErrors::default()).into_response())
}

#[instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<CreateUserForm>,
) -> AppResult<Response> {
    let admin = user.require(Role::Admin)?;
    let form = form.normalize();
    match try_create(&state.db, &form).await? {
        Ok(_) => flash::redirect("/admin_dashboard", Flash::success("User created successfully!")),
        Err(errors) => Ok(views::create_user(admin, &form, &errors)
            .with_status(StatusCode::UNPROCESSABLE_ENTITY)
            .into_response()),
    }
}

#[instrument(skip(state, user))]
pub async fn edit_user_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let admin = user.require(Role::Admin)?;
    let target = User::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    let form = EditUserForm {
        username: target.username,
        role: target.role.as_str().to_string(),
        ..Default::default()
    };
    Ok(views::edit_user(admin, id, &form, &FormErrors::default()).into_response())
}

#[instrument(skip(state, user, form))]
pub async fn edit_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Form(form): Form<EditUserForm>,
) -> AppResult<Response> {
    let admin = user.require(Role::Admin)?;
    let form = form.normalize();
    let invalid = |errors: FormErrors| {
        Ok(views::edit_user(admin, id, &form, &errors)
            .with_status(StatusCode::UNPROCESSABLE_ENTITY)
            .into_response())
    };
    let (role, password) = match form.validated() {
        Ok(v) => v,
        Err(errors) => return invalid(errors),
    };
    match services::update_user(&state.db, admin.id, id, &form.username, password, role).await {
        Ok(updated) => {
            info!(user_id = updated.id, role = updated.role.as_str(), "user updated");
            flash::redirect(
                "/admin_dashboard",
                Flash::success(format!("User {} updated successfully!", updated.username)),
            )
        }
        Err(UserWriteError::UsernameTaken) => {
            let mut errors = FormErrors::default();
            errors.add("username", "Username is already taken");
            invalid(errors)
        }
        Err(UserWriteError::SelfDemotion) => {
            warn!(user_id = admin.id, "admin tried to change their own role");
            let mut errors = FormErrors::default();
            errors.add("role", "You cannot change your own role");
            invalid(errors)
        }
        Err(UserWriteError::NotFound) => Err(AppError::NotFound("user")),
        Err(UserWriteError::Other(e)) => Err(e.into()),
    }
}

#[instrument(skip(state, user))]
pub async fn delete_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let admin = user.require(Role::Admin)?;
    match services::delete_user(&state.db, admin.id, id).await? {
        DeleteOutcome::Deleted(deleted) => {
            info!(user_id = deleted.id, "user deleted");
            flash::redirect(
                "/admin_dashboard",
                Flash::success(format!("User {} deleted successfully!", deleted.username)),
            )
        }
        DeleteOutcome::NotFound => Err(AppError::NotFound("user")),
        DeleteOutcome::SelfDelete => flash::redirect(
            "/admin_dashboard",
            Flash::warning("You cannot delete the account you are logged in with."),
        ),
        DeleteOutcome::OwnsContent(kept) => {
            warn!(user_id = kept.id, "delete refused: user owns lessons or assignments");
            flash::redirect(
                "/admin_dashboard",
                Flash::warning(format!(
                    "User {} still owns lessons or assignments and was not deleted.",
                    kept.username
                )),
            )
        }
    }
}
