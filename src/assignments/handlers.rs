use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Form, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{CreateAssignmentForm, GradeForm, InlineGradeForm, SubmitForm},
    repo::NewAssignment,
    repo_types::Assignment,
    services::{self, submission_refusal, GradeOutcome, SubmitOutcome, SubmitRefusal},
    views,
};
use crate::{
    auth::extractors::CurrentUser,
    error::{AppError, AppResult},
    flash::{self, Flash, IncomingFlash},
    lessons::repo_types::Lesson,
    state::AppState,
    users::repo_types::{Role, User},
    validation::FormErrors,
    views::Page,
};

pub fn assignment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/instructor_dashboard",
            get(instructor_dashboard).post(inline_grade),
        )
        .route("/create_assignment", get(create_assignment_page).post(create_assignment))
        .route("/grade_assignment/:id", get(grade_page).post(grade_assignment))
        .route("/student_dashboard", get(student_dashboard))
        .route("/submit_assignment/:id", get(submit_page).post(submit_assignment))
}

async fn render_instructor_dashboard(
    state: &AppState,
    instructor: &User,
    errors: &FormErrors,
    flash: IncomingFlash,
) -> AppResult<Page> {
    let lessons = Lesson::list_by_instructor(&state.db, instructor.id).await?;
    let assignments = Assignment::list_by_instructor(&state.db, instructor.id).await?;
    let students = User::list_by_role(&state.db, Role::Student).await?;
    Ok(views::instructor_dashboard(
        instructor,
        &lessons,
        &assignments,
        &students,
        errors,
        flash,
    ))
}

#[instrument(skip_all)]
pub async fn instructor_dashboard(
    State(state): State<AppState>,
    user: CurrentUser,
    flash: IncomingFlash,
) -> AppResult<Response> {
    let instructor = user.require(Role::Instructor)?;
    Ok(render_instructor_dashboard(&state, instructor, &FormErrors::default(), flash)
        .await?
        .into_response())
}

#[instrument(skip_all)]
pub async fn inline_grade(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<InlineGradeForm>,
) -> AppResult<Response> {
    let instructor = user.require(Role::Instructor)?;
    let valid = match form.validated() {
        Ok(valid) => valid,
        Err(errors) => {
            return Ok(render_instructor_dashboard(&state, instructor, &errors, IncomingFlash(None))
                .await?
                .with_status(StatusCode::UNPROCESSABLE_ENTITY)
                .into_response())
        }
    };
    match services::update_grade(&state.db, instructor.id, valid.assignment_id, valid.grade, valid.status).await? {
        GradeOutcome::Graded(a) => {
            info!(assignment_id = a.id, status = %a.status, "assignment updated inline");
            flash::redirect(
                "/instructor_dashboard",
                Flash::success("Assignment graded successfully and status updated!"),
            )
        }
        GradeOutcome::NotFound => Err(AppError::NotFound("assignment")),
        GradeOutcome::NotOwner => {
            warn!(assignment_id = valid.assignment_id, instructor_id = instructor.id, "inline grade on foreign assignment");
            Err(AppError::Forbidden {
                home: Role::Instructor.dashboard_path(),
            })
        }
    }
}

async fn render_create(
    state: &AppState,
    instructor: &User,
    form: &CreateAssignmentForm,
    errors: &FormErrors,
) -> AppResult<Page> {
    let students = User::list_by_role(&state.db, Role::Student).await?;
    Ok(views::create_assignment(instructor, form, &students, errors))
}

#[instrument(skip_all)]
pub async fn create_assignment_page(State(state): State<AppState>, user: CurrentUser) -> AppResult<Response> {
    let instructor = user.require(Role::Instructor)?;
    Ok(render_create(&state, instructor, &CreateAssignmentForm::default(), &FormErrors::default())
        .await?
        .into_response())
}

#[instrument(skip_all)]
pub async fn create_assignment(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<CreateAssignmentForm>,
) -> AppResult<Response> {
    let instructor = user.require(Role::Instructor)?;
    let form = form.normalize();

    let checked = match form.validated() {
        Ok(valid) => match valid.student_id {
            Some(id) => {
                let is_student = User::find_by_id(&state.db, id)
                    .await?
                    .is_some_and(|u| u.role == Role::Student);
                if is_student {
                    Ok(valid)
                } else {
                    let mut errors = FormErrors::default();
                    errors.add("student_id", "Choose a student");
                    Err(errors)
                }
            }
            None => Ok(valid),
        },
        Err(errors) => Err(errors),
    };
    let valid = match checked {
        Ok(valid) => valid,
        Err(errors) => {
            return Ok(render_create(&state, instructor, &form, &errors)
                .await?
                .with_status(StatusCode::UNPROCESSABLE_ENTITY)
                .into_response())
        }
    };

    let assignment = Assignment::create(
        &state.db,
        NewAssignment {
            title: &form.title,
            description: &form.description,
            due_date: valid.due_date,
            instructor_id: instructor.id,
            student_id: valid.student_id,
        },
    )
    .await?;
    info!(assignment_id = assignment.id, instructor_id = instructor.id, "assignment created");
    flash::redirect("/instructor_dashboard", Flash::success("Assignment created successfully!"))
}

/// The assignment, provided the caller created it.
async fn owned_assignment(state: &AppState, instructor: &User, id: i64) -> AppResult<Assignment> {
    let assignment = Assignment::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("assignment"))?;
    if assignment.instructor_id != instructor.id {
        return Err(AppError::Forbidden {
            home: Role::Instructor.dashboard_path(),
        });
    }
    Ok(assignment)
}

#[instrument(skip(state, user))]
pub async fn grade_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let instructor = user.require(Role::Instructor)?;
    let assignment = owned_assignment(&state, instructor, id).await?;
    let current = assignment.grade.map(|g| g.to_string()).unwrap_or_default();
    Ok(views::grade_assignment(instructor, &assignment, &current, &FormErrors::default()).into_response())
}

#[instrument(skip(state, user, form))]
pub async fn grade_assignment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Form(form): Form<GradeForm>,
) -> AppResult<Response> {
    let instructor = user.require(Role::Instructor)?;
    let assignment = owned_assignment(&state, instructor, id).await?;
    let grade = match form.validated() {
        Ok(grade) => grade,
        Err(errors) => {
            return Ok(views::grade_assignment(instructor, &assignment, &form.grade, &errors)
                .with_status(StatusCode::UNPROCESSABLE_ENTITY)
                .into_response())
        }
    };
    match services::grade(&state.db, instructor.id, assignment.id, grade).await? {
        GradeOutcome::Graded(a) => {
            info!(assignment_id = a.id, grade, "assignment graded");
            flash::redirect("/instructor_dashboard", Flash::success("Assignment graded successfully!"))
        }
        GradeOutcome::NotFound => Err(AppError::NotFound("assignment")),
        GradeOutcome::NotOwner => Err(AppError::Forbidden {
            home: Role::Instructor.dashboard_path(),
        }),
    }
}

#[instrument(skip_all)]
pub async fn student_dashboard(
    State(state): State<AppState>,
    user: CurrentUser,
    flash: IncomingFlash,
) -> AppResult<Response> {
    let student = user.require(Role::Student)?;
    let lessons = Lesson::list_all(&state.db).await?;
    let enrolled = Lesson::enrolled_lesson_ids(&state.db, student.id).await?;
    let assignments = Assignment::list_all(&state.db).await?;
    Ok(views::student_dashboard(student, &lessons, &enrolled, &assignments, flash).into_response())
}

fn refuse(refusal: SubmitRefusal, assignment_id: i64, student_id: i64) -> AppResult<Response> {
    warn!(assignment_id, student_id, ?refusal, "submission refused");
    let message = match refusal {
        SubmitRefusal::AlreadyGraded => "This assignment has already been graded.",
        SubmitRefusal::AssignedToOther => "This assignment is assigned to another student.",
    };
    flash::redirect("/student_dashboard", Flash::warning(message))
}

/// The assignment, provided this student may open it.
async fn open_assignment(state: &AppState, student: &User, id: i64) -> AppResult<Result<Assignment, Response>> {
    let assignment = Assignment::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("assignment"))?;
    match submission_refusal(&assignment, student.id) {
        Some(refusal) => Ok(Err(refuse(refusal, id, student.id)?)),
        None => Ok(Ok(assignment)),
    }
}

#[instrument(skip(state, user))]
pub async fn submit_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let student = user.require(Role::Student)?;
    let assignment = match open_assignment(&state, student, id).await? {
        Ok(a) => a,
        Err(refused) => return Ok(refused),
    };
    let draft = assignment.submission.clone().unwrap_or_default();
    Ok(views::submit_assignment(student, &assignment, "", &draft, &FormErrors::default()).into_response())
}

#[instrument(skip(state, user, form))]
pub async fn submit_assignment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Form(form): Form<SubmitForm>,
) -> AppResult<Response> {
    let student = user.require(Role::Student)?;
    let (status, submission) = match form.validated() {
        Ok(valid) => valid,
        Err(errors) => {
            let assignment = match open_assignment(&state, student, id).await? {
                Ok(a) => a,
                Err(refused) => return Ok(refused),
            };
            return Ok(
                views::submit_assignment(student, &assignment, &form.status, &form.submission, &errors)
                    .with_status(StatusCode::UNPROCESSABLE_ENTITY)
                    .into_response(),
            );
        }
    };
    match services::submit(&state.db, student.id, id, status, submission).await? {
        SubmitOutcome::Submitted(a) => {
            info!(assignment_id = a.id, student_id = student.id, status = %a.status, "assignment submitted");
            flash::redirect("/student_dashboard", Flash::success("Assignment submitted successfully!"))
        }
        SubmitOutcome::NotFound => Err(AppError::NotFound("assignment")),
        SubmitOutcome::Refused(refusal) => refuse(refusal, id, student.id),
    }
}
