use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Form, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{CreateLessonForm, EnrollForm},
    repo_types::Lesson,
    views,
};
use crate::{
    auth::extractors::CurrentUser,
    error::{AppError, AppResult},
    flash::{self, Flash, IncomingFlash},
    state::AppState,
    users::repo_types::{Role, User},
    validation::FormErrors,
};

pub fn lesson_routes() -> Router<AppState> {
    Router::new()
        .route("/create_lesson", get(create_lesson_page).post(create_lesson))
        .route("/enroll_student/:lesson_id", get(enroll_page).post(enroll_student))
}

#[instrument(skip_all)]
pub async fn create_lesson_page(user: CurrentUser) -> AppResult<Response> {
    let instructor = user.require(Role::Instructor)?;
    Ok(views::create_lesson(instructor, &CreateLessonForm::default(), &FormErrors::default()).into_response())
}

#[instrument(skip_all)]
pub async fn create_lesson(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<CreateLessonForm>,
) -> AppResult<Response> {
    let instructor = user.require(Role::Instructor)?;
    let form = form.normalize();
    let errors = FormErrors::check(&form);
    if !errors.is_empty() {
        return Ok(views::create_lesson(instructor, &form, &errors)
            .with_status(StatusCode::UNPROCESSABLE_ENTITY)
            .into_response());
    }
    let lesson = Lesson::create(&state.db, instructor.id, &form.title, &form.content).await?;
    info!(lesson_id = lesson.id, instructor_id = instructor.id, "lesson created");
    flash::redirect("/instructor_dashboard", Flash::success("Lesson created successfully!"))
}

/// The lesson, provided the caller owns it.
async fn owned_lesson(state: &AppState, instructor: &User, lesson_id: i64) -> AppResult<Lesson> {
    let lesson = Lesson::find_by_id(&state.db, lesson_id)
        .await?
        .ok_or(AppError::NotFound("lesson"))?;
    if lesson.instructor_id != instructor.id {
        return Err(AppError::Forbidden {
            home: Role::Instructor.dashboard_path(),
        });
    }
    Ok(lesson)
}

async fn render_enroll(
    state: &AppState,
    instructor: &User,
    lesson: &Lesson,
    errors: &FormErrors,
    flash: IncomingFlash,
) -> AppResult<crate::views::Page> {
    let enrolled = Lesson::enrolled_students(&state.db, lesson.id).await?;
    let candidates: Vec<User> = User::list_by_role(&state.db, Role::Student)
        .await?
        .into_iter()
        .filter(|s| !enrolled.iter().any(|e| e.id == s.id))
        .collect();
    Ok(views::enroll_student(instructor, lesson, &enrolled, &candidates, errors, flash))
}

#[instrument(skip(state, user, flash))]
pub async fn enroll_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(lesson_id): Path<i64>,
    flash: IncomingFlash,
) -> AppResult<Response> {
    let instructor = user.require(Role::Instructor)?;
    let lesson = owned_lesson(&state, instructor, lesson_id).await?;
    Ok(render_enroll(&state, instructor, &lesson, &FormErrors::default(), flash)
        .await?
        .into_response())
}

#[instrument(skip(state, user, form))]
pub async fn enroll_student(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(lesson_id): Path<i64>,
    Form(form): Form<EnrollForm>,
) -> AppResult<Response> {
    let instructor = user.require(Role::Instructor)?;
    let lesson = owned_lesson(&state, instructor, lesson_id).await?;

    let student = match form.student_id.trim().parse::<i64>() {
        Ok(id) => User::find_by_id(&state.db, id).await?,
        Err(_) => None,
    }
    .filter(|u| u.role == Role::Student);

    let Some(student) = student else {
        let mut errors = FormErrors::default();
        errors.add("student_id", "Choose a student");
        return Ok(render_enroll(&state, instructor, &lesson, &errors, IncomingFlash(None))
            .await?
            .with_status(StatusCode::UNPROCESSABLE_ENTITY)
            .into_response());
    };

    let added = Lesson::enroll(&state.db, lesson.id, student.id).await?;
    info!(lesson_id = lesson.id, student_id = student.id, added, "student enrolled");
    let message = if added {
        format!("{} enrolled in {}.", student.username, lesson.title)
    } else {
        format!("{} is already enrolled in {}.", student.username, lesson.title)
    };
    flash::redirect(&format!("/enroll_student/{}", lesson.id), Flash::success(message))
}
