use serde::Serialize;

use crate::flash::IncomingFlash;
use crate::lessons::dto::CreateLessonForm;
use crate::lessons::repo_types::Lesson;
use crate::users::repo_types::User;
use crate::validation::FormErrors;
use crate::views::{self, Page, SelectOption};

#[derive(Serialize)]
struct CreateLesson<'a> {
    title: &'a str,
    content: &'a str,
    errors: &'a FormErrors,
}

#[derive(Serialize)]
struct LessonRef<'a> {
    id: i64,
    title: &'a str,
}

#[derive(Serialize)]
struct Enroll<'a> {
    lesson: LessonRef<'a>,
    enrolled: Vec<&'a str>,
    candidates: Vec<SelectOption>,
    errors: &'a FormErrors,
}

pub fn create_lesson(instructor: &User, form: &CreateLessonForm, errors: &FormErrors) -> Page {
    let data = CreateLesson {
        title: &form.title,
        content: &form.content,
        errors,
    };
    Page::new("Create Lesson", "create_lesson", data).with_user(instructor)
}

pub fn enroll_student(
    instructor: &User,
    lesson: &Lesson,
    enrolled: &[User],
    candidates: &[User],
    errors: &FormErrors,
    flash: IncomingFlash,
) -> Page {
    let data = Enroll {
        lesson: LessonRef {
            id: lesson.id,
            title: &lesson.title,
        },
        enrolled: enrolled.iter().map(|s| s.username.as_str()).collect(),
        candidates: views::options(
            candidates.iter().map(|s| (s.id.to_string(), s.username.clone())),
            "",
        ),
        errors,
    };
    Page::new("Enroll Student", "enroll_student", data)
        .with_user(instructor)
        .with_flash(flash)
}
