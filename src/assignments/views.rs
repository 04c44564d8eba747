use serde::Serialize;
use time::PrimitiveDateTime;

use crate::assignments::dto::{CreateAssignmentForm, STUDENT_STATUSES};
use crate::assignments::repo_types::{Assignment, AssignmentStatus};
use crate::assignments::services::submission_refusal;
use crate::flash::IncomingFlash;
use crate::lessons::repo_types::Lesson;
use crate::users::repo_types::User;
use crate::validation::{format_due_date, FormErrors};
use crate::views::{self, Page, SelectOption};

fn due(dt: PrimitiveDateTime) -> String {
    format_due_date(dt).replace('T', " ")
}

fn grade_text(grade: Option<f64>) -> String {
    grade.map(|g| g.to_string()).unwrap_or_default()
}

fn status_options(statuses: &[AssignmentStatus], selected: &str) -> Vec<SelectOption> {
    views::options(
        statuses
            .iter()
            .map(|s| (s.as_str().to_string(), s.label().to_string())),
        selected,
    )
}

#[derive(Serialize)]
struct LessonItem<'a> {
    id: i64,
    title: &'a str,
    content: &'a str,
    enrolled: bool,
}

#[derive(Serialize)]
struct InstructorRow<'a> {
    id: i64,
    title: &'a str,
    due: String,
    student: &'a str,
    status: &'static str,
    grade: String,
    statuses: Vec<SelectOption>,
}

#[derive(Serialize)]
struct InstructorDashboard<'a> {
    lessons: Vec<LessonItem<'a>>,
    assignments: Vec<InstructorRow<'a>>,
    errors: &'a FormErrors,
}

pub fn instructor_dashboard(
    instructor: &User,
    lessons: &[Lesson],
    assignments: &[Assignment],
    students: &[User],
    errors: &FormErrors,
    flash: IncomingFlash,
) -> Page {
    let student_name = |id: Option<i64>| {
        id.and_then(|id| students.iter().find(|u| u.id == id))
            .map(|u| u.username.as_str())
            .unwrap_or("-")
    };
    let data = InstructorDashboard {
        lessons: lessons
            .iter()
            .map(|l| LessonItem {
                id: l.id,
                title: &l.title,
                content: &l.content,
                enrolled: false,
            })
            .collect(),
        assignments: assignments
            .iter()
            .map(|a| InstructorRow {
                id: a.id,
                title: &a.title,
                due: due(a.due_date),
                student: student_name(a.student_id),
                status: a.status.label(),
                grade: grade_text(a.grade),
                statuses: status_options(&AssignmentStatus::ALL, a.status.as_str()),
            })
            .collect(),
        errors,
    };
    Page::new("Instructor Dashboard", "instructor_dashboard", data)
        .with_user(instructor)
        .with_flash(flash)
}

#[derive(Serialize)]
struct CreateAssignment<'a> {
    title: &'a str,
    description: &'a str,
    due_date: &'a str,
    students: Vec<SelectOption>,
    errors: &'a FormErrors,
}

pub fn create_assignment(
    instructor: &User,
    form: &CreateAssignmentForm,
    students: &[User],
    errors: &FormErrors,
) -> Page {
    let choices = std::iter::once((String::new(), "Unassigned".to_string()))
        .chain(students.iter().map(|s| (s.id.to_string(), s.username.clone())));
    let data = CreateAssignment {
        title: &form.title,
        description: &form.description,
        due_date: &form.due_date,
        students: views::options(choices, &form.student_id),
        errors,
    };
    Page::new("Create Assignment", "create_assignment", data).with_user(instructor)
}

#[derive(Serialize)]
struct Summary<'a> {
    id: i64,
    description: &'a str,
    due: String,
    status: &'static str,
    grade: String,
    submission: Option<&'a str>,
}

fn summary(a: &Assignment) -> Summary<'_> {
    Summary {
        id: a.id,
        description: &a.description,
        due: due(a.due_date),
        status: a.status.label(),
        grade: grade_text(a.grade),
        submission: a.submission.as_deref(),
    }
}

#[derive(Serialize)]
struct GradePage<'a> {
    assignment: Summary<'a>,
    grade: &'a str,
    errors: &'a FormErrors,
}

pub fn grade_assignment(instructor: &User, a: &Assignment, grade: &str, errors: &FormErrors) -> Page {
    let data = GradePage {
        assignment: summary(a),
        grade,
        errors,
    };
    Page::new(format!("Grade: {}", a.title), "grade_assignment", data).with_user(instructor)
}

#[derive(Serialize)]
struct StudentRow<'a> {
    id: i64,
    title: &'a str,
    due: String,
    status: &'static str,
    grade: String,
    open: bool,
}

#[derive(Serialize)]
struct StudentDashboard<'a> {
    lessons: Vec<LessonItem<'a>>,
    assignments: Vec<StudentRow<'a>>,
}

/// Every lesson and assignment is listed; grades and the submit link are only
/// shown for work the student may open.
pub fn student_dashboard(
    student: &User,
    lessons: &[Lesson],
    enrolled: &[i64],
    assignments: &[Assignment],
    flash: IncomingFlash,
) -> Page {
    let data = StudentDashboard {
        lessons: lessons
            .iter()
            .map(|l| LessonItem {
                id: l.id,
                title: &l.title,
                content: &l.content,
                enrolled: enrolled.contains(&l.id),
            })
            .collect(),
        assignments: assignments
            .iter()
            .map(|a| {
                let own = a.student_id == Some(student.id);
                StudentRow {
                    id: a.id,
                    title: &a.title,
                    due: due(a.due_date),
                    status: a.status.label(),
                    grade: if own { grade_text(a.grade) } else { String::new() },
                    open: submission_refusal(a, student.id).is_none(),
                }
            })
            .collect(),
    };
    Page::new("Student Dashboard", "student_dashboard", data)
        .with_user(student)
        .with_flash(flash)
}

#[derive(Serialize)]
struct SubmitPage<'a> {
    assignment: Summary<'a>,
    submission: &'a str,
    statuses: Vec<SelectOption>,
    errors: &'a FormErrors,
}

/// Callers must have checked `submission_refusal` first: the summary shows
/// the stored submission text.
pub fn submit_assignment(
    student: &User,
    a: &Assignment,
    status: &str,
    submission: &str,
    errors: &FormErrors,
) -> Page {
    let status = if status.is_empty() { AssignmentStatus::Submitted.as_str() } else { status };
    let data = SubmitPage {
        assignment: summary(a),
        submission,
        statuses: status_options(&STUDENT_STATUSES, status),
        errors,
    };
    Page::new(format!("Submit: {}", a.title), "submit_assignment", data).with_user(student)
}
