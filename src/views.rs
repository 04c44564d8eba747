//! Server-rendered pages. Templates are compiled into the binary, registered
//! with handlebars once, and every page body is rendered into `layout`.

use anyhow::anyhow;
use axum::{
    http::{header::SET_COOKIE, StatusCode},
    response::{AppendHeaders, Html, IntoResponse, Response},
};
use handlebars::{to_json, Handlebars, JsonValue};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::error;

use crate::cookies::clear_cookie;
use crate::flash::{Flash, IncomingFlash, FLASH_COOKIE};
use crate::users::repo_types::User;

static TEMPLATES: OnceCell<Handlebars<'static>> = OnceCell::new();

const SOURCES: &[(&str, &str)] = &[
    ("layout", include_str!("../templates/layout.html")),
    ("login", include_str!("../templates/login.html")),
    ("admin_dashboard", include_str!("../templates/admin_dashboard.html")),
    ("create_user", include_str!("../templates/create_user.html")),
    ("user_form", include_str!("../templates/user_form.html")),
    ("edit_user", include_str!("../templates/edit_user.html")),
    ("create_lesson", include_str!("../templates/create_lesson.html")),
    ("enroll_student", include_str!("../templates/enroll_student.html")),
    ("instructor_dashboard", include_str!("../templates/instructor_dashboard.html")),
    ("create_assignment", include_str!("../templates/create_assignment.html")),
    ("assignment_summary", include_str!("../templates/assignment_summary.html")),
    ("grade_assignment", include_str!("../templates/grade_assignment.html")),
    ("student_dashboard", include_str!("../templates/student_dashboard.html")),
    ("submit_assignment", include_str!("../templates/submit_assignment.html")),
    ("not_found", include_str!("../templates/not_found.html")),
    ("server_error", include_str!("../templates/server_error.html")),
];

/// Served when a template itself fails to render.
static ERROR_500: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Server error - EduLearner</title></head>
<body>
<h1>Server error</h1>
<p>Something went wrong. Please try again.</p>
</body>
</html>
"#;

fn registry() -> anyhow::Result<&'static Handlebars<'static>> {
    TEMPLATES.get_or_try_init(|| {
        let mut h = Handlebars::new();
        for (name, source) in SOURCES {
            h.register_template_string(name, *source)
                .map_err(|e| anyhow!("register template {:?}: {}", name, e))?;
        }
        Ok(h)
    })
}

/// Compile every template up front so a broken one stops startup.
pub fn init() -> anyhow::Result<()> {
    registry().map(|_| ())
}

/// One `<option>` of a select box.
#[derive(Debug, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

pub fn options<I>(items: I, selected: &str) -> Vec<SelectOption>
where
    I: IntoIterator<Item = (String, String)>,
{
    items
        .into_iter()
        .map(|(value, label)| SelectOption {
            selected: value == selected,
            value,
            label,
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct Viewer {
    username: String,
    role: &'static str,
    dashboard: &'static str,
}

#[derive(Debug, Serialize)]
struct Notice<'a> {
    level: &'static str,
    message: &'a str,
}

#[derive(Serialize)]
struct Layout<'a> {
    title: &'a str,
    viewer: Option<&'a Viewer>,
    flash: Option<Notice<'a>>,
    body: String,
}

pub struct Page {
    title: String,
    template: &'static str,
    data: JsonValue,
    status: StatusCode,
    flash: Option<Flash>,
    viewer: Option<Viewer>,
}

impl Page {
    pub fn new(title: impl Into<String>, template: &'static str, data: impl Serialize) -> Self {
        Self {
            title: title.into(),
            template,
            data: to_json(data),
            status: StatusCode::OK,
            flash: None,
            viewer: None,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_flash(mut self, flash: IncomingFlash) -> Self {
        self.flash = flash.0;
        self
    }

    /// Show a notice produced by this same request (no cookie involved).
    pub fn with_notice(mut self, flash: Flash) -> Self {
        self.flash = Some(flash);
        self
    }

    pub fn with_user(mut self, user: &User) -> Self {
        self.viewer = Some(Viewer {
            username: user.username.clone(),
            role: user.role.label(),
            dashboard: user.role.dashboard_path(),
        });
        self
    }

    fn render(&self) -> anyhow::Result<String> {
        let h = registry()?;
        let body = h
            .render(self.template, &self.data)
            .map_err(|e| anyhow!("render {}: {}", self.template, e))?;
        let layout = Layout {
            title: &self.title,
            viewer: self.viewer.as_ref(),
            flash: self.flash.as_ref().map(|f| Notice {
                level: f.level.as_str(),
                message: &f.message,
            }),
            body,
        };
        h.render("layout", &layout)
            .map_err(|e| anyhow!("render layout: {}", e))
    }
}

impl IntoResponse for Page {
    fn into_response(self) -> Response {
        let html = match self.render() {
            Ok(html) => Html(html),
            Err(e) => {
                error!(error = %e, template = self.template, "page render failed");
                return (StatusCode::INTERNAL_SERVER_ERROR, Html(ERROR_500)).into_response();
            }
        };
        // A shown notice is consumed.
        match (self.flash.is_some(), clear_cookie(FLASH_COOKIE)) {
            (true, Ok(clear)) => (self.status, AppendHeaders([(SET_COOKIE, clear)]), html).into_response(),
            _ => (self.status, html).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_template_compiles() {
        init().expect("templates register");
        let h = registry().unwrap();
        for (name, _) in SOURCES {
            assert!(h.get_template(name).is_some(), "missing {}", name);
        }
    }

    #[test]
    fn interpolated_values_are_escaped() {
        let html = Page::new("<b>Home</b>", "not_found", json!({ "what": "<script>alert(1)</script>" }))
            .render()
            .unwrap();
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;b&gt;Home&lt;/b&gt;"));
    }

    #[test]
    fn select_marks_current_option() {
        let opts = options(
            [
                ("INSTRUCTOR".to_string(), "Instructor".to_string()),
                ("STUDENT".to_string(), "Student".to_string()),
            ],
            "STUDENT",
        );
        assert!(!opts[0].selected);
        assert!(opts[1].selected);
    }

    #[test]
    fn layout_shows_viewer_and_notice() {
        let user = User {
            id: 1,
            username: "ADM-001".into(),
            password_hash: String::new(),
            role: crate::users::repo_types::Role::Admin,
            created_at: time::OffsetDateTime::UNIX_EPOCH,
        };
        let html = Page::new("Home", "server_error", ())
            .with_user(&user)
            .with_notice(Flash::success("Saved & done"))
            .render()
            .unwrap();
        assert!(html.contains(r#"href="/admin_dashboard""#));
        assert!(html.contains("ADM-001 (Admin)"));
        assert!(html.contains("flash-success"));
        assert!(html.contains("Saved &amp; done"));
    }

    #[test]
    fn shown_notice_clears_cookie() {
        let res = Page::new("Home", "server_error", ())
            .with_notice(Flash::success("done"))
            .into_response();
        let cookie = res.headers()[SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("flash=;"));
    }
}
