use axum::{
    http::{header::InvalidHeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use tracing::error;

use crate::flash::{self, Flash};
use crate::views::Page;

pub const PERMISSION_DENIED: &str = "You do not have permission to access this page.";

/// Request-level failures. Form validation problems are not errors: handlers
/// re-render the form instead.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("authentication required for {next}")]
    Unauthenticated { next: String },

    #[error("role not allowed here")]
    Forbidden { home: &'static str },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Header(#[from] InvalidHeaderValue),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthenticated { next } => {
                Redirect::to(&format!("/login?next={}", urlencoding::encode(&next))).into_response()
            }
            AppError::Forbidden { home } => match flash::redirect(home, Flash::danger(PERMISSION_DENIED)) {
                Ok(res) => res,
                Err(_) => Redirect::to(home).into_response(),
            },
            AppError::NotFound(what) => Page::new("Not found", "not_found", json!({ "what": what }))
                .with_status(StatusCode::NOT_FOUND)
                .into_response(),
            AppError::Header(e) => internal_page(&e.to_string()),
            AppError::Internal(e) => internal_page(&format!("{:#}", e)),
        }
    }
}

fn internal_page(detail: &str) -> Response {
    error!(error = %detail, "request failed");
    Page::new("Server error", "server_error", ())
        .with_status(StatusCode::INTERNAL_SERVER_ERROR)
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthenticated_redirects_to_login_with_next() {
        let res = AppError::Unauthenticated {
            next: "/grade_assignment/3".into(),
        }
        .into_response();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()["location"], "/login?next=%2Fgrade_assignment%2F3");
    }

    #[test]
    fn forbidden_redirects_home_with_notice() {
        let res = AppError::Forbidden {
            home: "/student_dashboard",
        }
        .into_response();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()["location"], "/student_dashboard");
        assert!(res.headers().contains_key(axum::http::header::SET_COOKIE));
    }

    #[test]
    fn not_found_and_internal_statuses() {
        assert_eq!(
            AppError::NotFound("assignment").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
