//! One-shot notices carried across a redirect in a short-lived cookie.
//!
//! The cookie value is `level:url-encoded message`. A page that renders the
//! notice also clears the cookie, so each notice is shown once.

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::SET_COOKIE, request::Parts},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};

use crate::cookies::{parse_cookie, set_cookie};
use crate::error::AppError;

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Warning,
    Danger,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Danger => "danger",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Level::Success),
            "info" => Some(Level::Info),
            "warning" => Some(Level::Warning),
            "danger" => Some(Level::Danger),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

impl Flash {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Level::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Level::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Level::Warning, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(Level::Danger, message)
    }

    fn encode(&self) -> String {
        format!("{}:{}", self.level.as_str(), urlencoding::encode(&self.message))
    }

    fn decode(raw: &str) -> Option<Self> {
        let (level, message) = raw.split_once(':')?;
        let level = Level::parse(level)?;
        let message = urlencoding::decode(message).ok()?.into_owned();
        Some(Self { level, message })
    }
}

/// 303 redirect that leaves a notice for the next rendered page.
pub fn redirect(to: &str, flash: Flash) -> Result<Response, AppError> {
    let cookie = set_cookie(FLASH_COOKIE, &flash.encode(), None, false)?;
    Ok((AppendHeaders([(SET_COOKIE, cookie)]), Redirect::to(to)).into_response())
}

/// The notice left by the previous response, if any.
#[derive(Debug, Clone, Default)]
pub struct IncomingFlash(pub Option<Flash>);

#[async_trait]
impl<S> FromRequestParts<S> for IncomingFlash
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(IncomingFlash(
            parse_cookie(&parts.headers, FLASH_COOKIE).and_then(|raw| Flash::decode(&raw)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn encoded_notice_survives_cookie_charset() {
        let flash = Flash::success("User ADM-001 updated; all good!");
        let raw = flash.encode();
        assert!(!raw.contains(' '));
        assert!(!raw.contains(';'));
        assert_eq!(Flash::decode(&raw), Some(flash));
    }

    #[test]
    fn decode_rejects_unknown_level() {
        assert_eq!(Flash::decode("shout:hello"), None);
        assert_eq!(Flash::decode("no-separator"), None);
    }

    #[test]
    fn redirect_sets_cookie_and_location() {
        let res = redirect("/login", Flash::info("You have been logged out.")).expect("response");
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()["location"], "/login");
        let cookie = res.headers()[SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("flash=info:"));
    }
}
