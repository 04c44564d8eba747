use axum::{
    extract::{FromRef, Query, State},
    http::{header::SET_COOKIE, StatusCode},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{LoginForm, LoginQuery},
    extractors::{CurrentUser, MaybeUser},
    password::verify_password,
    session::{SessionKeys, SESSION_COOKIE},
    views,
};
use crate::{
    cookies::{clear_cookie, set_cookie},
    error::AppResult,
    flash::{self, Flash, IncomingFlash},
    state::AppState,
    users::repo_types::User,
    validation::FormErrors,
};

pub const INVALID_CREDENTIALS: &str = "Invalid username or password";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
}

/// Only same-site absolute paths are followed after login.
fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
}

pub async fn home() -> Redirect {
    Redirect::to("/login")
}

#[instrument(skip_all)]
pub async fn login_page(
    MaybeUser(current): MaybeUser,
    Query(q): Query<LoginQuery>,
    flash: IncomingFlash,
) -> Response {
    if let Some(user) = current {
        return Redirect::to(user.role.dashboard_path()).into_response();
    }
    views::login("", &FormErrors::default(), safe_next(q.next.as_deref()), flash, None).into_response()
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    MaybeUser(current): MaybeUser,
    Query(q): Query<LoginQuery>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    if let Some(user) = current {
        return Ok(Redirect::to(user.role.dashboard_path()).into_response());
    }
    let next = safe_next(q.next.as_deref());

    let errors = FormErrors::check(&form);
    if !errors.is_empty() {
        return Ok(views::login(&form.username, &errors, next, IncomingFlash(None), None)
            .with_status(StatusCode::UNPROCESSABLE_ENTITY)
            .into_response());
    }

    let user = User::find_by_username(&state.db, &form.username).await?;
    let verified = match &user {
        Some(u) => verify_password(&form.password, &u.password_hash)?,
        None => false,
    };
    let Some(user) = user.filter(|_| verified) else {
        warn!(username = %form.username, "login rejected");
        return Ok(views::login(
            &form.username,
            &FormErrors::default(),
            next,
            IncomingFlash(None),
            Some(Flash::danger(INVALID_CREDENTIALS)),
        )
        .with_status(StatusCode::UNAUTHORIZED)
        .into_response());
    };

    let keys = SessionKeys::from_ref(&state);
    let token = keys.sign(user.id)?;
    let cookie = set_cookie(SESSION_COOKIE, &token, Some(keys.max_age_secs()), keys.cookie_secure)?;
    let target = next.unwrap_or(user.role.dashboard_path());

    info!(user_id = user.id, role = user.role.as_str(), "user logged in");
    Ok((AppendHeaders([(SET_COOKIE, cookie)]), Redirect::to(target)).into_response())
}

#[instrument(skip_all)]
pub async fn logout(CurrentUser(user): CurrentUser) -> AppResult<Response> {
    let mut res = flash::redirect("/login", Flash::info("You have been logged out."))?;
    res.headers_mut().append(SET_COOKIE, clear_cookie(SESSION_COOKIE)?);
    info!(user_id = user.id, "user logged out");
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_must_stay_on_site() {
        assert_eq!(safe_next(Some("/create_lesson")), Some("/create_lesson"));
        assert_eq!(safe_next(Some("//evil.example")), None);
        assert_eq!(safe_next(Some("https://evil.example")), None);
        assert_eq!(safe_next(Some("/\\evil")), None);
        assert_eq!(safe_next(None), None);
    }
}
