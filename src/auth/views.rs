use serde::Serialize;

use crate::flash::{Flash, IncomingFlash};
use crate::validation::FormErrors;
use crate::views::Page;

#[derive(Serialize)]
struct LoginView<'a> {
    action: String,
    username: &'a str,
    errors: &'a FormErrors,
}

pub fn login(
    username: &str,
    errors: &FormErrors,
    next: Option<&str>,
    flash: IncomingFlash,
    notice: Option<Flash>,
) -> Page {
    let action = match next {
        Some(n) => format!("/login?next={}", urlencoding::encode(n)),
        None => "/login".to_string(),
    };
    let page = Page::new(
        "Login",
        "login",
        LoginView {
            action,
            username,
            errors,
        },
    )
    .with_flash(flash);
    match notice {
        Some(n) => page.with_notice(n),
        None => page,
    }
}
