use serde::Serialize;

use crate::flash::IncomingFlash;
use crate::users::dto::{CreateUserForm, EditUserForm, CREATABLE_ROLES};
use crate::users::repo_types::{Role, User};
use crate::validation::FormErrors;
use crate::views::{self, Page, SelectOption};

#[derive(Serialize)]
struct UserForm<'a> {
    action: String,
    username: &'a str,
    password_label: &'static str,
    roles: Vec<SelectOption>,
    submit: &'static str,
    errors: &'a FormErrors,
}

#[derive(Serialize)]
struct UserRow<'a> {
    id: i64,
    username: &'a str,
    role: &'static str,
}

#[derive(Serialize)]
struct AdminDashboard<'a> {
    users: Vec<UserRow<'a>>,
    form: UserForm<'a>,
}

#[derive(Serialize)]
struct FormOnly<'a> {
    form: UserForm<'a>,
}

fn role_options(roles: &[Role], selected: &str) -> Vec<SelectOption> {
    views::options(
        roles
            .iter()
            .map(|r| (r.as_str().to_string(), r.label().to_string())),
        selected,
    )
}

fn create_form<'a>(action: &str, form: &'a CreateUserForm, errors: &'a FormErrors) -> UserForm<'a> {
    let role = if form.role.is_empty() { Role::Student.as_str() } else { form.role.as_str() };
    UserForm {
        action: action.to_string(),
        username: &form.username,
        password_label: "Password",
        roles: role_options(&CREATABLE_ROLES, role),
        submit: "Create User",
        errors,
    }
}

pub fn admin_dashboard(
    admin: &User,
    users: &[User],
    form: &CreateUserForm,
    errors: &FormErrors,
    flash: IncomingFlash,
) -> Page {
    let data = AdminDashboard {
        users: users
            .iter()
            .map(|u| UserRow {
                id: u.id,
                username: &u.username,
                role: u.role.label(),
            })
            .collect(),
        form: create_form("/admin_dashboard", form, errors),
    };
    Page::new("Admin Dashboard", "admin_dashboard", data)
        .with_user(admin)
        .with_flash(flash)
}

pub fn create_user(admin: &User, form: &CreateUserForm, errors: &FormErrors) -> Page {
    let data = FormOnly {
        form: create_form("/create_user", form, errors),
    };
    Page::new("Create User", "create_user", data).with_user(admin)
}

pub fn edit_user(admin: &User, target_id: i64, form: &EditUserForm, errors: &FormErrors) -> Page {
    let data = FormOnly {
        form: UserForm {
            action: format!("/edit_user/{}", target_id),
            username: &form.username,
            password_label: "New Password (leave blank to keep)",
            roles: role_options(&Role::ALL, &form.role),
            submit: "Save",
            errors,
        },
    };
    Page::new(format!("Edit User {}", form.username), "edit_user", data).with_user(admin)
}
