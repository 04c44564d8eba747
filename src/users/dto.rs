use serde::Deserialize;
use validator::Validate;

use crate::users::repo_types::Role;
use crate::validation::{is_valid_username, FormErrors};

/// Roles an administrator may hand out when creating an account.
pub const CREATABLE_ROLES: [Role; 2] = [Role::Instructor, Role::Student];

#[derive(Debug, Default, Clone, Deserialize, Validate)]
pub struct CreateUserForm {
    #[serde(default)]
    #[validate(length(min = 4, max = 80, message = "Username must be between 4 and 80 characters"))]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub role: String,
}

/// Blank password keeps the current one.
#[derive(Debug, Default, Clone, Deserialize, Validate)]
pub struct EditUserForm {
    #[serde(default)]
    #[validate(length(min = 4, max = 80, message = "Username must be between 4 and 80 characters"))]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub role: String,
}

fn check_username(username: &str, errors: &mut FormErrors) {
    if !username.is_empty() && !is_valid_username(username) {
        errors.add(
            "username",
            "Username may only contain letters, digits and . _ @ -",
        );
    }
}

fn check_confirmation(password: &str, confirm: &str, errors: &mut FormErrors) {
    if password != confirm {
        errors.add("confirm_password", "Passwords must match");
    }
}

fn parse_role(raw: &str, allowed: &[Role], errors: &mut FormErrors) -> Option<Role> {
    match raw.parse::<Role>() {
        Ok(role) if allowed.contains(&role) => Some(role),
        _ => {
            errors.add("role", "Choose a valid role");
            None
        }
    }
}

impl CreateUserForm {
    pub fn normalize(mut self) -> Self {
        self.username = self.username.trim().to_string();
        self
    }

    pub fn validated(&self) -> Result<Role, FormErrors> {
        let mut errors = FormErrors::check(self);
        check_username(&self.username, &mut errors);
        check_confirmation(&self.password, &self.confirm_password, &mut errors);
        let role = parse_role(&self.role, &CREATABLE_ROLES, &mut errors);
        match role {
            Some(role) if errors.is_empty() => Ok(role),
            _ => Err(errors),
        }
    }
}

impl EditUserForm {
    pub fn normalize(mut self) -> Self {
        self.username = self.username.trim().to_string();
        self
    }

    /// Returns the new role and, when one was entered, the new password.
    pub fn validated(&self) -> Result<(Role, Option<&str>), FormErrors> {
        let mut errors = FormErrors::check(self);
        check_username(&self.username, &mut errors);
        let password = if self.password.is_empty() {
            if !self.confirm_password.is_empty() {
                errors.add("password", "Enter the new password as well");
            }
            None
        } else {
            if self.password.chars().count() < 8 {
                errors.add("password", "Password must be at least 8 characters");
            }
            check_confirmation(&self.password, &self.confirm_password, &mut errors);
            Some(self.password.as_str())
        };
        let role = parse_role(&self.role, &Role::ALL, &mut errors);
        match role {
            Some(role) if errors.is_empty() => Ok((role, password)),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(username: &str, password: &str, confirm: &str, role: &str) -> CreateUserForm {
        CreateUserForm {
            username: username.into(),
            password: password.into(),
            confirm_password: confirm.into(),
            role: role.into(),
        }
        .normalize()
    }

    #[test]
    fn valid_create_form_yields_role() {
        let form = create(" stud01 ", "password1", "password1", "STUDENT");
        assert_eq!(form.username, "stud01");
        assert_eq!(form.validated(), Ok(Role::Student));
    }

    #[test]
    fn create_form_collects_every_problem() {
        let errors = create("ab", "short", "other", "ADMIN").validated().unwrap_err();
        assert!(!errors.for_field("username").is_empty());
        assert!(!errors.for_field("password").is_empty());
        assert_eq!(errors.for_field("confirm_password"), ["Passwords must match".to_string()]);
        assert_eq!(errors.for_field("role"), ["Choose a valid role".to_string()]);
    }

    #[test]
    fn create_form_rejects_odd_characters() {
        let errors = create("bad name", "password1", "password1", "INSTRUCTOR")
            .validated()
            .unwrap_err();
        assert_eq!(errors.for_field("username").len(), 1);
    }

    #[test]
    fn edit_form_blank_password_keeps_current() {
        let form = EditUserForm {
            username: "inst01".into(),
            password: String::new(),
            confirm_password: String::new(),
            role: "ADMIN".into(),
        };
        assert_eq!(form.validated(), Ok((Role::Admin, None)));
    }

    #[test]
    fn edit_form_new_password_must_be_confirmed() {
        let form = EditUserForm {
            username: "inst01".into(),
            password: "longenough".into(),
            confirm_password: "different1".into(),
            role: "INSTRUCTOR".into(),
        };
        let errors = form.validated().unwrap_err();
        assert_eq!(errors.for_field("confirm_password").len(), 1);
    }
}
