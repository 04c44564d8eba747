use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use time::{format_description::FormatItem, macros::format_description, PrimitiveDateTime};
use validator::{Validate, ValidationErrors};

/// `datetime-local` input format used by the assignment forms.
pub const DUE_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]");

/// Field name to messages, in field order. Serializes as a plain map so
/// templates can read `errors.<field>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub const GENERAL: &'static str = "general";

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn for_field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Run the derived `validator` rules for a form.
    pub fn check<T: Validate>(form: &T) -> Self {
        match form.validate() {
            Ok(()) => Self::default(),
            Err(e) => e.into(),
        }
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(e: ValidationErrors) -> Self {
        let mut out = FormErrors::default();
        for (field, errs) in e.field_errors() {
            let field = field.to_string();
            for err in errs {
                let msg = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid {}", field));
                out.add(&field, msg);
            }
        }
        out
    }
}

pub fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9._@-]+$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

pub fn parse_due_date(raw: &str) -> Option<PrimitiveDateTime> {
    PrimitiveDateTime::parse(raw.trim(), DUE_DATE_FORMAT).ok()
}

pub fn format_due_date(dt: PrimitiveDateTime) -> String {
    dt.format(DUE_DATE_FORMAT).unwrap_or_default()
}

/// A grade is any finite number; the value is stored as entered.
pub fn parse_grade(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|g| g.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[derive(Validate)]
    struct NameForm {
        #[validate(length(min = 3, message = "Too short"))]
        name: String,
    }

    #[test]
    fn validator_messages_become_field_errors() {
        let errors = FormErrors::check(&NameForm { name: "ab".into() });
        assert_eq!(errors.for_field("name"), ["Too short".to_string()]);
        assert!(FormErrors::check(&NameForm { name: "abc".into() }).is_empty());
    }

    #[test]
    fn username_charset() {
        assert!(is_valid_username("ADM-001"));
        assert!(is_valid_username("jane.doe@school"));
        assert!(!is_valid_username("jane doe"));
        assert!(!is_valid_username("<b>"));
        assert!(!is_valid_username(""));
    }

    #[test]
    fn due_date_uses_datetime_local_format() {
        let dt = parse_due_date("2026-11-01T09:30").expect("parses");
        assert_eq!(dt, datetime!(2026-11-01 09:30));
        assert_eq!(format_due_date(dt), "2026-11-01T09:30");
        assert!(parse_due_date("01/11/2026").is_none());
        assert!(parse_due_date("").is_none());
    }

    #[test]
    fn grade_parsing() {
        assert_eq!(parse_grade(" 87.5 "), Some(87.5));
        assert_eq!(parse_grade("100"), Some(100.0));
        assert_eq!(parse_grade("A+"), None);
        assert_eq!(parse_grade("NaN"), None);
        assert_eq!(parse_grade("inf"), None);
    }
}
