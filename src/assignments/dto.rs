use serde::Deserialize;
use time::PrimitiveDateTime;
use validator::Validate;

use crate::assignments::repo_types::AssignmentStatus;
use crate::validation::{parse_due_date, parse_grade, FormErrors};

/// Statuses a student may pick when submitting.
pub const STUDENT_STATUSES: [AssignmentStatus; 2] =
    [AssignmentStatus::InProgress, AssignmentStatus::Submitted];

#[derive(Debug, Default, Clone, Deserialize, Validate)]
pub struct CreateAssignmentForm {
    #[serde(default)]
    #[validate(length(min = 3, max = 200, message = "Title must be between 3 and 200 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[serde(default)]
    pub due_date: String,
    /// Optional assignee; empty means unassigned.
    #[serde(default)]
    pub student_id: String,
}

pub struct ValidAssignment {
    pub due_date: PrimitiveDateTime,
    pub student_id: Option<i64>,
}

impl CreateAssignmentForm {
    pub fn normalize(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.description = self.description.trim().to_string();
        self
    }

    /// Field checks only; whether `student_id` names a student is checked against the store.
    pub fn validated(&self) -> Result<ValidAssignment, FormErrors> {
        let mut errors = FormErrors::check(self);
        let due_date = if self.due_date.trim().is_empty() {
            errors.add("due_date", "Due date is required");
            None
        } else {
            let parsed = parse_due_date(&self.due_date);
            if parsed.is_none() {
                errors.add("due_date", "Use the format YYYY-MM-DDTHH:MM");
            }
            parsed
        };
        let student_id = match self.student_id.trim() {
            "" => None,
            raw => match raw.parse::<i64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.add("student_id", "Choose a student");
                    None
                }
            },
        };
        match due_date {
            Some(due_date) if errors.is_empty() => Ok(ValidAssignment { due_date, student_id }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GradeForm {
    #[serde(default)]
    pub grade: String,
}

impl GradeForm {
    pub fn validated(&self) -> Result<f64, FormErrors> {
        let mut errors = FormErrors::default();
        if self.grade.trim().is_empty() {
            errors.add("grade", "Grade is required");
            return Err(errors);
        }
        parse_grade(&self.grade).ok_or_else(|| {
            errors.add("grade", "Grade must be a number");
            errors
        })
    }
}

/// Inline grade + status row on the instructor dashboard.
#[derive(Debug, Default, Deserialize)]
pub struct InlineGradeForm {
    #[serde(default)]
    pub assignment_id: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub status: String,
}

pub struct ValidInlineGrade {
    pub assignment_id: i64,
    pub grade: Option<f64>,
    pub status: AssignmentStatus,
}

impl InlineGradeForm {
    /// A blank grade clears it.
    pub fn validated(&self) -> Result<ValidInlineGrade, FormErrors> {
        let mut errors = FormErrors::default();
        let assignment_id = self.assignment_id.trim().parse::<i64>().ok();
        if assignment_id.is_none() {
            errors.add(FormErrors::GENERAL, "Unknown assignment");
        }
        let grade = if self.grade.trim().is_empty() {
            None
        } else {
            let g = parse_grade(&self.grade);
            if g.is_none() {
                errors.add("grade", "Grade must be a number");
            }
            g
        };
        let status = self.status.parse::<AssignmentStatus>().ok();
        if status.is_none() {
            errors.add("status", "Choose a valid status");
        }
        match (assignment_id, status) {
            (Some(assignment_id), Some(status)) if errors.is_empty() => Ok(ValidInlineGrade {
                assignment_id,
                grade,
                status,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SubmitForm {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub submission: String,
}

impl SubmitForm {
    /// Returns the chosen status and the submission text, if any was entered.
    pub fn validated(&self) -> Result<(AssignmentStatus, Option<&str>), FormErrors> {
        let mut errors = FormErrors::default();
        let status = match self.status.parse::<AssignmentStatus>() {
            Ok(st) if STUDENT_STATUSES.contains(&st) => Some(st),
            _ => {
                errors.add("status", "Choose In Progress or Submitted");
                None
            }
        };
        let text = self.submission.trim();
        let text = (!text.is_empty()).then_some(text);
        if status == Some(AssignmentStatus::Submitted) && text.is_none() {
            errors.add("submission", "Add your work before submitting");
        }
        match status {
            Some(status) if errors.is_empty() => Ok((status, text)),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn assignment_form_requires_parsable_due_date() {
        let mut form = CreateAssignmentForm {
            title: "Essay".into(),
            description: "Write".into(),
            due_date: String::new(),
            student_id: String::new(),
        };
        assert_eq!(
            form.validated().err().unwrap().for_field("due_date"),
            ["Due date is required".to_string()]
        );

        form.due_date = "tomorrow".into();
        assert!(form.validated().is_err());

        form.due_date = "2026-12-01T09:00".into();
        let ok = form.validated().ok().expect("valid");
        assert_eq!(ok.due_date, datetime!(2026-12-01 09:00));
        assert_eq!(ok.student_id, None);
    }

    #[test]
    fn assignment_form_checks_title_length() {
        let form = CreateAssignmentForm {
            title: "ab".into(),
            description: "x".into(),
            due_date: "2026-12-01T09:00".into(),
            student_id: "7".into(),
        };
        let errors = form.validated().err().unwrap();
        assert_eq!(errors.for_field("title").len(), 1);
    }

    #[test]
    fn blank_description_is_rejected_after_trim() {
        let form = CreateAssignmentForm {
            title: "  Essay  ".into(),
            description: " \n\t ".into(),
            due_date: "2026-12-01T09:00".into(),
            student_id: String::new(),
        }
        .normalize();
        assert_eq!(form.title, "Essay");
        assert_eq!(
            form.validated().err().unwrap().for_field("description"),
            ["Description is required".to_string()]
        );
    }

    #[test]
    fn grade_form_keeps_value_verbatim() {
        assert_eq!(GradeForm { grade: "93.25".into() }.validated(), Ok(93.25));
        assert!(GradeForm { grade: "".into() }.validated().is_err());
        assert!(GradeForm { grade: "B".into() }.validated().is_err());
    }

    #[test]
    fn inline_form_allows_blank_grade() {
        let v = InlineGradeForm {
            assignment_id: "3".into(),
            grade: "".into(),
            status: "submitted".into(),
        }
        .validated()
        .ok()
        .expect("valid");
        assert_eq!(v.assignment_id, 3);
        assert_eq!(v.grade, None);
        assert_eq!(v.status, AssignmentStatus::Submitted);
    }

    #[test]
    fn submit_form_rules() {
        let form = SubmitForm {
            status: "submitted".into(),
            submission: "  my answer ".into(),
        };
        assert_eq!(form.validated(), Ok((AssignmentStatus::Submitted, Some("my answer"))));

        let draft = SubmitForm {
            status: "in progress".into(),
            submission: String::new(),
        };
        assert_eq!(draft.validated(), Ok((AssignmentStatus::InProgress, None)));

        let empty = SubmitForm {
            status: "submitted".into(),
            submission: " ".into(),
        };
        assert!(empty.validated().is_err());

        let cheat = SubmitForm {
            status: "graded".into(),
            submission: "x".into(),
        };
        assert!(cheat.validated().is_err());
    }
}
