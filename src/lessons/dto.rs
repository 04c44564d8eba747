use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Default, Clone, Deserialize, Validate)]
pub struct CreateLessonForm {
    #[serde(default)]
    #[validate(length(min = 3, max = 200, message = "Title must be between 3 and 200 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
}

impl CreateLessonForm {
    pub fn normalize(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.content = self.content.trim().to_string();
        self
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct EnrollForm {
    #[serde(default)]
    pub student_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::FormErrors;

    #[test]
    fn normalize_trims_title_and_content() {
        let form = CreateLessonForm {
            title: "  Algebra ".into(),
            content: "\n Linear equations \n".into(),
        }
        .normalize();
        assert_eq!(form.title, "Algebra");
        assert_eq!(form.content, "Linear equations");
        assert!(FormErrors::check(&form).is_empty());
    }

    #[test]
    fn whitespace_content_is_rejected() {
        let form = CreateLessonForm {
            title: "Algebra".into(),
            content: "   \n  ".into(),
        }
        .normalize();
        assert_eq!(
            FormErrors::check(&form).for_field("content"),
            ["Content is required".to_string()]
        );
    }
}
