//! Form field validation that collects every problem instead of stopping at
//! the first one, so a form can be re-rendered with all messages inline.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Accumulates field errors while a form is checked.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    /// Trimmed value of a required field, or `None` after recording the error.
    pub fn required(&mut self, field: &'static str, label: &str, value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.add(field, format!("{label} is required"));
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Records an error when `value` is longer than `max` characters.
    pub fn max_chars(&mut self, field: &'static str, label: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.add(field, format!("{label} must be at most {max} characters"));
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok(value)` when nothing was recorded, otherwise every collected error.
    pub fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, Vec<FieldError>> {
        if self.0.is_empty() {
            Ok(value())
        } else {
            Err(self.0)
        }
    }
}

impl From<FieldErrors> for Vec<FieldError> {
    fn from(errors: FieldErrors) -> Self {
        errors.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_trims_and_records() {
        let mut errors = FieldErrors::new();
        assert_eq!(
            errors.required("title", "Title", "  Lamp "),
            Some("Lamp".to_string())
        );
        assert!(errors.is_empty());

        assert_eq!(errors.required("link", "Link", "   "), None);
        let collected: Vec<FieldError> = errors.into();
        assert_eq!(collected, vec![FieldError::new("link", "Link is required")]);
    }

    #[test]
    fn finish_collects_all_errors() {
        let mut errors = FieldErrors::new();
        errors.required("a", "A", "");
        errors.max_chars("b", "B", "toolong", 3);
        let result = errors.finish(|| ());
        let errs = result.unwrap_err();
        assert_eq!(errs.len(), 2);
        assert_eq!(errs[1].field, "b");
    }

    #[test]
    fn max_chars_counts_characters_not_bytes() {
        let mut errors = FieldErrors::new();
        errors.max_chars("name", "Name", "ёжик", 4);
        assert!(errors.is_empty());
    }
}
