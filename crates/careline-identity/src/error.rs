//! Error types for form validation.

/// A single field that failed validation, with the message the screen
/// shows next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// The form field, e.g. `"email"` or `"birthdate"`.
    pub field: &'static str,
    /// User-facing message, e.g. `"Please enter a valid email"`.
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

/// A form failed validation.
///
/// Carries *every* failing field, not just the first — the screens show
/// all messages at once so the user can fix the whole form in one pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} field(s) failed validation", .fields.len())]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

impl ValidationError {
    /// Looks up the message for a specific field, if it failed.
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}
