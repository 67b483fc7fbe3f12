pub mod access;
pub mod booking;
pub mod flight;
pub mod identity;
pub mod payment;
pub mod repository;
pub mod search;
pub mod traveler;

/// A step input that is missing a mandatory field or fails a format check.
///
/// Raised synchronously, before any network call. The session that produced
/// it is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("{field} is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("expected {expected} traveler record(s), got {actual}")]
    TravelerCount { expected: u32, actual: usize },
    #[error("flight has no seats available")]
    NoSeatsAvailable,
}

impl ValidationError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField { field, reason: reason.into() }
    }

    /// The form field this error points at, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::MissingField(field) => Some(field),
            ValidationError::InvalidField { field, .. } => Some(field),
            ValidationError::TravelerCount { .. } => Some("travelers"),
            ValidationError::NoSeatsAvailable => None,
        }
    }
}

/// Trimmed, required text field.
pub(crate) fn required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}
