use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{required, ValidationError};

/// Country calling code prefixed to every traveler mobile number.
pub const MOBILE_COUNTRY_CODE: &str = "+233";

// ============================================================================
// Contact
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactInfo {
    pub email: String,
}

impl ContactInfo {
    pub fn new(email: impl Into<String>) -> Self {
        Self { email: email.into() }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_email(&self.email)
    }
}

/// Presence, a single `@`, a non-empty local part and a dotted domain.
pub fn validate_email(raw: &str) -> Result<(), ValidationError> {
    required("email", raw)?;
    let email = raw.trim();

    if email.chars().any(char::is_whitespace) {
        return Err(ValidationError::invalid("email", "must not contain spaces"));
    }
    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| ValidationError::invalid("email", "missing @"))?;
    if local.is_empty() || domain.contains('@') {
        return Err(ValidationError::invalid("email", "malformed address"));
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(ValidationError::invalid("email", "malformed domain"));
    }
    Ok(())
}

// ============================================================================
// Traveler
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Title {
    Mr,
    Mrs,
    Ms,
    Dr,
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Title::Mr => "Mr",
            Title::Mrs => "Mrs",
            Title::Ms => "Ms",
            Title::Dr => "Dr",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TravelerRecord {
    pub title: Title,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    /// Local part of the number; [`MOBILE_COUNTRY_CODE`] is prepended on submit.
    pub mobile: String,
}

impl TravelerRecord {
    pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationError> {
        required("first_name", &self.first_name)?;
        required("last_name", &self.last_name)?;
        required("mobile", &self.mobile)?;

        if self.date_of_birth > today {
            return Err(ValidationError::invalid("date_of_birth", "must not be in the future"));
        }

        let digits = mobile_digits(&self.mobile);
        if digits.len() != self.mobile.chars().filter(|c| !c.is_whitespace() && *c != '-').count() {
            return Err(ValidationError::invalid("mobile", "digits only"));
        }
        if !(7..=12).contains(&digits.len()) {
            return Err(ValidationError::invalid("mobile", "expected 7 to 12 digits"));
        }
        Ok(())
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }

    /// `0241234567` → `+233241234567`.
    pub fn international_mobile(&self) -> String {
        let digits = mobile_digits(&self.mobile);
        format!("{}{}", MOBILE_COUNTRY_CODE, digits.trim_start_matches('0'))
    }
}

fn mobile_digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}
