//! Advisory input validation for contact and auth forms.
//!
//! Failures block submission locally and never reach the backend.

use crate::model::contact::EmergencyContactInput;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+\d\s()-]{7,20}$").expect("valid phone regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Minimum password length accepted at sign-up.
pub const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingField(&'static str),
    InvalidPhone(String),
    InvalidEmail(String),
    PasswordTooShort { min_chars: usize },
}

impl ValidationError {
    /// Short user-facing title for notices.
    pub fn title(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "Missing information",
            Self::InvalidPhone(_) => "Invalid phone number",
            Self::InvalidEmail(_) => "Invalid email",
            Self::PasswordTooShort { .. } => "Password too short",
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "please provide a {field}"),
            Self::InvalidPhone(_) => write!(f, "please enter a valid phone number"),
            Self::InvalidEmail(_) => write!(f, "please enter a valid email address"),
            Self::PasswordTooShort { min_chars } => {
                write!(f, "password should be at least {min_chars} characters")
            }
        }
    }
}

impl Error for ValidationError {}

pub fn is_valid_phone(value: &str) -> bool {
    PHONE_RE.is_match(value)
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

pub fn validate_email(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField("email"));
    }
    if !is_valid_email(trimmed) {
        return Err(ValidationError::InvalidEmail(trimmed.to_string()));
    }
    Ok(())
}

pub fn validate_password(value: &str) -> Result<(), ValidationError> {
    if value.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ValidationError::PasswordTooShort {
            min_chars: MIN_PASSWORD_CHARS,
        });
    }
    Ok(())
}

/// Validates the emergency-contact form: name and phone required, phone and
/// optional email well-formed.
pub fn validate_emergency_contact(input: &EmergencyContactInput) -> Result<(), ValidationError> {
    if input.name.trim().is_empty() {
        return Err(ValidationError::MissingField("name"));
    }
    let phone = input.phone.trim();
    if phone.is_empty() {
        return Err(ValidationError::MissingField("phone number"));
    }
    if !is_valid_phone(phone) {
        return Err(ValidationError::InvalidPhone(phone.to_string()));
    }
    if let Some(email) = input.email.as_deref().map(str::trim) {
        if !email.is_empty() && !is_valid_email(email) {
            return Err(ValidationError::InvalidEmail(email.to_string()));
        }
    }
    Ok(())
}
