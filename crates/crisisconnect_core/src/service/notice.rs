//! User-facing notices (toasts).

use super::error::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: Option<String>,
}

impl Notice {
    pub fn new(level: NoticeLevel, title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            level,
            title: title.into(),
            description,
        }
    }

    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, title, Some(description.into()))
    }

    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, title, Some(description.into()))
    }

    pub fn warning(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, title, Some(description.into()))
    }

    /// Error notice titled by the failed action, e.g. `"Update failed"`.
    ///
    /// Validation failures use their own title so the form can explain
    /// what to fix.
    pub fn failure(action_title: impl Into<String>, err: &ServiceError) -> Self {
        match err {
            ServiceError::Validation(validation) => Self::new(
                NoticeLevel::Error,
                validation.title(),
                Some(capitalize(&validation.to_string())),
            ),
            other => Self::new(
                NoticeLevel::Error,
                action_title,
                Some(other.to_string()),
            ),
        }
    }
}

impl From<&ServiceError> for Notice {
    fn from(value: &ServiceError) -> Self {
        Self::failure("Error", value)
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
