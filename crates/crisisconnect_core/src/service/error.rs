use crate::backend::{BackendError, BackendErrorKind};
use crate::cache::CacheError;
use crate::model::validation::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Message used when a caller tries to change a record with no owner.
pub const SHARED_RECORD_MESSAGE: &str = "cannot modify a default/shared record";

/// Failure classes surfaced to screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    Authorization,
    Validation,
    NotFound,
    /// Transport or decoding failure; the caller may try again later.
    Transient,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::Authorization => "authorization",
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Transient => "transient",
        }
    }
}

/// Service-layer error for accessor and auth operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    NotAuthenticated,
    /// Write attempted on a default/shared record.
    SharedRecordReadOnly,
    /// Write attempted on a record owned by another identity.
    NotOwner,
    Validation(ValidationError),
    /// Backend rejection; the message is the backend's own.
    Backend(BackendError),
    NotFound { what: &'static str, id: String },
    /// An identical write is still running.
    WriteInFlight { op: &'static str },
    Cache(CacheError),
}

impl ServiceError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotAuthenticated => ErrorCategory::Authentication,
            Self::SharedRecordReadOnly | Self::NotOwner => ErrorCategory::Authorization,
            Self::Validation(_) | Self::WriteInFlight { .. } => ErrorCategory::Validation,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Backend(err) => match err.kind {
                BackendErrorKind::Auth => ErrorCategory::Authentication,
                BackendErrorKind::Forbidden => ErrorCategory::Authorization,
                BackendErrorKind::NotFound => ErrorCategory::NotFound,
                BackendErrorKind::Conflict | BackendErrorKind::Rejected => {
                    ErrorCategory::Validation
                }
                BackendErrorKind::Transport | BackendErrorKind::InvalidData => {
                    ErrorCategory::Transient
                }
            },
            Self::Cache(_) => ErrorCategory::Transient,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAuthenticated => write!(f, "user not authenticated"),
            Self::SharedRecordReadOnly => f.write_str(SHARED_RECORD_MESSAGE),
            Self::NotOwner => write!(f, "record belongs to another user"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Backend(err) => write!(f, "{err}"),
            Self::NotFound { what, id } => write!(f, "{what} not found: {id}"),
            Self::WriteInFlight { op } => write!(f, "{op} is already in progress"),
            Self::Cache(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Backend(err) => Some(err),
            Self::Cache(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BackendError> for ServiceError {
    fn from(value: BackendError) -> Self {
        Self::Backend(value)
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<CacheError> for ServiceError {
    fn from(value: CacheError) -> Self {
        Self::Cache(value)
    }
}
