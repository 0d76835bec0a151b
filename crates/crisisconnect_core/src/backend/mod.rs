//! Boundary contracts for the managed backend.
//!
//! # Responsibility
//! - Define the auth and relational-data contracts consumed by the core.
//! - Keep row transport generic (`serde_json` objects) so accessors own the
//!   typed shapes.
//!
//! # Invariants
//! - Backend rejection messages are carried verbatim in `BackendError`.
//! - Implementations are black boxes: the core never inspects transport
//!   details beyond `BackendErrorKind`.

use crate::model::identity::{AuthEvent, AuthSession, UserIdentity};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub mod events;
pub mod local;
pub mod rest;

pub use events::AuthEventBus;
pub use local::LocalBackend;
pub use rest::RestBackend;

/// One table row as a JSON object.
pub type Row = Map<String, Value>;

pub type BackendResult<T> = Result<T, BackendError>;

/// Listener invoked for every auth-state change.
pub type AuthListener = Arc<dyn Fn(&AuthEvent) + Send + Sync>;

/// Handle returned by `AuthBackend::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

/// Tables exposed by the data API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Table {
    Profiles,
    Contacts,
    Resources,
    SavedResources,
}

impl Table {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Profiles => "profiles",
            Self::Contacts => "contacts",
            Self::Resources => "resources",
            Self::SavedResources => "saved_resources",
        }
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(&'static str, Value),
    IsNull(&'static str),
}

impl Filter {
    pub fn column(&self) -> &'static str {
        match self {
            Self::Eq(column, _) | Self::IsNull(column) => column,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub ascending: bool,
}

/// Filtered, ordered read/write scope over one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableQuery {
    pub table: Table,
    pub filters: Vec<Filter>,
    pub order: Vec<OrderBy>,
    pub limit: Option<u32>,
}

impl TableQuery {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    pub fn eq(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(column, value.into()));
        self
    }

    pub fn is_null(mut self, column: &'static str) -> Self {
        self.filters.push(Filter::IsNull(column));
        self
    }

    pub fn order(mut self, column: &'static str, ascending: bool) -> Self {
        self.order.push(OrderBy { column, ascending });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Coarse classification of backend failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// Bad credentials, missing/expired session.
    Auth,
    /// Row-level policy or permission rejection.
    Forbidden,
    NotFound,
    Conflict,
    /// Request rejected for any other reason (bad column, constraint, ...).
    Rejected,
    /// Network or local storage failure.
    Transport,
    /// Response could not be decoded into the expected shape.
    InvalidData,
}

impl BackendErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Rejected => "rejected",
            Self::Transport => "transport",
            Self::InvalidData => "invalid_data",
        }
    }
}

/// Backend failure with the backend's reported reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for BackendError {}

/// Email/password pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpRequest {
    pub credentials: Credentials,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpResult {
    pub identity: UserIdentity,
    /// Present when the backend signs the user in immediately.
    pub session: Option<AuthSession>,
    /// The email already belongs to an account.
    pub already_registered: bool,
}

/// Authentication provider contract.
pub trait AuthBackend: Send + Sync {
    fn sign_in(&self, credentials: &Credentials) -> BackendResult<AuthSession>;
    fn sign_up(&self, request: &SignUpRequest) -> BackendResult<SignUpResult>;
    fn sign_out(&self) -> BackendResult<()>;
    fn request_password_reset(&self, email: &str) -> BackendResult<()>;
    fn current_session(&self) -> BackendResult<Option<AuthSession>>;
    fn subscribe(&self, listener: AuthListener) -> SubscriptionId;
    fn unsubscribe(&self, id: SubscriptionId);
}

/// Row-level relational data contract.
pub trait DataBackend: Send + Sync {
    fn select(&self, query: &TableQuery) -> BackendResult<Vec<Row>>;
    /// Inserts one row and returns it as stored.
    fn insert(&self, table: Table, row: Row) -> BackendResult<Row>;
    /// Applies `patch` to every row matching `query` and returns them.
    fn update(&self, query: &TableQuery, patch: Row) -> BackendResult<Vec<Row>>;
    /// Inserts or merges one row by primary key.
    fn upsert(&self, table: Table, row: Row) -> BackendResult<Row>;
    /// Deletes matching rows and returns how many were removed.
    fn delete(&self, query: &TableQuery) -> BackendResult<usize>;
}

/// Serializes a record into a row.
pub fn to_row<T: Serialize>(value: &T) -> BackendResult<Row> {
    match serde_json::to_value(value) {
        Ok(Value::Object(row)) => Ok(row),
        Ok(other) => Err(BackendError::new(
            BackendErrorKind::InvalidData,
            format!("expected a JSON object, got {other}"),
        )),
        Err(err) => Err(BackendError::new(
            BackendErrorKind::InvalidData,
            err.to_string(),
        )),
    }
}

/// Decodes a row into a typed record.
pub fn from_row<T: DeserializeOwned>(table: Table, row: Row) -> BackendResult<T> {
    serde_json::from_value(Value::Object(row)).map_err(|err| {
        BackendError::new(
            BackendErrorKind::InvalidData,
            format!("invalid {table} row: {err}"),
        )
    })
}

/// Decodes every row, failing on the first invalid one.
pub fn from_rows<T: DeserializeOwned>(table: Table, rows: Vec<Row>) -> BackendResult<Vec<T>> {
    rows.into_iter().map(|row| from_row(table, row)).collect()
}

/// Seconds since the Unix epoch; session expiry uses this clock.
pub(crate) fn now_epoch_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{to_row, Credentials, Filter, Table, TableQuery};
    use serde_json::json;

    #[test]
    fn query_builder_accumulates_in_order() {
        let query = TableQuery::new(Table::Contacts)
            .eq("user_id", "abc")
            .is_null("email")
            .order("is_favorite", false)
            .order("created_at", false)
            .limit(5);
        assert_eq!(query.filters.len(), 2);
        assert_eq!(query.filters[0], Filter::Eq("user_id", json!("abc")));
        assert_eq!(query.filters[1].column(), "email");
        assert_eq!(query.order[1].column, "created_at");
        assert_eq!(query.limit, Some(5));
    }

    #[test]
    fn to_row_rejects_non_objects() {
        assert!(to_row(&json!({ "a": 1 })).is_ok());
        assert!(to_row(&json!([1, 2])).is_err());
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let credentials = Credentials {
            email: "rudo@example.com".to_string(),
            password: "hunter22".to_string(),
        };
        let rendered = format!("{credentials:?}");
        assert!(!rendered.contains("hunter22"));
    }
}
