//! Core logic for Crisis Connect.
//! Session, route guards, cached data accessors and backends live here;
//! the FFI and CLI crates are thin shells over this crate.

pub mod app;
pub mod backend;
pub mod cache;
pub mod config;
pub mod db;
pub mod directory;
pub mod guard;
pub mod logging;
pub mod model;
pub mod service;
pub mod session;

pub use app::{AppError, CrisisApp, NearbyView};
pub use backend::{
    AuthBackend, BackendError, BackendErrorKind, BackendResult, DataBackend, LocalBackend,
    RestBackend,
};
pub use cache::{QueryCache, QueryKey, QueryKind, WriteOp};
pub use config::{AppConfig, BackendConfig, ConfigError};
pub use guard::{decide, GuardDecision, Navigator, RouteClass, Screen, Visit};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::contact::{Contact, ContactId, ContactPatch, EmergencyContactInput, NewContact};
pub use model::identity::{AuthEvent, AuthSession, UserId, UserIdentity};
pub use model::profile::{MedicalInfoInput, PersonalInfoInput, Profile, ProfilePatch};
pub use model::resource::{Resource, ResourceId, SavedResource};
pub use model::validation::ValidationError;
pub use service::{Notice, NoticeLevel, ServiceError, ServiceResult};
pub use session::{LoadingState, Session, SessionProvider};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
