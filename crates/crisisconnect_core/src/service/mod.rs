//! Accessors and auth workflows used by screens.
//!
//! # Responsibility
//! - Pair cached reads with writes for profiles, contacts and resources.
//! - Enforce ownership rules locally before any remote write.
//! - Mark cached reads stale only after a confirmed write.
//!
//! # Invariants
//! - One logical remote write per call; no retries.
//! - Backend rejections keep their message unchanged.
//! - No optimistic cache mutation.

pub mod auth_service;
pub mod contacts_service;
pub mod error;
pub mod notice;
pub mod onboarding;
pub mod pending;
pub mod profile_service;
pub mod resources_service;

pub use auth_service::{AuthService, SignUpOutcome};
pub use contacts_service::ContactsService;
pub use error::{ErrorCategory, ServiceError, ServiceResult, SHARED_RECORD_MESSAGE};
pub use notice::{Notice, NoticeLevel};
pub use onboarding::{OnboardingDetails, OnboardingFlow, OnboardingStep, StepOutcome};
pub use pending::{PendingTicket, PendingWrites};
pub use profile_service::ProfileService;
pub use resources_service::ResourcesService;

use crate::backend::DataBackend;
use crate::cache::QueryCache;
use crate::model::identity::UserIdentity;
use crate::session::SessionProvider;
use std::sync::Arc;

/// Shared handles every accessor needs.
#[derive(Clone)]
pub struct ServiceContext {
    pub data: Arc<dyn DataBackend>,
    pub cache: Arc<QueryCache>,
    pub session: Arc<SessionProvider>,
}

impl ServiceContext {
    pub fn new(
        data: Arc<dyn DataBackend>,
        cache: Arc<QueryCache>,
        session: Arc<SessionProvider>,
    ) -> Self {
        Self {
            data,
            cache,
            session,
        }
    }

    /// Current identity, or `NotAuthenticated`.
    pub fn require_identity(&self) -> ServiceResult<UserIdentity> {
        self.session.identity().ok_or(ServiceError::NotAuthenticated)
    }
}
