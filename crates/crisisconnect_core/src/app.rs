//! Application root that owns every shared handle.
//!
//! # Responsibility
//! - Build backends from configuration and start the session provider.
//! - Hand out accessors and route navigation to the UI layer.
//!
//! # Invariants
//! - Exactly one `SessionProvider` and one `QueryCache` per app instance.
//! - The session provider is subscribed before any accessor is used.

use crate::backend::{AuthBackend, BackendError, DataBackend, LocalBackend, RestBackend};
use crate::cache::QueryCache;
use crate::config::{AppConfig, BackendConfig, ConfigError};
use crate::db::DbError;
use crate::directory::{
    nearby_resources, resolve_location, Geolocator, Location, NearbyCategory, NearbyResource,
    ResolvedLocation, UnsupportedGeolocator,
};
use crate::guard::{NavigationError, Navigator, Visit, APP_HOME};
use crate::logging::{default_log_level, init_logging};
use crate::model::profile::Profile;
use crate::service::{
    AuthService, ContactsService, OnboardingDetails, ProfileService, ResourcesService,
    ServiceContext, ServiceError,
};
use crate::session::{Session, SessionProvider};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Db(DbError),
    Backend(BackendError),
    Logging(String),
    Service(ServiceError),
    Navigation(NavigationError),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Backend(err) => write!(f, "{err}"),
            Self::Logging(message) => write!(f, "{message}"),
            Self::Service(err) => write!(f, "{err}"),
            Self::Navigation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Backend(err) => Some(err),
            Self::Logging(_) => None,
            Self::Service(err) => Some(err),
            Self::Navigation(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for AppError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<BackendError> for AppError {
    fn from(value: BackendError) -> Self {
        Self::Backend(value)
    }
}

impl From<ServiceError> for AppError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<NavigationError> for AppError {
    fn from(value: NavigationError) -> Self {
        Self::Navigation(value)
    }
}

/// Nearby screen contents.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyView {
    pub origin: ResolvedLocation,
    pub resources: Vec<NearbyResource>,
}

pub struct CrisisApp {
    session: Arc<SessionProvider>,
    cache: Arc<QueryCache>,
    auth: AuthService,
    profiles: ProfileService,
    contacts: ContactsService,
    resources: ResourcesService,
    navigator: Mutex<Navigator>,
    geolocator: Arc<dyn Geolocator>,
    default_location: Location,
}

impl CrisisApp {
    /// Wires services over the given backends and starts the session.
    pub fn with_backends(auth: Arc<dyn AuthBackend>, data: Arc<dyn DataBackend>) -> Self {
        let session = Arc::new(SessionProvider::new(Arc::clone(&auth)));
        session.initialize();
        let cache = Arc::new(QueryCache::new());
        let ctx = ServiceContext::new(data, Arc::clone(&cache), Arc::clone(&session));

        Self {
            auth: AuthService::new(auth, Arc::clone(&cache)),
            profiles: ProfileService::new(ctx.clone()),
            contacts: ContactsService::new(ctx.clone()),
            resources: ResourcesService::new(ctx),
            session,
            cache,
            navigator: Mutex::new(Navigator::new()),
            geolocator: Arc::new(UnsupportedGeolocator),
            default_location: Location::chinhoyi(),
        }
    }

    /// Local backend over a fresh in-memory database.
    pub fn local_in_memory() -> Result<Self, AppError> {
        let backend = Arc::new(LocalBackend::open_in_memory()?);
        Ok(Self::with_backends(backend.clone(), backend))
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        config.validate()?;
        if let Some(dir) = &config.log_dir {
            let level = config.log_level.as_deref().unwrap_or(default_log_level());
            init_logging(level, &dir.to_string_lossy()).map_err(AppError::Logging)?;
        }

        let app = match &config.backend {
            BackendConfig::Local { database_path } => {
                let backend = Arc::new(match database_path {
                    Some(path) => LocalBackend::open(path)?,
                    None => LocalBackend::open_in_memory()?,
                });
                info!(
                    "event=app_init module=app status=ok backend=local persistent={}",
                    database_path.is_some()
                );
                Self::with_backends(backend.clone(), backend)
            }
            BackendConfig::Rest { url, anon_key } => {
                let backend = Arc::new(RestBackend::new(url, anon_key)?);
                info!("event=app_init module=app status=ok backend=rest");
                Self::with_backends(backend.clone(), backend)
            }
        };
        Ok(app.with_default_location(config.default_location.clone()))
    }

    pub fn with_geolocator(mut self, geolocator: Arc<dyn Geolocator>) -> Self {
        self.geolocator = geolocator;
        self
    }

    pub fn with_default_location(mut self, location: Location) -> Self {
        self.default_location = location;
        self
    }

    pub fn session(&self) -> &Arc<SessionProvider> {
        &self.session
    }

    pub fn snapshot(&self) -> Session {
        self.session.snapshot()
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn profiles(&self) -> &ProfileService {
        &self.profiles
    }

    pub fn contacts(&self) -> &ContactsService {
        &self.contacts
    }

    pub fn resources(&self) -> &ResourcesService {
        &self.resources
    }

    /// Pushes `path` and applies the guard for the current session.
    pub fn navigate(&self, path: &str) -> Result<Visit, NavigationError> {
        let session = self.session.snapshot();
        self.lock_navigator().navigate(path, &session)
    }

    pub fn back(&self) -> Result<Option<Visit>, NavigationError> {
        let session = self.session.snapshot();
        self.lock_navigator().back(&session)
    }

    /// Re-guards the current route, e.g. after sign-in or sign-out.
    pub fn refresh_route(&self) -> Result<Option<Visit>, NavigationError> {
        let session = self.session.snapshot();
        self.lock_navigator().refresh(&session)
    }

    pub fn current_path(&self) -> Option<String> {
        self.lock_navigator().current().map(str::to_string)
    }

    /// Saves onboarding details, then moves to the app home.
    pub fn complete_onboarding(
        &self,
        details: &OnboardingDetails,
    ) -> Result<(Profile, Visit), AppError> {
        let profile = self.profiles.complete_onboarding(details)?;
        let session = self.session.snapshot();
        let visit = self.lock_navigator().replace(APP_HOME, &session)?;
        Ok((profile, visit))
    }

    /// Device position (or fallback) and nearby resources, closest first.
    pub fn nearby(&self, category: Option<NearbyCategory>) -> NearbyView {
        self.nearby_with(self.geolocator.as_ref(), category)
    }

    /// Same as `nearby`, asking `geolocator` instead of the app's own.
    pub fn nearby_with(
        &self,
        geolocator: &dyn Geolocator,
        category: Option<NearbyCategory>,
    ) -> NearbyView {
        NearbyView {
            origin: resolve_location(geolocator, &self.default_location),
            resources: nearby_resources(category),
        }
    }

    /// Used whenever the device cannot report a position.
    pub fn default_location(&self) -> &Location {
        &self.default_location
    }

    fn lock_navigator(&self) -> MutexGuard<'_, Navigator> {
        self.navigator
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
