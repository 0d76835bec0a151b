//! Route table.

use crate::model::resource::ResourceId;
use uuid::Uuid;

pub const ROOT: &str = "/";
pub const SIGN_IN: &str = "/signin";
pub const SIGN_UP: &str = "/signup";
pub const RESET_PASSWORD: &str = "/reset-password";
pub const ONBOARDING: &str = "/onboarding";
pub const APP_HOME: &str = "/app";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Requires a signed-in identity.
    Protected,
    /// Only for anonymous visitors.
    GuestOnly,
    Public,
}

/// Every screen the app can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// `/`, immediately replaced with `/signin`.
    Root,
    SignIn,
    SignUp,
    ResetPassword,
    Onboarding,
    Home,
    Alerts,
    Profile,
    EmergencyContacts,
    MedicalInfo,
    Resources,
    ResourceDetail,
    Nearby,
    Contacts,
    Settings,
    Report,
    NotFound,
}

impl Screen {
    pub fn class(self) -> RouteClass {
        match self {
            Self::SignIn | Self::SignUp | Self::ResetPassword => RouteClass::GuestOnly,
            Self::Root | Self::NotFound => RouteClass::Public,
            Self::Onboarding
            | Self::Home
            | Self::Alerts
            | Self::Profile
            | Self::EmergencyContacts
            | Self::MedicalInfo
            | Self::Resources
            | Self::ResourceDetail
            | Self::Nearby
            | Self::Contacts
            | Self::Settings
            | Self::Report => RouteClass::Protected,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::SignIn => "sign_in",
            Self::SignUp => "sign_up",
            Self::ResetPassword => "reset_password",
            Self::Onboarding => "onboarding",
            Self::Home => "home",
            Self::Alerts => "alerts",
            Self::Profile => "profile",
            Self::EmergencyContacts => "emergency_contacts",
            Self::MedicalInfo => "medical_info",
            Self::Resources => "resources",
            Self::ResourceDetail => "resource_detail",
            Self::Nearby => "nearby",
            Self::Contacts => "contacts",
            Self::Settings => "settings",
            Self::Report => "report",
            Self::NotFound => "not_found",
        }
    }
}

/// A resolved path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub path: String,
    pub screen: Screen,
    /// `:id` segment of `/app/resources/:id`.
    pub resource_id: Option<ResourceId>,
}

impl RouteMatch {
    pub fn class(&self) -> RouteClass {
        self.screen.class()
    }
}

/// Resolves a path (query string and trailing slash ignored) to its screen.
pub fn resolve(path: &str) -> RouteMatch {
    let without_query = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = without_query.trim_end_matches('/');
    let normalized = if trimmed.is_empty() { ROOT } else { trimmed };

    let mut resource_id = None;
    let screen = match normalized {
        ROOT => Screen::Root,
        SIGN_IN => Screen::SignIn,
        SIGN_UP => Screen::SignUp,
        RESET_PASSWORD => Screen::ResetPassword,
        ONBOARDING => Screen::Onboarding,
        APP_HOME => Screen::Home,
        "/app/alerts" => Screen::Alerts,
        "/app/profile" => Screen::Profile,
        "/app/profile/emergency-contacts" => Screen::EmergencyContacts,
        "/app/profile/medical" => Screen::MedicalInfo,
        "/app/resources" => Screen::Resources,
        "/app/nearby" => Screen::Nearby,
        "/app/contacts" => Screen::Contacts,
        "/app/settings" => Screen::Settings,
        "/app/report" => Screen::Report,
        other => match other
            .strip_prefix("/app/resources/")
            .and_then(|id| Uuid::parse_str(id).ok())
        {
            Some(id) => {
                resource_id = Some(id);
                Screen::ResourceDetail
            }
            None => Screen::NotFound,
        },
    };

    RouteMatch {
        path: normalized.to_string(),
        screen,
        resource_id,
    }
}
