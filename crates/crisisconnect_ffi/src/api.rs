//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose screen-level operations to Dart via FRB.
//! - Flatten core results into plain envelopes the UI can render directly.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Failures carry a notice title plus the underlying message verbatim.

use crisisconnect_core::config::BackendConfig;
use crisisconnect_core::directory::{
    directory_tab, nearby_resources as static_nearby, resolve_location, DirectoryTab,
    GeolocationError, Geolocator, Location, NearbyCategory,
};
use crisisconnect_core::service::OnboardingDetails;
use crisisconnect_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AppConfig, AppError, Contact, ContactPatch, CrisisApp, EmergencyContactInput,
    MedicalInfoInput, NearbyView, NewContact, Notice, PersonalInfoInput, Resource, ServiceError,
};
use log::{info, warn};
use once_cell::sync::OnceCell;
use std::path::PathBuf;
use uuid::Uuid;

const APP_DB_FILE_NAME: &str = "crisisconnect.sqlite3";
static APP: OnceCell<CrisisApp> = OnceCell::new();

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and the error message otherwise.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Generic result envelope for commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Id of the created record, when the command creates one.
    pub record_id: Option<String>,
    /// Toast title.
    pub title: String,
    /// Toast description; backend messages are passed through unchanged.
    pub message: String,
}

impl ActionResponse {
    fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            record_id: None,
            title: title.into(),
            message: message.into(),
        }
    }

    fn created(title: impl Into<String>, message: impl Into<String>, id: String) -> Self {
        Self {
            record_id: Some(id),
            ..Self::success(title, message)
        }
    }

    fn failure(title: &str, err: &ServiceError) -> Self {
        Self::from_notice(Notice::failure(title, err))
    }

    fn from_notice(notice: Notice) -> Self {
        Self {
            ok: false,
            record_id: None,
            title: notice.title,
            message: notice.description.unwrap_or_default(),
        }
    }

    fn init_failure(err: String) -> Self {
        Self {
            ok: false,
            record_id: None,
            title: "Initialization failed".to_string(),
            message: err,
        }
    }
}

/// Session snapshot for the UI shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub loading: bool,
    pub signed_in: bool,
    pub user_id: Option<String>,
    pub email: Option<String>,
}

/// Route resolution result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteResponse {
    pub ok: bool,
    /// Path the UI should display after redirects.
    pub path: String,
    pub screen: String,
    /// `loading|permit|authed_redirect|guest_redirect`.
    pub decision: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactItem {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub relationship: Option<String>,
    pub kind: String,
    pub is_favorite: bool,
    pub is_emergency_contact: bool,
    /// Default contact; edit and delete controls should be hidden.
    pub is_shared: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactsResponse {
    pub ok: bool,
    pub items: Vec<ContactItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub contact_info: String,
    pub website: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcesResponse {
    pub ok: bool,
    pub items: Vec<ResourceItem>,
    pub message: String,
}

/// Resource detail screen payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDetailResponse {
    pub ok: bool,
    pub item: Option<ResourceItem>,
    /// Bookmarked by the signed-in user; `false` when signed out.
    pub saved: bool,
    pub message: String,
}

/// Profile payload as JSON, so new columns need no binding changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileResponse {
    pub ok: bool,
    pub profile_json: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NearbyItem {
    pub name: String,
    pub category: String,
    pub address: String,
    pub phone: Option<String>,
    pub hours: Option<String>,
    pub distance_label: String,
    pub call_url: Option<String>,
    pub map_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NearbyResponse {
    pub latitude: f64,
    pub longitude: f64,
    /// Fallback notice when the device position was unavailable.
    pub notice_title: Option<String>,
    pub notice_message: Option<String>,
    pub items: Vec<NearbyItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryItem {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub category: String,
    pub description: String,
    pub call_url: String,
    pub map_url: String,
}

/// Starts the app from a JSON config; empty input uses defaults plus env.
///
/// Repeated calls after a successful start are no-ops.
#[flutter_rust_bridge::frb(sync)]
pub fn init_app(config_json: String) -> ActionResponse {
    let config_json = config_json.trim().to_string();
    let result = APP.get_or_try_init(|| {
        let mut config = if config_json.is_empty() {
            AppConfig::default()
        } else {
            AppConfig::from_json_str(&config_json).map_err(|err| err.to_string())?
        };
        build_app(&mut config)
    });
    match result {
        Ok(_) => ActionResponse::success("Ready", "Crisis Connect core initialized."),
        Err(err) => ActionResponse::init_failure(err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn session_state() -> SessionView {
    match app() {
        Ok(app) => {
            let snapshot = app.snapshot();
            SessionView {
                loading: snapshot.is_loading(),
                signed_in: snapshot.is_signed_in(),
                user_id: snapshot.identity.as_ref().map(|user| user.id.to_string()),
                email: snapshot.identity.map(|user| user.email),
            }
        }
        Err(_) => SessionView {
            loading: true,
            signed_in: false,
            user_id: None,
            email: None,
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn sign_in(email: String, password: String) -> ActionResponse {
    with_app(|app| match app.auth().sign_in(&email, &password) {
        Ok(_) => ActionResponse::success("Signed in", "Welcome back."),
        Err(err) => ActionResponse::failure("Sign in failed", &err),
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn sign_up(email: String, password: String, full_name: Option<String>) -> ActionResponse {
    with_app(
        |app| match app.auth().sign_up(&email, &password, full_name.as_deref()) {
            Ok(outcome) => ActionResponse::created(
                "Sign up",
                outcome.message,
                outcome.identity.id.to_string(),
            ),
            Err(err) => ActionResponse::failure("Sign up failed", &err),
        },
    )
}

#[flutter_rust_bridge::frb(sync)]
pub fn sign_out() -> ActionResponse {
    with_app(|app| match app.auth().sign_out() {
        Ok(()) => ActionResponse::success("Signed out", "You have been signed out."),
        Err(err) => ActionResponse::failure("Sign out failed", &err),
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn request_password_reset(email: String) -> ActionResponse {
    with_app(|app| match app.auth().request_password_reset(&email) {
        Ok(message) => ActionResponse::success("Reset password email sent", message),
        Err(err) => ActionResponse::failure("Failed to send reset email", &err),
    })
}

/// Navigates to `path` and reports where the guard landed.
#[flutter_rust_bridge::frb(sync)]
pub fn navigate(path: String) -> RouteResponse {
    let app = match app() {
        Ok(app) => app,
        Err(err) => return route_failure(&path, err),
    };
    match app.navigate(&path) {
        Ok(visit) => RouteResponse {
            ok: true,
            path: visit.route.path.clone(),
            screen: visit.route.screen.as_str().to_string(),
            decision: visit.decision.as_str().to_string(),
            message: String::new(),
        },
        Err(err) => route_failure(&path, err.to_string()),
    }
}

/// Re-guards the current route after a session change.
#[flutter_rust_bridge::frb(sync)]
pub fn refresh_route() -> RouteResponse {
    let app = match app() {
        Ok(app) => app,
        Err(err) => return route_failure("", err),
    };
    match app.refresh_route() {
        Ok(Some(visit)) => RouteResponse {
            ok: true,
            path: visit.route.path.clone(),
            screen: visit.route.screen.as_str().to_string(),
            decision: visit.decision.as_str().to_string(),
            message: String::new(),
        },
        Ok(None) => route_failure("", "no route to refresh".to_string()),
        Err(err) => route_failure("", err.to_string()),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn list_contacts() -> ContactsResponse {
    let app = match app() {
        Ok(app) => app,
        Err(err) => return contacts_failure(err),
    };
    match app.contacts().list_contacts() {
        Ok(contacts) => ContactsResponse {
            ok: true,
            message: format!("{} contact(s).", contacts.len()),
            items: contacts.into_iter().map(to_contact_item).collect(),
        },
        Err(err) => contacts_failure(err.to_string()),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn create_contact(
    name: String,
    phone: String,
    email: Option<String>,
    relationship: Option<String>,
) -> ActionResponse {
    let mut contact = NewContact::personal(name.trim(), phone.trim());
    contact.email = non_blank(email);
    contact.relationship = non_blank(relationship);
    with_app(|app| match app.contacts().create_contact(&contact) {
        Ok(created) => ActionResponse::created(
            "Contact added",
            "Your contact has been added successfully",
            created.id.to_string(),
        ),
        Err(err) => ActionResponse::failure("Save failed", &err),
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn delete_contact(contact_id: String) -> ActionResponse {
    with_app(|app| {
        let contact = match find_contact(app, &contact_id) {
            Ok(contact) => contact,
            Err(err) => return ActionResponse::failure("Delete failed", &err),
        };
        match app.contacts().delete_contact(&contact) {
            Ok(()) => ActionResponse::success("Contact deleted", "Your contact has been removed"),
            Err(err) => ActionResponse::failure("Delete failed", &err),
        }
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn add_emergency_contact(
    name: String,
    phone: String,
    email: Option<String>,
    relationship: Option<String>,
) -> ActionResponse {
    let input = EmergencyContactInput {
        name,
        phone,
        email,
        relationship,
    };
    with_app(|app| match app.contacts().add_emergency_contact(&input) {
        Ok(created) => ActionResponse::created(
            "Contact added",
            "Your emergency contact has been added successfully",
            created.id.to_string(),
        ),
        Err(err) => ActionResponse::failure("Save failed", &err),
    })
}

/// Edits one of the user's own contacts; `None` fields stay unchanged and
/// blank optional text clears the column.
#[flutter_rust_bridge::frb(sync)]
pub fn update_contact(
    contact_id: String,
    name: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    relationship: Option<String>,
    is_favorite: Option<bool>,
) -> ActionResponse {
    let patch = ContactPatch {
        name: name.map(|value| value.trim().to_string()),
        phone: phone.map(|value| value.trim().to_string()),
        email: email.map(|value| non_blank(Some(value))),
        relationship: relationship.map(|value| non_blank(Some(value))),
        is_favorite,
        ..ContactPatch::default()
    };
    with_app(|app| {
        let contact = match find_contact(app, &contact_id) {
            Ok(contact) => contact,
            Err(err) => return ActionResponse::failure("Update failed", &err),
        };
        match app.contacts().update_contact(&contact, &patch) {
            Ok(updated) => ActionResponse::created(
                "Contact updated",
                "Your contact has been updated successfully",
                updated.id.to_string(),
            ),
            Err(err) => ActionResponse::failure("Update failed", &err),
        }
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn list_emergency_contacts() -> ContactsResponse {
    let app = match app() {
        Ok(app) => app,
        Err(err) => return contacts_failure(err),
    };
    match app.contacts().list_emergency_contacts() {
        Ok(contacts) => ContactsResponse {
            ok: true,
            message: format!("{} contact(s).", contacts.len()),
            items: contacts.into_iter().map(to_contact_item).collect(),
        },
        Err(err) => contacts_failure(err.to_string()),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn save_personal_info(
    name: String,
    phone: String,
    address: String,
    date_of_birth: String,
) -> ActionResponse {
    let input = PersonalInfoInput {
        name,
        phone,
        address,
        date_of_birth,
    };
    with_app(|app| match app.profiles().save_personal_info(&input) {
        Ok(_) => ActionResponse::success(
            "Profile updated",
            "Your personal information has been saved",
        ),
        Err(err) => ActionResponse::failure("Update failed", &err),
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn save_medical_info(
    blood_type: String,
    medications: String,
    medical_conditions: String,
) -> ActionResponse {
    let input = MedicalInfoInput {
        blood_type,
        medications,
        medical_conditions,
    };
    with_app(|app| match app.profiles().save_medical_info(&input) {
        Ok(_) => ActionResponse::success(
            "Medical information updated",
            "Your medical information has been saved",
        ),
        Err(err) => ActionResponse::failure("Update failed", &err),
    })
}

/// Saves the onboarding form and lands on the app home.
#[flutter_rust_bridge::frb(sync)]
pub fn complete_onboarding(
    first_name: String,
    last_name: String,
    phone: String,
    city: Option<String>,
    address: String,
) -> RouteResponse {
    let mut details = OnboardingDetails {
        first_name,
        last_name,
        phone,
        address,
        ..OnboardingDetails::default()
    };
    if let Some(city) = non_blank(city) {
        details.city = city;
    }
    let app = match app() {
        Ok(app) => app,
        Err(err) => return route_failure("", err),
    };
    match app.complete_onboarding(&details) {
        Ok((_, visit)) => RouteResponse {
            ok: true,
            path: visit.route.path.clone(),
            screen: visit.route.screen.as_str().to_string(),
            decision: visit.decision.as_str().to_string(),
            message: String::new(),
        },
        Err(AppError::Service(err)) => {
            let notice = Notice::failure("Onboarding failed", &err);
            route_failure("", notice.description.unwrap_or(notice.title))
        }
        Err(err) => route_failure("", err.to_string()),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn list_resources() -> ResourcesResponse {
    let app = match app() {
        Ok(app) => app,
        Err(err) => return resources_failure(err),
    };
    match app.resources().list_resources() {
        Ok(resources) => resources_success(resources),
        Err(err) => resources_failure(err.to_string()),
    }
}

/// Resources bookmarked by the signed-in user, in list order.
#[flutter_rust_bridge::frb(sync)]
pub fn list_saved_resources() -> ResourcesResponse {
    let app = match app() {
        Ok(app) => app,
        Err(err) => return resources_failure(err),
    };
    let saved = match app.resources().list_saved_resources() {
        Ok(saved) => saved,
        Err(err) => return resources_failure(err.to_string()),
    };
    match app.resources().list_resources() {
        Ok(resources) => resources_success(
            resources
                .into_iter()
                .filter(|resource| saved.iter().any(|item| item.resource_id == resource.id))
                .collect(),
        ),
        Err(err) => resources_failure(err.to_string()),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn get_resource(resource_id: String) -> ResourceDetailResponse {
    let app = match app() {
        Ok(app) => app,
        Err(err) => return resource_detail_failure(err),
    };
    let id = match parse_id("resource", &resource_id) {
        Ok(id) => id,
        Err(err) => return resource_detail_failure(err.to_string()),
    };
    let resource = match app.resources().get_resource(id) {
        Ok(resource) => resource,
        Err(err) => return resource_detail_failure(err.to_string()),
    };
    let saved = match app.resources().is_saved(id) {
        Ok(saved) => saved,
        Err(err) => {
            warn!("event=ffi_resource module=ffi status=error op=is_saved");
            return resource_detail_failure(err.to_string());
        }
    };
    ResourceDetailResponse {
        ok: true,
        item: Some(to_resource_item(resource)),
        saved,
        message: String::new(),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn save_resource(resource_id: String) -> ActionResponse {
    with_app(|app| {
        let saved = parse_id("resource", &resource_id)
            .and_then(|id| app.resources().save_resource(id));
        match saved {
            Ok(saved) => ActionResponse::created(
                "Resource saved",
                "Added to your saved resources",
                saved.id.to_string(),
            ),
            Err(err) => ActionResponse::failure("Save failed", &err),
        }
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn unsave_resource(resource_id: String) -> ActionResponse {
    with_app(|app| {
        let removed = parse_id("resource", &resource_id)
            .and_then(|id| app.resources().unsave_resource(id));
        match removed {
            Ok(()) => ActionResponse::success(
                "Resource removed",
                "Removed from your saved resources",
            ),
            Err(err) => ActionResponse::failure("Remove failed", &err),
        }
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn get_profile() -> ProfileResponse {
    let app = match app() {
        Ok(app) => app,
        Err(err) => return profile_failure(err),
    };
    match app.profiles().get_profile() {
        Ok(Some(profile)) => match serde_json::to_string(&profile) {
            Ok(json) => ProfileResponse {
                ok: true,
                profile_json: Some(json),
                message: String::new(),
            },
            Err(err) => profile_failure(err.to_string()),
        },
        Ok(None) => ProfileResponse {
            ok: true,
            profile_json: None,
            message: "Not signed in.".to_string(),
        },
        Err(err) => profile_failure(err.to_string()),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn add_allergy(allergy: String) -> ActionResponse {
    with_app(|app| match app.profiles().add_allergy(&allergy) {
        Ok(_) => ActionResponse::success(
            "Allergy Added",
            format!("Added {} to your medical information", allergy.trim()),
        ),
        Err(err) => ActionResponse::failure("Failed to update allergies", &err),
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn remove_allergy(index: u32) -> ActionResponse {
    with_app(|app| match app.profiles().remove_allergy(index as usize) {
        Ok(_) => ActionResponse::success(
            "Allergy Removed",
            "Your medical information has been updated",
        ),
        Err(err) => ActionResponse::failure("Failed to update allergies", &err),
    })
}

/// Nearby resources around the position reported by the host.
///
/// `latitude`/`longitude` are `None` when the host could not get a fix; the
/// configured default location is used then.
#[flutter_rust_bridge::frb(sync)]
pub fn nearby_resources(
    latitude: Option<f64>,
    longitude: Option<f64>,
    category: Option<String>,
) -> NearbyResponse {
    let category = category.as_deref().and_then(NearbyCategory::parse);
    let geolocator = HostPosition::from_fix(latitude, longitude);
    let view = match app() {
        Ok(app) => app.nearby_with(&geolocator, category),
        Err(_) => NearbyView {
            origin: resolve_location(&geolocator, &Location::chinhoyi()),
            resources: static_nearby(category),
        },
    };
    let items = view
        .resources
        .into_iter()
        .map(|resource| NearbyItem {
            name: resource.name.to_string(),
            category: resource.category.to_string(),
            address: resource.address.to_string(),
            phone: resource.phone.map(str::to_string),
            hours: resource.hours.map(str::to_string),
            distance_label: resource.distance_label(),
            call_url: resource.call_url(),
            map_url: resource.map_url(),
        })
        .collect();
    let origin = view.origin;
    NearbyResponse {
        latitude: origin.location.latitude,
        longitude: origin.location.longitude,
        notice_title: origin.fallback_notice.as_ref().map(|notice| notice.title.clone()),
        notice_message: origin.fallback_notice.and_then(|notice| notice.description),
        items,
    }
}

/// Default emergency directory for `tab` (`all|health|police|fire`).
#[flutter_rust_bridge::frb(sync)]
pub fn default_contacts(tab: String) -> Vec<DirectoryItem> {
    let tab = DirectoryTab::parse(&tab).unwrap_or(DirectoryTab::All);
    directory_tab(tab)
        .into_iter()
        .map(|contact| DirectoryItem {
            name: contact.name.to_string(),
            phone: contact.phone.to_string(),
            address: contact.address.to_string(),
            category: contact.category.to_string(),
            description: contact.description.to_string(),
            call_url: contact.call_url(),
            map_url: contact.map_url(),
        })
        .collect()
}

struct HostPosition(Result<Location, GeolocationError>);

impl HostPosition {
    fn from_fix(latitude: Option<f64>, longitude: Option<f64>) -> Self {
        match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Self(Ok(Location::new(latitude, longitude))),
            _ => Self(Err(GeolocationError::PermissionDenied)),
        }
    }
}

impl Geolocator for HostPosition {
    fn current_position(&self) -> Result<Location, GeolocationError> {
        self.0.clone()
    }
}

fn build_app(config: &mut AppConfig) -> Result<CrisisApp, String> {
    config
        .apply_env_with(|key| std::env::var(key).ok())
        .map_err(|err| err.to_string())?;
    if let BackendConfig::Local { database_path } = &mut config.backend {
        if database_path.is_none() {
            *database_path = Some(default_db_path());
        }
    }
    let app = CrisisApp::from_config(config).map_err(|err| err.to_string())?;
    info!("event=ffi_init module=ffi status=ok");
    Ok(app)
}

fn default_db_path() -> PathBuf {
    std::env::temp_dir().join(APP_DB_FILE_NAME)
}

/// Returns the running app, starting it from env config on first use.
fn app() -> Result<&'static CrisisApp, String> {
    APP.get_or_try_init(|| build_app(&mut AppConfig::default()))
        .map_err(|err| {
            warn!("event=ffi_init module=ffi status=error");
            err
        })
}

fn with_app(f: impl FnOnce(&CrisisApp) -> ActionResponse) -> ActionResponse {
    match app() {
        Ok(app) => f(app),
        Err(err) => ActionResponse::init_failure(err),
    }
}

fn find_contact(app: &CrisisApp, contact_id: &str) -> Result<Contact, ServiceError> {
    let id = parse_id("contact", contact_id)?;
    app.contacts()
        .list_contacts()?
        .into_iter()
        .find(|contact| contact.id == id)
        .ok_or_else(|| ServiceError::NotFound {
            what: "contact",
            id: contact_id.to_string(),
        })
}

fn parse_id(what: &'static str, raw: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ServiceError::NotFound {
        what,
        id: raw.to_string(),
    })
}

fn to_resource_item(resource: Resource) -> ResourceItem {
    ResourceItem {
        id: resource.id.to_string(),
        name: resource.name,
        description: resource.description,
        category: resource.category,
        location: resource.location,
        contact_info: resource.contact_info,
        website: resource.website,
        image_url: resource.image_url,
    }
}

fn to_contact_item(contact: Contact) -> ContactItem {
    ContactItem {
        id: contact.id.to_string(),
        is_shared: contact.is_shared(),
        name: contact.name,
        phone: contact.phone,
        email: contact.email,
        relationship: contact.relationship,
        kind: contact.kind,
        is_favorite: contact.is_favorite,
        is_emergency_contact: contact.is_emergency_contact,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
}

fn route_failure(path: &str, message: String) -> RouteResponse {
    RouteResponse {
        ok: false,
        path: path.to_string(),
        screen: String::new(),
        decision: String::new(),
        message,
    }
}

fn contacts_failure(message: String) -> ContactsResponse {
    ContactsResponse {
        ok: false,
        items: Vec::new(),
        message,
    }
}

fn resources_success(resources: Vec<Resource>) -> ResourcesResponse {
    ResourcesResponse {
        ok: true,
        message: format!("{} resource(s).", resources.len()),
        items: resources.into_iter().map(to_resource_item).collect(),
    }
}

fn resources_failure(message: String) -> ResourcesResponse {
    ResourcesResponse {
        ok: false,
        items: Vec::new(),
        message,
    }
}

fn resource_detail_failure(message: String) -> ResourceDetailResponse {
    ResourceDetailResponse {
        ok: false,
        item: None,
        saved: false,
        message,
    }
}

fn profile_failure(message: String) -> ProfileResponse {
    ProfileResponse {
        ok: false,
        profile_json: None,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, default_contacts, get_resource, init_logging, list_resources,
        nearby_resources, non_blank, parse_id, ping,
    };
    use crisisconnect_core::ServiceError;

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "/tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn nearby_without_fix_falls_back_with_notice() {
        let response = nearby_resources(None, None, None);
        assert_eq!(response.latitude, -17.3667);
        assert_eq!(response.longitude, 30.2);
        assert_eq!(
            response.notice_message.as_deref(),
            Some("Using default location: Chinhoyi")
        );
        assert_eq!(response.items.len(), 10);
        assert_eq!(response.items[0].distance_label, "0.6 km");
    }

    #[test]
    fn nearby_with_fix_uses_it() {
        let response = nearby_resources(Some(-17.8), Some(31.0), Some("police".to_string()));
        assert_eq!(response.latitude, -17.8);
        assert!(response.notice_title.is_none());
        assert_eq!(response.items.len(), 1);
    }

    #[test]
    fn directory_tab_defaults_to_all() {
        assert_eq!(default_contacts("unknown".to_string()).len(), 10);
        assert_eq!(default_contacts("health".to_string()).len(), 4);
    }

    #[test]
    fn blank_optionals_become_none() {
        assert_eq!(non_blank(Some("  ".to_string())), None);
        assert_eq!(non_blank(Some(" a ".to_string())), Some("a".to_string()));
    }

    #[test]
    fn malformed_ids_are_reported_as_not_found() {
        let err = parse_id("resource", " not-a-uuid ").expect_err("must not parse");
        assert_eq!(
            err,
            ServiceError::NotFound {
                what: "resource",
                id: " not-a-uuid ".to_string(),
            }
        );
        assert!(!get_resource("not-a-uuid".to_string()).ok);
    }

    #[test]
    fn resources_are_listed_and_fetched_by_id() {
        let listed = list_resources();
        assert!(listed.ok, "{}", listed.message);
        assert!(!listed.items.is_empty());

        let first = listed.items[0].clone();
        let detail = get_resource(first.id.clone());
        assert!(detail.ok, "{}", detail.message);
        assert_eq!(detail.item, Some(first));
    }
}
