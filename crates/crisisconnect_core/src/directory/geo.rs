//! Device position lookup with a fallback location.

use crate::service::{Notice, NoticeLevel};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const FALLBACK_LATITUDE: f64 = -17.3667;
pub const FALLBACK_LONGITUDE: f64 = 30.2;
pub const FALLBACK_LABEL: &str = "Chinhoyi";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Human-readable name; only set for configured locations.
    #[serde(default)]
    pub label: Option<String>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            label: None,
        }
    }

    pub fn chinhoyi() -> Self {
        Self {
            latitude: FALLBACK_LATITUDE,
            longitude: FALLBACK_LONGITUDE,
            label: Some(FALLBACK_LABEL.to_string()),
        }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::chinhoyi()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeolocationError {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
    /// The device has no geolocation capability.
    Unsupported,
}

impl GeolocationError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission_denied",
            Self::PositionUnavailable => "position_unavailable",
            Self::Timeout => "timeout",
            Self::Unsupported => "unsupported",
        }
    }
}

impl Display for GeolocationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "location permission denied"),
            Self::PositionUnavailable => write!(f, "position unavailable"),
            Self::Timeout => write!(f, "location request timed out"),
            Self::Unsupported => write!(f, "geolocation is not supported"),
        }
    }
}

impl Error for GeolocationError {}

/// Device position source.
pub trait Geolocator: Send + Sync {
    fn current_position(&self) -> Result<Location, GeolocationError>;
}

/// Geolocator for hosts without location support.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedGeolocator;

impl Geolocator for UnsupportedGeolocator {
    fn current_position(&self) -> Result<Location, GeolocationError> {
        Err(GeolocationError::Unsupported)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub location: Location,
    /// Set when the fallback was used.
    pub fallback_notice: Option<Notice>,
}

impl ResolvedLocation {
    pub fn is_fallback(&self) -> bool {
        self.fallback_notice.is_some()
    }
}

/// Asks `geolocator` for a position and falls back to `fallback` on any error.
pub fn resolve_location(geolocator: &dyn Geolocator, fallback: &Location) -> ResolvedLocation {
    let failure = match geolocator.current_position() {
        Ok(location) if location.is_valid() => {
            info!("event=geolocation module=directory status=ok");
            return ResolvedLocation {
                location,
                fallback_notice: None,
            };
        }
        Ok(_) => GeolocationError::PositionUnavailable,
        Err(err) => err,
    };

    warn!(
        "event=geolocation module=directory status=fallback reason={}",
        failure.as_str()
    );
    let label = fallback.label.as_deref().unwrap_or(FALLBACK_LABEL);
    let title = match failure {
        GeolocationError::Unsupported => "Geolocation is not supported on this device",
        _ => "Couldn't access your location",
    };
    ResolvedLocation {
        location: fallback.clone(),
        fallback_notice: Some(Notice::new(
            NoticeLevel::Error,
            title,
            Some(format!("Using default location: {label}")),
        )),
    }
}
