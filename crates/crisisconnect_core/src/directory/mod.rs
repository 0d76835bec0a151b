//! Static emergency directories and device-facing helpers.
//!
//! # Responsibility
//! - Resolve the user's position with a fixed fallback location.
//! - Serve the nearby-resources list and the default contacts directory.
//! - Build `tel:` and map search links.

pub mod emergency;
pub mod geo;
pub mod links;
pub mod nearby;

pub use emergency::{default_directory, directory_tab, DirectoryContact, DirectoryTab};
pub use geo::{
    resolve_location, GeolocationError, Geolocator, Location, ResolvedLocation,
    UnsupportedGeolocator,
};
pub use links::{map_search_url, tel_url};
pub use nearby::{nearby_resources, NearbyCategory, NearbyResource};
