//! Nearby emergency resources around Chinhoyi.

use super::links::{place_map_url, tel_url};
use serde::Serialize;

/// Distance used for sorting entries without a known distance.
const UNKNOWN_DISTANCE_KM: f64 = 999.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NearbyCategory {
    Hospital,
    Police,
    Fire,
    Pharmacy,
    Shelter,
}

impl NearbyCategory {
    pub const ALL: [NearbyCategory; 5] = [
        Self::Hospital,
        Self::Police,
        Self::Fire,
        Self::Pharmacy,
        Self::Shelter,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Hospital => "hospital",
            Self::Police => "police",
            Self::Fire => "fire",
            Self::Pharmacy => "pharmacy",
            Self::Shelter => "shelter",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Hospital => "Hospitals",
            Self::Police => "Police",
            Self::Fire => "Fire Dept.",
            Self::Pharmacy => "Pharmacy",
            Self::Shelter => "Shelters",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.id() == value.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyResource {
    pub id: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub address: &'static str,
    pub phone: Option<&'static str>,
    pub hours: Option<&'static str>,
    pub distance_km: Option<f64>,
}

impl NearbyResource {
    pub fn distance_label(&self) -> String {
        match self.distance_km {
            Some(km) if km > 0.0 => format!("{km:.1} km"),
            _ => "Unknown".to_string(),
        }
    }

    pub fn call_url(&self) -> Option<String> {
        self.phone.map(tel_url)
    }

    pub fn map_url(&self) -> String {
        place_map_url(self.name, self.address)
    }

    fn sort_distance(&self) -> f64 {
        match self.distance_km {
            Some(km) if km > 0.0 => km,
            _ => UNKNOWN_DISTANCE_KM,
        }
    }
}

const fn entry(
    id: &'static str,
    name: &'static str,
    category: &'static str,
    address: &'static str,
    phone: &'static str,
    hours: &'static str,
    distance_km: f64,
) -> NearbyResource {
    NearbyResource {
        id,
        name,
        category,
        address,
        phone: Some(phone),
        hours: Some(hours),
        distance_km: Some(distance_km),
    }
}

const NEARBY: [NearbyResource; 10] = [
    entry("1", "Chinhoyi Provincial Hospital", "hospital", "Magamba Way, Chinhoyi", "+263 67 2122461", "24/7", 0.8),
    entry("2", "ZRP Chinhoyi Central Police", "police", "Independence Way, Chinhoyi", "+263 67 2122330", "24/7", 1.5),
    entry("3", "Chinhoyi Fire Department", "fire", "Magamba Way, Chinhoyi", "+263 67 2122664", "24/7", 2.1),
    entry("4", "Makonde Christian Hospital", "hospital", "Lomagundi Road, Chinhoyi", "+263 67 2122873", "Mon-Sat: 8am-8pm, Sun: 9am-5pm", 4.3),
    entry("5", "Chinhoyi University Health Center", "clinic", "Chinhoyi University, Chinhoyi", "+263 67 2122100", "Mon-Fri: 8am-5pm", 3.7),
    entry("6", "Mzimba Pharmacy", "pharmacy", "Magamba Way, Chinhoyi", "+263 67 2122453", "Mon-Sat: 8am-7pm, Sun: 9am-1pm", 0.6),
    entry("7", "Red Cross First Aid Station", "first_aid", "15 Magamba Way, Chinhoyi", "+263 67 2122664", "Mon-Fri: 8am-5pm", 1.2),
    entry("8", "Chinhoyi Main Shelter", "shelter", "Community Center, Chinhoyi", "+263 67 2125431", "Available during emergencies", 2.8),
    entry("9", "Chinhoyi Food Distribution Center", "food", "93 Midway Street, Chinhoyi", "+263 67 2125431", "Mon-Fri: 10am-3pm", 3.2),
    entry("10", "Cell Network Emergency Station", "communication", "Chinhoyi Tower, Chinhoyi", "+263 67 2122287", "24/7 during emergencies", 5.4),
];

/// Nearby resources, optionally filtered, closest first.
pub fn nearby_resources(category: Option<NearbyCategory>) -> Vec<NearbyResource> {
    sort_by_distance(
        NEARBY
            .iter()
            .filter(|resource| category.map_or(true, |wanted| resource.category == wanted.id()))
            .cloned()
            .collect(),
    )
}

/// Stable ascending sort; unknown distances go last.
pub fn sort_by_distance(mut resources: Vec<NearbyResource>) -> Vec<NearbyResource> {
    resources.sort_by(|a, b| a.sort_distance().total_cmp(&b.sort_distance()));
    resources
}

#[cfg(test)]
mod tests {
    use super::{nearby_resources, sort_by_distance, NearbyCategory, NearbyResource};

    #[test]
    fn unfiltered_list_is_closest_first() {
        let resources = nearby_resources(None);
        assert_eq!(resources.len(), 10);
        assert_eq!(resources[0].name, "Mzimba Pharmacy");
        assert!(resources
            .windows(2)
            .all(|pair| pair[0].distance_km <= pair[1].distance_km));
    }

    #[test]
    fn category_filter_keeps_only_matches() {
        let hospitals = nearby_resources(Some(NearbyCategory::Hospital));
        assert_eq!(hospitals.len(), 2);
        assert_eq!(hospitals[0].distance_label(), "0.8 km");
        assert!(nearby_resources(NearbyCategory::parse("fire")).len() == 1);
    }

    #[test]
    fn unknown_distance_sorts_last_and_is_labelled() {
        let mut unknown = nearby_resources(None)[0].clone();
        unknown.distance_km = None;
        let near = nearby_resources(None)[1].clone();
        let sorted = sort_by_distance(vec![unknown, near.clone()]);
        assert_eq!(sorted[0], near);
        assert_eq!(sorted[1].distance_label(), "Unknown");
    }

    #[test]
    fn links_are_derived_from_entry() {
        let pharmacy: &NearbyResource = &nearby_resources(Some(NearbyCategory::Pharmacy))[0];
        assert_eq!(pharmacy.call_url().as_deref(), Some("tel:+263 67 2122453"));
        assert!(pharmacy.map_url().contains("Mzimba%20Pharmacy"));
    }
}
