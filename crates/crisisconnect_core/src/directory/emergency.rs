//! Default emergency contacts directory.

use super::links::{address_map_url, tel_url};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryTab {
    All,
    /// Health and ambulance entries.
    Health,
    Police,
    Fire,
}

impl DirectoryTab {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "all" => Some(Self::All),
            "health" => Some(Self::Health),
            "police" => Some(Self::Police),
            "fire" => Some(Self::Fire),
            _ => None,
        }
    }

    fn matches(self, category: &str) -> bool {
        match self {
            Self::All => true,
            Self::Health => category == "health" || category == "ambulance",
            Self::Police => category == "police",
            Self::Fire => category == "fire",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryContact {
    pub name: &'static str,
    pub phone: &'static str,
    pub address: &'static str,
    pub category: &'static str,
    pub description: &'static str,
}

impl DirectoryContact {
    pub fn call_url(&self) -> String {
        tel_url(self.phone)
    }

    pub fn map_url(&self) -> String {
        address_map_url(self.address)
    }
}

macro_rules! contact {
    ($name:expr, $phone:expr, $address:expr, $category:expr, $description:expr) => {
        DirectoryContact {
            name: $name,
            phone: $phone,
            address: $address,
            category: $category,
            description: $description,
        }
    };
}

const DIRECTORY: [DirectoryContact; 10] = [
    contact!("Chinhoyi Provincial Hospital", "+263 67 2122461", "Magamba Way, Chinhoyi", "health", "Main provincial hospital offering emergency services"),
    contact!("Chinhoyi Central Police Station", "+263 67 2122330", "Independence Way, Chinhoyi", "police", "Main police station for emergencies and crime reporting"),
    contact!("Chinhoyi Fire Department", "+263 67 2122664", "Magamba Way, Chinhoyi", "fire", "Fire emergency services for Chinhoyi and surrounding areas"),
    contact!("Chinhoyi Ambulance Services", "+263 67 2122461", "Provincial Hospital, Chinhoyi", "ambulance", "Emergency medical transportation services"),
    contact!("ZESA Emergency (Electricity)", "+263 67 2122225", "23 Commercial Road, Chinhoyi", "utility", "Power outages and electrical emergencies"),
    contact!("Chinhoyi Municipality", "+263 67 2125431", "93 Midway Street, Chinhoyi", "government", "Municipal emergency services and reporting"),
    contact!("Makonde Christian Hospital", "+263 67 2122873", "Lomagundi Road, Chinhoyi", "health", "Private hospital with emergency department"),
    contact!("Zimbabwe Red Cross (Chinhoyi)", "+263 67 2122664", "15 Magamba Way, Chinhoyi", "health", "Disaster response and emergency relief services"),
    contact!("Chinhoyi Traffic Department", "+263 67 2122287", "Independence Way, Chinhoyi", "police", "Traffic emergencies and accidents reporting"),
    contact!("Chinhoyi Civil Protection Unit", "+263 67 2125665", "Government Complex, Chinhoyi", "government", "Disaster management and civil protection"),
];

pub fn default_directory() -> &'static [DirectoryContact] {
    &DIRECTORY
}

/// Entries shown under `tab`, in directory order.
pub fn directory_tab(tab: DirectoryTab) -> Vec<DirectoryContact> {
    DIRECTORY
        .iter()
        .filter(|contact| tab.matches(contact.category))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{default_directory, directory_tab, DirectoryTab};

    #[test]
    fn health_tab_includes_ambulance() {
        let health = directory_tab(DirectoryTab::Health);
        assert_eq!(health.len(), 4);
        assert!(health.iter().any(|contact| contact.category == "ambulance"));
    }

    #[test]
    fn all_tab_is_full_directory() {
        assert_eq!(
            directory_tab(DirectoryTab::All).len(),
            default_directory().len()
        );
        assert_eq!(directory_tab(DirectoryTab::Police).len(), 2);
        assert_eq!(DirectoryTab::parse("fire"), Some(DirectoryTab::Fire));
    }

    #[test]
    fn map_url_uses_address_only() {
        let contact = &directory_tab(DirectoryTab::Fire)[0];
        assert!(contact
            .map_url()
            .ends_with("Magamba%20Way%2C%20Chinhoyi%2C%20Chinhoyi%2C%20Zimbabwe"));
    }
}
