//! Contact record (`contacts` table).
//!
//! # Invariants
//! - `user_id == None` marks a default/shared contact: readable by everyone,
//!   writable by nobody through this client.

use crate::model::identity::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ContactId = Uuid;

/// Contact type used for emergency contacts added from the profile screen.
pub const CONTACT_TYPE_EMERGENCY: &str = "emergency";
/// Contact type used when the caller does not specify one.
pub const CONTACT_TYPE_PERSONAL: &str = "personal";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub relationship: Option<String>,
    /// Serialized as `type` to match the table column.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub is_favorite: bool,
    pub created_at: String,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub is_emergency_contact: bool,
}

impl Contact {
    /// Returns whether this is a default/shared record.
    pub fn is_shared(&self) -> bool {
        self.user_id.is_none()
    }
}

/// Insert shape; id, `created_at` and `user_id` are assigned by the accessor
/// and the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewContact {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub relationship: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub is_favorite: bool,
    pub is_emergency_contact: bool,
}

impl NewContact {
    pub fn personal(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            email: None,
            relationship: None,
            kind: CONTACT_TYPE_PERSONAL.to_string(),
            is_favorite: false,
            is_emergency_contact: false,
        }
    }
}

/// Partial update for a contact row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<Option<String>>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_emergency_contact: Option<bool>,
}

/// Emergency-contact form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmergencyContactInput {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub relationship: Option<String>,
}

impl EmergencyContactInput {
    /// Insert shape: favorite emergency contact; blank optionals become null.
    pub fn to_new_contact(&self) -> NewContact {
        NewContact {
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: blank_to_none(self.email.as_deref()),
            relationship: blank_to_none(self.relationship.as_deref()),
            kind: CONTACT_TYPE_EMERGENCY.to_string(),
            is_favorite: true,
            is_emergency_contact: true,
        }
    }
}

fn blank_to_none(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::{Contact, ContactPatch, EmergencyContactInput, CONTACT_TYPE_EMERGENCY};

    #[test]
    fn contact_without_owner_is_shared() {
        let contact: Contact = serde_json::from_value(serde_json::json!({
            "id": "5d0c1a4e-0001-4000-8000-000000000001",
            "name": "Chinhoyi Provincial Hospital",
            "phone": "+263 67 2122461",
            "type": "health",
            "is_favorite": true,
            "created_at": "2024-01-01T00:00:00.000Z",
            "user_id": null
        }))
        .expect("deserialize contact");
        assert!(contact.is_shared());
        assert_eq!(contact.kind, "health");
    }

    #[test]
    fn emergency_input_maps_blank_optionals_to_null() {
        let input = EmergencyContactInput {
            name: " Rudo ".to_string(),
            phone: "+263 77 123 4567".to_string(),
            email: Some("  ".to_string()),
            relationship: Some("Sister".to_string()),
        };
        let contact = input.to_new_contact();
        assert_eq!(contact.name, "Rudo");
        assert_eq!(contact.email, None);
        assert_eq!(contact.relationship.as_deref(), Some("Sister"));
        assert_eq!(contact.kind, CONTACT_TYPE_EMERGENCY);
        assert!(contact.is_favorite && contact.is_emergency_contact);
    }

    #[test]
    fn patch_renames_kind_to_type() {
        let patch = ContactPatch {
            kind: Some("family".to_string()),
            email: Some(None),
            ..ContactPatch::default()
        };
        let value = serde_json::to_value(&patch).expect("serialize patch");
        assert_eq!(value["type"], "family");
        assert!(value.get("email").expect("email key").is_null());
        assert!(value.get("name").is_none());
    }
}
