//! Profile record (`profiles` table) and partial-update patch.
//!
//! # Invariants
//! - `id` equals the owning user's identity id.
//! - `allergies` is stored as one comma-separated string.

use crate::model::identity::{UserId, UserIdentity};
use serde::{Deserialize, Serialize};

/// Personal and medical information for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub allergies: Option<String>,
    #[serde(default)]
    pub blood_type: Option<String>,
    #[serde(default)]
    pub medications: Option<String>,
    #[serde(default)]
    pub medical_conditions: Option<String>,
    #[serde(default)]
    pub emergency_contact_name: Option<String>,
    #[serde(default)]
    pub emergency_contact_phone: Option<String>,
    #[serde(default)]
    pub emergency_contact_email: Option<String>,
    /// ISO date (`YYYY-MM-DD`).
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub onboarding_completed: bool,
}

impl Profile {
    /// Parsed allergy list.
    pub fn allergy_list(&self) -> Vec<String> {
        self.allergies
            .as_deref()
            .map(parse_allergies)
            .unwrap_or_default()
    }

    /// Name shown on the personal-info screen.
    ///
    /// Prefers first/last name, then sign-up `full_name`, then the email
    /// local part.
    pub fn display_name(&self, identity: &UserIdentity) -> String {
        let first = self.first_name.as_deref().unwrap_or_default();
        let last = self.last_name.as_deref().unwrap_or_default();
        if !first.is_empty() || !last.is_empty() {
            return format!("{first} {last}").trim().to_string();
        }
        if let Some(full_name) = identity.full_name.as_deref().filter(|v| !v.is_empty()) {
            return full_name.to_string();
        }
        identity.email_handle().to_string()
    }
}

/// Partial update for a profile row.
///
/// `None` leaves a column untouched, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergies: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_type: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medications: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_conditions: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_contact_name: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_contact_phone: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_contact_email: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboarding_completed: Option<bool>,
}

impl ProfilePatch {
    /// Returns whether the patch would not change any column.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Input of the personal-info form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonalInfoInput {
    /// Full name as typed; the first word becomes `first_name`.
    pub name: String,
    pub phone: String,
    pub address: String,
    pub date_of_birth: String,
}

impl PersonalInfoInput {
    /// Converts the form into a patch; blank fields clear their column.
    pub fn to_patch(&self) -> ProfilePatch {
        let (first, last) = split_full_name(&self.name);
        ProfilePatch {
            first_name: Some(first),
            last_name: Some(last),
            phone: Some(non_blank(&self.phone)),
            address: Some(non_blank(&self.address)),
            date_of_birth: Some(non_blank(&self.date_of_birth)),
            ..ProfilePatch::default()
        }
    }
}

/// Input of the medical-info form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MedicalInfoInput {
    pub blood_type: String,
    pub medications: String,
    pub medical_conditions: String,
}

impl MedicalInfoInput {
    pub fn to_patch(&self) -> ProfilePatch {
        ProfilePatch {
            blood_type: Some(Some(self.blood_type.clone())),
            medications: Some(Some(self.medications.clone())),
            medical_conditions: Some(Some(self.medical_conditions.clone())),
            ..ProfilePatch::default()
        }
    }
}

/// Splits a comma-separated allergy string, trimming and dropping blanks.
pub fn parse_allergies(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Joins allergies back into their stored form.
pub fn join_allergies(items: &[String]) -> String {
    items.join(", ")
}

/// Splits `"Tariro Anesu Moyo"` into `("Tariro", "Anesu Moyo")`.
pub fn split_full_name(name: &str) -> (Option<String>, Option<String>) {
    let mut parts = name.split_whitespace();
    let first = parts.next().map(str::to_string);
    let rest = parts.collect::<Vec<_>>().join(" ");
    let last = if rest.is_empty() { None } else { Some(rest) };
    (first, last)
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        join_allergies, parse_allergies, split_full_name, PersonalInfoInput, Profile,
        ProfilePatch,
    };
    use crate::model::identity::UserIdentity;
    use uuid::Uuid;

    fn empty_profile(id: Uuid) -> Profile {
        serde_json::from_value(serde_json::json!({ "id": id })).expect("minimal profile")
    }

    #[test]
    fn allergies_parse_and_join_symmetrically() {
        let parsed = parse_allergies("Penicillin,  peanuts , ,latex");
        assert_eq!(parsed, vec!["Penicillin", "peanuts", "latex"]);
        assert_eq!(join_allergies(&parsed), "Penicillin, peanuts, latex");
        assert!(parse_allergies("").is_empty());
    }

    #[test]
    fn split_full_name_keeps_trailing_words_together() {
        assert_eq!(
            split_full_name("Tariro Anesu Moyo"),
            (Some("Tariro".to_string()), Some("Anesu Moyo".to_string()))
        );
        assert_eq!(split_full_name("Tariro"), (Some("Tariro".to_string()), None));
        assert_eq!(split_full_name("   "), (None, None));
    }

    #[test]
    fn display_name_falls_back_to_email_handle() {
        let id = Uuid::new_v4();
        let identity = UserIdentity::new(id, "rudo@example.com");
        let mut profile = empty_profile(id);
        assert_eq!(profile.display_name(&identity), "rudo");

        profile.last_name = Some("Moyo".to_string());
        assert_eq!(profile.display_name(&identity), "Moyo");
    }

    #[test]
    fn patch_serializes_only_touched_columns() {
        let patch = PersonalInfoInput {
            name: "Rudo Moyo".to_string(),
            phone: String::new(),
            ..PersonalInfoInput::default()
        }
        .to_patch();
        let value = serde_json::to_value(&patch).expect("serialize patch");
        assert_eq!(value["first_name"], "Rudo");
        assert_eq!(value["last_name"], "Moyo");
        assert!(value["phone"].is_null());
        assert!(value.get("blood_type").is_none());
        assert!(ProfilePatch::default().is_empty());
    }
}
