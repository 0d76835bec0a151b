//! Write → stale read-kind mapping.

use super::key::QueryKind;

/// Every mutation the accessors can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WriteOp {
    UpdateProfile,
    CompleteOnboarding,
    CreateContact,
    UpdateContact,
    DeleteContact,
    AddEmergencyContact,
    SaveResource,
    UnsaveResource,
}

/// Read kinds each write marks stale after confirmed success.
pub const INVALIDATION_TABLE: &[(WriteOp, &[QueryKind])] = &[
    (WriteOp::UpdateProfile, &[QueryKind::Profile]),
    (WriteOp::CompleteOnboarding, &[QueryKind::Profile]),
    (WriteOp::CreateContact, &[QueryKind::Contacts]),
    (WriteOp::UpdateContact, &[QueryKind::Contacts]),
    (WriteOp::DeleteContact, &[QueryKind::Contacts]),
    (
        WriteOp::AddEmergencyContact,
        &[QueryKind::Contacts, QueryKind::Profile],
    ),
    (WriteOp::SaveResource, &[QueryKind::SavedResources]),
    (WriteOp::UnsaveResource, &[QueryKind::SavedResources]),
];

impl WriteOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UpdateProfile => "update_profile",
            Self::CompleteOnboarding => "complete_onboarding",
            Self::CreateContact => "create_contact",
            Self::UpdateContact => "update_contact",
            Self::DeleteContact => "delete_contact",
            Self::AddEmergencyContact => "add_emergency_contact",
            Self::SaveResource => "save_resource",
            Self::UnsaveResource => "unsave_resource",
        }
    }

    /// Read kinds this write makes stale.
    pub fn invalidates(self) -> &'static [QueryKind] {
        INVALIDATION_TABLE
            .iter()
            .find(|(op, _)| *op == self)
            .map(|(_, kinds)| *kinds)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::{WriteOp, INVALIDATION_TABLE};
    use crate::cache::QueryKind;

    const ALL_WRITES: &[WriteOp] = &[
        WriteOp::UpdateProfile,
        WriteOp::CompleteOnboarding,
        WriteOp::CreateContact,
        WriteOp::UpdateContact,
        WriteOp::DeleteContact,
        WriteOp::AddEmergencyContact,
        WriteOp::SaveResource,
        WriteOp::UnsaveResource,
    ];

    #[test]
    fn every_write_invalidates_something() {
        for op in ALL_WRITES {
            assert!(!op.invalidates().is_empty(), "{} has no entry", op.as_str());
        }
        assert_eq!(INVALIDATION_TABLE.len(), ALL_WRITES.len());
    }

    #[test]
    fn emergency_contact_add_touches_contacts_and_profile() {
        let kinds = WriteOp::AddEmergencyContact.invalidates();
        assert!(kinds.contains(&QueryKind::Contacts));
        assert!(kinds.contains(&QueryKind::Profile));
    }

    #[test]
    fn contact_writes_leave_profile_alone() {
        for op in [
            WriteOp::CreateContact,
            WriteOp::UpdateContact,
            WriteOp::DeleteContact,
        ] {
            assert_eq!(op.invalidates(), &[QueryKind::Contacts]);
        }
    }
}
