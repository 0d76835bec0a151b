//! Contacts accessor.
//!
//! # Invariants
//! - Shared contacts (`user_id == None`) are never sent to the backend for
//!   update or delete.
//! - The contacts list is the caller's own contacts followed by the shared
//!   defaults.

use super::error::{ServiceError, ServiceResult};
use super::pending::PendingWrites;
use super::ServiceContext;
use crate::backend::{from_row, from_rows, to_row, Table, TableQuery};
use crate::cache::{QueryKey, WriteOp};
use crate::model::contact::{Contact, ContactPatch, EmergencyContactInput, NewContact};
use crate::model::identity::{UserId, UserIdentity};
use crate::model::profile::ProfilePatch;
use crate::model::validation::{is_valid_phone, validate_emergency_contact, ValidationError};
use log::{info, warn};
use serde_json::Value;

pub struct ContactsService {
    ctx: ServiceContext,
    pending: PendingWrites,
}

impl ContactsService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            ctx,
            pending: PendingWrites::new(),
        }
    }

    /// Own contacts (favorites first, newest first), then shared defaults.
    pub fn list_contacts(&self) -> ServiceResult<Vec<Contact>> {
        let owner = self.ctx.session.identity().map(|identity| identity.id);
        self.ctx
            .cache
            .read(&QueryKey::contacts(owner), || self.fetch_contacts(owner))
    }

    /// Only the caller's emergency contacts.
    pub fn list_emergency_contacts(&self) -> ServiceResult<Vec<Contact>> {
        Ok(self
            .list_contacts()?
            .into_iter()
            .filter(|contact| contact.is_emergency_contact && !contact.is_shared())
            .collect())
    }

    pub fn create_contact(&self, contact: &NewContact) -> ServiceResult<Contact> {
        validate_new_contact(contact)?;
        let identity = self.ctx.require_identity()?;
        let _ticket = self.pending.begin(
            WriteOp::CreateContact,
            format!("{}|{}", contact.name.trim(), contact.phone.trim()),
        )?;
        let created = self.insert_owned(&identity, contact, WriteOp::CreateContact)?;
        self.ctx.cache.apply_write(WriteOp::CreateContact);
        Ok(created)
    }

    pub fn update_contact(&self, contact: &Contact, patch: &ContactPatch) -> ServiceResult<Contact> {
        let identity = self.check_writable(contact, WriteOp::UpdateContact)?;
        if let Some(phone) = patch.phone.as_deref() {
            if !is_valid_phone(phone.trim()) {
                return Err(ValidationError::InvalidPhone(phone.to_string()).into());
            }
        }
        let _ticket = self
            .pending
            .begin(WriteOp::UpdateContact, contact.id.to_string())?;

        let rows = self
            .ctx
            .data
            .update(&owned_contact_query(contact, identity.id), to_row(patch)?)
            .map_err(|err| log_write_error(WriteOp::UpdateContact, err))?;
        let Some(row) = rows.into_iter().next() else {
            return Err(ServiceError::NotFound {
                what: "contact",
                id: contact.id.to_string(),
            });
        };
        self.ctx.cache.apply_write(WriteOp::UpdateContact);
        info!("event=contact_write module=service op=update_contact status=ok");
        Ok(from_row(Table::Contacts, row)?)
    }

    pub fn delete_contact(&self, contact: &Contact) -> ServiceResult<()> {
        let identity = self.check_writable(contact, WriteOp::DeleteContact)?;
        let _ticket = self
            .pending
            .begin(WriteOp::DeleteContact, contact.id.to_string())?;

        let removed = self
            .ctx
            .data
            .delete(&owned_contact_query(contact, identity.id))
            .map_err(|err| log_write_error(WriteOp::DeleteContact, err))?;
        self.ctx.cache.apply_write(WriteOp::DeleteContact);
        info!("event=contact_write module=service op=delete_contact status=ok removed={removed}");
        Ok(())
    }

    /// Inserts an emergency contact and copies it onto the profile.
    ///
    /// A failed profile copy is logged; the contact insert still counts.
    pub fn add_emergency_contact(&self, input: &EmergencyContactInput) -> ServiceResult<Contact> {
        validate_emergency_contact(input)?;
        let identity = self.ctx.require_identity()?;
        let contact = input.to_new_contact();
        let _ticket = self.pending.begin(
            WriteOp::AddEmergencyContact,
            format!("{}|{}", contact.name, contact.phone),
        )?;

        let created = self.insert_owned(&identity, &contact, WriteOp::AddEmergencyContact)?;

        let profile_patch = ProfilePatch {
            emergency_contact_name: Some(Some(contact.name.clone())),
            emergency_contact_phone: Some(Some(contact.phone.clone())),
            emergency_contact_email: Some(contact.email.clone()),
            ..ProfilePatch::default()
        };
        let profile_query = TableQuery::new(Table::Profiles).eq("id", identity.id.to_string());
        let profile_result = to_row(&profile_patch)
            .and_then(|patch| self.ctx.data.update(&profile_query, patch));
        if let Err(err) = profile_result {
            warn!(
                "event=profile_write module=service op=add_emergency_contact status=error kind={} fatal=false",
                err.kind.as_str()
            );
        }

        self.ctx.cache.apply_write(WriteOp::AddEmergencyContact);
        Ok(created)
    }

    fn insert_owned(
        &self,
        identity: &UserIdentity,
        contact: &NewContact,
        op: WriteOp,
    ) -> ServiceResult<Contact> {
        let mut row = to_row(contact)?;
        row.insert("user_id".to_string(), Value::String(identity.id.to_string()));
        let stored = self
            .ctx
            .data
            .insert(Table::Contacts, row)
            .map_err(|err| log_write_error(op, err))?;
        info!(
            "event=contact_write module=service op={} status=ok",
            op.as_str()
        );
        Ok(from_row(Table::Contacts, stored)?)
    }

    /// Local ownership check; never touches the backend.
    fn check_writable(&self, contact: &Contact, op: WriteOp) -> ServiceResult<UserIdentity> {
        let Some(owner) = contact.user_id else {
            info!(
                "event=contact_write module=service op={} status=rejected reason=shared_record",
                op.as_str()
            );
            return Err(ServiceError::SharedRecordReadOnly);
        };
        let identity = self.ctx.require_identity()?;
        if owner != identity.id {
            info!(
                "event=contact_write module=service op={} status=rejected reason=not_owner",
                op.as_str()
            );
            return Err(ServiceError::NotOwner);
        }
        Ok(identity)
    }

    fn fetch_contacts(&self, owner: Option<UserId>) -> ServiceResult<Vec<Contact>> {
        let mut contacts = Vec::new();
        if let Some(owner) = owner {
            let own = TableQuery::new(Table::Contacts)
                .eq("user_id", owner.to_string())
                .order("is_favorite", false)
                .order("created_at", false);
            contacts = from_rows(Table::Contacts, self.ctx.data.select(&own)?)?;
        }
        let defaults = TableQuery::new(Table::Contacts)
            .is_null("user_id")
            .order("is_favorite", false);
        let shared: Vec<Contact> = from_rows(Table::Contacts, self.ctx.data.select(&defaults)?)?;
        contacts.extend(shared);
        Ok(contacts)
    }
}

fn owned_contact_query(contact: &Contact, owner: UserId) -> TableQuery {
    TableQuery::new(Table::Contacts)
        .eq("id", contact.id.to_string())
        .eq("user_id", owner.to_string())
}

fn validate_new_contact(contact: &NewContact) -> Result<(), ValidationError> {
    if contact.name.trim().is_empty() {
        return Err(ValidationError::MissingField("name"));
    }
    let phone = contact.phone.trim();
    if phone.is_empty() {
        return Err(ValidationError::MissingField("phone number"));
    }
    if !is_valid_phone(phone) {
        return Err(ValidationError::InvalidPhone(phone.to_string()));
    }
    Ok(())
}

fn log_write_error(op: WriteOp, err: crate::backend::BackendError) -> crate::backend::BackendError {
    warn!(
        "event=contact_write module=service op={} status=error kind={}",
        op.as_str(),
        err.kind.as_str()
    );
    err
}
