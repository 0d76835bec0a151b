//! Profile accessor: read, partial update, onboarding upsert.

use super::error::{ServiceError, ServiceResult};
use super::onboarding::OnboardingDetails;
use super::pending::PendingWrites;
use super::ServiceContext;
use crate::backend::{from_row, to_row, Table, TableQuery};
use crate::cache::{QueryKey, WriteOp};
use crate::model::identity::UserId;
use crate::model::profile::{
    join_allergies, MedicalInfoInput, PersonalInfoInput, Profile, ProfilePatch,
};
use crate::model::validation::{is_valid_phone, ValidationError};
use log::{info, warn};
use serde_json::Value;

pub struct ProfileService {
    ctx: ServiceContext,
    pending: PendingWrites,
}

impl ProfileService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            ctx,
            pending: PendingWrites::new(),
        }
    }

    /// Profile of the signed-in user; `None` when signed out.
    pub fn get_profile(&self) -> ServiceResult<Option<Profile>> {
        let Some(identity) = self.ctx.session.identity() else {
            return Ok(None);
        };
        self.ctx
            .cache
            .read(&QueryKey::profile(identity.id), || {
                self.fetch_profile(identity.id)
            })
            .map(Some)
    }

    /// Applies `patch` to the signed-in user's profile row.
    pub fn update_profile(&self, patch: &ProfilePatch) -> ServiceResult<Profile> {
        self.update_with(WriteOp::UpdateProfile, patch)
    }

    pub fn save_personal_info(&self, input: &PersonalInfoInput) -> ServiceResult<Profile> {
        let phone = input.phone.trim();
        if !phone.is_empty() && !is_valid_phone(phone) {
            return Err(ValidationError::InvalidPhone(phone.to_string()).into());
        }
        self.update_profile(&input.to_patch())
    }

    pub fn save_medical_info(&self, input: &MedicalInfoInput) -> ServiceResult<Profile> {
        self.update_profile(&input.to_patch())
    }

    /// Appends one allergy to the stored list.
    pub fn add_allergy(&self, allergy: &str) -> ServiceResult<Profile> {
        let allergy = allergy.trim();
        if allergy.is_empty() {
            return Err(ValidationError::MissingField("allergy").into());
        }
        let mut allergies = self.current_allergies()?;
        allergies.push(allergy.to_string());
        self.update_profile(&allergies_patch(&allergies))
    }

    /// Removes the allergy at `index` of the stored list.
    pub fn remove_allergy(&self, index: usize) -> ServiceResult<Profile> {
        let mut allergies = self.current_allergies()?;
        if index >= allergies.len() {
            return Err(ServiceError::NotFound {
                what: "allergy",
                id: index.to_string(),
            });
        }
        allergies.remove(index);
        self.update_profile(&allergies_patch(&allergies))
    }

    /// Upserts onboarding details and marks onboarding complete.
    pub fn complete_onboarding(&self, details: &OnboardingDetails) -> ServiceResult<Profile> {
        details.validate()?;
        let identity = self.ctx.require_identity()?;
        let _ticket = self
            .pending
            .begin(WriteOp::CompleteOnboarding, identity.id.to_string())?;

        let mut row = to_row(details)?;
        row.insert("id".to_string(), Value::String(identity.id.to_string()));
        row.insert("onboarding_completed".to_string(), Value::Bool(true));

        let stored = self.ctx.data.upsert(Table::Profiles, row).map_err(|err| {
            warn!(
                "event=profile_write module=service op=complete_onboarding status=error kind={}",
                err.kind.as_str()
            );
            err
        })?;
        self.ctx.cache.apply_write(WriteOp::CompleteOnboarding);
        info!("event=profile_write module=service op=complete_onboarding status=ok");
        Ok(from_row(Table::Profiles, stored)?)
    }

    fn update_with(&self, op: WriteOp, patch: &ProfilePatch) -> ServiceResult<Profile> {
        let identity = self.ctx.require_identity()?;
        let _ticket = self.pending.begin(op, identity.id.to_string())?;

        let query = TableQuery::new(Table::Profiles).eq("id", identity.id.to_string());
        let rows = self
            .ctx
            .data
            .update(&query, to_row(patch)?)
            .map_err(|err| {
                warn!(
                    "event=profile_write module=service op={} status=error kind={}",
                    op.as_str(),
                    err.kind.as_str()
                );
                err
            })?;
        let Some(row) = rows.into_iter().next() else {
            return Err(ServiceError::NotFound {
                what: "profile",
                id: identity.id.to_string(),
            });
        };
        self.ctx.cache.apply_write(op);
        info!(
            "event=profile_write module=service op={} status=ok",
            op.as_str()
        );
        Ok(from_row(Table::Profiles, row)?)
    }

    fn current_allergies(&self) -> ServiceResult<Vec<String>> {
        match self.get_profile()? {
            Some(profile) => Ok(profile.allergy_list()),
            None => Err(ServiceError::NotAuthenticated),
        }
    }

    fn fetch_profile(&self, id: UserId) -> ServiceResult<Profile> {
        let query = TableQuery::new(Table::Profiles)
            .eq("id", id.to_string())
            .limit(1);
        let row = self
            .ctx
            .data
            .select(&query)?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::NotFound {
                what: "profile",
                id: id.to_string(),
            })?;
        Ok(from_row(Table::Profiles, row)?)
    }
}

fn allergies_patch(allergies: &[String]) -> ProfilePatch {
    ProfilePatch {
        allergies: Some(Some(join_allergies(allergies))),
        ..ProfilePatch::default()
    }
}
