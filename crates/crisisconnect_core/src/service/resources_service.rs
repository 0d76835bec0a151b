//! Resources accessor: catalogue reads and saved-resource bookmarks.

use super::error::{ServiceError, ServiceResult};
use super::pending::PendingWrites;
use super::ServiceContext;
use crate::backend::{from_row, from_rows, Table, TableQuery};
use crate::cache::{QueryKey, WriteOp};
use crate::model::resource::{Resource, ResourceId, SavedResource};
use log::{info, warn};
use serde_json::{Map, Value};

pub struct ResourcesService {
    ctx: ServiceContext,
    pending: PendingWrites,
}

impl ResourcesService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            ctx,
            pending: PendingWrites::new(),
        }
    }

    /// All resources ordered by name.
    pub fn list_resources(&self) -> ServiceResult<Vec<Resource>> {
        self.ctx.cache.read(&QueryKey::resources(), || {
            let query = TableQuery::new(Table::Resources).order("name", true);
            Ok(from_rows(Table::Resources, self.ctx.data.select(&query)?)?)
        })
    }

    pub fn get_resource(&self, id: ResourceId) -> ServiceResult<Resource> {
        self.ctx.cache.read(&QueryKey::resource(id), || {
            let query = TableQuery::new(Table::Resources)
                .eq("id", id.to_string())
                .limit(1);
            let row = self
                .ctx
                .data
                .select(&query)?
                .into_iter()
                .next()
                .ok_or_else(|| ServiceError::NotFound {
                    what: "resource",
                    id: id.to_string(),
                })?;
            Ok(from_row(Table::Resources, row)?)
        })
    }

    /// Bookmarks of the signed-in user; empty when signed out.
    pub fn list_saved_resources(&self) -> ServiceResult<Vec<SavedResource>> {
        let Some(identity) = self.ctx.session.identity() else {
            return Ok(Vec::new());
        };
        self.ctx
            .cache
            .read(&QueryKey::saved_resources(identity.id), || {
                let query = TableQuery::new(Table::SavedResources)
                    .eq("user_id", identity.id.to_string());
                Ok(from_rows(
                    Table::SavedResources,
                    self.ctx.data.select(&query)?,
                )?)
            })
    }

    pub fn is_saved(&self, resource_id: ResourceId) -> ServiceResult<bool> {
        Ok(self
            .list_saved_resources()?
            .iter()
            .any(|saved| saved.resource_id == resource_id))
    }

    pub fn save_resource(&self, resource_id: ResourceId) -> ServiceResult<SavedResource> {
        let identity = self.ctx.require_identity()?;
        let _ticket = self
            .pending
            .begin(WriteOp::SaveResource, resource_id.to_string())?;

        let mut row = Map::new();
        row.insert("user_id".to_string(), Value::String(identity.id.to_string()));
        row.insert(
            "resource_id".to_string(),
            Value::String(resource_id.to_string()),
        );
        let stored = self
            .ctx
            .data
            .insert(Table::SavedResources, row)
            .map_err(|err| {
                warn!(
                    "event=resource_write module=service op=save_resource status=error kind={}",
                    err.kind.as_str()
                );
                err
            })?;
        self.ctx.cache.apply_write(WriteOp::SaveResource);
        info!("event=resource_write module=service op=save_resource status=ok");
        Ok(from_row(Table::SavedResources, stored)?)
    }

    pub fn unsave_resource(&self, resource_id: ResourceId) -> ServiceResult<()> {
        let identity = self.ctx.require_identity()?;
        let _ticket = self
            .pending
            .begin(WriteOp::UnsaveResource, resource_id.to_string())?;

        let query = TableQuery::new(Table::SavedResources)
            .eq("user_id", identity.id.to_string())
            .eq("resource_id", resource_id.to_string());
        let removed = self.ctx.data.delete(&query).map_err(|err| {
            warn!(
                "event=resource_write module=service op=unsave_resource status=error kind={}",
                err.kind.as_str()
            );
            err
        })?;
        self.ctx.cache.apply_write(WriteOp::UnsaveResource);
        info!("event=resource_write module=service op=unsave_resource status=ok removed={removed}");
        Ok(())
    }
}
