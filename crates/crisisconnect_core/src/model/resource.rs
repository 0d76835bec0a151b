//! Resource records (`resources`, `saved_resources`).

use crate::model::identity::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ResourceId = Uuid;

/// Informational emergency resource shown on the resources screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub contact_info: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub created_at: String,
}

/// Bookmark linking a user to a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedResource {
    pub id: Uuid,
    pub user_id: UserId,
    pub resource_id: ResourceId,
    pub created_at: String,
}
