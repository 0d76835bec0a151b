use crate::model::identity::UserId;
use std::fmt::{Display, Formatter};

/// Resource family a cached read belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QueryKind {
    Profile,
    Contacts,
    Resources,
    Resource,
    SavedResources,
}

impl QueryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Contacts => "contacts",
            Self::Resources => "resources",
            Self::Resource => "resource",
            Self::SavedResources => "saved_resources",
        }
    }
}

/// Resource-identity tuple identifying one cached read,
/// e.g. `("profile", user_id)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueryKey {
    pub kind: QueryKind,
    pub scope: Option<String>,
}

impl QueryKey {
    pub fn new(kind: QueryKind, scope: Option<String>) -> Self {
        Self { kind, scope }
    }

    pub fn profile(user_id: UserId) -> Self {
        Self::new(QueryKind::Profile, Some(user_id.to_string()))
    }

    /// Contacts visible to `user_id`; anonymous visitors only see shared ones.
    pub fn contacts(user_id: Option<UserId>) -> Self {
        Self::new(QueryKind::Contacts, user_id.map(|id| id.to_string()))
    }

    pub fn resources() -> Self {
        Self::new(QueryKind::Resources, None)
    }

    pub fn resource(id: impl Display) -> Self {
        Self::new(QueryKind::Resource, Some(id.to_string()))
    }

    pub fn saved_resources(user_id: UserId) -> Self {
        Self::new(QueryKind::SavedResources, Some(user_id.to_string()))
    }
}

impl Display for QueryKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{}:{scope}", self.kind.as_str()),
            None => f.write_str(self.kind.as_str()),
        }
    }
}
