//! Authenticated identity and auth-state notifications.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable user reference issued by the auth backend.
pub type UserId = Uuid;

/// Identity reported by the auth backend for a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: UserId,
    pub email: String,
    /// Sign-up metadata (`full_name`), when the user provided one.
    #[serde(default)]
    pub full_name: Option<String>,
}

impl UserIdentity {
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            full_name: None,
        }
    }

    /// Local part of the email address, used as a last-resort display name.
    pub fn email_handle(&self) -> &str {
        self.email.split('@').next().unwrap_or_default()
    }
}

/// Active auth session handed out by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub identity: UserIdentity,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix epoch seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
}

/// Backend-pushed auth-state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(AuthSession),
    SignedOut,
    TokenRefreshed(AuthSession),
    UserUpdated(AuthSession),
}

impl AuthEvent {
    /// Session carried by the notification, `None` for sign-out.
    pub fn session(&self) -> Option<&AuthSession> {
        match self {
            Self::SignedIn(session) | Self::TokenRefreshed(session) | Self::UserUpdated(session) => {
                Some(session)
            }
            Self::SignedOut => None,
        }
    }

    /// Stable event name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SignedIn(_) => "signed_in",
            Self::SignedOut => "signed_out",
            Self::TokenRefreshed(_) => "token_refreshed",
            Self::UserUpdated(_) => "user_updated",
        }
    }
}
