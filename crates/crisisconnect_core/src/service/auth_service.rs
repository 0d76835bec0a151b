//! Sign-in, sign-up, sign-out and password reset.

use super::error::ServiceResult;
use crate::backend::{AuthBackend, Credentials, SignUpRequest};
use crate::cache::QueryCache;
use crate::model::identity::UserIdentity;
use crate::model::validation::{validate_email, validate_password};
use log::{info, warn};
use std::sync::Arc;

pub const ALREADY_REGISTERED_MESSAGE: &str =
    "This email is already registered. Please sign in instead.";
pub const ACCOUNT_CREATED_MESSAGE: &str =
    "Account created successfully. Please check your email for confirmation.";
pub const PASSWORD_RESET_MESSAGE: &str = "Password reset instructions sent to your email";

/// Result of a sign-up attempt that the backend accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpOutcome {
    pub identity: UserIdentity,
    /// The backend started a session right away.
    pub signed_in: bool,
    pub already_registered: bool,
    pub message: &'static str,
}

pub struct AuthService {
    auth: Arc<dyn AuthBackend>,
    cache: Arc<QueryCache>,
}

impl AuthService {
    pub fn new(auth: Arc<dyn AuthBackend>, cache: Arc<QueryCache>) -> Self {
        Self { auth, cache }
    }

    /// Signs in; the session provider learns about it from the backend
    /// notification, not from this return value.
    pub fn sign_in(&self, email: &str, password: &str) -> ServiceResult<UserIdentity> {
        validate_email(email)?;
        let credentials = Credentials {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        match self.auth.sign_in(&credentials) {
            Ok(session) => {
                info!("event=sign_in module=service status=ok");
                Ok(session.identity)
            }
            Err(err) => {
                warn!(
                    "event=sign_in module=service status=error kind={}",
                    err.kind.as_str()
                );
                Err(err.into())
            }
        }
    }

    pub fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> ServiceResult<SignUpOutcome> {
        validate_email(email)?;
        validate_password(password)?;
        let request = SignUpRequest {
            credentials: Credentials {
                email: email.trim().to_string(),
                password: password.to_string(),
            },
            full_name: full_name
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
        };

        let result = self.auth.sign_up(&request).map_err(|err| {
            warn!(
                "event=sign_up module=service status=error kind={}",
                err.kind.as_str()
            );
            err
        })?;
        info!(
            "event=sign_up module=service status=ok already_registered={}",
            result.already_registered
        );
        Ok(SignUpOutcome {
            identity: result.identity,
            signed_in: result.session.is_some(),
            already_registered: result.already_registered,
            message: if result.already_registered {
                ALREADY_REGISTERED_MESSAGE
            } else {
                ACCOUNT_CREATED_MESSAGE
            },
        })
    }

    /// Signs out and drops every cached read of the previous user.
    pub fn sign_out(&self) -> ServiceResult<()> {
        let outcome = self.auth.sign_out();
        self.cache.clear();
        match outcome {
            Ok(()) => {
                info!("event=sign_out module=service status=ok");
                Ok(())
            }
            Err(err) => {
                warn!(
                    "event=sign_out module=service status=error kind={}",
                    err.kind.as_str()
                );
                Err(err.into())
            }
        }
    }

    /// Requests reset instructions; returns the confirmation message.
    pub fn request_password_reset(&self, email: &str) -> ServiceResult<&'static str> {
        validate_email(email)?;
        self.auth.request_password_reset(email.trim())?;
        info!("event=password_reset module=service status=ok");
        Ok(PASSWORD_RESET_MESSAGE)
    }
}
