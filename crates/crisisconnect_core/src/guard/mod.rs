//! Route guards and navigation.
//!
//! # Responsibility
//! - Classify paths into protected, guest-only and public routes.
//! - Decide what a guarded route shows for a session snapshot.
//! - Apply redirects to an in-memory history.
//!
//! # Invariants
//! - `Loading` always wins over every other decision.
//! - No session snapshot permits both a protected and a guest-only route.
//! - Redirects replace the current history entry.

pub mod navigator;
pub mod routes;

pub use navigator::{NavigationError, Navigator, Visit};
pub use routes::{RouteClass, RouteMatch, Screen, APP_HOME, SIGN_IN};

use crate::model::identity::UserIdentity;
use crate::session::{LoadingState, Session};

/// Outcome of guarding one route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session not resolved yet; show a placeholder.
    Loading,
    /// Signed-in user on a guest-only route.
    AuthedRedirect { to: &'static str },
    /// Anonymous user on a protected route.
    GuestRedirect { to: &'static str },
    Permit,
}

impl GuardDecision {
    pub fn redirect_target(self) -> Option<&'static str> {
        match self {
            Self::AuthedRedirect { to } | Self::GuestRedirect { to } => Some(to),
            Self::Loading | Self::Permit => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::AuthedRedirect { .. } => "authed_redirect",
            Self::GuestRedirect { .. } => "guest_redirect",
            Self::Permit => "permit",
        }
    }
}

/// Pure guard decision.
pub fn decide(
    loading_state: LoadingState,
    identity: Option<&UserIdentity>,
    class: RouteClass,
) -> GuardDecision {
    match (class, loading_state, identity) {
        (RouteClass::Public, _, _) => GuardDecision::Permit,
        (_, LoadingState::Loading, _) => GuardDecision::Loading,
        (RouteClass::Protected, LoadingState::Ready, None) => {
            GuardDecision::GuestRedirect { to: SIGN_IN }
        }
        (RouteClass::GuestOnly, LoadingState::Ready, Some(_)) => {
            GuardDecision::AuthedRedirect { to: APP_HOME }
        }
        _ => GuardDecision::Permit,
    }
}

pub fn decide_for(session: &Session, class: RouteClass) -> GuardDecision {
    decide(session.loading_state, session.identity.as_ref(), class)
}

#[cfg(test)]
mod tests {
    use super::{decide, GuardDecision, RouteClass};
    use crate::model::identity::UserIdentity;
    use crate::session::LoadingState;
    use uuid::Uuid;

    #[test]
    fn loading_wins_for_guarded_routes() {
        let user = UserIdentity::new(Uuid::new_v4(), "a@b.co");
        for identity in [None, Some(&user)] {
            for class in [RouteClass::Protected, RouteClass::GuestOnly] {
                assert_eq!(
                    decide(LoadingState::Loading, identity, class),
                    GuardDecision::Loading
                );
            }
        }
    }

    #[test]
    fn ready_decisions_follow_identity() {
        let user = UserIdentity::new(Uuid::new_v4(), "a@b.co");
        assert_eq!(
            decide(LoadingState::Ready, None, RouteClass::Protected),
            GuardDecision::GuestRedirect { to: "/signin" }
        );
        assert_eq!(
            decide(LoadingState::Ready, Some(&user), RouteClass::GuestOnly),
            GuardDecision::AuthedRedirect { to: "/app" }
        );
        assert_eq!(
            decide(LoadingState::Ready, Some(&user), RouteClass::Protected),
            GuardDecision::Permit
        );
        assert_eq!(
            decide(LoadingState::Ready, None, RouteClass::GuestOnly),
            GuardDecision::Permit
        );
    }

    #[test]
    fn guards_never_both_permit() {
        let user = UserIdentity::new(Uuid::new_v4(), "a@b.co");
        for state in [LoadingState::Loading, LoadingState::Ready] {
            for identity in [None, Some(&user)] {
                let protected = decide(state, identity, RouteClass::Protected);
                let guest = decide(state, identity, RouteClass::GuestOnly);
                assert!(
                    !(protected == GuardDecision::Permit && guest == GuardDecision::Permit),
                    "state={state:?} identity={identity:?}"
                );
            }
        }
    }

    #[test]
    fn public_routes_are_never_guarded() {
        assert_eq!(
            decide(LoadingState::Loading, None, RouteClass::Public),
            GuardDecision::Permit
        );
    }
}
