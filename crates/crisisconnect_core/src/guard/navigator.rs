//! In-memory history that applies guard decisions.

use super::routes::{self, RouteMatch, Screen, SIGN_IN};
use super::{decide_for, GuardDecision};
use crate::session::Session;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

const MAX_REDIRECT_HOPS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    /// Redirects kept bouncing between routes.
    RedirectLoop { path: String },
}

impl Display for NavigationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RedirectLoop { path } => write!(f, "redirect loop while resolving `{path}`"),
        }
    }
}

impl Error for NavigationError {}

/// What the UI should show after a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    pub route: RouteMatch,
    pub decision: GuardDecision,
}

impl Visit {
    pub fn is_loading(&self) -> bool {
        self.decision == GuardDecision::Loading
    }
}

#[derive(Debug, Default)]
pub struct Navigator {
    history: Vec<String>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `path`, then follows redirects in place.
    pub fn navigate(&mut self, path: &str, session: &Session) -> Result<Visit, NavigationError> {
        self.history.push(path.to_string());
        self.settle(session)
    }

    /// Replaces the current entry with `path`.
    pub fn replace(&mut self, path: &str, session: &Session) -> Result<Visit, NavigationError> {
        match self.history.last_mut() {
            Some(top) => *top = path.to_string(),
            None => self.history.push(path.to_string()),
        }
        self.settle(session)
    }

    /// Pops the current entry and re-guards the one below it.
    pub fn back(&mut self, session: &Session) -> Result<Option<Visit>, NavigationError> {
        if self.history.len() <= 1 {
            return Ok(None);
        }
        self.history.pop();
        self.settle(session).map(Some)
    }

    /// Re-guards the current entry, e.g. after the session changed.
    pub fn refresh(&mut self, session: &Session) -> Result<Option<Visit>, NavigationError> {
        if self.history.is_empty() {
            return Ok(None);
        }
        self.settle(session).map(Some)
    }

    pub fn current(&self) -> Option<&str> {
        self.history.last().map(String::as_str)
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    fn settle(&mut self, session: &Session) -> Result<Visit, NavigationError> {
        for _ in 0..=MAX_REDIRECT_HOPS {
            let path = self.current().unwrap_or(routes::ROOT).to_string();
            let route = routes::resolve(&path);

            let target = if route.screen == Screen::Root {
                Some(SIGN_IN)
            } else {
                let decision = decide_for(session, route.class());
                match decision.redirect_target() {
                    Some(to) => Some(to),
                    None => {
                        debug!(
                            "event=navigate module=guard status=ok screen={} decision={}",
                            route.screen.as_str(),
                            decision.as_str()
                        );
                        return Ok(Visit { route, decision });
                    }
                }
            };

            if let (Some(to), Some(top)) = (target, self.history.last_mut()) {
                debug!(
                    "event=redirect module=guard status=ok from={} to={to}",
                    route.screen.as_str()
                );
                *top = to.to_string();
            }
        }

        let path = self.current().unwrap_or(routes::ROOT).to_string();
        warn!("event=redirect module=guard status=error reason=loop");
        Err(NavigationError::RedirectLoop { path })
    }
}

#[cfg(test)]
mod tests {
    use super::Navigator;
    use crate::guard::{GuardDecision, Screen};
    use crate::model::identity::UserIdentity;
    use crate::session::{LoadingState, Session};
    use uuid::Uuid;

    fn ready(identity: Option<UserIdentity>) -> Session {
        Session {
            identity,
            loading_state: LoadingState::Ready,
        }
    }

    #[test]
    fn root_is_replaced_with_sign_in() {
        let mut navigator = Navigator::new();
        let visit = navigator.navigate("/", &ready(None)).expect("navigate");
        assert_eq!(visit.route.screen, Screen::SignIn);
        assert_eq!(navigator.history(), ["/signin".to_string()]);
    }

    #[test]
    fn anonymous_protected_visit_redirects_without_growing_history() {
        let mut navigator = Navigator::new();
        navigator.navigate("/signup", &ready(None)).expect("navigate");
        let visit = navigator
            .navigate("/app/contacts", &ready(None))
            .expect("navigate");
        assert_eq!(visit.route.screen, Screen::SignIn);
        assert_eq!(navigator.history().len(), 2);
    }

    #[test]
    fn loading_session_holds_position() {
        let mut navigator = Navigator::new();
        let visit = navigator
            .navigate("/app", &Session::loading())
            .expect("navigate");
        assert_eq!(visit.decision, GuardDecision::Loading);
        assert_eq!(navigator.current(), Some("/app"));
    }

    #[test]
    fn refresh_after_sign_in_moves_to_home() {
        let mut navigator = Navigator::new();
        navigator.navigate("/signin", &ready(None)).expect("navigate");
        let user = UserIdentity::new(Uuid::new_v4(), "nyasha@example.com");
        let visit = navigator
            .refresh(&ready(Some(user)))
            .expect("refresh")
            .expect("history is not empty");
        assert_eq!(visit.route.screen, Screen::Home);
        assert_eq!(navigator.history(), ["/app".to_string()]);
    }

    #[test]
    fn back_regards_previous_entry() {
        let user = UserIdentity::new(Uuid::new_v4(), "nyasha@example.com");
        let session = ready(Some(user));
        let mut navigator = Navigator::new();
        navigator.navigate("/app", &session).expect("navigate");
        navigator.navigate("/app/nearby", &session).expect("navigate");
        let visit = navigator
            .back(&ready(None))
            .expect("back")
            .expect("entry below");
        assert_eq!(visit.route.screen, Screen::SignIn);
        assert!(navigator.back(&ready(None)).expect("back").is_none());
    }
}
