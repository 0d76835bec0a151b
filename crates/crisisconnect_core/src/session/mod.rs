//! Session provider: current identity plus loading state.
//!
//! # Responsibility
//! - Track the signed-in identity from backend auth notifications.
//! - Resolve the initial session once at startup.
//!
//! # Invariants
//! - State is `Loading` until the first notification or initial lookup lands.
//! - A failed initial lookup yields `Ready` with no identity.
//! - A notification always wins over a slower initial lookup.
//! - The provider never redirects; guards read its snapshots.

use crate::backend::{AuthBackend, SubscriptionId};
use crate::model::identity::{AuthEvent, UserIdentity};
use log::{info, warn};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingState {
    Loading,
    Ready,
}

impl LoadingState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Ready => "ready",
        }
    }
}

/// Point-in-time view of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: Option<UserIdentity>,
    pub loading_state: LoadingState,
}

impl Session {
    pub fn loading() -> Self {
        Self {
            identity: None,
            loading_state: LoadingState::Loading,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading_state == LoadingState::Loading
    }

    pub fn is_signed_in(&self) -> bool {
        self.loading_state == LoadingState::Ready && self.identity.is_some()
    }
}

#[derive(Debug)]
struct SessionState {
    session: Session,
    revision: u64,
}

impl SessionState {
    fn set_ready(&mut self, identity: Option<UserIdentity>, source: &str) {
        let changed = self.session.identity.as_ref().map(|user| user.id)
            != identity.as_ref().map(|user| user.id)
            || self.session.is_loading();
        self.session = Session {
            identity,
            loading_state: LoadingState::Ready,
        };
        self.revision += 1;
        if changed {
            info!(
                "event=session_change module=session status=ok source={source} signed_in={}",
                self.session.identity.is_some()
            );
        }
    }
}

/// Owns the session state and its backend subscription.
pub struct SessionProvider {
    backend: Arc<dyn AuthBackend>,
    state: Arc<Mutex<SessionState>>,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl SessionProvider {
    /// Creates a provider in the `Loading` state. Call `initialize` to start it.
    pub fn new(backend: Arc<dyn AuthBackend>) -> Self {
        Self {
            backend,
            state: Arc::new(Mutex::new(SessionState {
                session: Session::loading(),
                revision: 0,
            })),
            subscription: Mutex::new(None),
        }
    }

    /// Subscribes to auth notifications, then resolves the current session.
    ///
    /// Calling it again after a successful start is a no-op.
    pub fn initialize(&self) {
        {
            let mut subscription = lock(&self.subscription);
            if subscription.is_some() {
                return;
            }
            let state = Arc::clone(&self.state);
            let id = self.backend.subscribe(Arc::new(move |event: &AuthEvent| {
                let identity = event.session().map(|session| session.identity.clone());
                lock(&state).set_ready(identity, event.as_str());
            }));
            *subscription = Some(id);
        }

        match self.backend.current_session() {
            Ok(session) => {
                let mut state = lock(&self.state);
                if state.session.is_loading() {
                    state.set_ready(
                        session.map(|session| session.identity),
                        "initial_lookup",
                    );
                }
            }
            Err(err) => {
                warn!(
                    "event=session_lookup module=session status=error kind={} fallback=signed_out",
                    err.kind.as_str()
                );
                let mut state = lock(&self.state);
                if state.session.is_loading() {
                    state.set_ready(None, "initial_lookup_failed");
                }
            }
        }
    }

    pub fn snapshot(&self) -> Session {
        lock(&self.state).session.clone()
    }

    pub fn identity(&self) -> Option<UserIdentity> {
        lock(&self.state).session.identity.clone()
    }

    pub fn loading_state(&self) -> LoadingState {
        lock(&self.state).session.loading_state
    }

    /// Bumped on every applied notification or lookup result.
    pub fn revision(&self) -> u64 {
        lock(&self.state).revision
    }

    /// Drops the backend subscription. State stays at its last value.
    pub fn shutdown(&self) {
        if let Some(id) = lock(&self.subscription).take() {
            self.backend.unsubscribe(id);
            info!("event=session_shutdown module=session status=ok");
        }
    }

    pub fn is_subscribed(&self) -> bool {
        lock(&self.subscription).is_some()
    }
}

impl Drop for SessionProvider {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::{LoadingState, SessionProvider};
    use crate::backend::{
        AuthBackend, AuthEventBus, AuthListener, BackendError, BackendErrorKind, BackendResult,
        Credentials, SignUpRequest, SignUpResult, SubscriptionId,
    };
    use crate::model::identity::{AuthEvent, AuthSession, UserIdentity};
    use std::sync::{Arc, Mutex};
    use uuid::Uuid;

    struct ScriptedAuth {
        bus: AuthEventBus,
        lookup: Mutex<Option<BackendResult<Option<AuthSession>>>>,
        emit_during_lookup: Mutex<Option<AuthEvent>>,
    }

    impl ScriptedAuth {
        fn new(lookup: BackendResult<Option<AuthSession>>) -> Self {
            Self {
                bus: AuthEventBus::new(),
                lookup: Mutex::new(Some(lookup)),
                emit_during_lookup: Mutex::new(None),
            }
        }
    }

    impl AuthBackend for ScriptedAuth {
        fn sign_in(&self, _credentials: &Credentials) -> BackendResult<AuthSession> {
            Err(BackendError::new(BackendErrorKind::Auth, "unused"))
        }
        fn sign_up(&self, _request: &SignUpRequest) -> BackendResult<SignUpResult> {
            Err(BackendError::new(BackendErrorKind::Auth, "unused"))
        }
        fn sign_out(&self) -> BackendResult<()> {
            self.bus.emit(&AuthEvent::SignedOut);
            Ok(())
        }
        fn request_password_reset(&self, _email: &str) -> BackendResult<()> {
            Ok(())
        }
        fn current_session(&self) -> BackendResult<Option<AuthSession>> {
            if let Some(event) = self.emit_during_lookup.lock().expect("lock").take() {
                self.bus.emit(&event);
            }
            self.lookup.lock().expect("lock").take().unwrap_or(Ok(None))
        }
        fn subscribe(&self, listener: AuthListener) -> SubscriptionId {
            self.bus.subscribe(listener)
        }
        fn unsubscribe(&self, id: SubscriptionId) {
            self.bus.unsubscribe(id);
        }
    }

    fn session_for(email: &str) -> AuthSession {
        AuthSession {
            identity: UserIdentity::new(Uuid::new_v4(), email),
            access_token: "token".to_string(),
            refresh_token: None,
            expires_at: None,
        }
    }

    #[test]
    fn starts_loading_until_initialized() {
        let backend = Arc::new(ScriptedAuth::new(Ok(None)));
        let provider = SessionProvider::new(backend);
        assert_eq!(provider.loading_state(), LoadingState::Loading);
        provider.initialize();
        assert_eq!(provider.loading_state(), LoadingState::Ready);
        assert!(provider.identity().is_none());
    }

    #[test]
    fn initial_lookup_restores_identity() {
        let session = session_for("rudo@example.com");
        let backend = Arc::new(ScriptedAuth::new(Ok(Some(session.clone()))));
        let provider = SessionProvider::new(backend);
        provider.initialize();
        assert_eq!(provider.identity(), Some(session.identity));
    }

    #[test]
    fn failed_lookup_fails_open_to_signed_out() {
        let backend = Arc::new(ScriptedAuth::new(Err(BackendError::new(
            BackendErrorKind::Transport,
            "offline",
        ))));
        let provider = SessionProvider::new(backend);
        provider.initialize();
        let snapshot = provider.snapshot();
        assert_eq!(snapshot.loading_state, LoadingState::Ready);
        assert!(snapshot.identity.is_none());
    }

    #[test]
    fn notification_beats_stale_lookup() {
        let signed_in = session_for("chipo@example.com");
        let backend = Arc::new(ScriptedAuth::new(Ok(None)));
        *backend.emit_during_lookup.lock().expect("lock") =
            Some(AuthEvent::SignedIn(signed_in.clone()));
        let provider = SessionProvider::new(backend);
        provider.initialize();
        assert_eq!(provider.identity(), Some(signed_in.identity));
    }

    #[test]
    fn notifications_track_sign_in_and_out() {
        let backend = Arc::new(ScriptedAuth::new(Ok(None)));
        let provider = SessionProvider::new(backend.clone());
        provider.initialize();
        let before = provider.revision();

        backend
            .bus
            .emit(&AuthEvent::SignedIn(session_for("tendai@example.com")));
        assert!(provider.snapshot().is_signed_in());

        backend.sign_out().expect("sign out");
        assert!(!provider.snapshot().is_signed_in());
        assert_eq!(provider.revision(), before + 2);
    }

    #[test]
    fn shutdown_unsubscribes() {
        let backend = Arc::new(ScriptedAuth::new(Ok(None)));
        let provider = SessionProvider::new(backend.clone());
        provider.initialize();
        assert_eq!(backend.bus.len(), 1);
        provider.shutdown();
        assert_eq!(backend.bus.len(), 0);
        assert!(!provider.is_subscribed());

        backend
            .bus
            .emit(&AuthEvent::SignedIn(session_for("late@example.com")));
        assert!(provider.identity().is_none());
    }

    #[test]
    fn drop_unsubscribes() {
        let backend = Arc::new(ScriptedAuth::new(Ok(None)));
        {
            let provider = SessionProvider::new(backend.clone());
            provider.initialize();
            assert_eq!(backend.bus.len(), 1);
        }
        assert_eq!(backend.bus.len(), 0);
    }
}
