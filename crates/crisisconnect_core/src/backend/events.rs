//! In-process fan-out of auth-state notifications.

use crate::backend::{AuthListener, SubscriptionId};
use crate::model::identity::AuthEvent;
use log::debug;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Registry of auth listeners shared by backend implementations.
#[derive(Default)]
pub struct AuthEventBus {
    listeners: Mutex<BTreeMap<SubscriptionId, AuthListener>>,
    next_id: AtomicU64,
}

impl AuthEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: AuthListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().insert(id, listener);
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.lock().remove(&id);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Delivers `event` to every listener in subscription order.
    ///
    /// Listeners run outside the registry lock so they may subscribe or
    /// unsubscribe re-entrantly.
    pub fn emit(&self, event: &AuthEvent) {
        let listeners = self.lock().values().cloned().collect::<Vec<_>>();
        debug!(
            "event=auth_event_emit module=backend kind={} listeners={}",
            event.as_str(),
            listeners.len()
        );
        for listener in listeners {
            listener(event);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<SubscriptionId, AuthListener>> {
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
