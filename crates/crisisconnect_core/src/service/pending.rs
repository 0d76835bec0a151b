//! In-flight write registry.

use super::error::{ServiceError, ServiceResult};
use crate::cache::WriteOp;
use log::debug;
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

/// Set of writes currently running for one accessor.
#[derive(Debug, Default)]
pub struct PendingWrites {
    in_flight: Mutex<BTreeSet<(WriteOp, String)>>,
}

/// Releases its slot when dropped.
#[derive(Debug)]
pub struct PendingTicket<'a> {
    owner: &'a PendingWrites,
    slot: (WriteOp, String),
}

impl PendingWrites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `(op, target)`; fails while an identical write is running.
    pub fn begin(&self, op: WriteOp, target: impl Into<String>) -> ServiceResult<PendingTicket<'_>> {
        let slot = (op, target.into());
        if !self.lock().insert(slot.clone()) {
            debug!(
                "event=write_rejected module=service op={} reason=in_flight",
                op.as_str()
            );
            return Err(ServiceError::WriteInFlight { op: op.as_str() });
        }
        Ok(PendingTicket { owner: self, slot })
    }

    pub fn is_pending(&self, op: WriteOp, target: &str) -> bool {
        self.lock().contains(&(op, target.to_string()))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeSet<(WriteOp, String)>> {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for PendingTicket<'_> {
    fn drop(&mut self) {
        self.owner.lock().remove(&self.slot);
    }
}

#[cfg(test)]
mod tests {
    use super::PendingWrites;
    use crate::cache::WriteOp;
    use crate::service::ServiceError;

    #[test]
    fn identical_write_is_rejected_until_ticket_drops() {
        let pending = PendingWrites::new();
        let ticket = pending
            .begin(WriteOp::CreateContact, "Mai Rudo|0771")
            .expect("first claim should succeed");
        let second = pending.begin(WriteOp::CreateContact, "Mai Rudo|0771");
        assert!(matches!(second, Err(ServiceError::WriteInFlight { .. })));

        drop(ticket);
        assert!(pending.is_empty());
        assert!(pending.begin(WriteOp::CreateContact, "Mai Rudo|0771").is_ok());
    }

    #[test]
    fn different_targets_do_not_block_each_other() {
        let pending = PendingWrites::new();
        let _a = pending
            .begin(WriteOp::DeleteContact, "a")
            .expect("claim a");
        let _b = pending
            .begin(WriteOp::DeleteContact, "b")
            .expect("claim b");
        let _c = pending
            .begin(WriteOp::UpdateContact, "a")
            .expect("claim update a");
        assert_eq!(pending.len(), 3);
    }
}
