#![allow(dead_code)]

use crisisconnect_core::backend::{
    BackendError, BackendErrorKind, BackendResult, DataBackend, Row, Table, TableQuery,
};
use crisisconnect_core::{CrisisApp, LocalBackend};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Data backend that records every call and can be told to reject writes,
/// either all of them or one `op:table` pair.
pub struct RecordingData {
    inner: Arc<LocalBackend>,
    calls: Mutex<Vec<String>>,
    reject_writes: AtomicBool,
    rejected: Mutex<Vec<String>>,
}

impl RecordingData {
    pub fn new(inner: Arc<LocalBackend>) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            reject_writes: AtomicBool::new(false),
            rejected: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn write_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| !call.starts_with("select"))
            .collect()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Rejects only `op` on `table`, e.g. `("update", Table::Profiles)`.
    pub fn reject_write(&self, op: &str, table: Table) {
        self.rejected.lock().unwrap().push(format!("{op}:{table}"));
    }

    fn record(&self, op: &str, table: Table) {
        self.calls.lock().unwrap().push(format!("{op}:{table}"));
    }

    fn check_write(&self, op: &str, table: Table) -> BackendResult<()> {
        let targeted = self
            .rejected
            .lock()
            .unwrap()
            .contains(&format!("{op}:{table}"));
        if targeted || self.reject_writes.load(Ordering::SeqCst) {
            return Err(BackendError::new(
                BackendErrorKind::Transport,
                "connection reset by peer",
            ));
        }
        Ok(())
    }
}

impl DataBackend for RecordingData {
    fn select(&self, query: &TableQuery) -> BackendResult<Vec<Row>> {
        self.record("select", query.table);
        self.inner.select(query)
    }

    fn insert(&self, table: Table, row: Row) -> BackendResult<Row> {
        self.record("insert", table);
        self.check_write("insert", table)?;
        self.inner.insert(table, row)
    }

    fn update(&self, query: &TableQuery, patch: Row) -> BackendResult<Vec<Row>> {
        self.record("update", query.table);
        self.check_write("update", query.table)?;
        self.inner.update(query, patch)
    }

    fn upsert(&self, table: Table, row: Row) -> BackendResult<Row> {
        self.record("upsert", table);
        self.check_write("upsert", table)?;
        self.inner.upsert(table, row)
    }

    fn delete(&self, query: &TableQuery) -> BackendResult<usize> {
        self.record("delete", query.table);
        self.check_write("delete", query.table)?;
        self.inner.delete(query)
    }
}

/// App over an in-memory local backend whose data calls are recorded.
pub fn recording_app() -> (CrisisApp, Arc<RecordingData>) {
    let backend = Arc::new(LocalBackend::open_in_memory().unwrap());
    let data = Arc::new(RecordingData::new(backend.clone()));
    let app = CrisisApp::with_backends(backend, data.clone());
    (app, data)
}

/// Signs up (and thereby signs in) a fresh user.
pub fn signed_in_app() -> (CrisisApp, Arc<RecordingData>) {
    let (app, data) = recording_app();
    app.auth()
        .sign_up("tariro@example.com", "secret123", Some("Tariro Moyo"))
        .unwrap();
    assert!(app.snapshot().is_signed_in());
    data.clear();
    (app, data)
}
