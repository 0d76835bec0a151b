use super::invalidation::WriteOp;
use super::key::{QueryKey, QueryKind};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};

/// Cache-level failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Cached value could not be converted to or from its typed shape.
    Codec { key: String, message: String },
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Codec { key, message } => {
                write!(f, "cached value for `{key}` is not usable: {message}")
            }
        }
    }
}

impl Error for CacheError {}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    stale: bool,
    fetch_count: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: BTreeMap<QueryKey, CacheEntry>,
    /// Bumped per kind on every invalidation.
    generations: BTreeMap<QueryKind, u64>,
    /// Bumped on `clear`.
    epoch: u64,
}

impl CacheState {
    fn stamp(&self, kind: QueryKind) -> (u64, u64) {
        (
            self.epoch,
            self.generations.get(&kind).copied().unwrap_or(0),
        )
    }
}

/// Keyed cache of confirmed reads with explicit staleness.
///
/// # Invariants
/// - A fetch that overlaps an invalidation of its kind is stored stale, so
///   the next read refetches.
/// - A fetch that overlaps `clear` is not stored, and an overlapping fetch
///   never replaces an entry stored fresh after the invalidation.
#[derive(Debug, Default)]
pub struct QueryCache {
    state: Mutex<CacheState>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `key`, fetching it when absent or stale.
    ///
    /// The fetch runs without the cache lock held. Its error is returned as-is
    /// and the existing entry, stale or not, stays in place.
    pub fn read<T, E, F>(&self, key: &QueryKey, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Result<T, E>,
    {
        let started = {
            let state = self.lock();
            if let Some(entry) = state.entries.get(key) {
                if !entry.stale {
                    debug!("event=cache_read module=cache status=hit key={key}");
                    return decode(key, entry.value.clone()).map_err(E::from);
                }
            }
            state.stamp(key.kind)
        };

        debug!("event=cache_read module=cache status=miss key={key}");
        let fetched = fetch()?;
        let value = serde_json::to_value(&fetched).map_err(|err| {
            E::from(CacheError::Codec {
                key: key.to_string(),
                message: err.to_string(),
            })
        })?;

        let mut state = self.lock();
        let finished = state.stamp(key.kind);
        if finished.0 != started.0 {
            debug!("event=cache_store module=cache status=dropped key={key}");
            return Ok(fetched);
        }
        let overlapped = finished.1 != started.1;
        if overlapped {
            if state.entries.get(key).is_some_and(|entry| !entry.stale) {
                debug!("event=cache_store module=cache status=superseded key={key}");
                return Ok(fetched);
            }
            debug!("event=cache_store module=cache status=stale key={key}");
        }
        let entry = state.entries.entry(key.clone()).or_insert_with(|| CacheEntry {
            value: Value::Null,
            stale: false,
            fetch_count: 0,
        });
        entry.value = value;
        entry.stale = overlapped;
        entry.fetch_count += 1;
        Ok(fetched)
    }

    /// Cached value regardless of staleness, without fetching.
    pub fn peek<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let value = self.lock().entries.get(key).map(|entry| entry.value.clone())?;
        decode(key, value).ok()
    }

    /// `None` when nothing is cached under `key`.
    pub fn is_stale(&self, key: &QueryKey) -> Option<bool> {
        self.lock().entries.get(key).map(|entry| entry.stale)
    }

    /// Number of successful fetches stored under `key`.
    pub fn fetch_count(&self, key: &QueryKey) -> u64 {
        self.lock()
            .entries
            .get(key)
            .map(|entry| entry.fetch_count)
            .unwrap_or(0)
    }

    /// Marks every entry of `kind` stale, whatever its scope.
    pub fn invalidate_kind(&self, kind: QueryKind) -> usize {
        let mut state = self.lock();
        *state.generations.entry(kind).or_insert(0) += 1;
        let mut marked = 0;
        for (key, entry) in state.entries.iter_mut() {
            if key.kind == kind {
                entry.stale = true;
                marked += 1;
            }
        }
        marked
    }

    pub fn invalidate(&self, kinds: &[QueryKind]) -> usize {
        kinds.iter().map(|kind| self.invalidate_kind(*kind)).sum()
    }

    /// Applies the invalidation table entry for a confirmed write.
    pub fn apply_write(&self, op: WriteOp) {
        let marked = self.invalidate(op.invalidates());
        debug!(
            "event=cache_invalidate module=cache status=ok write={} marked={marked}",
            op.as_str()
        );
    }

    /// Drops every entry; fetches already in flight are discarded.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.epoch += 1;
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn decode<T: DeserializeOwned>(key: &QueryKey, value: Value) -> Result<T, CacheError> {
    serde_json::from_value(value).map_err(|err| CacheError::Codec {
        key: key.to_string(),
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{CacheError, QueryCache};
    use crate::cache::{QueryKey, QueryKind, WriteOp};
    use std::sync::mpsc;
    use std::thread;
    use uuid::Uuid;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Fetch,
        Cache(CacheError),
    }

    impl From<CacheError> for TestError {
        fn from(value: CacheError) -> Self {
            Self::Cache(value)
        }
    }

    #[test]
    fn fresh_entry_is_served_without_refetch() {
        let cache = QueryCache::new();
        let key = QueryKey::resources();
        let first: Vec<String> = cache
            .read(&key, || Ok::<_, TestError>(vec!["a".to_string()]))
            .expect("first read should fetch");
        let second: Vec<String> = cache
            .read(&key, || -> Result<Vec<String>, TestError> {
                panic!("fresh entries must not refetch")
            })
            .expect("second read should hit");
        assert_eq!(first, second);
        assert_eq!(cache.fetch_count(&key), 1);
    }

    #[test]
    fn stale_entry_is_refetched() {
        let cache = QueryCache::new();
        let key = QueryKey::contacts(Some(Uuid::new_v4()));
        let _: u32 = cache.read(&key, || Ok::<_, TestError>(1)).expect("read");
        cache.apply_write(WriteOp::CreateContact);
        assert_eq!(cache.is_stale(&key), Some(true));

        let value: u32 = cache.read(&key, || Ok::<_, TestError>(2)).expect("read");
        assert_eq!(value, 2);
        assert_eq!(cache.is_stale(&key), Some(false));
        assert_eq!(cache.fetch_count(&key), 2);
    }

    #[test]
    fn failed_fetch_keeps_previous_entry() {
        let cache = QueryCache::new();
        let key = QueryKey::profile(Uuid::new_v4());
        let _: u32 = cache.read(&key, || Ok::<_, TestError>(7)).expect("read");
        cache.invalidate_kind(QueryKind::Profile);

        let result: Result<u32, TestError> = cache.read(&key, || Err(TestError::Fetch));
        assert_eq!(result, Err(TestError::Fetch));
        assert_eq!(cache.peek::<u32>(&key), Some(7));
        assert_eq!(cache.is_stale(&key), Some(true));
    }

    #[test]
    fn invalidation_only_touches_listed_kinds() {
        let cache = QueryCache::new();
        let user = Uuid::new_v4();
        let _: u8 = cache
            .read(&QueryKey::profile(user), || Ok::<_, TestError>(1))
            .expect("read");
        let _: u8 = cache
            .read(&QueryKey::saved_resources(user), || Ok::<_, TestError>(1))
            .expect("read");

        cache.apply_write(WriteOp::UpdateProfile);
        assert_eq!(cache.is_stale(&QueryKey::profile(user)), Some(true));
        assert_eq!(cache.is_stale(&QueryKey::saved_resources(user)), Some(false));
    }

    #[test]
    fn type_mismatch_surfaces_as_cache_error() {
        let cache = QueryCache::new();
        let key = QueryKey::resources();
        let _: String = cache
            .read(&key, || Ok::<_, TestError>("text".to_string()))
            .expect("read");
        let result: Result<u32, TestError> = cache.read(&key, || Ok(1));
        assert!(matches!(result, Err(TestError::Cache(_))));
    }

    #[test]
    fn write_during_fetch_leaves_result_stale() {
        let cache = QueryCache::new();
        let key = QueryKey::contacts(Some(Uuid::new_v4()));
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        thread::scope(|scope| {
            let (shared, shared_key) = (&cache, &key);
            let reader = scope.spawn(move || {
                shared.read(shared_key, || {
                    entered_tx.send(()).expect("signal fetch start");
                    release_rx.recv().expect("wait for release");
                    Ok::<_, TestError>(vec!["before-write".to_string()])
                })
            });
            entered_rx.recv().expect("fetch should start");
            cache.apply_write(WriteOp::CreateContact);
            release_tx.send(()).expect("release fetch");
            let first: Vec<String> = reader
                .join()
                .expect("reader thread")
                .expect("in-flight read");
            assert_eq!(first, vec!["before-write".to_string()]);
        });

        assert_eq!(cache.is_stale(&key), Some(true));
        let next: Vec<String> = cache
            .read(&key, || Ok::<_, TestError>(vec!["after-write".to_string()]))
            .expect("refetch");
        assert_eq!(next, vec!["after-write".to_string()]);
        assert_eq!(cache.fetch_count(&key), 2);
    }

    #[test]
    fn unrelated_write_during_fetch_keeps_result_fresh() {
        let cache = QueryCache::new();
        let key = QueryKey::resources();
        let _: u32 = cache
            .read(&key, || {
                cache.apply_write(WriteOp::UpdateProfile);
                Ok::<_, TestError>(3)
            })
            .expect("read");
        assert_eq!(cache.is_stale(&key), Some(false));
    }

    #[test]
    fn clear_during_fetch_discards_result() {
        let cache = QueryCache::new();
        let key = QueryKey::profile(Uuid::new_v4());
        let value: u32 = cache
            .read(&key, || {
                cache.clear();
                Ok::<_, TestError>(5)
            })
            .expect("read");
        assert_eq!(value, 5);
        assert_eq!(cache.is_stale(&key), None);
        assert!(cache.is_empty());
    }
}
