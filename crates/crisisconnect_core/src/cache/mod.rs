//! Client-side cache of confirmed server reads.
//!
//! # Responsibility
//! - Hold the last fetched value per `QueryKey` with a staleness flag.
//! - Mark entries stale according to the write invalidation table.
//!
//! # Invariants
//! - Entries only ever hold values returned by a successful fetch.
//! - A failed fetch or a failed write leaves every entry untouched.
//! - A stale entry is refetched before its value is handed out again.

mod invalidation;
mod key;
mod store;

pub use invalidation::{WriteOp, INVALIDATION_TABLE};
pub use key::{QueryKey, QueryKind};
pub use store::{CacheError, QueryCache};
