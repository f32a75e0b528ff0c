//! Durable state stores for Gatehouse.
//!
//! Provides the [`StateStore`] trait that identity actors use to load their
//! record on activation and to commit it on registration, plus two
//! implementations:
//!
//! - [`MemoryStore`] — a process-local map, for tests and single-process
//!   deployments that accept losing state on restart.
//! - [`FileStore`] — one encoded record per key in a directory, written
//!   atomically (temp file + fsync + rename).
//!
//! The store is shared by every identity actor but partitioned by key: no
//! operation spans more than one username, so no cross-key coordination is
//! needed.

mod error;
mod file;
mod memory;

pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;

use std::future::Future;
use std::sync::Arc;

use gatehouse_protocol::{IdentityRecord, Username};

/// Load/commit access to per-username identity records.
///
/// # Consistency
///
/// Implementations must provide read-your-writes for a single key: a `load`
/// that starts after a `commit` returned `Ok` sees that commit. Identity
/// actors are the only writers for their key, so nothing stronger is needed.
///
/// # Atomicity
///
/// `commit` either replaces the whole record or leaves the previous one in
/// place. A caller that gets `Err` must assume nothing was written, and a
/// later `load` must never observe a half-written record.
///
/// The methods return `impl Future + Send` rather than being `async fn` so
/// that actors generic over the store can still be moved onto the Tokio
/// runtime.
pub trait StateStore: Send + Sync + 'static {
    /// Loads the record for `key`, or `Ok(None)` if nothing was ever
    /// committed for it.
    fn load(
        &self,
        key: &Username,
    ) -> impl Future<Output = Result<Option<IdentityRecord>, StoreError>> + Send;

    /// Durably writes `record` under `key`, replacing any previous record.
    fn commit(
        &self,
        key: &Username,
        record: &IdentityRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Sharing a store behind an `Arc` keeps it a store.
impl<S: StateStore> StateStore for Arc<S> {
    fn load(
        &self,
        key: &Username,
    ) -> impl Future<Output = Result<Option<IdentityRecord>, StoreError>> + Send
    {
        (**self).load(key)
    }

    fn commit(
        &self,
        key: &Username,
        record: &IdentityRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).commit(key, record)
    }
}
