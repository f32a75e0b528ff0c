//! In-memory store.

use std::collections::HashMap;
use std::sync::Arc;

use gatehouse_protocol::{IdentityRecord, Username};
use tokio::sync::RwLock;

use crate::{StateStore, StoreError};

/// A [`StateStore`] backed by a `HashMap`.
///
/// Cheap to clone: clones share the same map, so a test can keep one clone
/// for inspection while identity actors write through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<Username, IdentityRecord>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of committed records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns `true` if nothing has been committed yet.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl StateStore for MemoryStore {
    async fn load(
        &self,
        key: &Username,
    ) -> Result<Option<IdentityRecord>, StoreError> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn commit(
        &self,
        key: &Username,
        record: &IdentityRecord,
    ) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .insert(key.clone(), record.clone());
        tracing::trace!(%key, "record committed to memory");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Username {
        Username::new("alice")
    }

    #[tokio::test]
    async fn test_load_unknown_key_returns_none() {
        let store = MemoryStore::new();
        assert!(store.load(&alice()).await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_commit_then_load_returns_record() {
        let store = MemoryStore::new();
        let record =
            IdentityRecord::registered(alice(), "s".into(), "h".into());

        store.commit(&alice(), &record).await.unwrap();

        assert_eq!(store.load(&alice()).await.unwrap(), Some(record));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_clones_share_records() {
        let store = MemoryStore::new();
        let observer = store.clone();
        let record =
            IdentityRecord::registered(alice(), "s".into(), "h".into());

        store.commit(&alice(), &record).await.unwrap();

        assert_eq!(observer.load(&alice()).await.unwrap(), Some(record));
    }
}
