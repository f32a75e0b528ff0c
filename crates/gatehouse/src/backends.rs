//! Store selected at runtime from a [`GatehouseConfig`].
//!
//! [`GatehouseConfig`]: crate::GatehouseConfig

use gatehouse_protocol::{IdentityRecord, Username};
use gatehouse_store::{FileStore, MemoryStore, StateStore, StoreError};

/// The store a config asked for: on disk when `store_path` is set,
/// in memory otherwise.
#[derive(Debug, Clone)]
pub enum ConfiguredStore {
    Memory(MemoryStore),
    File(FileStore),
}

impl StateStore for ConfiguredStore {
    async fn load(
        &self,
        key: &Username,
    ) -> Result<Option<IdentityRecord>, StoreError> {
        match self {
            Self::Memory(store) => store.load(key).await,
            Self::File(store) => store.load(key).await,
        }
    }

    async fn commit(
        &self,
        key: &Username,
        record: &IdentityRecord,
    ) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.commit(key, record).await,
            Self::File(store) => store.commit(key, record).await,
        }
    }
}
