//! Directory-backed store: one encoded record per username.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use gatehouse_protocol::{Codec, IdentityRecord, JsonCodec, Username};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::{StateStore, StoreError};

/// Usernames up to this many bytes are hex-encoded into the file name.
/// Longer ones are named by digest, keeping every name well under the
/// usual 255-byte limit.
const MAX_HEX_KEY_BYTES: usize = 100;

/// A [`StateStore`] that keeps each record in its own file under `root`.
///
/// Short usernames map to `id-<hex>.<ext>`, long ones to
/// `sha-<sha256 hex>.<ext>`. Either way any username, including ones
/// containing `/` or `..`, maps to a single safe file name. Records under a
/// digest name are checked against the username on load.
///
/// Commits write `<name>.<ext>.tmp`, flush it to disk, rename it over
/// `<name>.<ext>`, then flush the directory so the rename itself is
/// durable. A concurrent or later `load` sees either the old record or the
/// new one, never a mix.
#[derive(Debug, Clone)]
pub struct FileStore<C: Codec = JsonCodec> {
    root: PathBuf,
    codec: C,
}

impl FileStore<JsonCodec> {
    /// Opens (creating if needed) a JSON file store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::with_codec(root, JsonCodec).await
    }
}

impl<C: Codec> FileStore<C> {
    /// Opens (creating if needed) a store that encodes records with `codec`.
    pub async fn with_codec(
        root: impl Into<PathBuf>,
        codec: C,
    ) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            StoreError::Unavailable(format!(
                "cannot create {}: {e}",
                root.display()
            ))
        })?;
        tracing::info!(root = %root.display(), "file store opened");
        Ok(Self { root, codec })
    }

    /// The directory records are stored in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &Username) -> PathBuf {
        self.root
            .join(format!("{}.{}", file_stem(key), self.codec.extension()))
    }
}

impl<C: Codec> StateStore for FileStore<C> {
    async fn load(
        &self,
        key: &Username,
    ) -> Result<Option<IdentityRecord>, StoreError> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::LoadFailed {
                    key: key.clone(),
                    source,
                });
            }
        };

        let record: IdentityRecord =
            self.codec.decode(&bytes).map_err(|source| StoreError::Corrupt {
                key: key.clone(),
                source,
            })?;

        if is_digest_named(key) && record.exists && record.username != *key {
            return Err(StoreError::KeyMismatch {
                key: key.clone(),
                found: record.username,
            });
        }

        tracing::debug!(%key, "record loaded from disk");
        Ok(Some(record))
    }

    async fn commit(
        &self,
        key: &Username,
        record: &IdentityRecord,
    ) -> Result<(), StoreError> {
        let bytes = self.codec.encode(record).map_err(|source| {
            StoreError::Encode {
                key: key.clone(),
                source,
            }
        })?;

        let path = self.path_for(key);
        let tmp = path.with_extension(format!(
            "{}.tmp",
            self.codec.extension()
        ));
        let io_err = |source: std::io::Error| StoreError::CommitFailed {
            key: key.clone(),
            source,
        };

        if let Err(source) = write_synced(&tmp, &bytes).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(io_err(source));
        }

        if let Err(source) = fs::rename(&tmp, &path).await {
            // Leave the previous record untouched and clean up the temp file.
            let _ = fs::remove_file(&tmp).await;
            return Err(io_err(source));
        }

        sync_dir(&self.root).await.map_err(io_err)?;

        tracing::debug!(%key, "record committed to disk");
        Ok(())
    }
}

/// Creates `path`, writes `bytes` and flushes them to disk.
async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

/// Flushes a directory's entries, making a rename inside it durable.
#[cfg(unix)]
async fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir).await?.sync_all().await
}

/// Directories can't be opened as files here; rename durability is left to
/// the filesystem.
#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

fn is_digest_named(key: &Username) -> bool {
    key.as_str().len() > MAX_HEX_KEY_BYTES
}

/// File name without extension for `key`.
fn file_stem(key: &Username) -> String {
    if is_digest_named(key) {
        format!("sha-{}", hex::encode(Sha256::digest(key.as_str().as_bytes())))
    } else {
        format!("id-{}", hex::encode(key.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use gatehouse_protocol::ProtocolError;

    use super::*;

    #[test]
    fn test_file_stem_hex_encodes_unsafe_characters() {
        assert_eq!(file_stem(&Username::new("a/..")), "id-612f2e2e");
        assert_eq!(file_stem(&Username::new("")), "id-");
    }

    #[test]
    fn test_file_stem_long_key_uses_fixed_length_digest() {
        let short = "u".repeat(MAX_HEX_KEY_BYTES);
        let long = "u".repeat(MAX_HEX_KEY_BYTES + 1);
        let huge = "u".repeat(4096);

        assert!(file_stem(&Username::new(short)).starts_with("id-"));
        let long_stem = file_stem(&Username::new(long));
        let huge_stem = file_stem(&Username::new(huge));
        assert!(long_stem.starts_with("sha-"));
        assert_eq!(long_stem.len(), 4 + 64);
        assert_eq!(huge_stem.len(), 4 + 64);
        assert_ne!(long_stem, huge_stem);
    }

    #[tokio::test]
    async fn test_path_for_stays_inside_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        let path = store.path_for(&Username::new("../../etc/passwd"));

        assert_eq!(path.parent(), Some(dir.path()));
        assert!(path.to_string_lossy().ends_with(".json"));
    }

    #[tokio::test]
    async fn test_sync_dir_existing_directory_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        assert!(sync_dir(dir.path()).await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sync_dir_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(sync_dir(&dir.path().join("gone")).await.is_err());
    }

    #[tokio::test]
    async fn test_commit_temp_file_failure_returns_commit_failed() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        let alice = Username::new("alice");
        // A directory squatting on the temp path makes File::create fail.
        let tmp = store.path_for(&alice).with_extension("json.tmp");
        std::fs::create_dir(&tmp).unwrap();

        let result = store
            .commit(
                &alice,
                &IdentityRecord::registered(
                    alice.clone(),
                    "salt".into(),
                    "hash".into(),
                ),
            )
            .await;

        assert!(matches!(result, Err(StoreError::CommitFailed { .. })));
        assert_eq!(store.load(&alice).await.unwrap(), None);
    }

    /// Reads JSON but refuses to write anything.
    struct ReadOnlyCodec;

    impl Codec for ReadOnlyCodec {
        fn extension(&self) -> &'static str {
            "json"
        }

        fn encode<T: serde::Serialize>(
            &self,
            _value: &T,
        ) -> Result<Vec<u8>, ProtocolError> {
            let err = serde_json::from_str::<u8>("not a number").unwrap_err();
            Err(ProtocolError::Encode(err))
        }

        fn decode<T: serde::de::DeserializeOwned>(
            &self,
            data: &[u8],
        ) -> Result<T, ProtocolError> {
            JsonCodec.decode(data)
        }
    }

    #[tokio::test]
    async fn test_commit_encode_failure_returns_encode_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::with_codec(dir.path(), ReadOnlyCodec)
            .await
            .unwrap();
        let alice = Username::new("alice");

        let result = store
            .commit(
                &alice,
                &IdentityRecord::registered(
                    alice.clone(),
                    "salt".into(),
                    "hash".into(),
                ),
            )
            .await;

        assert!(matches!(result, Err(StoreError::Encode { .. })));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
