//! Unified error type for Gatehouse.

use std::path::PathBuf;

use gatehouse_identity::IdentityError;
use gatehouse_protocol::ProtocolError;
use gatehouse_session::{HashError, IssueError};
use gatehouse_store::StoreError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `gatehouse` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GatehouseError {
    /// A record couldn't be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The durable store failed or couldn't be opened.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The credential hasher failed or was misconfigured.
    #[error(transparent)]
    Hash(#[from] HashError),

    /// The session issuer failed or was misconfigured.
    #[error(transparent)]
    Issue(#[from] IssueError),

    /// A login or another identity operation failed.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// A configuration document isn't valid JSON for [`GatehouseConfig`].
    ///
    /// [`GatehouseConfig`]: crate::GatehouseConfig
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// A configuration file couldn't be read.
    #[error("cannot read configuration {}: {source}", path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GatehouseError {
    /// Returns `true` if this is a rejected credential rather than an
    /// infrastructure failure.
    pub fn is_invalid_credential(&self) -> bool {
        matches!(self, Self::Identity(IdentityError::InvalidCredential))
    }
}

#[cfg(test)]
mod tests {
    use gatehouse_protocol::Username;

    use super::*;

    #[test]
    fn test_from_store_error() {
        let err = StoreError::Unavailable("offline".into());
        let gatehouse_err: GatehouseError = err.into();
        assert!(matches!(gatehouse_err, GatehouseError::Store(_)));
        assert!(gatehouse_err.to_string().contains("offline"));
    }

    #[test]
    fn test_from_hash_error() {
        let err = HashError::MalformedSalt("bad".into());
        let gatehouse_err: GatehouseError = err.into();
        assert!(matches!(gatehouse_err, GatehouseError::Hash(_)));
    }

    #[test]
    fn test_from_issue_error() {
        let gatehouse_err: GatehouseError = IssueError::MissingSecret.into();
        assert!(matches!(gatehouse_err, GatehouseError::Issue(_)));
    }

    #[test]
    fn test_from_identity_error() {
        let err = IdentityError::Evicted(Username::new("alice"));
        let gatehouse_err: GatehouseError = err.into();
        assert!(matches!(gatehouse_err, GatehouseError::Identity(_)));
        assert!(gatehouse_err.to_string().contains("alice"));
    }

    #[test]
    fn test_from_json_error() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        let gatehouse_err: GatehouseError = err.into();
        assert!(matches!(gatehouse_err, GatehouseError::Config(_)));
    }

    #[test]
    fn test_is_invalid_credential() {
        let rejected: GatehouseError = IdentityError::InvalidCredential.into();
        let offline: GatehouseError =
            StoreError::Unavailable("offline".into()).into();

        assert!(rejected.is_invalid_credential());
        assert!(!offline.is_invalid_credential());
    }
}
