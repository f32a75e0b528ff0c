//! Error types for the identity layer.

use gatehouse_protocol::Username;
use gatehouse_session::{HashError, IssueError};
use gatehouse_store::StoreError;

/// Why a login (or another identity operation) failed.
///
/// Callers branch on the variant; nothing here is signalled by panicking.
/// Whatever the variant, the durable record is exactly what it was before
/// the failed call.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The password doesn't match the stored credential. Retrying is
    /// pointless without a different password.
    #[error("invalid username or password")]
    InvalidCredential,

    /// Loading or committing the record failed.
    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),

    /// The hasher couldn't derive a hash (e.g. the stored salt is
    /// malformed).
    #[error("hashing failure: {0}")]
    Hashing(#[from] HashError),

    /// The credential was accepted but no token could be minted.
    #[error("token issuance failure: {0}")]
    Issuance(#[from] IssueError),

    /// The actor for this username had already stopped; the request was
    /// never delivered.
    #[error("identity {0} is unavailable")]
    Unavailable(Username),

    /// The actor died while the request was in flight. It may or may not
    /// have been applied, so it is not retried automatically.
    #[error("identity {0} stopped before replying")]
    Interrupted(Username),

    /// The actor was evicting itself and rejected the request without
    /// touching state. Safe to resend to a fresh activation.
    #[error("identity {0} was evicted before the request ran")]
    Evicted(Username),
}

impl IdentityError {
    /// Returns `true` if the request never ran against the identity's state
    /// and may be resent to a new activation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Evicted(_))
    }
}
