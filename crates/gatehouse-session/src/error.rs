//! Error types for the credential and session layer.

/// Errors from a [`CredentialHasher`](crate::CredentialHasher).
///
/// Every variant is fatal to the login that triggered it. Retrying with the
/// same inputs would fail the same way.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// The configured cost parameters were rejected by the algorithm.
    #[error("invalid hasher parameters: {0}")]
    InvalidParams(String),

    /// A stored salt could not be parsed.
    #[error("malformed salt: {0}")]
    MalformedSalt(String),

    /// The algorithm failed to produce a hash.
    #[error("hash derivation failed: {0}")]
    Derivation(String),

    /// The blocking task running the hasher died before returning.
    #[error("hasher worker failed: {0}")]
    Worker(String),
}

/// Errors from a [`SessionIssuer`](crate::SessionIssuer).
#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    /// The issuer was configured without a signing secret.
    #[error("token signing secret is empty")]
    MissingSecret,

    /// The configured lifetime does not fit in a timestamp.
    #[error("token lifetime of {0} seconds is out of range")]
    InvalidTtl(u64),

    /// Signing the token failed.
    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// A token presented for validation was rejected (bad signature,
    /// wrong issuer, expired, or malformed).
    #[error("token rejected: {0}")]
    Rejected(#[source] jsonwebtoken::errors::Error),
}
