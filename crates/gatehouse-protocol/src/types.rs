//! Core identity types.
//!
//! Everything here is plain data: serializable, cloneable, and free of
//! behavior beyond small constructors and accessors. The state machine that
//! mutates an [`IdentityRecord`] lives in `gatehouse-identity`.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Username
// ---------------------------------------------------------------------------

/// The identity key: one identity actor and one durable record per username.
///
/// A newtype over `String` so that a username can't be confused with a
/// password or a token in a function signature. `#[serde(transparent)]`
/// keeps the JSON form a plain string.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Wraps a username.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the username as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Unwraps into the inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Username {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Username {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Lets a `HashMap<Username, _>` be queried with a `&str`.
impl Borrow<str> for Username {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// IdentityRecord
// ---------------------------------------------------------------------------

/// The durable credential state for one username.
///
/// The zero value (`IdentityRecord::default()`) is what an identity actor
/// starts from when the store has nothing for its key: `exists` is false and
/// every other field is empty.
///
/// Once `exists` is true the remaining fields are write-once. Nothing in this
/// workspace ever rewrites the salt or hash of a registered record.
///
/// `#[serde(default)]` lets a record with missing fields decode to the zero
/// value for those fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityRecord {
    /// False until the first successful registration.
    pub exists: bool,
    /// The username the record was registered under.
    pub username: Username,
    /// Derived credential hash, never the plaintext.
    pub password_hash: String,
    /// Salt generated at registration.
    pub password_salt: String,
}

impl IdentityRecord {
    /// Builds the record for a freshly registered identity.
    pub fn registered(
        username: Username,
        password_salt: String,
        password_hash: String,
    ) -> Self {
        Self {
            exists: true,
            username,
            password_hash,
            password_salt,
        }
    }

    /// Returns `true` once the identity has been registered.
    pub fn is_registered(&self) -> bool {
        self.exists
    }
}

// ---------------------------------------------------------------------------
// SessionToken
// ---------------------------------------------------------------------------

/// The result of a successful login: an opaque bearer token bound to a
/// username. Never persisted by Gatehouse.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    /// The identity the token was issued for.
    pub username: Username,
    /// The bearer token itself.
    pub token: String,
}

/// Hand-written so that logging a `SessionToken` never prints the secret.
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionToken")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}
