//! Per-identity login actors for Gatehouse.
//!
//! Each username is owned by an isolated Tokio task (actor model) holding
//! that identity's credential record. The first login for a username
//! registers it; later logins are verified against the stored credential.
//! Either way a successful login returns a fresh session token.
//!
//! # Key types
//!
//! - [`IdentityRegistry`] — routes requests to the actor owning a username,
//!   spawning and replacing actors as needed
//! - [`IdentityHandle`] — send commands to a running identity actor
//! - [`IdentityState`] — lifecycle state machine
//! - [`IdentityConfig`] — inbox size, idle timeout, retry attempts
//! - [`Capabilities`] — the store, hasher and issuer actors are built with
//!
//! # Example
//!
//! ```no_run
//! use gatehouse_identity::{IdentityConfig, IdentityRegistry};
//! use gatehouse_protocol::Username;
//! use gatehouse_session::{Argon2Hasher, OpaqueTokenIssuer};
//! use gatehouse_store::MemoryStore;
//!
//! # async fn run() -> Result<(), gatehouse_identity::IdentityError> {
//! let registry = IdentityRegistry::new(
//!     MemoryStore::new(),
//!     Argon2Hasher::default(),
//!     OpaqueTokenIssuer,
//!     IdentityConfig::default(),
//! );
//!
//! let alice = Username::new("alice");
//! let session = registry.login(&alice, "secret1").await?; // registers
//! let again = registry.login(&alice, "secret1").await?; // verifies
//! assert_ne!(session.token, again.token);
//! # Ok(())
//! # }
//! ```

mod actor;
mod config;
mod error;
mod registry;

pub use actor::{Capabilities, IdentityHandle, spawn_identity};
pub use config::{IdentityConfig, IdentityState};
pub use error::IdentityError;
pub use registry::IdentityRegistry;
