//! Shared data types for Gatehouse.
//!
//! This crate defines the values that cross crate boundaries:
//!
//! - **Types** ([`Username`], [`IdentityRecord`], [`SessionToken`]) —
//!   the identity key, the durable per-identity state, and the result of
//!   a successful login.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how records are
//!   converted to/from bytes by persistent stores.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits underneath everything else. It doesn't know
//! about actors, stores, or hashing — it only knows what an identity
//! record looks like and how to serialize it.
//!
//! ```text
//! Store (bytes) → Protocol (IdentityRecord) → Identity actor (state machine)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{IdentityRecord, SessionToken, Username};
