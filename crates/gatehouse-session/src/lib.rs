//! Credential hashing and session issuance for Gatehouse.
//!
//! This crate provides the two stateless capabilities an identity actor
//! relies on:
//!
//! 1. **Hashing** — deriving stored credential material from a password
//!    ([`CredentialHasher`], implemented by [`Argon2Hasher`])
//! 2. **Issuance** — minting a bearer token once a login succeeds
//!    ([`SessionIssuer`], implemented by [`JwtIssuer`] and
//!    [`OpaqueTokenIssuer`])
//!
//! Both are traits so that production, development and test setups can
//! plug in different implementations without touching the actor.
//!
//! # How it fits in the stack
//!
//! ```text
//! Identity Layer (above)  ← calls the hasher and the issuer during Login
//!     ↕
//! Session Layer (this crate)  ← stateless, pure capabilities
//!     ↕
//! Protocol Layer (below)  ← provides Username
//! ```

mod error;
mod hasher;
mod issuer;

pub use error::{HashError, IssueError};
pub use hasher::{
    Argon2Hasher, Credential, CredentialHasher, HasherConfig, constant_time_eq,
};
pub use issuer::{
    Claims, IssuerConfig, JwtIssuer, OpaqueTokenIssuer, SessionIssuer,
};
