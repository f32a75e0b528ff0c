//! # Gatehouse
//!
//! Per-identity session authentication on Tokio actors.
//!
//! Every username is owned by its own actor, which registers the username
//! on its first login, verifies the password on later ones, and hands back
//! a fresh session token each time it succeeds. Logins for one username
//! are serialized; logins for different usernames run in parallel.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gatehouse::prelude::*;
//!
//! # async fn run() -> Result<(), GatehouseError> {
//! gatehouse::init_tracing();
//!
//! let config = GatehouseConfig::from_json_file("gatehouse.json").await?;
//! let gatehouse = GatehouseBuilder::from_config(config).build().await?;
//!
//! let alice = Username::new("alice");
//! let session = gatehouse.login(&alice, "secret1").await?;
//! # Ok(())
//! # }
//! ```

mod backends;
mod builder;
mod config;
mod error;
mod telemetry;

pub use backends::ConfiguredStore;
pub use builder::{Gatehouse, GatehouseBuilder};
pub use config::GatehouseConfig;
pub use error::GatehouseError;
pub use telemetry::init_tracing;

pub use gatehouse_identity as identity;
pub use gatehouse_protocol as protocol;
pub use gatehouse_session as session;
pub use gatehouse_store as store;

/// The types most applications need.
pub mod prelude {
    pub use crate::{
        Gatehouse, GatehouseBuilder, GatehouseConfig, GatehouseError,
    };
    pub use gatehouse_identity::{
        IdentityConfig, IdentityError, IdentityRegistry, IdentityState,
    };
    pub use gatehouse_protocol::{IdentityRecord, SessionToken, Username};
    pub use gatehouse_session::{
        Argon2Hasher, HasherConfig, IssuerConfig, JwtIssuer, OpaqueTokenIssuer,
    };
    pub use gatehouse_store::{FileStore, MemoryStore, StateStore};
}
