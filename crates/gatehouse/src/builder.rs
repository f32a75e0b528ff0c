//! `GatehouseBuilder`: assembles an [`IdentityRegistry`] from config or
//! from caller-supplied parts.

use std::path::PathBuf;

use gatehouse_identity::{IdentityConfig, IdentityRegistry};
use gatehouse_session::{
    Argon2Hasher, CredentialHasher, HasherConfig, IssuerConfig, JwtIssuer,
    SessionIssuer,
};
use gatehouse_store::{FileStore, MemoryStore, StateStore};

use crate::backends::ConfiguredStore;
use crate::{GatehouseConfig, GatehouseError};

/// A registry assembled entirely from a [`GatehouseConfig`].
pub type Gatehouse =
    IdentityRegistry<ConfiguredStore, Argon2Hasher, JwtIssuer>;

/// Builder for configuring a Gatehouse registry.
///
/// # Example
///
/// ```rust,no_run
/// use gatehouse::prelude::*;
///
/// # async fn run() -> Result<(), GatehouseError> {
/// let gatehouse = GatehouseBuilder::new()
///     .store_path("/var/lib/gatehouse")
///     .issuer_config(IssuerConfig {
///         secret: "change-me".into(),
///         ..IssuerConfig::default()
///     })
///     .build()
///     .await?;
///
/// let session = gatehouse.login(&Username::new("alice"), "secret1").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct GatehouseBuilder {
    config: GatehouseConfig,
}

impl GatehouseBuilder {
    /// Creates a new builder with default settings: in-memory store and
    /// default Argon2 cost. [`build`](Self::build) still needs an issuer
    /// secret.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a complete config (e.g. one read with
    /// [`GatehouseConfig::from_json_file`]).
    pub fn from_config(config: GatehouseConfig) -> Self {
        Self { config }
    }

    /// Sets the identity actor configuration.
    pub fn identity_config(mut self, config: IdentityConfig) -> Self {
        self.config.identity = config;
        self
    }

    /// Sets the Argon2 cost parameters.
    pub fn hasher_config(mut self, config: HasherConfig) -> Self {
        self.config.hasher = config;
        self
    }

    /// Sets the token issuer configuration.
    pub fn issuer_config(mut self, config: IssuerConfig) -> Self {
        self.config.issuer = config;
        self
    }

    /// Persists records as files under `path`.
    pub fn store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.store_path = Some(path.into());
        self
    }

    /// Keeps records in memory only.
    pub fn in_memory(mut self) -> Self {
        self.config.store_path = None;
        self
    }

    pub fn config(&self) -> &GatehouseConfig {
        &self.config
    }

    /// Builds the registry described by the config.
    ///
    /// # Errors
    /// - [`GatehouseError::Store`] — the store directory can't be created
    /// - [`GatehouseError::Hash`] — the Argon2 parameters are invalid
    /// - [`GatehouseError::Issue`] — the issuer secret is missing or the
    ///   TTL is out of range
    pub async fn build(self) -> Result<Gatehouse, GatehouseError> {
        let GatehouseConfig {
            identity,
            hasher,
            issuer,
            store_path,
        } = self.config;

        let store = match store_path {
            Some(path) => ConfiguredStore::File(FileStore::open(path).await?),
            None => ConfiguredStore::Memory(MemoryStore::new()),
        };

        let issuer = JwtIssuer::new(&issuer)?;
        let hasher = Argon2Hasher::new(&hasher)?;

        tracing::info!(
            store = store_kind(&store),
            channel_size = identity.channel_size,
            idle_timeout_ms = identity.idle_timeout_ms,
            "gatehouse registry built"
        );
        Ok(IdentityRegistry::new(store, hasher, issuer, identity))
    }

    /// Builds a registry around caller-supplied parts, e.g. an
    /// `OpaqueTokenIssuer` for development. Only the identity section of
    /// the config is used.
    pub fn build_with<S, H, I>(
        self,
        store: S,
        hasher: H,
        issuer: I,
    ) -> IdentityRegistry<S, H, I>
    where
        S: StateStore,
        H: CredentialHasher,
        I: SessionIssuer,
    {
        IdentityRegistry::new(store, hasher, issuer, self.config.identity)
    }
}

fn store_kind(store: &ConfiguredStore) -> &'static str {
    match store {
        ConfiguredStore::Memory(_) => "memory",
        ConfiguredStore::File(_) => "file",
    }
}

#[cfg(test)]
mod tests {
    use gatehouse_protocol::Username;
    use gatehouse_session::IssueError;

    use super::*;

    #[test]
    fn test_builder_setters_update_config() {
        let builder = GatehouseBuilder::new()
            .identity_config(IdentityConfig {
                max_attempts: 7,
                ..IdentityConfig::default()
            })
            .store_path("/tmp/somewhere");

        assert_eq!(builder.config().identity.max_attempts, 7);
        assert!(builder.config().store_path.is_some());
        assert!(builder.in_memory().config().store_path.is_none());
    }

    fn issuer_config() -> IssuerConfig {
        IssuerConfig {
            secret: "builder-secret".into(),
            ..IssuerConfig::default()
        }
    }

    #[tokio::test]
    async fn test_build_invalid_hasher_config_returns_error() {
        let result = GatehouseBuilder::new()
            .issuer_config(issuer_config())
            .hasher_config(HasherConfig {
                memory_kib: 1,
                iterations: 1,
                parallelism: 1,
            })
            .build()
            .await;

        assert!(matches!(result, Err(GatehouseError::Hash(_))));
    }

    #[tokio::test]
    async fn test_build_without_secret_returns_missing_secret() {
        let result = GatehouseBuilder::new().build().await;

        assert!(matches!(
            result,
            Err(GatehouseError::Issue(IssueError::MissingSecret))
        ));
    }

    #[tokio::test]
    async fn test_build_default_store_is_memory_and_tokens_validate() {
        let gatehouse = GatehouseBuilder::new()
            .issuer_config(issuer_config())
            .build()
            .await
            .unwrap();
        let alice = Username::new("alice");

        let session = gatehouse.login(&alice, "secret1").await.unwrap();
        let caps = gatehouse.capabilities();

        assert!(matches!(*caps.store, ConfiguredStore::Memory(_)));
        assert_eq!(caps.issuer.validate(&session.token).unwrap().sub, "alice");
    }
}
