//! Top-level configuration, loadable from JSON.

use std::path::{Path, PathBuf};

use gatehouse_identity::IdentityConfig;
use gatehouse_session::{HasherConfig, IssuerConfig};
use serde::{Deserialize, Serialize};

use crate::GatehouseError;

/// Everything needed to assemble a registry.
///
/// Every field has a default, so a config file only lists what it
/// changes:
///
/// ```json
/// {
///   "identity": { "idle_timeout_ms": 60000 },
///   "issuer": { "secret": "change-me", "ttl_secs": 3600 },
///   "store_path": "/var/lib/gatehouse"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatehouseConfig {
    /// Actor inbox, idle eviction and retry settings.
    pub identity: IdentityConfig,
    /// Argon2 cost parameters.
    pub hasher: HasherConfig,
    /// Token signing settings. The secret is required to build.
    pub issuer: IssuerConfig,
    /// Directory for the file store. `None` keeps records in memory.
    pub store_path: Option<PathBuf>,
}

impl GatehouseConfig {
    /// Parses a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, GatehouseError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON config file.
    pub async fn from_json_file(
        path: impl AsRef<Path>,
    ) -> Result<Self, GatehouseError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await.map_err(|source| {
            GatehouseError::ConfigIo {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::from_json(&json)
    }
}
