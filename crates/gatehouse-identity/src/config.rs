//! Identity actor configuration and state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// IdentityConfig
// ---------------------------------------------------------------------------

/// Configuration shared by every identity actor a registry spawns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Capacity of each actor's inbox. When full, callers wait (bounded
    /// channel backpressure).
    pub channel_size: usize,

    /// How long an actor may sit without requests before it evicts itself.
    /// 0 disables idle eviction.
    pub idle_timeout_ms: u64,

    /// How many times the registry tries a request when the actor it
    /// reached was evicting or had stopped.
    pub max_attempts: u32,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            channel_size: 32,
            idle_timeout_ms: 5 * 60 * 1000,
            max_attempts: 3,
        }
    }
}

impl IdentityConfig {
    /// Idle timeout as a `Duration`, or `None` when eviction is disabled.
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_ms > 0)
            .then(|| Duration::from_millis(self.idle_timeout_ms))
    }
}

// ---------------------------------------------------------------------------
// IdentityState
// ---------------------------------------------------------------------------

/// The lifecycle state of an identity actor.
///
/// ```text
/// Unloaded ──(first request: load)──→ NotRegistered ──(first login)──→ Registered
///     │                                                                    ↑
///     └──────────────────(load finds a registered record)──────────────────┘
/// ```
///
/// - **Unloaded**: the actor exists but hasn't read its record yet (or the
///   last load failed).
/// - **NotRegistered**: the record was loaded and has `exists == false`.
/// - **Registered**: the record was loaded, or just committed, with
///   `exists == true`. There is no way back out of this state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityState {
    Unloaded,
    NotRegistered,
    Registered,
}

impl IdentityState {
    /// Returns `true` once the record has been read from the store.
    pub fn is_loaded(&self) -> bool {
        !matches!(self, Self::Unloaded)
    }
}

impl std::fmt::Display for IdentityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unloaded => write!(f, "Unloaded"),
            Self::NotRegistered => write!(f, "NotRegistered"),
            Self::Registered => write!(f, "Registered"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_config_default() {
        let config = IdentityConfig::default();
        assert_eq!(config.channel_size, 32);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.idle_timeout(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_idle_timeout_zero_disables_eviction() {
        let config = IdentityConfig {
            idle_timeout_ms: 0,
            ..IdentityConfig::default()
        };
        assert_eq!(config.idle_timeout(), None);
    }

    #[test]
    fn test_identity_config_partial_json_uses_defaults() {
        let config: IdentityConfig =
            serde_json::from_str(r#"{"idle_timeout_ms": 250}"#).unwrap();
        assert_eq!(config.idle_timeout_ms, 250);
        assert_eq!(config.channel_size, 32);
    }

    #[test]
    fn test_identity_state_is_loaded() {
        assert!(!IdentityState::Unloaded.is_loaded());
        assert!(IdentityState::NotRegistered.is_loaded());
        assert!(IdentityState::Registered.is_loaded());
    }

    #[test]
    fn test_identity_state_display() {
        assert_eq!(IdentityState::NotRegistered.to_string(), "NotRegistered");
        assert_eq!(IdentityState::Registered.to_string(), "Registered");
    }
}
