//! Config schema types (bridge identity, database, reconnect policy).

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Stable identifier for this bridge instance, used in logs and as the
    /// namespace for anything the bridge registers on the home protocol.
    pub bridge_id: String,

    /// Prefix for management commands sent to the bridge bot. Consumed by
    /// the command subsystem, not by the orchestrator itself.
    pub command_prefix: String,

    pub database: DatabaseConfig,
    pub reconnect: ReconnectConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bridge_id: "pontoon".to_string(),
            command_prefix: "!bridge".to_string(),
            database: DatabaseConfig::default(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "pontoon.db".to_string(),
        }
    }
}

/// Session reconnection policy applied at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub mode: ReconnectMode,
}

/// Whether persisted sessions reconnect concurrently or one at a time.
/// Failures are isolated per session either way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconnectMode {
    #[default]
    Concurrent,
    Sequential,
}
