use serde::{Deserialize, Serialize};

/// Bridge-state signal broadcast to status consumers (operator dashboards,
/// status reporting).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeSignal {
    /// Startup completed with zero persisted sessions; the bridge is idle
    /// pending first login.
    Unconfigured,
}
