use std::fmt;

use thiserror::Error;

use pontoon_storage::UpgradeError;

/// Which half of the connector pair an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorKind {
    Home,
    Network,
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => f.write_str("home"),
            Self::Network => f.write_str("network"),
        }
    }
}

/// Errors surfaced by the orchestrator.
///
/// Everything except `NotLoggedIn` is a startup error. Per-session reconnect
/// failures are not represented here; they are logged and the session stays
/// registered as disconnected.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Sentinel raised by operations that need a connected session for an
    /// account but find none.
    #[error("not logged in")]
    NotLoggedIn,

    /// Storage schema upgrade failed. Fatal; carries the migration section.
    #[error(transparent)]
    StorageUpgrade(#[from] UpgradeError),

    /// One of the two connectors failed to start. Fatal.
    #[error("failed to start {connector} connector")]
    ConnectorStart {
        connector: ConnectorKind,
        #[source]
        source: anyhow::Error,
    },

    /// Persisted session records could not be listed. Fatal.
    #[error("failed to list persisted sessions")]
    SessionList(#[source] anyhow::Error),

    /// The startup context was cancelled before the bridge reached `Running`.
    #[error("startup cancelled")]
    Cancelled,
}
