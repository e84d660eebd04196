use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    thiserror::Error,
};

use pontoon_common::{SessionId, UserId};

/// One persisted authenticated session on the external network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Network-assigned session identifier.
    pub session_id: SessionId,
    /// Home-protocol account that owns this session.
    pub account_id: UserId,
    /// Opaque network-specific credential/state blob. The orchestrator never
    /// looks inside; the network connector does.
    #[serde(default)]
    pub credentials: serde_json::Value,
}

/// Schema upgrade failure, tagged with the migration section that failed so
/// a version mismatch can be told apart from generic I/O trouble.
#[derive(Debug, Error)]
#[error("schema upgrade failed in section `{section}`")]
pub struct UpgradeError {
    pub section: &'static str,
    #[source]
    pub source: anyhow::Error,
}

/// Versioned persistence boundary. `upgrade` must run to completion before
/// any other method is called.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Run idempotent schema migrations.
    async fn upgrade(&self) -> Result<(), UpgradeError>;

    /// All persisted session records.
    async fn list_sessions(&self) -> anyhow::Result<Vec<SessionRecord>>;

    /// Insert or replace a session record.
    async fn put_session(&self, record: &SessionRecord) -> anyhow::Result<()>;

    /// Remove a session record (logout).
    async fn delete_session(&self, id: &SessionId) -> anyhow::Result<()>;
}
