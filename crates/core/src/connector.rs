//! Connector boundaries. Each messaging side (home protocol, external
//! network) implements its trait; the orchestrator composes the pair but
//! never implements either protocol.

use std::sync::{Arc, Weak};

use {async_trait::async_trait, tokio_util::sync::CancellationToken};

use {pontoon_common::UserId, pontoon_storage::SessionRecord};

use crate::bridge::Bridge;

/// Connector for the home chat protocol (the side the bridge surfaces
/// remote users and conversations into).
#[async_trait]
pub trait HomeConnector: Send + Sync {
    /// Wire the back-reference to the orchestrator. No I/O. Connectors keep
    /// only the weak handle; the orchestrator owns the registry.
    fn init(&self, bridge: Weak<Bridge>);

    /// Begin accepting and dispatching home-protocol traffic. A failure here
    /// is fatal to bridge startup.
    async fn start(&self, cancel: CancellationToken) -> anyhow::Result<()>;

    /// The bridge's own acting identity on the home protocol.
    fn bot_identity(&self) -> UserId;
}

/// Connector for the external network being bridged.
#[async_trait]
pub trait NetworkConnector: Send + Sync {
    /// Wire the back-reference to the orchestrator. No I/O.
    fn init(&self, bridge: Weak<Bridge>);

    /// Begin accepting and dispatching network traffic. A failure here is
    /// fatal to bridge startup.
    async fn start(&self, cancel: CancellationToken) -> anyhow::Result<()>;

    /// Build the client for one persisted session from its credential blob.
    /// May do I/O; the orchestrator calls this outside the registry lock.
    async fn load_session(&self, record: &SessionRecord)
    -> anyhow::Result<Arc<dyn SessionClient>>;
}

/// One authenticated connection to the external network, driven by the
/// network connector.
#[async_trait]
pub trait SessionClient: Send + Sync {
    /// Bring the connection online. Must abort promptly on cancellation.
    async fn connect(&self, cancel: CancellationToken) -> anyhow::Result<()>;

    /// Tear the connection down (logout).
    async fn disconnect(&self) -> anyhow::Result<()>;
}
