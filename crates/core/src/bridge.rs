//! The orchestrator: composes storage, the connector pair, and the registry
//! into one ordered startup sequence, and exposes the lazy entity API.

use std::sync::Arc;

use {
    tokio::sync::{RwLock, broadcast},
    tokio_util::sync::CancellationToken,
    tracing::info,
};

use {
    pontoon_common::{BridgeSignal, ConversationKey, RemoteUserId, RoomId, SessionId, UserId},
    pontoon_config::BridgeConfig,
    pontoon_storage::{SessionRecord, StorageGateway},
};

use crate::{
    connector::{HomeConnector, NetworkConnector},
    entity::{Account, ConversationMapping, RemoteUserProxy, Session},
    error::{BridgeError, ConnectorKind},
    reconnect,
    registry::Registry,
};

/// Startup progression. `Failed` is terminal and reachable from any
/// non-running state; there is no automatic retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupState {
    Created,
    StorageReady,
    ConnectorsReady,
    SessionsLoaded,
    Running,
    Failed,
}

/// The bridge orchestrator. Created once per process; owns the registry for
/// its whole lifetime. Connectors hold only `Weak` references back.
pub struct Bridge {
    pub bridge_id: String,
    pub config: BridgeConfig,
    pub storage: Arc<dyn StorageGateway>,
    pub home: Arc<dyn HomeConnector>,
    pub network: Arc<dyn NetworkConnector>,
    bot: UserId,
    registry: Registry,
    state: RwLock<StartupState>,
    signals: broadcast::Sender<BridgeSignal>,
}

impl Bridge {
    /// Construct the bridge and wire both connectors' back-references.
    /// No I/O happens here; call [`Bridge::start`] to bring it online.
    pub fn new(
        config: BridgeConfig,
        storage: Arc<dyn StorageGateway>,
        home: Arc<dyn HomeConnector>,
        network: Arc<dyn NetworkConnector>,
    ) -> Arc<Self> {
        let (signals, _) = broadcast::channel(16);
        let bridge = Arc::new(Self {
            bridge_id: config.bridge_id.clone(),
            bot: home.bot_identity(),
            config,
            storage,
            home,
            network,
            registry: Registry::new(),
            state: RwLock::new(StartupState::Created),
            signals,
        });
        bridge.home.init(Arc::downgrade(&bridge));
        bridge.network.init(Arc::downgrade(&bridge));
        bridge
    }

    /// The bridge's own acting identity on the home protocol.
    pub fn bot(&self) -> &UserId {
        &self.bot
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub async fn startup_state(&self) -> StartupState {
        *self.state.read().await
    }

    /// Subscribe to bridge-state signals. Subscribe before calling `start`
    /// to observe the `Unconfigured` signal.
    pub fn subscribe(&self) -> broadcast::Receiver<BridgeSignal> {
        self.signals.subscribe()
    }

    async fn set_state(&self, state: StartupState) {
        *self.state.write().await = state;
    }

    // ── Startup ──────────────────────────────────────────────────────────

    /// Run the startup sequence to completion. Fatal errors and cancellation
    /// leave the bridge in the `Failed` state; restarting is the caller's
    /// responsibility (process restart).
    pub async fn start(self: &Arc<Self>, cancel: CancellationToken) -> Result<(), BridgeError> {
        match self.run_start(&cancel).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.set_state(StartupState::Failed).await;
                Err(e)
            },
        }
    }

    async fn run_start(self: &Arc<Self>, cancel: &CancellationToken) -> Result<(), BridgeError> {
        info!(bridge = %self.bridge_id, "starting bridge");

        tokio::select! {
            _ = cancel.cancelled() => return Err(BridgeError::Cancelled),
            res = self.storage.upgrade() => res?,
        }
        self.set_state(StartupState::StorageReady).await;

        info!("starting home connector");
        self.start_connector(ConnectorKind::Home, cancel).await?;
        info!("starting network connector");
        self.start_connector(ConnectorKind::Network, cancel).await?;
        self.set_state(StartupState::ConnectorsReady).await;

        let loaded = reconnect::run(self, cancel).await?;
        self.set_state(StartupState::SessionsLoaded).await;
        if loaded == 0 {
            info!("no persisted sessions found");
            // Nobody subscribed yet is fine.
            let _ = self.signals.send(BridgeSignal::Unconfigured);
        }

        self.set_state(StartupState::Running).await;
        info!(bridge = %self.bridge_id, "bridge started");
        Ok(())
    }

    async fn start_connector(
        &self,
        kind: ConnectorKind,
        cancel: &CancellationToken,
    ) -> Result<(), BridgeError> {
        let start = match kind {
            ConnectorKind::Home => self.home.start(cancel.clone()),
            ConnectorKind::Network => self.network.start(cancel.clone()),
        };
        tokio::select! {
            _ = cancel.cancelled() => Err(BridgeError::Cancelled),
            res = start => res.map_err(|e| BridgeError::ConnectorStart {
                connector: kind,
                source: e,
            }),
        }
    }

    // ── Lazy entity API ──────────────────────────────────────────────────
    //
    // All get-or-create paths follow check-construct-recheck: look up the
    // registry, construct outside the lock, then insert — the registry
    // returns whichever entity won a concurrent race.

    pub async fn get_or_create_account(&self, id: &UserId) -> Arc<Account> {
        if let Some(existing) = self.registry.account(id).await {
            return existing;
        }
        self.registry
            .insert_account(Arc::new(Account::new(id.clone())))
            .await
    }

    /// Attach a session for an already-persisted record. The client build is
    /// the potentially slow part and runs outside the registry lock.
    pub async fn get_or_create_session(
        &self,
        record: &SessionRecord,
    ) -> anyhow::Result<Arc<Session>> {
        if let Some(existing) = self.registry.session(&record.session_id).await {
            return Ok(existing);
        }
        let client = self.network.load_session(record).await?;
        self.get_or_create_account(&record.account_id).await;
        let session = Arc::new(Session::new(
            record.session_id.clone(),
            record.account_id.clone(),
            client,
        ));
        Ok(self.registry.insert_session(session).await)
    }

    /// Persist and register a freshly authenticated session (login path).
    pub async fn add_session(&self, record: &SessionRecord) -> anyhow::Result<Arc<Session>> {
        self.storage.put_session(record).await?;
        self.get_or_create_session(record).await
    }

    /// Remove a session from storage and the registry, disconnecting its
    /// client. The explicit eviction path; sessions never expire passively.
    pub async fn logout(&self, id: &SessionId) -> anyhow::Result<()> {
        self.storage.delete_session(id).await?;
        if let Some(session) = self.registry.remove_session(id).await {
            if let Err(e) = session.disconnect().await {
                tracing::warn!(session = %id, error = %e, "disconnect during logout failed");
            }
            info!(session = %id, account = %session.account_id, "logged out");
        }
        Ok(())
    }

    /// A connected session for the account, or the `NotLoggedIn` sentinel.
    pub async fn logged_in_session(&self, account: &UserId) -> Result<Arc<Session>, BridgeError> {
        self.registry
            .sessions_for_account(account)
            .await
            .into_iter()
            .find(|s| s.is_connected())
            .ok_or(BridgeError::NotLoggedIn)
    }

    /// Get or create the mapping for an external conversation. The room may
    /// be unknown at creation time and assigned later via
    /// [`Registry::assign_room`].
    pub async fn get_or_create_conversation(
        &self,
        key: &ConversationKey,
        room: Option<RoomId>,
    ) -> Arc<ConversationMapping> {
        if let Some(existing) = self.registry.conversation(key).await {
            return existing;
        }
        self.registry
            .insert_conversation(Arc::new(ConversationMapping::new(key.clone(), room)))
            .await
    }

    /// Drop a conversation mapping (unbridge). Both keys go atomically.
    pub async fn remove_conversation(
        &self,
        key: &ConversationKey,
    ) -> Option<Arc<ConversationMapping>> {
        self.registry.remove_conversation(key).await
    }

    pub async fn get_or_create_remote_user(&self, id: &RemoteUserId) -> Arc<RemoteUserProxy> {
        if let Some(existing) = self.registry.remote_user(id).await {
            return existing;
        }
        self.registry
            .insert_remote_user(Arc::new(RemoteUserProxy::new(id.clone())))
            .await
    }
}
