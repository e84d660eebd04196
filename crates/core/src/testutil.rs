//! Mock collaborators for orchestrator tests.

use std::{
    collections::HashSet,
    sync::{
        Arc, Mutex, Weak,
        atomic::{AtomicBool, Ordering},
    },
};

use {async_trait::async_trait, tokio_util::sync::CancellationToken};

use {
    pontoon_common::{SessionId, UserId},
    pontoon_config::BridgeConfig,
    pontoon_storage::{SessionRecord, StorageGateway, UpgradeError},
};

use crate::{
    bridge::Bridge,
    connector::{HomeConnector, NetworkConnector, SessionClient},
};

pub fn test_config() -> BridgeConfig {
    BridgeConfig {
        bridge_id: "test-bridge".to_string(),
        ..BridgeConfig::default()
    }
}

// ── Storage ──────────────────────────────────────────────────────────────

pub struct MockStorage {
    fail_upgrade: Option<&'static str>,
    sessions: tokio::sync::Mutex<Vec<SessionRecord>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self {
            fail_upgrade: None,
            sessions: tokio::sync::Mutex::new(Vec::new()),
        }
    }

    /// Upgrade fails, tagged with `section`.
    pub fn failing_upgrade(mut self, section: &'static str) -> Self {
        self.fail_upgrade = Some(section);
        self
    }

    pub fn with_sessions(self, records: Vec<SessionRecord>) -> Self {
        Self {
            sessions: tokio::sync::Mutex::new(records),
            ..self
        }
    }

    pub async fn session_ids(&self) -> Vec<String> {
        self.sessions
            .lock()
            .await
            .iter()
            .map(|r| r.session_id.to_string())
            .collect()
    }
}

#[async_trait]
impl StorageGateway for MockStorage {
    async fn upgrade(&self) -> Result<(), UpgradeError> {
        match self.fail_upgrade {
            Some(section) => Err(UpgradeError {
                section,
                source: anyhow::anyhow!("migration blew up"),
            }),
            None => Ok(()),
        }
    }

    async fn list_sessions(&self) -> anyhow::Result<Vec<SessionRecord>> {
        Ok(self.sessions.lock().await.clone())
    }

    async fn put_session(&self, record: &SessionRecord) -> anyhow::Result<()> {
        let mut sessions = self.sessions.lock().await;
        sessions.retain(|r| r.session_id != record.session_id);
        sessions.push(record.clone());
        Ok(())
    }

    async fn delete_session(&self, id: &SessionId) -> anyhow::Result<()> {
        self.sessions.lock().await.retain(|r| &r.session_id != id);
        Ok(())
    }
}

// ── Home connector ───────────────────────────────────────────────────────

pub struct MockHome {
    fail_start: bool,
    hang_start: bool,
    started: AtomicBool,
    bridge: Mutex<Option<Weak<Bridge>>>,
}

impl MockHome {
    pub fn new() -> Self {
        Self {
            fail_start: false,
            hang_start: false,
            started: AtomicBool::new(false),
            bridge: Mutex::new(None),
        }
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// `start` never completes; only cancellation gets past it.
    pub fn hanging_start(mut self) -> Self {
        self.hang_start = true;
        self
    }

    pub fn was_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub fn bridge(&self) -> Option<Arc<Bridge>> {
        self.bridge.lock().unwrap().as_ref()?.upgrade()
    }
}

#[async_trait]
impl HomeConnector for MockHome {
    fn init(&self, bridge: Weak<Bridge>) {
        *self.bridge.lock().unwrap() = Some(bridge);
    }

    async fn start(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        self.started.store(true, Ordering::Release);
        if self.fail_start {
            anyhow::bail!("homeserver unreachable");
        }
        if self.hang_start {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    fn bot_identity(&self) -> UserId {
        UserId::new("@bridge-bot:hs")
    }
}

// ── Network connector ────────────────────────────────────────────────────

pub struct MockNetwork {
    fail_start: bool,
    fail_load: HashSet<String>,
    fail_connect: HashSet<String>,
    started: AtomicBool,
    bridge: Mutex<Option<Weak<Bridge>>>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self {
            fail_start: false,
            fail_load: HashSet::new(),
            fail_connect: HashSet::new(),
            started: AtomicBool::new(false),
            bridge: Mutex::new(None),
        }
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// `load_session` fails for this session id.
    pub fn failing_load(mut self, session: &str) -> Self {
        self.fail_load.insert(session.to_string());
        self
    }

    /// The built client's `connect` fails for this session id.
    pub fn failing_connect(mut self, session: &str) -> Self {
        self.fail_connect.insert(session.to_string());
        self
    }

    pub fn was_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub fn bridge(&self) -> Option<Arc<Bridge>> {
        self.bridge.lock().unwrap().as_ref()?.upgrade()
    }
}

#[async_trait]
impl NetworkConnector for MockNetwork {
    fn init(&self, bridge: Weak<Bridge>) {
        *self.bridge.lock().unwrap() = Some(bridge);
    }

    async fn start(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        self.started.store(true, Ordering::Release);
        if self.fail_start {
            anyhow::bail!("network gateway refused us");
        }
        Ok(())
    }

    async fn load_session(
        &self,
        record: &SessionRecord,
    ) -> anyhow::Result<Arc<dyn SessionClient>> {
        if self.fail_load.contains(record.session_id.as_str()) {
            anyhow::bail!("credential blob rejected");
        }
        Ok(Arc::new(MockClient {
            fail_connect: self.fail_connect.contains(record.session_id.as_str()),
        }))
    }
}

struct MockClient {
    fail_connect: bool,
}

#[async_trait]
impl SessionClient for MockClient {
    async fn connect(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        if self.fail_connect {
            anyhow::bail!("connection refused");
        }
        Ok(())
    }

    async fn disconnect(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
