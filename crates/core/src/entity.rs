//! Live entity objects held by the registry. All are created lazily on first
//! reference and evicted only by explicit removal (logout, unbridge).

use std::sync::{
    Arc, OnceLock,
    atomic::{AtomicBool, Ordering},
};

use {tokio::sync::RwLock, tokio_util::sync::CancellationToken};

use pontoon_common::{ConversationKey, RemoteUserId, RoomId, SessionId, UserId};

use crate::connector::SessionClient;

/// A home-protocol identity that has linked at least one session.
pub struct Account {
    pub id: UserId,
    /// Direct room between this account and the bridge bot, if one exists.
    management_room: RwLock<Option<RoomId>>,
}

impl Account {
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            management_room: RwLock::new(None),
        }
    }

    pub async fn management_room(&self) -> Option<RoomId> {
        self.management_room.read().await.clone()
    }

    pub async fn set_management_room(&self, room: Option<RoomId>) {
        *self.management_room.write().await = room;
    }
}

/// Connection state of a session. Sessions stay registered while
/// disconnected; reconnecting is the network connector's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
}

/// One authenticated connection to the external network, owned by exactly
/// one account.
pub struct Session {
    pub id: SessionId,
    pub account_id: UserId,
    client: Arc<dyn SessionClient>,
    connected: AtomicBool,
}

impl Session {
    pub fn new(id: SessionId, account_id: UserId, client: Arc<dyn SessionClient>) -> Self {
        Self {
            id,
            account_id,
            client,
            connected: AtomicBool::new(false),
        }
    }

    /// Bring the underlying client online. On failure the session stays
    /// registered in the `Disconnected` state; the caller decides whether to
    /// log or surface the error.
    pub async fn connect(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        self.client.connect(cancel).await?;
        self.connected.store(true, Ordering::Release);
        Ok(())
    }

    /// Tear the client down and mark the session disconnected.
    pub async fn disconnect(&self) -> anyhow::Result<()> {
        self.connected.store(false, Ordering::Release);
        self.client.disconnect().await
    }

    /// Called by the connector when the network drops the connection.
    pub fn mark_disconnected(&self) {
        self.connected.store(false, Ordering::Release);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn state(&self) -> SessionState {
        if self.is_connected() {
            SessionState::Connected
        } else {
            SessionState::Disconnected
        }
    }
}

/// A bridged conversation: an external-network chat and, once created, its
/// home-protocol room. The room is assigned at most once, after creation,
/// through [`crate::registry::Registry::assign_room`] so the room index stays
/// consistent with the mapping.
pub struct ConversationMapping {
    pub key: ConversationKey,
    room: OnceLock<RoomId>,
}

impl ConversationMapping {
    pub fn new(key: ConversationKey, room: Option<RoomId>) -> Self {
        let cell = OnceLock::new();
        if let Some(room) = room {
            let _ = cell.set(room);
        }
        Self { key, room: cell }
    }

    pub fn room(&self) -> Option<&RoomId> {
        self.room.get()
    }

    /// Set the home-protocol room. Returns false if one was already set.
    pub(crate) fn set_room(&self, room: RoomId) -> bool {
        self.room.set(room).is_ok()
    }
}

/// Home-protocol representation of an external-network participant.
pub struct RemoteUserProxy {
    pub id: RemoteUserId,
    /// Display name as last seen on the network.
    name: RwLock<Option<String>>,
}

impl RemoteUserProxy {
    pub fn new(id: RemoteUserId) -> Self {
        Self {
            id,
            name: RwLock::new(None),
        }
    }

    pub async fn name(&self) -> Option<String> {
        self.name.read().await.clone()
    }

    pub async fn set_name(&self, name: Option<String>) {
        *self.name.write().await = name;
    }
}
