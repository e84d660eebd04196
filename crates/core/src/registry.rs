//! In-memory registry of live cross-network entities.
//!
//! One lock guards all maps. Writers hold it only for the map update itself;
//! any I/O needed to construct an entity happens before the caller takes the
//! lock (check-construct-recheck, see [`crate::bridge::Bridge`]). The
//! `insert_*` methods implement the recheck: on a key collision they discard
//! the caller's candidate and return the entity that won the race.

use std::{collections::HashMap, sync::Arc};

use {tokio::sync::RwLock, tracing::warn};

use pontoon_common::{ConversationKey, RemoteUserId, RoomId, SessionId, UserId};

use crate::entity::{Account, ConversationMapping, RemoteUserProxy, Session};

#[derive(Default)]
struct Maps {
    accounts: HashMap<UserId, Arc<Account>>,
    sessions: HashMap<SessionId, Arc<Session>>,
    conversations_by_key: HashMap<ConversationKey, Arc<ConversationMapping>>,
    conversations_by_room: HashMap<RoomId, Arc<ConversationMapping>>,
    remote_users: HashMap<RemoteUserId, Arc<RemoteUserProxy>>,
}

/// Entity registry. Owned by the [`crate::bridge::Bridge`]; connectors reach
/// it through their weak bridge handle.
#[derive(Default)]
pub struct Registry {
    maps: RwLock<Maps>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Accounts ─────────────────────────────────────────────────────────

    pub async fn account(&self, id: &UserId) -> Option<Arc<Account>> {
        self.maps.read().await.accounts.get(id).cloned()
    }

    /// Insert if absent; returns the registered entity either way.
    pub async fn insert_account(&self, account: Arc<Account>) -> Arc<Account> {
        let mut maps = self.maps.write().await;
        maps.accounts
            .entry(account.id.clone())
            .or_insert(account)
            .clone()
    }

    pub async fn remove_account(&self, id: &UserId) -> Option<Arc<Account>> {
        self.maps.write().await.accounts.remove(id)
    }

    // ── Sessions ─────────────────────────────────────────────────────────

    pub async fn session(&self, id: &SessionId) -> Option<Arc<Session>> {
        self.maps.read().await.sessions.get(id).cloned()
    }

    /// Insert if absent; returns the registered entity either way.
    pub async fn insert_session(&self, session: Arc<Session>) -> Arc<Session> {
        let mut maps = self.maps.write().await;
        maps.sessions
            .entry(session.id.clone())
            .or_insert(session)
            .clone()
    }

    pub async fn remove_session(&self, id: &SessionId) -> Option<Arc<Session>> {
        self.maps.write().await.sessions.remove(id)
    }

    pub async fn sessions(&self) -> Vec<Arc<Session>> {
        self.maps.read().await.sessions.values().cloned().collect()
    }

    pub async fn sessions_for_account(&self, account: &UserId) -> Vec<Arc<Session>> {
        self.maps
            .read()
            .await
            .sessions
            .values()
            .filter(|s| &s.account_id == account)
            .cloned()
            .collect()
    }

    pub async fn session_count(&self) -> usize {
        self.maps.read().await.sessions.len()
    }

    // ── Conversations ────────────────────────────────────────────────────

    pub async fn conversation(&self, key: &ConversationKey) -> Option<Arc<ConversationMapping>> {
        self.maps.read().await.conversations_by_key.get(key).cloned()
    }

    pub async fn conversation_by_room(&self, room: &RoomId) -> Option<Arc<ConversationMapping>> {
        self.maps
            .read()
            .await
            .conversations_by_room
            .get(room)
            .cloned()
    }

    /// Insert if absent, registering the network key and, when the mapping
    /// already carries a room, the room key — both under the same lock hold.
    /// Returns the registered entity either way.
    pub async fn insert_conversation(
        &self,
        mapping: Arc<ConversationMapping>,
    ) -> Arc<ConversationMapping> {
        let mut maps = self.maps.write().await;
        if let Some(existing) = maps.conversations_by_key.get(&mapping.key) {
            return existing.clone();
        }
        maps.conversations_by_key
            .insert(mapping.key.clone(), mapping.clone());
        if let Some(room) = mapping.room() {
            if let Some(displaced) = maps
                .conversations_by_room
                .insert(room.clone(), mapping.clone())
            {
                warn!(room = %room, old_key = %displaced.key, new_key = %mapping.key,
                    "room was already mapped to another conversation");
            }
        }
        mapping
    }

    /// Attach the home-protocol room to an existing mapping and index it.
    /// Returns the mapping, or `None` if the network key is unknown. A
    /// mapping that already has a room keeps it.
    pub async fn assign_room(
        &self,
        key: &ConversationKey,
        room: RoomId,
    ) -> Option<Arc<ConversationMapping>> {
        let mut maps = self.maps.write().await;
        let mapping = maps.conversations_by_key.get(key).cloned()?;
        if mapping.set_room(room.clone()) {
            maps.conversations_by_room.insert(room, mapping.clone());
        } else if mapping.room() != Some(&room) {
            warn!(key = %key, room = %room, "conversation already has a different room");
        }
        Some(mapping)
    }

    /// Remove a mapping. Both key entries are dropped under one lock hold.
    pub async fn remove_conversation(
        &self,
        key: &ConversationKey,
    ) -> Option<Arc<ConversationMapping>> {
        let mut maps = self.maps.write().await;
        let mapping = maps.conversations_by_key.remove(key)?;
        if let Some(room) = mapping.room() {
            maps.conversations_by_room.remove(room);
        }
        Some(mapping)
    }

    // ── Remote users ─────────────────────────────────────────────────────

    pub async fn remote_user(&self, id: &RemoteUserId) -> Option<Arc<RemoteUserProxy>> {
        self.maps.read().await.remote_users.get(id).cloned()
    }

    /// Insert if absent; returns the registered entity either way.
    pub async fn insert_remote_user(&self, user: Arc<RemoteUserProxy>) -> Arc<RemoteUserProxy> {
        let mut maps = self.maps.write().await;
        maps.remote_users
            .entry(user.id.clone())
            .or_insert(user)
            .clone()
    }

    pub async fn remove_remote_user(&self, id: &RemoteUserId) -> Option<Arc<RemoteUserProxy>> {
        self.maps.write().await.remote_users.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(key: ConversationKey, room: Option<&str>) -> Arc<ConversationMapping> {
        Arc::new(ConversationMapping::new(key, room.map(RoomId::new)))
    }

    #[tokio::test]
    async fn insert_returns_race_winner() {
        let registry = Registry::new();
        let first = registry
            .insert_account(Arc::new(Account::new(UserId::new("@a:hs"))))
            .await;
        let second = registry
            .insert_account(Arc::new(Account::new(UserId::new("@a:hs"))))
            .await;
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn conversation_dual_key_resolves_same_instance() {
        let registry = Registry::new();
        let key = ConversationKey::global("chat-1");
        let inserted = registry
            .insert_conversation(mapping(key.clone(), Some("!room:hs")))
            .await;

        let by_key = registry.conversation(&key).await.unwrap();
        let by_room = registry
            .conversation_by_room(&RoomId::new("!room:hs"))
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&inserted, &by_key));
        assert!(Arc::ptr_eq(&inserted, &by_room));
    }

    #[tokio::test]
    async fn remove_conversation_drops_both_keys() {
        let registry = Registry::new();
        let key = ConversationKey::global("chat-1");
        registry
            .insert_conversation(mapping(key.clone(), Some("!room:hs")))
            .await;

        registry.remove_conversation(&key).await.unwrap();
        assert!(registry.conversation(&key).await.is_none());
        assert!(
            registry
                .conversation_by_room(&RoomId::new("!room:hs"))
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn room_assigned_after_creation() {
        let registry = Registry::new();
        let key = ConversationKey::scoped("dm-1", SessionId::new("s1"));
        let inserted = registry.insert_conversation(mapping(key.clone(), None)).await;
        assert!(inserted.room().is_none());
        assert!(
            registry
                .conversation_by_room(&RoomId::new("!dm:hs"))
                .await
                .is_none()
        );

        registry
            .assign_room(&key, RoomId::new("!dm:hs"))
            .await
            .unwrap();
        let by_room = registry
            .conversation_by_room(&RoomId::new("!dm:hs"))
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&inserted, &by_room));
    }

    #[tokio::test]
    async fn assign_room_on_unknown_key_is_none() {
        let registry = Registry::new();
        let missing = registry
            .assign_room(&ConversationKey::global("nope"), RoomId::new("!r:hs"))
            .await;
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn assign_room_keeps_existing_room() {
        let registry = Registry::new();
        let key = ConversationKey::global("chat-1");
        registry
            .insert_conversation(mapping(key.clone(), Some("!first:hs")))
            .await;

        let result = registry
            .assign_room(&key, RoomId::new("!second:hs"))
            .await
            .unwrap();
        assert_eq!(result.room(), Some(&RoomId::new("!first:hs")));
        // The losing room never gets indexed.
        assert!(
            registry
                .conversation_by_room(&RoomId::new("!second:hs"))
                .await
                .is_none()
        );
    }
}
