//! Shared types for the bridge: identifier newtypes for the two namespaces
//! the bridge straddles (home-protocol and external-network), and the
//! bridge-state signal broadcast to status consumers.

pub mod id;
pub mod signal;

pub use {
    id::{ConversationKey, RemoteUserId, RoomId, SessionId, UserId},
    signal::BridgeSignal,
};
