//! Bridge orchestrator: owns the startup lifecycle and the in-memory registry
//! of live cross-network entities.
//!
//! Lifecycle:
//! 1. Upgrade storage (fatal on failure)
//! 2. Start home connector, then network connector (fixed order, fatal)
//! 3. Reconnect persisted sessions (per-session failures isolated)
//! 4. Broadcast `Unconfigured` if no sessions exist, then enter `Running`
//!
//! Protocol plumbing (event translation, wire formats, commands) lives behind
//! the connector traits in `connector.rs`; this crate never implements it.

pub mod bridge;
pub mod connector;
pub mod entity;
pub mod error;
mod reconnect;
pub mod registry;

#[cfg(test)]
pub(crate) mod testutil;

pub use {
    bridge::{Bridge, StartupState},
    connector::{HomeConnector, NetworkConnector, SessionClient},
    entity::{Account, ConversationMapping, RemoteUserProxy, Session, SessionState},
    error::{BridgeError, ConnectorKind},
    registry::Registry,
};
