//! Startup session reconnection. Brings every persisted session online,
//! isolating per-session failure: a session that fails to connect stays
//! registered as disconnected and the rest proceed.

use std::sync::Arc;

use {
    tokio::task::JoinSet,
    tokio_util::sync::CancellationToken,
    tracing::{error, info, warn},
};

use {pontoon_config::ReconnectMode, pontoon_storage::SessionRecord};

use crate::{bridge::Bridge, error::BridgeError};

/// Reconnect all persisted sessions per the configured policy. Returns the
/// number of persisted records; individual failures are logged, never
/// propagated. Only listing failure and cancellation abort.
pub(crate) async fn run(
    bridge: &Arc<Bridge>,
    cancel: &CancellationToken,
) -> Result<usize, BridgeError> {
    let records = tokio::select! {
        _ = cancel.cancelled() => return Err(BridgeError::Cancelled),
        res = bridge.storage.list_sessions() => res.map_err(BridgeError::SessionList)?,
    };
    let total = records.len();

    match bridge.config.reconnect.mode {
        ReconnectMode::Sequential => {
            for record in records {
                if cancel.is_cancelled() {
                    return Err(BridgeError::Cancelled);
                }
                bring_online(bridge, record, cancel.clone()).await;
            }
        },
        ReconnectMode::Concurrent => {
            let mut tasks = JoinSet::new();
            for record in records {
                let bridge = Arc::clone(bridge);
                let cancel = cancel.clone();
                tasks.spawn(async move { bring_online(&bridge, record, cancel).await });
            }
            // Per-session outcomes were already handled inside each task;
            // the join only waits for them to finish.
            while tasks.join_next().await.is_some() {}
            if cancel.is_cancelled() {
                return Err(BridgeError::Cancelled);
            }
        },
    }
    Ok(total)
}

async fn bring_online(bridge: &Arc<Bridge>, record: SessionRecord, cancel: CancellationToken) {
    info!(session = %record.session_id, account = %record.account_id, "reconnecting session");
    let session = match bridge.get_or_create_session(&record).await {
        Ok(session) => session,
        Err(e) => {
            // No client means nothing to register; the record stays in
            // storage for the next startup.
            warn!(session = %record.session_id, account = %record.account_id, error = %e,
                "failed to load session client");
            return;
        },
    };
    let connect = session.connect(cancel.clone());
    tokio::select! {
        _ = cancel.cancelled() => {},
        res = connect => {
            if let Err(e) = res {
                error!(session = %session.id, account = %session.account_id, error = %e,
                    "failed to connect session");
            }
        },
    }
}
