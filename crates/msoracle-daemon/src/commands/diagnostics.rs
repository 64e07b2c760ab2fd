//! Diagnostics command handlers.

use std::sync::Arc;

use msoracle_core::PauseGate;
use serde_json::Value;
use tracing::info;

use super::param_caller;
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Daemon and directory status.
pub async fn get_daemon_status(state: &Arc<DaemonState>) -> Result {
    let directory = state.directory.lock().await;
    let uptime = crate::events::unix_now().saturating_sub(state.started_at);
    Ok(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": uptime,
        "owner": directory.owner(),
        "oracles": directory.len(),
        "globally_paused": directory.is_paused(),
        "events_emitted": state.event_bus.sequence(),
    }))
}

/// Stop the daemon. Owner only.
pub async fn shutdown(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = param_caller(params)?;
    state.directory.lock().await.ensure_owner(&caller)?;

    info!(by = %caller, "shutdown requested over RPC");
    // Nobody listening means the daemon is already stopping.
    let _ = state.shutdown_tx.send(());
    Ok(serde_json::json!({"shutting_down": true}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{test_state, TEST_OWNER};
    use msoracle_types::Address;

    #[tokio::test]
    async fn test_daemon_status() {
        let state = test_state();
        let status = get_daemon_status(&state).await.expect("status");
        assert_eq!(status["oracles"], 0);
        assert_eq!(status["globally_paused"], false);
        assert_eq!(status["owner"], TEST_OWNER.to_string());
    }

    #[tokio::test]
    async fn test_shutdown_requires_owner() {
        let state = test_state();
        let mut rx = state.shutdown_tx.subscribe();

        let err = shutdown(
            &state,
            &serde_json::json!({"caller": Address::from_low_u8(1).to_string()}),
        )
        .await
        .expect_err("outsider");
        assert_eq!(err.code, -32102);
        assert!(rx.try_recv().is_err());

        shutdown(&state, &serde_json::json!({"caller": TEST_OWNER.to_string()}))
            .await
            .expect("owner");
        assert!(rx.try_recv().is_ok());
    }
}
