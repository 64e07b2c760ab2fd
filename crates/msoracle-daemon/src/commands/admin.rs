//! Pause and ownership command handlers.

use std::sync::Arc;

use serde_json::Value;

use super::{mutate, param_address, param_bool, param_caller, param_oracle};
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Pause one oracle. Owner or one of the oracle's pausers.
pub async fn pause_oracle(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = param_caller(params)?;
    let id = param_oracle(params, "oracle")?;
    mutate(state, |dir| dir.pause_oracle(caller, id)).await?;
    Ok(serde_json::json!({"paused": true}))
}

/// Restart one oracle. Owner only.
pub async fn start_oracle(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = param_caller(params)?;
    let id = param_oracle(params, "oracle")?;
    mutate(state, |dir| dir.start_oracle(caller, id)).await?;
    Ok(serde_json::json!({"paused": false}))
}

/// Grant or revoke the pauser role on one oracle. Owner only.
pub async fn set_oracle_pauser(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = param_caller(params)?;
    let id = param_oracle(params, "oracle")?;
    let pauser = param_address(params, "pauser")?;
    let enabled = param_bool(params, "enabled")?;
    mutate(state, |dir| dir.set_oracle_pauser(caller, id, pauser, enabled)).await?;
    Ok(serde_json::json!({"pauser": pauser, "enabled": enabled}))
}

/// Pause every oracle. Owner or a global pauser.
pub async fn pause_all(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = param_caller(params)?;
    mutate(state, |dir| dir.pause_all(caller)).await?;
    Ok(serde_json::json!({"paused": true}))
}

/// Lift the global pause. Owner only.
pub async fn start_all(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = param_caller(params)?;
    mutate(state, |dir| dir.start_all(caller)).await?;
    Ok(serde_json::json!({"paused": false}))
}

/// Grant or revoke the global pauser role. Owner only.
pub async fn set_global_pauser(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = param_caller(params)?;
    let pauser = param_address(params, "pauser")?;
    let enabled = param_bool(params, "enabled")?;
    mutate(state, |dir| dir.set_global_pauser(caller, pauser, enabled)).await?;
    Ok(serde_json::json!({"pauser": pauser, "enabled": enabled}))
}

/// Hand the directory to a new owner.
pub async fn transfer_ownership(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = param_caller(params)?;
    let new_owner = param_address(params, "new_owner")?;
    mutate(state, |dir| dir.transfer_ownership(caller, new_owner)).await?;
    Ok(serde_json::json!({"owner": new_owner}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{oracles, test_state, TEST_OWNER};
    use msoracle_types::Address;

    fn owner() -> String {
        TEST_OWNER.to_string()
    }

    async fn create(state: &Arc<DaemonState>) -> u64 {
        let res = oracles::create_oracle(
            state,
            &serde_json::json!({"caller": owner(), "symbol": "ETH-USD", "name": "Ether"}),
        )
        .await
        .expect("create");
        res["oracle"].as_u64().expect("id")
    }

    #[tokio::test]
    async fn test_delegated_pauser_flow() {
        let state = test_state();
        let id = create(&state).await;
        let pauser = Address::from_low_u8(4).to_string();

        set_oracle_pauser(
            &state,
            &serde_json::json!({"caller": owner(), "oracle": id, "pauser": pauser, "enabled": true}),
        )
        .await
        .expect("grant");
        pause_oracle(&state, &serde_json::json!({"caller": pauser, "oracle": id}))
            .await
            .expect("pauser pauses");

        let err = start_oracle(&state, &serde_json::json!({"caller": pauser, "oracle": id}))
            .await
            .expect_err("pauser cannot start");
        assert_eq!(err.code, -32102);

        let err = pause_oracle(&state, &serde_json::json!({"caller": owner(), "oracle": id}))
            .await
            .expect_err("already paused");
        assert_eq!(err.code, -32114);

        start_oracle(&state, &serde_json::json!({"caller": owner(), "oracle": id}))
            .await
            .expect("owner starts");
        let err = start_oracle(&state, &serde_json::json!({"caller": owner(), "oracle": id}))
            .await
            .expect_err("not paused");
        assert_eq!(err.code, -32115);
    }

    #[tokio::test]
    async fn test_global_pause_blocks_reads() {
        let state = test_state();
        let id = create(&state).await;

        let outsider = Address::from_low_u8(3).to_string();
        let err = pause_all(&state, &serde_json::json!({"caller": outsider}))
            .await
            .expect_err("outsider");
        assert_eq!(err.code, -32113);

        set_global_pauser(
            &state,
            &serde_json::json!({"caller": owner(), "pauser": outsider, "enabled": true}),
        )
        .await
        .expect("grant");
        pause_all(&state, &serde_json::json!({"caller": outsider}))
            .await
            .expect("global pauser");

        let err = oracles::read_sample(&state, &serde_json::json!({"oracle": id}))
            .await
            .expect_err("paused");
        assert_eq!(err.code, -32105);

        start_all(&state, &serde_json::json!({"caller": owner()}))
            .await
            .expect("start");
        let err = oracles::read_sample(&state, &serde_json::json!({"oracle": id}))
            .await
            .expect_err("open but empty");
        assert_eq!(err.code, -32106);
    }

    #[tokio::test]
    async fn test_transfer_ownership() {
        let state = test_state();
        let next = Address::from_low_u8(8);
        transfer_ownership(
            &state,
            &serde_json::json!({"caller": owner(), "new_owner": next.to_string()}),
        )
        .await
        .expect("transfer");
        assert_eq!(state.directory.lock().await.owner(), next);

        let err = transfer_ownership(
            &state,
            &serde_json::json!({"caller": owner(), "new_owner": owner()}),
        )
        .await
        .expect_err("old owner");
        assert_eq!(err.code, -32102);
    }
}
