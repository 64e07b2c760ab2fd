//! Provider management and submission command handlers.

use std::sync::Arc;

use msoracle_types::ProvideRequest;
use serde::Deserialize;
use serde_json::Value;

use super::{
    mutate, param_address, param_caller, param_oracle, param_rate, param_str,
    param_string_or_default,
};
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Add a provider to an oracle. Owner only.
pub async fn add_provider(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = param_caller(params)?;
    let id = param_oracle(params, "oracle")?;
    let provider = param_address(params, "provider")?;
    let name = param_string_or_default(params, "name")?;
    mutate(state, |dir| dir.add_provider(caller, id, provider, name)).await?;
    Ok(serde_json::json!({"added": true}))
}

/// Remove a provider and its rate. Owner only.
pub async fn remove_provider(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = param_caller(params)?;
    let id = param_oracle(params, "oracle")?;
    let provider = param_address(params, "provider")?;
    mutate(state, |dir| dir.remove_provider(caller, id, provider)).await?;
    Ok(serde_json::json!({"removed": true}))
}

/// Change a provider's display name. Owner only.
pub async fn rename_provider(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = param_caller(params)?;
    let id = param_oracle(params, "oracle")?;
    let provider = param_address(params, "provider")?;
    let name = param_str(params, "name")?.to_string();
    mutate(state, |dir| dir.rename_provider(caller, id, provider, name)).await?;
    Ok(serde_json::json!({"renamed": true}))
}

/// List added providers with their current rates.
pub async fn list_providers(state: &Arc<DaemonState>, params: &Value) -> Result {
    let id = param_oracle(params, "oracle")?;
    let directory = state.directory.lock().await;
    let providers = directory.providers(id)?;
    serde_json::to_value(providers).map_err(|e| RpcError::internal_error(&e.to_string()))
}

/// Submit the caller's rate to one oracle.
pub async fn provide(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = param_caller(params)?;
    let id = param_oracle(params, "oracle")?;
    let value = param_rate(params, "value")?;
    mutate(state, |dir| dir.provide(caller, id, value)).await?;
    Ok(serde_json::json!({"provided": true}))
}

/// Submit the caller's rates to several oracles. All or nothing.
pub async fn provide_many(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = param_caller(params)?;
    let requests = params
        .get("requests")
        .ok_or_else(|| RpcError::invalid_params("requests required"))
        .and_then(|v| {
            Vec::<ProvideRequest>::deserialize(v)
                .map_err(|e| RpcError::invalid_params(&format!("requests: {e}")))
        })?;
    let count = requests.len();
    mutate(state, |dir| dir.provide_many(caller, &requests)).await?;
    Ok(serde_json::json!({"provided": count}))
}
