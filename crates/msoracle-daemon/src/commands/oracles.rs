//! Oracle lifecycle and read command handlers.

use std::sync::Arc;

use msoracle_core::{MultiSourceOracle, NewOracle, OracleDirectory};
use serde_json::Value;

use super::{
    mutate, param_address, param_caller, param_opt_oracle, param_oracle, param_str,
    param_string_or_default,
};
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Summary of one oracle as returned by `get_oracle` and `list_oracles`.
fn oracle_json(directory: &OracleDirectory, oracle: &MultiSourceOracle) -> Value {
    let meta = oracle.metadata();
    let pausers: Vec<String> = oracle.gate().pausers().map(|p| p.to_string()).collect();
    serde_json::json!({
        "oracle": oracle.id(),
        "symbol": meta.symbol,
        "name": meta.name,
        "decimals": meta.decimals,
        "token": meta.token,
        "maintainer": meta.maintainer,
        "paused": oracle.is_paused(directory.gate()),
        "pausers": pausers,
        "upgrade": oracle.upgrade(),
        "resolved": directory.resolve(oracle.id()).ok(),
        "providers": oracle.provider_count(),
        "submitted": oracle.ordered_values().len(),
    })
}

/// Create an oracle. Owner only.
pub async fn create_oracle(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = param_caller(params)?;
    let new_oracle = NewOracle {
        symbol: param_str(params, "symbol")?.to_string(),
        name: param_str(params, "name")?.to_string(),
        decimals: match params.get("decimals") {
            None | Some(Value::Null) => 0,
            Some(v) => v
                .as_u64()
                .and_then(|d| u8::try_from(d).ok())
                .ok_or_else(|| RpcError::invalid_params("decimals must fit in u8"))?,
        },
        token: match params.get("token") {
            None | Some(Value::Null) => Default::default(),
            Some(_) => param_address(params, "token")?,
        },
        maintainer: param_string_or_default(params, "maintainer")?,
    };

    let id = mutate(state, |dir| dir.create_oracle(caller, new_oracle)).await?;
    Ok(serde_json::json!({"oracle": id}))
}

/// Look up one oracle by `oracle` id, `symbol` or `name`.
pub async fn get_oracle(state: &Arc<DaemonState>, params: &Value) -> Result {
    let directory = state.directory.lock().await;
    let id = if params.get("oracle").is_some() {
        param_oracle(params, "oracle")?
    } else if let Some(symbol) = params.get("symbol").and_then(|v| v.as_str()) {
        directory
            .find_by_symbol(symbol)
            .ok_or_else(|| RpcError::invalid_params(&format!("unknown symbol {symbol:?}")))?
    } else if let Some(name) = params.get("name").and_then(|v| v.as_str()) {
        directory
            .find_by_name(name)
            .ok_or_else(|| RpcError::invalid_params(&format!("unknown name {name:?}")))?
    } else {
        return Err(RpcError::invalid_params("oracle, symbol or name required"));
    };

    let oracle = directory.oracle(id)?;
    Ok(oracle_json(&directory, oracle))
}

/// List every oracle in creation order.
pub async fn list_oracles(state: &Arc<DaemonState>) -> Result {
    let directory = state.directory.lock().await;
    let oracles: Vec<Value> = directory
        .oracles()
        .map(|oracle| oracle_json(&directory, oracle))
        .collect();
    Ok(Value::Array(oracles))
}

/// Read the current sample, following the upgrade chain.
pub async fn read_sample(state: &Arc<DaemonState>, params: &Value) -> Result {
    let id = param_oracle(params, "oracle")?;
    let directory = state.directory.lock().await;
    let sample = directory.read_sample(id)?;
    let source = directory.resolve(id)?;
    Ok(serde_json::json!({
        "oracle": id,
        "source": source,
        "count": sample.count,
        "aggregate": sample.aggregate.to_string(),
    }))
}

/// Rename an oracle. Owner only.
pub async fn set_name(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = param_caller(params)?;
    let id = param_oracle(params, "oracle")?;
    let name = param_str(params, "name")?.to_string();
    mutate(state, |dir| dir.set_name(caller, id, name)).await?;
    Ok(serde_json::json!({"updated": true}))
}

/// Change the maintainer string of an oracle. Owner only.
pub async fn set_maintainer(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = param_caller(params)?;
    let id = param_oracle(params, "oracle")?;
    let maintainer = param_string_or_default(params, "maintainer")?;
    mutate(state, |dir| dir.set_maintainer(caller, id, maintainer)).await?;
    Ok(serde_json::json!({"updated": true}))
}

/// Set or clear (`successor: null`) the upgrade pointer. Owner only.
pub async fn set_upgrade(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = param_caller(params)?;
    let id = param_oracle(params, "oracle")?;
    let successor = param_opt_oracle(params, "successor")?;
    mutate(state, |dir| dir.set_upgrade(caller, id, successor)).await?;
    Ok(serde_json::json!({"oracle": id, "successor": successor}))
}
