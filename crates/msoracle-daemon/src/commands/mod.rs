//! IPC command handlers.
//!
//! Each submodule implements the commands for one IPC category. Mutating
//! handlers run through [`mutate`], which publishes the events the call
//! recorded.

pub mod admin;
pub mod diagnostics;
pub mod oracles;
pub mod providers;

use std::sync::Arc;

use msoracle_core::OracleDirectory;
use msoracle_types::oracle::rate_serde;
use msoracle_types::{Address, OracleId, Rate};
use serde_json::Value;

use crate::rpc::RpcError;
use crate::DaemonState;

type ParamResult<T> = std::result::Result<T, RpcError>;

/// Run `op` against the directory under its lock, then publish its events.
pub(crate) async fn mutate<T, F>(state: &Arc<DaemonState>, op: F) -> ParamResult<T>
where
    F: FnOnce(&mut OracleDirectory) -> msoracle_core::Result<T>,
{
    let mut directory = state.directory.lock().await;
    let outcome = op(&mut directory);
    let events = directory.drain_events();
    drop(directory);

    state.event_bus.publish(events);
    outcome.map_err(RpcError::from)
}

fn required<'a>(params: &'a Value, key: &str) -> ParamResult<&'a Value> {
    params
        .get(key)
        .filter(|v| !v.is_null())
        .ok_or_else(|| RpcError::invalid_params(&format!("{key} required")))
}

pub(crate) fn param_str<'a>(params: &'a Value, key: &str) -> ParamResult<&'a str> {
    required(params, key)?
        .as_str()
        .ok_or_else(|| RpcError::invalid_params(&format!("{key} must be a string")))
}

/// A string parameter that defaults to empty.
pub(crate) fn param_string_or_default(params: &Value, key: &str) -> ParamResult<String> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(_) => param_str(params, key).map(str::to_string),
    }
}

pub(crate) fn param_address(params: &Value, key: &str) -> ParamResult<Address> {
    param_str(params, key)?
        .parse()
        .map_err(|e| RpcError::invalid_params(&format!("{key}: {e}")))
}

/// The identity making the call.
pub(crate) fn param_caller(params: &Value) -> ParamResult<Address> {
    param_address(params, "caller")
}

pub(crate) fn param_oracle(params: &Value, key: &str) -> ParamResult<OracleId> {
    required(params, key)?
        .as_u64()
        .map(OracleId)
        .ok_or_else(|| RpcError::invalid_params(&format!("{key} must be an oracle id")))
}

/// An oracle id that may be absent or `null`.
pub(crate) fn param_opt_oracle(params: &Value, key: &str) -> ParamResult<Option<OracleId>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => param_oracle(params, key).map(Some),
    }
}

/// A rate given as a decimal string or a JSON integer.
pub(crate) fn param_rate(params: &Value, key: &str) -> ParamResult<Rate> {
    rate_serde::deserialize(required(params, key)?)
        .map_err(|e| RpcError::invalid_params(&format!("{key}: {e}")))
}

pub(crate) fn param_bool(params: &Value, key: &str) -> ParamResult<bool> {
    required(params, key)?
        .as_bool()
        .ok_or_else(|| RpcError::invalid_params(&format!("{key} must be a boolean")))
}

#[cfg(test)]
pub(crate) const TEST_OWNER: Address = Address::from_low_u8(0xee);

/// Daemon state around an empty directory owned by [`TEST_OWNER`].
#[cfg(test)]
pub(crate) fn test_state() -> Arc<DaemonState> {
    Arc::new(DaemonState::new(
        crate::config::DaemonConfig::default(),
        OracleDirectory::new(TEST_OWNER),
    ))
}
