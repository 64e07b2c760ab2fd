//! JSON-RPC server over Unix socket.
//!
//! Listens on a Unix domain socket, accepts connections, and dispatches
//! newline-delimited JSON-RPC method calls to the command handlers. A
//! connection that calls `subscribe_events` also receives `event`
//! notifications on the same stream.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use msoracle_core::OracleError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::commands;
use crate::events::{Event, EventFilter};
use crate::DaemonState;

/// Outbound lines queued per connection.
const OUTBOUND_BUFFER: usize = 256;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request ID.
    #[serde(default)]
    pub id: Value,
    /// Method name.
    pub method: String,
    /// Parameters.
    #[serde(default)]
    pub params: Value,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    /// JSON-RPC version.
    pub jsonrpc: String,
    /// Request ID.
    pub id: Value,
    /// Result or error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// Server-initiated message without an ID.
#[derive(Debug, Serialize)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RpcError {
    /// Error code.
    pub code: i32,
    /// Error name.
    pub message: String,
    /// Optional structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcResponse {
    /// Create a success response.
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl RpcNotification {
    /// An `event` notification for one subscription.
    pub fn event(subscription_id: &str, event: &Event) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: "event".to_string(),
            params: serde_json::json!({
                "subscription_id": subscription_id,
                "event": event,
            }),
        }
    }
}

impl RpcError {
    // Standard JSON-RPC errors

    /// Parse error (-32700).
    pub fn parse_error() -> Self {
        Self {
            code: -32700,
            message: "PARSE_ERROR".to_string(),
            data: None,
        }
    }

    /// Invalid request (-32600).
    pub fn invalid_request() -> Self {
        Self {
            code: -32600,
            message: "INVALID_REQUEST".to_string(),
            data: None,
        }
    }

    /// Method not found (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: "METHOD_NOT_FOUND".to_string(),
            data: Some(serde_json::json!({"method": method})),
        }
    }

    /// Invalid params (-32602).
    pub fn invalid_params(detail: &str) -> Self {
        Self {
            code: -32602,
            message: "INVALID_PARAMS".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Internal error (-32603).
    pub fn internal_error(detail: &str) -> Self {
        Self {
            code: -32603,
            message: "INTERNAL_ERROR".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Unknown subscription handle (-32190).
    pub fn unknown_subscription(subscription_id: &str) -> Self {
        Self {
            code: -32190,
            message: "UNKNOWN_SUBSCRIPTION".to_string(),
            data: Some(serde_json::json!({"subscription_id": subscription_id})),
        }
    }
}

/// Oracle errors occupy -32100..=-32116.
impl From<OracleError> for RpcError {
    fn from(err: OracleError) -> Self {
        let (code, message) = match &err {
            OracleError::DuplicateProvider(_) => (-32100, "DUPLICATE_PROVIDER"),
            OracleError::ProviderNotFound(_) => (-32101, "PROVIDER_NOT_FOUND"),
            OracleError::UnauthorizedCaller(_) => (-32102, "UNAUTHORIZED_CALLER"),
            OracleError::ZeroValue => (-32103, "ZERO_VALUE"),
            OracleError::ValueOverflow(_) => (-32104, "VALUE_OVERFLOW"),
            OracleError::Paused => (-32105, "PAUSED"),
            OracleError::NoData => (-32106, "NO_DATA"),
            OracleError::DuplicateInstance(_) => (-32107, "DUPLICATE_INSTANCE"),
            OracleError::SymbolTooLong { .. } => (-32108, "SYMBOL_TOO_LONG"),
            OracleError::NameAlreadyInUse(_) => (-32109, "NAME_ALREADY_IN_USE"),
            OracleError::EmptyName => (-32110, "EMPTY_NAME"),
            OracleError::EmptySymbol => (-32111, "EMPTY_SYMBOL"),
            OracleError::OracleNotFound(_) => (-32112, "ORACLE_NOT_FOUND"),
            OracleError::NotAuthorizedToPause(_) => (-32113, "NOT_AUTHORIZED_TO_PAUSE"),
            OracleError::AlreadyPaused => (-32114, "ALREADY_PAUSED"),
            OracleError::NotPaused => (-32115, "NOT_PAUSED"),
            OracleError::UpgradeCycle { .. } => (-32116, "UPGRADE_CYCLE"),
        };
        Self {
            code,
            message: message.to_string(),
            data: Some(serde_json::json!({"detail": err.to_string()})),
        }
    }
}

/// The RPC server.
pub struct RpcServer {
    state: Arc<DaemonState>,
    socket_path: PathBuf,
}

impl RpcServer {
    /// Create a new RPC server.
    pub fn new(state: Arc<DaemonState>, socket_path: PathBuf) -> Self {
        Self { state, socket_path }
    }

    /// Run the server, accepting connections.
    pub async fn run(&self) -> anyhow::Result<()> {
        // Remove stale socket file
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        info!("IPC server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let state = self.state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(state, stream).await {
                            warn!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection(
    state: Arc<DaemonState>,
    stream: tokio::net::UnixStream,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    // Responses and notifications share one writer.
    let (out_tx, mut out_rx) = mpsc::channel::<String>(OUTBOUND_BUFFER);
    let writer_task = tokio::spawn(async move {
        while let Some(line) = out_rx.recv().await {
            writer.write_all(line.as_bytes()).await?;
            writer.flush().await?;
        }
        Ok::<(), std::io::Error>(())
    });

    let mut subscriptions: HashMap<String, JoinHandle<()>> = HashMap::new();
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break; // EOF
        }
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<RpcRequest>(&line) {
            Ok(request) if request.method == "subscribe_events" => {
                let id = request.id.clone();
                match serde_json::from_value::<EventFilter>(filter_param(&request.params)) {
                    Ok(filter) => {
                        let receiver = state.event_bus.subscribe();
                        let subscription_id = state.next_subscription_id();
                        // Queue the response before any notification.
                        let response = RpcResponse::success(
                            id,
                            serde_json::json!({"subscription_id": subscription_id}),
                        );
                        if out_tx.send(to_line(&response)?).await.is_err() {
                            break;
                        }
                        debug!(subscription = %subscription_id, "events subscribed");
                        let task = tokio::spawn(forward_events(
                            receiver,
                            filter,
                            out_tx.clone(),
                            subscription_id.clone(),
                        ));
                        subscriptions.insert(subscription_id, task);
                        continue;
                    }
                    Err(e) => RpcResponse::error(id, RpcError::invalid_params(&e.to_string())),
                }
            }
            Ok(request) if request.method == "unsubscribe_events" => {
                let id = request.id.clone();
                match request.params.get("subscription_id").and_then(|v| v.as_str()) {
                    Some(sub) => match subscriptions.remove(sub) {
                        Some(task) => {
                            task.abort();
                            RpcResponse::success(id, serde_json::json!({"unsubscribed": true}))
                        }
                        None => RpcResponse::error(id, RpcError::unknown_subscription(sub)),
                    },
                    None => RpcResponse::error(
                        id,
                        RpcError::invalid_params("subscription_id required"),
                    ),
                }
            }
            Ok(request) => dispatch_request(state.clone(), request).await,
            Err(_) => RpcResponse::error(Value::Null, RpcError::parse_error()),
        };

        if out_tx.send(to_line(&response)?).await.is_err() {
            break;
        }
    }

    for (_, task) in subscriptions.drain() {
        task.abort();
    }
    drop(out_tx);
    writer_task.await??;
    Ok(())
}

/// `params.filter`, or an empty filter.
fn filter_param(params: &Value) -> Value {
    match params.get("filter") {
        Some(filter) if !filter.is_null() => filter.clone(),
        _ => serde_json::json!({}),
    }
}

/// Forward matching bus events to one connection until either side closes.
async fn forward_events(
    mut receiver: broadcast::Receiver<Event>,
    filter: EventFilter,
    out: mpsc::Sender<String>,
    subscription_id: String,
) {
    loop {
        match receiver.recv().await {
            Ok(event) => {
                if !filter.matches(&event) {
                    continue;
                }
                let notification = RpcNotification::event(&subscription_id, &event);
                match to_line(&notification) {
                    Ok(line) => {
                        if out.send(line).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(subscription = %subscription_id, "event not encoded: {}", e),
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(subscription = %subscription_id, skipped, "subscriber lagging, events dropped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn to_line<T: Serialize>(message: &T) -> serde_json::Result<String> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}

/// Dispatch a JSON-RPC request to the appropriate command handler.
pub async fn dispatch_request(state: Arc<DaemonState>, request: RpcRequest) -> RpcResponse {
    let id = request.id.clone();
    if request.jsonrpc != "2.0" {
        return RpcResponse::error(id, RpcError::invalid_request());
    }
    let method = request.method.as_str();
    let params = &request.params;

    debug!("Dispatching RPC method: {}", method);

    let result = match method {
        // Oracles
        "create_oracle" => commands::oracles::create_oracle(&state, params).await,
        "get_oracle" => commands::oracles::get_oracle(&state, params).await,
        "list_oracles" => commands::oracles::list_oracles(&state).await,
        "read_sample" => commands::oracles::read_sample(&state, params).await,
        "set_name" => commands::oracles::set_name(&state, params).await,
        "set_maintainer" => commands::oracles::set_maintainer(&state, params).await,
        "set_upgrade" => commands::oracles::set_upgrade(&state, params).await,

        // Providers
        "add_provider" => commands::providers::add_provider(&state, params).await,
        "remove_provider" => commands::providers::remove_provider(&state, params).await,
        "rename_provider" => commands::providers::rename_provider(&state, params).await,
        "list_providers" => commands::providers::list_providers(&state, params).await,
        "provide" => commands::providers::provide(&state, params).await,
        "provide_many" => commands::providers::provide_many(&state, params).await,

        // Pausing and ownership
        "pause_oracle" => commands::admin::pause_oracle(&state, params).await,
        "start_oracle" => commands::admin::start_oracle(&state, params).await,
        "set_oracle_pauser" => commands::admin::set_oracle_pauser(&state, params).await,
        "pause_all" => commands::admin::pause_all(&state, params).await,
        "start_all" => commands::admin::start_all(&state, params).await,
        "set_global_pauser" => commands::admin::set_global_pauser(&state, params).await,
        "transfer_ownership" => commands::admin::transfer_ownership(&state, params).await,

        // Diagnostics
        "get_daemon_status" => commands::diagnostics::get_daemon_status(&state).await,
        "shutdown" => commands::diagnostics::shutdown(&state, params).await,

        _ => Err(RpcError::method_not_found(method)),
    };

    match result {
        Ok(value) => RpcResponse::success(id, value),
        Err(err) => RpcResponse::error(id, err),
    }
}
