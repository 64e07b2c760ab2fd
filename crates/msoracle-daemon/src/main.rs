//! msoracle-daemon: hosts an oracle directory in memory.
//!
//! Single OS process running a Tokio async runtime. Clients talk to the
//! daemon via newline-delimited JSON-RPC 2.0 over a Unix socket.

mod commands;
mod config;
mod events;
mod rpc;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use msoracle_core::OracleDirectory;
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info};

use crate::config::DaemonConfig;
use crate::events::EventBus;
use crate::rpc::RpcServer;

/// Daemon-wide shared state.
pub struct DaemonState {
    /// The hosted directory. Each RPC call holds the lock for its whole
    /// duration, so calls apply one at a time.
    pub directory: Mutex<OracleDirectory>,
    /// Configuration.
    pub config: DaemonConfig,
    /// Event bus for pushing events to subscribers.
    pub event_bus: EventBus,
    /// Unix timestamp of startup.
    pub started_at: u64,
    /// Shutdown signal sender.
    pub shutdown_tx: broadcast::Sender<()>,
    next_subscription: AtomicU64,
}

impl DaemonState {
    pub fn new(config: DaemonConfig, directory: OracleDirectory) -> Self {
        let event_bus = EventBus::new(config.daemon.event_buffer);
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            directory: Mutex::new(directory),
            config,
            event_bus,
            started_at: events::unix_now(),
            shutdown_tx,
            next_subscription: AtomicU64::new(1),
        }
    }

    /// Allocate a subscription handle, unique for the process lifetime.
    pub fn next_subscription_id(&self) -> String {
        let n = self.next_subscription.fetch_add(1, Ordering::SeqCst);
        hex::encode(n.to_be_bytes())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = DaemonConfig::load()?;

    // 2. Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_directive().parse()?),
        )
        .init();

    info!("msoracle daemon starting");

    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;

    // 3. Build the directory
    let directory = config.directory.bootstrap()?;
    info!(owner = %directory.owner(), oracles = directory.len(), "directory ready");

    // 4. Build daemon state
    let socket_path = config.socket_path();
    let state = Arc::new(DaemonState::new(config, directory));

    // 5. Start IPC server
    let rpc_server = RpcServer::new(state.clone(), socket_path.clone());
    info!("Starting JSON-RPC server on {:?}", socket_path);

    // 6. Run the RPC server until shutdown
    let mut shutdown_rx = state.shutdown_tx.subscribe();
    tokio::select! {
        result = rpc_server.run() => {
            if let Err(e) = result {
                error!("RPC server error: {}", e);
            }
        }
        _ = shutdown_rx.recv() => {
            info!("Shutdown requested");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    info!("Daemon shutting down gracefully");

    // Clean up socket file
    let _ = std::fs::remove_file(&socket_path);

    info!("Daemon stopped");
    Ok(())
}
