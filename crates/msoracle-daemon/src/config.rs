//! Configuration file management.
//!
//! The daemon reads one TOML file. Every section and field is optional; a
//! missing file yields the defaults.

use std::path::{Path, PathBuf};

use msoracle_core::{NewOracle, OracleDirectory, OracleError};
use msoracle_types::Address;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Process settings.
    #[serde(default)]
    pub daemon: DaemonSection,
    /// Initial directory state.
    #[serde(default)]
    pub directory: DirectoryConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Process configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonSection {
    /// Data directory. Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
    /// JSON-RPC socket path. Empty = `$data_dir/msoracle.sock`.
    #[serde(default)]
    pub socket_path: String,
    /// Per-subscriber event buffer.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

/// Directory bootstrap configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Owner of the directory and every oracle in it.
    #[serde(default)]
    pub owner: Address,
    /// Identities allowed to pause every oracle at once.
    #[serde(default)]
    pub global_pausers: Vec<Address>,
    /// Oracles created at startup.
    #[serde(default)]
    pub oracles: Vec<BootstrapOracle>,
}

/// An oracle created at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapOracle {
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub decimals: u8,
    #[serde(default)]
    pub token: Address,
    #[serde(default)]
    pub maintainer: String,
    #[serde(default)]
    pub providers: Vec<BootstrapProvider>,
}

/// A provider added at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapProvider {
    pub address: Address,
    #[serde(default)]
    pub name: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace" | "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Failure to build the configured directory.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("global pauser {pauser}: {source}")]
    GlobalPauser {
        pauser: Address,
        #[source]
        source: OracleError,
    },

    #[error("oracle {symbol}: {source}")]
    Oracle {
        symbol: String,
        #[source]
        source: OracleError,
    },
}

// Default value functions

fn default_event_buffer() -> usize {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DaemonSection {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            socket_path: String::new(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from the resolved config file location.
    ///
    /// Falls back to defaults if the file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: DaemonConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        if self.daemon.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.daemon.data_dir)
        }
    }

    /// Get the JSON-RPC socket path.
    pub fn socket_path(&self) -> PathBuf {
        if self.daemon.socket_path.is_empty() {
            self.data_dir().join("msoracle.sock")
        } else {
            PathBuf::from(&self.daemon.socket_path)
        }
    }

    /// Default `EnvFilter` directive for this crate family.
    pub fn log_directive(&self) -> String {
        format!("msoracle={}", self.logging.log_level)
    }

    /// Get the config file path.
    fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("MSORACLE_CONFIG") {
            return PathBuf::from(path);
        }
        Self::default_data_dir().join("config.toml")
    }

    /// Platform-specific default data directory.
    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("MSORACLE_DATA_DIR") {
            return PathBuf::from(dir);
        }
        #[cfg(target_os = "macos")]
        {
            dirs_fallback("Library/Application Support/msoracle")
        }
        #[cfg(not(target_os = "macos"))]
        {
            dirs_fallback(".msoracle")
        }
    }
}

impl DirectoryConfig {
    /// Build the directory described by this section.
    ///
    /// Events recorded while bootstrapping are discarded.
    pub fn bootstrap(&self) -> Result<OracleDirectory, BootstrapError> {
        let owner = self.owner;
        let mut directory = OracleDirectory::new(owner);

        for pauser in &self.global_pausers {
            directory
                .set_global_pauser(owner, *pauser, true)
                .map_err(|source| BootstrapError::GlobalPauser {
                    pauser: *pauser,
                    source,
                })?;
        }

        for oracle in &self.oracles {
            let wrap = |source| BootstrapError::Oracle {
                symbol: oracle.symbol.clone(),
                source,
            };
            let id = directory
                .create_oracle(
                    owner,
                    NewOracle {
                        symbol: oracle.symbol.clone(),
                        name: oracle.name.clone(),
                        decimals: oracle.decimals,
                        token: oracle.token,
                        maintainer: oracle.maintainer.clone(),
                    },
                )
                .map_err(wrap)?;
            for provider in &oracle.providers {
                directory
                    .add_provider(owner, id, provider.address, provider.name.clone())
                    .map_err(wrap)?;
            }
        }

        let discarded = directory.drain_events().len();
        info!(
            oracles = directory.len(),
            events = discarded,
            "directory bootstrapped"
        );
        Ok(directory)
    }
}

/// Fallback home directory resolution.
fn dirs_fallback(subpath: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(subpath))
        .unwrap_or_else(|_| PathBuf::from("/tmp/msoracle"))
}
