//! # msoracle-core
//!
//! Multi-source rate oracle. A fixed set of permissioned providers each
//! submit one rate; the oracle reports the median of the submitted rates
//! (or the truncated average of the two middle rates for an even count).
//!
//! ## Modules
//!
//! - [`entries`]: Ordered provider-to-rate store (arena + identity index)
//! - [`median`]: Sample computation over the ordered rates
//! - [`registry`]: Provider lifecycle on a single oracle instance
//! - [`access`]: Owner-based admin authorization
//! - [`pause`]: Per-instance and global pause gates
//! - [`directory`]: Instance factory, metadata, relay and batch submission

pub mod access;
pub mod directory;
pub mod entries;
pub mod median;
pub mod pause;
pub mod registry;

use msoracle_types::{Address, OracleId, Rate};

pub use access::{AccessControl, CallContext, Ownership};
pub use directory::{NewOracle, OracleDirectory};
pub use entries::{Entry, OrderedEntries};
pub use median::compute_sample;
pub use pause::{PauseGate, Pausable};
pub use registry::MultiSourceOracle;

/// Error types for oracle operations.
///
/// Every error is detected before any state is written, so a failed call
/// leaves all state exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// The provider is already registered on this oracle.
    #[error("provider {0} already added")]
    DuplicateProvider(Address),

    /// The provider is not registered on this oracle.
    #[error("provider {0} not found")]
    ProviderNotFound(Address),

    /// The caller lacks the required role.
    #[error("caller {0} is not authorized")]
    UnauthorizedCaller(Address),

    /// Provided rate is zero.
    #[error("rate must be greater than zero")]
    ZeroValue,

    /// Provided rate is not below 2^96.
    #[error("rate {0} does not fit in 96 bits")]
    ValueOverflow(Rate),

    /// The oracle or the whole directory is paused.
    #[error("oracle is paused")]
    Paused,

    /// No provider has submitted a rate.
    #[error("no rates submitted")]
    NoData,

    /// An oracle with this symbol already exists.
    #[error("symbol {0:?} already in use")]
    DuplicateInstance(String),

    /// Symbol exceeds the maximum length.
    #[error("symbol is {len} bytes, maximum is {max}")]
    SymbolTooLong {
        /// Length of the rejected symbol in bytes.
        len: usize,
        /// Maximum allowed length in bytes.
        max: usize,
    },

    /// Symbol is empty.
    #[error("symbol must not be empty")]
    EmptySymbol,

    /// Another oracle already uses this name.
    #[error("name {0:?} already in use")]
    NameAlreadyInUse(String),

    /// Name is empty.
    #[error("name must not be empty")]
    EmptyName,

    /// No oracle with this id exists in the directory.
    #[error("{0} not found")]
    OracleNotFound(OracleId),

    /// The caller is neither the owner nor a delegated pauser.
    #[error("{0} is not authorized to pause")]
    NotAuthorizedToPause(Address),

    /// Pause requested on an already paused gate.
    #[error("already paused")]
    AlreadyPaused,

    /// Start requested on a gate that is not paused.
    #[error("not paused")]
    NotPaused,

    /// The requested upgrade pointer would form a cycle.
    #[error("upgrading {oracle} to {successor} would form a cycle")]
    UpgradeCycle {
        /// The oracle being upgraded.
        oracle: OracleId,
        /// The rejected successor.
        successor: OracleId,
    },
}

/// Convenience result type for oracle operations.
pub type Result<T> = std::result::Result<T, OracleError>;
