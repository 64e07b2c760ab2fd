//! Events recorded for every successful state change.
//!
//! Failed calls record nothing. The daemon forwards drained events to its
//! subscribers as JSON notifications.

use serde::{Deserialize, Serialize};

use crate::oracle::rate_serde;
use crate::{Address, OracleId, Rate};

/// A state change in a directory or one of its oracles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum OracleEvent {
    OracleCreated {
        oracle: OracleId,
        symbol: String,
        name: String,
    },
    ProviderAdded {
        oracle: OracleId,
        provider: Address,
        name: String,
    },
    ProviderRemoved {
        oracle: OracleId,
        provider: Address,
    },
    ProviderRenamed {
        oracle: OracleId,
        provider: Address,
        name: String,
    },
    Provided {
        oracle: OracleId,
        provider: Address,
        #[serde(with = "rate_serde")]
        value: Rate,
    },
    NameUpdated {
        oracle: OracleId,
        name: String,
    },
    MaintainerUpdated {
        oracle: OracleId,
        maintainer: String,
    },
    /// `successor == None` clears the upgrade pointer.
    Upgraded {
        oracle: OracleId,
        successor: Option<OracleId>,
    },
    /// `oracle == None` refers to the global gate.
    Paused {
        oracle: Option<OracleId>,
        by: Address,
    },
    Started {
        oracle: Option<OracleId>,
        by: Address,
    },
    PauserSet {
        oracle: Option<OracleId>,
        pauser: Address,
        enabled: bool,
    },
    OwnershipTransferred {
        previous: Address,
        owner: Address,
    },
}

impl OracleEvent {
    /// The oracle the event concerns, if any.
    pub fn oracle(&self) -> Option<OracleId> {
        match self {
            OracleEvent::OracleCreated { oracle, .. }
            | OracleEvent::ProviderAdded { oracle, .. }
            | OracleEvent::ProviderRemoved { oracle, .. }
            | OracleEvent::ProviderRenamed { oracle, .. }
            | OracleEvent::Provided { oracle, .. }
            | OracleEvent::NameUpdated { oracle, .. }
            | OracleEvent::MaintainerUpdated { oracle, .. }
            | OracleEvent::Upgraded { oracle, .. } => Some(*oracle),
            OracleEvent::Paused { oracle, .. }
            | OracleEvent::Started { oracle, .. }
            | OracleEvent::PauserSet { oracle, .. } => *oracle,
            OracleEvent::OwnershipTransferred { .. } => None,
        }
    }

    /// Snake-case name of the variant, matching the serialized `event_type`.
    pub fn event_type(&self) -> &'static str {
        match self {
            OracleEvent::OracleCreated { .. } => "oracle_created",
            OracleEvent::ProviderAdded { .. } => "provider_added",
            OracleEvent::ProviderRemoved { .. } => "provider_removed",
            OracleEvent::ProviderRenamed { .. } => "provider_renamed",
            OracleEvent::Provided { .. } => "provided",
            OracleEvent::NameUpdated { .. } => "name_updated",
            OracleEvent::MaintainerUpdated { .. } => "maintainer_updated",
            OracleEvent::Upgraded { .. } => "upgraded",
            OracleEvent::Paused { .. } => "paused",
            OracleEvent::Started { .. } => "started",
            OracleEvent::PauserSet { .. } => "pauser_set",
            OracleEvent::OwnershipTransferred { .. } => "ownership_transferred",
        }
    }
}
