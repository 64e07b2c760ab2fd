//! Pause gates.
//!
//! Each oracle carries its own [`Pausable`] gate and the directory carries a
//! global one. An oracle is closed when either gate is paused; a closed
//! oracle rejects both reads and writes.
//!
//! The owner and any delegated pauser may pause a gate. Only the owner may
//! start it again.

use std::collections::BTreeSet;

use msoracle_types::Address;

use crate::access::AccessControl;
use crate::{OracleError, Result};

/// A boolean switch consulted before reads and writes.
pub trait PauseGate {
    /// Whether the gate is closed.
    fn is_paused(&self) -> bool;
}

/// Pause switch with delegated pausers.
#[derive(Debug, Clone, Default)]
pub struct Pausable {
    paused: bool,
    pausers: BTreeSet<Address>,
}

impl Pausable {
    /// Create an open gate with no delegated pausers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `who` may pause this gate.
    pub fn can_pause(&self, access: &dyn AccessControl, who: &Address) -> bool {
        access.is_authorized_admin(who) || self.pausers.contains(who)
    }

    /// Close the gate.
    ///
    /// # Errors
    ///
    /// - [`OracleError::NotAuthorizedToPause`] if `caller` is neither owner nor pauser
    /// - [`OracleError::AlreadyPaused`] if the gate is already closed
    pub fn pause(&mut self, access: &dyn AccessControl, caller: &Address) -> Result<()> {
        if !self.can_pause(access, caller) {
            return Err(OracleError::NotAuthorizedToPause(*caller));
        }
        if self.paused {
            return Err(OracleError::AlreadyPaused);
        }
        tracing::warn!(by = %caller, "gate paused");
        self.paused = true;
        Ok(())
    }

    /// Reopen the gate.
    ///
    /// # Errors
    ///
    /// - [`OracleError::UnauthorizedCaller`] if `caller` is not the owner
    /// - [`OracleError::NotPaused`] if the gate is open
    pub fn start(&mut self, access: &dyn AccessControl, caller: &Address) -> Result<()> {
        if !access.is_authorized_admin(caller) {
            return Err(OracleError::UnauthorizedCaller(*caller));
        }
        if !self.paused {
            return Err(OracleError::NotPaused);
        }
        tracing::info!(by = %caller, "gate started");
        self.paused = false;
        Ok(())
    }

    /// Grant or revoke the pauser role.
    ///
    /// # Errors
    ///
    /// - [`OracleError::UnauthorizedCaller`] if `caller` is not the owner
    pub fn set_pauser(
        &mut self,
        access: &dyn AccessControl,
        caller: &Address,
        pauser: Address,
        enabled: bool,
    ) -> Result<()> {
        if !access.is_authorized_admin(caller) {
            return Err(OracleError::UnauthorizedCaller(*caller));
        }
        if enabled {
            self.pausers.insert(pauser);
        } else {
            self.pausers.remove(&pauser);
        }
        tracing::info!(%pauser, enabled, "pauser updated");
        Ok(())
    }

    /// Delegated pausers in address order.
    pub fn pausers(&self) -> impl Iterator<Item = &Address> {
        self.pausers.iter()
    }
}

impl PauseGate for Pausable {
    fn is_paused(&self) -> bool {
        self.paused
    }
}
