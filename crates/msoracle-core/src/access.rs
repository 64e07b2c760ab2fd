//! Admin authorization and the per-call context.
//!
//! Every operation receives its caller explicitly through a [`CallContext`],
//! together with the admin check and the global pause gate in force for
//! that call.

use msoracle_types::Address;

use crate::pause::PauseGate;
use crate::{OracleError, Result};

/// Decides which callers may run admin operations.
pub trait AccessControl {
    /// Whether `caller` may run admin operations.
    fn is_authorized_admin(&self, caller: &Address) -> bool;
}

/// Single-owner access control. The owner starts as the creator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ownership {
    owner: Address,
}

impl Ownership {
    /// Create with `creator` as owner.
    pub fn new(creator: Address) -> Self {
        Self { owner: creator }
    }

    /// The current owner.
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Fail with [`OracleError::UnauthorizedCaller`] unless `caller` is the owner.
    pub fn ensure_owner(&self, caller: &Address) -> Result<()> {
        if self.is_authorized_admin(caller) {
            Ok(())
        } else {
            Err(OracleError::UnauthorizedCaller(*caller))
        }
    }

    /// Hand ownership to `new_owner`, returning the previous owner.
    ///
    /// # Errors
    ///
    /// - [`OracleError::UnauthorizedCaller`] if `caller` is not the owner
    pub fn transfer(&mut self, caller: &Address, new_owner: Address) -> Result<Address> {
        self.ensure_owner(caller)?;
        let previous = std::mem::replace(&mut self.owner, new_owner);
        tracing::info!(%previous, owner = %new_owner, "ownership transferred");
        Ok(previous)
    }
}

impl AccessControl for Ownership {
    fn is_authorized_admin(&self, caller: &Address) -> bool {
        *caller == self.owner
    }
}

/// Caller identity plus the collaborators consulted by an operation.
#[derive(Clone, Copy)]
pub struct CallContext<'a> {
    /// The identity making the call.
    pub caller: Address,
    access: &'a dyn AccessControl,
    global_gate: &'a dyn PauseGate,
}

impl<'a> CallContext<'a> {
    /// Bundle a caller with its admin check and global gate.
    pub fn new(
        caller: Address,
        access: &'a dyn AccessControl,
        global_gate: &'a dyn PauseGate,
    ) -> Self {
        Self {
            caller,
            access,
            global_gate,
        }
    }

    /// Fail with [`OracleError::UnauthorizedCaller`] unless the caller is an admin.
    pub fn ensure_admin(&self) -> Result<()> {
        if self.access.is_authorized_admin(&self.caller) {
            Ok(())
        } else {
            Err(OracleError::UnauthorizedCaller(self.caller))
        }
    }

    /// Whether the global gate is closed.
    pub fn globally_paused(&self) -> bool {
        self.global_gate.is_paused()
    }

    /// The global gate in force.
    pub fn global_gate(&self) -> &'a dyn PauseGate {
        self.global_gate
    }

    /// The admin check in force.
    pub fn access(&self) -> &'a dyn AccessControl {
        self.access
    }
}
