//! Oracle directory.
//!
//! Creates oracle instances under globally unique symbols and names, holds
//! their metadata, and is the only admin of every instance it created: all
//! admin calls are relayed through it. It also owns the global pause gate,
//! resolves upgrade chains on reads, and applies batch submissions.
//!
//! Every method validates completely before its first write, so a failed
//! call changes nothing and records no event.

use std::collections::{BTreeMap, HashMap};

use msoracle_types::events::OracleEvent;
use msoracle_types::{
    Address, OracleId, OracleMetadata, ProvideRequest, ProviderInfo, Rate, Sample, MAX_SYMBOL_LEN,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::access::{CallContext, Ownership};
use crate::pause::{PauseGate, Pausable};
use crate::registry::MultiSourceOracle;
use crate::{OracleError, Result};

/// Parameters for [`OracleDirectory::create_oracle`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOracle {
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub decimals: u8,
    #[serde(default)]
    pub token: Address,
    #[serde(default)]
    pub maintainer: String,
}

/// Factory and relay for oracle instances.
#[derive(Debug, Clone)]
pub struct OracleDirectory {
    ownership: Ownership,
    gate: Pausable,
    oracles: BTreeMap<OracleId, MultiSourceOracle>,
    symbols: HashMap<String, OracleId>,
    names: HashMap<String, OracleId>,
    next_id: u64,
    events: Vec<OracleEvent>,
}

impl OracleDirectory {
    /// Create an empty, unpaused directory owned by `creator`.
    pub fn new(creator: Address) -> Self {
        Self {
            ownership: Ownership::new(creator),
            gate: Pausable::new(),
            oracles: BTreeMap::new(),
            symbols: HashMap::new(),
            names: HashMap::new(),
            next_id: 1,
            events: Vec::new(),
        }
    }

    pub fn owner(&self) -> Address {
        self.ownership.owner()
    }

    /// Fail with [`OracleError::UnauthorizedCaller`] unless `caller` owns the directory.
    pub fn ensure_owner(&self, caller: &Address) -> Result<()> {
        self.ownership.ensure_owner(caller)
    }

    /// The global gate.
    pub fn gate(&self) -> &Pausable {
        &self.gate
    }

    /// Number of oracles created.
    pub fn len(&self) -> usize {
        self.oracles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.oracles.is_empty()
    }

    /// Look up an oracle.
    ///
    /// # Errors
    ///
    /// - [`OracleError::OracleNotFound`] if `id` does not exist
    pub fn oracle(&self, id: OracleId) -> Result<&MultiSourceOracle> {
        self.oracles.get(&id).ok_or(OracleError::OracleNotFound(id))
    }

    /// All oracles in creation order.
    pub fn oracles(&self) -> impl Iterator<Item = &MultiSourceOracle> {
        self.oracles.values()
    }

    pub fn find_by_symbol(&self, symbol: &str) -> Option<OracleId> {
        self.symbols.get(symbol).copied()
    }

    pub fn find_by_name(&self, name: &str) -> Option<OracleId> {
        self.names.get(name).copied()
    }

    /// Metadata of an oracle.
    pub fn metadata(&self, id: OracleId) -> Result<&OracleMetadata> {
        Ok(self.oracle(id)?.metadata())
    }

    /// Added providers of an oracle.
    pub fn providers(&self, id: OracleId) -> Result<Vec<ProviderInfo>> {
        Ok(self.oracle(id)?.providers())
    }

    /// Whether an oracle is closed by its own gate or the global gate.
    pub fn is_oracle_paused(&self, id: OracleId) -> Result<bool> {
        Ok(self.oracle(id)?.is_paused(&self.gate))
    }

    /// Take all events recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<OracleEvent> {
        std::mem::take(&mut self.events)
    }

    /// Create a new oracle instance.
    ///
    /// # Errors
    ///
    /// - [`OracleError::UnauthorizedCaller`] if `caller` is not the owner
    /// - [`OracleError::EmptySymbol`] / [`OracleError::SymbolTooLong`] for an invalid symbol
    /// - [`OracleError::DuplicateInstance`] if the symbol is taken
    /// - [`OracleError::EmptyName`] / [`OracleError::NameAlreadyInUse`] for an invalid name
    pub fn create_oracle(&mut self, caller: Address, params: NewOracle) -> Result<OracleId> {
        self.ownership.ensure_owner(&caller)?;
        check_symbol(&params.symbol)?;
        if self.symbols.contains_key(&params.symbol) {
            return Err(OracleError::DuplicateInstance(params.symbol));
        }
        self.check_name_available(&params.name, None)?;

        let id = OracleId(self.next_id);
        self.next_id += 1;

        let metadata = OracleMetadata {
            symbol: params.symbol,
            name: params.name,
            decimals: params.decimals,
            token: params.token,
            maintainer: params.maintainer,
        };
        info!(oracle = %id, symbol = %metadata.symbol, name = %metadata.name, "oracle created");

        self.symbols.insert(metadata.symbol.clone(), id);
        self.names.insert(metadata.name.clone(), id);
        self.events.push(OracleEvent::OracleCreated {
            oracle: id,
            symbol: metadata.symbol.clone(),
            name: metadata.name.clone(),
        });
        self.oracles.insert(id, MultiSourceOracle::new(id, metadata));
        Ok(id)
    }

    /// Relay `add_provider` to an oracle.
    pub fn add_provider(
        &mut self,
        caller: Address,
        oracle: OracleId,
        provider: Address,
        name: String,
    ) -> Result<()> {
        let (ctx, target) = self.parts(caller, oracle)?;
        target.add_provider(&ctx, provider, name.clone())?;
        self.events.push(OracleEvent::ProviderAdded {
            oracle,
            provider,
            name,
        });
        Ok(())
    }

    /// Relay `remove_provider` to an oracle.
    pub fn remove_provider(
        &mut self,
        caller: Address,
        oracle: OracleId,
        provider: Address,
    ) -> Result<()> {
        let (ctx, target) = self.parts(caller, oracle)?;
        target.remove_provider(&ctx, &provider)?;
        self.events
            .push(OracleEvent::ProviderRemoved { oracle, provider });
        Ok(())
    }

    /// Relay `rename_provider` to an oracle.
    pub fn rename_provider(
        &mut self,
        caller: Address,
        oracle: OracleId,
        provider: Address,
        name: String,
    ) -> Result<()> {
        let (ctx, target) = self.parts(caller, oracle)?;
        target.rename_provider(&ctx, &provider, name.clone())?;
        self.events.push(OracleEvent::ProviderRenamed {
            oracle,
            provider,
            name,
        });
        Ok(())
    }

    /// Submit the caller's rate to one oracle.
    pub fn provide(&mut self, caller: Address, oracle: OracleId, value: Rate) -> Result<()> {
        let (ctx, target) = self.parts(caller, oracle)?;
        target.provide(&ctx, value)?;
        self.events.push(OracleEvent::Provided {
            oracle,
            provider: caller,
            value,
        });
        Ok(())
    }

    /// Submit the caller's rates to several oracles at once.
    ///
    /// Every request is checked before any is applied: if one fails, no
    /// oracle changes. Repeated targets are applied in order.
    ///
    /// # Errors
    ///
    /// The first error of any request, including [`OracleError::OracleNotFound`].
    pub fn provide_many(&mut self, caller: Address, requests: &[ProvideRequest]) -> Result<()> {
        let ctx = CallContext::new(caller, &self.ownership, &self.gate);
        for request in requests {
            self.oracles
                .get(&request.oracle)
                .ok_or(OracleError::OracleNotFound(request.oracle))?
                .check_provide(&ctx, request.value)?;
        }

        for request in requests {
            self.oracles
                .get_mut(&request.oracle)
                .ok_or(OracleError::OracleNotFound(request.oracle))?
                .apply_provide(caller, request.value)?;
        }
        debug!(provider = %caller, count = requests.len(), "batch provided");

        self.events
            .extend(requests.iter().map(|request| OracleEvent::Provided {
                oracle: request.oracle,
                provider: caller,
                value: request.value,
            }));
        Ok(())
    }

    /// Read the sample of an oracle, following its upgrade chain.
    ///
    /// Each oracle on the chain must be open; the sample comes from the
    /// last one.
    ///
    /// # Errors
    ///
    /// - [`OracleError::OracleNotFound`] if `id` does not exist
    /// - [`OracleError::Paused`] if any oracle on the chain is paused
    /// - [`OracleError::NoData`] if the final oracle has no rates
    pub fn read_sample(&self, id: OracleId) -> Result<Sample> {
        let mut current = self.oracle(id)?;
        while let Some(next) = current.upgrade() {
            if current.is_paused(&self.gate) {
                return Err(OracleError::Paused);
            }
            current = self.oracle(next)?;
        }
        current.read_sample(&self.gate)
    }

    /// The oracle a read of `id` is answered by.
    pub fn resolve(&self, id: OracleId) -> Result<OracleId> {
        let mut current = self.oracle(id)?;
        while let Some(next) = current.upgrade() {
            current = self.oracle(next)?;
        }
        Ok(current.id())
    }

    /// Set or clear the successor of an oracle.
    ///
    /// # Errors
    ///
    /// - [`OracleError::UnauthorizedCaller`] if `caller` is not the owner
    /// - [`OracleError::OracleNotFound`] if either oracle does not exist
    /// - [`OracleError::UpgradeCycle`] if the successor's chain leads back to `oracle`
    pub fn set_upgrade(
        &mut self,
        caller: Address,
        oracle: OracleId,
        successor: Option<OracleId>,
    ) -> Result<()> {
        self.ownership.ensure_owner(&caller)?;
        self.oracle(oracle)?;
        if let Some(first) = successor {
            let mut hop = Some(first);
            while let Some(id) = hop {
                if id == oracle {
                    return Err(OracleError::UpgradeCycle {
                        oracle,
                        successor: first,
                    });
                }
                hop = self.oracle(id)?.upgrade();
            }
        }

        if let Some(target) = self.oracles.get_mut(&oracle) {
            target.set_upgrade(successor);
        }
        info!(%oracle, ?successor, "upgrade pointer set");
        self.events
            .push(OracleEvent::Upgraded { oracle, successor });
        Ok(())
    }

    /// Rename an oracle.
    ///
    /// # Errors
    ///
    /// - [`OracleError::UnauthorizedCaller`] if `caller` is not the owner
    /// - [`OracleError::OracleNotFound`] if `oracle` does not exist
    /// - [`OracleError::EmptyName`] / [`OracleError::NameAlreadyInUse`] for an invalid name
    pub fn set_name(&mut self, caller: Address, oracle: OracleId, name: String) -> Result<()> {
        self.ownership.ensure_owner(&caller)?;
        let previous = self.oracle(oracle)?.metadata().name.clone();
        self.check_name_available(&name, Some(oracle))?;

        self.names.remove(&previous);
        self.names.insert(name.clone(), oracle);
        if let Some(target) = self.oracles.get_mut(&oracle) {
            target.set_name(name.clone());
        }
        info!(%oracle, %previous, %name, "oracle renamed");
        self.events.push(OracleEvent::NameUpdated { oracle, name });
        Ok(())
    }

    /// Change the maintainer string of an oracle.
    pub fn set_maintainer(
        &mut self,
        caller: Address,
        oracle: OracleId,
        maintainer: String,
    ) -> Result<()> {
        self.ownership.ensure_owner(&caller)?;
        let target = self
            .oracles
            .get_mut(&oracle)
            .ok_or(OracleError::OracleNotFound(oracle))?;
        target.set_maintainer(maintainer.clone());
        self.events
            .push(OracleEvent::MaintainerUpdated { oracle, maintainer });
        Ok(())
    }

    /// Pause one oracle. Allowed for the owner and the oracle's pausers.
    pub fn pause_oracle(&mut self, caller: Address, oracle: OracleId) -> Result<()> {
        let target = self
            .oracles
            .get_mut(&oracle)
            .ok_or(OracleError::OracleNotFound(oracle))?;
        target.gate_mut().pause(&self.ownership, &caller)?;
        self.events.push(OracleEvent::Paused {
            oracle: Some(oracle),
            by: caller,
        });
        Ok(())
    }

    /// Restart one paused oracle. Owner only.
    pub fn start_oracle(&mut self, caller: Address, oracle: OracleId) -> Result<()> {
        let target = self
            .oracles
            .get_mut(&oracle)
            .ok_or(OracleError::OracleNotFound(oracle))?;
        target.gate_mut().start(&self.ownership, &caller)?;
        self.events.push(OracleEvent::Started {
            oracle: Some(oracle),
            by: caller,
        });
        Ok(())
    }

    /// Grant or revoke the pauser role on one oracle. Owner only.
    pub fn set_oracle_pauser(
        &mut self,
        caller: Address,
        oracle: OracleId,
        pauser: Address,
        enabled: bool,
    ) -> Result<()> {
        let target = self
            .oracles
            .get_mut(&oracle)
            .ok_or(OracleError::OracleNotFound(oracle))?;
        target
            .gate_mut()
            .set_pauser(&self.ownership, &caller, pauser, enabled)?;
        self.events.push(OracleEvent::PauserSet {
            oracle: Some(oracle),
            pauser,
            enabled,
        });
        Ok(())
    }

    /// Pause every oracle at once.
    pub fn pause_all(&mut self, caller: Address) -> Result<()> {
        self.gate.pause(&self.ownership, &caller)?;
        self.events.push(OracleEvent::Paused {
            oracle: None,
            by: caller,
        });
        Ok(())
    }

    /// Lift the global pause. Owner only.
    pub fn start_all(&mut self, caller: Address) -> Result<()> {
        self.gate.start(&self.ownership, &caller)?;
        self.events.push(OracleEvent::Started {
            oracle: None,
            by: caller,
        });
        Ok(())
    }

    /// Grant or revoke the global pauser role. Owner only.
    pub fn set_global_pauser(
        &mut self,
        caller: Address,
        pauser: Address,
        enabled: bool,
    ) -> Result<()> {
        self.gate
            .set_pauser(&self.ownership, &caller, pauser, enabled)?;
        self.events.push(OracleEvent::PauserSet {
            oracle: None,
            pauser,
            enabled,
        });
        Ok(())
    }

    /// Hand the directory, and with it every oracle, to a new owner.
    pub fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> Result<()> {
        let previous = self.ownership.transfer(&caller, new_owner)?;
        self.events.push(OracleEvent::OwnershipTransferred {
            previous,
            owner: new_owner,
        });
        Ok(())
    }

    /// Split borrows: a call context over the directory's access control
    /// and global gate, plus the target oracle.
    fn parts(
        &mut self,
        caller: Address,
        oracle: OracleId,
    ) -> Result<(CallContext<'_>, &mut MultiSourceOracle)> {
        let target = self
            .oracles
            .get_mut(&oracle)
            .ok_or(OracleError::OracleNotFound(oracle))?;
        let ctx = CallContext::new(caller, &self.ownership, &self.gate);
        Ok((ctx, target))
    }

    fn check_name_available(&self, name: &str, renaming: Option<OracleId>) -> Result<()> {
        if name.is_empty() {
            return Err(OracleError::EmptyName);
        }
        match self.names.get(name) {
            Some(holder) if Some(*holder) != renaming => {
                Err(OracleError::NameAlreadyInUse(name.to_string()))
            }
            _ => Ok(()),
        }
    }
}

fn check_symbol(symbol: &str) -> Result<()> {
    if symbol.is_empty() {
        return Err(OracleError::EmptySymbol);
    }
    if symbol.len() > MAX_SYMBOL_LEN {
        return Err(OracleError::SymbolTooLong {
            len: symbol.len(),
            max: MAX_SYMBOL_LEN,
        });
    }
    Ok(())
}

impl PauseGate for OracleDirectory {
    fn is_paused(&self) -> bool {
        self.gate.is_paused()
    }
}
