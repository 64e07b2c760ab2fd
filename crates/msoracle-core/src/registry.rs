//! Provider lifecycle on a single oracle instance.
//!
//! ```text
//! Absent --add_provider--> Added --provide(v)--> Active(v) --provide(v')--> Active(v')
//!   ^                        |                      |
//!   +------remove_provider---+----------------------+
//! ```
//!
//! Only `Active` providers contribute to the sample. Every operation checks
//! all of its preconditions before touching state.

use std::collections::BTreeMap;

use msoracle_types::{Address, OracleId, OracleMetadata, ProviderInfo, Rate, Sample};
use tracing::{debug, info};

use crate::access::CallContext;
use crate::entries::{check_value, OrderedEntries, OrderedValues};
use crate::median::compute_sample;
use crate::pause::{PauseGate, Pausable};
use crate::{OracleError, Result};

/// One oracle feed: its providers, their rates, its gate and metadata.
#[derive(Debug, Clone)]
pub struct MultiSourceOracle {
    id: OracleId,
    metadata: OracleMetadata,
    /// Added providers and their display names.
    providers: BTreeMap<Address, String>,
    /// Rates of providers that have submitted at least once.
    entries: OrderedEntries,
    gate: Pausable,
    upgrade: Option<OracleId>,
}

impl MultiSourceOracle {
    /// Create an oracle with no providers, open gate and no successor.
    pub fn new(id: OracleId, metadata: OracleMetadata) -> Self {
        Self {
            id,
            metadata,
            providers: BTreeMap::new(),
            entries: OrderedEntries::new(),
            gate: Pausable::new(),
            upgrade: None,
        }
    }

    pub fn id(&self) -> OracleId {
        self.id
    }

    pub fn metadata(&self) -> &OracleMetadata {
        &self.metadata
    }

    /// Successor that reads are forwarded to, if set.
    pub fn upgrade(&self) -> Option<OracleId> {
        self.upgrade
    }

    /// This oracle's own gate (the global gate is not included).
    pub fn gate(&self) -> &Pausable {
        &self.gate
    }

    /// Whether this oracle's gate or the global gate is closed.
    pub fn is_paused(&self, global: &dyn PauseGate) -> bool {
        self.gate.is_paused() || global.is_paused()
    }

    /// Whether `provider` has been added.
    pub fn is_provider(&self, provider: &Address) -> bool {
        self.providers.contains_key(provider)
    }

    /// Number of added providers, valued or not.
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Register `provider` with no rate.
    ///
    /// # Errors
    ///
    /// - [`OracleError::UnauthorizedCaller`] if the caller is not an admin
    /// - [`OracleError::Paused`] if the oracle is paused
    /// - [`OracleError::DuplicateProvider`] if `provider` is already added
    pub fn add_provider(
        &mut self,
        ctx: &CallContext<'_>,
        provider: Address,
        name: String,
    ) -> Result<()> {
        ctx.ensure_admin()?;
        self.ensure_open(ctx.global_gate())?;
        if self.is_provider(&provider) {
            return Err(OracleError::DuplicateProvider(provider));
        }

        info!(oracle = %self.id, %provider, %name, "provider added");
        self.providers.insert(provider, name);
        Ok(())
    }

    /// Deregister `provider` and drop its rate, returning the dropped rate.
    ///
    /// # Errors
    ///
    /// - [`OracleError::UnauthorizedCaller`] if the caller is not an admin
    /// - [`OracleError::Paused`] if the oracle is paused
    /// - [`OracleError::ProviderNotFound`] if `provider` was never added
    pub fn remove_provider(
        &mut self,
        ctx: &CallContext<'_>,
        provider: &Address,
    ) -> Result<Option<Rate>> {
        ctx.ensure_admin()?;
        self.ensure_open(ctx.global_gate())?;
        if !self.is_provider(provider) {
            return Err(OracleError::ProviderNotFound(*provider));
        }

        let dropped = if self.entries.contains(provider) {
            Some(self.entries.remove(provider)?)
        } else {
            None
        };
        self.providers.remove(provider);
        info!(oracle = %self.id, %provider, ?dropped, "provider removed");
        Ok(dropped)
    }

    /// Change the display name of `provider`.
    ///
    /// # Errors
    ///
    /// - [`OracleError::UnauthorizedCaller`] if the caller is not an admin
    /// - [`OracleError::ProviderNotFound`] if `provider` was never added
    pub fn rename_provider(
        &mut self,
        ctx: &CallContext<'_>,
        provider: &Address,
        name: String,
    ) -> Result<()> {
        ctx.ensure_admin()?;
        let slot = self
            .providers
            .get_mut(provider)
            .ok_or(OracleError::ProviderNotFound(*provider))?;
        debug!(oracle = %self.id, %provider, %name, "provider renamed");
        *slot = name;
        Ok(())
    }

    /// Validate a submission by the caller without applying it.
    ///
    /// # Errors
    ///
    /// - [`OracleError::Paused`] if the oracle is paused
    /// - [`OracleError::UnauthorizedCaller`] if the caller is not an added provider
    /// - [`OracleError::ZeroValue`] / [`OracleError::ValueOverflow`] for an out-of-range rate
    pub fn check_provide(&self, ctx: &CallContext<'_>, value: Rate) -> Result<()> {
        self.ensure_open(ctx.global_gate())?;
        if !self.is_provider(&ctx.caller) {
            return Err(OracleError::UnauthorizedCaller(ctx.caller));
        }
        check_value(value)
    }

    /// Set or replace the caller's rate.
    ///
    /// # Errors
    ///
    /// Same as [`check_provide`](Self::check_provide).
    pub fn provide(&mut self, ctx: &CallContext<'_>, value: Rate) -> Result<()> {
        self.check_provide(ctx, value)?;
        self.apply_provide(ctx.caller, value)
    }

    /// Write a rate whose submission already passed [`check_provide`](Self::check_provide).
    pub(crate) fn apply_provide(&mut self, provider: Address, value: Rate) -> Result<()> {
        if self.entries.contains(&provider) {
            let previous = self.entries.reposition(&provider, value)?;
            debug!(oracle = %self.id, %provider, value, previous, "rate updated");
        } else {
            self.entries.insert(provider, value)?;
            debug!(oracle = %self.id, %provider, value, "first rate submitted");
        }
        Ok(())
    }

    /// Compute the sample from this oracle's own rates.
    ///
    /// Upgrade forwarding is resolved by the directory, not here.
    ///
    /// # Errors
    ///
    /// - [`OracleError::Paused`] if the oracle is paused
    /// - [`OracleError::NoData`] if no provider has submitted a rate
    pub fn read_sample(&self, global: &dyn PauseGate) -> Result<Sample> {
        self.ensure_open(global)?;
        compute_sample(self.entries.ordered_values())
    }

    /// Current rates in ascending order.
    pub fn ordered_values(&self) -> OrderedValues<'_> {
        self.entries.ordered_values()
    }

    /// Added providers: valued ones ascending by rate, then silent ones by address.
    pub fn providers(&self) -> Vec<ProviderInfo> {
        let name_of = |addr: &Address| self.providers.get(addr).cloned().unwrap_or_default();

        let mut out: Vec<ProviderInfo> = self
            .entries
            .iter()
            .map(|entry| ProviderInfo {
                address: entry.provider,
                name: name_of(&entry.provider),
                value: Some(entry.value),
            })
            .collect();
        out.extend(
            self.providers
                .iter()
                .filter(|(addr, _)| !self.entries.contains(addr))
                .map(|(addr, name)| ProviderInfo {
                    address: *addr,
                    name: name.clone(),
                    value: None,
                }),
        );
        out
    }

    pub(crate) fn gate_mut(&mut self) -> &mut Pausable {
        &mut self.gate
    }

    pub(crate) fn set_upgrade(&mut self, successor: Option<OracleId>) {
        self.upgrade = successor;
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.metadata.name = name;
    }

    pub(crate) fn set_maintainer(&mut self, maintainer: String) {
        self.metadata.maintainer = maintainer;
    }

    fn ensure_open(&self, global: &dyn PauseGate) -> Result<()> {
        if self.is_paused(global) {
            Err(OracleError::Paused)
        } else {
            Ok(())
        }
    }
}
