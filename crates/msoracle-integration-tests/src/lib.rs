//! Integration test crate for msoracle.
//!
//! The library only holds fixtures shared by the scenario tests under
//! `tests/`, which drive the directory end to end without a running
//! daemon.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p msoracle-integration-tests
//! ```

use msoracle_core::{NewOracle, OracleDirectory, Result};
use msoracle_types::{Address, OracleId, Rate, Sample};

/// Owner of every fixture directory.
pub const OWNER: Address = Address::from_low_u8(0xee);

/// Test identity number `n`.
pub fn account(n: u8) -> Address {
    Address::from_low_u8(n)
}

/// Creation parameters with the name derived from the symbol.
pub fn new_oracle(symbol: &str) -> NewOracle {
    NewOracle {
        symbol: symbol.to_string(),
        name: format!("{symbol} oracle"),
        decimals: 18,
        token: account(0xaa),
        maintainer: "integration tests".to_string(),
    }
}

/// A directory holding one oracle whose providers are `account(1..=n)`.
pub struct Fixture {
    pub directory: OracleDirectory,
    pub oracle: OracleId,
}

impl Fixture {
    pub fn with_providers(n: u8) -> Result<Self> {
        let mut directory = OracleDirectory::new(OWNER);
        let oracle = directory.create_oracle(OWNER, new_oracle("TEST-ORACLE"))?;
        for i in 1..=n {
            directory.add_provider(OWNER, oracle, account(i), format!("provider {i}"))?;
        }
        Ok(Self { directory, oracle })
    }

    /// Submit `value` from provider `account(provider)`.
    pub fn provide(&mut self, provider: u8, value: Rate) -> Result<()> {
        self.directory.provide(account(provider), self.oracle, value)
    }

    /// Submit `values[i]` from `account(i + 1)`, in slice order.
    pub fn provide_in_order(&mut self, values: &[Rate]) -> Result<()> {
        for (i, value) in (1u8..).zip(values) {
            self.provide(i, *value)?;
        }
        Ok(())
    }

    pub fn sample(&self) -> Result<Sample> {
        self.directory.read_sample(self.oracle)
    }

    pub fn remove(&mut self, provider: u8) -> Result<()> {
        self.directory
            .remove_provider(OWNER, self.oracle, account(provider))
    }
}

/// Every ordering of `items` (Heap's algorithm).
pub fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    fn heap<T: Clone>(k: usize, items: &mut Vec<T>, out: &mut Vec<Vec<T>>) {
        if k <= 1 {
            out.push(items.clone());
            return;
        }
        heap(k - 1, items, out);
        for i in 0..k - 1 {
            if k % 2 == 0 {
                items.swap(i, k - 1);
            } else {
                items.swap(0, k - 1);
            }
            heap(k - 1, items, out);
        }
    }

    let mut items = items.to_vec();
    let mut out = Vec::new();
    heap(items.len(), &mut items, &mut out);
    out
}
