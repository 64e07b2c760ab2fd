//! Ordered provider-to-rate store.
//!
//! Entries live in an arena (`Vec<Node>`) and are threaded into a doubly
//! linked list kept ascending by rate. A map from provider to arena slot
//! gives constant-time lookup, so removal never scans.
//!
//! Insertion scans from the lowest rate for the first strictly greater
//! rate and links in front of it. Equal rates therefore keep insertion
//! order. Provider counts are small (tens), so a linear scan is fine.
//!
//! Removal uses `swap_remove` on the arena; the node moved into the freed
//! slot has its neighbours and index entry repointed.

use std::collections::HashMap;

use msoracle_types::{Address, Rate, VALUE_LIMIT};

use crate::{OracleError, Result};

/// A provider and its current rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entry {
    pub provider: Address,
    pub value: Rate,
}

#[derive(Debug, Clone)]
struct Node {
    entry: Entry,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Providers with a submitted rate, ordered ascending by rate.
#[derive(Debug, Clone, Default)]
pub struct OrderedEntries {
    nodes: Vec<Node>,
    index: HashMap<Address, usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

/// Reject rates outside `(0, 2^96)`.
///
/// # Errors
///
/// - [`OracleError::ZeroValue`] if `value == 0`
/// - [`OracleError::ValueOverflow`] if `value >= 2^96`
pub fn check_value(value: Rate) -> Result<()> {
    if value == 0 {
        return Err(OracleError::ZeroValue);
    }
    if value >= VALUE_LIMIT {
        return Err(OracleError::ValueOverflow(value));
    }
    Ok(())
}

impl OrderedEntries {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Whether `provider` has an entry.
    pub fn contains(&self, provider: &Address) -> bool {
        self.index.contains_key(provider)
    }

    /// Current rate of `provider`, if it has an entry.
    pub fn value_of(&self, provider: &Address) -> Option<Rate> {
        self.index.get(provider).map(|&i| self.nodes[i].entry.value)
    }

    /// Insert a new entry after all entries with a rate `<= value`.
    ///
    /// # Errors
    ///
    /// - [`OracleError::ZeroValue`] / [`OracleError::ValueOverflow`] for an out-of-range rate
    /// - [`OracleError::DuplicateProvider`] if `provider` already has an entry
    pub fn insert(&mut self, provider: Address, value: Rate) -> Result<()> {
        check_value(value)?;
        if self.contains(&provider) {
            return Err(OracleError::DuplicateProvider(provider));
        }

        let successor = self.find_successor(value);
        let idx = self.nodes.len();
        self.nodes.push(Node {
            entry: Entry { provider, value },
            prev: None,
            next: None,
        });
        self.link_before(idx, successor);
        self.index.insert(provider, idx);
        Ok(())
    }

    /// Remove the entry of `provider`, returning its rate.
    ///
    /// # Errors
    ///
    /// - [`OracleError::ProviderNotFound`] if `provider` has no entry
    pub fn remove(&mut self, provider: &Address) -> Result<Rate> {
        let idx = self
            .index
            .remove(provider)
            .ok_or(OracleError::ProviderNotFound(*provider))?;
        self.unlink(idx);

        let last = self.nodes.len() - 1;
        let removed = self.nodes.swap_remove(idx);
        if idx != last {
            // The former last node now sits at `idx`.
            let (prev, next, moved) = {
                let node = &self.nodes[idx];
                (node.prev, node.next, node.entry.provider)
            };
            match prev {
                Some(p) => self.nodes[p].next = Some(idx),
                None => self.head = Some(idx),
            }
            match next {
                Some(n) => self.nodes[n].prev = Some(idx),
                None => self.tail = Some(idx),
            }
            self.index.insert(moved, idx);
        }
        Ok(removed.entry.value)
    }

    /// Replace the rate of an existing entry, returning the previous rate.
    ///
    /// If the new rate still lies between the entry's neighbours the entry
    /// keeps its position; otherwise it is relinked as if newly inserted.
    ///
    /// # Errors
    ///
    /// - [`OracleError::ZeroValue`] / [`OracleError::ValueOverflow`] for an out-of-range rate
    /// - [`OracleError::ProviderNotFound`] if `provider` has no entry
    pub fn reposition(&mut self, provider: &Address, value: Rate) -> Result<Rate> {
        check_value(value)?;
        let idx = *self
            .index
            .get(provider)
            .ok_or(OracleError::ProviderNotFound(*provider))?;

        let node = &self.nodes[idx];
        let previous = node.entry.value;
        let fits_prev = node.prev.map_or(true, |p| self.nodes[p].entry.value <= value);
        let fits_next = node.next.map_or(true, |n| value <= self.nodes[n].entry.value);

        self.nodes[idx].entry.value = value;
        if !(fits_prev && fits_next) {
            self.unlink(idx);
            let successor = self.find_successor(value);
            self.link_before(idx, successor);
        }
        Ok(previous)
    }

    /// Entries in ascending rate order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            store: self,
            cursor: self.head,
            remaining: self.len(),
        }
    }

    /// Rates in ascending order. Restartable by cloning.
    pub fn ordered_values(&self) -> OrderedValues<'_> {
        OrderedValues(self.iter())
    }

    /// First linked node with a rate strictly greater than `value`.
    fn find_successor(&self, value: Rate) -> Option<usize> {
        let mut cursor = self.head;
        while let Some(i) = cursor {
            if self.nodes[i].entry.value > value {
                break;
            }
            cursor = self.nodes[i].next;
        }
        cursor
    }

    fn link_before(&mut self, idx: usize, successor: Option<usize>) {
        let prev = match successor {
            Some(s) => self.nodes[s].prev,
            None => self.tail,
        };
        self.nodes[idx].prev = prev;
        self.nodes[idx].next = successor;
        match prev {
            Some(p) => self.nodes[p].next = Some(idx),
            None => self.head = Some(idx),
        }
        match successor {
            Some(s) => self.nodes[s].prev = Some(idx),
            None => self.tail = Some(idx),
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
        self.nodes[idx].prev = None;
        self.nodes[idx].next = None;
    }
}

/// Iterator over entries in ascending rate order.
#[derive(Clone)]
pub struct Iter<'a> {
    store: &'a OrderedEntries,
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Entry;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cursor?;
        let node = &self.store.nodes[idx];
        self.cursor = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some(&node.entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a OrderedEntries {
    type Item = &'a Entry;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over rates in ascending order.
#[derive(Clone)]
pub struct OrderedValues<'a>(Iter<'a>);

impl Iterator for OrderedValues<'_> {
    type Item = Rate;

    fn next(&mut self) -> Option<Rate> {
        self.0.next().map(|entry| entry.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl ExactSizeIterator for OrderedValues<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn addr(n: u8) -> Address {
        Address::from_low_u8(n)
    }

    fn values(store: &OrderedEntries) -> Vec<Rate> {
        store.ordered_values().collect()
    }

    fn providers(store: &OrderedEntries) -> Vec<Address> {
        store.iter().map(|e| e.provider).collect()
    }

    /// Walk the list both ways and check it against the index.
    fn assert_consistent(store: &OrderedEntries) {
        assert_eq!(store.nodes.len(), store.index.len());

        let forward: Vec<usize> = {
            let mut out = Vec::new();
            let mut cursor = store.head;
            while let Some(i) = cursor {
                out.push(i);
                cursor = store.nodes[i].next;
            }
            out
        };
        let mut backward: Vec<usize> = {
            let mut out = Vec::new();
            let mut cursor = store.tail;
            while let Some(i) = cursor {
                out.push(i);
                cursor = store.nodes[i].prev;
            }
            out
        };
        backward.reverse();
        assert_eq!(forward, backward);
        assert_eq!(forward.len(), store.len());

        for (provider, &i) in &store.index {
            assert_eq!(store.nodes[i].entry.provider, *provider);
        }
        let vals = values(store);
        assert!(vals.windows(2).all(|w| w[0] <= w[1]), "not ascending: {vals:?}");
    }

    #[test]
    fn test_insert_keeps_ascending_order() {
        let mut store = OrderedEntries::new();
        store.insert(addr(1), 300).expect("insert");
        store.insert(addr(2), 100).expect("insert");
        store.insert(addr(3), 200).expect("insert");
        assert_eq!(values(&store), vec![100, 200, 300]);
        assert_eq!(providers(&store), vec![addr(2), addr(3), addr(1)]);
        assert_consistent(&store);
    }

    #[test]
    fn test_equal_values_keep_insertion_order() {
        let mut store = OrderedEntries::new();
        store.insert(addr(1), 500).expect("insert");
        store.insert(addr(2), 500).expect("insert");
        store.insert(addr(3), 100).expect("insert");
        store.insert(addr(4), 500).expect("insert");
        assert_eq!(providers(&store), vec![addr(3), addr(1), addr(2), addr(4)]);
    }

    #[test]
    fn test_insert_duplicate_rejected() {
        let mut store = OrderedEntries::new();
        store.insert(addr(1), 10).expect("insert");
        let err = store.insert(addr(1), 20).expect_err("duplicate");
        assert_eq!(err, OracleError::DuplicateProvider(addr(1)));
        assert_eq!(values(&store), vec![10]);
    }

    #[test]
    fn test_insert_rejects_out_of_range() {
        let mut store = OrderedEntries::new();
        assert_eq!(store.insert(addr(1), 0), Err(OracleError::ZeroValue));
        assert_eq!(
            store.insert(addr(1), VALUE_LIMIT),
            Err(OracleError::ValueOverflow(VALUE_LIMIT))
        );
        assert!(store.is_empty());
        store.insert(addr(1), VALUE_LIMIT - 1).expect("max value");
    }

    #[test]
    fn test_remove_head_middle_tail() {
        let mut store = OrderedEntries::new();
        for (i, v) in [(1, 10), (2, 20), (3, 30), (4, 40), (5, 50)] {
            store.insert(addr(i), v).expect("insert");
        }

        assert_eq!(store.remove(&addr(3)).expect("middle"), 30);
        assert_consistent(&store);
        assert_eq!(store.remove(&addr(1)).expect("head"), 10);
        assert_consistent(&store);
        assert_eq!(store.remove(&addr(5)).expect("tail"), 50);
        assert_consistent(&store);
        assert_eq!(values(&store), vec![20, 40]);
    }

    #[test]
    fn test_remove_last_slot_and_only_entry() {
        let mut store = OrderedEntries::new();
        store.insert(addr(1), 7).expect("insert");
        store.remove(&addr(1)).expect("remove");
        assert!(store.is_empty());
        assert_eq!(store.head, None);
        assert_eq!(store.tail, None);
        assert_eq!(store.ordered_values().len(), 0);
    }

    #[test]
    fn test_remove_missing() {
        let mut store = OrderedEntries::new();
        let err = store.remove(&addr(9)).expect_err("missing");
        assert_eq!(err, OracleError::ProviderNotFound(addr(9)));
    }

    #[test]
    fn test_reposition_in_place() {
        let mut store = OrderedEntries::new();
        store.insert(addr(1), 10).expect("insert");
        store.insert(addr(2), 20).expect("insert");
        store.insert(addr(3), 30).expect("insert");

        let slot = store.index[&addr(2)];
        let prev = store.reposition(&addr(2), 25).expect("reposition");
        assert_eq!(prev, 20);
        assert_eq!(store.index[&addr(2)], slot);
        assert_eq!(values(&store), vec![10, 25, 30]);
        assert_consistent(&store);
    }

    #[test]
    fn test_reposition_moves_across_neighbours() {
        let mut store = OrderedEntries::new();
        store.insert(addr(1), 100_000).expect("insert");
        store.insert(addr(2), 200_000).expect("insert");
        store.insert(addr(3), 300_000).expect("insert");

        store.reposition(&addr(1), 2_000_000).expect("up");
        assert_eq!(providers(&store), vec![addr(2), addr(3), addr(1)]);
        assert_consistent(&store);

        store.reposition(&addr(1), 1).expect("down");
        assert_eq!(providers(&store), vec![addr(1), addr(2), addr(3)]);
        assert_consistent(&store);
    }

    #[test]
    fn test_reposition_rejects_bad_value_without_change() {
        let mut store = OrderedEntries::new();
        store.insert(addr(1), 10).expect("insert");
        assert_eq!(store.reposition(&addr(1), 0), Err(OracleError::ZeroValue));
        assert_eq!(store.value_of(&addr(1)), Some(10));
        assert_eq!(
            store.reposition(&addr(2), 5),
            Err(OracleError::ProviderNotFound(addr(2)))
        );
    }

    #[test]
    fn test_ordered_values_is_restartable() {
        let mut store = OrderedEntries::new();
        store.insert(addr(1), 3).expect("insert");
        store.insert(addr(2), 1).expect("insert");
        let values = store.ordered_values();
        let first: Vec<Rate> = values.clone().collect();
        let second: Vec<Rate> = values.collect();
        assert_eq!(first, second);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Set(u8, Rate),
        Remove(u8),
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..12, 1u128..1_000).prop_map(|(p, v)| Op::Set(p, v)),
            (0u8..12).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn prop_store_matches_model(ops in proptest::collection::vec(arb_op(), 0..80)) {
            let mut store = OrderedEntries::new();
            let mut model: HashMap<Address, Rate> = HashMap::new();

            for op in ops {
                match op {
                    Op::Set(p, v) => {
                        if store.contains(&addr(p)) {
                            store.reposition(&addr(p), v).expect("reposition");
                        } else {
                            store.insert(addr(p), v).expect("insert");
                        }
                        model.insert(addr(p), v);
                    }
                    Op::Remove(p) => {
                        let res = store.remove(&addr(p));
                        prop_assert_eq!(res.ok(), model.remove(&addr(p)));
                    }
                }
                assert_consistent(&store);
            }

            let mut expected: Vec<Rate> = model.values().copied().collect();
            expected.sort_unstable();
            prop_assert_eq!(values(&store), expected);
        }
    }
}
