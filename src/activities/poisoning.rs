// activities/poisoning.rs
// Address poisoning heuristic: remembers which full address is behind each
// shortened display form the account has transacted with.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::types::{ActivityRecord, TransactionActivity};

/// Which sighting of a shortened address is authoritative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoisoningPolicy {
    /// The first (oldest) transfer wins. A lookalike can only appear after the
    /// address it imitates.
    #[default]
    EarliestSighting,
    /// The most recent transfer wins.
    LatestSighting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoisoningCacheEntry {
    pub full_address: String,
    pub amount: i128,
    pub timestamp: i64,
}

/// First four and last four characters, the form wallets display.
pub fn shortened_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 8 {
        return address.to_string();
    }
    let mut key: String = chars[..4].iter().collect();
    key.extend(&chars[chars.len() - 4..]);
    key
}

#[derive(Debug, Clone, Default)]
pub struct PoisoningCache {
    policy: PoisoningPolicy,
    entries: HashMap<String, PoisoningCacheEntry>,
}

impl PoisoningCache {
    pub fn new(policy: PoisoningPolicy) -> Self {
        Self {
            policy,
            entries: HashMap::new(),
        }
    }

    pub fn policy(&self) -> PoisoningPolicy {
        self.policy
    }

    /// Record the counterparties of every final (non-pending) transfer
    pub fn update<'a, I>(&mut self, activities: I)
    where
        I: IntoIterator<Item = &'a ActivityRecord>,
    {
        for activity in activities {
            let ActivityRecord::Transaction(tx) = activity else {
                continue;
            };
            if tx.is_pending() {
                continue;
            }
            self.record(tx);
        }
    }

    fn record(&mut self, tx: &TransactionActivity) {
        let address = tx.counterparty_address();
        if address.is_empty() {
            return;
        }
        let candidate = PoisoningCacheEntry {
            full_address: address.to_string(),
            amount: tx.amount,
            timestamp: tx.timestamp,
        };

        let key = shortened_address(address);
        let replace = match self.entries.get(&key) {
            None => true,
            Some(current) => self.outranks(&candidate, current),
        };
        if replace {
            self.entries.insert(key, candidate);
        }
    }

    fn outranks(&self, candidate: &PoisoningCacheEntry, current: &PoisoningCacheEntry) -> bool {
        if candidate.timestamp == current.timestamp {
            return candidate.amount.abs() > current.amount.abs();
        }
        match self.policy {
            PoisoningPolicy::EarliestSighting => candidate.timestamp < current.timestamp,
            PoisoningPolicy::LatestSighting => candidate.timestamp > current.timestamp,
        }
    }

    /// A known shortened form backed by a different full address
    pub fn is_transaction_with_poisoning(&self, tx: &TransactionActivity) -> bool {
        let address = tx.counterparty_address();
        match self.entries.get(&shortened_address(address)) {
            Some(entry) => entry.full_address != address,
            None => false,
        }
    }

    pub fn entry_for(&self, address: &str) -> Option<&PoisoningCacheEntry> {
        self.entries.get(&shortened_address(address))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activities::fixtures::*;

    const LEGIT: &str = "0xABCD5555551234";
    const LOOKALIKE: &str = "0xABCE7777771234";
    const THIRD: &str = "0xAB00000000001234";

    fn incoming(id: &str, timestamp: i64, from: &str, amount: i128) -> ActivityRecord {
        let mut tx = incoming_tx(id, timestamp, from);
        tx.amount = amount;
        tx_record(tx)
    }

    #[test]
    fn test_shortened_address() {
        assert_eq!(shortened_address(LEGIT), "0xAB1234");
        assert_eq!(shortened_address(LOOKALIKE), "0xAB1234");
        assert_eq!(shortened_address("short"), "short");
    }

    #[test]
    fn test_earliest_sighting_is_authoritative() {
        let mut cache = PoisoningCache::default();
        cache.update(&[incoming("a:1", 100, LEGIT, 1)]);
        cache.update(&[incoming("b:1", 50, LOOKALIKE, 5)]);

        assert_eq!(cache.entry_for(LEGIT).unwrap().full_address, LOOKALIKE);
        assert!(!cache.is_transaction_with_poisoning(&incoming_tx("c:1", 200, LOOKALIKE)));
        assert!(cache.is_transaction_with_poisoning(&incoming_tx("d:1", 200, THIRD)));
    }

    #[test]
    fn test_latest_sighting_policy() {
        let mut cache = PoisoningCache::new(PoisoningPolicy::LatestSighting);
        cache.update(&[incoming("a:1", 100, LEGIT, 1)]);
        cache.update(&[incoming("b:1", 200, LOOKALIKE, 1)]);

        let entry = cache.entry_for(LEGIT).unwrap();
        assert_eq!(entry.full_address, LOOKALIKE);
        assert_eq!(entry.timestamp, 200);
    }

    #[test]
    fn test_equal_timestamps_prefer_larger_amount() {
        for policy in [PoisoningPolicy::EarliestSighting, PoisoningPolicy::LatestSighting] {
            let mut cache = PoisoningCache::new(policy);
            cache.update(&[incoming("a:1", 100, LOOKALIKE, 1)]);
            cache.update(&[incoming("b:1", 100, LEGIT, 5)]);
            cache.update(&[incoming("c:1", 100, THIRD, 2)]);
            assert_eq!(cache.entry_for(LEGIT).unwrap().full_address, LEGIT);
            assert_eq!(cache.entry_for(LEGIT).unwrap().amount, 5);
        }
    }

    #[test]
    fn test_pending_transfers_are_ignored() {
        let mut cache = PoisoningCache::default();
        let mut tx = incoming_tx("p:1", 100, LEGIT);
        tx.status = crate::activities::TransactionStatus::Pending;
        cache.update(&[tx_record(tx)]);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_outgoing_uses_recipient() {
        let mut cache = PoisoningCache::default();
        cache.update(&[tx_record(confirmed_tx("o:1", 100))]);
        assert_eq!(cache.entry_for(RECIPIENT).unwrap().full_address, RECIPIENT);
        assert!(cache.entry_for(WALLET).is_none());
    }
}
