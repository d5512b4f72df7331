// activities/matching.rs
// Decides when two records with different ids are the same logical event
// (local -> pending -> confirmed).

use std::collections::{HashMap, HashSet};

use super::types::{ActivityRecord, SwapActivity, TransactionActivity};

pub trait ActivityMatcher: Send + Sync {
    /// Whether `next` supersedes `prev`
    fn is_same_activity(&self, prev: &ActivityRecord, next: &ActivityRecord) -> bool;
}

/// Default matcher.
///
/// 1. When both records carry a normalized external message hash, only that
///    hash decides.
/// 2. A chain record (pending) matches on its parsed transaction hash.
/// 3. A local record matches on its transfer fingerprint, but only against
///    records that are not older than the local one by more than
///    `max_clock_skew_ms`. A repeat payment must not match the previous one.
#[derive(Debug, Clone, Copy)]
pub struct FingerprintMatcher {
    max_clock_skew_ms: i64,
}

pub const DEFAULT_MAX_CLOCK_SKEW_MS: i64 = 5 * 60 * 1000;

impl FingerprintMatcher {
    pub fn new(max_clock_skew_ms: i64) -> Self {
        Self {
            max_clock_skew_ms: max_clock_skew_ms.max(0),
        }
    }

    pub fn max_clock_skew_ms(&self) -> i64 {
        self.max_clock_skew_ms
    }
}

impl Default for FingerprintMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CLOCK_SKEW_MS)
    }
}

impl ActivityMatcher for FingerprintMatcher {
    fn is_same_activity(&self, prev: &ActivityRecord, next: &ActivityRecord) -> bool {
        if let (Some(prev_hash), Some(next_hash)) =
            (prev.external_msg_hash_norm(), next.external_msg_hash_norm())
        {
            return prev_hash == next_hash;
        }

        if !prev.is_local() {
            return prev.parsed_tx_id().hash == next.parsed_tx_id().hash;
        }

        // the chain copy cannot predate the local send beyond clock skew
        if next.timestamp() < prev.timestamp().saturating_sub(self.max_clock_skew_ms) {
            return false;
        }

        fingerprints_match(prev, next)
    }
}

pub fn fingerprints_match(prev: &ActivityRecord, next: &ActivityRecord) -> bool {
    match (prev, next) {
        (ActivityRecord::Transaction(a), ActivityRecord::Transaction(b)) => transfers_match(a, b),
        (ActivityRecord::Swap(a), ActivityRecord::Swap(b)) => swaps_match(a, b),
        _ => false,
    }
}

fn transfers_match(a: &TransactionActivity, b: &TransactionActivity) -> bool {
    a.activity_type == b.activity_type
        && a.slug == b.slug
        && a.is_incoming == b.is_incoming
        && a.normalized_address == b.normalized_address
        && a.amount == b.amount
        && a.nft.as_ref().map(|nft| &nft.address) == b.nft.as_ref().map(|nft| &nft.address)
        && comments_compatible(a, b)
}

/// A comment only known on one side (or encrypted on the chain side) is not
/// a mismatch.
fn comments_compatible(a: &TransactionActivity, b: &TransactionActivity) -> bool {
    match (&a.comment, &b.comment) {
        (Some(left), Some(right)) => left == right,
        _ => true,
    }
}

fn swaps_match(a: &SwapActivity, b: &SwapActivity) -> bool {
    a.from_slug == b.from_slug && a.to_slug == b.to_slug && a.from_amount == b.from_amount
}

/// Map each superseded id in `prev` to the id of its successor in `next`.
///
/// Every successor is claimed at most once. Records present in both lists
/// under the same id are plain updates and produce no mapping.
pub fn get_activity_id_replacements(
    prev: &[ActivityRecord],
    next: &[ActivityRecord],
    matcher: &dyn ActivityMatcher,
) -> HashMap<String, String> {
    let mut replacements = HashMap::new();
    if prev.is_empty() || next.is_empty() {
        return replacements;
    }

    let next_ids: HashSet<&str> = next.iter().map(|activity| activity.id()).collect();
    let mut claimed: HashSet<&str> = HashSet::new();

    for old in prev {
        if next_ids.contains(old.id()) {
            continue;
        }
        let successor = next.iter().find(|candidate| {
            candidate.id() != old.id()
                && !claimed.contains(candidate.id())
                && matcher.is_same_activity(old, candidate)
        });
        if let Some(successor) = successor {
            claimed.insert(successor.id());
            replacements.insert(old.id().to_string(), successor.id().to_string());
        }
    }

    replacements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activities::fixtures::*;

    #[test]
    fn test_local_matches_confirmed_by_fingerprint() {
        let local = tx_record(local_tx("l1|local", 1_000));
        let confirmed = tx_record(confirmed_tx("abc:1", 1_000));
        assert!(FingerprintMatcher::default().is_same_activity(&local, &confirmed));

        let mut other_amount = confirmed_tx("abd:1", 1_000);
        other_amount.amount = -1;
        assert!(!FingerprintMatcher::default().is_same_activity(&local, &tx_record(other_amount)));
    }

    #[test]
    fn test_external_hash_takes_precedence() {
        let mut local = local_tx("l1|local", 1_000);
        local.external_msg_hash_norm = Some("ext-a".to_string());
        let mut chain = confirmed_tx("abc:1", 1_000);
        chain.external_msg_hash_norm = Some("ext-b".to_string());

        // identical fingerprints, different message hashes
        assert!(!FingerprintMatcher::default().is_same_activity(&tx_record(local), &tx_record(chain)));
    }

    #[test]
    fn test_pending_matches_on_tx_hash() {
        let pending = tx_record(pending_tx("hash1:0", 1_000));
        let confirmed = tx_record(confirmed_tx("hash1:77", 1_010));
        let unrelated = tx_record(confirmed_tx("hash2:77", 1_010));

        assert!(FingerprintMatcher::default().is_same_activity(&pending, &confirmed));
        assert!(!FingerprintMatcher::default().is_same_activity(&pending, &unrelated));
    }

    #[test]
    fn test_comments_must_agree_when_both_known() {
        let mut local = local_tx("l1|local", 1_000);
        local.comment = Some("rent".to_string());
        let mut chain = confirmed_tx("abc:1", 1_000);
        chain.comment = Some("gift".to_string());
        assert!(!FingerprintMatcher::default().is_same_activity(&tx_record(local.clone()), &tx_record(chain.clone())));

        chain.comment = None;
        chain.encrypted_comment = Some("0xdead".to_string());
        assert!(FingerprintMatcher::default().is_same_activity(&tx_record(local), &tx_record(chain)));
    }

    #[test]
    fn test_replacements_claim_each_successor_once() {
        let prev = vec![
            tx_record(local_tx("l1|local", 1_000)),
            tx_record(local_tx("l2|local", 1_000)),
        ];
        let next = vec![tx_record(confirmed_tx("abc:1", 1_000))];

        let replacements = get_activity_id_replacements(&prev, &next, &FingerprintMatcher::default());
        assert_eq!(replacements.len(), 1);
        assert_eq!(replacements.get("l1|local").map(String::as_str), Some("abc:1"));
    }

    #[test]
    fn test_same_id_update_is_not_a_replacement() {
        let prev = vec![tx_record(pending_tx("hash1:0", 1_000))];
        let next = vec![
            tx_record(confirmed_tx("hash1:0", 1_000)),
            tx_record(confirmed_tx("hash1:1", 1_000)),
        ];
        assert!(get_activity_id_replacements(&prev, &next, &FingerprintMatcher::default()).is_empty());
    }

    #[test]
    fn test_swap_fingerprint() {
        let local = match swap("s|local", 1_000) {
            ActivityRecord::Swap(mut swap) => {
                swap.is_local = true;
                ActivityRecord::Swap(swap)
            }
            other => other,
        };
        let chain = swap("s:9", 1_005);
        assert!(FingerprintMatcher::default().is_same_activity(&local, &chain));
        assert!(!FingerprintMatcher::default().is_same_activity(&local, &tx_record(confirmed_tx("x:1", 1_000))));
    }

    #[test]
    fn test_repeat_payment_does_not_match_previous_transfer() {
        let earlier = tx_record(confirmed_tx("old:0", 1_000));
        let repeat = tx_record(local_tx("new|local", 172_800_000));
        assert!(!FingerprintMatcher::default().is_same_activity(&repeat, &earlier));

        // same transfer seen a little before the device clock
        let skewed = tx_record(confirmed_tx("abc:0", 172_800_000 - 30_000));
        assert!(FingerprintMatcher::default().is_same_activity(&repeat, &skewed));
        assert!(!FingerprintMatcher::new(10_000).is_same_activity(&repeat, &skewed));
    }

    #[test]
    fn test_repeat_payment_gets_no_replacement() {
        let prev = vec![tx_record(local_tx("new|local", 172_800_000))];
        let next = vec![tx_record(confirmed_tx("old:0", 1_000))];
        assert!(get_activity_id_replacements(&prev, &next, &FingerprintMatcher::default()).is_empty());
    }
}
