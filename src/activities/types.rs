// =============================================================================
// CORE DATA STRUCTURES
// =============================================================================

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Blockchains an account can hold activities on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ton,
    Tron,
    Solana,
}

impl Chain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Ton => "ton",
            Chain::Tron => "tron",
            Chain::Solana => "solana",
        }
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionStatus {
    Pending,
    PendingTrusted,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SwapStatus {
    Pending,
    PendingTrusted,
    Completed,
    Failed,
    Expired,
}

/// Decoded operation type of a transaction, when the indexer recognized one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityType {
    CallContract,
    Excess,
    Bounced,
    Stake,
    Unstake,
    UnstakeRequest,
    Mint,
    Burn,
    NftTrade,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftRef {
    pub address: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub collection_address: Option<String>,
}

/// Exchange-side details of a cross-chain (CEX routed) swap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CexMetadata {
    pub payin_address: String,
    pub payout_address: String,
    pub transaction_id: String,
    pub status: String,
}

/// Base-unit amounts are written as decimal strings. `ActivityRecord` is
/// internally tagged, and serde's buffered content has no room for `i128`.
/// Plain JSON integers are still accepted on read.
mod amount_string {
    use std::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &i128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i128, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }

    struct AmountVisitor;

    impl<'de> Visitor<'de> for AmountVisitor {
        type Value = i128;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an integer amount or a decimal string")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<i128, E> {
            v.trim().parse::<i128>().map_err(E::custom)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<i128, E> {
            Ok(v as i128)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i128, E> {
            Ok(v as i128)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionActivity {
    pub id: String,
    /// Milliseconds since the unix epoch
    pub timestamp: i64,
    #[serde(default)]
    pub activity_type: Option<ActivityType>,
    pub slug: String,
    pub from_address: String,
    pub to_address: String,
    /// Signed amount in the token's base units; negative when outgoing
    #[serde(with = "amount_string")]
    pub amount: i128,
    pub is_incoming: bool,
    /// Counterparty address in normalized form
    pub normalized_address: String,
    #[serde(default, with = "amount_string")]
    pub fee: i128,
    pub status: TransactionStatus,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub encrypted_comment: Option<String>,
    #[serde(default)]
    pub nft: Option<NftRef>,
    #[serde(default)]
    pub external_msg_hash_norm: Option<String>,
    #[serde(default)]
    pub is_local: bool,
    #[serde(default)]
    pub should_hide: bool,
    #[serde(default)]
    pub is_scam: bool,
    /// USD value at the time of the transfer, when the price was known
    #[serde(default)]
    pub amount_usd: Option<f64>,
}

impl TransactionActivity {
    /// The other side of the transfer: sender when incoming, recipient otherwise
    pub fn counterparty_address(&self) -> &str {
        if self.is_incoming {
            &self.from_address
        } else {
            &self.to_address
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.status, TransactionStatus::Pending | TransactionStatus::PendingTrusted)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapActivity {
    pub id: String,
    pub timestamp: i64,
    pub from_slug: String,
    pub to_slug: String,
    /// Decimal strings, as reported by the swap backend
    pub from_amount: String,
    pub to_amount: String,
    pub status: SwapStatus,
    #[serde(default)]
    pub hashes: Vec<String>,
    #[serde(default)]
    pub cex: Option<CexMetadata>,
    #[serde(default)]
    pub external_msg_hash_norm: Option<String>,
    #[serde(default)]
    pub is_local: bool,
    #[serde(default)]
    pub should_hide: bool,
}

/// One user-visible ledger event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ActivityRecord {
    Transaction(TransactionActivity),
    Swap(SwapActivity),
}

/// Kind of identifier, taken from the `|<kind>` suffix of an activity id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxIdKind {
    Chain,
    Local,
    Additional,
}

/// Activity ids have the shape `<hash>[:<subId>][|<kind>]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTxId {
    pub hash: String,
    pub sub_id: Option<String>,
    pub kind: TxIdKind,
}

pub fn parse_tx_id(id: &str) -> ParsedTxId {
    let (body, kind) = match id.split_once('|') {
        Some((body, "local")) => (body, TxIdKind::Local),
        Some((body, "additional")) => (body, TxIdKind::Additional),
        Some((body, _)) => (body, TxIdKind::Chain),
        None => (id, TxIdKind::Chain),
    };
    let (hash, sub_id) = match body.split_once(':') {
        Some((hash, sub)) => (hash.to_string(), Some(sub.to_string())),
        None => (body.to_string(), None),
    };
    ParsedTxId { hash, sub_id, kind }
}

pub fn is_local_id(id: &str) -> bool {
    parse_tx_id(id).kind == TxIdKind::Local
}

impl ActivityRecord {
    pub fn id(&self) -> &str {
        match self {
            ActivityRecord::Transaction(tx) => &tx.id,
            ActivityRecord::Swap(swap) => &swap.id,
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            ActivityRecord::Transaction(tx) => tx.timestamp,
            ActivityRecord::Swap(swap) => swap.timestamp,
        }
    }

    pub fn timestamp_datetime(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.timestamp())
            .single()
            .unwrap_or_default()
    }

    pub fn is_local(&self) -> bool {
        match self {
            ActivityRecord::Transaction(tx) => tx.is_local,
            ActivityRecord::Swap(swap) => swap.is_local,
        }
    }

    pub fn should_hide(&self) -> bool {
        match self {
            ActivityRecord::Transaction(tx) => tx.should_hide,
            ActivityRecord::Swap(swap) => swap.should_hide,
        }
    }

    pub fn set_should_hide(&mut self, value: bool) {
        match self {
            ActivityRecord::Transaction(tx) => tx.should_hide = value,
            ActivityRecord::Swap(swap) => swap.should_hide = value,
        }
    }

    pub fn activity_type(&self) -> Option<ActivityType> {
        match self {
            ActivityRecord::Transaction(tx) => tx.activity_type,
            ActivityRecord::Swap(_) => None,
        }
    }

    /// Decoded contract calls are richer than the generic record the poller
    /// may send later for the same id, so they are never overwritten.
    pub fn is_call_contract(&self) -> bool {
        self.activity_type() == Some(ActivityType::CallContract)
    }

    pub fn is_pending(&self) -> bool {
        match self {
            ActivityRecord::Transaction(tx) => tx.is_pending(),
            ActivityRecord::Swap(swap) => {
                matches!(swap.status, SwapStatus::Pending | SwapStatus::PendingTrusted)
            }
        }
    }

    pub fn is_pending_trusted(&self) -> bool {
        match self {
            ActivityRecord::Transaction(tx) => tx.status == TransactionStatus::PendingTrusted,
            ActivityRecord::Swap(swap) => swap.status == SwapStatus::PendingTrusted,
        }
    }

    pub fn is_confirmed_or_completed(&self) -> bool {
        match self {
            ActivityRecord::Transaction(tx) => tx.status == TransactionStatus::Confirmed,
            ActivityRecord::Swap(swap) => swap.status == SwapStatus::Completed,
        }
    }

    /// Known on-chain with a final status
    pub fn is_non_pending(&self) -> bool {
        !self.is_local() && !self.is_pending()
    }

    pub fn status_str(&self) -> &'static str {
        match self {
            ActivityRecord::Transaction(tx) => match tx.status {
                TransactionStatus::Pending => "pending",
                TransactionStatus::PendingTrusted => "pendingTrusted",
                TransactionStatus::Confirmed => "confirmed",
                TransactionStatus::Failed => "failed",
            },
            ActivityRecord::Swap(swap) => match swap.status {
                SwapStatus::Pending => "pending",
                SwapStatus::PendingTrusted => "pendingTrusted",
                SwapStatus::Completed => "completed",
                SwapStatus::Failed => "failed",
                SwapStatus::Expired => "expired",
            },
        }
    }

    pub fn parsed_tx_id(&self) -> ParsedTxId {
        parse_tx_id(self.id())
    }

    pub fn external_msg_hash_norm(&self) -> Option<&str> {
        match self {
            ActivityRecord::Transaction(tx) => tx.external_msg_hash_norm.as_deref(),
            ActivityRecord::Swap(swap) => swap.external_msg_hash_norm.as_deref(),
        }
    }

    /// Hash identifying the logical transaction across id changes
    pub fn logical_hash(&self) -> String {
        match self.external_msg_hash_norm() {
            Some(hash) => hash.to_string(),
            None => self.parsed_tx_id().hash,
        }
    }

    /// Primary asset slug: the token of a transfer, the source token of a swap
    pub fn slug(&self) -> &str {
        match self {
            ActivityRecord::Transaction(tx) => &tx.slug,
            ActivityRecord::Swap(swap) => &swap.from_slug,
        }
    }

    /// Every per-asset timeline this activity belongs to
    pub fn slugs(&self) -> Vec<&str> {
        match self {
            ActivityRecord::Transaction(tx) => vec![tx.slug.as_str()],
            ActivityRecord::Swap(swap) => {
                if swap.from_slug == swap.to_slug {
                    vec![swap.from_slug.as_str()]
                } else {
                    vec![swap.from_slug.as_str(), swap.to_slug.as_str()]
                }
            }
        }
    }

    pub fn as_transaction(&self) -> Option<&TransactionActivity> {
        match self {
            ActivityRecord::Transaction(tx) => Some(tx),
            ActivityRecord::Swap(_) => None,
        }
    }

    /// Scam-flagged, zero-valued, or worth less than `max_cost_usd`.
    /// Swaps are never tiny.
    pub fn is_tiny_or_scam(&self, max_cost_usd: f64) -> bool {
        match self {
            ActivityRecord::Transaction(tx) => {
                if tx.is_scam || tx.amount == 0 {
                    return true;
                }
                match tx.amount_usd {
                    Some(usd) => usd.abs() < max_cost_usd,
                    None => false,
                }
            }
            ActivityRecord::Swap(_) => false,
        }
    }

    /// Copy with a plain `pending` status upgraded to `pendingTrusted`.
    /// None when the status is anything else.
    pub fn to_pending_trusted(&self) -> Option<ActivityRecord> {
        let mut activity = self.clone();
        match &mut activity {
            ActivityRecord::Transaction(tx) => {
                if tx.status != TransactionStatus::Pending {
                    return None;
                }
                tx.status = TransactionStatus::PendingTrusted;
            }
            ActivityRecord::Swap(swap) => {
                if swap.status != SwapStatus::Pending {
                    return None;
                }
                swap.status = SwapStatus::PendingTrusted;
            }
        }
        Some(activity)
    }
}

/// Asset filter for per-token views and pagination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityToken {
    pub slug: String,
    #[serde(default)]
    pub price_usd: Option<f64>,
}

impl ActivityToken {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            price_usd: None,
        }
    }

    pub fn with_price(mut self, price_usd: f64) -> Self {
        self.price_usd = Some(price_usd);
        self
    }
}
