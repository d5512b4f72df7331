// activities/fixtures.rs
// Builders shared by the activity unit tests

use std::collections::HashMap;

use super::types::*;

pub const ACCOUNT: &str = "0-ton-mainnet";
pub const WALLET: &str = "UQwalletAddress00000000000000000000000000000000wlt1";
pub const RECIPIENT: &str = "UQrecipientAddress0000000000000000000000000000rcp1";

pub fn confirmed_tx(id: &str, timestamp: i64) -> TransactionActivity {
    TransactionActivity {
        id: id.to_string(),
        timestamp,
        activity_type: None,
        slug: "toncoin".to_string(),
        from_address: WALLET.to_string(),
        to_address: RECIPIENT.to_string(),
        amount: -5_000_000_000,
        is_incoming: false,
        normalized_address: RECIPIENT.to_string(),
        fee: 3_000_000,
        status: TransactionStatus::Confirmed,
        comment: None,
        encrypted_comment: None,
        nft: None,
        external_msg_hash_norm: None,
        is_local: false,
        should_hide: false,
        is_scam: false,
        amount_usd: Some(15.0),
    }
}

pub fn pending_tx(id: &str, timestamp: i64) -> TransactionActivity {
    TransactionActivity {
        status: TransactionStatus::Pending,
        ..confirmed_tx(id, timestamp)
    }
}

pub fn local_tx(id: &str, timestamp: i64) -> TransactionActivity {
    TransactionActivity {
        is_local: true,
        status: TransactionStatus::Pending,
        ..confirmed_tx(id, timestamp)
    }
}

pub fn incoming_tx(id: &str, timestamp: i64, from: &str) -> TransactionActivity {
    TransactionActivity {
        from_address: from.to_string(),
        to_address: WALLET.to_string(),
        normalized_address: from.to_string(),
        amount: 2_000_000_000,
        is_incoming: true,
        ..confirmed_tx(id, timestamp)
    }
}

pub fn tx_record(tx: TransactionActivity) -> ActivityRecord {
    ActivityRecord::Transaction(tx)
}

pub fn swap(id: &str, timestamp: i64) -> ActivityRecord {
    ActivityRecord::Swap(SwapActivity {
        id: id.to_string(),
        timestamp,
        from_slug: "toncoin".to_string(),
        to_slug: "usdt".to_string(),
        from_amount: "10".to_string(),
        to_amount: "31.5".to_string(),
        status: SwapStatus::Completed,
        hashes: vec![],
        cex: None,
        external_msg_hash_norm: None,
        is_local: false,
        should_hide: false,
    })
}

pub fn index(records: Vec<ActivityRecord>) -> HashMap<String, ActivityRecord> {
    records
        .into_iter()
        .map(|record| (record.id().to_string(), record))
        .collect()
}
