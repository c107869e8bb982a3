//! Demo wallet data
//!
//! The reference two-transaction ledger: one unlabelled debit followed by one
//! labelled credit, in that order.

use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::domain::result::LoadError;
use crate::domain::{Transaction, Wallet};

pub const DEMO_DEBIT_HASH: &str =
    "28916ed8592a4cf216d8eac7e5ccb5a08771f439e508ec2861b7ff612e15b827";
pub const DEMO_CREDIT_HASH: &str =
    "5eeabb42d0522c40cc63dace7746d5f82cd51292bc50a38c4dd68a854ec6cd77";

pub const DEMO_DEBIT_ADDRESS: &str = "1CQH7Hp9nNQVDcKtFVwbA8tqPMNWDBvqE3";
pub const DEMO_CREDIT_ADDRESS: &str = "1GtMdodCNN5ewFcEUxxVBziBrLtQzSuZvq";
pub const DEMO_CREDIT_LABEL: &str = "protobuf 1.1.北京";

/// Block times of the two demo transactions, in epoch milliseconds
pub const DEMO_DEBIT_TIME_MS: i64 = 1375089780000;
pub const DEMO_CREDIT_TIME_MS: i64 = 1375088400000;

fn block_time(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

/// Generate the demo transactions in ledger order
pub fn generate_demo_transactions() -> Vec<Transaction> {
    vec![
        Transaction::new(
            DEMO_DEBIT_HASH,
            block_time(DEMO_DEBIT_TIME_MS),
            Decimal::new(-15, 3), // -0.015
            DEMO_DEBIT_ADDRESS,
        ),
        Transaction::new(
            DEMO_CREDIT_HASH,
            block_time(DEMO_CREDIT_TIME_MS),
            Decimal::new(15, 3), // 0.015
            DEMO_CREDIT_ADDRESS,
        )
        .with_label(DEMO_CREDIT_LABEL),
    ]
}

/// Build the demo wallet as if it had been loaded from `path`
pub fn demo_wallet(path: &Path) -> Result<Wallet, LoadError> {
    Ok(Wallet::new(path, generate_demo_transactions())?
        .with_description(Some("Coinbook demo wallet".to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_wallet_order_and_values() {
        let wallet = demo_wallet(Path::new("demo.json")).unwrap();
        let txs = wallet.transactions();

        assert_eq!(txs.len(), 2);
        assert!(txs[0].is_debit());
        assert_eq!(txs[0].net_value.to_string(), "-0.015");
        assert_eq!(txs[0].label, None);
        assert!(!txs[1].is_debit());
        assert_eq!(txs[1].display_label(), DEMO_CREDIT_LABEL);
        assert_eq!(
            txs[0].timestamp.map(|t| t.timestamp_millis()),
            Some(DEMO_DEBIT_TIME_MS)
        );
    }
}
