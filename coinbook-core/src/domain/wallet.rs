//! Wallet domain model - the ledger consumed by the export pipeline

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::result::LoadError;
use super::transaction::Transaction;

/// A decoded wallet: an ordered, read-only ledger of transactions
///
/// Transactions keep the order the wallet store produced them in. Nothing
/// downstream re-sorts them.
#[derive(Debug, Clone)]
pub struct Wallet {
    source_path: PathBuf,
    description: Option<String>,
    transactions: Vec<Transaction>,
}

impl Wallet {
    /// Build a wallet, validating hash syntax and uniqueness
    ///
    /// Hashes are normalized to lower case. Any violation rejects the whole
    /// wallet as corrupt.
    pub fn new(
        source_path: impl Into<PathBuf>,
        transactions: Vec<Transaction>,
    ) -> Result<Self, LoadError> {
        let source_path = source_path.into();
        let mut seen = HashSet::with_capacity(transactions.len());
        let mut normalized = Vec::with_capacity(transactions.len());

        for (index, mut tx) in transactions.into_iter().enumerate() {
            if !Transaction::is_valid_hash(&tx.hash) {
                return Err(LoadError::corrupt(
                    &source_path,
                    format!("transaction {} has a malformed hash", index),
                ));
            }
            tx.hash.make_ascii_lowercase();
            if !seen.insert(tx.hash.clone()) {
                return Err(LoadError::corrupt(
                    &source_path,
                    format!("duplicate transaction hash {}", tx.hash),
                ));
            }
            normalized.push(tx);
        }

        Ok(Self {
            source_path,
            description: None,
            transactions: normalized,
        })
    }

    /// Set the wallet description
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Path the wallet was loaded from (diagnostics only)
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Transactions in ledger order. May be empty.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
