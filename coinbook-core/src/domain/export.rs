//! Export row model

use std::path::PathBuf;

use serde::Serialize;

/// One projected export line; maps to exactly one transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow {
    pub date: String,
    pub description: String,
    pub native_amount: String,
    /// Empty when no exchange rate is available
    pub fiat_amount: String,
    pub transaction_id: String,
}

impl ExportRow {
    /// Fields in column order
    pub fn fields(&self) -> [&str; 5] {
        [
            &self.date,
            &self.description,
            &self.native_amount,
            &self.fiat_amount,
            &self.transaction_id,
        ]
    }
}

/// Outcome of a successful export
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub path: PathBuf,
    /// Data rows written (header excluded)
    pub rows: usize,
    pub bytes: u64,
    /// Hex SHA-256 of the written bytes
    pub sha256: String,
}
