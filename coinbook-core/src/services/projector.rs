//! Row projection - one ledger transaction to one export row
//!
//! The projector knows nothing about delimiters or quoting; it only turns a
//! transaction into five display strings.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::adapters::catalog::{CREDIT_DESCRIPTION_WITH_LABEL, DEBIT_DESCRIPTION_WITH_LABEL, UNCONFIRMED};
use crate::domain::{ExportRow, Transaction};
use crate::ports::Localizer;

use super::currency::{CurrencyConverter, RateSnapshot};

/// Date column pattern, e.g. `29 Jul 2013 09:23` (always UTC)
pub const DATE_FORMAT: &str = "%d %b %Y %H:%M";

/// Fractional digits of the native unit's smallest subunit
pub const NATIVE_PRECISION: u32 = 8;

/// Projects transactions into export rows
pub struct RowProjector<'a> {
    converter: &'a CurrencyConverter,
    localizer: &'a dyn Localizer,
}

impl<'a> RowProjector<'a> {
    pub fn new(converter: &'a CurrencyConverter, localizer: &'a dyn Localizer) -> Self {
        Self { converter, localizer }
    }

    /// Project a transaction at the converter's current rate. Never fails.
    pub fn project(&self, tx: &Transaction) -> ExportRow {
        self.project_at(tx, &self.converter.snapshot())
    }

    /// Project a transaction using a rate snapshot taken by the caller
    pub fn project_at(&self, tx: &Transaction, rates: &RateSnapshot) -> ExportRow {
        ExportRow {
            date: self.format_date(tx.timestamp),
            description: self.describe(tx),
            native_amount: format_native_amount(tx.net_value),
            fiat_amount: rates.format_fiat(tx.net_value).unwrap_or_default(),
            transaction_id: tx.hash.to_ascii_lowercase(),
        }
    }

    fn format_date(&self, timestamp: Option<DateTime<Utc>>) -> String {
        match timestamp {
            Some(ts) => ts.format(DATE_FORMAT).to_string(),
            None => self.localizer.resolve(UNCONFIRMED, &[]),
        }
    }

    fn describe(&self, tx: &Transaction) -> String {
        let key = if tx.is_debit() {
            DEBIT_DESCRIPTION_WITH_LABEL
        } else {
            CREDIT_DESCRIPTION_WITH_LABEL
        };
        self.localizer
            .resolve(key, &[tx.counterparty_address.as_str(), tx.display_label()])
    }
}

/// Format a native amount in canonical short form
///
/// Rounded to 8 fractional digits, trailing zeros removed, always `.` as the
/// decimal point: `-0.01500000` becomes `-0.015`, zero becomes `0`.
pub fn format_native_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp(NATIVE_PRECISION).normalize();
    if rounded.is_zero() {
        "0".to_string()
    } else {
        rounded.to_string()
    }
}
