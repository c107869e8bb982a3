//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

pub mod currency;
mod export;
pub mod result;
mod transaction;
mod wallet;

pub use currency::{ExchangeRate, FiatCurrency, SUPPORTED_CURRENCIES};
pub use export::{ExportRow, ExportSummary};
pub use transaction::{Transaction, HASH_HEX_LEN};
pub use wallet::Wallet;
