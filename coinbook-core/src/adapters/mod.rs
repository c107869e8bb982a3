//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - JSON documents and DuckDB databases for the WalletLoader port
//! - An in-memory message catalog for the Localizer port
//! - Demo wallet data

pub mod catalog;
pub mod demo;
pub mod duckdb;
pub mod json_wallet;
