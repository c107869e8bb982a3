//! Coinbook Core - wallet transaction ledger and CSV export
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core entities (Transaction, Wallet, FiatCurrency, ExportRow)
//! - **ports**: Trait definitions for external collaborators (WalletLoader, Localizer)
//! - **services**: Currency conversion, row projection, CSV export, logging
//! - **adapters**: Concrete implementations (JSON and DuckDB wallet stores, message catalog)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;

use std::io::Write;
use std::path::{Path, PathBuf};

use adapters::catalog::MessageCatalog;
use config::Config;
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{ConfigurationError, Error, ExportIoError, InvalidRateError, LoadError, Result};
pub use domain::{
    ExchangeRate, ExportRow, ExportSummary, FiatCurrency, Transaction, Wallet,
    SUPPORTED_CURRENCIES,
};

/// Main context for Coinbook operations
///
/// Holds the configuration, the shared currency converter and message
/// catalog, and the wallet stores. This is the entry point downstream code
/// uses to load wallets and export them.
pub struct CoinbookContext {
    pub config: Config,
    pub converter: CurrencyConverter,
    pub catalog: MessageCatalog,
    pub wallet_service: WalletService,
    coinbook_dir: PathBuf,
    warnings: Vec<String>,
}

impl CoinbookContext {
    /// Create a context from the settings in `coinbook_dir`
    pub fn new(coinbook_dir: &Path) -> Result<Self> {
        let config = Config::load(coinbook_dir).map_err(|e| Error::configuration(format!("{:#}", e)))?;
        Ok(Self::with_config(coinbook_dir, config))
    }

    /// Create a context from an explicit configuration
    ///
    /// Unusable stored values never prevent startup. An unsupported currency
    /// falls back to the default (dropping the rate quoted in it), a rate that
    /// is not positive is dropped, and an unreadable catalog overlay falls
    /// back to English. Each fallback is reported by `warnings()`, and the
    /// repaired values are what `save_config` writes back.
    pub fn with_config(coinbook_dir: &Path, mut config: Config) -> Self {
        let mut warnings = Vec::new();

        let currency = match config.fiat() {
            Ok(currency) => currency,
            Err(e) => {
                let fallback = FiatCurrency::default();
                warnings.push(format!("{}; using {}", e, fallback.code));
                config.fiat_currency = fallback.code.to_string();
                if config.exchange_rate.take().is_some() {
                    warnings.push(format!("stored exchange rate dropped; it was not quoted in {}", fallback.code));
                }
                fallback
            }
        };

        let converter = CurrencyConverter::new(currency);
        if let Some(rate) = config.exchange_rate {
            if let Err(e) = converter.set_rate(rate) {
                warnings.push(format!("{}; the fiat column stays empty until a rate is set", e));
                config.exchange_rate = None;
            }
        }

        let catalog = match &config.message_catalog {
            Some(path) => MessageCatalog::from_file(path).unwrap_or_else(|e| {
                warnings.push(format!("{:#}; using built-in English messages", e));
                MessageCatalog::english()
            }),
            None => MessageCatalog::english(),
        };

        Self {
            config,
            converter,
            catalog,
            wallet_service: WalletService::new(),
            coinbook_dir: coinbook_dir.to_path_buf(),
            warnings,
        }
    }

    /// Problems found in the settings while building this context
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn coinbook_dir(&self) -> &Path {
        &self.coinbook_dir
    }

    /// Persist the current configuration
    pub fn save_config(&self) -> Result<()> {
        self.config
            .save(&self.coinbook_dir)
            .map_err(|e| Error::configuration(format!("{:#}", e)))
    }

    /// Load a wallet through the store matching its file type
    pub fn load_wallet(&self, path: &Path, password: Option<&str>) -> Result<Wallet> {
        Ok(self.wallet_service.load(path, password)?)
    }

    /// Save a wallet through the store matching its file type
    pub fn save_wallet(&self, wallet: &Wallet, path: &Path) -> Result<()> {
        self.wallet_service
            .save(wallet, path)
            .map_err(|e| Error::database(format!("{:#}", e)))
    }

    /// Write the demo wallet to `path`
    pub fn write_demo_wallet(&self, path: &Path) -> Result<Wallet> {
        DemoService::new(&self.wallet_service)
            .write(path)
            .map_err(|e| Error::database(format!("{:#}", e)))
    }

    /// Export options derived from the configuration
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            native_ticker: self.config.native_ticker.clone(),
            line_ending: self.config.line_ending,
            overwrite: OverwritePolicy::default(),
        }
    }

    /// Header row for the current configuration
    pub fn header(&self) -> Result<[String; 5]> {
        let strategy = self.config.csv_strategy()?;
        Ok(TabularExporter::new(&self.converter, &self.catalog, &strategy, self.export_options()).header())
    }

    /// Project every transaction of `wallet` without writing anything
    pub fn project_rows(&self, wallet: &Wallet) -> Vec<ExportRow> {
        let projector = RowProjector::new(&self.converter, &self.catalog);
        wallet.transactions().iter().map(|tx| projector.project(tx)).collect()
    }

    /// Export `wallet` to `path` with the configured options
    pub fn export_transactions(&self, wallet: &Wallet, path: &Path) -> Result<ExportSummary> {
        self.export_with(wallet, path, self.export_options())
    }

    /// Export `wallet` to `path` with explicit options
    pub fn export_with(&self, wallet: &Wallet, path: &Path, options: ExportOptions) -> Result<ExportSummary> {
        let strategy = self.config.csv_strategy()?;
        let exporter = TabularExporter::new(&self.converter, &self.catalog, &strategy, options);
        Ok(exporter.export(wallet, path)?)
    }

    /// Export `wallet` to an arbitrary writer, e.g. stdout
    pub fn export_to_writer<W: Write>(
        &self,
        wallet: &Wallet,
        out: W,
        options: ExportOptions,
    ) -> Result<ExportSummary> {
        let strategy = self.config.csv_strategy()?;
        let exporter = TabularExporter::new(&self.converter, &self.catalog, &strategy, options);
        Ok(exporter.export_to_writer(wallet, out)?)
    }
}
