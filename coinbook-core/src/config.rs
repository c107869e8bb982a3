//! Configuration management
//!
//! Settings live in `settings.json` inside the coinbook directory:
//! ```json
//! {
//!   "fiatCurrency": "EUR",
//!   "nativeTicker": "BTC",
//!   "exchangeRate": "10.0",
//!   "csvDelimiter": "comma",
//!   "lineEnding": "lf",
//!   "messageCatalog": "/path/to/messages.de.json"
//! }
//! ```
//! Keys this crate does not manage are preserved on save.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::currency::{DEFAULT_FIAT_CURRENCY, DEFAULT_NATIVE_TICKER};
use crate::domain::result::ConfigurationError;
use crate::domain::FiatCurrency;
use crate::services::export::{CsvStrategy, LineEnding};

/// Settings file name inside the coinbook directory
pub const SETTINGS_FILE: &str = "settings.json";

/// Environment variable overriding the fiat currency
pub const ENV_FIAT_CURRENCY: &str = "COINBOOK_FIAT_CURRENCY";
/// Environment variable overriding the native ticker
pub const ENV_NATIVE_TICKER: &str = "COINBOOK_NATIVE_TICKER";

fn default_fiat_currency() -> String {
    DEFAULT_FIAT_CURRENCY.to_string()
}

fn default_native_ticker() -> String {
    DEFAULT_NATIVE_TICKER.to_string()
}

fn default_csv_delimiter() -> String {
    "comma".to_string()
}

/// Raw settings.json structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default = "default_fiat_currency")]
    fiat_currency: String,
    #[serde(default = "default_native_ticker")]
    native_ticker: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exchange_rate: Option<Decimal>,
    #[serde(default = "default_csv_delimiter")]
    csv_delimiter: String,
    #[serde(default)]
    line_ending: LineEnding,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message_catalog: Option<PathBuf>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

impl Default for SettingsFile {
    fn default() -> Self {
        Self {
            fiat_currency: default_fiat_currency(),
            native_ticker: default_native_ticker(),
            exchange_rate: None,
            csv_delimiter: default_csv_delimiter(),
            line_ending: LineEnding::default(),
            message_catalog: None,
            other: HashMap::new(),
        }
    }
}

/// Coinbook configuration (managed view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    /// ISO 4217 code of the preferred display currency
    pub fiat_currency: String,
    /// Ticker used in the native amount column header
    pub native_ticker: String,
    /// Last known rate (fiat units per native unit)
    pub exchange_rate: Option<Decimal>,
    /// `comma`, `semicolon` or `tab`
    pub csv_delimiter: String,
    pub line_ending: LineEnding,
    /// Optional JSON overlay for the message catalog
    pub message_catalog: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_raw(SettingsFile::default())
    }
}

impl Config {
    fn from_raw(raw: SettingsFile) -> Self {
        Self {
            fiat_currency: raw.fiat_currency,
            native_ticker: raw.native_ticker,
            exchange_rate: raw.exchange_rate,
            csv_delimiter: raw.csv_delimiter,
            line_ending: raw.line_ending,
            message_catalog: raw.message_catalog,
        }
    }

    fn read_raw(settings_path: &Path) -> Result<SettingsFile> {
        if !settings_path.exists() {
            return Ok(SettingsFile::default());
        }
        let content = std::fs::read_to_string(settings_path)
            .with_context(|| format!("Failed to read {}", settings_path.display()))?;
        Ok(serde_json::from_str(&content).unwrap_or_default())
    }

    /// Load config from the coinbook directory
    ///
    /// A missing or unreadable settings file yields defaults. The fiat
    /// currency and native ticker can be overridden via
    /// COINBOOK_FIAT_CURRENCY and COINBOOK_NATIVE_TICKER.
    pub fn load(coinbook_dir: &Path) -> Result<Self> {
        let raw = Self::read_raw(&coinbook_dir.join(SETTINGS_FILE))?;
        let mut config = Self::from_raw(raw);
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply environment-style overrides from `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(code) = lookup(ENV_FIAT_CURRENCY).filter(|v| !v.trim().is_empty()) {
            self.fiat_currency = code.trim().to_string();
        }
        if let Some(ticker) = lookup(ENV_NATIVE_TICKER).filter(|v| !v.trim().is_empty()) {
            self.native_ticker = ticker.trim().to_string();
        }
    }

    /// Save config to the coinbook directory
    /// Preserves other settings that coinbook doesn't manage
    pub fn save(&self, coinbook_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(coinbook_dir)
            .with_context(|| format!("Failed to create {}", coinbook_dir.display()))?;
        let settings_path = coinbook_dir.join(SETTINGS_FILE);

        // Load existing settings to preserve fields we don't manage
        let mut settings = Self::read_raw(&settings_path)?;

        settings.fiat_currency = self.fiat_currency.clone();
        settings.native_ticker = self.native_ticker.clone();
        settings.exchange_rate = self.exchange_rate;
        settings.csv_delimiter = self.csv_delimiter.clone();
        settings.line_ending = self.line_ending;
        settings.message_catalog = self.message_catalog.clone();

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)
            .with_context(|| format!("Failed to write {}", settings_path.display()))?;
        Ok(())
    }

    /// Configured fiat currency, validated against the supported set
    pub fn fiat(&self) -> Result<FiatCurrency, ConfigurationError> {
        FiatCurrency::from_code(&self.fiat_currency)
    }

    /// Configured delimiter as a joiner strategy
    pub fn csv_strategy(&self) -> Result<CsvStrategy, ConfigurationError> {
        CsvStrategy::from_name(&self.csv_delimiter)
    }
}
