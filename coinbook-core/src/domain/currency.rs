//! Fiat currency whitelist and exchange rates

use rust_decimal::Decimal;
use serde::Serialize;

use super::result::ConfigurationError;

/// Native unit ticker used when none is configured
pub const DEFAULT_NATIVE_TICKER: &str = "BTC";

/// Fiat currency used when none is configured
pub const DEFAULT_FIAT_CURRENCY: &str = "EUR";

/// A supported fiat currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FiatCurrency {
    pub code: &'static str,
    pub symbol: &'static str,
    /// Number of fractional digits fiat amounts are rounded to
    pub precision: u32,
}

/// Currencies the converter accepts
pub const SUPPORTED_CURRENCIES: &[FiatCurrency] = &[
    FiatCurrency { code: "USD", symbol: "$", precision: 2 },
    FiatCurrency { code: "EUR", symbol: "\u{20AC}", precision: 2 },
    FiatCurrency { code: "GBP", symbol: "\u{00A3}", precision: 2 },
    FiatCurrency { code: "JPY", symbol: "\u{00A5}", precision: 0 },
    FiatCurrency { code: "CNY", symbol: "\u{00A5}", precision: 2 },
    FiatCurrency { code: "CHF", symbol: "CHF", precision: 2 },
    FiatCurrency { code: "CAD", symbol: "C$", precision: 2 },
    FiatCurrency { code: "AUD", symbol: "A$", precision: 2 },
    FiatCurrency { code: "NZD", symbol: "NZ$", precision: 2 },
    FiatCurrency { code: "SEK", symbol: "kr", precision: 2 },
    FiatCurrency { code: "PLN", symbol: "z\u{0142}", precision: 2 },
    FiatCurrency { code: "RUB", symbol: "\u{20BD}", precision: 2 },
    FiatCurrency { code: "BRL", symbol: "R$", precision: 2 },
];

impl FiatCurrency {
    /// Look up a currency by code (case-insensitive)
    pub fn from_code(code: &str) -> Result<Self, ConfigurationError> {
        let code = code.trim();
        SUPPORTED_CURRENCIES
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(code))
            .copied()
            .ok_or_else(|| ConfigurationError(format!("unsupported currency code '{}'", code)))
    }
}

impl Default for FiatCurrency {
    fn default() -> Self {
        // EUR is always in the whitelist
        SUPPORTED_CURRENCIES[1]
    }
}

/// Native-unit to fiat multiplier, quoted in one currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExchangeRate {
    pub currency: FiatCurrency,
    pub rate: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let eur = FiatCurrency::from_code("eur").unwrap();
        assert_eq!(eur.code, "EUR");
        assert_eq!(eur.symbol, "€");
        assert_eq!(eur.precision, 2);

        assert_eq!(FiatCurrency::from_code(" JPY ").unwrap().precision, 0);
    }

    #[test]
    fn test_unknown_currency_rejected() {
        let err = FiatCurrency::from_code("XYZ").unwrap_err();
        assert!(err.to_string().contains("XYZ"));
    }

    #[test]
    fn test_default_is_eur() {
        assert_eq!(FiatCurrency::default().code, DEFAULT_FIAT_CURRENCY);
    }
}
