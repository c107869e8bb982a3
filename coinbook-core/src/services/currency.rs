//! Currency conversion service - native unit to fiat

use std::sync::{PoisonError, RwLock};

use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::result::{ConfigurationError, InvalidRateError};
use crate::domain::{ExchangeRate, FiatCurrency};

/// Active currency and its latest rate, read and swapped as one value
///
/// An export takes one snapshot and uses it for the header and every row,
/// so a concurrent `initialise` or `set_rate` never mixes two pairs in a
/// single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateSnapshot {
    pub currency: FiatCurrency,
    pub rate: Option<Decimal>,
}

impl RateSnapshot {
    /// Convert a native amount to fiat, rounded to the currency precision
    pub fn convert_to_fiat(&self, native_amount: Decimal) -> Option<Decimal> {
        let rate = self.rate?;
        let fiat = (native_amount * rate).round_dp_with_strategy(
            self.currency.precision,
            RoundingStrategy::MidpointAwayFromZero,
        );
        // never report "-0.00"
        if fiat.is_zero() {
            Some(Decimal::new(0, self.currency.precision))
        } else {
            Some(fiat)
        }
    }

    /// Convert and format with exactly the currency precision
    pub fn format_fiat(&self, native_amount: Decimal) -> Option<String> {
        let precision = self.currency.precision as usize;
        self.convert_to_fiat(native_amount)
            .map(|fiat| format!("{:.*}", precision, fiat))
    }
}

/// Converts native-unit amounts to the configured fiat currency
///
/// Constructed explicitly and shared by reference (or `Arc`). Readers always
/// see a complete (currency, rate) pair: either the one before or the one
/// after a concurrent update.
#[derive(Debug)]
pub struct CurrencyConverter {
    state: RwLock<RateSnapshot>,
}

impl Default for CurrencyConverter {
    fn default() -> Self {
        Self::new(FiatCurrency::default())
    }
}

impl CurrencyConverter {
    /// Create a converter for `currency` with no rate yet
    pub fn new(currency: FiatCurrency) -> Self {
        Self {
            state: RwLock::new(RateSnapshot {
                currency,
                rate: None,
            }),
        }
    }

    /// Set the active currency from a code
    ///
    /// Clears any previous rate, which was quoted in the old currency.
    pub fn initialise(&self, currency_code: &str) -> Result<FiatCurrency, ConfigurationError> {
        let currency = FiatCurrency::from_code(currency_code)?;
        self.replace(RateSnapshot {
            currency,
            rate: None,
        });
        Ok(currency)
    }

    /// Replace the exchange rate
    pub fn set_rate(&self, rate: Decimal) -> Result<(), InvalidRateError> {
        if rate <= Decimal::ZERO {
            return Err(InvalidRateError(rate.to_string()));
        }
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.rate = Some(rate);
        Ok(())
    }

    /// Forget the exchange rate; conversions become unavailable
    pub fn clear_rate(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.rate = None;
    }

    /// Active currency
    pub fn currency(&self) -> FiatCurrency {
        self.snapshot().currency
    }

    /// Current rate, if one has been set
    pub fn rate(&self) -> Option<ExchangeRate> {
        let state = self.snapshot();
        state.rate.map(|rate| ExchangeRate {
            currency: state.currency,
            rate,
        })
    }

    /// Convert a native amount to fiat, rounded to the currency precision
    ///
    /// Returns `None` when no rate has been set, which is distinct from a
    /// conversion that rounds to zero.
    pub fn convert_to_fiat(&self, native_amount: Decimal) -> Option<Decimal> {
        self.snapshot().convert_to_fiat(native_amount)
    }

    /// Convert and format with exactly the currency precision
    pub fn format_fiat(&self, native_amount: Decimal) -> Option<String> {
        self.snapshot().format_fiat(native_amount)
    }

    /// The current (currency, rate) pair
    pub fn snapshot(&self) -> RateSnapshot {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn replace(&self, next: RateSnapshot) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = next;
    }
}
