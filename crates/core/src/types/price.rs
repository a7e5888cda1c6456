//! Type-safe price representation using decimal arithmetic.

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., rupees, not paise).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Format for display, e.g. `₹1,24,999.00` for INR or `$1,249.99` for USD.
    ///
    /// Amounts are rounded half away from zero to two places. INR uses the
    /// Indian grouping (last three digits, then pairs).
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self
            .amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let text = format!("{:.2}", rounded.abs());
        let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), "00"));
        let grouped = match self.currency_code {
            CurrencyCode::INR => group_indian(whole),
            _ => group_thousands(whole),
        };
        format!("{sign}{}{grouped}.{frac}", self.currency_code.symbol())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_owned();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut out = String::with_capacity(digits.len() + digits.len() / 2);
    for (i, c) in head.chars().enumerate() {
        if i > 0 && (head.len() - i) % 2 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out.push(',');
    out.push_str(tail);
    out
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
    EUR,
    GBP,
    AED,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::INR => "₹",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
            Self::AED => "AED ",
        }
    }

    /// The three-letter code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::INR => "INR",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::AED => "AED",
        }
    }
}

/// Error returned for an unrecognised currency code.
#[derive(thiserror::Error, Debug, Clone)]
#[error("unsupported currency code: {0}")]
pub struct UnknownCurrency(pub String);

impl FromStr for CurrencyCode {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INR" => Ok(Self::INR),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "AED" => Ok(Self::AED),
            _ => Err(UnknownCurrency(s.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn price(amount: &str, currency: CurrencyCode) -> Price {
        Price::new(amount.parse().unwrap(), currency)
    }

    #[test]
    fn test_display_inr_grouping() {
        assert_eq!(price("999", CurrencyCode::INR).display(), "₹999.00");
        assert_eq!(price("1000", CurrencyCode::INR).display(), "₹1,000.00");
        assert_eq!(price("124999.5", CurrencyCode::INR).display(), "₹1,24,999.50");
        assert_eq!(
            price("12345678", CurrencyCode::INR).display(),
            "₹1,23,45,678.00"
        );
    }

    #[test]
    fn test_display_western_grouping() {
        assert_eq!(price("1249.99", CurrencyCode::USD).display(), "$1,249.99");
        assert_eq!(price("1234567", CurrencyCode::GBP).display(), "£1,234,567.00");
    }

    #[test]
    fn test_display_rounds_and_signs() {
        assert_eq!(price("10.005", CurrencyCode::USD).display(), "$10.01");
        assert_eq!(price("-1500", CurrencyCode::USD).display(), "-$1,500.00");
        assert_eq!(price("0", CurrencyCode::EUR).display(), "€0.00");
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("inr".parse::<CurrencyCode>().unwrap(), CurrencyCode::INR);
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }
}
