//! Type-safe price representation using decimal arithmetic.
//!
//! Amounts are exact decimals, never floats, so sums over a cart cannot
//! drift. The storefront sells in Indonesian Rupiah, which has no minor
//! unit in practice; other currencies keep two decimal places.

use std::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    /// Amount in the currency's standard unit (e.g. rupiah, dollars).
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

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Whether the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Format for display, e.g. `Rp1.500.000` or `$19.99`.
    #[must_use]
    pub fn display(&self) -> String {
        let scale = self.currency_code.display_scale();
        let rounded = self.amount.round_dp(scale);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let text = format!("{:.*}", scale as usize, rounded.abs());

        let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));
        let grouped = group_thousands(whole, self.currency_code.group_separator());

        let mut out = String::new();
        if negative {
            out.push('-');
        }
        out.push_str(self.currency_code.symbol());
        out.push_str(&grouped);
        if !fraction.is_empty() {
            out.push(self.currency_code.decimal_separator());
            out.push_str(fraction);
        }
        out
    }
}

impl Add for Price {
    type Output = Self;

    /// Adds two prices.
    ///
    /// Both operands must share a currency; the left-hand currency wins.
    fn add(self, rhs: Self) -> Self::Output {
        debug_assert_eq!(self.currency_code, rhs.currency_code);
        Self::new(self.amount + rhs.amount, self.currency_code)
    }
}

fn group_thousands(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    IDR,
    USD,
    EUR,
    GBP,
    SGD,
}

impl CurrencyCode {
    /// Currency symbol used as a display prefix.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::IDR => "Rp",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
            Self::SGD => "S$",
        }
    }

    /// The three-letter ISO code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::IDR => "IDR",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::SGD => "SGD",
        }
    }

    const fn display_scale(self) -> u32 {
        match self {
            Self::IDR => 0,
            _ => 2,
        }
    }

    // id-ID locale groups with '.', everything else with ','
    const fn group_separator(self) -> char {
        match self {
            Self::IDR | Self::EUR => '.',
            _ => ',',
        }
    }

    const fn decimal_separator(self) -> char {
        match self {
            Self::IDR | Self::EUR => ',',
            _ => '.',
        }
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IDR" => Ok(Self::IDR),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "SGD" => Ok(Self::SGD),
            other => Err(format!("unsupported currency code: {other}")),
        }
    }
}
