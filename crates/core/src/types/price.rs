//! Type-safe price representation using decimal arithmetic.
//!
//! The backend sends prices as plain JSON numbers. They are read into a
//! [`Decimal`] so cart totals never accumulate floating point error, and
//! written back out as numbers.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount in the store's currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from a whole number of currency units.
    #[must_use]
    pub fn from_units(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// Get the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units at this unit price.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        self.times(rhs)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl core::str::FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<Decimal>().map(Self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_price_reads_json_numbers() {
        let price: Price = serde_json::from_str("19.9").unwrap();
        assert_eq!(price, "19.90".parse().unwrap());

        let whole: Price = serde_json::from_str("10").unwrap();
        assert_eq!(whole, Price::from_units(10));
    }

    #[test]
    fn test_price_writes_json_number() {
        let json = serde_json::to_value(Price::from_units(5)).unwrap();
        assert!(json.is_number());
    }

    #[test]
    fn test_price_arithmetic() {
        let total: Price = [Price::from_units(10) * 2, Price::from_units(5)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_units(25));
    }

    #[test]
    fn test_price_display() {
        assert_eq!(Price::from_units(25).to_string(), "25.00");
        assert_eq!("3.5".parse::<Price>().unwrap().to_string(), "3.50");
    }
}
