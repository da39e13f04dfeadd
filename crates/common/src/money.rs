//! Fixed-point money arithmetic.
//!
//! All currency amounts in the system are stored as integer cents. Rate
//! application (tax) rounds half-up to the nearest cent, so totals never
//! accumulate floating-point drift.

use serde::{Deserialize, Serialize};

/// Money amount represented in cents to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money {
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Creates a new Money amount from a whole dollar value.
    pub fn from_dollars(dollars: i64) -> Self {
        Self {
            cents: dollars * 100,
        }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the dollar portion (whole number).
    pub fn dollars(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after dollars).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.cents > 0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: i64) -> Money {
        Money {
            cents: self.cents * quantity,
        }
    }

    /// Applies a rate to this amount, rounding half-up to the nearest cent.
    ///
    /// Half-up rounds toward positive infinity: 2.5 cents becomes 3,
    /// -2.5 cents becomes -2.
    pub fn apply_rate(&self, rate: TaxRate) -> Money {
        let numerator = self.cents * i64::from(rate.basis_points());
        Money {
            cents: (numerator + 5_000).div_euclid(10_000),
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-${}.{:02}", self.dollars().abs(), self.cents_part())
        } else {
            write!(f, "${}.{:02}", self.dollars(), self.cents_part())
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents + rhs.cents,
        }
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents - rhs.cents,
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.cents += rhs.cents;
    }
}

impl std::ops::SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.cents -= rhs.cents;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// Tax rate expressed in basis points (1/100th of a percent).
///
/// 1000 basis points = 10%. Integer basis points keep rate application in
/// pure integer arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxRate {
    basis_points: u32,
}

impl TaxRate {
    /// Creates a rate from basis points.
    pub fn from_basis_points(basis_points: u32) -> Self {
        Self { basis_points }
    }

    /// Creates a rate from a whole percentage.
    pub fn from_percent(percent: u32) -> Self {
        Self {
            basis_points: percent * 100,
        }
    }

    /// Returns the rate in basis points.
    pub fn basis_points(&self) -> u32 {
        self.basis_points
    }
}

impl Default for TaxRate {
    /// The standard 10% rate.
    fn default() -> Self {
        Self { basis_points: 1000 }
    }
}

impl std::fmt::Display for TaxRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{:02}%",
            self.basis_points / 100,
            self.basis_points % 100
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_cents() {
        let money = Money::from_cents(1234);
        assert_eq!(money.cents(), 1234);
        assert_eq!(money.dollars(), 12);
        assert_eq!(money.cents_part(), 34);
    }

    #[test]
    fn test_money_from_dollars() {
        let money = Money::from_dollars(50);
        assert_eq!(money.cents(), 5000);
        assert_eq!(money.dollars(), 50);
        assert_eq!(money.cents_part(), 0);
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(1234).to_string(), "$12.34");
        assert_eq!(Money::from_cents(100).to_string(), "$1.00");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::from_cents(-1234).to_string(), "-$12.34");
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!(a.multiply(3).cents(), 3000);
    }

    #[test]
    fn test_money_comparison() {
        assert!(Money::from_cents(100).is_positive());
        assert!(Money::from_cents(0).is_zero());
        assert!(Money::from_cents(-100).is_negative());
    }

    #[test]
    fn test_money_sum() {
        let total: Money = [100, 250, 9].into_iter().map(Money::from_cents).sum();
        assert_eq!(total.cents(), 359);
    }

    #[test]
    fn test_money_add_assign() {
        let mut money = Money::from_cents(100);
        money += Money::from_cents(50);
        assert_eq!(money.cents(), 150);
    }

    #[test]
    fn test_money_sub_assign() {
        let mut money = Money::from_cents(100);
        money -= Money::from_cents(30);
        assert_eq!(money.cents(), 70);
    }

    #[test]
    fn test_apply_rate_exact() {
        // $25.00 at 10% = $2.50
        let tax = Money::from_cents(2500).apply_rate(TaxRate::default());
        assert_eq!(tax.cents(), 250);
    }

    #[test]
    fn test_apply_rate_rounds_half_up() {
        // 5 cents at 10% = 0.5 cents, rounds up to 1
        let tax = Money::from_cents(5).apply_rate(TaxRate::default());
        assert_eq!(tax.cents(), 1);

        // 25 cents at 10% = 2.5 cents, rounds up to 3
        let tax = Money::from_cents(25).apply_rate(TaxRate::default());
        assert_eq!(tax.cents(), 3);

        // 24 cents at 10% = 2.4 cents, rounds down to 2
        let tax = Money::from_cents(24).apply_rate(TaxRate::default());
        assert_eq!(tax.cents(), 2);
    }

    #[test]
    fn test_apply_rate_negative_rounds_toward_positive() {
        // -25 cents at 10% = -2.5 cents, half-up gives -2
        let tax = Money::from_cents(-25).apply_rate(TaxRate::default());
        assert_eq!(tax.cents(), -2);
    }

    #[test]
    fn test_tax_rate_from_percent() {
        assert_eq!(TaxRate::from_percent(10), TaxRate::from_basis_points(1000));
        assert_eq!(TaxRate::default().basis_points(), 1000);
    }

    #[test]
    fn test_tax_rate_display() {
        assert_eq!(TaxRate::default().to_string(), "10.00%");
        assert_eq!(TaxRate::from_basis_points(825).to_string(), "8.25%");
    }

    #[test]
    fn test_money_serializes_as_bare_cents() {
        let json = serde_json::to_string(&Money::from_cents(1999)).unwrap();
        assert_eq!(json, "1999");
    }
}
