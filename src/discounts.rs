//! Discounts

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Errors raised while validating a discount specification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiscountError {
    /// Discount value below zero.
    #[error("discount value {0} is negative")]
    Negative(Decimal),

    /// Percentage discount above 100, which would drive the total negative.
    #[error("percentage discount {0} exceeds 100")]
    PercentOutOfRange(Decimal),
}

/// Cart-level discount specification.
///
/// A single discount applies to the whole cart. Percentage discounts hold
/// percent points (e.g. `10` for 10% off); fixed discounts hold a currency
/// amount that is allocated across lines proportionally to their share of
/// the subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Discount {
    /// No discount.
    #[default]
    None,

    /// Percent points off the whole cart (0–100).
    Percentage(Decimal),

    /// Fixed amount off the whole cart.
    Fixed(Decimal),
}

impl Discount {
    /// Checks the specification is usable.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] for negative values or percentages above
    /// 100.
    pub fn validate(&self) -> Result<(), DiscountError> {
        match *self {
            Discount::None => Ok(()),
            Discount::Percentage(value) => {
                if value < Decimal::ZERO {
                    Err(DiscountError::Negative(value))
                } else if value > Decimal::ONE_HUNDRED {
                    Err(DiscountError::PercentOutOfRange(value))
                } else {
                    Ok(())
                }
            }
            Discount::Fixed(value) => {
                if value < Decimal::ZERO {
                    Err(DiscountError::Negative(value))
                } else {
                    Ok(())
                }
            }
        }
    }

    /// The raw cart-level value as recorded in the ledger's `discount`
    /// column: percent points, a fixed amount, or zero.
    #[must_use]
    pub fn recorded_value(&self) -> Decimal {
        match *self {
            Discount::None => Decimal::ZERO,
            Discount::Percentage(value) | Discount::Fixed(value) => value,
        }
    }

    /// Amount taken off the given subtotal.
    ///
    /// A fixed discount larger than the subtotal is clamped to the
    /// subtotal, so the cart total never goes negative.
    #[must_use]
    pub fn amount(&self, subtotal: Decimal) -> Decimal {
        match *self {
            Discount::None => Decimal::ZERO,
            Discount::Percentage(value) => Percentage::from(value / Decimal::ONE_HUNDRED) * subtotal,
            Discount::Fixed(value) => value.min(subtotal),
        }
    }

    /// The share of the discount carried by one line, given its
    /// pre-discount total and the cart subtotal.
    ///
    /// Percentage discounts apply uniformly; fixed discounts are allocated
    /// proportionally to the line's share of the subtotal. A zero subtotal
    /// allocates nothing.
    #[must_use]
    pub fn allocate(&self, line_pretotal: Decimal, subtotal: Decimal) -> Decimal {
        match *self {
            Discount::None => Decimal::ZERO,
            Discount::Percentage(value) => Percentage::from(value / Decimal::ONE_HUNDRED) * line_pretotal,
            Discount::Fixed(value) => {
                if subtotal.is_zero() {
                    Decimal::ZERO
                } else {
                    // Multiply before dividing so exact shares stay exact.
                    line_pretotal * value.min(subtotal) / subtotal
                }
            }
        }
    }
}

/// Rounds a currency amount to 2 decimal places, midpoints away from zero,
/// the way ledger rows are persisted.
#[must_use]
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_negative_values() {
        let percentage = Discount::Percentage(Decimal::from(-5));
        let fixed = Discount::Fixed(Decimal::from(-1));

        assert!(matches!(
            percentage.validate(),
            Err(DiscountError::Negative(_))
        ));
        assert!(matches!(fixed.validate(), Err(DiscountError::Negative(_))));
    }

    #[test]
    fn validate_rejects_percentage_above_hundred() {
        let discount = Discount::Percentage(Decimal::from(150));

        assert_eq!(
            discount.validate(),
            Err(DiscountError::PercentOutOfRange(Decimal::from(150)))
        );
    }

    #[test]
    fn validate_accepts_boundary_values() {
        assert_eq!(Discount::None.validate(), Ok(()));
        assert_eq!(Discount::Percentage(Decimal::ZERO).validate(), Ok(()));
        assert_eq!(Discount::Percentage(Decimal::ONE_HUNDRED).validate(), Ok(()));
        assert_eq!(Discount::Fixed(Decimal::ZERO).validate(), Ok(()));
    }

    #[test]
    fn percentage_amount_is_fraction_of_subtotal() {
        let discount = Discount::Percentage(Decimal::from(10));

        let amount = discount.amount(Decimal::from(200));

        assert_eq!(amount, Decimal::from(20));
    }

    #[test]
    fn fixed_amount_is_clamped_to_subtotal() {
        let discount = Discount::Fixed(Decimal::from(50));

        assert_eq!(discount.amount(Decimal::from(200)), Decimal::from(50));
        assert_eq!(discount.amount(Decimal::from(30)), Decimal::from(30));
    }

    #[test]
    fn fixed_allocation_is_proportional_to_line_share() {
        // Two lines with pretotals 100 and 200, fixed discount 30:
        // allocations are 10 and 20.
        let discount = Discount::Fixed(Decimal::from(30));
        let subtotal = Decimal::from(300);

        assert_eq!(
            discount.allocate(Decimal::from(100), subtotal),
            Decimal::from(10)
        );
        assert_eq!(
            discount.allocate(Decimal::from(200), subtotal),
            Decimal::from(20)
        );
    }

    #[test]
    fn fixed_allocation_with_zero_subtotal_is_zero() {
        let discount = Discount::Fixed(Decimal::from(30));

        assert_eq!(
            discount.allocate(Decimal::ZERO, Decimal::ZERO),
            Decimal::ZERO
        );
    }

    #[test]
    fn round_currency_rounds_midpoints_away_from_zero() {
        assert_eq!(round_currency(Decimal::new(12345, 3)), Decimal::new(1235, 2));
        assert_eq!(round_currency(Decimal::new(1005, 3)), Decimal::new(101, 2));
    }
}
