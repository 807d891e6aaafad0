//! Discounts
//!
//! Customer-entered discount codes and the percentage arithmetic they share with the rest of
//! the pricing layer.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::MoneyError;
use thiserror::Error;

pub mod codes;
pub mod validator;

/// Errors specific to discount code calculations.
#[derive(Debug, Error, PartialEq)]
pub enum DiscountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// A percentage code must be between 0% and 100%.
    #[error("percentage discounts must be between 0 and 100 percent")]
    PercentageOutOfRange,

    /// A fixed-amount code cannot be negative.
    #[error("fixed discount amounts cannot be negative")]
    NegativeAmount,

    /// A code was created without any text.
    #[error("discount codes cannot be blank")]
    BlankCode,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Calculate the discount amount in minor units based on a percentage and a minor unit amount.
///
/// Rounds half away from zero to the nearest minor unit.
///
/// # Errors
///
/// Returns an error if:
/// - The percentage calculation overflows or cannot be safely represented (`DiscountError::PercentConversion`).
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, DiscountError> {
    let minor = Decimal::from_i64(minor).ok_or(DiscountError::PercentConversion)?;

    ((*percent) * Decimal::ONE) // decimal_percentage doesn't expose the underlying Decimal
        .checked_mul(minor)
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::PercentConversion)
}

/// Whether a percentage lies between 0% and 100% inclusive.
pub fn is_valid_percentage(percent: &Percentage) -> bool {
    let fraction = (*percent) * Decimal::ONE;

    fraction >= Decimal::ZERO && fraction <= Decimal::ONE
}
