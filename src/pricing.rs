//! Prices
//!
//! Minor-unit money helpers shared by the cart, promotion, loyalty and checkout code.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;
use tracing::error;

use crate::items::ServiceUnit;

/// Errors that can occur while calculating total price.
#[derive(Debug, Error, PartialEq)]
pub enum TotalPriceError {
    /// A minor unit total no longer fits in an `i64`.
    #[error("price total overflowed")]
    Overflow,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Calculates the total price of a list of units in the given currency.
///
/// # Errors
///
/// - [`TotalPriceError::Money`]: a unit is priced in a different currency.
pub fn total_price<'a>(
    units: &[ServiceUnit<'a>],
    currency: &'a Currency,
) -> Result<Money<'a, Currency>, TotalPriceError> {
    let total = units
        .iter()
        .try_fold(Money::from_minor(0, currency), |acc, unit| {
            acc.add(*unit.price())
        })?;

    Ok(total)
}

/// Multiply a price by a count, staying in minor units.
///
/// # Errors
///
/// Returns [`TotalPriceError::Overflow`] if the product does not fit in an `i64`.
pub fn times<'a>(
    price: Money<'a, Currency>,
    count: usize,
) -> Result<Money<'a, Currency>, TotalPriceError> {
    let count = i64::try_from(count).map_err(|_err| TotalPriceError::Overflow)?;

    let minor = price
        .to_minor_units()
        .checked_mul(count)
        .ok_or(TotalPriceError::Overflow)?;

    Ok(Money::from_minor(minor, price.currency()))
}

/// Zero in the given currency.
pub fn zero(currency: &Currency) -> Money<'_, Currency> {
    Money::from_minor(0, currency)
}

/// The smaller of two amounts.
pub fn min_money<'a>(a: Money<'a, Currency>, b: Money<'a, Currency>) -> Money<'a, Currency> {
    if b.to_minor_units() < a.to_minor_units() {
        b
    } else {
        a
    }
}

/// Clamp a negative amount to zero.
///
/// A negative amount anywhere in a price breakdown is a defect in the inputs or the
/// arithmetic, so it is logged together with the stage that produced it.
pub fn clamp_non_negative<'a>(amount: Money<'a, Currency>, stage: &'static str) -> Money<'a, Currency> {
    if amount.to_minor_units() < 0 {
        error!(
            stage,
            minor_units = amount.to_minor_units(),
            currency = amount.currency().iso_alpha_code,
            "negative amount clamped to zero"
        );

        return zero(amount.currency());
    }

    amount
}

/// Express an amount in major units (`1234` pence becomes `12.34`).
///
/// # Errors
///
/// Returns [`TotalPriceError::Overflow`] if the currency exponent is not a valid decimal scale.
pub fn to_major(amount: &Money<'_, Currency>) -> Result<Decimal, TotalPriceError> {
    Decimal::try_new(amount.to_minor_units(), amount.currency().exponent)
        .map_err(|_err| TotalPriceError::Overflow)
}

/// Convert a major unit amount into money, rounding to the minor unit with `strategy`.
///
/// # Errors
///
/// Returns [`TotalPriceError::Overflow`] if the amount cannot be represented in minor units.
pub fn from_major(
    amount: Decimal,
    currency: &Currency,
    strategy: RoundingStrategy,
) -> Result<Money<'_, Currency>, TotalPriceError> {
    let minor_unit =
        Decimal::try_new(1, currency.exponent).map_err(|_err| TotalPriceError::Overflow)?;

    let minor = amount
        .checked_div(minor_unit)
        .ok_or(TotalPriceError::Overflow)?
        .round_dp_with_strategy(0, strategy)
        .to_i64()
        .ok_or(TotalPriceError::Overflow)?;

    Ok(Money::from_minor(minor, currency))
}
