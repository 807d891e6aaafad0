//! Price and discount strings used in scenario files.

use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::{
    Money,
    iso::{self, Currency},
};

use crate::{discounts::codes::DiscountCodeKind, fixtures::FixtureError, pricing::from_major};

/// Parse a price such as `"2.50 GBP"`, rounding to the currency's minor unit.
///
/// # Errors
///
/// Returns `FixtureError::InvalidPrice` unless the string is `AMOUNT CURRENCY`, or
/// `FixtureError::UnknownCurrency` for a code that is not an ISO currency.
pub fn parse_price(s: &str) -> Result<Money<'static, Currency>, FixtureError> {
    let mut parts = s.split_whitespace();

    let (Some(amount), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let currency = iso::find(code).ok_or_else(|| FixtureError::UnknownCurrency(code.to_string()))?;

    from_major(amount, currency, RoundingStrategy::MidpointNearestEven)
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))
}

/// Parse a price and require it to be in `currency`.
///
/// # Errors
///
/// Returns `FixtureError::CurrencyMismatch` if the price is in another currency, or any error
/// [`parse_price`] returns.
pub fn parse_price_in(
    s: &str,
    currency: &'static Currency,
) -> Result<Money<'static, Currency>, FixtureError> {
    let price = parse_price(s)?;

    if price.currency() != currency {
        return Err(FixtureError::CurrencyMismatch(
            currency.iso_alpha_code.to_string(),
            price.currency().iso_alpha_code.to_string(),
        ));
    }

    Ok(price)
}

/// Parse a code discount: `"15%"` for a percentage, `"5.00 GBP"` for a fixed amount.
///
/// # Errors
///
/// Returns `FixtureError::InvalidPercentage` for a malformed or out of range percentage, or
/// any error [`parse_price_in`] returns for a fixed amount.
pub fn parse_code_discount(
    s: &str,
    currency: &'static Currency,
) -> Result<DiscountCodeKind<'static>, FixtureError> {
    let trimmed = s.trim();

    let Some(points) = trimmed.strip_suffix('%') else {
        return Ok(DiscountCodeKind::FixedAmount(parse_price_in(trimmed, currency)?));
    };

    let points = points
        .trim()
        .parse::<f64>()
        .map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))?;

    DiscountCodeKind::percentage_points(points)
        .map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))
}
