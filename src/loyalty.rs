//! Loyalty Ledger
//!
//! Customers earn points on what they pay and may redeem a balance against a later order.
//! Redemption is all-or-nothing: either the balance qualifies and its value (capped at the order
//! total) comes off, or nothing does.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;
use tracing::debug;

use crate::{
    customers::CustomerUuid,
    pricing::{TotalPriceError, clamp_non_negative, from_major, min_money, to_major, zero},
    settings::{LoyaltySettings, RedemptionPolicy},
    stores::StoreUuid,
};

/// Errors related to loyalty arithmetic.
#[derive(Debug, Error, PartialEq)]
pub enum LoyaltyError {
    /// A points calculation no longer fits the balance type.
    #[error("loyalty points calculation overflowed")]
    Overflow,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// Errors bubbled up from minor unit conversions.
    #[error(transparent)]
    TotalPrice(#[from] TotalPriceError),
}

/// Why a requested redemption did not happen.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum LoyaltyRejection {
    /// The balance is below the store's minimum.
    #[error("you need at least {minimum} points to redeem, you have {balance}")]
    InsufficientBalance {
        /// Current balance
        balance: i64,
        /// Store minimum
        minimum: i64,
    },

    /// The store does not run a loyalty programme.
    #[error("this store does not offer loyalty points")]
    Disabled,
}

/// A customer's points balance with one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoyaltyAccount {
    /// Account holder
    pub customer: CustomerUuid,
    /// Store issuing the points
    pub store: StoreUuid,
    /// Current balance
    pub points_balance: i64,
}

impl LoyaltyAccount {
    /// An empty account.
    pub fn new(customer: CustomerUuid, store: StoreUuid) -> Self {
        Self {
            customer,
            store,
            points_balance: 0,
        }
    }
}

/// Result of applying the ledger to an order.
#[derive(Debug, Clone, PartialEq)]
pub struct LoyaltyOutcome<'a> {
    /// Amount taken off the order by redeemed points
    pub points_discount: Money<'a, Currency>,

    /// Points removed from the balance
    pub points_redeemed: i64,

    /// Points earned on this order
    pub points_earned: i64,

    /// Balance once the order is committed
    pub new_balance: i64,

    /// Why a requested redemption was refused
    pub rejection: Option<LoyaltyRejection>,
}

impl LoyaltyOutcome<'_> {
    /// Whether points were redeemed on this order.
    pub fn is_redeemed(&self) -> bool {
        self.points_redeemed != 0 || self.points_discount.to_minor_units() > 0
    }
}

/// Apply the loyalty ledger to an order total.
///
/// `total_before_points` is the order total after promotion or code discounts and before the
/// platform fee. Points are earned on what remains once any redemption is taken off.
///
/// # Errors
///
/// Returns a [`LoyaltyError`] if a points or money calculation overflows.
pub fn apply<'a>(
    balance: i64,
    total_before_points: Money<'a, Currency>,
    redeem_requested: bool,
    settings: &LoyaltySettings,
) -> Result<LoyaltyOutcome<'a>, LoyaltyError> {
    let currency = total_before_points.currency();

    if !settings.enabled {
        return Ok(LoyaltyOutcome {
            points_discount: zero(currency),
            points_redeemed: 0,
            points_earned: 0,
            new_balance: balance,
            rejection: redeem_requested.then_some(LoyaltyRejection::Disabled),
        });
    }

    let total_before_points = clamp_non_negative(total_before_points, "loyalty.total_before_points");

    let redeem = redeem_requested && balance >= settings.minimum_redeemable;

    let rejection = (redeem_requested && !redeem).then_some(LoyaltyRejection::InsufficientBalance {
        balance,
        minimum: settings.minimum_redeemable,
    });

    let points_discount = if redeem {
        min_money(balance_value(balance, settings, currency)?, total_before_points)
    } else {
        zero(currency)
    };

    let total_after_points = clamp_non_negative(
        total_before_points.sub(points_discount)?,
        "loyalty.total_after_points",
    );

    let points_earned = points_earned(total_after_points, settings)?;

    let (points_redeemed, new_balance) = if redeem {
        match settings.redemption_policy {
            RedemptionPolicy::ConsumeBalance => (balance, points_earned),
            RedemptionPolicy::CarryForward => {
                let redeemed = points_needed(points_discount, settings)?.min(balance.max(0));

                let new_balance = balance
                    .checked_sub(redeemed)
                    .and_then(|remaining| remaining.checked_add(points_earned))
                    .ok_or(LoyaltyError::Overflow)?;

                (redeemed, new_balance)
            }
        }
    } else {
        let new_balance = balance
            .checked_add(points_earned)
            .ok_or(LoyaltyError::Overflow)?;

        (0, new_balance)
    };

    debug!(
        balance,
        points_discount = points_discount.to_minor_units(),
        points_redeemed,
        points_earned,
        new_balance,
        "loyalty applied"
    );

    Ok(LoyaltyOutcome {
        points_discount,
        points_redeemed,
        points_earned,
        new_balance,
        rejection,
    })
}

/// Monetary value of a balance, rounded down to the minor unit.
fn balance_value<'a>(
    balance: i64,
    settings: &LoyaltySettings,
    currency: &'a Currency,
) -> Result<Money<'a, Currency>, LoyaltyError> {
    let value = Decimal::from(balance.max(0))
        .checked_mul(settings.point_value)
        .ok_or(LoyaltyError::Overflow)?;

    Ok(from_major(value, currency, RoundingStrategy::ToZero)?)
}

/// `floor(total × points_per_currency_unit)`, with the total in major units.
fn points_earned(total: Money<'_, Currency>, settings: &LoyaltySettings) -> Result<i64, LoyaltyError> {
    to_major(&total)?
        .checked_mul(settings.points_per_currency_unit)
        .ok_or(LoyaltyError::Overflow)?
        .floor()
        .to_i64()
        .ok_or(LoyaltyError::Overflow)
}

/// Smallest number of points worth at least `discount`.
fn points_needed(discount: Money<'_, Currency>, settings: &LoyaltySettings) -> Result<i64, LoyaltyError> {
    if settings.point_value.is_zero() {
        return Ok(0);
    }

    to_major(&discount)?
        .checked_div(settings.point_value)
        .ok_or(LoyaltyError::Overflow)?
        .ceil()
        .to_i64()
        .ok_or(LoyaltyError::Overflow)
}
