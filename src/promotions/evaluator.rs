//! Promotion Evaluator
//!
//! Promotions are tried in their stored order and the first one that produces a discount is
//! applied. Promotions never stack; the remaining ones are only checked so the customer can be
//! told another offer would also have qualified.

use rusty_money::{Money, iso::Currency};
use tracing::debug;

use crate::{
    items::ServiceUnit,
    pricing::zero,
    promotions::{Promotion, PromotionError, PromotionUuid},
};

/// The promotion chosen for a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedPromotion {
    /// Promotion identity
    pub uuid: PromotionUuid,

    /// Promotion name, as shown to the customer
    pub name: String,
}

/// Result of evaluating promotions against a cart.
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionOutcome<'a> {
    /// The applied promotion, if any
    pub applied: Option<AppliedPromotion>,

    /// Discount given by the applied promotion
    pub discount: Money<'a, Currency>,

    /// Whether another promotion would also have discounted this cart
    pub has_additional_qualifying_promotions: bool,
}

impl<'a> PromotionOutcome<'a> {
    /// No promotion applied.
    pub fn none(currency: &'a Currency) -> Self {
        Self {
            applied: None,
            discount: zero(currency),
            has_additional_qualifying_promotions: false,
        }
    }

    /// Whether a promotion was applied.
    pub fn is_applied(&self) -> bool {
        self.applied.is_some()
    }
}

/// Evaluate the active promotions against a unit pool.
///
/// # Errors
///
/// Returns a [`PromotionError`] if any promotion's arithmetic fails, for example when a bundle
/// price is in a different currency to the cart.
pub fn evaluate<'a>(
    units: &[ServiceUnit<'a>],
    currency: &'a Currency,
    promotions: &[Promotion<'a>],
) -> Result<PromotionOutcome<'a>, PromotionError> {
    let mut outcome = PromotionOutcome::none(currency);

    for promotion in promotions.iter().filter(|promotion| promotion.is_active()) {
        if !promotion.is_applicable(units) {
            continue;
        }

        let discount = promotion.discount(units, currency)?;

        if discount.to_minor_units() <= 0 {
            continue;
        }

        if outcome.is_applied() {
            debug!(
                promotion = %promotion.uuid(),
                "additional promotion qualifies but cannot be combined"
            );

            outcome.has_additional_qualifying_promotions = true;

            break;
        }

        debug!(
            promotion = %promotion.uuid(),
            name = promotion.name(),
            discount = discount.to_minor_units(),
            "promotion applied"
        );

        outcome.applied = Some(AppliedPromotion {
            uuid: promotion.uuid(),
            name: promotion.name().to_string(),
        });
        outcome.discount = discount;
    }

    Ok(outcome)
}
