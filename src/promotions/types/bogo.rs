//! Buy X, Get Y Free
//!
//! For every `buy_quantity` eligible units in the cart, `free_quantity` units are free. The
//! free units are always the cheapest eligible units.

use rusty_money::{Money, iso::Currency};
use tracing::debug;

use crate::{
    items::{ServiceUnit, sort_cheapest_first},
    pricing::{total_price, zero},
    promotions::{EligibleServices, PromotionError},
};

/// A "buy X, get Y free" promotion.
#[derive(Debug, Clone, PartialEq)]
pub struct BogoPromotion {
    buy_quantity: usize,
    free_quantity: usize,
    eligible: EligibleServices,
}

impl BogoPromotion {
    /// Create a new BOGO promotion.
    ///
    /// # Errors
    ///
    /// Returns a [`PromotionError`] unless `buy_quantity >= free_quantity >= 1`.
    pub fn new(
        buy_quantity: usize,
        free_quantity: usize,
        eligible: EligibleServices,
    ) -> Result<Self, PromotionError> {
        if buy_quantity == 0 {
            return Err(PromotionError::InvalidBuyQuantity);
        }

        if free_quantity == 0 || free_quantity > buy_quantity {
            return Err(PromotionError::InvalidFreeQuantity {
                buy: buy_quantity,
                free: free_quantity,
            });
        }

        Ok(Self {
            buy_quantity,
            free_quantity,
            eligible,
        })
    }

    /// Units that make up one qualifying set.
    pub fn buy_quantity(&self) -> usize {
        self.buy_quantity
    }

    /// Units given away per qualifying set.
    pub fn free_quantity(&self) -> usize {
        self.free_quantity
    }

    /// Eligible services.
    pub fn eligible(&self) -> &EligibleServices {
        &self.eligible
    }

    /// Sum of the prices of the free units.
    ///
    /// # Errors
    ///
    /// Returns a [`PromotionError`] if a unit is priced in another currency.
    pub fn discount<'a>(
        &self,
        units: &[ServiceUnit<'a>],
        currency: &'a Currency,
    ) -> Result<Money<'a, Currency>, PromotionError> {
        let mut eligible = self.eligible.filter(units);
        let sets = eligible.len() / self.buy_quantity;

        if sets == 0 {
            return Ok(zero(currency));
        }

        sort_cheapest_first(&mut eligible);

        let free_units = sets
            .saturating_mul(self.free_quantity)
            .min(eligible.len());

        eligible.truncate(free_units);

        let discount = total_price(&eligible, currency)?;

        debug!(
            sets,
            free_units,
            discount = discount.to_minor_units(),
            "bogo evaluated"
        );

        Ok(discount)
    }
}
