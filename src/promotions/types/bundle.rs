//! Bundle Promotion
//!
//! Every complete group of `bundle_quantity` eligible units costs `fixed_price`. The most
//! expensive eligible units are bundled first.

use rusty_money::{Money, iso::Currency};
use tracing::debug;

use crate::{
    items::{ServiceUnit, sort_most_expensive_first},
    pricing::{times, total_price, zero},
    promotions::{EligibleServices, PromotionError},
};

/// An "N units for a fixed price" promotion.
#[derive(Debug, Clone, PartialEq)]
pub struct BundlePromotion<'a> {
    bundle_quantity: usize,
    fixed_price: Money<'a, Currency>,
    eligible: EligibleServices,
}

impl<'a> BundlePromotion<'a> {
    /// Create a new bundle promotion.
    ///
    /// # Errors
    ///
    /// Returns a [`PromotionError`] if `bundle_quantity` is zero or `fixed_price` is negative.
    pub fn new(
        bundle_quantity: usize,
        fixed_price: Money<'a, Currency>,
        eligible: EligibleServices,
    ) -> Result<Self, PromotionError> {
        if bundle_quantity == 0 {
            return Err(PromotionError::InvalidBundleQuantity);
        }

        if fixed_price.to_minor_units() < 0 {
            return Err(PromotionError::NegativeBundlePrice);
        }

        Ok(Self {
            bundle_quantity,
            fixed_price,
            eligible,
        })
    }

    /// Units per bundle.
    pub fn bundle_quantity(&self) -> usize {
        self.bundle_quantity
    }

    /// Price of one bundle.
    pub fn fixed_price(&self) -> Money<'a, Currency> {
        self.fixed_price
    }

    /// Eligible services.
    pub fn eligible(&self) -> &EligibleServices {
        &self.eligible
    }

    /// Standard price of the bundled units minus the bundle price, floored at zero.
    ///
    /// # Errors
    ///
    /// Returns a [`PromotionError`] if prices are in different currencies or overflow.
    pub fn discount(
        &self,
        units: &[ServiceUnit<'a>],
        currency: &'a Currency,
    ) -> Result<Money<'a, Currency>, PromotionError> {
        let mut eligible = self.eligible.filter(units);
        let bundles = eligible.len() / self.bundle_quantity;

        if bundles == 0 {
            return Ok(zero(currency));
        }

        sort_most_expensive_first(&mut eligible);
        eligible.truncate(bundles * self.bundle_quantity);

        let standard_price = total_price(&eligible, currency)?;
        let bundle_price = times(self.fixed_price, bundles)?;

        let saving = standard_price.sub(bundle_price)?;

        // A bundle priced above its units is never a surcharge.
        let discount = if saving.to_minor_units() < 0 {
            zero(currency)
        } else {
            saving
        };

        debug!(
            bundles,
            standard_price = standard_price.to_minor_units(),
            discount = discount.to_minor_units(),
            "bundle evaluated"
        );

        Ok(discount)
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{GBP, USD};
    use testresult::TestResult;

    use super::*;

    fn units(prices: &[i64]) -> Vec<ServiceUnit<'static>> {
        prices
            .iter()
            .enumerate()
            .map(|(line, minor)| ServiceUnit::new(line, "shirt", Money::from_minor(*minor, GBP)))
            .collect()
    }

    fn five_for_twenty() -> Result<BundlePromotion<'static>, PromotionError> {
        BundlePromotion::new(
            5,
            Money::from_minor(2000, GBP),
            EligibleServices::new(["shirt"])?,
        )
    }

    #[test]
    fn rejects_invalid_bundles() -> TestResult {
        let eligible = EligibleServices::new(["shirt"])?;

        assert_eq!(
            BundlePromotion::new(0, Money::from_minor(100, GBP), eligible.clone()),
            Err(PromotionError::InvalidBundleQuantity)
        );
        assert_eq!(
            BundlePromotion::new(2, Money::from_minor(-1, GBP), eligible),
            Err(PromotionError::NegativeBundlePrice)
        );

        Ok(())
    }

    #[test]
    fn single_bundle_discount() -> TestResult {
        let promotion = five_for_twenty()?;
        let units = units(&[1000, 800, 600, 500, 400]);

        assert_eq!(promotion.discount(&units, GBP)?, Money::from_minor(1300, GBP));

        Ok(())
    }

    #[test]
    fn bundles_take_the_most_expensive_units() -> TestResult {
        let promotion = BundlePromotion::new(
            2,
            Money::from_minor(1000, GBP),
            EligibleServices::new(["shirt"])?,
        )?;

        let units = units(&[300, 900, 200, 800, 100]);

        // 900 + 800 + 300 + 200 bundled into two bundles at 10.00 each
        assert_eq!(promotion.discount(&units, GBP)?, Money::from_minor(200, GBP));

        Ok(())
    }

    #[test]
    fn bundle_dearer_than_its_units_gives_nothing() -> TestResult {
        let promotion = five_for_twenty()?;
        let units = units(&[100, 100, 100, 100, 100]);

        assert_eq!(promotion.discount(&units, GBP)?, Money::from_minor(0, GBP));

        Ok(())
    }

    #[test]
    fn incomplete_bundles_give_nothing() -> TestResult {
        let promotion = five_for_twenty()?;
        let units = units(&[1000, 800, 600, 500]);

        assert_eq!(promotion.discount(&units, GBP)?, Money::from_minor(0, GBP));

        Ok(())
    }

    #[test]
    fn currency_mismatch_is_an_error() -> TestResult {
        let promotion = BundlePromotion::new(
            1,
            Money::from_minor(100, USD),
            EligibleServices::new(["shirt"])?,
        )?;

        let units = units(&[1000]);

        assert!(matches!(
            promotion.discount(&units, GBP),
            Err(PromotionError::Money(_))
        ));

        Ok(())
    }
}
