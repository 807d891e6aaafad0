//! Promotion Fixtures

use rusty_money::iso::Currency;
use serde::Deserialize;

use crate::{
    fixtures::{FixtureError, prices::parse_price_in},
    promotions::{
        EligibleServices, Promotion, PromotionKind, PromotionUuid,
        types::{BogoPromotion, BundlePromotion},
    },
};

/// A promotion as written in a scenario file.
#[derive(Debug, Clone, Deserialize)]
pub struct PromotionFixture {
    /// Promotion name
    pub name: String,

    /// Services the promotion applies to
    pub services: Vec<String>,

    /// Whether customers can receive the promotion
    #[serde(default = "active_by_default")]
    pub active: bool,

    /// The offer itself
    #[serde(flatten)]
    pub offer: OfferFixture,
}

/// The offer part of a promotion fixture, tagged by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OfferFixture {
    /// Buy `buy`, get the cheapest `free` of them free
    Bogo {
        /// Units per qualifying set
        buy: usize,
        /// Units given away per set
        free: usize,
    },

    /// `quantity` units for a fixed `price`
    Bundle {
        /// Units per bundle
        quantity: usize,
        /// Bundle price, e.g. "20.00 GBP"
        price: String,
    },
}

fn active_by_default() -> bool {
    true
}

impl PromotionFixture {
    /// Build the promotion, pricing bundles in `currency`.
    ///
    /// # Errors
    ///
    /// Returns a [`FixtureError`] if the offer is malformed or a bundle price is in another
    /// currency.
    pub fn into_promotion(
        self,
        currency: &'static Currency,
    ) -> Result<Promotion<'static>, FixtureError> {
        let eligible = EligibleServices::new(self.services)?;

        let kind = match self.offer {
            OfferFixture::Bogo { buy, free } => {
                PromotionKind::Bogo(BogoPromotion::new(buy, free, eligible)?)
            }
            OfferFixture::Bundle { quantity, price } => PromotionKind::Bundle(BundlePromotion::new(
                quantity,
                parse_price_in(&price, currency)?,
                eligible,
            )?),
        };

        Ok(Promotion::new(PromotionUuid::new(), self.name, kind).with_active(self.active))
    }
}
