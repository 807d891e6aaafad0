//! Promotions
//!
//! Store-defined offers that discount eligible service units in a cart. At most one promotion
//! ever applies to an order; see [`evaluator`].

use rustc_hash::FxHashSet;
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::{
    items::ServiceUnit,
    pricing::TotalPriceError,
    promotions::types::{BogoPromotion, BundlePromotion},
    uuids::TypedUuid,
};

pub mod evaluator;
pub mod types;

/// Promotion UUID
pub type PromotionUuid = TypedUuid<Promotion<'static>>;

/// Errors related to promotion construction or evaluation.
#[derive(Debug, Error, PartialEq)]
pub enum PromotionError {
    /// A BOGO promotion must require at least one unit to be bought.
    #[error("buy quantity must be at least 1")]
    InvalidBuyQuantity,

    /// A BOGO promotion must give away between 1 and `buy_quantity` units.
    #[error("free quantity must be between 1 and the buy quantity ({buy}), got {free}")]
    InvalidFreeQuantity {
        /// Units that must be bought
        buy: usize,
        /// Units given away
        free: usize,
    },

    /// A bundle must contain at least one unit.
    #[error("bundle quantity must be at least 1")]
    InvalidBundleQuantity,

    /// A bundle price cannot be negative.
    #[error("bundle price cannot be negative")]
    NegativeBundlePrice,

    /// No eligible services were provided.
    #[error("promotion must name at least one eligible service")]
    NoEligibleServices,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// Errors bubbled up from total price calculation.
    #[error(transparent)]
    TotalPrice(#[from] TotalPriceError),
}

/// The allow-list of service names a promotion applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibleServices(FxHashSet<String>);

impl EligibleServices {
    /// Build an allow-list from service names.
    ///
    /// # Errors
    ///
    /// Returns `PromotionError::NoEligibleServices` if no non-blank names are given.
    pub fn new<I, S>(names: I) -> Result<Self, PromotionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: FxHashSet<String> = names
            .into_iter()
            .map(Into::into)
            .filter(|name: &String| !name.trim().is_empty())
            .collect();

        if names.is_empty() {
            return Err(PromotionError::NoEligibleServices);
        }

        Ok(Self(names))
    }

    /// Whether the service is on the list.
    pub fn contains(&self, service: &str) -> bool {
        self.0.contains(service)
    }

    /// The eligible subset of a unit pool, in cart order.
    pub fn filter<'a>(&self, units: &[ServiceUnit<'a>]) -> Vec<ServiceUnit<'a>> {
        units
            .iter()
            .filter(|unit| self.contains(unit.service()))
            .copied()
            .collect()
    }
}

/// Promotion variants.
#[derive(Debug, Clone)]
pub enum PromotionKind<'a> {
    /// Buy X, get Y free
    Bogo(BogoPromotion),

    /// N units for a fixed price
    Bundle(BundlePromotion<'a>),
}

/// A store promotion.
#[derive(Debug, Clone)]
pub struct Promotion<'a> {
    uuid: PromotionUuid,
    name: String,
    active: bool,
    kind: PromotionKind<'a>,
}

impl<'a> Promotion<'a> {
    /// Create a new, active promotion.
    pub fn new(uuid: PromotionUuid, name: impl Into<String>, kind: PromotionKind<'a>) -> Self {
        Self {
            uuid,
            name: name.into(),
            active: true,
            kind,
        }
    }

    /// Set whether the promotion is active.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Promotion identity.
    pub fn uuid(&self) -> PromotionUuid {
        self.uuid
    }

    /// Promotion name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether staff have switched the promotion on.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Promotion variant.
    pub fn kind(&self) -> &PromotionKind<'a> {
        &self.kind
    }

    /// Return whether this promotion _might_ apply to the given units.
    pub fn is_applicable(&self, units: &[ServiceUnit<'_>]) -> bool {
        let eligible = match &self.kind {
            PromotionKind::Bogo(bogo) => bogo.eligible(),
            PromotionKind::Bundle(bundle) => bundle.eligible(),
        };

        units.iter().any(|unit| eligible.contains(unit.service()))
    }

    /// Discount this promotion would give on the unit pool.
    ///
    /// # Errors
    ///
    /// Returns a [`PromotionError`] on money arithmetic or currency mismatch errors.
    pub fn discount(
        &self,
        units: &[ServiceUnit<'a>],
        currency: &'a Currency,
    ) -> Result<Money<'a, Currency>, PromotionError> {
        match &self.kind {
            PromotionKind::Bogo(bogo) => bogo.discount(units, currency),
            PromotionKind::Bundle(bundle) => bundle.discount(units, currency),
        }
    }
}
