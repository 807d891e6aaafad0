//! Services
//!
//! The garment-care services a store sells ("shirt", "two-piece suit", "duvet") and their
//! unit prices. Cart lines may only reference services listed here.

use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

/// Errors related to catalogue construction.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    /// A service price is in a different currency to the catalogue.
    #[error("service {0} is priced in {1}, but the catalogue uses {2}")]
    CurrencyMismatch(String, &'static str, &'static str),

    /// A service price is below zero.
    #[error("service {0} has a negative price")]
    NegativePrice(String),

    /// A service was listed without a name.
    #[error("service names cannot be blank")]
    BlankName,
}

/// The services offered by a store.
#[derive(Debug, Clone)]
pub struct ServiceCatalog<'a> {
    services: FxHashMap<String, Money<'a, Currency>>,
    currency: &'a Currency,
}

impl<'a> ServiceCatalog<'a> {
    /// Create an empty catalogue.
    pub fn new(currency: &'a Currency) -> Self {
        Self {
            services: FxHashMap::default(),
            currency,
        }
    }

    /// Add or replace a service.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the name is blank, the price is negative, or the price is
    /// not in the catalogue currency.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        price: Money<'a, Currency>,
    ) -> Result<&mut Self, CatalogError> {
        let name = name.into();

        if name.trim().is_empty() {
            return Err(CatalogError::BlankName);
        }

        if price.currency() != self.currency {
            return Err(CatalogError::CurrencyMismatch(
                name,
                price.currency().iso_alpha_code,
                self.currency.iso_alpha_code,
            ));
        }

        if price.to_minor_units() < 0 {
            return Err(CatalogError::NegativePrice(name));
        }

        self.services.insert(name, price);

        Ok(self)
    }

    /// Unit price of a service, if the store offers it.
    pub fn price_of(&self, name: &str) -> Option<Money<'a, Currency>> {
        self.services.get(name).copied()
    }

    /// Whether the store offers a service.
    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// Catalogue currency.
    pub fn currency(&self) -> &'a Currency {
        self.currency
    }

    /// Number of services offered.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether the catalogue is empty.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn insert_and_look_up_services() -> TestResult {
        let mut catalog = ServiceCatalog::new(iso::GBP);

        catalog
            .insert("shirt", Money::from_minor(250, iso::GBP))?
            .insert("duvet", Money::from_minor(1800, iso::GBP))?;

        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("shirt"));
        assert_eq!(
            catalog.price_of("duvet"),
            Some(Money::from_minor(1800, iso::GBP))
        );
        assert_eq!(catalog.price_of("sofa cover"), None);

        Ok(())
    }

    #[test]
    fn insert_rejects_other_currencies() {
        let mut catalog = ServiceCatalog::new(iso::GBP);

        let result = catalog
            .insert("shirt", Money::from_minor(250, iso::EUR))
            .map(|_catalog| ());

        assert_eq!(
            result,
            Err(CatalogError::CurrencyMismatch(
                "shirt".to_string(),
                iso::EUR.iso_alpha_code,
                iso::GBP.iso_alpha_code
            ))
        );
    }

    #[test]
    fn insert_rejects_negative_prices_and_blank_names() {
        let mut catalog = ServiceCatalog::new(iso::GBP);

        assert!(matches!(
            catalog.insert("shirt", Money::from_minor(-1, iso::GBP)),
            Err(CatalogError::NegativePrice(_))
        ));
        assert!(matches!(
            catalog.insert("  ", Money::from_minor(100, iso::GBP)),
            Err(CatalogError::BlankName)
        ));
        assert!(catalog.is_empty());
    }
}
