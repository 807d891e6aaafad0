//! Fixtures
//!
//! Checkout scenarios described in YAML: store settings, a service list, a cart, the store's
//! promotions and codes, and the customer's loyalty position.

use std::{
    fs,
    path::{Path, PathBuf},
};

use jiff::Timestamp;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::{
    cart::{Cart, CartError},
    checkout::{
        CodeApplication, LoyaltyChoice, OrderKind, PriceBreakdown, PricingError, PricingRequest,
        price,
    },
    customers::{Customer, CustomerUuid},
    discounts::{
        DiscountError,
        codes::DiscountCode,
        validator::{CodeRequest, CustomerHistory},
    },
    fixtures::{codes::CodeFixture, prices::parse_price_in, promotions::PromotionFixture},
    orders::repository::{InMemoryRepository, RepositoryError},
    promotions::{Promotion, PromotionError},
    services::{CatalogError, ServiceCatalog},
    settings::{SettingsError, StoreSettings},
    stores::{Store, StoreUuid},
};

pub mod codes;
pub mod prices;
pub mod promotions;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// A price is not in the store currency
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// Invalid store settings
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Invalid service list
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Invalid cart line
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Invalid promotion
    #[error(transparent)]
    Promotion(#[from] PromotionError),

    /// Invalid discount code
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// The scenario could not be priced
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// The scenario could not be seeded
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Deserialize)]
struct ScenarioFile {
    #[serde(default)]
    settings: StoreSettings,
    services: FxHashMap<String, String>,
    cart: Vec<LineFixture>,
    #[serde(default)]
    promotions: Vec<PromotionFixture>,
    #[serde(default)]
    codes: Vec<CodeFixture>,
    #[serde(default)]
    loyalty_balance: i64,
    #[serde(default)]
    used_codes: Vec<String>,
    #[serde(default)]
    kind: OrderKind,
    #[serde(default)]
    now: Option<Timestamp>,
}

#[derive(Debug, Deserialize)]
struct LineFixture {
    service: String,
    #[serde(default = "one")]
    quantity: u32,
    #[serde(default)]
    note: Option<String>,
}

fn one() -> u32 {
    1
}

/// A checkout scenario, ready to price.
#[derive(Debug, Clone)]
pub struct Scenario {
    store: StoreUuid,
    settings: StoreSettings,
    catalog: ServiceCatalog<'static>,
    cart: Cart<'static>,
    promotions: Vec<Promotion<'static>>,
    codes: Vec<DiscountCode<'static>>,
    history: CustomerHistory,
    loyalty_balance: i64,
    kind: OrderKind,
    now: Timestamp,
}

impl Scenario {
    /// Load a named scenario from `./fixtures/scenarios`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or describes an invalid scenario.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let path = PathBuf::from("./fixtures")
            .join("scenarios")
            .join(format!("{name}.yml"));

        Self::from_path(path)
    }

    /// Load a scenario file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or describes an invalid scenario.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;

        debug!(path = %path.display(), "loading scenario");

        Self::from_yaml(&contents)
    }

    /// Parse a scenario from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed, the settings are invalid, a price is not in
    /// the store currency, or a cart line names a service that is not listed.
    pub fn from_yaml(yaml: &str) -> Result<Self, FixtureError> {
        let file: ScenarioFile = serde_norway::from_str(yaml)?;

        file.settings.validate()?;

        let currency = file.settings.currency()?;
        let store = StoreUuid::new();

        let mut catalog = ServiceCatalog::new(currency);

        for (name, price) in &file.services {
            catalog.insert(name.as_str(), parse_price_in(price, currency)?)?;
        }

        let mut cart = Cart::new(currency);

        for line in file.cart {
            cart.add_service(&catalog, &line.service, line.quantity, line.note)?;
        }

        let promotions = file
            .promotions
            .into_iter()
            .map(|promotion| promotion.into_promotion(currency))
            .collect::<Result<Vec<_>, _>>()?;

        let codes = file
            .codes
            .into_iter()
            .map(|code| code.into_code(store, currency))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            store,
            settings: file.settings,
            catalog,
            cart,
            promotions,
            codes,
            history: CustomerHistory::from_codes(file.used_codes),
            loyalty_balance: file.loyalty_balance,
            kind: file.kind,
            now: file.now.unwrap_or_else(Timestamp::now),
        })
    }

    /// Store settings.
    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// Services on offer.
    pub fn catalog(&self) -> &ServiceCatalog<'static> {
        &self.catalog
    }

    /// The cart to check out.
    pub fn cart(&self) -> &Cart<'static> {
        &self.cart
    }

    /// Store promotions, in file order.
    pub fn promotions(&self) -> &[Promotion<'static>] {
        &self.promotions
    }

    /// Store discount codes.
    pub fn codes(&self) -> &[DiscountCode<'static>] {
        &self.codes
    }

    /// Customer's points balance before checkout.
    pub fn loyalty_balance(&self) -> i64 {
        self.loyalty_balance
    }

    /// Store the scenario's codes belong to.
    pub fn store(&self) -> StoreUuid {
        self.store
    }

    /// One-off or recurring.
    pub fn kind(&self) -> OrderKind {
        self.kind
    }

    /// Load the scenario's store, promotions, codes and a customer into `repository`.
    ///
    /// Previously used codes are not seeded; the repository derives them from committed
    /// orders.
    ///
    /// # Errors
    ///
    /// Returns `FixtureError::Repository` if a code is already stored for the store.
    pub async fn seed(&self, repository: &InMemoryRepository) -> Result<CustomerUuid, FixtureError> {
        let customer = CustomerUuid::new();

        repository
            .insert_store(Store {
                uuid: self.store,
                name: "Scenario store".to_string(),
                settings: self.settings.clone(),
                catalog: self.catalog.clone(),
            })
            .await;

        repository
            .insert_customer(Customer {
                uuid: customer,
                store: self.store,
                name: "Scenario customer".to_string(),
                email: "customer@example.com".to_string(),
            })
            .await;

        for promotion in &self.promotions {
            repository.insert_promotion(self.store, promotion.clone()).await;
        }

        for code in &self.codes {
            repository.insert_discount_code(code.clone()).await?;
        }

        repository
            .set_loyalty_balance(customer, self.store, self.loyalty_balance)
            .await;

        debug!(store = %self.store, %customer, "scenario seeded");

        Ok(customer)
    }

    /// Price the cart, optionally entering `code` and redeeming points.
    ///
    /// # Errors
    ///
    /// Returns a [`FixtureError::Pricing`] if the scenario cannot be priced.
    pub fn price(
        &self,
        code: Option<&str>,
        redeem: bool,
    ) -> Result<PriceBreakdown<'static>, FixtureError> {
        let code = code.map(|code| CodeApplication {
            request: CodeRequest {
                code,
                store: self.store,
                history: &self.history,
                now: self.now,
            },
            codes: &self.codes,
        });

        let request = PricingRequest {
            cart: &self.cart,
            promotions: &self.promotions,
            code,
            loyalty: LoyaltyChoice {
                balance: self.loyalty_balance,
                redeem,
            },
            settings: &self.settings,
            kind: self.kind,
        };

        Ok(price(&request)?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rusty_money::{Money, iso::GBP};
    use tempfile::NamedTempFile;
    use testresult::TestResult;

    use crate::{discounts::validator::CodeRejection, orders::repository::OrderRepository};

    use super::*;

    const SCENARIO: &str = r"
settings:
  currency: GBP
  platform_fee:
    amount: 50
    one_off_processing: true
services:
  shirt: 2.50 GBP
  trousers: 6.00 GBP
cart:
  - service: shirt
    quantity: 3
    note: light starch
  - service: trousers
promotions:
  - name: Shirts 3 for 2
    type: bogo
    buy: 3
    free: 1
    services: [shirt]
codes:
  - code: TENOFF
    discount: 10%
  - code: spent
    discount: 1.00 GBP
    one_time_per_customer: true
used_codes: [SPENT]
loyalty_balance: 120
now: 2026-06-01T10:00:00Z
";

    #[test]
    fn scenario_loads_from_a_file() -> TestResult {
        let mut file = NamedTempFile::new()?;
        file.write_all(SCENARIO.as_bytes())?;

        let scenario = Scenario::from_path(file.path())?;

        assert_eq!(scenario.catalog().len(), 2);
        assert_eq!(scenario.cart().len(), 2);
        assert_eq!(scenario.promotions().len(), 1);
        assert_eq!(scenario.codes().len(), 2);
        assert_eq!(scenario.loyalty_balance(), 120);
        assert_eq!(scenario.settings().order_id_prefix, "RN");

        Ok(())
    }

    #[test]
    fn scenario_prices_with_promotion_fee_and_points() -> TestResult {
        let scenario = Scenario::from_yaml(SCENARIO)?;

        let breakdown = scenario.price(None, true)?;

        assert_eq!(breakdown.subtotal, Money::from_minor(1350, GBP));
        assert_eq!(breakdown.promotion_discount, Money::from_minor(250, GBP));
        assert_eq!(breakdown.points_discount, Money::from_minor(600, GBP));
        assert_eq!(breakdown.points_redeemed, 120);
        assert_eq!(breakdown.platform_fee, Money::from_minor(50, GBP));
        assert_eq!(breakdown.grand_total, Money::from_minor(550, GBP));

        Ok(())
    }

    #[test]
    fn codes_in_a_scenario_follow_the_validator() -> TestResult {
        let scenario = Scenario::from_yaml(SCENARIO)?;

        let used = scenario.price(Some("spent"), false)?;
        let exclusive = scenario.price(Some("tenoff"), false)?;

        assert_eq!(used.code_rejection, Some(CodeRejection::AlreadyUsed));
        assert_eq!(exclusive.code_rejection, Some(CodeRejection::MutuallyExclusive));
        assert!(exclusive.code.is_none());
        assert_eq!(exclusive.grand_total, Money::from_minor(1150, GBP));

        Ok(())
    }

    #[tokio::test]
    async fn scenario_seeds_a_repository() -> TestResult {
        let scenario = Scenario::from_yaml(SCENARIO)?;
        let repository = InMemoryRepository::new();

        let customer = scenario.seed(&repository).await?;

        let account = repository.get_loyalty_account(customer, scenario.store()).await?;
        let promotions = repository.list_promotions(scenario.store()).await?;
        let codes = repository.find_discount_codes("tenoff").await?;

        assert_eq!(account.points_balance, 120);
        assert_eq!(promotions.len(), 1);
        assert_eq!(codes.len(), 1);

        Ok(())
    }

    #[test]
    fn unlisted_cart_services_are_rejected() {
        let yaml = "services:\n  shirt: 2.50 GBP\ncart:\n  - service: curtains\n";

        assert!(matches!(
            Scenario::from_yaml(yaml),
            Err(FixtureError::Cart(CartError::UnknownService(service))) if service == "curtains"
        ));
    }

    #[test]
    fn prices_in_other_currencies_are_rejected() {
        let yaml = "services:\n  shirt: 2.50 USD\ncart: []\n";

        assert!(matches!(
            Scenario::from_yaml(yaml),
            Err(FixtureError::CurrencyMismatch(..))
        ));
    }

    #[test]
    fn missing_files_are_io_errors() {
        assert!(matches!(
            Scenario::from_path("./fixtures/scenarios/does-not-exist.yml"),
            Err(FixtureError::Io(_))
        ));
    }
}
