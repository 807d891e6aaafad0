//! Discount Code Fixtures

use jiff::Timestamp;
use rusty_money::iso::Currency;
use serde::Deserialize;

use crate::{
    discounts::codes::{DiscountCode, DiscountCodeUuid},
    fixtures::{FixtureError, prices::parse_code_discount},
    stores::StoreUuid,
};

/// A discount code as written in a scenario file.
#[derive(Debug, Clone, Deserialize)]
pub struct CodeFixture {
    /// The code customers type
    pub code: String,

    /// "15%" or "5.00 GBP"
    pub discount: String,

    /// Whether each customer may use the code once
    #[serde(default)]
    pub one_time_per_customer: bool,

    /// Expiry, if any
    #[serde(default)]
    pub expires_at: Option<Timestamp>,

    /// Whether the code can be redeemed
    #[serde(default = "active_by_default")]
    pub active: bool,
}

fn active_by_default() -> bool {
    true
}

impl CodeFixture {
    /// Build the code for `store`.
    ///
    /// # Errors
    ///
    /// Returns a [`FixtureError`] if the code is blank or the discount is malformed.
    pub fn into_code(
        self,
        store: StoreUuid,
        currency: &'static Currency,
    ) -> Result<DiscountCode<'static>, FixtureError> {
        let kind = parse_code_discount(&self.discount, currency)?;

        let mut code = DiscountCode::new(DiscountCodeUuid::new(), store, self.code, kind)?
            .with_active(self.active);

        if self.one_time_per_customer {
            code = code.one_time_per_customer();
        }

        if let Some(expires_at) = self.expires_at {
            code = code.expiring_at(expires_at);
        }

        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn code_fixture_carries_its_restrictions() -> TestResult {
        let fixture: CodeFixture = serde_norway::from_str(
            "code: welcome10\ndiscount: 10%\none_time_per_customer: true\nexpires_at: 2026-12-31T23:59:59Z\n",
        )?;

        let store = StoreUuid::new();
        let code = fixture.into_code(store, GBP)?;

        assert_eq!(code.store(), store);
        assert!(code.matches("WELCOME10"));
        assert!(code.is_one_time_per_customer());
        assert!(code.is_active());
        assert_eq!(code.expires_at(), Some("2026-12-31T23:59:59Z".parse::<Timestamp>()?));

        Ok(())
    }
}
