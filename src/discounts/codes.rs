//! Discount Codes

use decimal_percentage::Percentage;
use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};

use crate::{
    discounts::{DiscountError, is_valid_percentage, percent_of_minor},
    stores::StoreUuid,
    uuids::TypedUuid,
};

/// Discount Code UUID
pub type DiscountCodeUuid = TypedUuid<DiscountCode<'static>>;

/// Normalise a code for comparison: codes are case-insensitive and ignore surrounding spaces.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_lowercase()
}

/// What a code takes off the subtotal.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum DiscountCodeKind<'a> {
    /// A percentage of the subtotal (e.g., "20% off")
    Percentage(Percentage),

    /// A fixed amount, never more than the subtotal (e.g., "£5 off")
    FixedAmount(Money<'a, Currency>),
}

impl<'a> DiscountCodeKind<'a> {
    /// Build a percentage kind from percent points (`20.0` is 20%).
    ///
    /// # Errors
    ///
    /// Returns `DiscountError::PercentageOutOfRange` unless `points` is within `0..=100`.
    pub fn percentage_points(points: f64) -> Result<Self, DiscountError> {
        if !points.is_finite() || !(0.0..=100.0).contains(&points) {
            return Err(DiscountError::PercentageOutOfRange);
        }

        Ok(Self::Percentage(Percentage::from(points / 100.0)))
    }

    /// Amount this kind takes off `subtotal`.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] if the percentage arithmetic overflows or a fixed amount is in
    /// another currency.
    pub fn discount_on(
        &self,
        subtotal: Money<'a, Currency>,
    ) -> Result<Money<'a, Currency>, DiscountError> {
        match self {
            DiscountCodeKind::Percentage(percent) => {
                let minor = percent_of_minor(percent, subtotal.to_minor_units())?;

                Ok(Money::from_minor(minor, subtotal.currency()))
            }
            DiscountCodeKind::FixedAmount(amount) => {
                let remaining = subtotal.sub(*amount)?;

                if remaining.to_minor_units() < 0 {
                    Ok(subtotal)
                } else {
                    Ok(*amount)
                }
            }
        }
    }
}

/// A staff-created discount code.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountCode<'a> {
    uuid: DiscountCodeUuid,
    store: StoreUuid,
    code: String,
    kind: DiscountCodeKind<'a>,
    one_time_per_customer: bool,
    expires_at: Option<Timestamp>,
    active: bool,
}

impl<'a> DiscountCode<'a> {
    /// Create a new, active, reusable code without an expiry.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] if the code is blank, the percentage is outside 0–100%, or a
    /// fixed amount is negative.
    pub fn new(
        uuid: DiscountCodeUuid,
        store: StoreUuid,
        code: impl Into<String>,
        kind: DiscountCodeKind<'a>,
    ) -> Result<Self, DiscountError> {
        let code = code.into();

        if code.trim().is_empty() {
            return Err(DiscountError::BlankCode);
        }

        match &kind {
            DiscountCodeKind::Percentage(percent) if !is_valid_percentage(percent) => {
                return Err(DiscountError::PercentageOutOfRange);
            }
            DiscountCodeKind::FixedAmount(amount) if amount.to_minor_units() < 0 => {
                return Err(DiscountError::NegativeAmount);
            }
            _ => {}
        }

        Ok(Self {
            uuid,
            store,
            code,
            kind,
            one_time_per_customer: false,
            expires_at: None,
            active: true,
        })
    }

    /// Restrict the code to one use per customer.
    #[must_use]
    pub fn one_time_per_customer(mut self) -> Self {
        self.one_time_per_customer = true;
        self
    }

    /// Expire the code at the given instant.
    #[must_use]
    pub fn expiring_at(mut self, expires_at: Timestamp) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Set whether the code is active.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Code identity.
    pub fn uuid(&self) -> DiscountCodeUuid {
        self.uuid
    }

    /// Owning store.
    pub fn store(&self) -> StoreUuid {
        self.store
    }

    /// The code as staff entered it.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The normalised code.
    pub fn normalized(&self) -> String {
        normalize_code(&self.code)
    }

    /// Discount kind.
    pub fn kind(&self) -> &DiscountCodeKind<'a> {
        &self.kind
    }

    /// Whether each customer may only use the code once.
    pub fn is_one_time_per_customer(&self) -> bool {
        self.one_time_per_customer
    }

    /// Expiry instant.
    pub fn expires_at(&self) -> Option<Timestamp> {
        self.expires_at
    }

    /// Whether staff have switched the code on.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the code matches customer input, ignoring case and surrounding spaces.
    pub fn matches(&self, input: &str) -> bool {
        self.normalized() == normalize_code(input)
    }

    /// Whether the code has passed its expiry at `now`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|expires_at| now > expires_at)
    }
}
