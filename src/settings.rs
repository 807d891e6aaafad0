//! Store Settings
//!
//! Per-store configuration for loyalty, platform fees and order handling. Settings are resolved
//! once per request, either from the key/value rows of a settings table or from YAML, and passed
//! into pricing explicitly.

use std::str::FromStr;

use rust_decimal::Decimal;
use rusty_money::iso::{self, Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::orders::status::OrderStatus;

/// Errors related to resolving store settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A value could not be parsed for its key.
    #[error("invalid value {value:?} for setting {key}")]
    InvalidValue {
        /// Setting key
        key: String,
        /// Raw value
        value: String,
    },

    /// A numeric setting was below zero.
    #[error("setting {0} cannot be negative")]
    Negative(&'static str),

    /// The currency code is not a known ISO 4217 currency.
    #[error("unknown currency: {0}")]
    UnknownCurrency(String),

    /// The order id prefix was blank.
    #[error("order id prefix cannot be blank")]
    BlankOrderIdPrefix,

    /// The YAML document could not be parsed.
    #[error(transparent)]
    Yaml(#[from] serde_norway::Error),
}

/// What happens to a loyalty balance when points are redeemed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionPolicy {
    /// Redeeming consumes the whole balance, even when the discount was capped by the total.
    #[default]
    ConsumeBalance,

    /// Only the points needed to cover the discount are consumed; the rest carry forward.
    CarryForward,
}

/// A redemption policy name that is not recognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown redemption policy: {0}")]
pub struct UnknownRedemptionPolicy(String);

impl FromStr for RedemptionPolicy {
    type Err = UnknownRedemptionPolicy;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "consume_balance" => Ok(Self::ConsumeBalance),
            "carry_forward" => Ok(Self::CarryForward),
            _ => Err(UnknownRedemptionPolicy(value.to_string())),
        }
    }
}

/// Loyalty programme settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoyaltySettings {
    /// Whether customers earn and redeem points
    pub enabled: bool,

    /// Value of one point in major currency units
    pub point_value: Decimal,

    /// Points earned per major currency unit spent
    pub points_per_currency_unit: Decimal,

    /// Smallest balance that may be redeemed
    pub minimum_redeemable: i64,

    /// Balance handling on redemption
    pub redemption_policy: RedemptionPolicy,
}

impl Default for LoyaltySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            point_value: Decimal::new(5, 2),
            points_per_currency_unit: Decimal::ONE,
            minimum_redeemable: 100,
            redemption_policy: RedemptionPolicy::default(),
        }
    }
}

/// Platform fee settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformFeeSettings {
    /// Flat fee in minor units
    pub amount: i64,

    /// Whether the platform processes payment for one-off orders
    pub one_off_processing: bool,

    /// Whether the platform processes payment for recurring orders
    pub recurring_processing: bool,
}

/// Strongly typed store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// ISO 4217 currency code
    pub currency: String,

    /// Loyalty programme
    pub loyalty: LoyaltySettings,

    /// Platform fee
    pub platform_fee: PlatformFeeSettings,

    /// Prefix of readable order ids
    pub order_id_prefix: String,

    /// Statuses that trigger a customer notification
    pub announced_statuses: Vec<OrderStatus>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            currency: "GBP".to_string(),
            loyalty: LoyaltySettings::default(),
            platform_fee: PlatformFeeSettings::default(),
            order_id_prefix: "RN".to_string(),
            announced_statuses: vec![
                OrderStatus::Dispatched,
                OrderStatus::OutForDelivery,
                OrderStatus::Delivered,
            ],
        }
    }
}

impl StoreSettings {
    /// Resolve settings from key/value rows, starting from the defaults.
    ///
    /// Keys use dotted paths (`loyalty.point_value`, `platform_fee.amount`). Unknown keys are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`SettingsError`] if a value cannot be parsed or the result is invalid.
    pub fn from_pairs<'p, I>(pairs: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = (&'p str, &'p str)>,
    {
        let mut settings = Self::default();

        for (key, value) in pairs {
            let value = value.trim();

            match key {
                "currency" => settings.currency = value.to_uppercase(),
                "loyalty.enabled" => settings.loyalty.enabled = parse_bool(key, value)?,
                "loyalty.point_value" => settings.loyalty.point_value = parse(key, value)?,
                "loyalty.points_per_currency_unit" => {
                    settings.loyalty.points_per_currency_unit = parse(key, value)?;
                }
                "loyalty.minimum_redeemable" => {
                    settings.loyalty.minimum_redeemable = parse(key, value)?;
                }
                "loyalty.redemption_policy" => {
                    settings.loyalty.redemption_policy = parse(key, value)?;
                }
                "platform_fee.amount" => settings.platform_fee.amount = parse(key, value)?,
                "platform_fee.one_off_processing" => {
                    settings.platform_fee.one_off_processing = parse_bool(key, value)?;
                }
                "platform_fee.recurring_processing" => {
                    settings.platform_fee.recurring_processing = parse_bool(key, value)?;
                }
                "order_id_prefix" => settings.order_id_prefix = value.to_string(),
                "announced_statuses" => {
                    settings.announced_statuses = value
                        .split(',')
                        .map(str::trim)
                        .filter(|status| !status.is_empty())
                        .map(|status| parse(key, status))
                        .collect::<Result<_, _>>()?;
                }
                _ => debug!(key, "ignoring unknown store setting"),
            }
        }

        settings.validate()?;

        Ok(settings)
    }

    /// Parse settings from YAML; missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`SettingsError`] if the document is malformed or the result is invalid.
    pub fn from_yaml(yaml: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_norway::from_str(yaml)?;

        settings.validate()?;

        Ok(settings)
    }

    /// Check the settings are usable.
    ///
    /// # Errors
    ///
    /// Returns a [`SettingsError`] for negative amounts, unknown currencies or a blank prefix.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.currency()?;

        if self.loyalty.point_value.is_sign_negative() {
            return Err(SettingsError::Negative("loyalty.point_value"));
        }

        if self.loyalty.points_per_currency_unit.is_sign_negative() {
            return Err(SettingsError::Negative("loyalty.points_per_currency_unit"));
        }

        if self.loyalty.minimum_redeemable < 0 {
            return Err(SettingsError::Negative("loyalty.minimum_redeemable"));
        }

        if self.platform_fee.amount < 0 {
            return Err(SettingsError::Negative("platform_fee.amount"));
        }

        if self.order_id_prefix.trim().is_empty() {
            return Err(SettingsError::BlankOrderIdPrefix);
        }

        Ok(())
    }

    /// The store currency.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::UnknownCurrency` if the code is not an ISO 4217 currency.
    pub fn currency(&self) -> Result<&'static Currency, SettingsError> {
        iso::find(&self.currency).ok_or_else(|| SettingsError::UnknownCurrency(self.currency.clone()))
    }

    /// Whether customers are notified when an order enters `status`.
    pub fn announces(&self, status: OrderStatus) -> bool {
        self.announced_statuses.contains(&status)
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, SettingsError> {
    value.parse().map_err(|_err| SettingsError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, SettingsError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(SettingsError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
