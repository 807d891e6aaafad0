//! Checkout
//!
//! Turns a cart into a payable total: subtotal, then either a promotion or a discount code,
//! then loyalty points, then the platform fee.

use rusty_money::{Money, MoneyError, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{
    cart::{Cart, CartError},
    discounts::{
        DiscountError,
        codes::DiscountCode,
        validator::{CodeOutcome, CodeRejection, CodeRequest, validate},
    },
    loyalty::{self, LoyaltyError, LoyaltyRejection},
    pricing::{clamp_non_negative, zero},
    promotions::{
        Promotion, PromotionError,
        evaluator::{AppliedPromotion, evaluate},
    },
    settings::{SettingsError, StoreSettings},
};

/// Errors that prevent an order from being priced at all.
#[derive(Debug, Error)]
pub enum PricingError {
    /// The cart is not in the store currency.
    #[error("cart is priced in {cart}, but the store uses {store}")]
    CurrencyMismatch {
        /// Cart currency code
        cart: &'static str,
        /// Store currency code
        store: &'static str,
    },

    /// Cart errors.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Promotion errors.
    #[error(transparent)]
    Promotion(#[from] PromotionError),

    /// Discount code errors.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// Loyalty errors.
    #[error(transparent)]
    Loyalty(#[from] LoyaltyError),

    /// Store settings errors.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// How an order is paid for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    /// A single order
    #[default]
    OneOff,

    /// An order raised by a subscription
    Recurring,
}

/// The customer's loyalty position and choice for this order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoyaltyChoice {
    /// Current points balance
    pub balance: i64,

    /// Whether the customer asked to redeem
    pub redeem: bool,
}

/// A discount code entered at checkout, with the codes to check it against.
#[derive(Debug, Clone, Copy)]
pub struct CodeApplication<'r, 'a> {
    /// The customer's request
    pub request: CodeRequest<'r>,

    /// The store's discount codes
    pub codes: &'r [DiscountCode<'a>],
}

/// Everything needed to price an order.
#[derive(Debug, Clone, Copy)]
pub struct PricingRequest<'r, 'a> {
    /// Cart to price
    pub cart: &'r Cart<'a>,

    /// Store promotions, in stored order
    pub promotions: &'r [Promotion<'a>],

    /// Discount code, if one was entered
    pub code: Option<CodeApplication<'r, 'a>>,

    /// Loyalty position
    pub loyalty: LoyaltyChoice,

    /// Store configuration
    pub settings: &'r StoreSettings,

    /// One-off or recurring order
    pub kind: OrderKind,
}

/// The priced order.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBreakdown<'a> {
    /// Sum of every line
    pub subtotal: Money<'a, Currency>,

    /// Applied promotion
    pub promotion: Option<AppliedPromotion>,

    /// Amount taken off by the promotion
    pub promotion_discount: Money<'a, Currency>,

    /// Whether another promotion would have qualified
    pub has_additional_qualifying_promotions: bool,

    /// Applied discount code, normalised
    pub code: Option<String>,

    /// Amount taken off by the discount code
    pub code_discount: Money<'a, Currency>,

    /// Why the entered code did not apply
    pub code_rejection: Option<CodeRejection>,

    /// Amount taken off by redeemed points
    pub points_discount: Money<'a, Currency>,

    /// Points removed from the balance
    pub points_redeemed: i64,

    /// Points earned on this order
    pub points_earned: i64,

    /// Balance once the order is committed
    pub new_points_balance: i64,

    /// Why a requested redemption did not happen
    pub loyalty_rejection: Option<LoyaltyRejection>,

    /// Platform fee
    pub platform_fee: Money<'a, Currency>,

    /// Amount payable
    pub grand_total: Money<'a, Currency>,
}

impl<'a> PriceBreakdown<'a> {
    /// Total of the promotion, code and points discounts.
    ///
    /// # Errors
    ///
    /// Returns a `MoneyError` on currency mismatch.
    pub fn total_discount(&self) -> Result<Money<'a, Currency>, MoneyError> {
        self.promotion_discount
            .add(self.code_discount)?
            .add(self.points_discount)
    }
}

/// Price an order.
///
/// Rejected codes and redemptions are reported on the breakdown rather than failing the call.
///
/// # Errors
///
/// Returns a [`PricingError`] if the input is malformed: the cart is in the wrong currency, a
/// promotion or code is priced in another currency, or an amount overflows.
pub fn price<'a>(request: &PricingRequest<'_, 'a>) -> Result<PriceBreakdown<'a>, PricingError> {
    let cart = request.cart;
    let currency = cart.currency();
    let store_currency = request.settings.currency()?;

    if currency != store_currency {
        return Err(PricingError::CurrencyMismatch {
            cart: currency.iso_alpha_code,
            store: store_currency.iso_alpha_code,
        });
    }

    let subtotal = cart.subtotal()?;

    let units = cart.units();
    let promotion = evaluate(&units, currency, request.promotions)?;
    let promotion_discount = clamp_non_negative(
        Money::from_minor(promotion.discount.to_minor_units(), currency),
        "pricing.promotion_discount",
    );

    let mut code = None;
    let mut code_discount = zero(currency);
    let mut code_rejection = None;

    if let Some(application) = &request.code {
        match validate(&application.request, application.codes, subtotal, &promotion)? {
            CodeOutcome::Applied {
                code: applied,
                discount,
                ..
            } => {
                code = Some(applied);
                code_discount = clamp_non_negative(discount, "pricing.code_discount");
            }
            CodeOutcome::Rejected(rejection) => code_rejection = Some(rejection),
        }
    }

    let total_after_discounts = clamp_non_negative(
        subtotal.sub(promotion_discount)?.sub(code_discount)?,
        "pricing.total_after_discounts",
    );

    let loyalty = loyalty::apply(
        request.loyalty.balance,
        total_after_discounts,
        request.loyalty.redeem,
        &request.settings.loyalty,
    )?;

    let total_after_points = clamp_non_negative(
        total_after_discounts.sub(loyalty.points_discount)?,
        "pricing.total_after_points",
    );

    let platform_fee = platform_fee(request.settings, request.kind, total_after_points, currency);

    let grand_total = clamp_non_negative(total_after_points.add(platform_fee)?, "pricing.grand_total");

    debug!(
        subtotal = subtotal.to_minor_units(),
        promotion_discount = promotion_discount.to_minor_units(),
        code_discount = code_discount.to_minor_units(),
        points_discount = loyalty.points_discount.to_minor_units(),
        platform_fee = platform_fee.to_minor_units(),
        grand_total = grand_total.to_minor_units(),
        "order priced"
    );

    Ok(PriceBreakdown {
        subtotal,
        promotion: promotion.applied,
        promotion_discount,
        has_additional_qualifying_promotions: promotion.has_additional_qualifying_promotions,
        code,
        code_discount,
        code_rejection,
        points_discount: loyalty.points_discount,
        points_redeemed: loyalty.points_redeemed,
        points_earned: loyalty.points_earned,
        new_points_balance: loyalty.new_balance,
        loyalty_rejection: loyalty.rejection,
        platform_fee,
        grand_total,
    })
}

/// The flat fee is charged when the platform processes payment for this kind of order, unless a
/// one-off order has nothing left to pay.
fn platform_fee<'a>(
    settings: &StoreSettings,
    kind: OrderKind,
    remaining: Money<'a, Currency>,
    currency: &'a Currency,
) -> Money<'a, Currency> {
    let fee = &settings.platform_fee;

    let processing = match kind {
        OrderKind::OneOff => fee.one_off_processing,
        OrderKind::Recurring => fee.recurring_processing,
    };

    if processing && (remaining.to_minor_units() > 0 || kind == OrderKind::Recurring) {
        clamp_non_negative(Money::from_minor(fee.amount, currency), "pricing.platform_fee")
    } else {
        zero(currency)
    }
}
