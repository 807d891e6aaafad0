//! Discount Code Validator
//!
//! Checks a customer-entered code against the store's codes and the customer's order history.
//! Business rejections are returned as [`CodeOutcome::Rejected`] with a reason that can be shown
//! to the customer; only broken arithmetic is an `Err`.

use jiff::Timestamp;
use rustc_hash::FxHashSet;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use tracing::debug;

use crate::{
    discounts::{
        DiscountError,
        codes::{DiscountCode, DiscountCodeUuid, normalize_code},
    },
    promotions::evaluator::PromotionOutcome,
    stores::StoreUuid,
};

/// Why a code could not be applied.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum CodeRejection {
    /// No store has a code with this text.
    #[error("this discount code does not exist")]
    NotFound,

    /// The code belongs to another store.
    #[error("this discount code is not valid at this store")]
    WrongStore,

    /// Staff have switched the code off.
    #[error("this discount code is no longer active")]
    Inactive,

    /// The code is past its expiry.
    #[error("this discount code has expired")]
    Expired,

    /// A one-time code the customer has already used on a previous order.
    #[error("you have already used this discount code")]
    AlreadyUsed,

    /// A promotion already applies to the cart; codes and promotions never combine.
    #[error("discount codes cannot be combined with the promotion already applied to this order")]
    MutuallyExclusive,
}

/// The codes a customer has used on previously committed orders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerHistory {
    used_codes: FxHashSet<String>,
}

impl CustomerHistory {
    /// Build a history from the codes referenced by past orders.
    pub fn from_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            used_codes: codes
                .into_iter()
                .map(|code| normalize_code(code.as_ref()))
                .collect(),
        }
    }

    /// Record a use of `code`.
    pub fn record(&mut self, code: &str) {
        self.used_codes.insert(normalize_code(code));
    }

    /// Whether `code` appears on a previous order.
    pub fn has_used(&self, code: &str) -> bool {
        self.used_codes.contains(&normalize_code(code))
    }
}

/// A code the customer wants to apply.
#[derive(Debug, Clone, Copy)]
pub struct CodeRequest<'r> {
    /// The code as typed
    pub code: &'r str,

    /// Store the order is placed with
    pub store: StoreUuid,

    /// The customer's previous uses
    pub history: &'r CustomerHistory,

    /// When the order is being placed
    pub now: Timestamp,
}

/// Result of validating a code.
#[derive(Debug, Clone, PartialEq)]
pub enum CodeOutcome<'a> {
    /// The code applies.
    Applied {
        /// Matched code identity
        uuid: DiscountCodeUuid,

        /// Normalised code text, as recorded on the order
        code: String,

        /// Amount taken off the subtotal
        discount: Money<'a, Currency>,
    },

    /// The code does not apply.
    Rejected(CodeRejection),
}

/// Validate a discount code against a cart subtotal.
///
/// `codes` may contain codes from any store; a match belonging to another store is reported as
/// [`CodeRejection::WrongStore`].
///
/// # Errors
///
/// Returns a [`DiscountError`] if the discount arithmetic fails, for example a fixed amount in a
/// different currency to the subtotal.
pub fn validate<'a>(
    request: &CodeRequest<'_>,
    codes: &[DiscountCode<'a>],
    subtotal: Money<'a, Currency>,
    promotion: &PromotionOutcome<'_>,
) -> Result<CodeOutcome<'a>, DiscountError> {
    let rejection = |reason: CodeRejection| {
        debug!(code = request.code, %reason, "discount code rejected");

        Ok(CodeOutcome::Rejected(reason))
    };

    let mut matching = codes.iter().filter(|code| code.matches(request.code)).peekable();

    if matching.peek().is_none() {
        return rejection(CodeRejection::NotFound);
    }

    let Some(code) = matching.find(|code| code.store() == request.store) else {
        return rejection(CodeRejection::WrongStore);
    };

    if !code.is_active() {
        return rejection(CodeRejection::Inactive);
    }

    if code.is_expired_at(request.now) {
        return rejection(CodeRejection::Expired);
    }

    if code.is_one_time_per_customer() && request.history.has_used(code.code()) {
        return rejection(CodeRejection::AlreadyUsed);
    }

    if promotion.is_applied() {
        return rejection(CodeRejection::MutuallyExclusive);
    }

    let discount = code.kind().discount_on(subtotal)?;

    debug!(
        code = %code.uuid(),
        discount = discount.to_minor_units(),
        "discount code applied"
    );

    Ok(CodeOutcome::Applied {
        uuid: code.uuid(),
        code: code.normalized(),
        discount,
    })
}

#[cfg(test)]
mod tests {
    use jiff::ToSpan;
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use crate::{
        discounts::codes::DiscountCodeKind,
        promotions::{PromotionUuid, evaluator::AppliedPromotion},
    };

    use super::*;

    struct Setup {
        store: StoreUuid,
        now: Timestamp,
        history: CustomerHistory,
    }

    impl Setup {
        fn new() -> Result<Self, jiff::Error> {
            Ok(Self {
                store: StoreUuid::new(),
                now: "2026-03-01T12:00:00Z".parse()?,
                history: CustomerHistory::default(),
            })
        }

        fn request<'r>(&'r self, code: &'r str) -> CodeRequest<'r> {
            CodeRequest {
                code,
                store: self.store,
                history: &self.history,
                now: self.now,
            }
        }

        fn code(&self, text: &str, points: f64) -> Result<DiscountCode<'static>, DiscountError> {
            DiscountCode::new(
                DiscountCodeUuid::new(),
                self.store,
                text,
                DiscountCodeKind::percentage_points(points)?,
            )
        }
    }

    fn subtotal() -> Money<'static, rusty_money::iso::Currency> {
        Money::from_minor(5000, GBP)
    }

    #[test]
    fn valid_percentage_code_applies() -> TestResult {
        let setup = Setup::new()?;
        let code = setup.code("SAVE20", 20.0)?;

        let outcome = validate(
            &setup.request("save20"),
            &[code.clone()],
            subtotal(),
            &PromotionOutcome::none(GBP),
        )?;

        assert_eq!(
            outcome,
            CodeOutcome::Applied {
                uuid: code.uuid(),
                code: "save20".to_string(),
                discount: Money::from_minor(1000, GBP),
            }
        );

        Ok(())
    }

    #[test]
    fn unknown_code_is_not_found() -> TestResult {
        let setup = Setup::new()?;

        let outcome = validate(
            &setup.request("NOPE"),
            &[setup.code("SAVE20", 20.0)?],
            subtotal(),
            &PromotionOutcome::none(GBP),
        )?;

        assert_eq!(outcome, CodeOutcome::Rejected(CodeRejection::NotFound));

        Ok(())
    }

    #[test]
    fn code_from_another_store_is_rejected() -> TestResult {
        let setup = Setup::new()?;
        let elsewhere = DiscountCode::new(
            DiscountCodeUuid::new(),
            StoreUuid::new(),
            "SAVE20",
            DiscountCodeKind::percentage_points(20.0)?,
        )?;

        let outcome = validate(
            &setup.request("SAVE20"),
            &[elsewhere],
            subtotal(),
            &PromotionOutcome::none(GBP),
        )?;

        assert_eq!(outcome, CodeOutcome::Rejected(CodeRejection::WrongStore));

        Ok(())
    }

    #[test]
    fn inactive_and_expired_codes_are_rejected() -> TestResult {
        let setup = Setup::new()?;
        let inactive = setup.code("OFF", 20.0)?.with_active(false);
        let expired = setup
            .code("OLD", 20.0)?
            .expiring_at(setup.now.checked_sub(1.hour())?);

        let promotion = PromotionOutcome::none(GBP);

        assert_eq!(
            validate(&setup.request("OFF"), &[inactive], subtotal(), &promotion)?,
            CodeOutcome::Rejected(CodeRejection::Inactive)
        );
        assert_eq!(
            validate(&setup.request("OLD"), &[expired], subtotal(), &promotion)?,
            CodeOutcome::Rejected(CodeRejection::Expired)
        );

        Ok(())
    }

    #[test]
    fn one_time_code_cannot_be_reused() -> TestResult {
        let mut setup = Setup::new()?;
        setup.history.record("Welcome");

        let one_time = setup.code("WELCOME", 15.0)?.one_time_per_customer();
        let reusable = setup.code("welcome", 15.0)?;

        let promotion = PromotionOutcome::none(GBP);

        assert_eq!(
            validate(&setup.request("WELCOME"), &[one_time], subtotal(), &promotion)?,
            CodeOutcome::Rejected(CodeRejection::AlreadyUsed)
        );
        assert!(matches!(
            validate(&setup.request("WELCOME"), &[reusable], subtotal(), &promotion)?,
            CodeOutcome::Applied { .. }
        ));

        Ok(())
    }

    #[test]
    fn code_and_promotion_are_mutually_exclusive() -> TestResult {
        let setup = Setup::new()?;
        let promotion = PromotionOutcome {
            applied: Some(AppliedPromotion {
                uuid: PromotionUuid::new(),
                name: "Shirts 3 for 2".to_string(),
            }),
            discount: Money::from_minor(250, GBP),
            has_additional_qualifying_promotions: false,
        };

        let outcome = validate(
            &setup.request("SAVE20"),
            &[setup.code("SAVE20", 20.0)?],
            subtotal(),
            &promotion,
        )?;

        assert_eq!(outcome, CodeOutcome::Rejected(CodeRejection::MutuallyExclusive));

        Ok(())
    }

    #[test]
    fn history_matches_case_insensitively() {
        let history = CustomerHistory::from_codes(["Welcome", "SPRING"]);

        assert!(history.has_used("WELCOME"));
        assert!(history.has_used("spring "));
        assert!(!history.has_used("summer"));
    }
}
