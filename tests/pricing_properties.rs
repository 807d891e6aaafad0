//! Checkout pricing properties.

use jiff::Timestamp;
use rusty_money::{
    Money,
    iso::{Currency, GBP},
};
use testresult::TestResult;

use rinse::{
    cart::{Cart, CartError, CartLine},
    checkout::{CodeApplication, LoyaltyChoice, OrderKind, PricingRequest, price},
    discounts::{
        codes::{DiscountCode, DiscountCodeKind, DiscountCodeUuid},
        validator::{CodeRejection, CodeRequest, CustomerHistory},
    },
    promotions::{
        EligibleServices, Promotion, PromotionKind, PromotionUuid,
        types::{BogoPromotion, BundlePromotion},
    },
    settings::{LoyaltySettings, PlatformFeeSettings, RedemptionPolicy, StoreSettings},
    stores::StoreUuid,
};

const NO_PROMOTIONS: &[Promotion<'static>] = &[];

fn pounds(amount: i64) -> Money<'static, Currency> {
    Money::from_minor(amount * 100, GBP)
}

fn cart_of(service: &str, prices: &[i64]) -> Result<Cart<'static>, CartError> {
    Cart::with_lines(
        prices
            .iter()
            .map(|price| CartLine::new(service, pounds(*price), 1)),
        GBP,
    )
}

fn bogo(buy: usize, free: usize) -> TestResult<Promotion<'static>> {
    Ok(Promotion::new(
        PromotionUuid::new(),
        "Buy and get free",
        PromotionKind::Bogo(BogoPromotion::new(buy, free, EligibleServices::new(["shirt"])?)?),
    ))
}

fn request<'r>(
    cart: &'r Cart<'static>,
    promotions: &'r [Promotion<'static>],
    settings: &'r StoreSettings,
) -> PricingRequest<'r, 'static> {
    PricingRequest {
        cart,
        promotions,
        code: None,
        loyalty: LoyaltyChoice::default(),
        settings,
        kind: OrderKind::OneOff,
    }
}

#[test]
fn bogo_gives_away_the_cheapest_units() -> TestResult {
    let settings = StoreSettings::default();
    let promotions = [bogo(3, 1)?];

    let one_set = cart_of("shirt", &[10, 8, 6])?;
    let two_sets = cart_of("shirt", &[10, 8, 6, 10, 8, 6])?;

    let one = price(&request(&one_set, &promotions, &settings))?;
    let two = price(&request(&two_sets, &promotions, &settings))?;

    assert_eq!(one.promotion_discount, pounds(6), "one set frees the £6 shirt");
    assert_eq!(two.promotion_discount, pounds(12), "two sets free both £6 shirts");
    assert_eq!(two.grand_total, pounds(36), "£48 less £12");

    Ok(())
}

#[test]
fn bundle_charges_its_fixed_price() -> TestResult {
    let settings = StoreSettings::default();
    let bundle = BundlePromotion::new(5, pounds(20), EligibleServices::new(["shirt"])?)?;
    let promotions = [Promotion::new(
        PromotionUuid::new(),
        "Five for twenty",
        PromotionKind::Bundle(bundle),
    )];

    let cart = cart_of("shirt", &[10, 8, 6, 5, 4])?;
    let breakdown = price(&request(&cart, &promotions, &settings))?;

    assert_eq!(breakdown.subtotal, pounds(33), "unbundled price");
    assert_eq!(breakdown.promotion_discount, pounds(13), "£33 less £20");
    assert_eq!(breakdown.grand_total, pounds(20), "bundle price");

    Ok(())
}

#[test]
fn code_takes_a_percentage_unless_a_promotion_applies() -> TestResult {
    let settings = StoreSettings::default();
    let store = StoreUuid::new();
    let history = CustomerHistory::default();
    let codes = [DiscountCode::new(
        DiscountCodeUuid::new(),
        store,
        "TWENTY",
        DiscountCodeKind::percentage_points(20.0)?,
    )?];

    let application = CodeApplication {
        request: CodeRequest {
            code: "twenty",
            store,
            history: &history,
            now: Timestamp::now(),
        },
        codes: &codes,
    };

    let cart = cart_of("suit", &[50])?;
    let mut plain = request(&cart, NO_PROMOTIONS, &settings);
    plain.code = Some(application);

    let applied = price(&plain)?;

    assert_eq!(applied.code_discount, pounds(10), "20% of £50");
    assert_eq!(applied.code.as_deref(), Some("twenty"), "normalised code recorded");
    assert_eq!(applied.grand_total, pounds(40), "£50 less £10");

    let shirts = cart_of("shirt", &[10, 8, 6])?;
    let promotions = [bogo(3, 1)?];
    let mut combined = request(&shirts, &promotions, &settings);
    combined.code = Some(application);

    let exclusive = price(&combined)?;

    assert_eq!(exclusive.code_rejection, Some(CodeRejection::MutuallyExclusive), "never combined");
    assert_eq!(exclusive.code_discount.to_minor_units(), 0, "no code discount");
    assert_eq!(exclusive.promotion_discount, pounds(6), "promotion still applies");

    Ok(())
}

#[test]
fn promotion_and_code_discounts_are_never_both_set() -> TestResult {
    let settings = StoreSettings::default();
    let store = StoreUuid::new();
    let history = CustomerHistory::default();
    let codes = [DiscountCode::new(
        DiscountCodeUuid::new(),
        store,
        "FIVE",
        DiscountCodeKind::FixedAmount(pounds(5)),
    )?];
    let promotions = [bogo(2, 1)?];

    let carts: [&[i64]; 4] = [&[4], &[4, 4], &[9, 3, 2], &[]];

    for prices in carts {
        let cart = cart_of("shirt", prices)?;
        let mut request = request(&cart, &promotions, &settings);
        request.code = Some(CodeApplication {
            request: CodeRequest {
                code: "five",
                store,
                history: &history,
                now: Timestamp::now(),
            },
            codes: &codes,
        });

        let breakdown = price(&request)?;

        assert!(
            breakdown.promotion_discount.to_minor_units() == 0
                || breakdown.code_discount.to_minor_units() == 0,
            "promotion and code both discounted {prices:?}"
        );
        assert!(
            breakdown.grand_total.to_minor_units() >= 0,
            "negative total for {prices:?}"
        );
    }

    Ok(())
}

#[test]
fn redeeming_consumes_the_whole_balance() -> TestResult {
    let settings = StoreSettings::default();
    let cart = cart_of("shirt", &[8])?;

    let mut redeem = request(&cart, NO_PROMOTIONS, &settings);
    redeem.loyalty = LoyaltyChoice {
        balance: 200,
        redeem: true,
    };

    let breakdown = price(&redeem)?;

    assert_eq!(breakdown.points_discount, pounds(8), "capped at the £8 total");
    assert_eq!(breakdown.points_redeemed, 200, "every point is spent");
    assert_eq!(breakdown.points_earned, 0, "nothing left to earn on");
    assert_eq!(breakdown.new_points_balance, 0, "balance is what was earned");
    assert_eq!(breakdown.grand_total.to_minor_units(), 0, "fully paid with points");

    let carry_forward = StoreSettings {
        loyalty: LoyaltySettings {
            redemption_policy: RedemptionPolicy::CarryForward,
            ..StoreSettings::default().loyalty
        },
        ..StoreSettings::default()
    };

    let mut carried = request(&cart, NO_PROMOTIONS, &carry_forward);
    carried.loyalty = redeem.loyalty;

    let breakdown = price(&carried)?;

    assert_eq!(breakdown.points_redeemed, 160, "only the points worth £8");
    assert_eq!(breakdown.new_points_balance, 40, "the rest carries forward");

    Ok(())
}

#[test]
fn fully_discounted_one_off_orders_carry_no_fee() -> TestResult {
    let settings = StoreSettings {
        platform_fee: PlatformFeeSettings {
            amount: 50,
            one_off_processing: true,
            recurring_processing: true,
        },
        ..StoreSettings::default()
    };

    let cart = cart_of("shirt", &[8])?;

    let mut one_off = request(&cart, NO_PROMOTIONS, &settings);
    one_off.loyalty = LoyaltyChoice {
        balance: 200,
        redeem: true,
    };

    let mut recurring = one_off;
    recurring.kind = OrderKind::Recurring;

    let one_off = price(&one_off)?;
    let recurring = price(&recurring)?;

    assert_eq!(one_off.platform_fee.to_minor_units(), 0, "nothing to process");
    assert_eq!(one_off.grand_total.to_minor_units(), 0, "free order");
    assert_eq!(recurring.platform_fee.to_minor_units(), 50, "subscriptions always pay");
    assert_eq!(recurring.grand_total.to_minor_units(), 50, "only the fee");

    Ok(())
}

#[test]
fn pricing_is_repeatable() -> TestResult {
    let settings = StoreSettings::default();
    let promotions = [bogo(3, 1)?];
    let cart = cart_of("shirt", &[10, 8, 6, 4])?;

    let mut request = request(&cart, &promotions, &settings);
    request.loyalty = LoyaltyChoice {
        balance: 150,
        redeem: true,
    };

    let first = price(&request)?;
    let second = price(&request)?;

    assert_eq!(first, second, "identical inputs must price identically");
    assert_eq!(format!("{first:?}"), format!("{second:?}"), "debug output matches too");

    Ok(())
}
