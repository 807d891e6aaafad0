//! Rinse prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartError, CartLine},
    checkout::{
        CodeApplication, LoyaltyChoice, OrderKind, PriceBreakdown, PricingError, PricingRequest,
        price,
    },
    customers::{Customer, CustomerUuid},
    discounts::{
        DiscountError,
        codes::{DiscountCode, DiscountCodeKind, DiscountCodeUuid},
        validator::{CodeOutcome, CodeRejection, CodeRequest, CustomerHistory},
    },
    drivers::{Driver, DriverUuid},
    fixtures::{FixtureError, Scenario},
    loyalty::{LoyaltyAccount, LoyaltyOutcome, LoyaltyRejection},
    notifications::{LogNotifier, Notification, Notifier, NotifyError},
    orders::{
        OrdersService, OrdersServiceError, RepositoryOrdersService,
        lifecycle::{DriverRole, TransitionError, TransitionRequest},
        models::{Actor, DriverAssignment, NewOrder, Order, OrderUuid, ReadableOrderId, StaffUuid},
        repository::{InMemoryRepository, OrderRepository, RepositoryError},
        status::OrderStatus,
    },
    promotions::{
        EligibleServices, Promotion, PromotionError, PromotionKind, PromotionUuid,
        evaluator::{AppliedPromotion, PromotionOutcome},
        types::{BogoPromotion, BundlePromotion},
    },
    receipt::{Receipt, ReceiptError},
    services::{CatalogError, ServiceCatalog},
    settings::{RedemptionPolicy, StoreSettings},
    stores::{Store, StoreUuid},
};
