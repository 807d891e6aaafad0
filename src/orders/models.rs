//! Order Models

use std::fmt;

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};

use crate::{
    cart::{Cart, CartLine},
    checkout::{OrderKind, PriceBreakdown},
    customers::CustomerUuid,
    drivers::DriverUuid,
    orders::status::OrderStatus,
    promotions::evaluator::AppliedPromotion,
    stores::StoreUuid,
    uuids::TypedUuid,
};

/// Order UUID
pub type OrderUuid = TypedUuid<Order>;

/// Staff member marker
#[derive(Debug)]
pub struct Staff;

/// Staff UUID
pub type StaffUuid = TypedUuid<Staff>;

/// Whoever is acting on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Actor {
    /// The customer who placed the order
    Customer(CustomerUuid),
    /// A member of store staff
    Staff(StaffUuid),
    /// A driver
    Driver(DriverUuid),
}

impl Actor {
    /// Short role name for logs and errors.
    pub fn role(&self) -> &'static str {
        match self {
            Actor::Customer(_) => "customer",
            Actor::Staff(_) => "staff",
            Actor::Driver(_) => "driver",
        }
    }
}

/// Short human-facing order identifier (`RN-00042`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReadableOrderId(String);

impl ReadableOrderId {
    /// Build the id for the `sequence`th order of a store.
    pub fn new(prefix: &str, sequence: u64) -> Self {
        Self(format!("{}-{sequence:05}", prefix.trim().to_uppercase()))
    }

    /// The id as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReadableOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReadableOrderId {
    fn from(value: &str) -> Self {
        Self(value.trim().to_uppercase())
    }
}

/// The monetary outcome of checkout, fixed once the order is committed.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPricing {
    /// Sum of every line
    pub subtotal: Money<'static, Currency>,
    /// Applied promotion
    pub promotion: Option<AppliedPromotion>,
    /// Amount taken off by the promotion
    pub promotion_discount: Money<'static, Currency>,
    /// Applied discount code, normalised
    pub code: Option<String>,
    /// Amount taken off by the discount code
    pub code_discount: Money<'static, Currency>,
    /// Amount taken off by redeemed points
    pub points_discount: Money<'static, Currency>,
    /// Points removed from the balance
    pub points_redeemed: i64,
    /// Points earned on this order
    pub points_earned: i64,
    /// Platform fee
    pub platform_fee: Money<'static, Currency>,
    /// Amount payable
    pub grand_total: Money<'static, Currency>,
}

impl From<&PriceBreakdown<'static>> for OrderPricing {
    fn from(breakdown: &PriceBreakdown<'static>) -> Self {
        Self {
            subtotal: breakdown.subtotal,
            promotion: breakdown.promotion.clone(),
            promotion_discount: breakdown.promotion_discount,
            code: breakdown.code.clone(),
            code_discount: breakdown.code_discount,
            points_discount: breakdown.points_discount,
            points_redeemed: breakdown.points_redeemed,
            points_earned: breakdown.points_earned,
            platform_fee: breakdown.platform_fee,
            grand_total: breakdown.grand_total,
        }
    }
}

/// A photo and note attached when garments change hands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Proof {
    /// Reference to an uploaded photo
    pub photo: Option<String>,
    /// Free-text note
    pub note: Option<String>,
}

impl Proof {
    /// Whether neither a photo nor a note was given.
    pub fn is_empty(&self) -> bool {
        self.photo.is_none() && self.note.is_none()
    }
}

/// One entry in an order's status history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    /// Previous status
    pub from: OrderStatus,
    /// New status
    pub to: OrderStatus,
    /// Who made the change
    pub actor: Actor,
    /// When the change was applied
    pub at: Timestamp,
    /// Whether the transition table was bypassed
    pub forced: bool,
    /// Reason given, for failures and overrides
    pub reason: Option<String>,
    /// Proof attached to the change
    pub proof: Option<Proof>,
}

/// A committed order.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Order identity
    pub uuid: OrderUuid,
    /// Human-facing id
    pub readable_id: ReadableOrderId,
    /// Store the order was placed with
    pub store: StoreUuid,
    /// Customer who placed it
    pub customer: CustomerUuid,
    /// Cart snapshot at checkout
    pub lines: Vec<CartLine<'static>>,
    /// Checkout pricing
    pub pricing: OrderPricing,
    /// One-off or recurring
    pub kind: OrderKind,
    /// Current status
    pub status: OrderStatus,
    /// Driver collecting the garments
    pub collection_driver: Option<DriverUuid>,
    /// Driver returning the garments
    pub delivery_driver: Option<DriverUuid>,
    /// Reason the last collection failed
    pub failure_reason: Option<String>,
    /// Status changes, oldest first
    pub history: Vec<StatusChange>,
    /// Write version, bumped on every update
    pub version: u64,
    /// When the order was committed
    pub created_at: Timestamp,
    /// When the order last changed
    pub updated_at: Timestamp,
}

impl Order {
    /// Whether `driver` holds either driver slot.
    pub fn is_assigned_to(&self, driver: DriverUuid) -> bool {
        self.collection_driver == Some(driver) || self.delivery_driver == Some(driver)
    }

    /// Whether `actor` may read this order.
    pub fn is_visible_to(&self, actor: Actor) -> bool {
        match actor {
            Actor::Customer(customer) => self.customer == customer,
            Actor::Staff(_) => true,
            Actor::Driver(driver) => self.is_assigned_to(driver),
        }
    }
}

/// A customer's request to place an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// Store to order from
    pub store: StoreUuid,
    /// Customer placing the order
    pub customer: CustomerUuid,
    /// Cart to check out
    pub cart: Cart<'static>,
    /// Discount code, as typed
    pub code: Option<String>,
    /// Whether to redeem loyalty points
    pub redeem_points: bool,
    /// One-off or recurring
    pub kind: OrderKind,
}

/// An order ready to be committed; the repository allocates its readable id.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    /// Order identity
    pub uuid: OrderUuid,
    /// Store the order is placed with
    pub store: StoreUuid,
    /// Customer placing it
    pub customer: CustomerUuid,
    /// Cart snapshot
    pub lines: Vec<CartLine<'static>>,
    /// Checkout pricing
    pub pricing: OrderPricing,
    /// One-off or recurring
    pub kind: OrderKind,
    /// Loyalty balance the order was priced against
    pub expected_points_balance: i64,
    /// Customer's loyalty balance once the order is committed
    pub new_points_balance: i64,
    /// Normalised code limited to one use per customer, if one was applied
    pub one_time_code: Option<String>,
    /// Commit time
    pub placed_at: Timestamp,
}

impl OrderDraft {
    /// Turn the draft into a pending order.
    pub fn into_order(self, readable_id: ReadableOrderId) -> Order {
        Order {
            uuid: self.uuid,
            readable_id,
            store: self.store,
            customer: self.customer,
            lines: self.lines,
            pricing: self.pricing,
            kind: self.kind,
            status: OrderStatus::Pending,
            collection_driver: None,
            delivery_driver: None,
            failure_reason: None,
            history: Vec::new(),
            version: 0,
            created_at: self.placed_at,
            updated_at: self.placed_at,
        }
    }
}

/// Driver slot changes requested by staff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverAssignment {
    /// New collection driver
    pub collection: Option<DriverUuid>,
    /// New delivery driver
    pub delivery: Option<DriverUuid>,
}

impl DriverAssignment {
    /// The drivers named by this assignment.
    pub fn drivers(&self) -> impl Iterator<Item = DriverUuid> {
        self.collection.into_iter().chain(self.delivery)
    }
}

/// Published whenever an order is created or changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderChange {
    /// Store the order belongs to
    pub store: StoreUuid,
    /// Changed order
    pub order: OrderUuid,
    /// Human-facing id
    pub readable_id: ReadableOrderId,
    /// Status after the change
    pub status: OrderStatus,
    /// Version after the change
    pub version: u64,
}

impl From<&Order> for OrderChange {
    fn from(order: &Order) -> Self {
        Self {
            store: order.store,
            order: order.uuid,
            readable_id: order.readable_id.clone(),
            status: order.status,
            version: order.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readable_ids_are_zero_padded() {
        assert_eq!(ReadableOrderId::new("RN", 42).as_str(), "RN-00042");
        assert_eq!(ReadableOrderId::new("RN", 123_456).to_string(), "RN-123456");
    }

    #[test]
    fn readable_ids_from_input_are_normalised() {
        assert_eq!(ReadableOrderId::from(" rn-00042 "), ReadableOrderId::new("RN", 42));
    }
}
