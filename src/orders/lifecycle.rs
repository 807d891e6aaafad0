//! Order Lifecycle
//!
//! The transition table for order statuses and who may drive each edge. Functions here are
//! pure: they take the current order and return the updated copy, leaving persistence and
//! version checks to the repository.

use jiff::Timestamp;
use thiserror::Error;
use tracing::warn;

use crate::{
    drivers::DriverUuid,
    orders::{
        models::{Actor, DriverAssignment, Order, Proof, StatusChange},
        status::OrderStatus,
    },
};

/// Which driver slot an edge belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverRole {
    /// Takes garments from the customer
    Collection,
    /// Returns garments to the customer
    Delivery,
}

impl DriverRole {
    /// The driver holding this slot on `order`.
    pub fn assigned(self, order: &Order) -> Option<DriverUuid> {
        match self {
            DriverRole::Collection => order.collection_driver,
            DriverRole::Delivery => order.delivery_driver,
        }
    }
}

/// Errors related to status transitions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    /// The edge is not in the transition table.
    #[error("an order cannot move from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: OrderStatus,
        /// Requested status
        to: OrderStatus,
    },

    /// The target status needs a driver in a slot that is empty.
    #[error("a {role:?} driver must be assigned before the order can be {status}")]
    MissingDriverAssignment {
        /// Requested status
        status: OrderStatus,
        /// Empty slot
        role: DriverRole,
    },

    /// A failed collection needs a reason.
    #[error("a reason is required when a collection fails")]
    MissingFailureReason,

    /// Proof can only be attached when garments change hands.
    #[error("a photo or note can only be attached when an order is collected or delivered")]
    ProofNotAllowed,

    /// The actor may not make this change.
    #[error("{role} is not permitted to move this order from {from} to {to}")]
    NotPermitted {
        /// Actor role
        role: &'static str,
        /// Current status
        from: OrderStatus,
        /// Requested status
        to: OrderStatus,
    },

    /// Only staff may assign drivers or override statuses.
    #[error("only staff may {0}")]
    StaffOnly(&'static str),
}

/// A requested status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    /// Target status
    pub to: OrderStatus,
    /// Collection driver to assign in the same change
    pub collection_driver: Option<DriverUuid>,
    /// Delivery driver to assign in the same change
    pub delivery_driver: Option<DriverUuid>,
    /// Reason, required for `collection_failed`
    pub reason: Option<String>,
    /// Photo and note, allowed on `collected` and `delivered`
    pub proof: Option<Proof>,
}

impl TransitionRequest {
    /// A bare request to move to `to`.
    pub fn to(to: OrderStatus) -> Self {
        Self {
            to,
            collection_driver: None,
            delivery_driver: None,
            reason: None,
            proof: None,
        }
    }

    /// Assign a collection driver in the same change.
    #[must_use]
    pub fn with_collection_driver(mut self, driver: DriverUuid) -> Self {
        self.collection_driver = Some(driver);
        self
    }

    /// Assign a delivery driver in the same change.
    #[must_use]
    pub fn with_delivery_driver(mut self, driver: DriverUuid) -> Self {
        self.delivery_driver = Some(driver);
        self
    }

    /// Give a reason.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attach proof.
    #[must_use]
    pub fn with_proof(mut self, proof: Proof) -> Self {
        self.proof = Some(proof);
        self
    }

    fn assignment(&self) -> DriverAssignment {
        DriverAssignment {
            collection: self.collection_driver,
            delivery: self.delivery_driver,
        }
    }
}

/// Whether `from → to` is in the transition table.
pub fn is_allowed(from: OrderStatus, to: OrderStatus) -> bool {
    if from.is_terminal() {
        return false;
    }

    from.next() == Some(to)
        || matches!(
            (from, to),
            (OrderStatus::Collecting, OrderStatus::CollectionFailed)
                | (OrderStatus::CollectionFailed, OrderStatus::Dispatched)
                | (_, OrderStatus::Cancelled)
        )
}

/// The driver slot allowed to drive `from → to`, if drivers may drive it at all.
pub fn driver_role(from: OrderStatus, to: OrderStatus) -> Option<DriverRole> {
    match (from, to) {
        (OrderStatus::Pending, OrderStatus::Dispatched)
        | (OrderStatus::Dispatched, OrderStatus::Collecting)
        | (OrderStatus::Collecting, OrderStatus::Collected | OrderStatus::CollectionFailed) => {
            Some(DriverRole::Collection)
        }
        (OrderStatus::ReadyForDelivery, OrderStatus::OutForDelivery)
        | (OrderStatus::OutForDelivery, OrderStatus::Delivered)
        | (OrderStatus::Delivered, OrderStatus::Completed) => Some(DriverRole::Delivery),
        _ => None,
    }
}

/// The driver slot a status requires to be filled.
pub fn required_driver(status: OrderStatus) -> Option<DriverRole> {
    match status {
        OrderStatus::Dispatched | OrderStatus::Collecting => Some(DriverRole::Collection),
        OrderStatus::OutForDelivery => Some(DriverRole::Delivery),
        _ => None,
    }
}

/// Apply a status transition.
///
/// Every check runs before anything changes, so a rejected request leaves `order` untouched.
/// Driver uuids in the request are assumed to have been checked against the store.
///
/// # Errors
///
/// Returns a [`TransitionError`] if the edge is not in the table, the actor may not drive it,
/// a required driver or reason is missing, or proof is attached to the wrong status.
pub fn transition(
    order: &Order,
    actor: Actor,
    request: TransitionRequest,
    now: Timestamp,
) -> Result<Order, TransitionError> {
    let from = order.status;
    let to = request.to;

    let not_permitted = TransitionError::NotPermitted {
        role: actor.role(),
        from,
        to,
    };

    match actor {
        Actor::Customer(_) => return Err(not_permitted),
        Actor::Staff(_) => {}
        Actor::Driver(driver) => {
            if request.assignment().drivers().next().is_some() {
                return Err(TransitionError::StaffOnly("assign drivers"));
            }

            let permitted = driver_role(from, to)
                .and_then(|role| role.assigned(order))
                .is_some_and(|assigned| assigned == driver);

            if !permitted {
                return Err(not_permitted);
            }
        }
    }

    if !is_allowed(from, to) {
        return Err(TransitionError::InvalidTransition { from, to });
    }

    let mut updated = order.clone();

    assign(&mut updated, request.assignment());

    if let Some(role) = required_driver(to) {
        if role.assigned(&updated).is_none() {
            return Err(TransitionError::MissingDriverAssignment { status: to, role });
        }
    }

    let reason = request
        .reason
        .map(|reason| reason.trim().to_string())
        .filter(|reason| !reason.is_empty());

    if to == OrderStatus::CollectionFailed && reason.is_none() {
        return Err(TransitionError::MissingFailureReason);
    }

    let proof = request.proof.filter(|proof| !proof.is_empty());

    if proof.is_some() && !matches!(to, OrderStatus::Collected | OrderStatus::Delivered) {
        return Err(TransitionError::ProofNotAllowed);
    }

    match to {
        OrderStatus::CollectionFailed => updated.failure_reason.clone_from(&reason),
        OrderStatus::Dispatched => updated.failure_reason = None,
        _ => {}
    }

    record(&mut updated, actor, to, now, false, reason, proof);

    Ok(updated)
}

/// Fill driver slots outside a status change.
///
/// # Errors
///
/// Returns `TransitionError::StaffOnly` unless `actor` is staff, or
/// `TransitionError::InvalidTransition` if the order is closed.
pub fn assign_drivers(
    order: &Order,
    actor: Actor,
    assignment: DriverAssignment,
    now: Timestamp,
) -> Result<Order, TransitionError> {
    if !matches!(actor, Actor::Staff(_)) {
        return Err(TransitionError::StaffOnly("assign drivers"));
    }

    if order.status.is_terminal() {
        return Err(TransitionError::InvalidTransition {
            from: order.status,
            to: order.status,
        });
    }

    let mut updated = order.clone();

    assign(&mut updated, assignment);
    updated.updated_at = now;

    Ok(updated)
}

/// Set a status without consulting the transition table.
///
/// This is an administrative override for staff; the change is recorded as forced.
///
/// # Errors
///
/// Returns `TransitionError::StaffOnly` unless `actor` is staff.
pub fn force_status(
    order: &Order,
    actor: Actor,
    to: OrderStatus,
    reason: Option<String>,
    now: Timestamp,
) -> Result<Order, TransitionError> {
    if !matches!(actor, Actor::Staff(_)) {
        return Err(TransitionError::StaffOnly("override order statuses"));
    }

    warn!(
        order = %order.uuid,
        from = %order.status,
        %to,
        "order status forced"
    );

    let mut updated = order.clone();

    if to == OrderStatus::CollectionFailed {
        updated.failure_reason.clone_from(&reason);
    }

    record(&mut updated, actor, to, now, true, reason, None);

    Ok(updated)
}

fn assign(order: &mut Order, assignment: DriverAssignment) {
    if let Some(driver) = assignment.collection {
        order.collection_driver = Some(driver);
    }

    if let Some(driver) = assignment.delivery {
        order.delivery_driver = Some(driver);
    }
}

fn record(
    order: &mut Order,
    actor: Actor,
    to: OrderStatus,
    at: Timestamp,
    forced: bool,
    reason: Option<String>,
    proof: Option<Proof>,
) {
    order.history.push(StatusChange {
        from: order.status,
        to,
        actor,
        at,
        forced,
        reason,
        proof,
    });

    order.status = to;
    order.updated_at = at;
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::GBP};
    use testresult::TestResult;

    use crate::{
        checkout::OrderKind,
        customers::CustomerUuid,
        orders::models::{OrderDraft, OrderPricing, OrderUuid, ReadableOrderId, StaffUuid},
        stores::StoreUuid,
    };

    use super::*;

    fn order() -> Order {
        let zero = Money::from_minor(0, GBP);

        OrderDraft {
            uuid: OrderUuid::new(),
            store: StoreUuid::new(),
            customer: CustomerUuid::new(),
            lines: Vec::new(),
            pricing: OrderPricing {
                subtotal: zero,
                promotion: None,
                promotion_discount: zero,
                code: None,
                code_discount: zero,
                points_discount: zero,
                points_redeemed: 0,
                points_earned: 0,
                platform_fee: zero,
                grand_total: zero,
            },
            kind: OrderKind::OneOff,
            expected_points_balance: 0,
            new_points_balance: 0,
            one_time_code: None,
            placed_at: Timestamp::UNIX_EPOCH,
        }
        .into_order(ReadableOrderId::new("RN", 1))
    }

    fn staff() -> Actor {
        Actor::Staff(StaffUuid::new())
    }

    #[test]
    fn table_allows_pipeline_failure_and_cancellation() {
        assert!(is_allowed(OrderStatus::Pending, OrderStatus::Dispatched));
        assert!(is_allowed(OrderStatus::Collecting, OrderStatus::CollectionFailed));
        assert!(is_allowed(OrderStatus::CollectionFailed, OrderStatus::Dispatched));
        assert!(is_allowed(OrderStatus::Cleaning, OrderStatus::Cancelled));

        assert!(!is_allowed(OrderStatus::Pending, OrderStatus::Collecting));
        assert!(!is_allowed(OrderStatus::Delivered, OrderStatus::Pending));
        assert!(!is_allowed(OrderStatus::Completed, OrderStatus::Cancelled));
        assert!(!is_allowed(OrderStatus::Cancelled, OrderStatus::Pending));
    }

    #[test]
    fn dispatch_requires_collection_driver_in_same_change() -> TestResult {
        let order = order();
        let driver = DriverUuid::new();

        assert_eq!(
            transition(&order, staff(), TransitionRequest::to(OrderStatus::Dispatched), Timestamp::UNIX_EPOCH),
            Err(TransitionError::MissingDriverAssignment {
                status: OrderStatus::Dispatched,
                role: DriverRole::Collection,
            })
        );

        let dispatched = transition(
            &order,
            staff(),
            TransitionRequest::to(OrderStatus::Dispatched).with_collection_driver(driver),
            Timestamp::UNIX_EPOCH,
        )?;

        assert_eq!(dispatched.status, OrderStatus::Dispatched);
        assert_eq!(dispatched.collection_driver, Some(driver));
        assert_eq!(dispatched.history.len(), 1);
        assert_eq!(order.status, OrderStatus::Pending);

        Ok(())
    }

    #[test]
    fn skipping_a_stage_is_rejected() {
        let request = TransitionRequest::to(OrderStatus::Collecting).with_collection_driver(DriverUuid::new());

        assert_eq!(
            transition(&order(), staff(), request, Timestamp::UNIX_EPOCH),
            Err(TransitionError::InvalidTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Collecting,
            })
        );
    }

    #[test]
    fn collection_failure_needs_a_reason() -> TestResult {
        let mut order = order();
        order.status = OrderStatus::Collecting;
        order.collection_driver = Some(DriverUuid::new());

        assert_eq!(
            transition(
                &order,
                staff(),
                TransitionRequest::to(OrderStatus::CollectionFailed).with_reason("  "),
                Timestamp::UNIX_EPOCH
            ),
            Err(TransitionError::MissingFailureReason)
        );

        let failed = transition(
            &order,
            staff(),
            TransitionRequest::to(OrderStatus::CollectionFailed).with_reason("nobody home"),
            Timestamp::UNIX_EPOCH,
        )?;

        assert_eq!(failed.failure_reason.as_deref(), Some("nobody home"));

        let redispatched = transition(
            &failed,
            staff(),
            TransitionRequest::to(OrderStatus::Dispatched),
            Timestamp::UNIX_EPOCH,
        )?;

        assert_eq!(redispatched.failure_reason, None);

        Ok(())
    }

    #[test]
    fn drivers_only_drive_their_own_edges() -> TestResult {
        let collector = DriverUuid::new();
        let courier = DriverUuid::new();

        let mut order = order();
        order.status = OrderStatus::Dispatched;
        order.collection_driver = Some(collector);
        order.delivery_driver = Some(courier);

        let collecting = transition(
            &order,
            Actor::Driver(collector),
            TransitionRequest::to(OrderStatus::Collecting),
            Timestamp::UNIX_EPOCH,
        )?;

        assert_eq!(collecting.status, OrderStatus::Collecting);

        assert!(matches!(
            transition(
                &order,
                Actor::Driver(courier),
                TransitionRequest::to(OrderStatus::Collecting),
                Timestamp::UNIX_EPOCH,
            ),
            Err(TransitionError::NotPermitted { role: "driver", .. })
        ));

        order.status = OrderStatus::Collected;

        assert!(matches!(
            transition(
                &order,
                Actor::Driver(collector),
                TransitionRequest::to(OrderStatus::Cleaning),
                Timestamp::UNIX_EPOCH,
            ),
            Err(TransitionError::NotPermitted { .. })
        ));

        Ok(())
    }

    #[test]
    fn customers_cannot_transition() {
        assert!(matches!(
            transition(
                &order(),
                Actor::Customer(CustomerUuid::new()),
                TransitionRequest::to(OrderStatus::Cancelled),
                Timestamp::UNIX_EPOCH,
            ),
            Err(TransitionError::NotPermitted { role: "customer", .. })
        ));
    }

    #[test]
    fn proof_is_only_attached_on_hand_over() -> TestResult {
        let proof = Proof {
            photo: Some("photos/123.jpg".to_string()),
            note: Some("left with concierge".to_string()),
        };

        let mut order = order();
        order.status = OrderStatus::Collecting;
        order.collection_driver = Some(DriverUuid::new());

        let collected = transition(
            &order,
            staff(),
            TransitionRequest::to(OrderStatus::Collected).with_proof(proof.clone()),
            Timestamp::UNIX_EPOCH,
        )?;

        assert_eq!(collected.history.last().and_then(|change| change.proof.clone()), Some(proof.clone()));

        assert_eq!(
            transition(
                &collected,
                staff(),
                TransitionRequest::to(OrderStatus::Cleaning).with_proof(proof),
                Timestamp::UNIX_EPOCH,
            ),
            Err(TransitionError::ProofNotAllowed)
        );

        Ok(())
    }

    #[test]
    fn forced_changes_bypass_the_table_and_are_recorded() -> TestResult {
        let order = order();

        let forced = force_status(
            &order,
            staff(),
            OrderStatus::Delivered,
            Some("imported from paper".to_string()),
            Timestamp::UNIX_EPOCH,
        )?;

        let change = forced.history.last().ok_or("missing history")?;

        assert_eq!(forced.status, OrderStatus::Delivered);
        assert!(change.forced);
        assert_eq!(change.from, OrderStatus::Pending);

        assert_eq!(
            force_status(
                &order,
                Actor::Driver(DriverUuid::new()),
                OrderStatus::Delivered,
                None,
                Timestamp::UNIX_EPOCH,
            ),
            Err(TransitionError::StaffOnly("override order statuses"))
        );

        Ok(())
    }

    #[test]
    fn only_staff_assign_drivers() -> TestResult {
        let order = order();
        let driver = DriverUuid::new();
        let assignment = DriverAssignment {
            collection: Some(driver),
            delivery: Some(driver),
        };

        let assigned = assign_drivers(&order, staff(), assignment, Timestamp::UNIX_EPOCH)?;

        assert_eq!(assigned.collection_driver, Some(driver));
        assert_eq!(assigned.delivery_driver, Some(driver));
        assert!(assigned.history.is_empty());

        assert_eq!(
            assign_drivers(&order, Actor::Driver(driver), assignment, Timestamp::UNIX_EPOCH),
            Err(TransitionError::StaffOnly("assign drivers"))
        );

        Ok(())
    }
}
