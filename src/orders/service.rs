//! Orders service.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::{Timestamp, civil::Weekday};
use mockall::automock;
use tracing::{debug, info, warn};

use crate::{
    checkout::{CodeApplication, LoyaltyChoice, PricingRequest, price},
    discounts::validator::CodeRequest,
    drivers::Driver,
    notifications::{Notification, Notifier},
    orders::{
        errors::OrdersServiceError,
        lifecycle::{self, TransitionRequest},
        models::{
            Actor, DriverAssignment, NewOrder, Order, OrderDraft, OrderPricing, OrderUuid,
            ReadableOrderId,
        },
        repository::{OrderFeed, OrderRepository},
        status::OrderStatus,
    },
    stores::StoreUuid,
};

/// Orders service backed by an [`OrderRepository`].
#[derive(Debug)]
pub struct RepositoryOrdersService<R, N> {
    repository: Arc<R>,
    notifier: Arc<N>,
}

impl<R, N> RepositoryOrdersService<R, N>
where
    R: OrderRepository,
    N: Notifier,
{
    /// Create a service over a repository and notifier.
    #[must_use]
    pub fn new(repository: Arc<R>, notifier: Arc<N>) -> Self {
        Self {
            repository,
            notifier,
        }
    }

    async fn check_drivers(
        &self,
        store: StoreUuid,
        assignment: DriverAssignment,
    ) -> Result<(), OrdersServiceError> {
        for uuid in assignment.drivers() {
            let available = self
                .repository
                .get_driver(uuid)
                .await
                .is_ok_and(|driver| driver.can_serve(store));

            if !available {
                return Err(OrdersServiceError::DriverUnavailable(uuid));
            }
        }

        Ok(())
    }

    async fn current(
        &self,
        actor: Actor,
        order: OrderUuid,
        expected_version: u64,
    ) -> Result<Order, OrdersServiceError> {
        let current = self.repository.get_order(order).await?;

        if !current.is_visible_to(actor) {
            return Err(OrdersServiceError::NotFound);
        }

        if current.version != expected_version {
            debug!(
                order = %current.uuid,
                expected = expected_version,
                actual = current.version,
                "order changed since it was read"
            );

            return Err(OrdersServiceError::Conflict);
        }

        Ok(current)
    }

    async fn save_change(
        &self,
        updated: Order,
        previous: OrderStatus,
        actor: Actor,
    ) -> Result<Order, OrdersServiceError> {
        let saved = self.repository.update_order(updated).await?;

        info!(
            order = %saved.uuid,
            readable_id = %saved.readable_id,
            from = %previous,
            to = %saved.status,
            actor = actor.role(),
            version = saved.version,
            "order updated"
        );

        Ok(saved)
    }

    async fn announce_status(&self, order: &Order) {
        let announced = match self.repository.get_store(order.store).await {
            Ok(store) => store.settings.announces(order.status),
            Err(error) => {
                warn!(order = %order.uuid, %error, "could not load store settings for notification");
                false
            }
        };

        if announced {
            let subject = format!("Order {} is {}", order.readable_id, describe(order.status));
            let body = format!(
                "Your order {} is now {}.",
                order.readable_id,
                describe(order.status)
            );

            self.notify(order, subject, body).await;
        }
    }

    async fn notify(&self, order: &Order, subject: String, body: String) {
        let customer = match self.repository.get_customer(order.customer).await {
            Ok(customer) => customer,
            Err(error) => {
                warn!(order = %order.uuid, %error, "could not load customer for notification");
                return;
            }
        };

        let notification = Notification {
            recipient: customer.email,
            subject,
            body,
        };

        if let Err(error) = self.notifier.send(notification).await {
            warn!(order = %order.uuid, %error, "order notification failed");
        }
    }
}

#[async_trait]
impl<R, N> OrdersService for RepositoryOrdersService<R, N>
where
    R: OrderRepository + 'static,
    N: Notifier + 'static,
{
    async fn place_order(
        &self,
        actor: Actor,
        new: NewOrder,
    ) -> Result<Order, OrdersServiceError> {
        let permitted = match actor {
            Actor::Customer(customer) => customer == new.customer,
            Actor::Staff(_) => true,
            Actor::Driver(_) => false,
        };

        if !permitted {
            return Err(OrdersServiceError::NotPermitted);
        }

        if new.cart.is_empty() {
            return Err(OrdersServiceError::EmptyCart);
        }

        let store = self.repository.get_store(new.store).await?;
        let customer = self.repository.get_customer(new.customer).await?;

        if customer.store != store.uuid {
            return Err(OrdersServiceError::InvalidReference("customer"));
        }

        let promotions = self.repository.list_promotions(store.uuid).await?;

        let codes = match &new.code {
            Some(code) => self.repository.find_discount_codes(code).await?,
            None => Vec::new(),
        };

        let history = self
            .repository
            .customer_history(customer.uuid, store.uuid)
            .await?;

        let account = self
            .repository
            .get_loyalty_account(customer.uuid, store.uuid)
            .await?;

        let now = Timestamp::now();

        let breakdown = price(&PricingRequest {
            cart: &new.cart,
            promotions: &promotions,
            code: new.code.as_deref().map(|code| CodeApplication {
                request: CodeRequest {
                    code,
                    store: store.uuid,
                    history: &history,
                    now,
                },
                codes: &codes,
            }),
            loyalty: LoyaltyChoice {
                balance: account.points_balance,
                redeem: new.redeem_points,
            },
            settings: &store.settings,
            kind: new.kind,
        })?;

        if let Some(rejection) = breakdown.code_rejection {
            return Err(OrdersServiceError::CodeRejected(rejection));
        }

        if let Some(rejection) = breakdown.loyalty_rejection {
            return Err(OrdersServiceError::LoyaltyRejected(rejection));
        }

        let one_time_code = breakdown
            .code
            .as_deref()
            .filter(|applied| {
                codes.iter().any(|code| {
                    code.store() == store.uuid
                        && code.is_one_time_per_customer()
                        && code.matches(applied)
                })
            })
            .map(str::to_string);

        let draft = OrderDraft {
            uuid: OrderUuid::new(),
            store: store.uuid,
            customer: customer.uuid,
            lines: new.cart.snapshot(),
            pricing: OrderPricing::from(&breakdown),
            kind: new.kind,
            expected_points_balance: account.points_balance,
            new_points_balance: breakdown.new_points_balance,
            one_time_code,
            placed_at: now,
        };

        let order = self.repository.commit_order(draft).await?;

        info!(
            order = %order.uuid,
            readable_id = %order.readable_id,
            store = %order.store,
            grand_total = order.pricing.grand_total.to_minor_units(),
            points_earned = order.pricing.points_earned,
            "order placed"
        );

        let subject = format!("Order {} received", order.readable_id);
        let body = format!(
            "Thanks for your order {}. Total to pay: {}.",
            order.readable_id, order.pricing.grand_total
        );

        self.notify(&order, subject, body).await;

        Ok(order)
    }

    async fn get_order(
        &self,
        actor: Actor,
        order: OrderUuid,
    ) -> Result<Order, OrdersServiceError> {
        let order = self.repository.get_order(order).await?;

        if !order.is_visible_to(actor) {
            return Err(OrdersServiceError::NotFound);
        }

        Ok(order)
    }

    async fn find_by_readable_id(
        &self,
        actor: Actor,
        store: StoreUuid,
        readable_id: ReadableOrderId,
    ) -> Result<Order, OrdersServiceError> {
        let order = self
            .repository
            .find_by_readable_id(store, &readable_id)
            .await?;

        if !order.is_visible_to(actor) {
            return Err(OrdersServiceError::NotFound);
        }

        Ok(order)
    }

    async fn assign_drivers(
        &self,
        actor: Actor,
        order: OrderUuid,
        expected_version: u64,
        assignment: DriverAssignment,
    ) -> Result<Order, OrdersServiceError> {
        let current = self.current(actor, order, expected_version).await?;

        let updated = lifecycle::assign_drivers(&current, actor, assignment, Timestamp::now())?;

        self.check_drivers(current.store, assignment).await?;

        self.save_change(updated, current.status, actor).await
    }

    async fn transition(
        &self,
        actor: Actor,
        order: OrderUuid,
        expected_version: u64,
        request: TransitionRequest,
    ) -> Result<Order, OrdersServiceError> {
        let current = self.current(actor, order, expected_version).await?;

        let assignment = DriverAssignment {
            collection: request.collection_driver,
            delivery: request.delivery_driver,
        };

        let updated = lifecycle::transition(&current, actor, request, Timestamp::now())?;

        self.check_drivers(current.store, assignment).await?;

        let saved = self.save_change(updated, current.status, actor).await?;

        self.announce_status(&saved).await;

        Ok(saved)
    }

    async fn force_set_status(
        &self,
        actor: Actor,
        order: OrderUuid,
        expected_version: u64,
        status: OrderStatus,
        reason: Option<String>,
    ) -> Result<Order, OrdersServiceError> {
        let current = self.current(actor, order, expected_version).await?;

        let updated = lifecycle::force_status(&current, actor, status, reason, Timestamp::now())?;

        let saved = self.save_change(updated, current.status, actor).await?;

        self.announce_status(&saved).await;

        Ok(saved)
    }

    async fn available_drivers(
        &self,
        store: StoreUuid,
        day: Weekday,
    ) -> Result<Vec<Driver>, OrdersServiceError> {
        let drivers = self.repository.list_drivers(store).await?;

        Ok(drivers
            .into_iter()
            .filter(|driver| driver.active && driver.works_on(day))
            .collect())
    }

    fn subscribe(&self, store: StoreUuid) -> OrderFeed {
        self.repository.subscribe(store)
    }
}

/// Customer-facing wording for a status.
fn describe(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "awaiting collection",
        OrderStatus::Dispatched => "on its way to be collected",
        OrderStatus::Collecting => "being collected",
        OrderStatus::Collected => "collected",
        OrderStatus::Cleaning => "being cleaned",
        OrderStatus::ReadyForDelivery => "ready for delivery",
        OrderStatus::OutForDelivery => "out for delivery",
        OrderStatus::Delivered => "delivered",
        OrderStatus::Completed => "complete",
        OrderStatus::CollectionFailed => "waiting to be rescheduled",
        OrderStatus::Cancelled => "cancelled",
    }
}

/// Order placement, lookup and lifecycle operations.
#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Price a cart and commit it as a pending order.
    async fn place_order(&self, actor: Actor, new: NewOrder)
    -> Result<Order, OrdersServiceError>;

    /// Retrieve an order the actor is allowed to see.
    async fn get_order(&self, actor: Actor, order: OrderUuid)
    -> Result<Order, OrdersServiceError>;

    /// Look an order up by its readable id.
    async fn find_by_readable_id(
        &self,
        actor: Actor,
        store: StoreUuid,
        readable_id: ReadableOrderId,
    ) -> Result<Order, OrdersServiceError>;

    /// Fill driver slots without changing status.
    ///
    /// `expected_version` is the version of the order the actor is looking at; the change is
    /// rejected with [`OrdersServiceError::Conflict`] if the order has moved on since.
    async fn assign_drivers(
        &self,
        actor: Actor,
        order: OrderUuid,
        expected_version: u64,
        assignment: DriverAssignment,
    ) -> Result<Order, OrdersServiceError>;

    /// Move an order along the transition table, provided it is still at `expected_version`.
    async fn transition(
        &self,
        actor: Actor,
        order: OrderUuid,
        expected_version: u64,
        request: TransitionRequest,
    ) -> Result<Order, OrdersServiceError>;

    /// Administrative override that sets a status without consulting the transition table.
    async fn force_set_status(
        &self,
        actor: Actor,
        order: OrderUuid,
        expected_version: u64,
        status: OrderStatus,
        reason: Option<String>,
    ) -> Result<Order, OrdersServiceError>;

    /// Active drivers working on `day`.
    async fn available_drivers(
        &self,
        store: StoreUuid,
        day: Weekday,
    ) -> Result<Vec<Driver>, OrdersServiceError>;

    /// Subscribe to a store's order changes.
    fn subscribe(&self, store: StoreUuid) -> OrderFeed;
}
