//! Orders Repository

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tokio::sync::{
    RwLock,
    broadcast::{self, error::RecvError},
};
use tracing::debug;

use crate::{
    customers::{Customer, CustomerUuid},
    discounts::{
        codes::{DiscountCode, normalize_code},
        validator::CustomerHistory,
    },
    drivers::{Driver, DriverUuid},
    loyalty::LoyaltyAccount,
    orders::models::{Order, OrderChange, OrderDraft, OrderUuid, ReadableOrderId},
    promotions::Promotion,
    stores::{Store, StoreUuid},
};

const CHANGE_FEED_CAPACITY: usize = 256;

/// Storage errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    /// No record with that identity.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The record was already present.
    #[error("{0} already exists")]
    AlreadyExists(&'static str),

    /// The order changed since it was read.
    #[error("order was changed by someone else (expected version {expected}, found {actual})")]
    Conflict {
        /// Version the write was based on
        expected: u64,
        /// Version currently stored
        actual: u64,
    },

    /// The loyalty balance changed since the order was priced.
    #[error("loyalty balance changed since pricing (priced against {expected}, found {actual})")]
    StaleLoyaltyBalance {
        /// Balance the order was priced against
        expected: i64,
        /// Balance currently stored
        actual: i64,
    },

    /// A one-time code is already on one of the customer's committed orders.
    #[error("discount code {0} was already used by this customer")]
    CodeAlreadyUsed(String),
}

/// Order changes for one store.
#[derive(Debug)]
pub struct OrderFeed {
    store: StoreUuid,
    receiver: broadcast::Receiver<OrderChange>,
}

impl OrderFeed {
    /// Create a feed filtering `receiver` down to `store`.
    pub fn new(store: StoreUuid, receiver: broadcast::Receiver<OrderChange>) -> Self {
        Self { store, receiver }
    }

    /// Wait for the next change to one of the store's orders.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged` if changes were dropped because the subscriber fell behind,
    /// or `RecvError::Closed` once the repository is gone.
    pub async fn recv(&mut self) -> Result<OrderChange, RecvError> {
        loop {
            let change = self.receiver.recv().await?;

            if change.store == self.store {
                return Ok(change);
            }
        }
    }
}

/// Persistence for stores, drivers, customers, pricing inputs and orders.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Retrieve a store.
    async fn get_store(&self, store: StoreUuid) -> Result<Store, RepositoryError>;

    /// Retrieve a customer.
    async fn get_customer(&self, customer: CustomerUuid) -> Result<Customer, RepositoryError>;

    /// Retrieve a driver.
    async fn get_driver(&self, driver: DriverUuid) -> Result<Driver, RepositoryError>;

    /// All drivers employed by a store.
    async fn list_drivers(&self, store: StoreUuid) -> Result<Vec<Driver>, RepositoryError>;

    /// A store's promotions, in stored order.
    async fn list_promotions(
        &self,
        store: StoreUuid,
    ) -> Result<Vec<Promotion<'static>>, RepositoryError>;

    /// Discount codes matching `code` across every store.
    async fn find_discount_codes(
        &self,
        code: &str,
    ) -> Result<Vec<DiscountCode<'static>>, RepositoryError>;

    /// A customer's loyalty account with a store; new customers have an empty account.
    async fn get_loyalty_account(
        &self,
        customer: CustomerUuid,
        store: StoreUuid,
    ) -> Result<LoyaltyAccount, RepositoryError>;

    /// The codes referenced by a customer's committed orders with a store.
    async fn customer_history(
        &self,
        customer: CustomerUuid,
        store: StoreUuid,
    ) -> Result<CustomerHistory, RepositoryError>;

    /// Atomically create an order and write the customer's new loyalty balance.
    ///
    /// Fails without writing anything if the balance no longer matches
    /// `draft.expected_points_balance`, or if `draft.one_time_code` is already on one of the
    /// customer's orders with the store.
    async fn commit_order(&self, draft: OrderDraft) -> Result<Order, RepositoryError>;

    /// Retrieve an order.
    async fn get_order(&self, order: OrderUuid) -> Result<Order, RepositoryError>;

    /// Retrieve an order by its readable id.
    async fn find_by_readable_id(
        &self,
        store: StoreUuid,
        readable_id: &ReadableOrderId,
    ) -> Result<Order, RepositoryError>;

    /// Replace an order, provided nobody else has written it since `order.version` was read.
    async fn update_order(&self, order: Order) -> Result<Order, RepositoryError>;

    /// Subscribe to changes to a store's orders.
    fn subscribe(&self, store: StoreUuid) -> OrderFeed;
}

#[derive(Debug, Default)]
struct Tables {
    stores: FxHashMap<StoreUuid, Store>,
    customers: FxHashMap<CustomerUuid, Customer>,
    drivers: FxHashMap<DriverUuid, Driver>,
    promotions: FxHashMap<StoreUuid, Vec<Promotion<'static>>>,
    discount_codes: Vec<DiscountCode<'static>>,
    loyalty: FxHashMap<(CustomerUuid, StoreUuid), i64>,
    orders: FxHashMap<OrderUuid, Order>,
    sequences: FxHashMap<StoreUuid, u64>,
}

/// In-memory repository.
#[derive(Debug)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
    changes: broadcast::Sender<OrderChange>,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);

        Self {
            tables: RwLock::new(Tables::default()),
            changes,
        }
    }

    /// Add or replace a store.
    pub async fn insert_store(&self, store: Store) {
        self.tables.write().await.stores.insert(store.uuid, store);
    }

    /// Add or replace a customer.
    pub async fn insert_customer(&self, customer: Customer) {
        self.tables.write().await.customers.insert(customer.uuid, customer);
    }

    /// Add or replace a driver.
    pub async fn insert_driver(&self, driver: Driver) {
        self.tables.write().await.drivers.insert(driver.uuid, driver);
    }

    /// Append a promotion to a store's list.
    pub async fn insert_promotion(&self, store: StoreUuid, promotion: Promotion<'static>) {
        self.tables
            .write()
            .await
            .promotions
            .entry(store)
            .or_default()
            .push(promotion);
    }

    /// Add a discount code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::AlreadyExists` if the store already has a code with the same
    /// text.
    pub async fn insert_discount_code(
        &self,
        code: DiscountCode<'static>,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;

        let duplicate = tables
            .discount_codes
            .iter()
            .any(|existing| existing.store() == code.store() && existing.matches(code.code()));

        if duplicate {
            return Err(RepositoryError::AlreadyExists("discount code"));
        }

        tables.discount_codes.push(code);

        Ok(())
    }

    /// Set a customer's loyalty balance with a store.
    pub async fn set_loyalty_balance(&self, customer: CustomerUuid, store: StoreUuid, balance: i64) {
        self.tables
            .write()
            .await
            .loyalty
            .insert((customer, store), balance);
    }

    fn publish(&self, order: &Order) {
        if self.changes.send(OrderChange::from(order)).is_err() {
            debug!(order = %order.uuid, "no order change subscribers");
        }
    }
}

#[async_trait]
impl OrderRepository for InMemoryRepository {
    async fn get_store(&self, store: StoreUuid) -> Result<Store, RepositoryError> {
        self.tables
            .read()
            .await
            .stores
            .get(&store)
            .cloned()
            .ok_or(RepositoryError::NotFound("store"))
    }

    async fn get_customer(&self, customer: CustomerUuid) -> Result<Customer, RepositoryError> {
        self.tables
            .read()
            .await
            .customers
            .get(&customer)
            .cloned()
            .ok_or(RepositoryError::NotFound("customer"))
    }

    async fn get_driver(&self, driver: DriverUuid) -> Result<Driver, RepositoryError> {
        self.tables
            .read()
            .await
            .drivers
            .get(&driver)
            .cloned()
            .ok_or(RepositoryError::NotFound("driver"))
    }

    async fn list_drivers(&self, store: StoreUuid) -> Result<Vec<Driver>, RepositoryError> {
        let mut drivers: Vec<Driver> = self
            .tables
            .read()
            .await
            .drivers
            .values()
            .filter(|driver| driver.store == store)
            .cloned()
            .collect();

        drivers.sort_by_key(|driver| driver.uuid);

        Ok(drivers)
    }

    async fn list_promotions(
        &self,
        store: StoreUuid,
    ) -> Result<Vec<Promotion<'static>>, RepositoryError> {
        Ok(self
            .tables
            .read()
            .await
            .promotions
            .get(&store)
            .cloned()
            .unwrap_or_default())
    }

    async fn find_discount_codes(
        &self,
        code: &str,
    ) -> Result<Vec<DiscountCode<'static>>, RepositoryError> {
        Ok(self
            .tables
            .read()
            .await
            .discount_codes
            .iter()
            .filter(|existing| existing.matches(code))
            .cloned()
            .collect())
    }

    async fn get_loyalty_account(
        &self,
        customer: CustomerUuid,
        store: StoreUuid,
    ) -> Result<LoyaltyAccount, RepositoryError> {
        let balance = self
            .tables
            .read()
            .await
            .loyalty
            .get(&(customer, store))
            .copied()
            .unwrap_or_default();

        Ok(LoyaltyAccount {
            customer,
            store,
            points_balance: balance,
        })
    }

    async fn customer_history(
        &self,
        customer: CustomerUuid,
        store: StoreUuid,
    ) -> Result<CustomerHistory, RepositoryError> {
        let tables = self.tables.read().await;

        Ok(CustomerHistory::from_codes(
            tables
                .orders
                .values()
                .filter(|order| order.customer == customer && order.store == store)
                .filter_map(|order| order.pricing.code.as_deref()),
        ))
    }

    async fn commit_order(&self, draft: OrderDraft) -> Result<Order, RepositoryError> {
        let mut tables = self.tables.write().await;

        if tables.orders.contains_key(&draft.uuid) {
            return Err(RepositoryError::AlreadyExists("order"));
        }

        if let Some(code) = &draft.one_time_code {
            let used = tables.orders.values().any(|order| {
                order.customer == draft.customer
                    && order.store == draft.store
                    && order.pricing.code.as_ref() == Some(code)
            });

            if used {
                return Err(RepositoryError::CodeAlreadyUsed(code.clone()));
            }
        }

        let balance = tables
            .loyalty
            .get(&(draft.customer, draft.store))
            .copied()
            .unwrap_or_default();

        if balance != draft.expected_points_balance {
            return Err(RepositoryError::StaleLoyaltyBalance {
                expected: draft.expected_points_balance,
                actual: balance,
            });
        }

        let prefix = tables
            .stores
            .get(&draft.store)
            .map(|store| store.settings.order_id_prefix.clone())
            .ok_or(RepositoryError::NotFound("store"))?;

        let sequence = tables.sequences.entry(draft.store).or_default();
        *sequence += 1;

        let readable_id = ReadableOrderId::new(&prefix, *sequence);

        tables
            .loyalty
            .insert((draft.customer, draft.store), draft.new_points_balance);

        let order = draft.into_order(readable_id);

        tables.orders.insert(order.uuid, order.clone());

        drop(tables);

        self.publish(&order);

        Ok(order)
    }

    async fn get_order(&self, order: OrderUuid) -> Result<Order, RepositoryError> {
        self.tables
            .read()
            .await
            .orders
            .get(&order)
            .cloned()
            .ok_or(RepositoryError::NotFound("order"))
    }

    async fn find_by_readable_id(
        &self,
        store: StoreUuid,
        readable_id: &ReadableOrderId,
    ) -> Result<Order, RepositoryError> {
        self.tables
            .read()
            .await
            .orders
            .values()
            .find(|order| order.store == store && &order.readable_id == readable_id)
            .cloned()
            .ok_or(RepositoryError::NotFound("order"))
    }

    async fn update_order(&self, mut order: Order) -> Result<Order, RepositoryError> {
        let mut tables = self.tables.write().await;

        let stored = tables
            .orders
            .get_mut(&order.uuid)
            .ok_or(RepositoryError::NotFound("order"))?;

        if stored.version != order.version {
            return Err(RepositoryError::Conflict {
                expected: order.version,
                actual: stored.version,
            });
        }

        order.version += 1;
        order.clone_into(stored);

        drop(tables);

        self.publish(&order);

        Ok(order)
    }

    fn subscribe(&self, store: StoreUuid) -> OrderFeed {
        OrderFeed::new(store, self.changes.subscribe())
    }
}
