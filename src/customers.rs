//! Customers

use crate::{stores::StoreUuid, uuids::TypedUuid};

/// Customer UUID
pub type CustomerUuid = TypedUuid<Customer>;

/// A customer of a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    /// Customer identity
    pub uuid: CustomerUuid,
    /// Store the customer belongs to
    pub store: StoreUuid,
    /// Display name
    pub name: String,
    /// Address used for notifications
    pub email: String,
}
