//! Orders service errors.

use thiserror::Error;

use crate::{
    checkout::PricingError,
    discounts::validator::CodeRejection,
    drivers::DriverUuid,
    loyalty::LoyaltyRejection,
    orders::{lifecycle::TransitionError, repository::RepositoryError},
};

/// Errors returned by the orders service.
#[derive(Debug, Error)]
pub enum OrdersServiceError {
    /// The order does not exist or is not visible to the actor.
    #[error("order not found")]
    NotFound,

    /// A related store, customer or driver does not exist.
    #[error("{0} not found")]
    InvalidReference(&'static str),

    /// The record already exists.
    #[error("{0} already exists")]
    AlreadyExists(&'static str),

    /// The order, or the loyalty balance it was priced against, changed since it was read.
    #[error("order was changed by someone else, reload and try again")]
    Conflict,

    /// Orders need at least one line.
    #[error("cannot place an order with an empty cart")]
    EmptyCart,

    /// The driver is inactive or works for another store.
    #[error("driver {0} cannot be assigned to this order")]
    DriverUnavailable(DriverUuid),

    /// Only the customer may place orders on their own account.
    #[error("not permitted")]
    NotPermitted,

    /// The entered discount code does not apply.
    #[error(transparent)]
    CodeRejected(CodeRejection),

    /// The requested points redemption cannot happen.
    #[error(transparent)]
    LoyaltyRejected(LoyaltyRejection),

    /// The status change was rejected.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// The order could not be priced.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

impl From<RepositoryError> for OrdersServiceError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound("order") => Self::NotFound,
            RepositoryError::NotFound(record) => Self::InvalidReference(record),
            RepositoryError::AlreadyExists(record) => Self::AlreadyExists(record),
            RepositoryError::Conflict { .. } | RepositoryError::StaleLoyaltyBalance { .. } => {
                Self::Conflict
            }
            RepositoryError::CodeAlreadyUsed(_) => Self::CodeRejected(CodeRejection::AlreadyUsed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_orders_and_references_are_distinguished() {
        assert!(matches!(
            OrdersServiceError::from(RepositoryError::NotFound("order")),
            OrdersServiceError::NotFound
        ));
        assert!(matches!(
            OrdersServiceError::from(RepositoryError::NotFound("driver")),
            OrdersServiceError::InvalidReference("driver")
        ));
        assert!(matches!(
            OrdersServiceError::from(RepositoryError::Conflict {
                expected: 1,
                actual: 2
            }),
            OrdersServiceError::Conflict
        ));
    }

    #[test]
    fn commit_races_surface_as_conflicts_and_used_codes() {
        assert!(matches!(
            OrdersServiceError::from(RepositoryError::StaleLoyaltyBalance {
                expected: 120,
                actual: 21
            }),
            OrdersServiceError::Conflict
        ));
        assert!(matches!(
            OrdersServiceError::from(RepositoryError::CodeAlreadyUsed("once".to_string())),
            OrdersServiceError::CodeRejected(CodeRejection::AlreadyUsed)
        ));
    }
}
