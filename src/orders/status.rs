//! Order Status

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where an order is in the fulfilment pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed and awaiting dispatch
    Pending,
    /// A collection driver has been sent
    Dispatched,
    /// The collection driver is at the customer
    Collecting,
    /// Garments picked up
    Collected,
    /// At the store being cleaned
    Cleaning,
    /// Cleaned and waiting for a delivery driver
    ReadyForDelivery,
    /// With the delivery driver
    OutForDelivery,
    /// Handed back to the customer
    Delivered,
    /// Closed
    Completed,
    /// Collection did not happen; staff must re-dispatch or cancel
    CollectionFailed,
    /// Cancelled by staff
    Cancelled,
}

impl OrderStatus {
    /// Every status, in pipeline order followed by the failure and cancellation states.
    pub const ALL: [OrderStatus; 11] = [
        OrderStatus::Pending,
        OrderStatus::Dispatched,
        OrderStatus::Collecting,
        OrderStatus::Collected,
        OrderStatus::Cleaning,
        OrderStatus::ReadyForDelivery,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Completed,
        OrderStatus::CollectionFailed,
        OrderStatus::Cancelled,
    ];

    /// The snake case name used in storage and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Dispatched => "dispatched",
            OrderStatus::Collecting => "collecting",
            OrderStatus::Collected => "collected",
            OrderStatus::Cleaning => "cleaning",
            OrderStatus::ReadyForDelivery => "ready_for_delivery",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::CollectionFailed => "collection_failed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// The next stage of the linear pipeline.
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Dispatched),
            OrderStatus::Dispatched => Some(OrderStatus::Collecting),
            OrderStatus::Collecting => Some(OrderStatus::Collected),
            OrderStatus::Collected => Some(OrderStatus::Cleaning),
            OrderStatus::Cleaning => Some(OrderStatus::ReadyForDelivery),
            OrderStatus::ReadyForDelivery => Some(OrderStatus::OutForDelivery),
            OrderStatus::OutForDelivery => Some(OrderStatus::Delivered),
            OrderStatus::Delivered => Some(OrderStatus::Completed),
            OrderStatus::Completed | OrderStatus::CollectionFailed | OrderStatus::Cancelled => {
                None
            }
        }
    }

    /// Whether no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status name that is not recognised.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| UnknownStatus(value.to_string()))
    }
}
