//! Orders
//!
//! Committed orders, their fulfilment lifecycle and the service that places and moves them.

pub mod errors;
pub mod lifecycle;
pub mod models;
pub mod repository;
pub mod service;
pub mod status;

pub use errors::OrdersServiceError;
pub use service::*;
