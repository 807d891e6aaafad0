//! Rinse
//!
//! Rinse is the pricing, promotion, loyalty and order lifecycle core of a pickup-and-delivery
//! garment-care platform. Carts of services are priced at checkout, committed as orders and
//! moved through collection, cleaning and delivery by store staff and drivers.

pub mod cart;
pub mod checkout;
pub mod customers;
pub mod discounts;
pub mod drivers;
pub mod fixtures;
pub mod items;
pub mod loyalty;
pub mod notifications;
pub mod orders;
pub mod prelude;
pub mod pricing;
pub mod promotions;
pub mod receipt;
pub mod services;
pub mod settings;
pub mod stores;
pub mod uuids;
