//! Items
//!
//! A cart line of quantity `n` expands into `n` individually priced service units. Promotions
//! only ever see this unit pool.

use rusty_money::{Money, iso};

/// A single priced unit of a service.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ServiceUnit<'a> {
    line: usize,
    service: &'a str,
    price: Money<'a, iso::Currency>,
}

impl<'a> ServiceUnit<'a> {
    /// Creates a new unit for the cart line at index `line`.
    pub fn new(line: usize, service: &'a str, price: Money<'a, iso::Currency>) -> Self {
        Self {
            line,
            service,
            price,
        }
    }

    /// Index of the cart line this unit was expanded from.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Service name.
    pub fn service(&self) -> &'a str {
        self.service
    }

    /// Returns the price of the unit
    pub fn price(&self) -> &Money<'a, iso::Currency> {
        &self.price
    }
}

/// Sort units by price, cheapest first. Equal prices keep their cart order.
pub fn sort_cheapest_first(units: &mut [ServiceUnit<'_>]) {
    units.sort_by_key(|unit| unit.price().to_minor_units());
}

/// Sort units by price, most expensive first. Equal prices keep their cart order.
pub fn sort_most_expensive_first(units: &mut [ServiceUnit<'_>]) {
    units.sort_by(|a, b| b.price().to_minor_units().cmp(&a.price().to_minor_units()));
}
