//! Cart

use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    items::ServiceUnit,
    pricing::{TotalPriceError, times, zero},
    services::ServiceCatalog,
};

/// Errors related to cart construction or totals.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// A line's currency differs from the cart currency (index, line currency, cart currency).
    #[error("Line {0} has currency {1}, but cart has currency {2}")]
    CurrencyMismatch(usize, &'static str, &'static str),

    /// A line was added with a quantity of zero.
    #[error("Line {0} must have a quantity of at least 1")]
    InvalidQuantity(usize),

    /// A line has a unit price below zero.
    #[error("Line {0} has a negative unit price")]
    NegativePrice(usize),

    /// A line references a service the store does not offer.
    #[error("Unknown service: {0}")]
    UnknownService(String),

    /// Errors bubbled up from total price calculation.
    #[error(transparent)]
    TotalPrice(#[from] TotalPriceError),
}

/// A service line in a customer's cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine<'a> {
    service: String,
    unit_price: Money<'a, Currency>,
    quantity: u32,
    note: Option<String>,
}

impl<'a> CartLine<'a> {
    /// Create a new line.
    pub fn new(service: impl Into<String>, unit_price: Money<'a, Currency>, quantity: u32) -> Self {
        Self {
            service: service.into(),
            unit_price,
            quantity,
            note: None,
        }
    }

    /// Attach a free-text note ("no starch", "delicate").
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Service name.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Unit price.
    pub fn unit_price(&self) -> Money<'a, Currency> {
        self.unit_price
    }

    /// Quantity.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Customer note.
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// Unit price multiplied by quantity.
    ///
    /// # Errors
    ///
    /// Returns a `TotalPriceError` if the total overflows.
    pub fn line_total(&self) -> Result<Money<'a, Currency>, TotalPriceError> {
        times(self.unit_price, self.quantity as usize)
    }
}

/// Cart
#[derive(Debug, Clone, PartialEq)]
pub struct Cart<'a> {
    lines: Vec<CartLine<'a>>,
    currency: &'a Currency,
}

impl<'a> Cart<'a> {
    /// Create a new, empty cart.
    pub fn new(currency: &'a Currency) -> Self {
        Cart {
            lines: Vec::new(),
            currency,
        }
    }

    /// Create a new cart with the given lines.
    ///
    /// # Errors
    ///
    /// Returns a `CartError` if any line is malformed or in the wrong currency.
    pub fn with_lines(
        lines: impl IntoIterator<Item = CartLine<'a>>,
        currency: &'a Currency,
    ) -> Result<Self, CartError> {
        let mut cart = Cart::new(currency);

        lines.into_iter().try_for_each(|line| cart.push(line))?;

        Ok(cart)
    }

    /// Append a line.
    ///
    /// # Errors
    ///
    /// Returns a `CartError` if the line has no quantity, a negative price, or a different
    /// currency to the cart.
    pub fn push(&mut self, line: CartLine<'a>) -> Result<(), CartError> {
        let index = self.lines.len();
        let line_currency = line.unit_price.currency();

        if line_currency != self.currency {
            return Err(CartError::CurrencyMismatch(
                index,
                line_currency.iso_alpha_code,
                self.currency.iso_alpha_code,
            ));
        }

        if line.quantity == 0 {
            return Err(CartError::InvalidQuantity(index));
        }

        if line.unit_price.to_minor_units() < 0 {
            return Err(CartError::NegativePrice(index));
        }

        self.lines.push(line);

        Ok(())
    }

    /// Append a line for a catalogue service at its listed price.
    ///
    /// # Errors
    ///
    /// Returns `CartError::UnknownService` if the catalogue does not list the service, or any
    /// error [`Cart::push`] can return.
    pub fn add_service(
        &mut self,
        catalog: &ServiceCatalog<'a>,
        service: &str,
        quantity: u32,
        note: Option<String>,
    ) -> Result<(), CartError> {
        let price = catalog
            .price_of(service)
            .ok_or_else(|| CartError::UnknownService(service.to_string()))?;

        let mut line = CartLine::new(service, price, quantity);
        line.note = note;

        self.push(line)
    }

    /// Calculate the subtotal of the cart.
    ///
    /// # Errors
    ///
    /// Returns a `CartError` if there was a money arithmetic or overflow error.
    pub fn subtotal(&self) -> Result<Money<'a, Currency>, CartError> {
        let total = self
            .lines
            .iter()
            .try_fold(zero(self.currency), |acc, line| {
                let line_total = line.line_total()?;

                acc.add(line_total).map_err(TotalPriceError::from)
            })?;

        Ok(total)
    }

    /// Expand every line into individually priced units, in cart order.
    pub fn units(&self) -> SmallVec<[ServiceUnit<'_>; 16]> {
        self.lines
            .iter()
            .enumerate()
            .flat_map(|(index, line)| {
                (0..line.quantity).map(move |_| ServiceUnit::new(index, &line.service, line.unit_price))
            })
            .collect()
    }

    /// Iterate over the lines in the cart.
    pub fn iter(&self) -> impl Iterator<Item = &CartLine<'a>> {
        self.lines.iter()
    }

    /// Get the number of lines in the cart.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Get the currency of the cart.
    pub fn currency(&self) -> &'a Currency {
        self.currency
    }

    /// Owned copy of the lines, as snapshotted onto an order.
    pub fn snapshot(&self) -> Vec<CartLine<'a>> {
        self.lines.clone()
    }
}
