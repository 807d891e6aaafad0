//! Receipt

use std::io;

use rusty_money::{Money, iso::Currency};
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    cart::{Cart, CartError},
    checkout::PriceBreakdown,
};

/// Errors that can occur when writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Error calculating a line total.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// IO error
    #[error("IO error")]
    IO,
}

/// A priced cart, ready to print.
#[derive(Debug, Clone, Copy)]
pub struct Receipt<'r, 'a> {
    cart: &'r Cart<'a>,
    breakdown: &'r PriceBreakdown<'a>,
}

impl<'r, 'a> Receipt<'r, 'a> {
    /// Pair a cart with its price breakdown.
    pub fn new(cart: &'r Cart<'a>, breakdown: &'r PriceBreakdown<'a>) -> Self {
        Self { cart, breakdown }
    }

    /// Writes the receipt table and summary.
    ///
    /// # Errors
    ///
    /// Returns an error if a line total cannot be calculated or the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        let mut builder = Builder::default();

        builder.push_record(["Service", "Qty", "Unit Price", "Total", "Note"]);

        for line in self.cart.iter() {
            let total = line.line_total().map_err(CartError::from)?;

            builder.push_record([
                line.service().to_string(),
                line.quantity().to_string(),
                line.unit_price().to_string(),
                total.to_string(),
                line.note().unwrap_or_default().to_string(),
            ]);
        }

        let mut table = builder.build();

        table.with(Style::modern_rounded());
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Columns::new(1..4), Alignment::right());

        writeln!(out, "\n{table}").map_err(|_err| ReceiptError::IO)?;

        self.write_summary(&mut out)
    }

    fn write_summary(&self, out: &mut impl io::Write) -> Result<(), ReceiptError> {
        let breakdown = self.breakdown;
        let mut lines: Vec<(String, String)> = vec![("Subtotal:".to_string(), breakdown.subtotal.to_string())];

        if let Some(promotion) = &breakdown.promotion {
            lines.push((format!("{}:", promotion.name), negated(breakdown.promotion_discount)));
        }

        if let Some(code) = &breakdown.code {
            lines.push((format!("Code {code}:"), negated(breakdown.code_discount)));
        }

        if breakdown.points_redeemed > 0 || breakdown.points_discount.to_minor_units() > 0 {
            lines.push((
                format!("Points ({}):", breakdown.points_redeemed),
                negated(breakdown.points_discount),
            ));
        }

        if breakdown.platform_fee.to_minor_units() > 0 {
            lines.push(("Platform fee:".to_string(), breakdown.platform_fee.to_string()));
        }

        lines.push(("Total:".to_string(), breakdown.grand_total.to_string()));
        lines.push((
            "Points earned:".to_string(),
            breakdown.points_earned.to_string(),
        ));

        let label_width = lines.iter().map(|(label, _)| label.len()).max().unwrap_or_default();
        let value_width = lines.iter().map(|(_, value)| value.len()).max().unwrap_or_default();

        for (label, value) in &lines {
            writeln!(out, " {label:>label_width$}  {value:>value_width$}").map_err(|_err| ReceiptError::IO)?;
        }

        if breakdown.has_additional_qualifying_promotions {
            writeln!(out, "\n Other promotions also qualify, but only one can apply per order.")
                .map_err(|_err| ReceiptError::IO)?;
        }

        if let Some(rejection) = &breakdown.code_rejection {
            writeln!(out, "\n Discount code not applied: {rejection}").map_err(|_err| ReceiptError::IO)?;
        }

        if let Some(rejection) = &breakdown.loyalty_rejection {
            writeln!(out, "\n Points not redeemed: {rejection}").map_err(|_err| ReceiptError::IO)?;
        }

        writeln!(out).map_err(|_err| ReceiptError::IO)
    }
}

fn negated(amount: Money<'_, Currency>) -> String {
    format!("-{amount}")
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use crate::{
        cart::CartLine,
        checkout::{LoyaltyChoice, OrderKind, PricingRequest, price},
        discounts::validator::CodeRejection,
        settings::StoreSettings,
    };

    use super::*;

    #[test]
    fn receipt_lists_lines_and_totals() -> TestResult {
        let cart = Cart::with_lines(
            [
                CartLine::new("shirt", Money::from_minor(300, GBP), 2).with_note("light starch"),
                CartLine::new("duvet", Money::from_minor(1800, GBP), 1),
            ],
            GBP,
        )?;
        let settings = StoreSettings::default();

        let breakdown = price(&PricingRequest {
            cart: &cart,
            promotions: &[],
            code: None,
            loyalty: LoyaltyChoice::default(),
            settings: &settings,
            kind: OrderKind::OneOff,
        })?;

        let mut buf = Vec::new();
        Receipt::new(&cart, &breakdown).write_to(&mut buf)?;
        let output = String::from_utf8(buf)?;

        assert!(output.contains("shirt"));
        assert!(output.contains("light starch"));
        assert!(output.contains("£6.00"));
        assert!(output.contains("£24.00"));
        assert!(output.contains("Points earned:"));
        assert!(!output.contains("Platform fee:"));

        Ok(())
    }

    #[test]
    fn receipt_explains_rejections() -> TestResult {
        let cart = Cart::with_lines([CartLine::new("shirt", Money::from_minor(300, GBP), 1)], GBP)?;

        let breakdown = PriceBreakdown {
            subtotal: Money::from_minor(300, GBP),
            promotion: None,
            promotion_discount: Money::from_minor(0, GBP),
            has_additional_qualifying_promotions: false,
            code: None,
            code_discount: Money::from_minor(0, GBP),
            code_rejection: Some(CodeRejection::Expired),
            points_discount: Money::from_minor(0, GBP),
            points_redeemed: 0,
            points_earned: 3,
            new_points_balance: 3,
            loyalty_rejection: None,
            platform_fee: Money::from_minor(0, GBP),
            grand_total: Money::from_minor(300, GBP),
        };

        let mut buf = Vec::new();
        Receipt::new(&cart, &breakdown).write_to(&mut buf)?;
        let output = String::from_utf8(buf)?;

        assert!(output.contains("Discount code not applied: this discount code has expired"));

        Ok(())
    }
}
