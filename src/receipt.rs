//! Receipt

use jiff::civil::DateTime;
use rust_decimal::Decimal;
use smallvec::SmallVec;
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{Alignment, Style, Theme, object::Columns},
};

use crate::{
    discounts::round_currency,
    ledger::{SaleId, SaleLineRecord},
};

/// Final receipt for a completed checkout.
///
/// Carries the exact rows that were appended to the ledger, plus the cart
/// totals they were derived from.
#[derive(Debug, Clone)]
pub struct Receipt {
    sale_id: SaleId,
    timestamp: DateTime,
    membership: Option<String>,
    lines: SmallVec<[SaleLineRecord; 8]>,
    subtotal: Decimal,
    discount_amount: Decimal,
    total: Decimal,
}

impl Receipt {
    /// Creates a new receipt with the given details.
    #[must_use]
    pub fn new(
        sale_id: SaleId,
        timestamp: DateTime,
        membership: Option<String>,
        lines: SmallVec<[SaleLineRecord; 8]>,
        subtotal: Decimal,
        discount_amount: Decimal,
        total: Decimal,
    ) -> Self {
        Self {
            sale_id,
            timestamp,
            membership,
            lines,
            subtotal,
            discount_amount,
            total,
        }
    }

    /// Sale identifier shared by all ledger rows of this checkout.
    #[must_use]
    pub fn sale_id(&self) -> SaleId {
        self.sale_id
    }

    /// Checkout time, seconds precision.
    #[must_use]
    pub fn timestamp(&self) -> DateTime {
        self.timestamp
    }

    /// Membership id the sale was recorded under.
    #[must_use]
    pub fn membership(&self) -> Option<&str> {
        self.membership.as_deref()
    }

    /// The ledger rows written for this sale.
    #[must_use]
    pub fn lines(&self) -> &[SaleLineRecord] {
        &self.lines
    }

    /// Cart subtotal before the discount.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    /// Amount the cart-level discount took off the subtotal.
    #[must_use]
    pub fn discount_amount(&self) -> Decimal {
        self.discount_amount
    }

    /// Amount actually paid.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.total
    }

    /// Renders the receipt as a printable table with a totals footer.
    #[must_use]
    pub fn render(&self, currency_symbol: &str) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Qty", "Item", "Unit Price", "Line Total"]);

        for line in &self.lines {
            builder.push_record([
                line.qty.to_string(),
                line.product_name.clone(),
                format!("{currency_symbol}{:.2}", line.unit_price),
                format!("{currency_symbol}{:.2}", line.line_total),
            ]);
        }

        let mut table = builder.build();
        let mut theme = Theme::from(Style::modern_rounded());
        let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

        theme.remove_horizontal_lines();
        theme.insert_horizontal_line(1, separator);

        table.with(theme);
        table.modify(Columns::new(2..), Alignment::right());

        let mut out = table.to_string();
        out.push_str(&format!(
            "\n Subtotal: {currency_symbol}{:.2}",
            round_currency(self.subtotal)
        ));
        if !self.discount_amount.is_zero() {
            out.push_str(&format!(
                "\n Discount: -{currency_symbol}{:.2}",
                round_currency(self.discount_amount)
            ));
        }
        out.push_str(&format!(
            "\n Total: {currency_symbol}{:.2}\n Sale {} at {}",
            round_currency(self.total),
            self.sale_id,
            self.timestamp,
        ));

        out
    }
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;
    use testresult::TestResult;

    use crate::products::Barcode;

    use super::*;

    fn test_receipt() -> TestResult<Receipt> {
        let sale_id = SaleId::generate();
        let timestamp: DateTime = "2025-08-25T10:15:00".parse()?;

        let line = SaleLineRecord {
            sale_id,
            timestamp,
            membership_id: None,
            barcode: Barcode::from("100"),
            product_name: "Rooibos Tea 40s".into(),
            category: "Beverages".into(),
            qty: 2,
            unit_price: Decimal::new(3250, 2),
            line_total: Decimal::new(5850, 2),
            discount: Decimal::from(10),
        };

        Ok(Receipt::new(
            sale_id,
            timestamp,
            None,
            smallvec![line],
            Decimal::new(6500, 2),
            Decimal::new(650, 2),
            Decimal::new(5850, 2),
        ))
    }

    #[test]
    fn accessors_return_values_from_constructor() -> TestResult {
        let receipt = test_receipt()?;

        assert_eq!(receipt.subtotal(), Decimal::new(6500, 2));
        assert_eq!(receipt.discount_amount(), Decimal::new(650, 2));
        assert_eq!(receipt.total(), Decimal::new(5850, 2));
        assert_eq!(receipt.lines().len(), 1);

        Ok(())
    }

    #[test]
    fn render_includes_lines_and_totals() -> TestResult {
        let receipt = test_receipt()?;

        let rendered = receipt.render("R");

        assert!(rendered.contains("Rooibos Tea 40s"), "line item missing");
        assert!(rendered.contains("Subtotal: R65.00"), "subtotal missing");
        assert!(rendered.contains("Discount: -R6.50"), "discount missing");
        assert!(rendered.contains("Total: R58.50"), "total missing");

        Ok(())
    }

    #[test]
    fn render_omits_discount_row_when_zero() -> TestResult {
        let sale_id = SaleId::generate();
        let timestamp: DateTime = "2025-08-25T10:15:00".parse()?;
        let receipt = Receipt::new(
            sale_id,
            timestamp,
            None,
            smallvec![],
            Decimal::ZERO,
            Decimal::ZERO,
            Decimal::ZERO,
        );

        assert!(!receipt.render("R").contains("Discount"), "unexpected discount row");

        Ok(())
    }
}
