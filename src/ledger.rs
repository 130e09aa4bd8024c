//! Sales ledger

use std::fmt;

use jiff::civil::{Date, DateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::products::Barcode;

/// Sale identifier grouping all line records of one checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaleId(Uuid);

impl SaleId {
    /// Generates a fresh sale identifier.
    #[must_use]
    pub fn generate() -> Self {
        SaleId(Uuid::new_v4())
    }
}

impl fmt::Display for SaleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One persisted ledger row: a single product's quantity and discounted
/// total within one checkout. Append-only; immutable once written.
///
/// Field order matches the ledger table columns. `line_total` is the
/// discounted line total rounded to 2 decimal places; `discount` is the
/// cart-level discount value repeated on every line of the sale for
/// traceability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleLineRecord {
    /// Sale this line belongs to.
    pub sale_id: SaleId,

    /// Checkout time, seconds precision; shared by all lines of the sale.
    pub timestamp: DateTime,

    /// Membership id, if one was given at the till.
    pub membership_id: Option<String>,

    /// Product barcode. A soft reference: the product may later disappear
    /// from the inventory table, and reporting tolerates that.
    pub barcode: Barcode,

    /// Product name at sale time.
    pub product_name: String,

    /// Category at sale time.
    pub category: String,

    /// Units sold.
    pub qty: u32,

    /// Unit price at sale time.
    pub unit_price: Decimal,

    /// Discounted line total, rounded to 2 decimal places.
    pub line_total: Decimal,

    /// Cart-level discount value applied to the whole sale.
    pub discount: Decimal,
}

impl SaleLineRecord {
    /// Calendar month this line was sold in.
    #[must_use]
    pub fn month(&self) -> SaleMonth {
        SaleMonth::of(self.timestamp)
    }

    /// Calendar date this line was sold on.
    #[must_use]
    pub fn sale_date(&self) -> Date {
        self.timestamp.date()
    }
}

/// A calendar month bucket, used for sales velocity and trend grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SaleMonth {
    /// Calendar year.
    pub year: i16,

    /// Month of year, 1–12.
    pub month: i8,
}

impl SaleMonth {
    /// The month bucket a datetime falls in.
    #[must_use]
    pub fn of(timestamp: DateTime) -> Self {
        SaleMonth {
            year: timestamp.year(),
            month: timestamp.month(),
        }
    }
}

impl fmt::Display for SaleMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn month_buckets_by_calendar_month() -> TestResult {
        let january: DateTime = "2025-01-31T23:59:59".parse()?;
        let february: DateTime = "2025-02-01T00:00:00".parse()?;

        assert_ne!(SaleMonth::of(january), SaleMonth::of(february));
        assert_eq!(SaleMonth::of(january), SaleMonth { year: 2025, month: 1 });

        Ok(())
    }

    #[test]
    fn months_order_chronologically() {
        let a = SaleMonth { year: 2024, month: 12 };
        let b = SaleMonth { year: 2025, month: 1 };
        let c = SaleMonth { year: 2025, month: 2 };

        assert!(a < b, "year takes precedence over month");
        assert!(b < c, "months within a year order naturally");
    }

    #[test]
    fn month_displays_as_iso_prefix() {
        let month = SaleMonth { year: 2025, month: 8 };

        assert_eq!(month.to_string(), "2025-08");
    }
}
