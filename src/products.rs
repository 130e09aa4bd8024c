//! Products

use std::fmt;
use std::ops::Deref;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Barcode — the stable scanning key for a product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Barcode(String);

impl Barcode {
    /// Creates a new barcode from any string-like value.
    pub fn new(code: impl Into<String>) -> Self {
        Barcode(code.into())
    }

    /// Returns the barcode as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Barcode {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Barcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Barcode {
    fn from(code: &str) -> Self {
        Barcode::new(code)
    }
}

/// Product — one inventory row.
///
/// Field order matches the inventory table columns so the row can be
/// serialized/deserialized as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique scanning key.
    pub barcode: Barcode,

    /// Display name.
    pub name: String,

    /// Category the product is reported under.
    pub category: String,

    /// Brand name.
    pub brand: String,

    /// Supplier name, used on reorder reports.
    pub supplier: String,

    /// Unit selling price.
    pub price: Decimal,

    /// Unit cost price, used for profit calculations.
    pub cost_price: Decimal,

    /// Optional pack size description (for display only).
    pub pack_size: Option<String>,

    /// Units currently in stock.
    pub stock_qty: u32,

    /// Explicit reorder threshold; when absent a dynamic level is derived
    /// from sales history.
    pub reorder_level: Option<u32>,

    /// Inactive products cannot be sold but stay in the table.
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn barcode_derefs_to_str() {
        let barcode = Barcode::new("6001");

        assert_eq!(&*barcode, "6001");
        assert_eq!(barcode.as_str(), "6001");
    }

    #[test]
    fn barcode_displays_raw_code() {
        let barcode = Barcode::from("600123456789");

        assert_eq!(barcode.to_string(), "600123456789");
    }
}
