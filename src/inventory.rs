//! Inventory

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::products::{Barcode, Product};

/// Errors raised while validating an inventory table.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Two rows share the same barcode.
    #[error("duplicate barcode in inventory: {0}")]
    DuplicateBarcode(Barcode),

    /// A row carries a negative price or cost price.
    #[error("product {0} has a negative price or cost price")]
    NegativePrice(Barcode),
}

/// The full product table, indexed by barcode.
///
/// Row order is preserved so the table can be rewritten to storage exactly
/// as it was loaded, inactive rows included.
#[derive(Debug, Default)]
pub struct Inventory {
    rows: Vec<Product>,
    index: FxHashMap<Barcode, usize>,
}

impl Inventory {
    /// Creates an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Inventory::default()
    }

    /// Builds an inventory from rows, validating them on the way in.
    ///
    /// # Errors
    ///
    /// Returns an [`InventoryError`] if two rows share a barcode or a row
    /// carries a negative price.
    pub fn from_rows(rows: impl Into<Vec<Product>>) -> Result<Self, InventoryError> {
        let rows = rows.into();
        let mut index = FxHashMap::default();

        for (i, product) in rows.iter().enumerate() {
            if product.price < Decimal::ZERO || product.cost_price < Decimal::ZERO {
                return Err(InventoryError::NegativePrice(product.barcode.clone()));
            }

            if index.insert(product.barcode.clone(), i).is_some() {
                return Err(InventoryError::DuplicateBarcode(product.barcode.clone()));
            }
        }

        Ok(Inventory { rows, index })
    }

    /// Looks up a product by barcode, active or not.
    #[must_use]
    pub fn get(&self, barcode: &Barcode) -> Option<&Product> {
        self.index.get(barcode).and_then(|&i| self.rows.get(i))
    }

    /// Looks up a product that can currently be sold.
    ///
    /// Inactive products are treated as absent, matching how the till
    /// refuses to scan them.
    #[must_use]
    pub fn get_active(&self, barcode: &Barcode) -> Option<&Product> {
        self.get(barcode).filter(|product| product.is_active)
    }

    /// Decrements stock for a product by the quantity sold, floored at 0.
    ///
    /// Unknown barcodes are skipped; checkout validation has already run by
    /// the time this is called, so a miss means the row was removed
    /// mid-session.
    pub fn decrement_stock(&mut self, barcode: &Barcode, qty: u32) {
        if let Some(product) = self
            .index
            .get(barcode)
            .copied()
            .and_then(|i| self.rows.get_mut(i))
        {
            product.stock_qty = product.stock_qty.saturating_sub(qty);
        }
    }

    /// Iterates over all rows in table order.
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.rows.iter()
    }

    /// All rows in table order.
    #[must_use]
    pub fn rows(&self) -> &[Product] {
        &self.rows
    }

    /// Number of rows, inactive included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of active products.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.rows.iter().filter(|product| product.is_active).count()
    }
}
