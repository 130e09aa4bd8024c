//! In-memory storage fake

use crate::{inventory::Inventory, ledger::SaleLineRecord, products::Product};

use super::{Storage, StorageError};

/// In-memory [`Storage`] implementation for tests and dry runs.
///
/// Holds both tables as plain vectors. `fail_inventory_saves` simulates a
/// broken inventory file to exercise the post-append persistence failure
/// path.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inventory_rows: Vec<Product>,
    sales: Vec<SaleLineRecord>,
    fail_inventory_saves: bool,
}

impl MemoryStorage {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        MemoryStorage::default()
    }

    /// Creates storage seeded with inventory rows.
    #[must_use]
    pub fn with_inventory(rows: impl Into<Vec<Product>>) -> Self {
        MemoryStorage {
            inventory_rows: rows.into(),
            ..MemoryStorage::default()
        }
    }

    /// Makes every subsequent `save_inventory` fail.
    pub fn fail_inventory_saves(&mut self) {
        self.fail_inventory_saves = true;
    }

    /// All ledger rows appended so far.
    #[must_use]
    pub fn sales(&self) -> &[SaleLineRecord] {
        &self.sales
    }

    /// The inventory rows as last saved.
    #[must_use]
    pub fn inventory_rows(&self) -> &[Product] {
        &self.inventory_rows
    }
}

impl Storage for MemoryStorage {
    fn load_inventory(&self) -> Result<Inventory, StorageError> {
        Ok(Inventory::from_rows(self.inventory_rows.clone())?)
    }

    fn save_inventory(&mut self, inventory: &Inventory) -> Result<(), StorageError> {
        if self.fail_inventory_saves {
            return Err(StorageError::Io {
                path: "memory://inventory".into(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            });
        }

        self.inventory_rows = inventory.rows().to_vec();

        Ok(())
    }

    fn load_sales(&self) -> Result<Vec<SaleLineRecord>, StorageError> {
        Ok(self.sales.clone())
    }

    fn append_sales(&mut self, rows: &[SaleLineRecord]) -> Result<(), StorageError> {
        self.sales.extend_from_slice(rows);

        Ok(())
    }
}
