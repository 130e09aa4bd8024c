//! Storage adapters
//!
//! The till core is written against the [`Storage`] trait so the checkout
//! and reporting logic can be exercised against an in-memory fake; the CSV
//! adapter is what a real till session runs on.

use std::path::PathBuf;

use thiserror::Error;

use crate::{
    inventory::{Inventory, InventoryError},
    ledger::SaleLineRecord,
};

pub mod csv;
pub mod memory;

pub use csv::CsvStorage;
pub use memory::MemoryStorage;

/// Errors raised by storage adapters.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying file could not be read or written.
    #[error("failed to access {path}: {source}")]
    Io {
        /// File the operation touched.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A row could not be parsed or written.
    #[error(transparent)]
    Csv(#[from] ::csv::Error),

    /// The loaded inventory table failed validation.
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// Another till session holds the write lock.
    #[error("storage is locked by another till session (lock file: {0})")]
    Locked(PathBuf),
}

/// Persistence contract for the two till tables.
///
/// The inventory table is read fully and rewritten fully; the sales ledger
/// is append-only — the header is written once, rows are only ever added.
pub trait Storage {
    /// Loads and validates the full inventory table.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the table cannot be read or fails
    /// validation.
    fn load_inventory(&self) -> Result<Inventory, StorageError>;

    /// Rewrites the full inventory table, inactive rows included.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the table cannot be written or the
    /// write lock is held elsewhere.
    fn save_inventory(&mut self, inventory: &Inventory) -> Result<(), StorageError>;

    /// Loads the full sales ledger. A missing ledger is an empty ledger.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the ledger exists but cannot be read.
    fn load_sales(&self) -> Result<Vec<SaleLineRecord>, StorageError>;

    /// Appends rows to the sales ledger, creating it (with a header) on
    /// first use.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the rows cannot be written or the
    /// write lock is held elsewhere.
    fn append_sales(&mut self, rows: &[SaleLineRecord]) -> Result<(), StorageError>;
}
