//! CSV-backed storage

use std::{
    fs::{self, OpenOptions},
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{inventory::Inventory, ledger::SaleLineRecord, products::Product};

use super::{Storage, StorageError};

/// Storage adapter over two CSV files: the inventory table and the
/// append-only sales ledger.
///
/// Writes are serialized through a sidecar lock file so two till sessions
/// against the same files cannot interleave; the second writer fails fast
/// with [`StorageError::Locked`] instead.
#[derive(Debug, Clone)]
pub struct CsvStorage {
    inventory: PathBuf,
    sales: PathBuf,
    lock_file: PathBuf,
}

impl CsvStorage {
    /// Creates an adapter over the given inventory and ledger paths.
    ///
    /// The lock file lives next to the ledger as `<ledger>.lock`.
    pub fn new(inventory: impl Into<PathBuf>, sales: impl Into<PathBuf>) -> Self {
        let sales = sales.into();
        let mut lock_name = sales.as_os_str().to_owned();
        lock_name.push(".lock");

        CsvStorage {
            inventory: inventory.into(),
            sales,
            lock_file: PathBuf::from(lock_name),
        }
    }

    /// Path of the inventory table.
    #[must_use]
    pub fn inventory_path(&self) -> &Path {
        &self.inventory
    }

    /// Path of the sales ledger.
    #[must_use]
    pub fn sales_path(&self) -> &Path {
        &self.sales
    }

    fn lock(&self) -> Result<WriteLock, StorageError> {
        WriteLock::acquire(&self.lock_file)
    }
}

impl Storage for CsvStorage {
    fn load_inventory(&self) -> Result<Inventory, StorageError> {
        let mut reader = ::csv::ReaderBuilder::new()
            .trim(::csv::Trim::All)
            .from_path(&self.inventory)
            .map_err(|e| map_open_error(e, &self.inventory))?;

        let mut rows: Vec<Product> = Vec::new();
        for result in reader.deserialize() {
            rows.push(result?);
        }

        debug!(rows = rows.len(), path = %self.inventory.display(), "inventory loaded");

        Ok(Inventory::from_rows(rows)?)
    }

    fn save_inventory(&mut self, inventory: &Inventory) -> Result<(), StorageError> {
        let _lock = self.lock()?;

        let mut writer = ::csv::Writer::from_path(&self.inventory)
            .map_err(|e| map_open_error(e, &self.inventory))?;

        for product in inventory.iter() {
            writer.serialize(product)?;
        }
        writer.flush().map_err(|source| StorageError::Io {
            path: self.inventory.clone(),
            source,
        })?;

        debug!(rows = inventory.len(), path = %self.inventory.display(), "inventory saved");

        Ok(())
    }

    fn load_sales(&self) -> Result<Vec<SaleLineRecord>, StorageError> {
        if !self.sales.exists() {
            return Ok(Vec::new());
        }

        let mut reader = ::csv::ReaderBuilder::new()
            .trim(::csv::Trim::All)
            .from_path(&self.sales)
            .map_err(|e| map_open_error(e, &self.sales))?;

        let mut rows = Vec::new();
        for result in reader.deserialize() {
            rows.push(result?);
        }

        Ok(rows)
    }

    fn append_sales(&mut self, rows: &[SaleLineRecord]) -> Result<(), StorageError> {
        let _lock = self.lock()?;

        // Header goes in once, when the ledger file is first created.
        let write_header = !self.sales.exists();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.sales)
            .map_err(|source| StorageError::Io {
                path: self.sales.clone(),
                source,
            })?;

        let mut writer = ::csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);

        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush().map_err(|source| StorageError::Io {
            path: self.sales.clone(),
            source,
        })?;

        debug!(rows = rows.len(), path = %self.sales.display(), "ledger rows appended");

        Ok(())
    }
}

/// Exclusive write lock held for the duration of one storage write.
///
/// Acquisition creates the lock file with `create_new`, which is atomic on
/// every platform the till runs on; the file is removed on drop.
#[derive(Debug)]
struct WriteLock {
    path: PathBuf,
}

impl WriteLock {
    fn acquire(path: &Path) -> Result<Self, StorageError> {
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(_) => Ok(WriteLock {
                path: path.to_path_buf(),
            }),
            Err(source) if source.kind() == ErrorKind::AlreadyExists => {
                Err(StorageError::Locked(path.to_path_buf()))
            }
            Err(source) => Err(StorageError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        if let Err(error) = fs::remove_file(&self.path) {
            debug!(path = %self.path.display(), reason = %error, "failed to remove lock file");
        }
    }
}

fn map_open_error(error: ::csv::Error, path: &Path) -> StorageError {
    if error.is_io_error() {
        match error.into_kind() {
            ::csv::ErrorKind::Io(source) => StorageError::Io {
                path: path.to_path_buf(),
                source,
            },
            _ => unreachable!("is_io_error guarantees an Io kind"),
        }
    } else {
        StorageError::Csv(error)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn write_lock_is_exclusive_and_released_on_drop() -> TestResult {
        let dir = tempfile::tempdir()?;
        let lock_path = dir.path().join("sales_log.csv.lock");

        let lock = WriteLock::acquire(&lock_path)?;
        let contended = WriteLock::acquire(&lock_path);
        assert!(matches!(contended, Err(StorageError::Locked(_))));

        drop(lock);
        let reacquired = WriteLock::acquire(&lock_path);
        assert!(reacquired.is_ok(), "lock not released on drop");

        Ok(())
    }

    #[test]
    fn load_sales_with_missing_file_is_empty() {
        let storage = CsvStorage::new("/nonexistent/inventory.csv", "/nonexistent/sales_log.csv");

        let rows = storage.load_sales();

        assert!(matches!(rows, Ok(rows) if rows.is_empty()));
    }
}
