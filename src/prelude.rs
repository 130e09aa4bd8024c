//! Till prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartError, CartLine, LineId},
    checkout::{CheckoutEngine, CheckoutError},
    config::{ConfigError, TillConfig},
    discounts::{Discount, DiscountError},
    inventory::{Inventory, InventoryError},
    ledger::{SaleId, SaleLineRecord, SaleMonth},
    products::{Barcode, Product},
    receipt::Receipt,
    reorder::{REORDER_LEVEL_FLOOR, ReorderStatus},
    reporting::{Kpis, SalesFilter, SalesReport},
    storage::{CsvStorage, MemoryStorage, Storage, StorageError},
};
