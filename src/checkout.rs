//! Checkout

use jiff::{Unit, Zoned, civil::DateTime};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::{error, info};

use crate::{
    cart::Cart,
    discounts::round_currency,
    inventory::Inventory,
    ledger::{SaleId, SaleLineRecord},
    products::Barcode,
    receipt::Receipt,
    storage::{Storage, StorageError},
};

/// Errors raised by the checkout transaction.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing to check out.
    #[error("cannot check out an empty cart")]
    EmptyCart,

    /// A cart line references a product that has since left the inventory.
    #[error("product {0} no longer in inventory")]
    ProductNotFound(Barcode),

    /// Stock changed since the line was added and can no longer cover it.
    /// Nothing was written.
    #[error("insufficient stock for {name} at checkout: {available} available, {requested} requested")]
    InsufficientStock {
        /// Product display name.
        name: String,
        /// Units currently in stock.
        available: u32,
        /// Units the cart line asks for.
        requested: u32,
    },

    /// The ledger rows were appended but the inventory save failed.
    ///
    /// This is the documented inconsistency window: the sale identified by
    /// `sale_id` is on the ledger while the persisted stock counts still
    /// predate it. The cart is left intact for the operator.
    #[error("sale {sale_id} recorded but inventory save failed")]
    PersistenceFailure {
        /// Sale whose ledger rows are already written.
        sale_id: SaleId,
        /// The underlying storage failure.
        #[source]
        source: StorageError,
    },

    /// Storage failed before anything was written.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Runs the checkout transaction: validate, record, decrement, persist.
#[derive(Debug)]
pub struct CheckoutEngine<S> {
    storage: S,
}

impl<S: Storage> CheckoutEngine<S> {
    /// Creates an engine over the given storage adapter.
    pub fn new(storage: S) -> Self {
        CheckoutEngine { storage }
    }

    /// The storage adapter.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Consumes the engine, returning the storage adapter.
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Checks out the cart at the current wall-clock time.
    ///
    /// # Errors
    ///
    /// See [`Self::checkout_at`].
    pub fn checkout(
        &mut self,
        inventory: &mut Inventory,
        cart: &mut Cart,
    ) -> Result<Receipt, CheckoutError> {
        let now = Zoned::now().datetime();
        let timestamp = now.round(Unit::Second).unwrap_or(now);

        self.checkout_at(inventory, cart, timestamp)
    }

    /// Checks out the cart, stamping every ledger row with `timestamp`.
    ///
    /// Every line is re-validated against current stock first; if any line
    /// fails, nothing is written and nothing is decremented. On success the
    /// ledger rows are appended under one fresh sale id, stock is
    /// decremented (floored at 0), the inventory is rewritten, and the
    /// cart is cleared.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::EmptyCart`] for a cart with no lines.
    /// - [`CheckoutError::ProductNotFound`] / [`CheckoutError::InsufficientStock`]
    ///   from revalidation; state is unchanged.
    /// - [`CheckoutError::PersistenceFailure`] when the inventory save
    ///   fails after the ledger append; the cart is left intact.
    pub fn checkout_at(
        &mut self,
        inventory: &mut Inventory,
        cart: &mut Cart,
        timestamp: DateTime,
    ) -> Result<Receipt, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        // Stock may have moved since the lines were added; all-or-nothing.
        for line in cart.iter() {
            let product = inventory
                .get(line.barcode())
                .ok_or_else(|| CheckoutError::ProductNotFound(line.barcode().clone()))?;

            if line.qty() > product.stock_qty {
                return Err(CheckoutError::InsufficientStock {
                    name: line.name().to_owned(),
                    available: product.stock_qty,
                    requested: line.qty(),
                });
            }
        }

        let sale_id = SaleId::generate();
        let subtotal = cart.subtotal();
        let discount = cart.discount();
        let discount_amount = cart.discount_amount();
        let membership = cart.membership().map(str::to_owned);

        let mut rows: SmallVec<[SaleLineRecord; 8]> = SmallVec::new();
        for line in cart.iter() {
            let pretotal = line.pretotal();
            let share = discount.allocate(pretotal, subtotal);

            rows.push(SaleLineRecord {
                sale_id,
                timestamp,
                membership_id: membership.clone(),
                barcode: line.barcode().clone(),
                product_name: line.name().to_owned(),
                category: line.category().to_owned(),
                qty: line.qty(),
                unit_price: line.unit_price(),
                line_total: round_currency(pretotal - share),
                discount: discount.recorded_value(),
            });
        }

        self.storage.append_sales(&rows)?;

        for line in cart.iter() {
            inventory.decrement_stock(line.barcode(), line.qty());
        }

        if let Err(source) = self.storage.save_inventory(inventory) {
            // The sale is on the ledger but the stock counts on disk are
            // stale. Logged distinctly so reconciliation can find it.
            error!(
                sale_id = %sale_id,
                reason = %source,
                "inventory save failed after ledger append; sale needs reconciliation"
            );

            return Err(CheckoutError::PersistenceFailure { sale_id, source });
        }

        let total = subtotal - discount_amount;
        info!(
            sale_id = %sale_id,
            lines = rows.len(),
            total = %round_currency(total),
            "checkout complete"
        );

        cart.clear();

        Ok(Receipt::new(
            sale_id,
            timestamp,
            membership,
            rows,
            subtotal,
            discount_amount,
            total,
        ))
    }
}
