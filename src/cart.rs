//! Cart

use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    discounts::{Discount, DiscountError},
    inventory::Inventory,
    products::Barcode,
};

/// Identifier for a single cart line, unique within the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineId(Uuid);

impl LineId {
    fn generate() -> Self {
        LineId(Uuid::new_v4())
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Errors raised by cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Barcode not in inventory, or the product is inactive.
    #[error("product {0} not found in inventory")]
    ProductNotFound(Barcode),

    /// Requested quantity exceeds what is left in stock, counting units
    /// already in the cart.
    #[error("not enough stock for {name}: {available} available")]
    InsufficientStock {
        /// Product display name.
        name: String,
        /// Units still available to this cart.
        available: u32,
    },

    /// Quantity of zero.
    #[error("quantity must be greater than 0")]
    InvalidQuantity,

    /// Removal referenced a line that is not in the cart.
    #[error("line {0} not found in cart")]
    LineNotFound(LineId),

    /// Invalid discount specification.
    #[error(transparent)]
    Discount(#[from] DiscountError),
}

/// One product line in the cart.
///
/// Unit price and display fields are snapshotted from the product at the
/// moment of insertion, not re-read live.
#[derive(Debug, Clone)]
pub struct CartLine {
    id: LineId,
    barcode: Barcode,
    name: String,
    category: String,
    pack_size: Option<String>,
    qty: u32,
    unit_price: Decimal,
}

impl CartLine {
    /// Line identifier.
    #[must_use]
    pub fn id(&self) -> LineId {
        self.id
    }

    /// Barcode of the product.
    #[must_use]
    pub fn barcode(&self) -> &Barcode {
        &self.barcode
    }

    /// Product name at insertion time.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Category at insertion time.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Pack size at insertion time.
    #[must_use]
    pub fn pack_size(&self) -> Option<&str> {
        self.pack_size.as_deref()
    }

    /// Units on this line.
    #[must_use]
    pub fn qty(&self) -> u32 {
        self.qty
    }

    /// Unit price snapshot.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    /// Line total before any discount.
    #[must_use]
    pub fn pretotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.qty)
    }
}

/// The session cart: ordered lines, one cart-level discount, and an
/// optional membership id.
///
/// The cart only mutates its own state; inventory stock is untouched until
/// checkout.
#[derive(Debug, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
    discount: Discount,
    membership: Option<String>,
}

impl Cart {
    /// Creates an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds `qty` units of a product to the cart.
    ///
    /// If a line for the barcode already exists its quantity is
    /// incremented, otherwise a new line is appended with the product's
    /// current price snapshotted. Stock already reserved by the existing
    /// line counts against availability.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`] for a zero quantity.
    /// - [`CartError::ProductNotFound`] for an unknown or inactive barcode.
    /// - [`CartError::InsufficientStock`] when the combined quantity would
    ///   exceed current stock. The cart is left unchanged.
    pub fn add(
        &mut self,
        inventory: &Inventory,
        barcode: &Barcode,
        qty: u32,
    ) -> Result<LineId, CartError> {
        if qty == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let product = inventory
            .get_active(barcode)
            .ok_or_else(|| CartError::ProductNotFound(barcode.clone()))?;

        let reserved = self
            .lines
            .iter()
            .find(|line| &line.barcode == barcode)
            .map_or(0, |line| line.qty);

        // Overflow of the combined quantity can never fit in stock.
        let combined = reserved.checked_add(qty);
        if combined.is_none_or(|total| total > product.stock_qty) {
            return Err(CartError::InsufficientStock {
                name: product.name.clone(),
                available: product.stock_qty.saturating_sub(reserved),
            });
        }

        if let Some(line) = self.lines.iter_mut().find(|line| &line.barcode == barcode) {
            line.qty += qty;
            return Ok(line.id);
        }

        let line = CartLine {
            id: LineId::generate(),
            barcode: barcode.clone(),
            name: product.name.clone(),
            category: product.category.clone(),
            pack_size: product.pack_size.clone(),
            qty,
            unit_price: product.price,
        };
        let id = line.id;
        self.lines.push(line);

        Ok(id)
    }

    /// Removes one unit from the named line, deleting the line when its
    /// quantity reaches zero.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if no line has that id.
    pub fn remove_one(&mut self, id: LineId) -> Result<(), CartError> {
        let pos = self
            .lines
            .iter()
            .position(|line| line.id == id)
            .ok_or(CartError::LineNotFound(id))?;

        match self.lines.get_mut(pos) {
            Some(line) if line.qty > 1 => line.qty -= 1,
            _ => {
                self.lines.remove(pos);
            }
        }

        Ok(())
    }

    /// Replaces the cart-level discount.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] for negative values or percentages above
    /// 100; the previous discount is kept.
    pub fn set_discount(&mut self, discount: Discount) -> Result<(), DiscountError> {
        discount.validate()?;
        self.discount = discount;

        Ok(())
    }

    /// The current discount specification.
    #[must_use]
    pub fn discount(&self) -> Discount {
        self.discount
    }

    /// Sets the membership id; empty strings are treated as no membership.
    pub fn set_membership(&mut self, membership: impl Into<String>) {
        let membership = membership.into();
        self.membership = if membership.is_empty() {
            None
        } else {
            Some(membership)
        };
    }

    /// The membership id, if one was given.
    #[must_use]
    pub fn membership(&self) -> Option<&str> {
        self.membership.as_deref()
    }

    /// Sum of `unit_price * qty` over all lines, regardless of discount.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::pretotal).sum()
    }

    /// Amount the discount takes off the current subtotal.
    #[must_use]
    pub fn discount_amount(&self) -> Decimal {
        self.discount.amount(self.subtotal())
    }

    /// Subtotal minus discount amount.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.subtotal() - self.discount_amount()
    }

    /// Empties the cart and resets discount and membership.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.discount = Discount::None;
        self.membership = None;
    }

    /// Iterates over lines in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.iter()
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
