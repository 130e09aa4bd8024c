//! Reorder analysis
//!
//! Derives a dynamic reorder threshold per product from monthly sales
//! velocity: keep enough stock for two months of average demand, with a
//! floor for sparse sellers. Recomputed from the full ledger on every
//! invocation; a pure function of its inputs.

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rustc_hash::FxHashMap;

use crate::{
    inventory::Inventory,
    ledger::{SaleLineRecord, SaleMonth},
    products::Barcode,
};

/// Floor for both the dynamic reorder level and the no-history fallback.
pub const REORDER_LEVEL_FLOOR: u32 = 5;

/// Reorder standing for one product.
#[derive(Debug, Clone, PartialEq)]
pub struct ReorderStatus {
    /// Product barcode.
    pub barcode: Barcode,

    /// Product name.
    pub name: String,

    /// Category, for grouping on the reorder report.
    pub category: String,

    /// Supplier to order from.
    pub supplier: String,

    /// Units currently in stock.
    pub stock_qty: u32,

    /// The threshold actually used for flagging: explicit level if set,
    /// else the dynamic level, else the floor.
    pub effective_reorder_level: u32,

    /// Average units sold per calendar month, over months with sales.
    pub avg_monthly_sales: Decimal,

    /// Units to order to bring stock up to two months of projected demand.
    pub suggested_qty: u32,

    /// Whether stock is at or below the effective reorder level.
    pub low_stock: bool,
}

/// Computes the reorder standing of every product in the inventory.
///
/// Ledger rows for barcodes no longer in the inventory contribute nothing;
/// products with no sales history fall back to the explicit level or the
/// floor of [`REORDER_LEVEL_FLOOR`].
#[must_use]
pub fn analyze(inventory: &Inventory, ledger: &[SaleLineRecord]) -> Vec<ReorderStatus> {
    let velocities = avg_monthly_sales(ledger);

    inventory
        .iter()
        .map(|product| {
            let avg = velocities.get(&product.barcode).copied();
            let effective_reorder_level = product
                .reorder_level
                .or_else(|| avg.map(dynamic_level))
                .unwrap_or(REORDER_LEVEL_FLOOR);
            let avg = avg.unwrap_or(Decimal::ZERO);

            ReorderStatus {
                barcode: product.barcode.clone(),
                name: product.name.clone(),
                category: product.category.clone(),
                supplier: product.supplier.clone(),
                stock_qty: product.stock_qty,
                effective_reorder_level,
                avg_monthly_sales: avg,
                suggested_qty: suggested_qty(avg, product.stock_qty),
                low_stock: product.stock_qty <= effective_reorder_level,
            }
        })
        .collect()
}

/// The low-stock subset of [`analyze`], in inventory order.
#[must_use]
pub fn low_stock(inventory: &Inventory, ledger: &[SaleLineRecord]) -> Vec<ReorderStatus> {
    let mut statuses = analyze(inventory, ledger);
    statuses.retain(|status| status.low_stock);

    statuses
}

/// Average units per calendar month for each product, over the months it
/// actually sold in.
fn avg_monthly_sales(ledger: &[SaleLineRecord]) -> FxHashMap<Barcode, Decimal> {
    let mut monthly: FxHashMap<(Barcode, SaleMonth), u64> = FxHashMap::default();
    for row in ledger {
        *monthly
            .entry((row.barcode.clone(), row.month()))
            .or_default() += u64::from(row.qty);
    }

    let mut totals: FxHashMap<Barcode, (u64, u32)> = FxHashMap::default();
    for ((barcode, _), qty) in monthly {
        let entry = totals.entry(barcode).or_default();
        entry.0 += qty;
        entry.1 += 1;
    }

    totals
        .into_iter()
        .map(|(barcode, (total, months))| {
            (barcode, Decimal::from(total) / Decimal::from(months))
        })
        .collect()
}

/// Two months of average demand, rounded up, floored at
/// [`REORDER_LEVEL_FLOOR`].
fn dynamic_level(avg_monthly: Decimal) -> u32 {
    let doubled = (avg_monthly * Decimal::TWO).ceil();

    doubled
        .to_u32()
        .unwrap_or(u32::MAX)
        .max(REORDER_LEVEL_FLOOR)
}

/// Units needed to bring stock up to two months of projected demand,
/// truncated to a whole number and floored at zero.
fn suggested_qty(avg_monthly: Decimal, stock_qty: u32) -> u32 {
    let needed = (Decimal::TWO * avg_monthly - Decimal::from(stock_qty)).trunc();

    needed.to_u32().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use jiff::civil::DateTime;
    use testresult::TestResult;

    use crate::{ledger::SaleId, products::Product};

    use super::*;

    fn product(barcode: &str, stock: u32, reorder_level: Option<u32>) -> Product {
        Product {
            barcode: Barcode::from(barcode),
            name: format!("Product {barcode}"),
            category: "Grocery".into(),
            brand: "House".into(),
            supplier: "Main Supplier".into(),
            price: Decimal::from(10),
            cost_price: Decimal::from(6),
            pack_size: None,
            stock_qty: stock,
            reorder_level,
            is_active: true,
        }
    }

    fn sale(barcode: &str, qty: u32, timestamp: &str) -> TestResult<SaleLineRecord> {
        let timestamp: DateTime = timestamp.parse()?;

        Ok(SaleLineRecord {
            sale_id: SaleId::generate(),
            timestamp,
            membership_id: None,
            barcode: Barcode::from(barcode),
            product_name: format!("Product {barcode}"),
            category: "Grocery".into(),
            qty,
            unit_price: Decimal::from(10),
            line_total: Decimal::from(10) * Decimal::from(qty),
            discount: Decimal::ZERO,
        })
    }

    #[test]
    fn two_month_average_drives_dynamic_level() -> TestResult {
        // Stock 10, no explicit level, monthly sales 4 and 6 (avg 5):
        // dynamic level = max(ceil(5 * 2), 5) = 10, so the product is
        // flagged at exactly 10 in stock, and 2 * 5 - 10 = 0 to order.
        let inventory = Inventory::from_rows([product("100", 10, None)])?;
        let ledger = vec![
            sale("100", 4, "2025-06-10T09:00:00")?,
            sale("100", 6, "2025-07-12T14:30:00")?,
        ];

        let statuses = analyze(&inventory, &ledger);
        let status = statuses.first().ok_or("no status for product")?;

        assert_eq!(status.avg_monthly_sales, Decimal::from(5));
        assert_eq!(status.effective_reorder_level, 10);
        assert!(status.low_stock, "stock 10 <= level 10 must flag");
        assert_eq!(status.suggested_qty, 0);

        Ok(())
    }

    #[test]
    fn sales_within_one_month_accumulate() -> TestResult {
        let inventory = Inventory::from_rows([product("100", 3, None)])?;
        let ledger = vec![
            sale("100", 2, "2025-07-01T09:00:00")?,
            sale("100", 3, "2025-07-20T16:00:00")?,
        ];

        let statuses = analyze(&inventory, &ledger);
        let status = statuses.first().ok_or("no status for product")?;

        // One month of history, 5 units: avg 5, level 10, order 2*5-3=7.
        assert_eq!(status.avg_monthly_sales, Decimal::from(5));
        assert_eq!(status.effective_reorder_level, 10);
        assert_eq!(status.suggested_qty, 7);

        Ok(())
    }

    #[test]
    fn explicit_level_takes_precedence_over_dynamic() -> TestResult {
        let inventory = Inventory::from_rows([product("100", 10, Some(3))])?;
        let ledger = vec![
            sale("100", 4, "2025-06-10T09:00:00")?,
            sale("100", 6, "2025-07-12T14:30:00")?,
        ];

        let statuses = analyze(&inventory, &ledger);
        let status = statuses.first().ok_or("no status for product")?;

        assert_eq!(status.effective_reorder_level, 3);
        assert!(!status.low_stock, "stock 10 > explicit level 3");

        Ok(())
    }

    #[test]
    fn no_history_and_no_explicit_level_falls_back_to_floor() -> TestResult {
        let inventory = Inventory::from_rows([product("100", 4, None)])?;

        let statuses = analyze(&inventory, &[]);
        let status = statuses.first().ok_or("no status for product")?;

        assert_eq!(status.effective_reorder_level, REORDER_LEVEL_FLOOR);
        assert!(status.low_stock, "stock 4 <= floor 5 must flag");
        assert_eq!(status.suggested_qty, 0);

        Ok(())
    }

    #[test]
    fn dynamic_level_floors_sparse_sellers() -> TestResult {
        let inventory = Inventory::from_rows([product("100", 6, None)])?;
        let ledger = vec![sale("100", 1, "2025-07-12T14:30:00")?];

        let statuses = analyze(&inventory, &ledger);
        let status = statuses.first().ok_or("no status for product")?;

        // avg 1 -> ceil(2) = 2, floored to 5.
        assert_eq!(status.effective_reorder_level, REORDER_LEVEL_FLOOR);
        assert!(!status.low_stock, "stock 6 > floor 5");

        Ok(())
    }

    #[test]
    fn suggested_qty_truncates_fractional_demand() -> TestResult {
        let inventory = Inventory::from_rows([product("100", 2, None)])?;
        // Months with 4 and 5 units: avg 4.5, 2 * 4.5 - 2 = 7.
        let ledger = vec![
            sale("100", 4, "2025-06-10T09:00:00")?,
            sale("100", 5, "2025-07-12T14:30:00")?,
        ];

        let statuses = analyze(&inventory, &ledger);
        let status = statuses.first().ok_or("no status for product")?;

        assert_eq!(status.suggested_qty, 7);

        Ok(())
    }

    #[test]
    fn ledger_rows_for_unknown_barcodes_are_ignored() -> TestResult {
        let inventory = Inventory::from_rows([product("100", 20, None)])?;
        let ledger = vec![sale("999", 50, "2025-07-12T14:30:00")?];

        let statuses = analyze(&inventory, &ledger);

        assert_eq!(statuses.len(), 1);
        assert_eq!(
            statuses.first().map(|s| s.avg_monthly_sales),
            Some(Decimal::ZERO)
        );

        Ok(())
    }

    #[test]
    fn analyze_is_idempotent_on_a_snapshot() -> TestResult {
        let inventory = Inventory::from_rows([
            product("100", 10, None),
            product("200", 2, Some(8)),
        ])?;
        let ledger = vec![
            sale("100", 4, "2025-06-10T09:00:00")?,
            sale("100", 6, "2025-07-12T14:30:00")?,
            sale("200", 3, "2025-07-01T11:00:00")?,
        ];

        let first = analyze(&inventory, &ledger);
        let second = analyze(&inventory, &ledger);

        assert_eq!(first, second, "same snapshot must give same result");

        Ok(())
    }

    #[test]
    fn low_stock_filters_to_flagged_products() -> TestResult {
        let inventory = Inventory::from_rows([
            product("100", 100, None),
            product("200", 2, None),
        ])?;

        let flagged = low_stock(&inventory, &[]);

        assert_eq!(flagged.len(), 1);
        assert_eq!(
            flagged.first().map(|s| s.barcode.as_str()),
            Some("200")
        );

        Ok(())
    }
}
