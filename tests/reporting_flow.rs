//! Reporting over a ledger produced by real checkouts.
//!
//! Runs a series of sales through CSV-backed storage across two months,
//! then builds the sales report and reorder analysis from the files the
//! till actually wrote.

use std::fs;

use jiff::civil::DateTime;
use rust_decimal::Decimal;
use tempfile::TempDir;
use testresult::TestResult;

use till::{prelude::*, reorder};

const INVENTORY_CSV: &str = "\
barcode,name,category,brand,supplier,price,cost_price,pack_size,stock_qty,reorder_level,is_active
100,Rooibos Tea 40s,Beverages,Khoisan,Cape Traders,30.00,20.00,40 bags,40,,true
200,Whole Milk 1L,Dairy,Fairfield,Dairy Direct,20.00,12.00,,40,,true
";

fn seed(dir: &TempDir) -> TestResult<CsvStorage> {
    let inventory_path = dir.path().join("inventory.csv");
    let sales_path = dir.path().join("sales_log.csv");
    fs::write(&inventory_path, INVENTORY_CSV)?;

    Ok(CsvStorage::new(inventory_path, sales_path))
}

fn sell(
    engine: &mut CheckoutEngine<CsvStorage>,
    inventory: &mut Inventory,
    items: &[(&str, u32)],
    member: Option<&str>,
    timestamp: &str,
) -> TestResult<Receipt> {
    let mut cart = Cart::new();
    for (barcode, qty) in items {
        cart.add(inventory, &Barcode::from(*barcode), *qty)?;
    }
    if let Some(member) = member {
        cart.set_membership(member);
    }
    let timestamp: DateTime = timestamp.parse()?;

    Ok(engine.checkout_at(inventory, &mut cart, timestamp)?)
}

#[test]
fn report_and_reorder_agree_with_the_written_ledger() -> TestResult {
    let dir = tempfile::tempdir()?;
    let storage = seed(&dir)?;
    let mut inventory = storage.load_inventory()?;
    let mut engine = CheckoutEngine::new(storage.clone());

    // June: two sales. July: one sale.
    sell(&mut engine, &mut inventory, &[("100", 4)], Some("M-1"), "2025-06-05T09:00:00")?;
    sell(&mut engine, &mut inventory, &[("100", 2), ("200", 3)], None, "2025-06-18T16:30:00")?;
    sell(&mut engine, &mut inventory, &[("100", 6)], Some("M-2"), "2025-07-02T11:00:00")?;

    let inventory = storage.load_inventory()?;
    let ledger = storage.load_sales()?;
    assert_eq!(ledger.len(), 4);

    let report = SalesReport::build(&inventory, &ledger, &SalesFilter::default());
    let kpis = report.kpis();

    // 12 * 30.00 + 3 * 20.00 = 420.00, against cost 12 * 20 + 3 * 12.
    assert_eq!(kpis.total_sales, Decimal::new(42_000, 2));
    assert_eq!(kpis.total_units, 15);
    assert_eq!(kpis.total_cost, Decimal::new(27_600, 2));
    assert_eq!(kpis.distinct_sales, 3);
    assert_eq!(kpis.unique_members, 2);

    let trend = report.monthly_trend();
    let months: Vec<String> = trend.iter().map(|p| p.month.to_string()).collect();
    assert_eq!(months, vec!["2025-06", "2025-07"]);

    // Tea sold 6 in June and 6 in July: avg 6, dynamic level 12; the 28
    // left in stock are comfortably above it. Milk sold 3 in one month:
    // dynamic level ceil(6) = 6, 37 in stock.
    let statuses = reorder::analyze(&inventory, &ledger);
    let tea = statuses
        .iter()
        .find(|s| s.barcode.as_str() == "100")
        .ok_or("no status for tea")?;
    assert_eq!(tea.stock_qty, 28);
    assert_eq!(tea.avg_monthly_sales, Decimal::from(6));
    assert_eq!(tea.effective_reorder_level, 12);
    assert!(!tea.low_stock);

    assert_eq!(kpis.low_stock_count, 0);

    Ok(())
}

#[test]
fn date_range_restricts_the_report_but_not_reorder_analysis() -> TestResult {
    let dir = tempfile::tempdir()?;
    let storage = seed(&dir)?;
    let mut inventory = storage.load_inventory()?;
    let mut engine = CheckoutEngine::new(storage.clone());

    sell(&mut engine, &mut inventory, &[("100", 4)], None, "2025-06-05T09:00:00")?;
    sell(&mut engine, &mut inventory, &[("100", 6)], None, "2025-07-02T11:00:00")?;

    let inventory = storage.load_inventory()?;
    let ledger = storage.load_sales()?;

    let filter = SalesFilter {
        from: Some("2025-07-01".parse()?),
        to: Some("2025-07-31".parse()?),
        ..SalesFilter::default()
    };
    let report = SalesReport::build(&inventory, &ledger, &filter);
    let kpis = report.kpis();

    // Only the July sale is in range.
    assert_eq!(kpis.total_units, 6);
    assert_eq!(kpis.distinct_sales, 1);

    // Low stock still judges velocity on the full ledger, not the range.
    let full = reorder::analyze(&inventory, &ledger);
    let tea = full
        .iter()
        .find(|s| s.barcode.as_str() == "100")
        .ok_or("no status for tea")?;
    assert_eq!(tea.avg_monthly_sales, Decimal::from(5));

    Ok(())
}
