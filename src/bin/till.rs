//! Till CLI
//!
//! Thin presentation layer over the till library: ring up sales, print
//! receipts, and render inventory, reorder and sales reports as tables.
//! All pricing and persistence rules live in the library.

use std::{path::PathBuf, process::ExitCode};

use clap::{Args, Parser, Subcommand};
use jiff::civil::Date;
use rust_decimal::Decimal;
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{Alignment, Style, Theme, object::Columns},
};
use tracing_subscriber::EnvFilter;

use till::{
    cart::Cart,
    checkout::CheckoutEngine,
    config::TillConfig,
    discounts::{Discount, round_currency},
    products::Barcode,
    reorder,
    reporting::{SalesFilter, SalesReport},
    storage::{CsvStorage, Storage},
};

#[derive(Debug, Parser)]
#[command(name = "till", about = "Point-of-sale till and reporting", long_about = None)]
struct Cli {
    /// Path of the YAML configuration file
    #[arg(long, default_value = "till.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Ring up a sale and print the receipt
    Sell(SellArgs),
    /// Sales report over an optional date range
    Report(ReportArgs),
    /// Products at or below their reorder level
    LowStock,
    /// Current inventory table
    Inventory,
}

#[derive(Debug, Args)]
struct SellArgs {
    /// Items as BARCODE or BARCODE:QTY
    #[arg(required = true)]
    items: Vec<String>,

    /// Percentage off the whole sale, in percent points
    #[arg(long, conflicts_with = "fixed")]
    percent: Option<Decimal>,

    /// Fixed amount off the whole sale
    #[arg(long)]
    fixed: Option<Decimal>,

    /// Membership id to record the sale under
    #[arg(long)]
    member: Option<String>,
}

#[derive(Debug, Args)]
struct ReportArgs {
    /// First date to include (YYYY-MM-DD)
    #[arg(long)]
    from: Option<Date>,

    /// Last date to include (YYYY-MM-DD)
    #[arg(long)]
    to: Option<Date>,

    /// Restrict to these categories
    #[arg(long)]
    category: Vec<String>,

    /// Restrict to these brands
    #[arg(long)]
    brand: Vec<String>,
}

#[expect(
    clippy::print_stdout,
    clippy::print_stderr,
    reason = "user-facing CLI output"
)]
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(output) => {
            println!("{output}");

            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{error}");

            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<String, String> {
    let config = TillConfig::from_path(&cli.config)
        .map_err(|error| format!("failed to load configuration: {error}"))?;

    match cli.command {
        Commands::Sell(args) => sell(&config, args),
        Commands::Report(args) => report(&config, &args),
        Commands::LowStock => low_stock(&config),
        Commands::Inventory => inventory(&config),
    }
}

fn storage(config: &TillConfig) -> CsvStorage {
    CsvStorage::new(&config.inventory, &config.sales_log)
}

fn sell(config: &TillConfig, args: SellArgs) -> Result<String, String> {
    let storage = storage(config);
    let mut inventory = storage
        .load_inventory()
        .map_err(|error| format!("failed to load inventory: {error}"))?;

    let mut cart = Cart::new();
    for item in &args.items {
        let (barcode, qty) = parse_item(item)?;
        cart.add(&inventory, &barcode, qty)
            .map_err(|error| error.to_string())?;
    }

    if let Some(percent) = args.percent {
        cart.set_discount(Discount::Percentage(percent))
            .map_err(|error| error.to_string())?;
    }
    if let Some(fixed) = args.fixed {
        cart.set_discount(Discount::Fixed(fixed))
            .map_err(|error| error.to_string())?;
    }
    if let Some(member) = args.member {
        cart.set_membership(member);
    }

    let mut engine = CheckoutEngine::new(storage);
    let receipt = engine
        .checkout(&mut inventory, &mut cart)
        .map_err(|error| error.to_string())?;

    Ok(receipt.render(&config.currency_symbol))
}

fn report(config: &TillConfig, args: &ReportArgs) -> Result<String, String> {
    let storage = storage(config);
    let inventory = storage
        .load_inventory()
        .map_err(|error| format!("failed to load inventory: {error}"))?;
    let ledger = storage
        .load_sales()
        .map_err(|error| format!("failed to load sales ledger: {error}"))?;

    let filter = SalesFilter {
        from: args.from,
        to: args.to,
        categories: none_if_empty(args.category.clone()),
        brands: none_if_empty(args.brand.clone()),
    };
    let report = SalesReport::build(&inventory, &ledger, &filter);
    let kpis = report.kpis();
    let symbol = &config.currency_symbol;

    let mut out = format!(
        "Sales: {symbol}{:.2}  Units: {}  Profit: {symbol}{:.2}\n\
         Sales count: {}  Avg sale: {symbol}{:.2}  Avg discount: {:.2}\n\
         Members: {}  Active products: {}  Low stock: {}\n",
        round_currency(kpis.total_sales),
        kpis.total_units,
        round_currency(kpis.total_profit),
        kpis.distinct_sales,
        round_currency(kpis.avg_sale_value),
        kpis.avg_discount,
        kpis.unique_members,
        kpis.active_products,
        kpis.low_stock_count,
    );

    let products: Vec<Vec<String>> = report
        .product_stats()
        .into_iter()
        .take(10)
        .map(|stats| {
            vec![
                stats.product_name,
                stats.total_units.to_string(),
                format!("{symbol}{:.2}", round_currency(stats.total_sales)),
                stats.days_sold.to_string(),
                format!("{:.1}", stats.avg_units_per_day),
            ]
        })
        .collect();
    push_section(
        &mut out,
        "Top products",
        &["Product", "Units", "Sales", "Days Sold", "Units/Day"],
        products,
    );

    for (title, breakdown) in [
        ("By category", report.by_category()),
        ("By brand", report.by_brand()),
    ] {
        let rows: Vec<Vec<String>> = breakdown
            .into_iter()
            .map(|group| {
                vec![
                    group.key,
                    format!("{symbol}{:.2}", round_currency(group.total_sales)),
                    group.units_sold.to_string(),
                    format!("{:.2}", group.avg_discount),
                    format!("{symbol}{:.2}", round_currency(group.profit)),
                ]
            })
            .collect();
        push_section(
            &mut out,
            title,
            &["Group", "Sales", "Units", "Avg Discount", "Profit"],
            rows,
        );
    }

    let members: Vec<Vec<String>> = report
        .membership_breakdown()
        .into_iter()
        .map(|member| {
            vec![
                member.membership_id,
                format!("{symbol}{:.2}", round_currency(member.total_sales)),
                member.units_sold.to_string(),
                member.sale_count.to_string(),
            ]
        })
        .collect();
    push_section(
        &mut out,
        "Members",
        &["Member", "Sales", "Units", "Sales Count"],
        members,
    );

    let discounts: Vec<Vec<String>> = report
        .discount_by_category()
        .into_iter()
        .filter(|impact| !impact.avg_discount.is_zero())
        .map(|impact| {
            vec![
                impact.category,
                format!("{:.2}", impact.avg_discount),
                format!("{symbol}{:.2}", round_currency(impact.total_sales)),
            ]
        })
        .collect();
    push_section(
        &mut out,
        "Discounts by category",
        &["Category", "Avg Discount", "Sales"],
        discounts,
    );

    let trend: Vec<Vec<String>> = report
        .monthly_trend()
        .into_iter()
        .map(|point| {
            vec![
                point.month.to_string(),
                format!("{symbol}{:.2}", round_currency(point.total_sales)),
                point.units_sold.to_string(),
            ]
        })
        .collect();
    push_section(&mut out, "Monthly trend", &["Month", "Sales", "Units"], trend);

    Ok(out)
}

fn low_stock(config: &TillConfig) -> Result<String, String> {
    let storage = storage(config);
    let inventory = storage
        .load_inventory()
        .map_err(|error| format!("failed to load inventory: {error}"))?;
    let ledger = storage
        .load_sales()
        .map_err(|error| format!("failed to load sales ledger: {error}"))?;

    let flagged = reorder::low_stock(&inventory, &ledger);
    if flagged.is_empty() {
        return Ok("All products sufficiently stocked.".to_owned());
    }

    let rows: Vec<Vec<String>> = flagged
        .into_iter()
        .map(|status| {
            vec![
                status.barcode.to_string(),
                status.name,
                status.supplier,
                status.stock_qty.to_string(),
                status.effective_reorder_level.to_string(),
                format!("{:.1}", status.avg_monthly_sales),
                status.suggested_qty.to_string(),
            ]
        })
        .collect();

    Ok(render_table(
        &["Barcode", "Product", "Supplier", "Stock", "Level", "Avg/Month", "Order"],
        rows,
        3,
    ))
}

fn inventory(config: &TillConfig) -> Result<String, String> {
    let storage = storage(config);
    let inventory = storage
        .load_inventory()
        .map_err(|error| format!("failed to load inventory: {error}"))?;
    let symbol = &config.currency_symbol;

    let rows: Vec<Vec<String>> = inventory
        .iter()
        .map(|product| {
            vec![
                product.barcode.to_string(),
                product.name.clone(),
                product.category.clone(),
                product.brand.clone(),
                format!("{symbol}{:.2}", product.price),
                product.stock_qty.to_string(),
                if product.is_active { "yes" } else { "no" }.to_owned(),
            ]
        })
        .collect();

    Ok(render_table(
        &["Barcode", "Product", "Category", "Brand", "Price", "Stock", "Active"],
        rows,
        4,
    ))
}

/// Parses an item argument of the form `BARCODE` or `BARCODE:QTY`.
fn parse_item(item: &str) -> Result<(Barcode, u32), String> {
    match item.split_once(':') {
        Some((barcode, qty)) => {
            let qty = qty
                .parse::<u32>()
                .map_err(|error| format!("invalid quantity in {item:?}: {error}"))?;

            Ok((Barcode::from(barcode), qty))
        }
        None => Ok((Barcode::from(item), 1)),
    }
}

fn none_if_empty(values: Vec<String>) -> Option<Vec<String>> {
    if values.is_empty() { None } else { Some(values) }
}

fn push_section(out: &mut String, title: &str, header: &[&str], rows: Vec<Vec<String>>) {
    if rows.is_empty() {
        return;
    }

    out.push('\n');
    out.push_str(title);
    out.push('\n');
    out.push_str(&render_table(header, rows, 1));
}

fn render_table(header: &[&str], rows: Vec<Vec<String>>, right_align_from: usize) -> String {
    let mut builder = Builder::default();
    builder.push_record(header.iter().map(ToString::to_string));
    for row in rows {
        builder.push_record(row);
    }

    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());
    let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(1, separator);

    table.with(theme);
    table.modify(Columns::new(right_align_from..), Alignment::right());

    table.to_string()
}
