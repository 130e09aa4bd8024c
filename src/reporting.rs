//! Reporting
//!
//! Joins the sales ledger with the inventory table and produces filtered
//! aggregates: headline KPIs, per-product statistics, category/brand and
//! membership breakdowns, discount impact, and monthly trends.
//!
//! The join is a left join on barcode: ledger rows whose product has since
//! been removed from the inventory still count towards sales and units,
//! with cost contributions of zero.

use std::collections::BTreeMap;

use jiff::civil::Date;
use rust_decimal::Decimal;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    inventory::Inventory,
    ledger::{SaleLineRecord, SaleMonth},
    products::Product,
    reorder,
};

/// One ledger row joined with its product, when the product still exists.
#[derive(Debug, Clone, Copy)]
pub struct JoinedSale<'a> {
    /// The ledger row.
    pub sale: &'a SaleLineRecord,

    /// The matching inventory row, if the barcode still resolves.
    pub product: Option<&'a Product>,
}

impl JoinedSale<'_> {
    /// Cost of the goods on this line; zero when the product is gone.
    fn cost(&self) -> Decimal {
        self.product
            .map_or(Decimal::ZERO, |p| p.cost_price * Decimal::from(self.sale.qty))
    }

    /// Profit on this line: revenue minus cost of goods.
    fn profit(&self) -> Decimal {
        self.sale.line_total - self.cost()
    }
}

/// Filter over the joined ledger.
///
/// Dates are inclusive. Category matches against the ledger's own category
/// column; brand comes from the joined product, so a brand filter drops
/// rows whose product no longer exists.
#[derive(Debug, Clone, Default)]
pub struct SalesFilter {
    /// First date to include.
    pub from: Option<Date>,

    /// Last date to include.
    pub to: Option<Date>,

    /// Categories to include; `None` means all.
    pub categories: Option<Vec<String>>,

    /// Brands to include; `None` means all.
    pub brands: Option<Vec<String>>,
}

impl SalesFilter {
    fn matches(&self, joined: &JoinedSale<'_>) -> bool {
        let date = joined.sale.sale_date();

        if self.from.is_some_and(|from| date < from) {
            return false;
        }
        if self.to.is_some_and(|to| date > to) {
            return false;
        }
        if let Some(categories) = &self.categories {
            if !categories.iter().any(|c| c == &joined.sale.category) {
                return false;
            }
        }
        if let Some(brands) = &self.brands {
            let Some(product) = joined.product else {
                return false;
            };
            if !brands.iter().any(|b| b == &product.brand) {
                return false;
            }
        }

        true
    }
}

/// Headline figures over the filtered rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Kpis {
    /// Sum of discounted line totals.
    pub total_sales: Decimal,

    /// Units sold.
    pub total_units: u64,

    /// Mean of the per-line recorded discount value.
    pub avg_discount: Decimal,

    /// Cost of goods sold, where the product is still known.
    pub total_cost: Decimal,

    /// Sales minus cost of goods.
    pub total_profit: Decimal,

    /// Units per day over the report range.
    pub avg_units_per_day: Decimal,

    /// Mean sale value over distinct sales.
    pub avg_sale_value: Decimal,

    /// Distinct sale identifiers.
    pub distinct_sales: usize,

    /// Distinct membership ids seen.
    pub unique_members: usize,

    /// Active products in the inventory table.
    pub active_products: usize,

    /// Products at or below their effective reorder level, judged on the
    /// full ledger.
    pub low_stock_count: usize,
}

/// Per-product statistics over the filtered rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductStats {
    /// Product name as recorded on the ledger.
    pub product_name: String,

    /// Units sold.
    pub total_units: u64,

    /// Discounted sales value.
    pub total_sales: Decimal,

    /// Distinct days with at least one sale.
    pub days_sold: usize,

    /// Units per day over the report range.
    pub avg_units_per_day: Decimal,

    /// Share of days in the range with a sale, in percent.
    pub sales_frequency_pct: Decimal,

    /// Sales value per day over the report range.
    pub avg_sales_per_day: Decimal,
}

/// Aggregate for one category or brand.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBreakdown {
    /// Category or brand name.
    pub key: String,

    /// Discounted sales value.
    pub total_sales: Decimal,

    /// Units sold.
    pub units_sold: u64,

    /// Mean recorded discount value.
    pub avg_discount: Decimal,

    /// Sales minus cost of goods.
    pub profit: Decimal,
}

/// Aggregate for one membership id.
#[derive(Debug, Clone, PartialEq)]
pub struct MembershipStats {
    /// The membership id.
    pub membership_id: String,

    /// Discounted sales value.
    pub total_sales: Decimal,

    /// Units sold.
    pub units_sold: u64,

    /// Mean recorded discount value.
    pub avg_discount: Decimal,

    /// Distinct sales by this member.
    pub sale_count: usize,
}

/// Discount posture of one category.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountImpact {
    /// Category name.
    pub category: String,

    /// Mean recorded discount value.
    pub avg_discount: Decimal,

    /// Discounted sales value.
    pub total_sales: Decimal,
}

/// One month on the sales trend.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyPoint {
    /// The calendar month.
    pub month: SaleMonth,

    /// Discounted sales value.
    pub total_sales: Decimal,

    /// Units sold.
    pub units_sold: u64,
}

/// A filtered, joined view of the ledger, ready for aggregation.
#[derive(Debug)]
pub struct SalesReport<'a> {
    rows: Vec<JoinedSale<'a>>,
    inventory: &'a Inventory,
    full_ledger: &'a [SaleLineRecord],
    days_in_range: u32,
}

impl<'a> SalesReport<'a> {
    /// Joins the ledger with the inventory and applies the filter.
    ///
    /// The report range for per-day averages runs from `filter.from` (or
    /// the earliest filtered sale) to `filter.to` (or the latest), and is
    /// never shorter than one day.
    #[must_use]
    pub fn build(
        inventory: &'a Inventory,
        ledger: &'a [SaleLineRecord],
        filter: &SalesFilter,
    ) -> Self {
        let rows: Vec<JoinedSale<'a>> = ledger
            .iter()
            .map(|sale| JoinedSale {
                sale,
                product: inventory.get(&sale.barcode),
            })
            .filter(|joined| filter.matches(joined))
            .collect();

        let from = filter
            .from
            .or_else(|| rows.iter().map(|j| j.sale.sale_date()).min());
        let to = filter
            .to
            .or_else(|| rows.iter().map(|j| j.sale.sale_date()).max());

        let days_in_range = match (from, to) {
            (Some(from), Some(to)) if from <= to => {
                let days = (to - from).get_days();
                u32::try_from(days).unwrap_or(0) + 1
            }
            _ => 1,
        };

        SalesReport {
            rows,
            inventory,
            full_ledger: ledger,
            days_in_range,
        }
    }

    /// The filtered, joined rows.
    #[must_use]
    pub fn rows(&self) -> &[JoinedSale<'a>] {
        &self.rows
    }

    /// Days covered by the report range, at least one.
    #[must_use]
    pub fn days_in_range(&self) -> u32 {
        self.days_in_range
    }

    /// Headline KPIs over the filtered rows.
    #[must_use]
    pub fn kpis(&self) -> Kpis {
        let total_sales: Decimal = self.rows.iter().map(|j| j.sale.line_total).sum();
        let total_units: u64 = self.rows.iter().map(|j| u64::from(j.sale.qty)).sum();
        let total_cost: Decimal = self.rows.iter().map(JoinedSale::cost).sum();

        let discount_sum: Decimal = self.rows.iter().map(|j| j.sale.discount).sum();
        let avg_discount = mean(discount_sum, self.rows.len());

        let sale_ids: FxHashSet<_> = self.rows.iter().map(|j| j.sale.sale_id).collect();
        let members: FxHashSet<_> = self
            .rows
            .iter()
            .filter_map(|j| j.sale.membership_id.as_deref())
            .collect();

        let distinct_sales = sale_ids.len();
        let avg_sale_value = mean(total_sales, distinct_sales.max(1));

        Kpis {
            total_sales,
            total_units,
            avg_discount,
            total_cost,
            total_profit: total_sales - total_cost,
            avg_units_per_day: Decimal::from(total_units) / Decimal::from(self.days_in_range),
            avg_sale_value,
            distinct_sales,
            unique_members: members.len(),
            active_products: self.inventory.active_count(),
            low_stock_count: reorder::low_stock(self.inventory, self.full_ledger).len(),
        }
    }

    /// Per-product statistics, sorted by units sold descending.
    #[must_use]
    pub fn product_stats(&self) -> Vec<ProductStats> {
        #[derive(Default)]
        struct Acc {
            units: u64,
            sales: Decimal,
            days: FxHashSet<Date>,
        }

        let mut groups: BTreeMap<&str, Acc> = BTreeMap::new();
        for joined in &self.rows {
            let acc = groups.entry(&joined.sale.product_name).or_default();
            acc.units += u64::from(joined.sale.qty);
            acc.sales += joined.sale.line_total;
            acc.days.insert(joined.sale.sale_date());
        }

        let days_in_range = Decimal::from(self.days_in_range);
        let mut stats: Vec<ProductStats> = groups
            .into_iter()
            .map(|(name, acc)| ProductStats {
                product_name: name.to_owned(),
                total_units: acc.units,
                total_sales: acc.sales,
                days_sold: acc.days.len(),
                avg_units_per_day: Decimal::from(acc.units) / days_in_range,
                sales_frequency_pct: Decimal::from(acc.days.len()) / days_in_range
                    * Decimal::ONE_HUNDRED,
                avg_sales_per_day: acc.sales / days_in_range,
            })
            .collect();

        stats.sort_by(|a, b| {
            b.total_units
                .cmp(&a.total_units)
                .then_with(|| a.product_name.cmp(&b.product_name))
        });

        stats
    }

    /// Sales by ledger category, sorted by sales descending.
    #[must_use]
    pub fn by_category(&self) -> Vec<GroupBreakdown> {
        self.breakdown(|joined| Some(joined.sale.category.clone()))
    }

    /// Sales by product brand, sorted by sales descending.
    ///
    /// Rows whose product no longer exists have no brand and are skipped.
    #[must_use]
    pub fn by_brand(&self) -> Vec<GroupBreakdown> {
        self.breakdown(|joined| joined.product.map(|p| p.brand.clone()))
    }

    /// Sales per membership id, sorted by sales descending.
    ///
    /// Walk-in sales (no membership) are not listed.
    #[must_use]
    pub fn membership_breakdown(&self) -> Vec<MembershipStats> {
        #[derive(Default)]
        struct Acc {
            sales: Decimal,
            units: u64,
            discount_sum: Decimal,
            lines: usize,
            sale_ids: FxHashSet<crate::ledger::SaleId>,
        }

        let mut groups: BTreeMap<&str, Acc> = BTreeMap::new();
        for joined in &self.rows {
            let Some(member) = joined.sale.membership_id.as_deref() else {
                continue;
            };
            let acc = groups.entry(member).or_default();
            acc.sales += joined.sale.line_total;
            acc.units += u64::from(joined.sale.qty);
            acc.discount_sum += joined.sale.discount;
            acc.lines += 1;
            acc.sale_ids.insert(joined.sale.sale_id);
        }

        let mut stats: Vec<MembershipStats> = groups
            .into_iter()
            .map(|(member, acc)| MembershipStats {
                membership_id: member.to_owned(),
                total_sales: acc.sales,
                units_sold: acc.units,
                avg_discount: mean(acc.discount_sum, acc.lines),
                sale_count: acc.sale_ids.len(),
            })
            .collect();

        stats.sort_by(|a, b| b.total_sales.cmp(&a.total_sales));

        stats
    }

    /// Average discount and sales per category, sorted by average discount
    /// descending.
    #[must_use]
    pub fn discount_by_category(&self) -> Vec<DiscountImpact> {
        #[derive(Default)]
        struct Acc {
            sales: Decimal,
            discount_sum: Decimal,
            lines: usize,
        }

        let mut groups: BTreeMap<&str, Acc> = BTreeMap::new();
        for joined in &self.rows {
            let acc = groups.entry(joined.sale.category.as_str()).or_default();
            acc.sales += joined.sale.line_total;
            acc.discount_sum += joined.sale.discount;
            acc.lines += 1;
        }

        let mut impacts: Vec<DiscountImpact> = groups
            .into_iter()
            .map(|(category, acc)| DiscountImpact {
                category: category.to_owned(),
                avg_discount: mean(acc.discount_sum, acc.lines),
                total_sales: acc.sales,
            })
            .collect();

        impacts.sort_by(|a, b| b.avg_discount.cmp(&a.avg_discount));

        impacts
    }

    /// Sales and units per calendar month, chronological.
    #[must_use]
    pub fn monthly_trend(&self) -> Vec<MonthlyPoint> {
        let mut months: BTreeMap<SaleMonth, (Decimal, u64)> = BTreeMap::new();
        for joined in &self.rows {
            let entry = months.entry(joined.sale.month()).or_default();
            entry.0 += joined.sale.line_total;
            entry.1 += u64::from(joined.sale.qty);
        }

        months
            .into_iter()
            .map(|(month, (total_sales, units_sold))| MonthlyPoint {
                month,
                total_sales,
                units_sold,
            })
            .collect()
    }

    fn breakdown(
        &self,
        key_of: impl Fn(&JoinedSale<'a>) -> Option<String>,
    ) -> Vec<GroupBreakdown> {
        #[derive(Default)]
        struct Acc {
            sales: Decimal,
            units: u64,
            discount_sum: Decimal,
            lines: usize,
            profit: Decimal,
        }

        let mut groups: FxHashMap<String, Acc> = FxHashMap::default();
        for joined in &self.rows {
            let Some(key) = key_of(joined) else {
                continue;
            };
            let acc = groups.entry(key).or_default();
            acc.sales += joined.sale.line_total;
            acc.units += u64::from(joined.sale.qty);
            acc.discount_sum += joined.sale.discount;
            acc.lines += 1;
            acc.profit += joined.profit();
        }

        let mut breakdowns: Vec<GroupBreakdown> = groups
            .into_iter()
            .map(|(key, acc)| GroupBreakdown {
                key,
                total_sales: acc.sales,
                units_sold: acc.units,
                avg_discount: mean(acc.discount_sum, acc.lines),
                profit: acc.profit,
            })
            .collect();

        breakdowns.sort_by(|a, b| b.total_sales.cmp(&a.total_sales).then(a.key.cmp(&b.key)));

        breakdowns
    }
}

/// Mean of a Decimal sum over a count; zero for an empty set.
fn mean(sum: Decimal, count: usize) -> Decimal {
    if count == 0 {
        Decimal::ZERO
    } else {
        sum / Decimal::from(count)
    }
}
