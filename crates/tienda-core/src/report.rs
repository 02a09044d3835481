//! # Sales Reports
//!
//! Groups sales by local calendar day and slices the sale log for the
//! transactions table.
//!
//! ## Report Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Sale.date ──► local day (UTC-3) ──► in DateRange? ──► bucket by day    │
//! │                                                             │           │
//! │                         ┌───────────────────────────────────┤           │
//! │                         ▼                                   ▼           │
//! │            SortOrder::Ascending               SortOrder::Descending     │
//! │            (chart series)                     (daily summary table)     │
//! │                                                             │           │
//! │                                                             ▼           │
//! │                                             summarize() → totals row    │
//! │                                                                         │
//! │  Sale log ──► sales_in_range() (newest first) ──► Page::of() (10/page)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Totals always use `Sale.total_amount`, including hand-typed overrides.
//! Sales whose date cannot be parsed never land in any bucket.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::Sale;

/// Rows per page in the transactions table.
pub const TRANSACTIONS_PER_PAGE: usize = 10;

/// Days before today covered by the default report window.
pub const DEFAULT_REPORT_DAYS: i64 = 7;

// =============================================================================
// Query Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Inclusive range of local calendar days. `None` bounds are open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "Option<String>")]
    pub from: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub const fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// Every day. Used for the chart series.
    pub const fn all() -> Self {
        Self { from: None, to: None }
    }

    /// From `days` days before `today` through `today`.
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use tienda_core::report::DateRange;
    ///
    /// let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    /// let range = DateRange::last_days(7, today);
    /// assert_eq!(range.from, NaiveDate::from_ymd_opt(2024, 3, 8));
    /// assert_eq!(range.to, Some(today));
    /// ```
    pub fn last_days(days: i64, today: NaiveDate) -> Self {
        Self {
            from: today.checked_sub_signed(Duration::days(days)),
            to: Some(today),
        }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from.map_or(true, |from| day >= from) && self.to.map_or(true, |to| day <= to)
    }
}

// =============================================================================
// Daily Buckets
// =============================================================================

/// Sales of one local calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailySales {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub count: usize,
    pub total: Money,
}

impl DailySales {
    /// `dd/mm`, the chart axis label.
    pub fn short_label(&self) -> String {
        self.date.format("%d/%m").to_string()
    }
}

/// Period totals shown under the daily table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesSummary {
    pub count: usize,
    pub total: Money,
}

/// Buckets the sales in `range` by local day.
///
/// ## Rules
/// - An instant is shifted to UTC-3 before taking its date
/// - A bare `YYYY-MM-DD` is already a local day
/// - `count` is the number of sales, `total` the sum of `total_amount`
///
/// ## Example
/// ```rust
/// use tienda_core::report::{group_sales_by_day, DateRange, SortOrder};
/// use tienda_core::{Money, Sale};
///
/// let sales = vec![
///     Sale { id: "a".into(), date: "2024-03-16T01:00:00.000Z".into(),
///            payment_method: "qr".into(), total_amount: Money::from_pesos(10), items: vec![] },
///     Sale { id: "b".into(), date: "2024-03-15".into(),
///            payment_method: "efectivo".into(), total_amount: Money::from_pesos(5), items: vec![] },
/// ];
/// let days = group_sales_by_day(&sales, DateRange::all(), SortOrder::Ascending);
/// assert_eq!(days.len(), 1);
/// assert_eq!(days[0].count, 2);
/// assert_eq!(days[0].total, Money::from_pesos(15));
/// ```
pub fn group_sales_by_day(sales: &[Sale], range: DateRange, order: SortOrder) -> Vec<DailySales> {
    let mut buckets: BTreeMap<NaiveDate, (usize, Money)> = BTreeMap::new();

    for sale in sales {
        let Some(day) = sale.date.local_day() else {
            continue;
        };
        if !range.contains(day) {
            continue;
        }
        let bucket = buckets.entry(day).or_default();
        bucket.0 += 1;
        bucket.1 += sale.total_amount;
    }

    let days = buckets
        .into_iter()
        .map(|(date, (count, total))| DailySales { date, count, total });

    match order {
        SortOrder::Ascending => days.collect(),
        SortOrder::Descending => days.rev().collect(),
    }
}

/// Adds up a set of daily buckets.
pub fn summarize(days: &[DailySales]) -> SalesSummary {
    days.iter().fold(SalesSummary::default(), |mut acc, day| {
        acc.count += day.count;
        acc.total += day.total;
        acc
    })
}

// =============================================================================
// Transactions Table
// =============================================================================

/// Sales whose local day is in `range`, most recent first.
///
/// Ties keep log order.
pub fn sales_in_range(sales: &[Sale], range: DateRange) -> Vec<&Sale> {
    let mut selected: Vec<(DateTime<Utc>, &Sale)> = sales
        .iter()
        .filter(|sale| sale.date.local_day().is_some_and(|day| range.contains(day)))
        .filter_map(|sale| sale.date.instant().map(|instant| (instant, sale)))
        .collect();

    selected.sort_by(|a, b| b.0.cmp(&a.0));
    selected.into_iter().map(|(_, sale)| sale).collect()
}

/// One page of a list. Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> Page<T> {
    /// Cuts page `page` out of `items`. Page 0 is treated as page 1; a page
    /// past the end comes back empty.
    ///
    /// ```rust
    /// use tienda_core::report::Page;
    ///
    /// let page = Page::of((1..=25).collect::<Vec<_>>(), 3, 10);
    /// assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
    /// assert_eq!(page.total_pages, 3);
    /// ```
    pub fn of(items: Vec<T>, page: usize, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        let page = page.max(1);
        let total_items = items.len();
        let total_pages = total_items.div_ceil(per_page);

        let items = items
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .collect();

        Self {
            items,
            page,
            total_pages,
            total_items,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
