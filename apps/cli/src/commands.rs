//! Subcommand handlers.
//!
//! Each handler reads from the synchronizer, asks tienda-core for the
//! figures, and prints either a plain table or JSON.

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tienda_core::commands::{
    create_sale, record_stock_entry, SaleDraft, SaleLineDraft, StockEntryDraft,
};
use tienda_core::inventory::{query_inventory, InventoryQuery, InventoryRow};
use tienda_core::report::{
    group_sales_by_day, sales_in_range, summarize, DateRange, Page, SortOrder,
    TRANSACTIONS_PER_PAGE,
};
use tienda_core::sku::generate_sku;
use tienda_core::{EventDate, Money, PaymentMethod};
use tienda_sync::{DataSynchronizer, SyncConfig};

use crate::{order, RestockArgs, SalesArgs, SellArgs, StockArgs, TransactionsArgs};

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Today in the shop's timezone.
fn local_today() -> Result<NaiveDate> {
    EventDate::from_instant(Utc::now())
        .local_day()
        .ok_or_else(|| anyhow!("could not determine the local date"))
}

fn parse_day(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{}', expected YYYY-MM-DD", raw))
}

// =============================================================================
// Stock
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StockRowView<'a> {
    id: &'a str,
    sku: Option<&'a str>,
    name: &'a str,
    model: Option<&'a str>,
    color: Option<&'a str>,
    stock: i64,
    units_sold: i64,
    level: tienda_core::inventory::StockLevel,
    unit_price: f64,
    last_sale: Option<&'a str>,
}

impl<'a> From<&InventoryRow<'a>> for StockRowView<'a> {
    fn from(row: &InventoryRow<'a>) -> Self {
        StockRowView {
            id: &row.product.id,
            sku: row.product.sku.as_deref(),
            name: &row.product.name,
            model: row.product.model.as_deref(),
            color: row.product.color.as_deref(),
            stock: row.stock,
            units_sold: row.units_sold,
            level: row.level(),
            unit_price: row.product.default_unit_price.to_major(),
            last_sale: row.last_sale.map(EventDate::as_str),
        }
    }
}

pub(crate) async fn stock(sync: &DataSynchronizer, args: StockArgs, json: bool) -> Result<()> {
    let query = InventoryQuery {
        search: args.search,
        categories: args.category.into_iter().map(Into::into).collect(),
        levels: args.level.into_iter().map(Into::into).collect(),
        sort: args.sort.into(),
        order: order(args.desc),
        ..InventoryQuery::default()
    };

    sync.read(|data| {
        let rows = query_inventory(data, &query);
        if json {
            let views: Vec<StockRowView> = rows.iter().map(StockRowView::from).collect();
            return print_json(&views);
        }

        println!(
            "{:<10} {:<32} {:<16} {:<10} {:>6} {:>6} {:>12}",
            "SKU", "Producto", "Modelo", "Color", "Stock", "Vend.", "Precio"
        );
        for row in &rows {
            let product = row.product;
            println!(
                "{:<10} {:<32} {:<16} {:<10} {:>6} {:>6} {:>12}",
                product.sku.as_deref().unwrap_or("-"),
                product.name,
                product.model.as_deref().unwrap_or("-"),
                product.color.as_deref().unwrap_or("-"),
                row.stock,
                row.units_sold,
                product.default_unit_price.to_string(),
            );
        }
        println!("{} productos", rows.len());
        Ok(())
    })
    .await
}

// =============================================================================
// Sales
// =============================================================================

pub(crate) async fn sales(sync: &DataSynchronizer, args: SalesArgs, json: bool) -> Result<()> {
    let range = if args.all {
        DateRange::all()
    } else {
        DateRange::last_days(args.days, local_today()?)
    };
    let sort = order(args.desc);

    sync.read(|data| {
        let days = group_sales_by_day(&data.sales, range, sort);
        let summary = summarize(&days);
        if json {
            return print_json(&serde_json::json!({ "days": days, "summary": summary }));
        }

        for day in &days {
            println!(
                "{}  {:>3} ventas  {:>14}",
                day.short_label(),
                day.count,
                day.total.to_string()
            );
        }
        println!("Total: {} ventas, {}", summary.count, summary.total);
        Ok(())
    })
    .await
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionView<'a> {
    id: &'a str,
    date: &'a str,
    payment_method: &'a str,
    total: f64,
    units: i64,
}

pub(crate) async fn transactions(
    sync: &DataSynchronizer,
    args: TransactionsArgs,
    json: bool,
) -> Result<()> {
    let range = DateRange::last_days(args.days, local_today()?);

    sync.read(|data| {
        let sales = sales_in_range(&data.sales, range);
        let page = Page::of(sales, args.page, TRANSACTIONS_PER_PAGE);

        if json {
            let items: Vec<TransactionView> = page
                .items
                .iter()
                .map(|sale| TransactionView {
                    id: &sale.id,
                    date: sale.date.as_str(),
                    payment_method: &sale.payment_method,
                    total: sale.total_amount.to_major(),
                    units: sale.units(),
                })
                .collect();
            return print_json(&serde_json::json!({
                "items": items,
                "page": page.page,
                "totalPages": page.total_pages,
                "totalItems": page.total_items,
            }));
        }

        for sale in &page.items {
            println!(
                "{:<26} {:<14} {:>4} u.  {:>14}",
                sale.date.as_str(),
                sale.payment_method,
                sale.units(),
                sale.total_amount.to_string()
            );
        }
        println!(
            "Página {} de {} ({} ventas)",
            page.page,
            page.total_pages.max(1),
            page.total_items
        );
        Ok(())
    })
    .await
}

pub(crate) async fn next_sku(sync: &DataSynchronizer, json: bool) -> Result<()> {
    let sku = sync.read(generate_sku).await;
    if json {
        print_json(&serde_json::json!({ "sku": sku }))
    } else {
        println!("{}", sku);
        Ok(())
    }
}

// =============================================================================
// Writes
// =============================================================================

pub(crate) async fn sell(sync: &DataSynchronizer, args: SellArgs) -> Result<()> {
    let unit_price = match args.price {
        Some(pesos) => Money::from_major(pesos).ok_or_else(|| anyhow!("invalid price {}", pesos))?,
        None => sync
            .read(|data| data.find_product(&args.product).map(|p| p.default_unit_price))
            .await
            .ok_or_else(|| anyhow!("product not found: {}", args.product))?,
    };
    let date = match args.date.as_deref() {
        Some(raw) => EventDate::from_day(parse_day(raw)?),
        None => EventDate::from_instant(Utc::now()),
    };

    let draft = SaleDraft {
        date,
        payment_method: PaymentMethod::from(args.payment).as_str().to_string(),
        lines: vec![SaleLineDraft {
            product_id: args.product,
            quantity: args.quantity,
            unit_price,
        }],
        total_override: None,
    };

    sync.execute(|data| create_sale(data, &draft))
        .await
        .context("sale not recorded")?;
    println!("Venta registrada: {}", draft.computed_total());
    Ok(())
}

pub(crate) async fn restock(sync: &DataSynchronizer, args: RestockArgs) -> Result<()> {
    let day = match args.date.as_deref() {
        Some(raw) => parse_day(raw)?,
        None => local_today()?,
    };
    let draft = StockEntryDraft {
        product_id: args.product,
        quantity: args.quantity,
        date: EventDate::from_day(day),
    };

    sync.execute(|data| record_stock_entry(data, &draft, Utc::now()))
        .await
        .context("stock entry not recorded")?;
    println!("Ingreso registrado: {} u.", draft.quantity);
    Ok(())
}

// =============================================================================
// Config
// =============================================================================

pub(crate) fn show_config(config: &SyncConfig, json: bool) -> Result<()> {
    if json {
        return print_json(config);
    }

    let path = SyncConfig::default_config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string());
    println!("config file:  {}", path);
    println!("web app url:  {}", config.web_app_url().unwrap_or("(not set, offline)"));
    println!("timeout:      {} s", config.web_app.request_timeout_secs);
    println!("max retries:  {}", config.web_app.max_retries);
    let names = config.sheet_names();
    println!("sheets:       {}, {}, {}", names.products, names.stock_movements, names.sales);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_day() {
        assert_eq!(parse_day("2024-03-15").unwrap(), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert!(parse_day("15/03/2024").is_err());
    }

    #[test]
    fn test_sort_order_flag() {
        assert_eq!(order(true), SortOrder::Descending);
        assert_eq!(order(false), SortOrder::Ascending);
    }
}
