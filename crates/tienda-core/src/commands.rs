//! # Commands
//!
//! Turns what the operator typed into exactly one [`DataEvent`], or an
//! error with the dataset untouched.
//!
//! ## Command Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  UI dialog ──► Draft ──► command fn (validate against &AppData)         │
//! │                              │                                          │
//! │              ┌───────────────┴───────────────┐                          │
//! │              ▼                               ▼                          │
//! │        Err(CoreError)                  Ok(DataEvent)                    │
//! │        (show message,                        │                          │
//! │         nothing changed)                     ▼                          │
//! │                                   AppData::apply(event)                 │
//! │                                              │                          │
//! │                                              ▼                          │
//! │                                   whole dataset persisted               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands never read the clock: callers pass `now`. New ids are UUID v4.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::ledger::adjustment_quantity;
use crate::money::Money;
use crate::sku::SkuSequence;
use crate::types::{AppData, Category, EventDate, Product, Sale, SaleItem, StockMovement};
use crate::validation::{
    validate_category, validate_declared_stock, validate_event_date, validate_model,
    validate_positive_quantity, validate_price, validate_product_name, validate_sale_stock,
};

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Blank strings read as "not given".
fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Events
// =============================================================================

/// A single change to the dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum DataEvent {
    /// New products, plus their opening stock movements (if any).
    ProductsCreated {
        products: Vec<Product>,
        movements: Vec<StockMovement>,
    },
    /// Replaces the product with the same id.
    ProductUpdated(Product),
    /// Hard delete. Movements and sale items referencing the ids stay.
    ProductsDeleted(Vec<String>),
    StockMoved(StockMovement),
    SaleRecorded(Sale),
    /// Replaces the sale with the same id.
    SaleReplaced(Sale),
    SaleDeleted(String),
}

impl DataEvent {
    /// Short name for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            DataEvent::ProductsCreated { .. } => "products_created",
            DataEvent::ProductUpdated(_) => "product_updated",
            DataEvent::ProductsDeleted(_) => "products_deleted",
            DataEvent::StockMoved(_) => "stock_moved",
            DataEvent::SaleRecorded(_) => "sale_recorded",
            DataEvent::SaleReplaced(_) => "sale_replaced",
            DataEvent::SaleDeleted(_) => "sale_deleted",
        }
    }
}

impl AppData {
    /// Applies an event in place.
    ///
    /// Replacements and deletions of ids that are not present fail before
    /// anything is modified.
    pub fn apply(&mut self, event: DataEvent) -> CoreResult<()> {
        match event {
            DataEvent::ProductsCreated {
                products,
                movements,
            } => {
                self.products.extend(products);
                self.stock_movements.extend(movements);
            }
            DataEvent::ProductUpdated(product) => {
                let slot = self
                    .products
                    .iter_mut()
                    .find(|p| p.id == product.id)
                    .ok_or_else(|| CoreError::ProductNotFound(product.id.clone()))?;
                *slot = product;
            }
            DataEvent::ProductsDeleted(ids) => {
                if let Some(missing) = ids.iter().find(|id| self.find_product(id).is_none()) {
                    return Err(CoreError::ProductNotFound(missing.clone()));
                }
                self.products.retain(|p| !ids.contains(&p.id));
            }
            DataEvent::StockMoved(movement) => {
                self.stock_movements.push(movement);
            }
            DataEvent::SaleRecorded(sale) => {
                self.sales.push(sale);
            }
            DataEvent::SaleReplaced(sale) => {
                let slot = self
                    .sales
                    .iter_mut()
                    .find(|s| s.id == sale.id)
                    .ok_or_else(|| CoreError::SaleNotFound(sale.id.clone()))?;
                *slot = sale;
            }
            DataEvent::SaleDeleted(id) => {
                let index = self
                    .sales
                    .iter()
                    .position(|s| s.id == id)
                    .ok_or(CoreError::SaleNotFound(id))?;
                self.sales.remove(index);
            }
        }
        Ok(())
    }
}

// =============================================================================
// Product Commands
// =============================================================================

/// The product form.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub category: Category,
    pub model: Option<String>,
    pub color: Option<String>,
    pub default_unit_price: Money,
}

impl ProductDraft {
    /// Field checks shared by create and edit.
    ///
    /// ## Rules
    /// - Name, category and a non-negative price are required
    /// - Cases ("Funda") also need a model
    pub fn validate(&self) -> CoreResult<()> {
        validate_product_name(&self.name)?;
        validate_category(self.category)?;
        validate_price("defaultUnitPrice", self.default_unit_price)?;
        validate_model(self.category, self.model.as_deref())?;
        Ok(())
    }
}

/// One (model, color) combination of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantDraft {
    pub model: String,
    pub color: Option<String>,
}

fn opening_stock(
    products: &[Product],
    initial_stock: i64,
    now: DateTime<Utc>,
) -> CoreResult<Vec<StockMovement>> {
    if initial_stock < 0 {
        return Err(ValidationError::negative("initialStock").into());
    }
    if initial_stock == 0 {
        return Ok(Vec::new());
    }

    Ok(products
        .iter()
        .map(|product| StockMovement {
            id: new_id(),
            product_id: product.id.clone(),
            quantity: initial_stock,
            date: EventDate::from_instant(now),
            created_at: now,
        })
        .collect())
}

/// Creates one product with the next SKU.
///
/// A positive `initial_stock` also records an opening stock movement dated
/// `now`.
pub fn create_product(
    data: &AppData,
    draft: &ProductDraft,
    initial_stock: i64,
    now: DateTime<Utc>,
) -> CoreResult<DataEvent> {
    draft.validate()?;

    let mut skus = SkuSequence::from_products(&data.products);
    let product = Product {
        id: new_id(),
        name: draft.name.trim().to_string(),
        sku: Some(skus.next()),
        category: draft.category,
        model: non_blank(draft.model.as_deref()),
        color: non_blank(draft.color.as_deref()),
        default_unit_price: draft.default_unit_price,
        created_at: now,
    };

    let products = vec![product];
    let movements = opening_stock(&products, initial_stock, now)?;
    Ok(DataEvent::ProductsCreated {
        products,
        movements,
    })
}

/// Creates one product per variant.
///
/// ## Rules
/// - Every variant needs a model
/// - No two variants may share the same (color, model) pair
/// - Names are `"{name} {model}"` plus `" - {color}"` when a color is given
/// - SKUs are consecutive, starting after the highest existing one
/// - `initial_stock > 0` gives each new product an opening movement
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use tienda_core::commands::{create_variant_batch, DataEvent, ProductDraft, VariantDraft};
/// use tienda_core::{AppData, Category, Money};
///
/// let draft = ProductDraft {
///     name: "Funda Silicona".into(),
///     category: Category::Funda,
///     model: None,
///     color: None,
///     default_unit_price: Money::from_pesos(9000),
/// };
/// let variants = vec![
///     VariantDraft { model: "15 PRO".into(), color: Some("Negro".into()) },
///     VariantDraft { model: "16".into(), color: None },
/// ];
/// let event = create_variant_batch(&AppData::new(), &draft, &variants, 3, Utc::now()).unwrap();
/// let DataEvent::ProductsCreated { products, movements } = event else { unreachable!() };
/// assert_eq!(products[0].name, "Funda Silicona 15 PRO - Negro");
/// assert_eq!(products[1].sku.as_deref(), Some("SKU-0002"));
/// assert_eq!(movements.len(), 2);
/// ```
pub fn create_variant_batch(
    data: &AppData,
    draft: &ProductDraft,
    variants: &[VariantDraft],
    initial_stock: i64,
    now: DateTime<Utc>,
) -> CoreResult<DataEvent> {
    validate_product_name(&draft.name)?;
    validate_category(draft.category)?;
    validate_price("defaultUnitPrice", draft.default_unit_price)?;

    if variants.is_empty() {
        return Err(ValidationError::required("variants").into());
    }

    let mut seen: Vec<(String, Option<String>)> = Vec::with_capacity(variants.len());
    for variant in variants {
        let model = non_blank(Some(variant.model.as_str()))
            .ok_or_else(|| ValidationError::required("model"))?;
        let color = non_blank(variant.color.as_deref());
        let key = (model, color);
        if seen.contains(&key) {
            return Err(CoreError::DuplicateVariant {
                model: key.0,
                color: key.1.unwrap_or_default(),
            });
        }
        seen.push(key);
    }

    let base_name = draft.name.trim();
    let mut skus = SkuSequence::from_products(&data.products);
    let products: Vec<Product> = seen
        .into_iter()
        .map(|(model, color)| {
            let name = match &color {
                Some(color) => format!("{base_name} {model} - {color}"),
                None => format!("{base_name} {model}"),
            };
            Product {
                id: new_id(),
                name,
                sku: Some(skus.next()),
                category: draft.category,
                model: Some(model),
                color,
                default_unit_price: draft.default_unit_price,
                created_at: now,
            }
        })
        .collect();

    let movements = opening_stock(&products, initial_stock, now)?;
    Ok(DataEvent::ProductsCreated {
        products,
        movements,
    })
}

/// Edits a product. SKU and creation time are kept.
pub fn update_product(
    data: &AppData,
    product_id: &str,
    draft: &ProductDraft,
) -> CoreResult<DataEvent> {
    let existing = data
        .find_product(product_id)
        .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;
    draft.validate()?;

    Ok(DataEvent::ProductUpdated(Product {
        id: existing.id.clone(),
        name: draft.name.trim().to_string(),
        sku: existing.sku.clone(),
        category: draft.category,
        model: non_blank(draft.model.as_deref()),
        color: non_blank(draft.color.as_deref()),
        default_unit_price: draft.default_unit_price,
        created_at: existing.created_at,
    }))
}

/// Removes products from the catalog.
pub fn delete_products(data: &AppData, product_ids: &[String]) -> CoreResult<DataEvent> {
    if product_ids.is_empty() {
        return Err(ValidationError::required("productIds").into());
    }
    if let Some(missing) = product_ids.iter().find(|id| data.find_product(id).is_none()) {
        return Err(CoreError::ProductNotFound(missing.clone()));
    }
    Ok(DataEvent::ProductsDeleted(product_ids.to_vec()))
}

// =============================================================================
// Stock Commands
// =============================================================================

/// Goods received.
#[derive(Debug, Clone, PartialEq)]
pub struct StockEntryDraft {
    pub product_id: String,
    pub quantity: i64,
    pub date: EventDate,
}

/// A shelf count: "there are `declared` units of this product".
#[derive(Debug, Clone, PartialEq)]
pub struct StockAdjustmentDraft {
    pub product_id: String,
    pub declared: i64,
    pub date: EventDate,
}

fn require_product<'a>(data: &'a AppData, product_id: &str) -> CoreResult<&'a Product> {
    if product_id.trim().is_empty() {
        return Err(ValidationError::required("productId").into());
    }
    data.find_product(product_id)
        .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))
}

/// Records a stock receipt. Quantity must be positive.
pub fn record_stock_entry(
    data: &AppData,
    draft: &StockEntryDraft,
    now: DateTime<Utc>,
) -> CoreResult<DataEvent> {
    require_product(data, &draft.product_id)?;
    validate_positive_quantity("quantity", draft.quantity)?;
    validate_event_date("date", &draft.date)?;

    Ok(DataEvent::StockMoved(StockMovement {
        id: new_id(),
        product_id: draft.product_id.clone(),
        quantity: draft.quantity,
        date: draft.date.clone(),
        created_at: now,
    }))
}

/// Brings computed stock in line with a shelf count.
///
/// Returns `None` when the count already matches.
///
/// ```rust
/// use chrono::Utc;
/// use tienda_core::commands::{adjust_stock, StockAdjustmentDraft};
/// use tienda_core::AppData;
///
/// let draft = StockAdjustmentDraft {
///     product_id: "missing".into(),
///     declared: 4,
///     date: "2024-03-15".into(),
/// };
/// assert!(adjust_stock(&AppData::new(), &draft, Utc::now()).is_err());
/// ```
pub fn adjust_stock(
    data: &AppData,
    draft: &StockAdjustmentDraft,
    now: DateTime<Utc>,
) -> CoreResult<Option<DataEvent>> {
    require_product(data, &draft.product_id)?;
    validate_declared_stock(draft.declared)?;
    validate_event_date("date", &draft.date)?;

    let delta = adjustment_quantity(&draft.product_id, draft.declared, data);
    if delta == 0 {
        return Ok(None);
    }

    Ok(Some(DataEvent::StockMoved(StockMovement {
        id: new_id(),
        product_id: draft.product_id.clone(),
        quantity: delta,
        date: draft.date.clone(),
        created_at: now,
    })))
}

// =============================================================================
// Sale Commands
// =============================================================================

/// One row of the sale form.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleLineDraft {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl SaleLineDraft {
    /// Rows with no product, a non-positive quantity or a negative price are
    /// dropped silently.
    pub fn is_usable(&self) -> bool {
        !self.product_id.trim().is_empty() && self.quantity > 0 && !self.unit_price.is_negative()
    }
}

/// The sale form.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleDraft {
    pub date: EventDate,
    pub payment_method: String,
    pub lines: Vec<SaleLineDraft>,
    /// Hand-typed total. `None` means "sum of line totals".
    pub total_override: Option<Money>,
}

impl SaleDraft {
    /// Sum of the usable lines, what the form shows before any override.
    pub fn computed_total(&self) -> Money {
        self.lines
            .iter()
            .filter(|line| line.is_usable())
            .map(|line| line.unit_price.multiply_quantity(line.quantity))
            .sum()
    }

    pub fn final_total(&self) -> Money {
        self.total_override.unwrap_or_else(|| self.computed_total())
    }
}

/// Validates a draft and builds its items. Shared by create and edit.
fn build_sale(
    data: &AppData,
    id: String,
    draft: &SaleDraft,
    original: Option<&Sale>,
) -> CoreResult<Sale> {
    let items: Vec<SaleItem> = draft
        .lines
        .iter()
        .filter(|line| line.is_usable())
        .map(|line| {
            let name = data
                .find_product(&line.product_id)
                .map(|p| p.name.clone())
                .unwrap_or_default();
            SaleItem::new(line.product_id.clone(), name, line.unit_price, line.quantity)
        })
        .collect();

    if items.is_empty() {
        return Err(CoreError::NoValidItems);
    }

    validate_event_date("date", &draft.date)?;
    if draft.payment_method.trim().is_empty() {
        return Err(ValidationError::required("paymentMethod").into());
    }

    validate_sale_stock(&items, data, original)?;

    Ok(Sale {
        id,
        date: draft.date.clone(),
        payment_method: draft.payment_method.trim().to_string(),
        total_amount: draft.final_total(),
        items,
    })
}

/// Records a new sale.
pub fn create_sale(data: &AppData, draft: &SaleDraft) -> CoreResult<DataEvent> {
    build_sale(data, new_id(), draft, None).map(DataEvent::SaleRecorded)
}

/// Replaces a stored sale, giving its original quantities back to stock
/// before the check.
pub fn update_sale(data: &AppData, sale_id: &str, draft: &SaleDraft) -> CoreResult<DataEvent> {
    let original = data
        .find_sale(sale_id)
        .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;
    build_sale(data, original.id.clone(), draft, Some(original)).map(DataEvent::SaleReplaced)
}

/// Removes a sale. Its quantities return to stock implicitly.
pub fn delete_sale(data: &AppData, sale_id: &str) -> CoreResult<DataEvent> {
    data.find_sale(sale_id)
        .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;
    Ok(DataEvent::SaleDeleted(sale_id.to_string()))
}

// =============================================================================
// Unit Tests
// =============================================================================
