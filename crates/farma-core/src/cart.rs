//! # Cart
//!
//! The sales view's cart: line items keyed by product id, each held between
//! one unit and the stock the backend reported.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Operator Action          Cart Method             Result                │
//! │  ───────────────          ───────────             ──────                │
//! │                                                                         │
//! │  Pick search result ─────► add_item() ──────────► push or increment,   │
//! │                                                   clamp to stock        │
//! │                                                                         │
//! │  Type new quantity ──────► set_quantity() ──────► clamp to [1, stock]  │
//! │                                                                         │
//! │  Click remove ───────────► remove_item() ───────► retain != id         │
//! │                                                                         │
//! │  Sale confirmed ─────────► clear() ─────────────► empty                │
//! │                                                                         │
//! │  Any clamp returns a CartNotice so the operator sees the bound.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Product ids are unique across lines
//! - `1 <= quantity <= floor(available_stock)` after every mutation made
//!   through this API; only [`Cart::refresh_stock`] can break the upper
//!   bound, and [`Cart::stock_violations`] reports it
//! - `total()` is always the exact sum of line subtotals

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, StockViolation};
use crate::money::Money;
use crate::types::{stock_ceiling, Client, Product};

/// Branch (`sucursal`) used when none is configured.
pub const DEFAULT_BRANCH_ID: i64 = 1;

// =============================================================================
// Line Item
// =============================================================================

/// One product in the cart.
///
/// The unit price is frozen when the product is first added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LineItem {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    /// Last stock level the backend reported for this product
    pub available_stock: f64,
}

impl LineItem {
    fn from_product(product: &Product, quantity: i64) -> Self {
        LineItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            quantity,
            unit_price: product.price,
            available_stock: product.stock,
        }
    }

    /// `quantity × unit_price`
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// Highest quantity this line may hold.
    pub fn max_quantity(&self) -> i64 {
        stock_ceiling(self.available_stock)
    }
}

// =============================================================================
// Notices
// =============================================================================

/// A correction applied to the operator's input.
///
/// Not an error: the cart was updated, just not to the exact number asked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", tag = "kind")]
#[ts(export)]
pub enum CartNotice {
    /// Quantity was lowered to the available stock.
    ClampedToStock { product_id: String, name: String, max: i64 },
    /// Quantity was raised to the minimum of one unit.
    RaisedToMinimum { product_id: String, name: String },
}

impl std::fmt::Display for CartNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CartNotice::ClampedToStock { name, max, .. } => {
                write!(f, "Only {max} units of {name} in stock; quantity set to {max}")
            }
            CartNotice::RaisedToMinimum { name, .. } => {
                write!(f, "Minimum quantity for {name} is 1")
            }
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    items: Vec<LineItem>,
    /// Client picked from the cart's client selector
    client: Option<Client>,
    branch_id: i64,
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new(DEFAULT_BRANCH_ID)
    }
}

impl Cart {
    pub fn new(branch_id: i64) -> Self {
        Cart {
            items: Vec::new(),
            client: None,
            branch_id,
        }
    }

    /// Adds a product or increases the quantity of its existing line.
    ///
    /// ## Behavior
    /// - No sellable unit in stock: `OutOfStock`, cart untouched
    /// - Already in cart: `existing + requested`, clamped to stock
    /// - New line: `min(requested, stock)`
    ///
    /// A requested quantity below one is treated as one.
    pub fn add_item(&mut self, product: &Product, requested: i64) -> CoreResult<Option<CartNotice>> {
        if product.is_out_of_stock() {
            return Err(CoreError::OutOfStock {
                product_id: product.id.clone(),
                name: product.name.clone(),
            });
        }

        let requested = requested.max(1);
        let max = product.stock_ceiling();

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            item.available_stock = product.stock;
            let wanted = item.quantity.saturating_add(requested);
            item.quantity = wanted.min(max);
            return Ok((wanted > max).then(|| clamped(item)));
        }

        let item = LineItem::from_product(product, requested.min(max));
        let notice = (requested > max).then(|| clamped(&item));
        self.items.push(item);
        Ok(notice)
    }

    /// Sets the quantity of a line, clamped to `[1, stock]`.
    ///
    /// The stock bound is applied first and the minimum second, so a line
    /// whose stock has since dropped to zero holds one unit and is caught by
    /// [`Cart::stock_violations`] at submission. Unknown ids are ignored.
    pub fn set_quantity(&mut self, product_id: &str, quantity: i64) -> Option<CartNotice> {
        let item = self.items.iter_mut().find(|i| i.product_id == product_id)?;
        let max = item.max_quantity();

        let mut value = quantity;
        let mut notice = None;
        if value > max {
            value = max;
            notice = Some(CartNotice::ClampedToStock {
                product_id: item.product_id.clone(),
                name: item.name.clone(),
                max,
            });
        }
        if value < 1 {
            value = 1;
            notice = Some(CartNotice::RaisedToMinimum {
                product_id: item.product_id.clone(),
                name: item.name.clone(),
            });
        }

        item.quantity = value;
        notice
    }

    /// Removes a line. Returns whether anything was removed.
    pub fn remove_item(&mut self, product_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        self.items.len() != before
    }

    /// Records a fresher stock level for a line.
    ///
    /// Does not touch the quantity; a line left above its stock shows up in
    /// [`Cart::stock_violations`].
    pub fn refresh_stock(&mut self, product_id: &str, stock: f64) -> bool {
        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => {
                item.available_stock = stock;
                true
            }
            None => false,
        }
    }

    /// Lines whose quantity exceeds their available stock.
    pub fn stock_violations(&self) -> Vec<StockViolation> {
        self.items
            .iter()
            .filter(|i| i.quantity > i.max_quantity())
            .map(|i| StockViolation {
                product_id: i.product_id.clone(),
                name: i.name.clone(),
                requested: i.quantity,
                available: i.max_quantity(),
            })
            .collect()
    }

    /// Empties the cart and forgets the selected client.
    pub fn clear(&mut self) {
        self.items.clear();
        self.client = None;
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn get(&self, product_id: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    /// Number of distinct products.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items
            .iter()
            .fold(0i64, |acc, i| acc.saturating_add(i.quantity))
    }

    /// Sum of line subtotals, recomputed on every call.
    pub fn total(&self) -> Money {
        self.items.iter().map(LineItem::subtotal).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn client(&self) -> Option<&Client> {
        self.client.as_ref()
    }

    pub fn select_client(&mut self, client: Option<Client>) {
        self.client = client;
    }

    pub fn branch_id(&self) -> i64 {
        self.branch_id
    }

    pub fn set_branch_id(&mut self, branch_id: i64) {
        self.branch_id = branch_id;
    }
}

fn clamped(item: &LineItem) -> CartNotice {
    CartNotice::ClampedToStock {
        product_id: item.product_id.clone(),
        name: item.name.clone(),
        max: item.quantity,
    }
}

/// Cart totals summary for the cart footer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub total: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            total: cart.total(),
        }
    }
}
