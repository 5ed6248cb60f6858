//! # Checkout Commands
//!
//! Drives the payment step: client lookup by CI, payment entry and the
//! invoice submission that ends in a receipt.
//!
//! ## Confirm Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  confirm                                                                │
//! │     │                                                                   │
//! │     ├── 1. Refresh stock of every line (GET /api/productos/{id})        │
//! │     ├── 2. Checkout::begin_submit ──► InvoiceDraft                      │
//! │     │        stock violation / no client / short tender ──► error,      │
//! │     │        nothing sent, cart untouched                               │
//! │     ├── 3. POST /api/facturas                                           │
//! │     │        │                                                          │
//! │     │        ├── Err ──► submit_failed: back to payment, cart kept      │
//! │     │        └── Ok  ──► submit_succeeded ──► Receipt                   │
//! │     │                                                                   │
//! │     └── 4. Clear cart, close the step, export receipt files             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Local, NaiveDateTime};
use farma_api::PosBackend;
use farma_core::{
    Checkout, CheckoutStep, Client, CreatedInvoice, LookupStatus, Money, PaymentMethod, Receipt,
};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::receipts::{ExportedReceipt, ReceiptExporter};
use crate::state::AppState;

/// Snapshot of the payment step for display.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutView {
    pub short_id: String,
    pub step: CheckoutStep,
    pub total: Money,
    pub client: Option<Client>,
    pub document_number: Option<String>,
    /// CI the backend did not know; the create form is offered
    pub not_found: Option<String>,
    pub method: PaymentMethod,
    pub tendered: Money,
    pub change: Money,
    pub tender_locked: bool,
    pub note: String,
    pub last_error: Option<String>,
}

impl From<&Checkout> for CheckoutView {
    fn from(checkout: &Checkout) -> Self {
        let not_found = match checkout.lookup() {
            LookupStatus::NotFound { document_number } => Some(document_number.clone()),
            LookupStatus::Waiting => None,
        };
        CheckoutView {
            short_id: checkout.short_id(),
            step: checkout.step(),
            total: checkout.total(),
            client: checkout.client().cloned(),
            document_number: checkout.document_number().map(str::to_string),
            not_found,
            method: checkout.method(),
            tendered: checkout.tendered(),
            change: checkout.change(),
            tender_locked: checkout.is_tender_locked(),
            note: checkout.note().to_string(),
            last_error: checkout.last_error().map(str::to_string),
        }
    }
}

/// A completed sale.
#[derive(Debug, Clone)]
pub struct SaleOutcome {
    pub receipt: Receipt,
    /// `None` when the files could not be written
    pub files: Option<ExportedReceipt>,
    pub export_error: Option<String>,
}

// =============================================================================
// Opening and Closing
// =============================================================================

/// Opens the payment step for the current cart.
pub fn open_checkout(state: &mut AppState) -> AppResult<CheckoutView> {
    let sales = state.sales_mut()?;
    if sales.checkout().is_some() {
        return Err(AppError::business(
            "The payment step is already open (cancel to close it)",
        ));
    }

    let mut checkout = Checkout::new();
    checkout.open(sales.cart())?;
    info!(
        checkout = %checkout.short_id(),
        total = %checkout.total(),
        "Payment step opened"
    );

    let view = CheckoutView::from(&checkout);
    sales.set_checkout(Some(checkout));
    Ok(view)
}

/// Closes the payment step. The cart is kept as it was.
pub fn cancel_checkout(state: &mut AppState) -> AppResult<()> {
    let sales = state.sales_mut()?;
    let (checkout, _) = sales.checkout_with_cart()?;
    checkout.cancel()?;
    debug!(checkout = %checkout.short_id(), "Payment step cancelled");
    sales.set_checkout(None);
    Ok(())
}

pub fn view_checkout(state: &AppState) -> AppResult<CheckoutView> {
    state
        .sales()?
        .checkout()
        .map(CheckoutView::from)
        .ok_or_else(|| AppError::business("No payment step is open (use checkout)"))
}

// =============================================================================
// Client Lookup
// =============================================================================

/// Looks the typed CI up. Unknown documents offer the create form.
pub async fn lookup_client(
    state: &mut AppState,
    backend: &dyn PosBackend,
    raw: &str,
) -> AppResult<CheckoutView> {
    let (checkout, _) = state.sales_mut()?.checkout_with_cart()?;
    let document_number = checkout.begin_lookup(raw)?;

    match backend.find_client_by_document(&document_number).await? {
        Some(client) => {
            debug!(client_id = %client.id, "Client found");
            checkout.client_found(client)?;
        }
        None => {
            debug!(ci = %document_number, "Client not found");
            checkout.client_not_found(&document_number)?;
        }
    }
    Ok(CheckoutView::from(&*checkout))
}

/// Registers the client behind a CI the lookup did not find and selects it.
pub async fn create_client(
    state: &mut AppState,
    backend: &dyn PosBackend,
    name: &str,
) -> AppResult<CheckoutView> {
    let (checkout, _) = state.sales_mut()?.checkout_with_cart()?;
    let new_client = checkout.new_client(name)?;

    let client = backend.create_client(&new_client).await?;
    info!(client_id = %client.id, "Client registered at checkout");
    checkout.client_found(client)?;
    Ok(CheckoutView::from(&*checkout))
}

/// Back to the lookup to pick someone else.
pub fn change_client(state: &mut AppState) -> AppResult<CheckoutView> {
    let (checkout, _) = state.sales_mut()?.checkout_with_cart()?;
    checkout.change_client()?;
    Ok(CheckoutView::from(&*checkout))
}

// =============================================================================
// Payment Entry
// =============================================================================

pub fn select_method(state: &mut AppState, method: PaymentMethod) -> AppResult<CheckoutView> {
    let (checkout, _) = state.sales_mut()?.checkout_with_cart()?;
    checkout.select_method(method)?;
    Ok(CheckoutView::from(&*checkout))
}

pub fn set_tendered(state: &mut AppState, raw: &str) -> AppResult<CheckoutView> {
    let (checkout, _) = state.sales_mut()?.checkout_with_cart()?;
    checkout.set_tendered(raw)?;
    Ok(CheckoutView::from(&*checkout))
}

pub fn set_note(state: &mut AppState, note: &str) -> AppResult<CheckoutView> {
    let (checkout, _) = state.sales_mut()?.checkout_with_cart()?;
    checkout.set_note(note)?;
    Ok(CheckoutView::from(&*checkout))
}

// =============================================================================
// Submission
// =============================================================================

/// Submits the invoice and completes the sale.
///
/// ## Behavior
/// - Stock is re-read first; a line that no longer fits aborts with the
///   offending products named and nothing sent
/// - A refused invoice keeps the cart and returns to payment with the
///   backend's message
/// - On success the cart is cleared, the step closes and the receipt is
///   written to disk
pub async fn confirm(
    state: &mut AppState,
    backend: &dyn PosBackend,
    exporter: &ReceiptExporter,
) -> AppResult<SaleOutcome> {
    let seller = state.session.seller_name().map(str::to_string);
    let sales = state.sales_mut()?;

    let product_ids: Vec<String> = match sales.checkout() {
        Some(_) => sales
            .cart()
            .items()
            .iter()
            .map(|item| item.product_id.clone())
            .collect(),
        None => return Err(AppError::business("No payment step is open (use checkout)")),
    };

    let mut fresh_stock = Vec::with_capacity(product_ids.len());
    for id in product_ids {
        match backend.get_product(&id).await {
            Ok(product) => fresh_stock.push((id, product.stock)),
            Err(e) => warn!(product_id = %id, error = %e, "Stock refresh failed, keeping cached stock"),
        }
    }

    let (checkout, cart) = sales.checkout_with_cart()?;
    for (id, stock) in fresh_stock {
        cart.refresh_stock(&id, stock);
    }

    let draft = checkout.begin_submit(cart)?;
    debug!(
        checkout = %checkout.short_id(),
        lines = draft.items.len(),
        total = %draft.total,
        "Submitting invoice"
    );

    let created = match backend.create_invoice(&draft).await {
        Ok(created) => created,
        Err(e) => {
            let err = AppError::from(e);
            warn!(checkout = %checkout.short_id(), error = %err, "Invoice refused");
            checkout.submit_failed(err.message.clone())?;
            return Err(err);
        }
    };

    let issued_at = display_timestamp(created.issued_at.as_deref());
    let created = CreatedInvoice {
        issued_at: Some(issued_at.clone()),
        ..created
    };
    let receipt = checkout
        .submit_succeeded(&created, seller.as_deref(), &issued_at)?
        .clone();

    cart.clear();
    sales.set_checkout(None);
    sales.set_last_receipt(receipt.clone());
    info!(
        receipt = %receipt.display_id,
        total = %receipt.total,
        "Sale completed"
    );

    let (files, export_error) = match exporter.export(&receipt) {
        Ok(files) => (Some(files), None),
        Err(e) => {
            warn!(error = %e, "Receipt export failed");
            (None, Some(AppError::from(e).message))
        }
    };

    Ok(SaleOutcome {
        receipt,
        files,
        export_error,
    })
}

/// Formats the server timestamp for the receipt, or the local time when the
/// server sent none. Unrecognised formats are shown as sent.
pub fn display_timestamp(raw: Option<&str>) -> String {
    const DISPLAY: &str = "%d/%m/%Y %H:%M";

    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Local::now().format(DISPLAY).to_string();
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&Local).format(DISPLAY).to_string();
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return parsed.format(DISPLAY).to_string();
        }
    }
    raw.to_string()
}
