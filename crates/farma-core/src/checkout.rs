//! # Checkout State Machine
//!
//! Drives one payment step over the cart: who pays, how, and what the
//! backend is asked to invoice.
//!
//! ## States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Idle ──open()──┬──► ClientLookup ──client_found()──► PaymentEntry     │
//! │                  │      │      ▲                        │    ▲          │
//! │   (cart has a    │      │      └──── change_client() ───┘    │          │
//! │    client) ──────┼──────┼──────────────────────────────►     │          │
//! │                  │      │                                    │          │
//! │                  │      └─ client_not_found(): inline        │          │
//! │                  │         create form (name required)       │          │
//! │                  │                                           │          │
//! │                  │            begin_submit() ◄───────────────┘          │
//! │                  │                  │        (stock / change checks     │
//! │                  │                  ▼         fail → stay here)         │
//! │                  │             Submitting ──submit_failed()──► Payment  │
//! │                  │                  │                          Entry    │
//! │                  │          submit_succeeded()                          │
//! │                  │                  ▼                                   │
//! │                  │               Receipt (terminal, cart cleared)       │
//! │                                                                         │
//! │   cancel() from any non-terminal state ──► Cancelled (terminal)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The machine never talks to the network. The caller performs the lookup,
//! client creation and invoice POST, then feeds the outcome back in.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::cart::Cart;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::receipt::{Receipt, ReceiptFallbacks, ReceiptLine};
use crate::types::{wire_id, Client, CreatedInvoice, NewClient, PaymentMethod};
use crate::validation::{validate_amount, validate_client_name, validate_document_number};

// =============================================================================
// Steps
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum CheckoutStep {
    Idle,
    ClientLookup,
    PaymentEntry,
    Submitting,
    Receipt,
    Cancelled,
}

impl CheckoutStep {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckoutStep::Receipt | CheckoutStep::Cancelled)
    }

    /// True while the payment step is on screen.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            CheckoutStep::ClientLookup | CheckoutStep::PaymentEntry | CheckoutStep::Submitting
        )
    }
}

impl std::fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CheckoutStep::Idle => "idle",
            CheckoutStep::ClientLookup => "client lookup",
            CheckoutStep::PaymentEntry => "payment entry",
            CheckoutStep::Submitting => "submitting",
            CheckoutStep::Receipt => "receipt",
            CheckoutStep::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Outcome of the last document lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupStatus {
    /// No lookup yet, or the last one was superseded.
    Waiting,
    /// Backend had no client with this CI; the create form is offered.
    NotFound { document_number: String },
}

// =============================================================================
// Invoice Request
// =============================================================================

/// Body of `POST /api/facturas`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceDraft {
    #[serde(rename = "id_cliente", serialize_with = "wire_id::serialize")]
    pub client_id: String,

    #[serde(rename = "id_sucursal")]
    pub branch_id: i64,

    pub items: Vec<InvoiceDraftLine>,

    #[serde(with = "crate::money::decimal")]
    pub total: Money,

    #[serde(rename = "recibido", with = "crate::money::decimal")]
    pub tendered: Money,

    #[serde(rename = "cambio", with = "crate::money::decimal")]
    pub change: Money,

    #[serde(rename = "nota")]
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceDraftLine {
    #[serde(rename = "id_producto", serialize_with = "wire_id::serialize")]
    pub product_id: String,

    #[serde(rename = "cantidad")]
    pub quantity: i64,

    #[serde(rename = "precio_unitario", with = "crate::money::decimal")]
    pub unit_price: Money,

    #[serde(with = "crate::money::decimal")]
    pub subtotal: Money,
}

// =============================================================================
// Checkout
// =============================================================================

/// One checkout session.
///
/// ## Lifecycle
/// Created idle, opened over a cart, and discarded once it reaches a
/// terminal step. A new sale gets a new `Checkout`.
#[derive(Debug, Clone)]
pub struct Checkout {
    id: Uuid,
    step: CheckoutStep,
    total: Money,
    client: Option<Client>,
    document_number: Option<String>,
    lookup: LookupStatus,
    method: PaymentMethod,
    tendered: Money,
    note: String,
    last_error: Option<String>,
    pending: Option<PendingSale>,
    receipt: Option<Receipt>,
}

/// What was sent while the request is in flight.
#[derive(Debug, Clone)]
struct PendingSale {
    draft: InvoiceDraft,
    lines: Vec<ReceiptLine>,
    client_label: String,
}

impl Default for Checkout {
    fn default() -> Self {
        Checkout {
            id: Uuid::new_v4(),
            step: CheckoutStep::Idle,
            total: Money::zero(),
            client: None,
            document_number: None,
            lookup: LookupStatus::Waiting,
            method: PaymentMethod::Cash,
            tendered: Money::zero(),
            note: String::new(),
            last_error: None,
            pending: None,
            receipt: None,
        }
    }
}

impl Checkout {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Opening
    // -------------------------------------------------------------------------

    /// Opens the payment step over the cart.
    ///
    /// Skips client lookup when the cart already has a client selected.
    /// Tendered starts at the total, cash is preselected.
    pub fn open(&mut self, cart: &Cart) -> CoreResult<CheckoutStep> {
        self.require_step(CheckoutStep::Idle, "open checkout")?;

        if cart.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        self.total = cart.total();
        self.tendered = self.total;
        self.method = PaymentMethod::Cash;

        self.step = match cart.client() {
            Some(client) => {
                self.client = Some(client.clone());
                CheckoutStep::PaymentEntry
            }
            None => CheckoutStep::ClientLookup,
        };
        Ok(self.step)
    }

    // -------------------------------------------------------------------------
    // Client Lookup
    // -------------------------------------------------------------------------

    /// Validates a typed document number and returns the digits to look up.
    pub fn begin_lookup(&mut self, raw: &str) -> CoreResult<String> {
        self.require_step(CheckoutStep::ClientLookup, "look up a client")?;
        let digits = validate_document_number(raw)?;
        self.document_number = Some(digits.clone());
        self.lookup = LookupStatus::Waiting;
        Ok(digits)
    }

    /// The backend found the client (or it was just created).
    pub fn client_found(&mut self, client: Client) -> CoreResult<()> {
        self.require_step(CheckoutStep::ClientLookup, "select a client")?;
        self.client = Some(client);
        self.lookup = LookupStatus::Waiting;
        self.last_error = None;
        self.step = CheckoutStep::PaymentEntry;
        Ok(())
    }

    /// The backend has no client with this document number.
    pub fn client_not_found(&mut self, document_number: &str) -> CoreResult<()> {
        self.require_step(CheckoutStep::ClientLookup, "record a failed lookup")?;
        self.lookup = LookupStatus::NotFound {
            document_number: document_number.to_string(),
        };
        Ok(())
    }

    /// Builds the inline create-client request for the last missed lookup.
    pub fn new_client(&self, name: &str) -> CoreResult<NewClient> {
        self.require_step(CheckoutStep::ClientLookup, "create a client")?;
        let LookupStatus::NotFound { document_number } = &self.lookup else {
            return Err(CoreError::ClientCreationUnavailable);
        };
        Ok(NewClient {
            name: validate_client_name(name)?,
            document_number: document_number.clone(),
        })
    }

    /// Goes back from payment to pick a different client.
    pub fn change_client(&mut self) -> CoreResult<()> {
        self.require_step(CheckoutStep::PaymentEntry, "change the client")?;
        self.lookup = LookupStatus::Waiting;
        self.step = CheckoutStep::ClientLookup;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Payment Entry
    // -------------------------------------------------------------------------

    /// Switches payment method. Tendered resets to the total either way.
    pub fn select_method(&mut self, method: PaymentMethod) -> CoreResult<()> {
        self.require_step(CheckoutStep::PaymentEntry, "change the payment method")?;
        self.method = method;
        self.tendered = self.total;
        Ok(())
    }

    /// Sets the tendered amount for cash payments.
    ///
    /// Change may go negative here; it is only rejected at submission.
    pub fn set_tendered(&mut self, raw: &str) -> CoreResult<Money> {
        self.require_step(CheckoutStep::PaymentEntry, "edit the tendered amount")?;
        if self.is_tender_locked() {
            return Err(CoreError::TenderLocked);
        }
        self.tendered = validate_amount("tendered", raw)?;
        Ok(self.tendered)
    }

    pub fn set_note(&mut self, note: &str) -> CoreResult<()> {
        self.require_step(CheckoutStep::PaymentEntry, "edit the note")?;
        self.note = note.trim().to_string();
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Submission
    // -------------------------------------------------------------------------

    /// Re-checks the cart and builds the invoice request.
    ///
    /// ## Checks, in order
    /// 1. Cart not empty
    /// 2. A client is known (from checkout or the cart selector)
    /// 3. Every line within its available stock, one message per offender
    /// 4. Change not negative
    ///
    /// Any failure leaves the machine in `PaymentEntry` with the cart and
    /// payment values untouched.
    pub fn begin_submit(&mut self, cart: &Cart) -> CoreResult<InvoiceDraft> {
        self.require_step(CheckoutStep::PaymentEntry, "submit")?;

        if cart.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        self.total = cart.total();
        if self.is_tender_locked() {
            self.tendered = self.total;
        }

        let client = self
            .client
            .clone()
            .or_else(|| cart.client().cloned())
            .ok_or(CoreError::NoClientSelected)?;

        let violations = cart.stock_violations();
        if !violations.is_empty() {
            let err = CoreError::StockExceeded(violations);
            self.last_error = Some(err.to_string());
            return Err(err);
        }

        let change = self.change();
        if change.is_negative() {
            let err = CoreError::NegativeChange {
                shortfall: change.abs(),
            };
            self.last_error = Some(err.to_string());
            return Err(err);
        }

        let draft = InvoiceDraft {
            client_id: client.id.clone(),
            branch_id: cart.branch_id(),
            items: cart
                .items()
                .iter()
                .map(|i| InvoiceDraftLine {
                    product_id: i.product_id.clone(),
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                    subtotal: i.subtotal(),
                })
                .collect(),
            total: self.total,
            tendered: self.tendered,
            change,
            note: self.note.clone(),
        };

        let lines = cart
            .items()
            .iter()
            .map(|i| ReceiptLine {
                name: i.name.clone(),
                quantity: i.quantity,
                unit_price: i.unit_price,
                subtotal: i.subtotal(),
            })
            .collect();

        self.pending = Some(PendingSale {
            draft: draft.clone(),
            lines,
            client_label: client.label(),
        });
        self.client = Some(client);
        self.last_error = None;
        self.step = CheckoutStep::Submitting;
        Ok(draft)
    }

    /// The backend created the invoice. Builds the receipt.
    ///
    /// The caller clears the cart once this returns.
    pub fn submit_succeeded(
        &mut self,
        created: &CreatedInvoice,
        seller: Option<&str>,
        issued_at: &str,
    ) -> CoreResult<&Receipt> {
        self.require_step(CheckoutStep::Submitting, "complete the sale")?;
        let pending = self.pending.take().ok_or_else(|| CoreError::InvalidTransition {
            step: self.step.to_string(),
            action: "complete a sale that was never submitted".to_string(),
        })?;

        let fallback_id = self.short_id();
        let receipt = Receipt::build(
            created,
            &pending.draft,
            pending.lines,
            Some(pending.client_label),
            ReceiptFallbacks {
                display_id: &fallback_id,
                seller,
                issued_at,
            },
        );

        self.step = CheckoutStep::Receipt;
        Ok(&*self.receipt.insert(receipt))
    }

    /// The backend refused the invoice. Back to payment with everything kept.
    pub fn submit_failed(&mut self, message: impl Into<String>) -> CoreResult<()> {
        self.require_step(CheckoutStep::Submitting, "record a failed submission")?;
        self.pending = None;
        self.last_error = Some(message.into());
        self.step = CheckoutStep::PaymentEntry;
        Ok(())
    }

    /// Abandons the checkout. The cart is left as it was.
    pub fn cancel(&mut self) -> CoreResult<()> {
        if self.step.is_terminal() {
            return Err(self.invalid("cancel"));
        }
        self.pending = None;
        self.step = CheckoutStep::Cancelled;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// First eight hex digits of the session id, for logs and fallbacks.
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn client(&self) -> Option<&Client> {
        self.client.as_ref()
    }

    pub fn document_number(&self) -> Option<&str> {
        self.document_number.as_deref()
    }

    pub fn lookup(&self) -> &LookupStatus {
        &self.lookup
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn tendered(&self) -> Money {
        self.tendered
    }

    /// `tendered − total`; negative while cash is still short.
    pub fn change(&self) -> Money {
        self.tendered - self.total
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    /// Message of the last failed submission, verbatim.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn receipt(&self) -> Option<&Receipt> {
        self.receipt.as_ref()
    }

    /// Card payments lock the tendered input.
    pub fn is_tender_locked(&self) -> bool {
        self.method == PaymentMethod::Card
    }

    fn require_step(&self, step: CheckoutStep, action: &str) -> CoreResult<()> {
        if self.step == step {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &str) -> CoreError {
        CoreError::InvalidTransition {
            step: self.step.to_string(),
            action: action.to_string(),
        }
    }
}
