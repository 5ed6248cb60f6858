//! # farma-core: Pure Business Logic for Farma POS
//!
//! Everything the point of sale decides on its own, as pure functions with
//! zero I/O. The backend owns persistence and inventory; this crate owns the
//! cart, the checkout flow and how backend payloads are read.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Farma POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 pos-terminal (operator front end)               │   │
//! │  │    Search ──► Cart ──► Client lookup ──► Payment ──► Receipt    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ farma-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │  cart    │ │ checkout │ │ receipt  │ │ normalize        │  │   │
//! │  │   │ LineItem │ │ Checkout │ │ Receipt  │ │ ListShape        │  │   │
//! │  │   │ Cart     │ │ Invoice  │ │ text/html│ │ products/clients │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO FILES • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                farma-api (REST client, reqwest)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer cents, decimal wire format, amount parsing
//! - [`types`] - Products, clients, invoices, users, suppliers and purchases
//! - [`cart`] - Stock-clamped cart
//! - [`checkout`] - Payment-step state machine and invoice request
//! - [`receipt`] - Receipt text/HTML rendering
//! - [`normalize`] - Backend response shapes into typed records
//! - [`role`] - Session role resolution
//! - [`validation`] - Operator input checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use farma_core::{Cart, Money};
//! use serde_json::json;
//!
//! let payload = json!({"productos": [
//!     {"id": 1, "Nombre_comercial": "Paracetamol", "Precio_venta": 3.5, "existencia": 2}
//! ]});
//! let products = farma_core::normalize::products(&payload);
//!
//! let mut cart = Cart::default();
//! let notice = cart.add_item(&products[0], 5).unwrap();
//!
//! assert!(notice.is_some()); // clamped to the 2 units in stock
//! assert_eq!(cart.total(), Money::from_cents(700));
//! ```

pub mod cart;
pub mod checkout;
pub mod error;
pub mod money;
pub mod normalize;
pub mod receipt;
pub mod role;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartNotice, CartTotals, LineItem};
pub use checkout::{Checkout, CheckoutStep, InvoiceDraft, LookupStatus};
pub use error::{CoreError, CoreResult, StockViolation, ValidationError};
pub use money::Money;
pub use receipt::Receipt;
pub use role::Role;
pub use types::*;
