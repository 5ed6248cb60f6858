//! # Sales State
//!
//! Everything that lives only while the sales view is open: the cart, the
//! payment step and the last search results. Dropping it is how leaving
//! the view clears the cart.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  enter #/ventas ──► SalesState::new()  (empty cart)                     │
//! │                                                                         │
//! │  search ──► results ──► add ──► cart ──► checkout ──► receipt           │
//! │                                   ▲          │                          │
//! │                                   └──────────┘ cancel keeps the cart    │
//! │                                                                         │
//! │  leave #/ventas ──► dropped  (cart and open checkout discarded)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use farma_core::{Cart, Checkout, Product, Receipt};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct SalesState {
    cart: Cart,
    checkout: Option<Checkout>,
    results: Vec<Product>,
    last_receipt: Option<Receipt>,
}

impl SalesState {
    pub fn new(branch_id: i64) -> Self {
        SalesState {
            cart: Cart::new(branch_id),
            checkout: None,
            results: Vec::new(),
            last_receipt: None,
        }
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The cart for editing. Locked while the payment step is open.
    pub fn cart_mut(&mut self) -> AppResult<&mut Cart> {
        if self.checkout.is_some() {
            return Err(AppError::business(
                "Close the payment step (cancel) before editing the cart",
            ));
        }
        Ok(&mut self.cart)
    }

    pub fn checkout(&self) -> Option<&Checkout> {
        self.checkout.as_ref()
    }

    /// Both halves at once, for steps that read the cart while moving
    /// the checkout.
    pub fn checkout_with_cart(&mut self) -> AppResult<(&mut Checkout, &mut Cart)> {
        match self.checkout.as_mut() {
            Some(checkout) => Ok((checkout, &mut self.cart)),
            None => Err(AppError::business(
                "No payment step is open (use checkout)",
            )),
        }
    }

    pub fn set_checkout(&mut self, checkout: Option<Checkout>) {
        self.checkout = checkout;
    }

    pub fn results(&self) -> &[Product] {
        &self.results
    }

    pub fn set_results(&mut self, results: Vec<Product>) {
        self.results = results;
    }

    /// A search result by its 1-based position on screen.
    pub fn result_at(&self, position: usize) -> Option<&Product> {
        position.checked_sub(1).and_then(|i| self.results.get(i))
    }

    pub fn last_receipt(&self) -> Option<&Receipt> {
        self.last_receipt.as_ref()
    }

    pub fn set_last_receipt(&mut self, receipt: Receipt) {
        self.last_receipt = Some(receipt);
    }
}
