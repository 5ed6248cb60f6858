//! # Cart Commands
//!
//! Cart manipulation in the sales view.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ In Cart  │────►│ Payment  │────►│ Receipt  │       │
//! │  │  Cart    │     │          │     │  Step    │     │          │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │                        │                 │                              │
//! │                   add_to_cart       confirm                            │
//! │                   set_quantity      (checkout.rs)                      │
//! │                   remove_line            │                              │
//! │                   select_client          ▼                              │
//! │                        │            cart cleared                        │
//! │                   clear_cart ──────────────────────►  (back to empty)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! While the payment step is open the cart is read-only.

use farma_api::PosBackend;
use farma_core::{Cart, CartNotice, CartTotals, Client, LineItem};
use tracing::debug;

use crate::commands::ProductSelector;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Cart response including items and totals.
#[derive(Debug, Clone)]
pub struct CartResponse {
    pub items: Vec<LineItem>,
    pub totals: CartTotals,
    pub client: Option<Client>,
    /// Set when the last change was adjusted to fit stock
    pub notice: Option<CartNotice>,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        CartResponse {
            items: cart.items().to_vec(),
            totals: CartTotals::from(cart),
            client: cart.client().cloned(),
            notice: None,
        }
    }
}

impl CartResponse {
    fn with_notice(mut self, notice: Option<CartNotice>) -> Self {
        self.notice = notice;
        self
    }
}

pub fn get_cart(state: &AppState) -> AppResult<CartResponse> {
    Ok(CartResponse::from(state.sales()?.cart()))
}

/// Adds a product to the cart.
///
/// ## Behavior
/// - `Result(n)`: the n-th product of the last search, as shown
/// - `Id(id)`: fetched from the backend for its current price and stock
/// - Already in cart: quantity increases, clamped to stock
/// - Out of stock: rejected, cart untouched
pub async fn add_to_cart(
    state: &mut AppState,
    backend: &dyn PosBackend,
    selector: ProductSelector,
    quantity: i64,
) -> AppResult<CartResponse> {
    debug!(?selector, quantity, "add_to_cart command");

    let product = match selector {
        ProductSelector::Result(position) => state
            .sales()?
            .result_at(position)
            .cloned()
            .ok_or_else(|| {
                AppError::validation(format!("No search result #{position}. Search first."))
            })?,
        ProductSelector::Id(id) => {
            state.sales()?;
            backend.get_product(&id).await?
        }
    };

    let cart = state.sales_mut()?.cart_mut()?;
    let notice = cart.add_item(&product, quantity)?;
    Ok(CartResponse::from(&*cart).with_notice(notice))
}

/// Sets the quantity of a cart line, clamped to `[1, stock]`.
pub fn set_quantity(state: &mut AppState, line: usize, quantity: i64) -> AppResult<CartResponse> {
    let cart = state.sales_mut()?.cart_mut()?;
    let product_id = line_product_id(cart, line)?;
    let notice = cart.set_quantity(&product_id, quantity);
    debug!(product_id = %product_id, quantity, "set_quantity command");
    Ok(CartResponse::from(&*cart).with_notice(notice))
}

pub fn remove_line(state: &mut AppState, line: usize) -> AppResult<CartResponse> {
    let cart = state.sales_mut()?.cart_mut()?;
    let product_id = line_product_id(cart, line)?;
    cart.remove_item(&product_id);
    Ok(CartResponse::from(&*cart))
}

/// Empties the cart and forgets the selected client.
pub fn clear_cart(state: &mut AppState) -> AppResult<CartResponse> {
    let cart = state.sales_mut()?.cart_mut()?;
    cart.clear();
    Ok(CartResponse::from(&*cart))
}

/// Picks (or clears) the client the sale defaults to.
///
/// The client must already exist; unknown CIs are created from the
/// payment step instead.
pub async fn select_client(
    state: &mut AppState,
    backend: &dyn PosBackend,
    document_number: Option<String>,
) -> AppResult<CartResponse> {
    state.sales()?;
    let client = match document_number {
        Some(ci) => Some(backend.find_client_by_document(&ci).await?.ok_or_else(|| {
            AppError::not_found(format!(
                "No client with CI {ci}. Register them at checkout (checkout, ci {ci})."
            ))
        })?),
        None => None,
    };

    let cart = state.sales_mut()?.cart_mut()?;
    cart.select_client(client);
    Ok(CartResponse::from(&*cart))
}

fn line_product_id(cart: &Cart, line: usize) -> AppResult<String> {
    line.checked_sub(1)
        .and_then(|i| cart.items().get(i))
        .map(|item| item.product_id.clone())
        .ok_or_else(|| AppError::validation(format!("The cart has no line #{line}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TerminalConfig;
    use crate::error::ErrorCode;
    use crate::router::Route;
    use crate::testing::{sample_products, vendedor, FakeBackend};
    use farma_core::Money;

    fn sales_state() -> AppState {
        let mut state = AppState::new(TerminalConfig::default());
        state.session.set_user(Some(vendedor()));
        state.navigate(Route::Ventas).unwrap();
        state.sales_mut().unwrap().set_results(sample_products());
        state
    }

    #[tokio::test]
    async fn test_add_from_results_clamps_to_stock() {
        let backend = FakeBackend::new();
        let mut state = sales_state();

        // Amoxicilina has 2 in stock
        let cart = add_to_cart(&mut state, &backend, ProductSelector::Result(2), 5)
            .await
            .unwrap();
        assert_eq!(cart.items[0].quantity, 2);
        assert!(matches!(cart.notice, Some(CartNotice::ClampedToStock { max: 2, .. })));
    }

    #[tokio::test]
    async fn test_add_out_of_stock_is_rejected() {
        let backend = FakeBackend::new();
        let mut state = sales_state();

        let err = add_to_cart(&mut state, &backend, ProductSelector::Result(3), 1)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert!(state.sales().unwrap().cart().is_empty());
    }

    #[tokio::test]
    async fn test_add_by_id_uses_backend_price() {
        let backend = FakeBackend::new();
        let mut state = sales_state();

        let cart = add_to_cart(&mut state, &backend, ProductSelector::Id("1".into()), 2)
            .await
            .unwrap();
        assert_eq!(cart.totals.total, Money::from_cents(700));
    }

    #[tokio::test]
    async fn test_quantity_and_remove_by_line() {
        let backend = FakeBackend::new();
        let mut state = sales_state();
        add_to_cart(&mut state, &backend, ProductSelector::Result(1), 1)
            .await
            .unwrap();

        let cart = set_quantity(&mut state, 1, 0).unwrap();
        assert_eq!(cart.items[0].quantity, 1);
        assert!(matches!(cart.notice, Some(CartNotice::RaisedToMinimum { .. })));

        assert!(set_quantity(&mut state, 4, 2).is_err());

        let cart = remove_line(&mut state, 1).unwrap();
        assert!(cart.items.is_empty());
    }

    #[tokio::test]
    async fn test_select_unknown_client() {
        let backend = FakeBackend::new();
        let mut state = sales_state();

        let err = select_client(&mut state, &backend, Some("9999999".into()))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let cart = select_client(&mut state, &backend, Some("1234567".into()))
            .await
            .unwrap();
        assert_eq!(cart.client.unwrap().name, "Ana Pérez");
    }
}
