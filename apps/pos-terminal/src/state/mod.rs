//! # State Module
//!
//! Application state for the terminal, owned by the operator loop.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         AppState                                        │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────────────┐  │
//! │  │ SessionState │  │ Route        │  │ SalesState (Some in #/ventas) │  │
//! │  │              │  │              │  │                              │  │
//! │  │ UserInfo     │  │ current hash │  │ Cart                         │  │
//! │  │ Role         │  │              │  │ Option<Checkout>             │  │
//! │  │              │  │              │  │ search results               │  │
//! │  └──────────────┘  └──────────────┘  └──────────────────────────────┘  │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────────────────────────────────────┐    │
//! │  │ SearchTickets│  │ TerminalConfig (read-only after startup)     │    │
//! │  └──────────────┘  └──────────────────────────────────────────────┘    │
//! │                                                                         │
//! │  Only the loop mutates state. Background searches never touch it;      │
//! │  their results come back through a channel and are checked against     │
//! │  the ticket generation first.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod sales;
mod search;
mod session;

pub use sales::SalesState;
pub use search::{SearchTicket, SearchTickets};
pub use session::SessionState;

use tracing::{debug, info};

use crate::config::TerminalConfig;
use crate::error::{AppError, AppResult};
use crate::router::Route;

#[derive(Debug)]
pub struct AppState {
    pub config: TerminalConfig,
    pub session: SessionState,
    pub searches: SearchTickets,
    route: Route,
    sales: Option<SalesState>,
}

impl AppState {
    pub fn new(config: TerminalConfig) -> Self {
        AppState {
            config,
            session: SessionState::default(),
            searches: SearchTickets::new(),
            route: Route::Inicio,
            sales: None,
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Moves to `route` if the session may open it.
    ///
    /// Entering the sales view starts an empty cart; leaving it drops the
    /// cart, any open checkout and outstanding searches.
    pub fn navigate(&mut self, route: Route) -> AppResult<&Route> {
        route.authorize(self.session.user())?;

        if self.route.is_sales() && !route.is_sales() {
            self.leave_sales();
        }
        if route.is_sales() && self.sales.is_none() {
            debug!(branch_id = self.config.store.branch_id, "Starting a new cart");
            self.sales = Some(SalesState::new(self.config.store.branch_id));
        }

        debug!(from = %self.route, to = %route, "Navigate");
        self.route = route;
        Ok(&self.route)
    }

    /// Forces the route without authorization, for logout.
    pub fn reset_to(&mut self, route: Route) {
        if self.route.is_sales() && !route.is_sales() {
            self.leave_sales();
        }
        self.route = route;
    }

    fn leave_sales(&mut self) {
        if let Some(sales) = self.sales.take() {
            if !sales.cart().is_empty() {
                info!(
                    lines = sales.cart().item_count(),
                    "Leaving sales view, cart discarded"
                );
            }
        }
        self.searches.invalidate();
    }

    pub fn sales(&self) -> AppResult<&SalesState> {
        self.sales.as_ref().ok_or_else(not_in_sales)
    }

    pub fn sales_mut(&mut self) -> AppResult<&mut SalesState> {
        self.sales.as_mut().ok_or_else(not_in_sales)
    }

    pub fn in_sales(&self) -> bool {
        self.sales.is_some()
    }
}

fn not_in_sales() -> AppError {
    AppError::business("Open the sales view first (go #/ventas)")
}

#[cfg(test)]
mod tests {
    use super::*;
    use farma_core::{Product, Role, UserInfo};

    fn vendedor() -> UserInfo {
        UserInfo {
            id: Some("3".into()),
            name: "Laura".into(),
            email: None,
            role: Role::Vendedor,
        }
    }

    fn product() -> Product {
        Product {
            id: "1".into(),
            name: "Paracetamol".into(),
            generic_name: None,
            therapeutic_action: None,
            brand: None,
            barcode: None,
            price: farma_core::Money::from_cents(350),
            stock: 5.0,
            expires_on: None,
        }
    }

    #[test]
    fn test_entering_sales_starts_empty_cart() {
        let mut state = AppState::new(TerminalConfig::default());
        state.session.set_user(Some(vendedor()));

        state.navigate(Route::Ventas).unwrap();
        assert!(state.sales().unwrap().cart().is_empty());
        assert_eq!(state.sales().unwrap().cart().branch_id(), 1);
    }

    #[test]
    fn test_leaving_sales_clears_cart() {
        let mut state = AppState::new(TerminalConfig::default());
        state.session.set_user(Some(vendedor()));
        state.navigate(Route::Ventas).unwrap();

        let sales = state.sales_mut().unwrap();
        sales.cart_mut().unwrap().add_item(&product(), 2).unwrap();
        let ticket = state.searches.issue();

        state.navigate(Route::Productos).unwrap();
        assert!(state.sales().is_err());
        assert!(!state.searches.is_current(ticket));

        state.navigate(Route::Ventas).unwrap();
        assert!(state.sales().unwrap().cart().is_empty());
    }

    #[test]
    fn test_refused_sales_keeps_route() {
        let mut state = AppState::new(TerminalConfig::default());
        state.navigate(Route::Facturas).unwrap();

        assert!(state.navigate(Route::Ventas).is_err());
        assert_eq!(state.route(), &Route::Facturas);
        assert!(!state.in_sales());
    }

    #[test]
    fn test_cart_locked_while_checkout_open() {
        let mut state = AppState::new(TerminalConfig::default());
        state.session.set_user(Some(vendedor()));
        state.navigate(Route::Ventas).unwrap();

        let sales = state.sales_mut().unwrap();
        sales.cart_mut().unwrap().add_item(&product(), 1).unwrap();
        sales.set_checkout(Some(farma_core::Checkout::new()));

        assert!(sales.cart_mut().is_err());
        sales.set_checkout(None);
        assert!(sales.cart_mut().is_ok());
    }
}
