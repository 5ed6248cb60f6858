//! # Product Commands
//!
//! Product search for the sales view and product CRUD for the back office.
//!
//! ## Search Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  search "amox"                                                          │
//! │      │                                                                  │
//! │      ├── ticket #4 issued (every older ticket is now stale)            │
//! │      ├── tokio::spawn ──► backend.search_products("amox")              │
//! │      │                          │                                      │
//! │      │  prompt returns at once  │                                      │
//! │      ▼                          ▼                                      │
//! │  operator keeps typing     SearchOutcome { ticket #4, result }         │
//! │                                 │  (mpsc channel)                      │
//! │                                 ▼                                      │
//! │                        apply_search: current? ──► results shown        │
//! │                                      stale?   ──► dropped              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use farma_api::{ApiResult, PosBackend};
use farma_core::validation::validate_search_term;
use farma_core::{Product, ProductDraft};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::error::{AppError, AppResult, ErrorCode};
use crate::state::{AppState, SearchTicket};

/// A finished background search.
#[derive(Debug)]
pub struct SearchOutcome {
    pub ticket: SearchTicket,
    pub term: String,
    pub result: ApiResult<Vec<Product>>,
}

// =============================================================================
// Sales View Search
// =============================================================================

/// Validates the term and issues the ticket for a new search.
pub fn begin_search(state: &AppState, raw: &str) -> AppResult<(SearchTicket, String)> {
    state.sales()?;
    let term = validate_search_term(raw)?;
    let ticket = state.searches.issue();
    debug!(ticket = ticket.generation(), term = %term, "Search issued");
    Ok((ticket, term))
}

/// Runs the search off the operator loop and posts the outcome back.
pub fn spawn_search(
    backend: Arc<dyn PosBackend>,
    ticket: SearchTicket,
    term: String,
    outcomes: UnboundedSender<SearchOutcome>,
) {
    tokio::spawn(async move {
        let result = backend.search_products(&term).await;
        // The receiver is gone only when the terminal is shutting down.
        let _ = outcomes.send(SearchOutcome {
            ticket,
            term,
            result,
        });
    });
}

/// Applies a finished search if it is still the newest one.
///
/// ## Returns
/// `None` for a stale outcome, which is dropped without touching state
pub fn apply_search(state: &mut AppState, outcome: SearchOutcome) -> Option<AppResult<&[Product]>> {
    if !state.searches.is_current(outcome.ticket) {
        debug!(
            ticket = outcome.ticket.generation(),
            term = %outcome.term,
            "Stale search result dropped"
        );
        return None;
    }

    let sales = match state.sales_mut() {
        Ok(sales) => sales,
        Err(e) => return Some(Err(e)),
    };
    match outcome.result {
        Ok(products) => {
            debug!(term = %outcome.term, count = products.len(), "Search results");
            sales.set_results(products);
            Some(Ok(sales.results()))
        }
        Err(e) => Some(Err(AppError::from(e))),
    }
}

// =============================================================================
// Back Office
// =============================================================================

/// Lists products, filtered by `term` when one is given.
pub async fn list_products(backend: &dyn PosBackend, term: &str) -> AppResult<Vec<Product>> {
    let term = validate_search_term(term)?;
    let products = if term.is_empty() {
        backend.list_products().await?
    } else {
        backend.search_products(&term).await?
    };
    Ok(products)
}

/// Loads one product.
///
/// A missing product suggests creating it under that code.
pub async fn get_product(backend: &dyn PosBackend, id: &str) -> AppResult<Product> {
    backend.get_product(id).await.map_err(|e| {
        let err = AppError::from(e);
        if err.code == ErrorCode::NotFound {
            AppError::not_found(format!(
                "{}. Create it with: pnew {};<name>;<price>",
                err.message, id
            ))
        } else {
            err
        }
    })
}

pub async fn create_product(backend: &dyn PosBackend, draft: &ProductDraft) -> AppResult<Product> {
    let product = backend.create_product(draft).await?;
    info!(id = %product.id, code = %draft.codigo, "Product created");
    Ok(product)
}

/// Saves the edit and reloads the product as the backend now has it.
pub async fn update_product(
    backend: &dyn PosBackend,
    id: &str,
    draft: &ProductDraft,
) -> AppResult<Product> {
    backend.update_product(id, draft).await?;
    info!(id = %id, "Product updated");
    get_product(backend, id).await
}

pub async fn delete_product(backend: &dyn PosBackend, id: &str) -> AppResult<()> {
    backend.delete_product(id).await?;
    info!(id = %id, "Product deleted");
    Ok(())
}
