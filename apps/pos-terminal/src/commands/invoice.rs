//! # Invoice Commands
//!
//! Invoice history and the detail of one invoice.

use farma_api::PosBackend;
use farma_core::{InvoiceDetail, InvoiceSummary};
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Invoice history, newest first.
pub async fn list_invoices(backend: &dyn PosBackend) -> AppResult<Vec<InvoiceSummary>> {
    let mut invoices = backend.list_invoices().await?;
    invoices.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));
    debug!(count = invoices.len(), "Invoices loaded");
    Ok(invoices)
}

pub async fn invoice_detail(backend: &dyn PosBackend, id: &str) -> AppResult<InvoiceDetail> {
    let id = id.trim().trim_start_matches('#');
    if id.is_empty() {
        return Err(AppError::validation("Invoice id is required"));
    }
    Ok(backend.invoice_detail(id).await?)
}
