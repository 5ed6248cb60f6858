//! # Backend Seam
//!
//! The operations the terminal needs from the backend, as a trait so the
//! checkout flow can run against an in-memory fake in tests.

use async_trait::async_trait;
use farma_core::{
    Client, CreatedInvoice, Credentials, InvoiceDetail, InvoiceDraft, InvoiceSummary, NewClient,
    NewSupplier, Product, ProductDraft, PurchaseDraft, PurchaseSummary, Supplier, UserAccount,
    UserDraft, UserInfo,
};

use crate::error::ApiResult;

#[async_trait]
pub trait PosBackend: Send + Sync {
    // =========================================================================
    // Products
    // =========================================================================

    /// Products matching `term`. An empty term lists everything.
    async fn search_products(&self, term: &str) -> ApiResult<Vec<Product>>;

    async fn list_products(&self) -> ApiResult<Vec<Product>>;

    /// One product by id. A missing product is [`ApiError::NotFound`].
    ///
    /// [`ApiError::NotFound`]: crate::ApiError::NotFound
    async fn get_product(&self, id: &str) -> ApiResult<Product>;

    async fn create_product(&self, draft: &ProductDraft) -> ApiResult<Product>;

    async fn update_product(&self, id: &str, draft: &ProductDraft) -> ApiResult<()>;

    async fn delete_product(&self, id: &str) -> ApiResult<()>;

    // =========================================================================
    // Clients
    // =========================================================================

    async fn list_clients(&self) -> ApiResult<Vec<Client>>;

    /// Exact lookup by CI. `Ok(None)` when no client has it.
    async fn find_client_by_document(&self, document_number: &str) -> ApiResult<Option<Client>>;

    async fn search_clients(&self, name: &str) -> ApiResult<Vec<Client>>;

    async fn create_client(&self, client: &NewClient) -> ApiResult<Client>;

    // =========================================================================
    // Invoices
    // =========================================================================

    async fn create_invoice(&self, draft: &InvoiceDraft) -> ApiResult<CreatedInvoice>;

    async fn list_invoices(&self) -> ApiResult<Vec<InvoiceSummary>>;

    async fn invoice_detail(&self, id: &str) -> ApiResult<InvoiceDetail>;

    // =========================================================================
    // Users (admin only on the backend)
    // =========================================================================

    async fn list_users(&self) -> ApiResult<Vec<UserAccount>>;

    async fn get_user(&self, id: &str) -> ApiResult<UserAccount>;

    async fn create_user(&self, draft: &UserDraft) -> ApiResult<UserAccount>;

    async fn update_user(&self, id: &str, draft: &UserDraft) -> ApiResult<()>;

    /// A backend answer of `{ "deleted": false }` is [`ApiError::NotFound`].
    ///
    /// [`ApiError::NotFound`]: crate::ApiError::NotFound
    async fn delete_user(&self, id: &str) -> ApiResult<()>;

    // =========================================================================
    // Suppliers and Purchases
    // =========================================================================

    async fn list_suppliers(&self) -> ApiResult<Vec<Supplier>>;

    async fn create_supplier(&self, supplier: &NewSupplier) -> ApiResult<Supplier>;

    /// Purchase history, supplier names filled in where only the id came back.
    async fn list_purchases(&self) -> ApiResult<Vec<PurchaseSummary>>;

    /// Registers a purchase; the backend adds each line's quantity to stock.
    /// Returns the new purchase id.
    async fn create_purchase(&self, draft: &PurchaseDraft) -> ApiResult<String>;

    // =========================================================================
    // Session
    // =========================================================================

    async fn login(&self, credentials: &Credentials) -> ApiResult<UserInfo>;

    async fn logout(&self) -> ApiResult<()>;

    /// The logged-in user, or `None` when the session is anonymous.
    async fn session(&self) -> ApiResult<Option<UserInfo>>;
}
