//! # Backend Client
//!
//! `FarmaClient` speaks the backend's REST API over a reqwest client with a
//! cookie jar, so a successful login carries the session to later calls.
//!
//! ## Endpoints
//! ```text
//! ┌──────────────────────────────────────┬──────────────────────────────────┐
//! │ Call                                 │ Endpoint                         │
//! ├──────────────────────────────────────┼──────────────────────────────────┤
//! │ search_products                      │ POST /api/productos/filtrar      │
//! │   └─ fallback (error or empty)       │ GET  /api/productos + filter     │
//! │ list_products / get_product          │ GET  /api/productos[/{id}]       │
//! │ create / update / delete_product     │ POST|PUT|DELETE /api/productos   │
//! │ list_clients                         │ GET  /api/clientes               │
//! │ find_client_by_document              │ POST /api/clientes/buscar-por-ci │
//! │ search_clients                       │ POST /api/clientes/buscar        │
//! │ create_client                        │ POST /api/clientes               │
//! │ create_invoice                       │ POST /api/facturas               │
//! │ list_invoices                        │ GET  /api/facturas               │
//! │ invoice_detail                       │ GET  /api/facturas/{id}          │
//! │   └─ lines missing                   │ GET  /api/facturas/{id}/detalle  │
//! │ login / logout / session             │ POST|POST|GET /api/login(out)    │
//! │ list_users / get_user                │ GET  /api/usuarios[/{id}]        │
//! │ create / update / delete_user        │ POST|PUT|DELETE /api/usuarios    │
//! │ list_suppliers / create_supplier     │ GET|POST /api/proveedores        │
//! │ list_purchases / create_purchase     │ GET|POST /api/compras            │
//! └──────────────────────────────────────┴──────────────────────────────────┘
//! ```
//!
//! Ids always travel as one percent-encoded path segment.

use std::collections::HashMap;
use std::time::Duration;

use farma_core::normalize;
use farma_core::{
    Client, CreatedInvoice, Credentials, InvoiceDetail, InvoiceDraft, InvoiceSummary, NewClient,
    NewSupplier, Product, ProductDraft, PurchaseDraft, PurchaseSummary, Supplier, UserAccount,
    UserDraft, UserInfo,
};
use reqwest::Method;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::Url;

use crate::backend::PosBackend;
use crate::error::{ApiError, ApiResult};

/// Backend address used when nothing is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Request timeout used when nothing is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Upper bound sent with product searches.
pub const DEFAULT_SEARCH_LIMIT: u32 = 200;

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub search_limit: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

/// Normalises the backend URL:
/// - ensure a scheme (http for local addresses, https otherwise)
/// - strip trailing slashes
/// - strip a trailing `/api` segment, since every path already carries it
pub fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim().to_string();

    if !url.starts_with("http://") && !url.starts_with("https://") {
        let local = url.starts_with("localhost") || url.starts_with("127.0.0.1");
        url = format!("{}://{url}", if local { "http" } else { "https" });
    }

    while url.ends_with('/') {
        url.pop();
    }
    if url.ends_with("/api") {
        url.truncate(url.len() - 4);
    }
    while url.ends_with('/') {
        url.pop();
    }

    url
}

// =============================================================================
// Client
// =============================================================================

/// HTTP client for the pharmacy backend. Cheap to clone; clones share the
/// connection pool and the session cookie.
#[derive(Debug, Clone)]
pub struct FarmaClient {
    http: reqwest::Client,
    base_url: String,
    base: Url,
    search_limit: u32,
}

impl FarmaClient {
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let base_url = normalize_base_url(&config.base_url);
        let base = Url::parse(&base_url)?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url));
        }

        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        debug!(base_url = %base_url, timeout = ?config.timeout, "Backend client ready");
        Ok(FarmaClient {
            http,
            base_url,
            base,
            search_limit: config.search_limit.max(1),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds an endpoint URL from path segments.
    ///
    /// Each segment is percent-encoded on its own, so an id containing `/`,
    /// `?` or `#` stays inside its segment.
    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends one request and returns the JSON body.
    ///
    /// Empty 2xx bodies come back as `Value::Null`. Non-2xx statuses become
    /// [`ApiError::from_status`] with the body's `error` or `message` text.
    async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> ApiResult<Value> {
        let url = self.endpoint(segments)?;
        debug!(method = %method, url = %url, "Backend request");

        let mut req = self.http.request(method.clone(), url.clone());
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(&self.base_url, &e))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ApiError::from_reqwest(&self.base_url, &e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text).ok().and_then(|json| {
                json.get("error")
                    .or_else(|| json.get("message"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            });
            debug!(method = %method, url = %url, status = status.as_u16(), "Backend rejected request");
            return Err(ApiError::from_status(status.as_u16(), message));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn get(&self, segments: &[&str]) -> ApiResult<Value> {
        self.request::<Value>(Method::GET, segments, None).await
    }

    async fn post<B: Serialize + ?Sized>(&self, segments: &[&str], body: &B) -> ApiResult<Value> {
        self.request(Method::POST, segments, Some(body)).await
    }

    /// Fetches the client list and indexes names by id, for labelling
    /// invoices that only carry `id_cliente`.
    async fn client_names(&self) -> HashMap<String, String> {
        match self.list_clients().await {
            Ok(clients) => clients.into_iter().map(|c| (c.id, c.name)).collect(),
            Err(e) => {
                warn!(error = %e, "Could not load clients to label invoices");
                HashMap::new()
            }
        }
    }
}

// =============================================================================
// Backend Operations
// =============================================================================

#[async_trait::async_trait]
impl PosBackend for FarmaClient {
    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    async fn search_products(&self, term: &str) -> ApiResult<Vec<Product>> {
        let term = term.trim();
        let body = json!({ "term": term, "limit": self.search_limit });

        match self.post(&["api", "productos", "filtrar"], &body).await {
            Ok(payload) => {
                let found = normalize::products(&payload);
                if !found.is_empty() {
                    debug!(term = %term, count = found.len(), "Product filter matched");
                    return Ok(found);
                }
                debug!(term = %term, "Product filter returned nothing, listing all");
            }
            Err(e) => warn!(term = %term, error = %e, "Product filter failed, listing all"),
        }

        let mut found = normalize::filter_products(self.list_products().await?, term);
        found.truncate(self.search_limit as usize);
        Ok(found)
    }

    async fn list_products(&self) -> ApiResult<Vec<Product>> {
        Ok(normalize::products(&self.get(&["api", "productos"]).await?))
    }

    async fn get_product(&self, id: &str) -> ApiResult<Product> {
        let payload = self.get(&["api", "productos", id_segment(id)?]).await?;
        normalize::single_product(&payload).ok_or(ApiError::MissingField("producto"))
    }

    async fn create_product(&self, draft: &ProductDraft) -> ApiResult<Product> {
        let payload = self.post(&["api", "productos"], draft).await?;
        info!(code = %draft.codigo, "Product created");
        Ok(normalize::single_product(&payload).unwrap_or_else(|| draft_product(draft)))
    }

    async fn update_product(&self, id: &str, draft: &ProductDraft) -> ApiResult<()> {
        self.request(Method::PUT, &["api", "productos", id_segment(id)?], Some(draft))
            .await?;
        info!(product_id = %id, "Product updated");
        Ok(())
    }

    async fn delete_product(&self, id: &str) -> ApiResult<()> {
        self.request::<Value>(Method::DELETE, &["api", "productos", id_segment(id)?], None)
            .await?;
        info!(product_id = %id, "Product deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Clients
    // -------------------------------------------------------------------------

    async fn list_clients(&self) -> ApiResult<Vec<Client>> {
        Ok(normalize::clients(&self.get(&["api", "clientes"]).await?))
    }

    async fn find_client_by_document(&self, document_number: &str) -> ApiResult<Option<Client>> {
        match self
            .post(&["api", "clientes", "buscar-por-ci"], &json!({ "ci": document_number }))
            .await
        {
            Ok(payload) => Ok(normalize::found_client(&payload)),
            Err(e) if e.is_not_found() => {
                debug!(document_number = %document_number, "No client with this document");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn search_clients(&self, name: &str) -> ApiResult<Vec<Client>> {
        let name = name.trim();
        let payload = self
            .post(&["api", "clientes", "buscar"], &json!({ "nombre": name, "q": name }))
            .await?;
        Ok(normalize::clients(&payload))
    }

    async fn create_client(&self, client: &NewClient) -> ApiResult<Client> {
        let payload = self.post(&["api", "clientes"], client).await?;
        let record = payload.get("cliente").filter(|v| v.is_object()).unwrap_or(&payload);

        let created = match normalize::client_record(record, None) {
            Some(found) => Client {
                document_number: found
                    .document_number
                    .or_else(|| Some(client.document_number.clone())),
                ..found
            },
            None => Client {
                id: normalize::created_id(&payload).ok_or(ApiError::MissingField("id"))?,
                name: client.name.clone(),
                document_number: Some(client.document_number.clone()),
            },
        };
        info!(client_id = %created.id, "Client created");
        Ok(created)
    }

    // -------------------------------------------------------------------------
    // Invoices
    // -------------------------------------------------------------------------

    async fn create_invoice(&self, draft: &InvoiceDraft) -> ApiResult<CreatedInvoice> {
        let payload = self.post(&["api", "facturas"], draft).await?;
        let created = normalize::created_invoice(&payload);
        if created.id.is_none() {
            warn!("Invoice created without an id in the response");
        }
        info!(
            invoice_id = created.id.as_deref().unwrap_or("-"),
            lines = draft.items.len(),
            total = %draft.total,
            "Invoice created"
        );
        Ok(created)
    }

    async fn list_invoices(&self) -> ApiResult<Vec<InvoiceSummary>> {
        let mut invoices = normalize::invoices(&self.get(&["api", "facturas"]).await?);

        if invoices
            .iter()
            .any(|i| i.client_label.is_none() && i.client_id.is_some())
        {
            let names = self.client_names().await;
            for invoice in invoices.iter_mut().filter(|i| i.client_label.is_none()) {
                invoice.client_label = invoice
                    .client_id
                    .as_ref()
                    .and_then(|id| names.get(id))
                    .cloned();
            }
        }
        Ok(invoices)
    }

    async fn invoice_detail(&self, id: &str) -> ApiResult<InvoiceDetail> {
        let id = id_segment(id)?;
        let invoice = self.get(&["api", "facturas", id]).await;
        if let Err(e) = &invoice {
            warn!(invoice_id = %id, error = %e, "Invoice fetch failed, trying detail lines");
        }

        let mut lines = invoice
            .as_ref()
            .map(normalize::invoice_lines)
            .unwrap_or_default();

        if lines.is_empty() {
            match self.get(&["api", "facturas", id, "detalle"]).await {
                Ok(payload) => lines = normalize::invoice_lines(&payload),
                Err(e) => match invoice {
                    Err(first) => return Err(first),
                    Ok(_) => warn!(invoice_id = %id, error = %e, "Detail lines unavailable"),
                },
            }
        }

        let record = invoice.ok();
        let mut detail = normalize::invoice_detail(id, record.as_ref(), lines);
        if let Some(client_id) = &detail.client_id {
            detail.client_name = self.client_names().await.remove(client_id);
        }
        Ok(detail)
    }

    // -------------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------------

    async fn list_users(&self) -> ApiResult<Vec<UserAccount>> {
        Ok(normalize::user_accounts(&self.get(&["api", "usuarios"]).await?))
    }

    async fn get_user(&self, id: &str) -> ApiResult<UserAccount> {
        let payload = self.get(&["api", "usuarios", id_segment(id)?]).await?;
        normalize::single_user(&payload).ok_or(ApiError::MissingField("usuario"))
    }

    async fn create_user(&self, draft: &UserDraft) -> ApiResult<UserAccount> {
        let payload = self.post(&["api", "usuarios"], draft).await?;
        let id = normalize::created_id(&payload).ok_or(ApiError::MissingField("id"))?;
        info!(user_id = %id, role = %draft.role, "User created");
        Ok(UserAccount {
            id,
            name: draft.name.clone(),
            email: draft.email.clone(),
            username: draft.username.clone(),
            role: draft.role.clone(),
        })
    }

    async fn update_user(&self, id: &str, draft: &UserDraft) -> ApiResult<()> {
        let payload = self
            .request(Method::PUT, &["api", "usuarios", id_segment(id)?], Some(draft))
            .await?;
        if normalize::acknowledged(&payload, "updated") {
            info!(user_id = %id, "User updated");
        } else {
            debug!(user_id = %id, "User update changed nothing");
        }
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> ApiResult<()> {
        let payload = self
            .request::<Value>(Method::DELETE, &["api", "usuarios", id_segment(id)?], None)
            .await?;
        if !normalize::acknowledged(&payload, "deleted") {
            return Err(ApiError::NotFound(format!("User {id} was not found")));
        }
        info!(user_id = %id, "User deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Suppliers and Purchases
    // -------------------------------------------------------------------------

    async fn list_suppliers(&self) -> ApiResult<Vec<Supplier>> {
        Ok(normalize::suppliers(&self.get(&["api", "proveedores"]).await?))
    }

    async fn create_supplier(&self, supplier: &NewSupplier) -> ApiResult<Supplier> {
        let payload = self.post(&["api", "proveedores"], supplier).await?;
        let id = normalize::created_id(&payload).ok_or(ApiError::MissingField("id"))?;
        info!(supplier_id = %id, "Supplier created");
        Ok(Supplier {
            id,
            name: supplier.name.clone(),
            contact: supplier.contact.clone(),
            phone: supplier.phone.clone(),
        })
    }

    async fn list_purchases(&self) -> ApiResult<Vec<PurchaseSummary>> {
        let mut purchases = normalize::purchases(&self.get(&["api", "compras"]).await?);

        if purchases
            .iter()
            .any(|p| p.supplier_name.is_none() && p.supplier_id.is_some())
        {
            let names: HashMap<String, String> = match self.list_suppliers().await {
                Ok(suppliers) => suppliers.into_iter().map(|s| (s.id, s.name)).collect(),
                Err(e) => {
                    warn!(error = %e, "Could not load suppliers to label purchases");
                    HashMap::new()
                }
            };
            for purchase in purchases.iter_mut().filter(|p| p.supplier_name.is_none()) {
                purchase.supplier_name = purchase
                    .supplier_id
                    .as_ref()
                    .and_then(|id| names.get(id))
                    .cloned();
            }
        }
        Ok(purchases)
    }

    async fn create_purchase(&self, draft: &PurchaseDraft) -> ApiResult<String> {
        let payload = self.post(&["api", "compras"], draft).await?;
        let id = normalize::created_id(&payload).ok_or(ApiError::MissingField("id"))?;
        info!(
            purchase_id = %id,
            lines = draft.items.len(),
            units = draft.total_quantity(),
            total = %draft.total,
            "Purchase registered"
        );
        Ok(id)
    }

    // -------------------------------------------------------------------------
    // Session
    // -------------------------------------------------------------------------

    async fn login(&self, credentials: &Credentials) -> ApiResult<UserInfo> {
        let payload = self.post(&["api", "login"], credentials).await?;
        let user = normalize::session_user(&payload).ok_or(ApiError::MissingField("user"))?;
        info!(user = %user.name, role = %user.role, "Logged in");
        Ok(user)
    }

    async fn logout(&self) -> ApiResult<()> {
        self.post(&["api", "logout"], &json!({})).await?;
        info!("Logged out");
        Ok(())
    }

    async fn session(&self) -> ApiResult<Option<UserInfo>> {
        Ok(normalize::session_user(&self.get(&["api", "login"]).await?))
    }
}

/// Checks an operator-typed id before it becomes a path segment.
///
/// Empty, `.` and `..` would not name a record; the URL writer drops dot
/// segments instead of encoding them.
fn id_segment(id: &str) -> ApiResult<&str> {
    let id = id.trim();
    match id {
        "" | "." | ".." => Err(ApiError::InvalidId(id.to_string())),
        _ => Ok(id),
    }
}

/// What the terminal shows for a product the backend created without
/// echoing the record back.
fn draft_product(draft: &ProductDraft) -> Product {
    Product {
        id: draft.codigo.clone(),
        name: draft.name.clone(),
        generic_name: draft.generic_name.clone(),
        therapeutic_action: draft.therapeutic_action.clone(),
        brand: None,
        barcode: draft.barcode.clone(),
        price: draft.price,
        stock: draft.stock.unwrap_or(0.0),
        expires_on: None,
    }
}
