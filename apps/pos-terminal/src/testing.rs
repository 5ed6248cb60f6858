//! In-memory [`PosBackend`] for command and scenario tests.

use std::sync::Mutex;

use async_trait::async_trait;
use farma_api::{ApiError, ApiResult, PosBackend};
use farma_core::normalize::filter_products;
use farma_core::{
    Client, CreatedInvoice, Credentials, InvoiceDetail, InvoiceDraft, InvoiceLine, InvoiceSummary,
    Money, NewClient, NewSupplier, Product, ProductDraft, PurchaseDraft, PurchaseSummary, Role,
    Supplier, UserAccount, UserDraft, UserInfo,
};

use crate::receipts::ReceiptExporter;

pub const PASSWORD: &str = "secreto";

pub fn product(id: &str, name: &str, price_cents: i64, stock: f64) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        generic_name: None,
        therapeutic_action: None,
        brand: None,
        barcode: None,
        price: Money::from_cents(price_cents),
        stock,
        expires_on: None,
    }
}

/// Paracetamol (10 in stock), Amoxicilina (2), Ibuprofeno (sold out).
pub fn sample_products() -> Vec<Product> {
    vec![
        product("1", "Paracetamol 500mg", 350, 10.0),
        product("2", "Amoxicilina 500mg", 1200, 2.0),
        product("3", "Ibuprofeno 400mg", 500, 0.0),
    ]
}

pub fn user(name: &str, role: Role) -> UserInfo {
    UserInfo {
        id: Some("3".into()),
        name: name.to_string(),
        email: None,
        role,
    }
}

pub fn vendedor() -> UserInfo {
    user("Laura", Role::Vendedor)
}

/// Exporter writing to a fresh temp directory, returned for cleanup.
pub fn temp_exporter() -> (ReceiptExporter, std::path::PathBuf) {
    let dir = std::env::temp_dir().join(format!("farma-pos-{}", uuid::Uuid::new_v4()));
    (ReceiptExporter::new(&dir, "Farmacia Central", false), dir)
}

#[derive(Debug)]
struct FakeData {
    products: Vec<Product>,
    clients: Vec<Client>,
    invoices: Vec<InvoiceSummary>,
    submitted: Vec<InvoiceDraft>,
    refuse_next: Option<ApiError>,
    user: Option<UserInfo>,
    accounts: Vec<UserAccount>,
    suppliers: Vec<Supplier>,
    purchases: Vec<PurchaseSummary>,
    purchase_drafts: Vec<PurchaseDraft>,
    next_id: u64,
}

#[derive(Debug)]
pub struct FakeBackend {
    data: Mutex<FakeData>,
}

impl FakeBackend {
    pub fn new() -> Self {
        let client = |id: &str, name: &str, ci: &str| Client {
            id: id.to_string(),
            name: name.to_string(),
            document_number: Some(ci.to_string()),
        };
        let invoice = |id: &str, issued_at: &str, total: i64| InvoiceSummary {
            id: id.to_string(),
            display_id: format!("F-{id}"),
            client_label: Some("Ana Pérez".into()),
            client_id: Some("5".into()),
            total: Some(Money::from_cents(total)),
            issued_at: Some(issued_at.to_string()),
        };

        FakeBackend {
            data: Mutex::new(FakeData {
                products: sample_products(),
                clients: vec![
                    client("5", "Ana Pérez", "1234567"),
                    client("6", "Carlos Vaca", "2345678"),
                ],
                invoices: vec![
                    invoice("1", "2026-10-15 10:00:00", 700),
                    invoice("2", "2026-10-16 09:00:00", 1200),
                ],
                submitted: Vec::new(),
                refuse_next: None,
                user: None,
                accounts: vec![
                    account("u1", "Admin", Role::Admin),
                    account("u2", "Laura", Role::Vendedor),
                ],
                suppliers: vec![Supplier {
                    id: "p1".into(),
                    name: "Droguería Inti".into(),
                    contact: Some("Luis".into()),
                    phone: None,
                }],
                purchases: vec![PurchaseSummary {
                    id: "c1".into(),
                    supplier_id: Some("p1".into()),
                    supplier_name: Some("Droguería Inti".into()),
                    item_count: 1,
                    total: Some(Money::from_cents(2000)),
                    issued_at: Some("2026-10-01".into()),
                }],
                purchase_drafts: Vec::new(),
                next_id: 100,
            }),
        }
    }

    pub fn set_stock(&self, id: &str, stock: f64) {
        let mut data = self.data.lock().unwrap();
        if let Some(p) = data.products.iter_mut().find(|p| p.id == id) {
            p.stock = stock;
        }
    }

    pub fn refuse_next_invoice(&self, err: ApiError) {
        self.data.lock().unwrap().refuse_next = Some(err);
    }

    pub fn submitted_invoices(&self) -> Vec<InvoiceDraft> {
        self.data.lock().unwrap().submitted.clone()
    }

    /// Sets the backend-side session without going through `login`.
    pub fn login_as(&self, user: UserInfo) {
        self.data.lock().unwrap().user = Some(user);
    }

    pub fn registered_purchases(&self) -> Vec<PurchaseDraft> {
        self.data.lock().unwrap().purchase_drafts.clone()
    }

    fn next_id(data: &mut FakeData) -> String {
        data.next_id += 1;
        data.next_id.to_string()
    }

    /// The backend answers user management to admins only.
    fn require_admin(data: &FakeData) -> ApiResult<()> {
        match &data.user {
            Some(u) if u.role == Role::Admin => Ok(()),
            Some(_) => Err(ApiError::Http {
                status: 403,
                message: "Operación permitida sólo para administradores".into(),
            }),
            None => Err(ApiError::Http {
                status: 401,
                message: "No autenticado".into(),
            }),
        }
    }
}

fn account(id: &str, name: &str, role: Role) -> UserAccount {
    UserAccount {
        id: id.to_string(),
        name: name.to_string(),
        email: None,
        username: Some(name.to_lowercase()),
        role,
    }
}

fn apply_draft(product: &mut Product, draft: &ProductDraft) {
    product.name = draft.name.clone();
    product.price = draft.price;
    product.generic_name = draft.generic_name.clone();
    product.therapeutic_action = draft.therapeutic_action.clone();
    product.barcode = draft.barcode.clone();
    if let Some(stock) = draft.stock {
        product.stock = stock;
    }
}

#[async_trait]
impl PosBackend for FakeBackend {
    async fn search_products(&self, term: &str) -> ApiResult<Vec<Product>> {
        let products = self.data.lock().unwrap().products.clone();
        Ok(filter_products(products, term))
    }

    async fn list_products(&self) -> ApiResult<Vec<Product>> {
        Ok(self.data.lock().unwrap().products.clone())
    }

    async fn get_product(&self, id: &str) -> ApiResult<Product> {
        self.data
            .lock()
            .unwrap()
            .products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound("Producto no encontrado".into()))
    }

    async fn create_product(&self, draft: &ProductDraft) -> ApiResult<Product> {
        let mut data = self.data.lock().unwrap();
        let mut product = product(&FakeBackend::next_id(&mut data), "", 0, 0.0);
        apply_draft(&mut product, draft);
        data.products.push(product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: &str, draft: &ProductDraft) -> ApiResult<()> {
        let mut data = self.data.lock().unwrap();
        let product = data
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ApiError::NotFound("Producto no encontrado".into()))?;
        apply_draft(product, draft);
        Ok(())
    }

    async fn delete_product(&self, id: &str) -> ApiResult<()> {
        let mut data = self.data.lock().unwrap();
        let before = data.products.len();
        data.products.retain(|p| p.id != id);
        if data.products.len() == before {
            return Err(ApiError::NotFound("Producto no encontrado".into()));
        }
        Ok(())
    }

    async fn list_clients(&self) -> ApiResult<Vec<Client>> {
        Ok(self.data.lock().unwrap().clients.clone())
    }

    async fn find_client_by_document(&self, document_number: &str) -> ApiResult<Option<Client>> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .clients
            .iter()
            .find(|c| c.document_number.as_deref() == Some(document_number))
            .cloned())
    }

    async fn search_clients(&self, name: &str) -> ApiResult<Vec<Client>> {
        let needle = name.to_lowercase();
        Ok(self
            .data
            .lock()
            .unwrap()
            .clients
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn create_client(&self, client: &NewClient) -> ApiResult<Client> {
        let mut data = self.data.lock().unwrap();
        if data
            .clients
            .iter()
            .any(|c| c.document_number.as_deref() == Some(client.document_number.as_str()))
        {
            return Err(ApiError::Http {
                status: 409,
                message: format!("Ya existe un cliente con CI {}", client.document_number),
            });
        }
        let created = Client {
            id: FakeBackend::next_id(&mut data),
            name: client.name.clone(),
            document_number: Some(client.document_number.clone()),
        };
        data.clients.push(created.clone());
        Ok(created)
    }

    async fn create_invoice(&self, draft: &InvoiceDraft) -> ApiResult<CreatedInvoice> {
        let mut data = self.data.lock().unwrap();
        if let Some(err) = data.refuse_next.take() {
            return Err(err);
        }
        let id = FakeBackend::next_id(&mut data);
        data.submitted.push(draft.clone());
        Ok(CreatedInvoice {
            id: Some(id.clone()),
            display_id: Some(format!("F-{id}")),
            issued_at: Some("2026-10-16 11:45:00".into()),
            ..Default::default()
        })
    }

    async fn list_invoices(&self) -> ApiResult<Vec<InvoiceSummary>> {
        Ok(self.data.lock().unwrap().invoices.clone())
    }

    async fn invoice_detail(&self, id: &str) -> ApiResult<InvoiceDetail> {
        let data = self.data.lock().unwrap();
        let summary = data
            .invoices
            .iter()
            .find(|i| i.id == id)
            .ok_or_else(|| ApiError::NotFound("Factura no encontrada".into()))?;
        Ok(InvoiceDetail {
            id: summary.id.clone(),
            issued_at: summary.issued_at.clone(),
            seller: Some("Laura".into()),
            client_id: summary.client_id.clone(),
            client_name: summary.client_label.clone(),
            lines: vec![InvoiceLine {
                product_name: "Paracetamol 500mg".into(),
                quantity: 2,
                unit_price: Some(Money::from_cents(350)),
                subtotal: Money::from_cents(700),
            }],
            tendered: None,
            change: None,
            note: None,
        })
    }

    async fn list_users(&self) -> ApiResult<Vec<UserAccount>> {
        let data = self.data.lock().unwrap();
        FakeBackend::require_admin(&data)?;
        Ok(data.accounts.clone())
    }

    async fn get_user(&self, id: &str) -> ApiResult<UserAccount> {
        let data = self.data.lock().unwrap();
        FakeBackend::require_admin(&data)?;
        data.accounts
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound("not_found".into()))
    }

    async fn create_user(&self, draft: &UserDraft) -> ApiResult<UserAccount> {
        let mut data = self.data.lock().unwrap();
        FakeBackend::require_admin(&data)?;
        let created = UserAccount {
            id: FakeBackend::next_id(&mut data),
            name: draft.name.clone(),
            email: draft.email.clone(),
            username: draft.username.clone(),
            role: draft.role.clone(),
        };
        data.accounts.push(created.clone());
        Ok(created)
    }

    async fn update_user(&self, id: &str, draft: &UserDraft) -> ApiResult<()> {
        let mut data = self.data.lock().unwrap();
        FakeBackend::require_admin(&data)?;
        let account = data
            .accounts
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| ApiError::NotFound("not_found".into()))?;
        account.name = draft.name.clone();
        account.email = draft.email.clone();
        account.username = draft.username.clone();
        account.role = draft.role.clone();
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> ApiResult<()> {
        let mut data = self.data.lock().unwrap();
        FakeBackend::require_admin(&data)?;
        let before = data.accounts.len();
        data.accounts.retain(|u| u.id != id);
        if data.accounts.len() == before {
            return Err(ApiError::NotFound(format!("User {id} was not found")));
        }
        Ok(())
    }

    async fn list_suppliers(&self) -> ApiResult<Vec<Supplier>> {
        Ok(self.data.lock().unwrap().suppliers.clone())
    }

    async fn create_supplier(&self, supplier: &NewSupplier) -> ApiResult<Supplier> {
        let mut data = self.data.lock().unwrap();
        let created = Supplier {
            id: FakeBackend::next_id(&mut data),
            name: supplier.name.clone(),
            contact: supplier.contact.clone(),
            phone: supplier.phone.clone(),
        };
        data.suppliers.push(created.clone());
        Ok(created)
    }

    async fn list_purchases(&self) -> ApiResult<Vec<PurchaseSummary>> {
        Ok(self.data.lock().unwrap().purchases.clone())
    }

    async fn create_purchase(&self, draft: &PurchaseDraft) -> ApiResult<String> {
        let mut data = self.data.lock().unwrap();
        let id = FakeBackend::next_id(&mut data);
        for item in &draft.items {
            if let Some(p) = data.products.iter_mut().find(|p| p.id == item.product_id) {
                p.stock += item.quantity as f64;
            }
        }
        let supplier_name = draft
            .proveedor_id
            .as_ref()
            .and_then(|sid| data.suppliers.iter().find(|s| &s.id == sid))
            .map(|s| s.name.clone());
        data.purchases.push(PurchaseSummary {
            id: id.clone(),
            supplier_id: draft.proveedor_id.clone(),
            supplier_name,
            item_count: draft.items.len(),
            total: Some(draft.total),
            issued_at: Some("2026-10-16".into()),
        });
        data.purchase_drafts.push(draft.clone());
        Ok(id)
    }

    async fn login(&self, credentials: &Credentials) -> ApiResult<UserInfo> {
        if credentials.password != PASSWORD {
            return Err(ApiError::Http {
                status: 401,
                message: "Credenciales inválidas".into(),
            });
        }
        let logged_in = match credentials.username.as_str() {
            "laura" => vendedor(),
            "admin" => user("Admin", Role::Admin),
            _ => {
                return Err(ApiError::Http {
                    status: 401,
                    message: "Credenciales inválidas".into(),
                })
            }
        };
        self.data.lock().unwrap().user = Some(logged_in.clone());
        Ok(logged_in)
    }

    async fn logout(&self) -> ApiResult<()> {
        self.data.lock().unwrap().user = None;
        Ok(())
    }

    async fn session(&self) -> ApiResult<Option<UserInfo>> {
        Ok(self.data.lock().unwrap().user.clone())
    }
}
