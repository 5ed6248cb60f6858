//! # Domain Types
//!
//! Normalized shapes of everything the backend hands us. Raw payloads are
//! turned into these by [`crate::normalize`]; nothing downstream touches
//! `serde_json::Value` again.
//!
//! ## Entity Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Product ──(add to cart)──► cart::LineItem ──► checkout::InvoiceDraft   │
//! │                                                        │                │
//! │  Client ◄──(lookup by CI / create)─────────────────────┤                │
//! │                                                        ▼                │
//! │                                   POST /api/facturas ──► CreatedInvoice │
//! │                                                        │                │
//! │                                                        ▼                │
//! │                                               receipt::Receipt          │
//! │                                                                         │
//! │  InvoiceSummary / InvoiceDetail: read-only invoice history views        │
//! │  UserInfo + Role: who is logged in and which views they may open        │
//! │  UserAccount / UserDraft: back-office user management (admin)           │
//! │  Supplier ──► PurchaseDraft ──► POST /api/compras (stock goes up)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::role::Role;
use crate::validation::ValidationResult;

// =============================================================================
// Products
// =============================================================================

/// A product as the sales view sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Backend id (numeric for SQL backends, ObjectId hex for Mongo)
    pub id: String,

    /// Commercial name (`Nombre_comercial`)
    pub name: String,

    pub generic_name: Option<String>,
    pub therapeutic_action: Option<String>,
    pub brand: Option<String>,
    pub barcode: Option<String>,

    /// Sale price
    pub price: Money,

    /// Units on hand. Decimal because the backend stores it that way;
    /// only whole units can be sold.
    pub stock: f64,

    /// Expiry date as the backend formats it
    pub expires_on: Option<String>,
}

impl Product {
    /// Highest whole quantity that can be sold right now.
    pub fn stock_ceiling(&self) -> i64 {
        stock_ceiling(self.stock)
    }

    /// True when not even one unit can be sold.
    pub fn is_out_of_stock(&self) -> bool {
        self.stock_ceiling() < 1
    }
}

/// Floors a decimal stock level into a sellable whole quantity.
pub fn stock_ceiling(stock: f64) -> i64 {
    if !stock.is_finite() || stock <= 0.0 {
        0
    } else {
        stock.floor() as i64
    }
}

/// Fields an operator fills in when creating or editing a product.
///
/// Serialized with the backend's column names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub codigo: String,

    #[serde(rename = "Nombre_comercial")]
    pub name: String,

    #[serde(rename = "Nombre_generico", skip_serializing_if = "Option::is_none")]
    pub generic_name: Option<String>,

    #[serde(rename = "Accion_terapeutica", skip_serializing_if = "Option::is_none")]
    pub therapeutic_action: Option<String>,

    #[serde(rename = "Cod_barrras", skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,

    #[serde(rename = "Precio_venta", with = "crate::money::decimal")]
    pub price: Money,

    #[serde(rename = "existencia", skip_serializing_if = "Option::is_none")]
    pub stock: Option<f64>,
}

impl ProductDraft {
    /// Starts a draft prefilled with a product code, as offered when a
    /// lookup by code comes back 404.
    pub fn with_code(code: impl Into<String>) -> Self {
        ProductDraft {
            codigo: code.into(),
            ..Default::default()
        }
    }
}

// =============================================================================
// Clients
// =============================================================================

/// A client (customer) the invoice is issued to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Client {
    pub id: String,
    pub name: String,
    /// National identity document (CI), digits only
    pub document_number: Option<String>,
}

impl Client {
    /// Label used on receipts: `"Name (CI)"` or just the name.
    pub fn label(&self) -> String {
        match &self.document_number {
            Some(ci) if !ci.is_empty() => format!("{} ({})", self.name, ci),
            _ => self.name.clone(),
        }
    }
}

/// Body of `POST /api/clientes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClient {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "ci")]
    pub document_number: String,
}

// =============================================================================
// Payments
// =============================================================================

/// How the client pays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentMethod {
    /// Efectivo: free tendered amount, change handed back
    #[default]
    Cash,
    /// Tarjeta: tendered is always the exact total
    Card,
}

impl PaymentMethod {
    /// Operator-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Efectivo",
            PaymentMethod::Card => "Tarjeta",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" | "efectivo" => Ok(PaymentMethod::Cash),
            "card" | "tarjeta" => Ok(PaymentMethod::Card),
            other => Err(format!("Unknown payment method: {other}")),
        }
    }
}

// =============================================================================
// Invoices
// =============================================================================

/// What `POST /api/facturas` answers with.
///
/// The backend only guarantees `id`; the rest is optional and fills the
/// receipt when present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreatedInvoice {
    pub id: Option<String>,
    /// First of `numero | seq | short_id | display_id | id | _id`
    pub display_id: Option<String>,
    pub issued_at: Option<String>,
    pub seller_name: Option<String>,
    pub total: Option<Money>,
    pub tendered: Option<Money>,
    pub change: Option<Money>,
    pub note: Option<String>,
    /// `mensaje` from the backend
    pub message: Option<String>,
}

/// One row of the invoice history list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceSummary {
    pub id: String,
    pub display_id: String,
    pub client_label: Option<String>,
    pub client_id: Option<String>,
    pub total: Option<Money>,
    pub issued_at: Option<String>,
}

/// A detail line of a stored invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceLine {
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Option<Money>,
    pub subtotal: Money,
}

/// Full view of a stored invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceDetail {
    pub id: String,
    pub issued_at: Option<String>,
    pub seller: Option<String>,
    pub client_id: Option<String>,
    pub client_name: Option<String>,
    pub lines: Vec<InvoiceLine>,
    pub tendered: Option<Money>,
    pub change: Option<Money>,
    pub note: Option<String>,
}

impl InvoiceDetail {
    /// Total recomputed from the lines, the way the detail view shows it.
    pub fn total(&self) -> Money {
        self.lines.iter().map(|l| l.subtotal).sum()
    }
}

// =============================================================================
// Session
// =============================================================================

/// The logged-in user, as reported by `GET /api/login`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub id: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub role: Role,
}

/// Body of `POST /api/login`.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    /// Username or email; the backend accepts either under `username`
    pub username: String,
    pub password: String,
    pub remember: bool,
}

// =============================================================================
// User Accounts
// =============================================================================

/// A row of the user management list (`GET /api/usuarios`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub username: Option<String>,
    pub role: Role,
}

/// Body of `POST /api/usuarios` and `PUT /api/usuarios/{id}`.
///
/// `password` is left out of an edit that keeps the current one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDraft {
    #[serde(rename = "nombre")]
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(rename = "rol", serialize_with = "role_name::serialize")]
    pub role: Role,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

mod role_name {
    use serde::Serializer;

    use crate::role::Role;

    pub fn serialize<S>(role: &Role, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(role.name())
    }
}

// =============================================================================
// Suppliers and Purchases
// =============================================================================

/// A supplier (proveedor) purchases are registered against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub contact: Option<String>,
    pub phone: Option<String>,
}

/// Body of `POST /api/proveedores`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSupplier {
    #[serde(rename = "nombre")]
    pub name: String,

    #[serde(rename = "contacto", skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,

    #[serde(rename = "telefono", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// One row of the purchase history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PurchaseSummary {
    pub id: String,
    pub supplier_id: Option<String>,
    /// Filled in from the supplier list when the record only has the id
    pub supplier_name: Option<String>,
    pub item_count: usize,
    pub total: Option<Money>,
    pub issued_at: Option<String>,
}

/// A product line of a purchase. Stock of the product goes up by
/// `quantity` once the backend records it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseItem {
    #[serde(rename = "id_producto", serialize_with = "wire_id::serialize")]
    pub product_id: String,

    #[serde(rename = "cantidad")]
    pub quantity: i64,

    #[serde(rename = "precio_unitario", with = "crate::money::decimal")]
    pub unit_cost: Money,
}

impl PurchaseItem {
    pub fn subtotal(&self) -> Money {
        self.unit_cost.multiply_quantity(self.quantity)
    }
}

/// Body of `POST /api/compras`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proveedor_id: Option<String>,

    pub items: Vec<PurchaseItem>,

    #[serde(with = "crate::money::decimal")]
    pub total: Money,
}

impl PurchaseDraft {
    /// Builds a purchase. Without an explicit `total` the sum of the line
    /// costs is used.
    pub fn new(
        supplier_id: Option<String>,
        items: Vec<PurchaseItem>,
        total: Option<Money>,
    ) -> ValidationResult<Self> {
        if items.is_empty() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            });
        }
        for item in &items {
            if item.quantity < 1 {
                return Err(ValidationError::OutOfRange {
                    field: format!("quantity of {}", item.product_id),
                    min: 1,
                    max: i64::MAX,
                });
            }
            if item.unit_cost.is_negative() {
                return Err(ValidationError::Negative {
                    field: format!("cost of {}", item.product_id),
                });
            }
        }
        if total.is_some_and(|t| t.is_negative()) {
            return Err(ValidationError::Negative {
                field: "total".to_string(),
            });
        }

        let total = total.unwrap_or_else(|| items.iter().map(PurchaseItem::subtotal).sum());
        Ok(PurchaseDraft {
            proveedor_id: supplier_id.filter(|id| !id.trim().is_empty()),
            items,
            total,
        })
    }

    /// Units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items
            .iter()
            .fold(0i64, |acc, i| acc.saturating_add(i.quantity))
    }
}

// =============================================================================
// Wire Ids
// =============================================================================

/// Serializes a backend id the way it came in: a JSON number when the id
/// is a plain integer, a string otherwise.
///
/// SQL-backed deployments key rows by integer and reject string ids.
pub mod wire_id {
    use serde::Serializer;

    pub fn serialize<S>(id: &str, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let numeric = !id.is_empty() && id.len() <= 18 && id.bytes().all(|b| b.is_ascii_digit());
        match id.parse::<i64>() {
            Ok(n) if numeric => serializer.serialize_i64(n),
            _ => serializer.serialize_str(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: f64) -> Product {
        Product {
            id: "1".into(),
            name: "Paracetamol".into(),
            generic_name: None,
            therapeutic_action: None,
            brand: None,
            barcode: None,
            price: Money::from_cents(350),
            stock,
            expires_on: None,
        }
    }

    #[test]
    fn test_stock_ceiling_floors_decimals() {
        assert_eq!(product(4.9).stock_ceiling(), 4);
        assert_eq!(product(0.5).stock_ceiling(), 0);
        assert_eq!(product(-3.0).stock_ceiling(), 0);
        assert!(product(0.5).is_out_of_stock());
        assert!(!product(1.0).is_out_of_stock());
    }

    #[test]
    fn test_client_label() {
        let mut client = Client {
            id: "9".into(),
            name: "Ana Pérez".into(),
            document_number: Some("1234567".into()),
        };
        assert_eq!(client.label(), "Ana Pérez (1234567)");
        client.document_number = None;
        assert_eq!(client.label(), "Ana Pérez");
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!("efectivo".parse::<PaymentMethod>(), Ok(PaymentMethod::Cash));
        assert_eq!("Tarjeta".parse::<PaymentMethod>(), Ok(PaymentMethod::Card));
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_wire_id_keeps_numbers_numeric() {
        #[derive(Serialize)]
        struct Body<'a> {
            #[serde(serialize_with = "wire_id::serialize")]
            id: &'a str,
        }

        let numeric = serde_json::to_string(&Body { id: "42" }).unwrap();
        assert_eq!(numeric, r#"{"id":42}"#);

        let object_id = serde_json::to_string(&Body {
            id: "65f1c0ffee00000000000001",
        })
        .unwrap();
        assert_eq!(object_id, r#"{"id":"65f1c0ffee00000000000001"}"#);
    }

    #[test]
    fn test_user_draft_wire_body() {
        let draft = UserDraft {
            name: "Marta Quispe".into(),
            email: Some("marta@farma.bo".into()),
            username: None,
            role: Role::Vendedor,
            password: None,
        };
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["nombre"], "Marta Quispe");
        assert_eq!(json["rol"], "vendedor");
        assert!(json.get("password").is_none());
        assert!(json.get("username").is_none());
    }

    #[test]
    fn test_purchase_total_defaults_to_line_costs() {
        let items = vec![
            PurchaseItem {
                product_id: "1".into(),
                quantity: 10,
                unit_cost: Money::from_cents(200),
            },
            PurchaseItem {
                product_id: "65f1c0ffee".into(),
                quantity: 2,
                unit_cost: Money::from_cents(750),
            },
        ];
        let draft = PurchaseDraft::new(Some("9".into()), items.clone(), None).unwrap();
        assert_eq!(draft.total, Money::from_cents(3500));
        assert_eq!(draft.total_quantity(), 12);

        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["proveedor_id"], "9");
        assert_eq!(json["items"][0]["id_producto"], 1);
        assert_eq!(json["items"][1]["id_producto"], "65f1c0ffee");
        assert_eq!(json["items"][1]["precio_unitario"], 7.5);
        assert_eq!(json["total"], 35.0);

        let draft = PurchaseDraft::new(None, items, Some(Money::from_cents(3000))).unwrap();
        assert_eq!(draft.total, Money::from_cents(3000));
        assert!(serde_json::to_value(&draft).unwrap().get("proveedor_id").is_none());
    }

    #[test]
    fn test_purchase_rejects_empty_and_zero_quantity() {
        assert!(matches!(
            PurchaseDraft::new(None, Vec::new(), None),
            Err(ValidationError::Required { .. })
        ));
        let zero = vec![PurchaseItem {
            product_id: "1".into(),
            quantity: 0,
            unit_cost: Money::zero(),
        }];
        assert!(matches!(
            PurchaseDraft::new(None, zero, None),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_product_draft_uses_backend_columns() {
        let mut draft = ProductDraft::with_code("7790001");
        draft.name = "Ibuprofeno 400mg".into();
        draft.price = Money::from_cents(1250);

        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["codigo"], "7790001");
        assert_eq!(json["Nombre_comercial"], "Ibuprofeno 400mg");
        assert_eq!(json["Precio_venta"], 12.5);
        assert!(json.get("Nombre_generico").is_none());
    }
}
