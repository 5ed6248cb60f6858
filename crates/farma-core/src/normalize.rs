//! # Response Normalization
//!
//! The backend has answered list endpoints in several shapes over time
//! (SQL and Mongo deployments, old and new routes). Everything is funneled
//! through [`classify`] into one tagged [`ListShape`], then coerced into the
//! typed records of [`crate::types`].
//!
//! ## Recognized List Shapes
//! ```text
//! ┌─────────────────────────────────────────┬─────────────────────────────┐
//! │ Payload                                 │ ListShape                   │
//! ├─────────────────────────────────────────┼─────────────────────────────┤
//! │ [ {...}, {...} ]                        │ Array                       │
//! │ { "productos": [ ... ], "total": 2 }    │ Wrapped                     │
//! │ { "data": [ ... ] }                     │ Data                        │
//! │ { "productos": { "17": {...}, ... } }   │ WrappedMap                  │
//! │ { "17": {...}, "18": {...} }            │ Map (values carry a marker) │
//! │ { "ok": true, "17": {...} }             │ Map (marked values only)    │
//! │ anything else                           │ Unrecognized → empty list   │
//! └─────────────────────────────────────────┴─────────────────────────────┘
//! ```
//!
//! ## Field Aliases
//! ```text
//! id      id | _id.$oid | _id | codigo        (map key as last resort)
//! name    Nombre_comercial | nombre | name
//! price   Precio_venta | precio | price
//! stock   existencia | stock | cantidad
//! expiry  vencimiento | Vencimiento | fecha_vencimiento | venc
//! ```
//!
//! Numbers may arrive as JSON numbers or as numeric strings.

use serde_json::{Map, Value};

use crate::money::Money;
use crate::role::Role;
use crate::types::{
    Client, CreatedInvoice, InvoiceDetail, InvoiceLine, InvoiceSummary, Product, PurchaseSummary,
    Supplier, UserAccount, UserInfo,
};

// =============================================================================
// List Shapes
// =============================================================================

/// Which entity a list payload holds: its wrapper key and the fields that
/// identify one of its records inside an id-keyed map.
#[derive(Debug, Clone, Copy)]
pub struct ListKind {
    pub key: &'static str,
    pub markers: &'static [&'static str],
}

pub const PRODUCTS: ListKind = ListKind {
    key: "productos",
    markers: &["Nombre_comercial", "codigo", "id", "_id"],
};

pub const CLIENTS: ListKind = ListKind {
    key: "clientes",
    markers: &["nombre", "ci", "id", "_id"],
};

pub const INVOICES: ListKind = ListKind {
    key: "facturas",
    markers: &["id", "_id", "total", "fecha"],
};

pub const USERS: ListKind = ListKind {
    key: "usuarios",
    markers: &["nombre", "email", "username", "rol", "id", "_id"],
};

pub const SUPPLIERS: ListKind = ListKind {
    key: "proveedores",
    markers: &["nombre", "contacto", "id", "_id"],
};

pub const PURCHASES: ListKind = ListKind {
    key: "compras",
    markers: &["proveedor_id", "items", "total", "id", "_id"],
};

/// A list payload, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum ListShape<'a> {
    Array(&'a [Value]),
    Wrapped(&'a [Value]),
    Data(&'a [Value]),
    WrappedMap(&'a Map<String, Value>),
    /// The marked records of a top-level id-keyed map, other keys dropped
    Map(Vec<(&'a str, &'a Value)>),
    Unrecognized,
}

impl<'a> ListShape<'a> {
    /// Records in payload order, each with its map key when it had one.
    pub fn entries(&self) -> Vec<(Option<&'a str>, &'a Value)> {
        match *self {
            ListShape::Array(items) | ListShape::Wrapped(items) | ListShape::Data(items) => {
                items.iter().map(|v| (None, v)).collect()
            }
            ListShape::WrappedMap(map) => {
                map.iter().map(|(k, v)| (Some(k.as_str()), v)).collect()
            }
            ListShape::Map(ref records) => records.iter().map(|(k, v)| (Some(*k), *v)).collect(),
            ListShape::Unrecognized => Vec::new(),
        }
    }
}

/// Classifies a list payload.
pub fn classify<'a>(payload: &'a Value, kind: ListKind) -> ListShape<'a> {
    let map = match payload {
        Value::Array(items) => return ListShape::Array(items),
        Value::Object(map) => map,
        _ => return ListShape::Unrecognized,
    };

    match map.get(kind.key) {
        Some(Value::Array(items)) => return ListShape::Wrapped(items),
        Some(Value::Object(inner)) => return ListShape::WrappedMap(inner),
        _ => {}
    }

    if let Some(Value::Array(items)) = map.get("data") {
        return ListShape::Data(items);
    }

    let records: Vec<(&str, &Value)> = map
        .iter()
        .filter(|(_, v)| match v {
            Value::Object(record) => has_marker(record, kind.markers),
            _ => false,
        })
        .map(|(k, v)| (k.as_str(), v))
        .collect();
    if records.is_empty() {
        return ListShape::Unrecognized;
    }
    ListShape::Map(records)
}

fn has_marker(record: &Map<String, Value>, markers: &[&str]) -> bool {
    markers.iter().any(|m| record.contains_key(*m))
}

// =============================================================================
// Field Coercion
// =============================================================================

/// String, number or `{"$date": ...}` / `{"$oid": ...}` as text.
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map
            .get("$oid")
            .or_else(|| map.get("$date"))
            .and_then(text),
        _ => None,
    }
}

fn text_field(record: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| record.get(*k).and_then(text))
}

/// Number or numeric string (either decimal separator).
fn number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

fn number_field(record: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| record.get(*k).and_then(number))
}

fn money_field(record: &Value, keys: &[&str]) -> Option<Money> {
    number_field(record, keys).map(Money::from_decimal)
}

/// `id | _id.$oid | _id`
fn entity_id(record: &Value) -> Option<String> {
    text_field(record, &["id", "_id"])
}

// =============================================================================
// Products
// =============================================================================

/// Normalizes any product list payload.
pub fn products(payload: &Value) -> Vec<Product> {
    classify(payload, PRODUCTS)
        .entries()
        .into_iter()
        .filter_map(|(key, value)| product_record(value, key))
        .collect()
}

/// Coerces one product record. `fallback_id` is the map key, if any.
///
/// Bare strings and numbers become a product with that id and name, no
/// price and no stock.
pub fn product_record(value: &Value, fallback_id: Option<&str>) -> Option<Product> {
    if matches!(value, Value::String(_) | Value::Number(_)) {
        let primitive = text(value)?;
        return Some(Product {
            id: primitive.clone(),
            name: primitive,
            generic_name: None,
            therapeutic_action: None,
            brand: None,
            barcode: None,
            price: Money::zero(),
            stock: 0.0,
            expires_on: None,
        });
    }

    if !value.is_object() {
        return None;
    }

    let name = text_field(value, &["Nombre_comercial", "nombre", "name"]);
    let id = entity_id(value)
        .or_else(|| text_field(value, &["codigo"]))
        .or_else(|| fallback_id.map(str::to_string))
        .or_else(|| name.clone())?;

    Some(Product {
        name: name.unwrap_or_else(|| id.clone()),
        id,
        generic_name: text_field(value, &["Nombre_generico"]),
        therapeutic_action: text_field(value, &["Accion_terapeutica"]),
        brand: text_field(value, &["Marca", "id_marca", "marca"]),
        barcode: text_field(value, &["codigo", "Cod_barrras"]),
        price: money_field(value, &["Precio_venta", "precio", "price"]).unwrap_or_default(),
        stock: number_field(value, &["existencia", "stock", "cantidad"])
            .unwrap_or(0.0)
            .max(0.0),
        expires_on: text_field(
            value,
            &["vencimiento", "Vencimiento", "fecha_vencimiento", "venc"],
        ),
    })
}

/// Unwraps a single-product response.
///
/// ```text
/// [ {...}, ... ]                    → first element
/// { "producto": {...} }             → inner object
/// { "product": {...} }              → inner object
/// { "data": <any of these> }        → recurse
/// { "id": 1, "Nombre_comercial": …} → itself
/// { "17": {...} }                   → first record, key as id fallback
/// ```
pub fn single_product(payload: &Value) -> Option<Product> {
    match payload {
        Value::Array(items) => items.first().and_then(|v| product_record(v, None)),
        Value::Object(map) => {
            for key in ["producto", "product"] {
                if let Some(inner) = map.get(key).filter(|v| v.is_object()) {
                    return product_record(inner, None);
                }
            }
            if let Some(product) = map.get("data").and_then(single_product) {
                return Some(product);
            }
            if has_marker(map, PRODUCTS.markers) {
                return product_record(payload, None);
            }
            map.iter()
                .filter(|(_, v)| v.is_object())
                .find_map(|(k, v)| product_record(v, Some(k)))
        }
        _ => None,
    }
}

/// Client-side substring filter over name, generic name and code.
pub fn filter_products(products: Vec<Product>, term: &str) -> Vec<Product> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return products;
    }
    products
        .into_iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&needle)
                || p.id.to_lowercase().contains(&needle)
                || p.generic_name
                    .as_deref()
                    .is_some_and(|g| g.to_lowercase().contains(&needle))
                || p.barcode
                    .as_deref()
                    .is_some_and(|b| b.to_lowercase().contains(&needle))
        })
        .collect()
}

// =============================================================================
// Clients
// =============================================================================

/// Normalizes a client list (`[...]` or `{ "clientes": [...] }`, plus the
/// other list shapes).
pub fn clients(payload: &Value) -> Vec<Client> {
    classify(payload, CLIENTS)
        .entries()
        .into_iter()
        .filter_map(|(key, value)| client_record(value, key))
        .collect()
}

/// Coerces one client record. Records without any id are dropped.
pub fn client_record(value: &Value, fallback_id: Option<&str>) -> Option<Client> {
    if !value.is_object() {
        return None;
    }
    let id = entity_id(value).or_else(|| fallback_id.map(str::to_string))?;
    Some(Client {
        name: text_field(value, &["nombre", "name", "razon_social"]).unwrap_or_else(|| id.clone()),
        id,
        document_number: text_field(value, &["ci", "documento", "nit"]),
    })
}

/// Result of a lookup by document number: a client when the payload
/// carries an id, `None` otherwise.
pub fn found_client(payload: &Value) -> Option<Client> {
    let record = payload.get("cliente").filter(|v| v.is_object()).unwrap_or(payload);
    client_record(record, None)
}

/// Id of a freshly created entity (`id | _id`, possibly wrapped).
pub fn created_id(payload: &Value) -> Option<String> {
    entity_id(payload).or_else(|| {
        ["cliente", "producto", "data"]
            .iter()
            .find_map(|k| payload.get(*k).and_then(entity_id))
    })
}

// =============================================================================
// Invoices
// =============================================================================

const DISPLAY_ID_KEYS: &[&str] = &["numero", "seq", "short_id", "display_id", "id", "_id"];

/// Normalizes the response of `POST /api/facturas`.
pub fn created_invoice(payload: &Value) -> CreatedInvoice {
    CreatedInvoice {
        id: entity_id(payload),
        display_id: text_field(payload, DISPLAY_ID_KEYS),
        issued_at: text_field(payload, &["fecha"]),
        seller_name: text_field(payload, &["vendedor_nombre"]),
        total: money_field(payload, &["total"]),
        tendered: money_field(payload, &["recibido"]),
        change: money_field(payload, &["cambio"]),
        note: text_field(payload, &["nota"]),
        message: text_field(payload, &["mensaje", "message"]),
    }
}

/// Normalizes the invoice history list.
pub fn invoices(payload: &Value) -> Vec<InvoiceSummary> {
    classify(payload, INVOICES)
        .entries()
        .into_iter()
        .filter_map(|(key, value)| {
            if !value.is_object() {
                return None;
            }
            let id = entity_id(value).or_else(|| key.map(str::to_string))?;
            let client_label = text_field(value, &["clientName", "cliente_nombre"]).or_else(|| {
                value.get("cliente").and_then(|c| match c {
                    Value::Object(_) => text_field(c, &["nombre", "name", "razon_social"]),
                    other => text(other),
                })
            });
            Some(InvoiceSummary {
                display_id: text_field(value, DISPLAY_ID_KEYS).unwrap_or_else(|| id.clone()),
                id,
                client_label,
                client_id: text_field(value, &["id_cliente"]),
                total: money_field(value, &["total", "monto"]),
                issued_at: text_field(value, &["fecha"]),
            })
        })
        .collect()
}

/// Normalizes detail lines (`[...]`, `{detalles: [...]}` or `{items: [...]}`).
pub fn invoice_lines(payload: &Value) -> Vec<InvoiceLine> {
    let items = match payload {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("detalles").or_else(|| map.get("items")) {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
        _ => &[],
    };

    items
        .iter()
        .filter(|v| v.is_object())
        .map(|line| {
            let quantity = number_field(line, &["cantidad"]).unwrap_or(0.0).round() as i64;
            let unit_price = money_field(line, &["precio_unitario", "precio"]);
            let subtotal = money_field(line, &["subtotal"])
                .or_else(|| unit_price.map(|p| p.multiply_quantity(quantity)))
                .unwrap_or_default();
            InvoiceLine {
                product_name: text_field(
                    line,
                    &[
                        "producto_nombre",
                        "producto",
                        "Nombre_comercial",
                        "producto_short_id",
                        "id_producto",
                    ],
                )
                .unwrap_or_default(),
                quantity,
                unit_price,
                subtotal,
            }
        })
        .collect()
}

/// Builds the detail view of one invoice from its record and its lines.
pub fn invoice_detail(id: &str, invoice: Option<&Value>, lines: Vec<InvoiceLine>) -> InvoiceDetail {
    let field = |keys: &[&str]| invoice.and_then(|v| text_field(v, keys));
    let money = |keys: &[&str]| invoice.and_then(|v| money_field(v, keys));

    InvoiceDetail {
        id: id.to_string(),
        issued_at: field(&["fecha"][..]),
        seller: field(&["vendedor_nombre", "id_usuario"][..]),
        client_id: field(&["id_cliente"][..]),
        client_name: None,
        lines,
        tendered: money(&["recibido"][..]),
        change: money(&["cambio"][..]),
        note: field(&["nota"][..]),
    }
}

// =============================================================================
// Users
// =============================================================================

/// Normalizes `GET /api/usuarios`. Password fields are never read.
pub fn user_accounts(payload: &Value) -> Vec<UserAccount> {
    classify(payload, USERS)
        .entries()
        .into_iter()
        .filter_map(|(key, value)| user_record(value, key))
        .collect()
}

fn user_record(value: &Value, fallback_id: Option<&str>) -> Option<UserAccount> {
    if !value.is_object() {
        return None;
    }
    let id = entity_id(value).or_else(|| fallback_id.map(str::to_string))?;
    let username = text_field(value, &["username"]);
    let email = text_field(value, &["email"]);
    Some(UserAccount {
        name: text_field(value, &["nombre", "name"])
            .or_else(|| username.clone())
            .or_else(|| email.clone())
            .unwrap_or_else(|| id.clone()),
        id,
        email,
        username,
        role: Role::resolve(value),
    })
}

/// Unwraps `GET /api/usuarios/{id}` (`{ "usuario": {...} }` or the bare record).
pub fn single_user(payload: &Value) -> Option<UserAccount> {
    let record = payload.get("usuario").filter(|v| v.is_object()).unwrap_or(payload);
    user_record(record, None)
}

/// Reads the `{ "updated": bool }` / `{ "deleted": bool }` acknowledgements.
/// A missing flag counts as success.
pub fn acknowledged(payload: &Value, flag: &str) -> bool {
    payload.get(flag).and_then(Value::as_bool).unwrap_or(true)
}

// =============================================================================
// Suppliers and Purchases
// =============================================================================

pub fn suppliers(payload: &Value) -> Vec<Supplier> {
    classify(payload, SUPPLIERS)
        .entries()
        .into_iter()
        .filter_map(|(key, value)| {
            if !value.is_object() {
                return None;
            }
            let id = entity_id(value).or_else(|| key.map(str::to_string))?;
            Some(Supplier {
                name: text_field(value, &["nombre", "name", "razon_social"])
                    .unwrap_or_else(|| id.clone()),
                id,
                contact: text_field(value, &["contacto", "contact"]),
                phone: text_field(value, &["telefono", "phone"]),
            })
        })
        .collect()
}

/// Normalizes the purchase history. `supplier_name` is only set when the
/// record embeds the supplier.
pub fn purchases(payload: &Value) -> Vec<PurchaseSummary> {
    classify(payload, PURCHASES)
        .entries()
        .into_iter()
        .filter_map(|(key, value)| {
            if !value.is_object() {
                return None;
            }
            let id = entity_id(value).or_else(|| key.map(str::to_string))?;
            let supplier = value.get("proveedor");
            Some(PurchaseSummary {
                id,
                supplier_id: text_field(value, &["proveedor_id"])
                    .or_else(|| supplier.and_then(entity_id)),
                supplier_name: text_field(value, &["proveedor_nombre"]).or_else(|| {
                    supplier.and_then(|p| match p {
                        Value::Object(_) => text_field(p, &["nombre", "name"]),
                        other => text(other),
                    })
                }),
                item_count: value
                    .get("items")
                    .and_then(Value::as_array)
                    .map_or(0, Vec::len),
                total: money_field(value, &["total"]),
                issued_at: text_field(value, &["fecha"]),
            })
        })
        .collect()
}

// =============================================================================
// Session
// =============================================================================

/// Extracts the user from `GET/POST /api/login`; `{ "user": null }` is
/// logged out.
pub fn session_user(payload: &Value) -> Option<UserInfo> {
    let user = payload.get("user")?;
    if !user.is_object() {
        return None;
    }
    Some(UserInfo {
        id: entity_id(user),
        name: text_field(user, &["nombre", "name", "username", "email"]).unwrap_or_default(),
        email: text_field(user, &["email"]),
        role: Role::resolve(user),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: i64, name: &str) -> Value {
        json!({"id": id, "Nombre_comercial": name, "Precio_venta": 10.5, "existencia": 4})
    }

    #[test]
    fn test_every_list_shape_normalizes_the_same() {
        let shapes = vec![
            json!([record(1, "A"), record(2, "B")]),
            json!({"productos": [record(1, "A"), record(2, "B")], "total": 2}),
            json!({"data": [record(1, "A"), record(2, "B")]}),
            json!({"productos": {"1": record(1, "A"), "2": record(2, "B")}}),
            json!({"1": record(1, "A"), "2": record(2, "B")}),
            json!({"ok": true, "1": record(1, "A"), "meta": {"page": 1}, "2": record(2, "B")}),
        ];

        for payload in shapes {
            let list = products(&payload);
            let ids: Vec<&str> = list.iter().map(|p| p.id.as_str()).collect();
            assert_eq!(ids, vec!["1", "2"], "payload: {payload}");
            assert_eq!(list[0].price, Money::from_cents(1050));
            assert_eq!(list[0].stock, 4.0);
        }
    }

    #[test]
    fn test_classify_tags() {
        assert!(matches!(classify(&json!([]), PRODUCTS), ListShape::Array(_)));
        assert!(matches!(
            classify(&json!({"productos": []}), PRODUCTS),
            ListShape::Wrapped(_)
        ));
        assert!(matches!(
            classify(&json!({"data": []}), PRODUCTS),
            ListShape::Data(_)
        ));
        assert_eq!(classify(&json!({"error": "x"}), PRODUCTS), ListShape::Unrecognized);
        assert_eq!(classify(&json!("nope"), PRODUCTS), ListShape::Unrecognized);
        assert_eq!(classify(&Value::Null, PRODUCTS), ListShape::Unrecognized);
    }

    #[test]
    fn test_mixed_map_keeps_only_marked_records() {
        let payload = json!({
            "ok": true,
            "1": {"id": 1, "Nombre_comercial": "A"},
            "2": {"id": 2, "Nombre_comercial": "B"}
        });
        let ListShape::Map(records) = classify(&payload, PRODUCTS) else {
            panic!("expected a record map");
        };
        assert_eq!(records.len(), 2);
        assert_eq!(products(&payload).len(), 2);
    }

    #[test]
    fn test_unrecognized_is_empty() {
        assert!(products(&json!({"ok": true, "count": 3})).is_empty());
        assert!(products(&json!(null)).is_empty());
    }

    #[test]
    fn test_field_aliases_and_string_numbers() {
        let payload = json!([{
            "_id": {"$oid": "65f1c0ffee"},
            "nombre": "Loratadina",
            "precio": "7,25",
            "stock": "3.5",
            "fecha_vencimiento": "2027-01-31",
            "Marca": "Bago",
            "Cod_barrras": "7791234"
        }]);

        let p = &products(&payload)[0];
        assert_eq!(p.id, "65f1c0ffee");
        assert_eq!(p.name, "Loratadina");
        assert_eq!(p.price, Money::from_cents(725));
        assert_eq!(p.stock_ceiling(), 3);
        assert_eq!(p.expires_on.as_deref(), Some("2027-01-31"));
        assert_eq!(p.brand.as_deref(), Some("Bago"));
        assert_eq!(p.barcode.as_deref(), Some("7791234"));
    }

    #[test]
    fn test_codigo_is_last_id_alias() {
        let p = product_record(&json!({"codigo": "A-77", "name": "X"}), None).unwrap();
        assert_eq!(p.id, "A-77");
        let p = product_record(&json!({"name": "X"}), Some("k9")).unwrap();
        assert_eq!(p.id, "k9");
    }

    #[test]
    fn test_primitives_become_unpriced_products() {
        let list = products(&json!(["Aspirina", 42]));
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, "Aspirina");
        assert_eq!(list[0].name, "Aspirina");
        assert_eq!(list[0].price, Money::zero());
        assert_eq!(list[1].id, "42");
        assert!(list[1].is_out_of_stock());
    }

    #[test]
    fn test_single_product_unwrap() {
        let inner = record(5, "Dipirona");
        for payload in [
            json!([inner.clone()]),
            json!({"producto": inner.clone()}),
            json!({"product": inner.clone()}),
            json!({"data": {"producto": inner.clone()}}),
            json!({"data": {"5": inner.clone()}}),
            inner.clone(),
        ] {
            let p = single_product(&payload).unwrap();
            assert_eq!(p.id, "5", "payload: {payload}");
            assert_eq!(p.name, "Dipirona");
        }
        assert!(single_product(&json!([])).is_none());
        assert!(single_product(&json!(null)).is_none());
    }

    #[test]
    fn test_filter_products() {
        let list = products(&json!([record(1, "Amoxicilina"), record(2, "Ibuprofeno")]));
        let hits = filter_products(list.clone(), "AMOX");
        assert_eq!(hits.len(), 1);
        assert_eq!(filter_products(list, " ").len(), 2);
    }

    #[test]
    fn test_clients() {
        let payload = json!({"clientes": [
            {"id": 3, "nombre": "Ana", "ci": "1234567"},
            {"_id": "abc", "razon_social": "Farmacorp SRL"},
            {"nombre": "sin id"}
        ]});
        let list = clients(&payload);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].label(), "Ana (1234567)");
        assert_eq!(list[1].name, "Farmacorp SRL");
    }

    #[test]
    fn test_found_client_requires_id() {
        assert!(found_client(&json!({"id": 8, "nombre": "Luis"})).is_some());
        assert!(found_client(&json!({"cliente": {"_id": "x1", "nombre": "Luis"}})).is_some());
        assert!(found_client(&json!({"error": "cliente not found"})).is_none());
        assert!(found_client(&Value::Null).is_none());
    }

    #[test]
    fn test_created_id() {
        assert_eq!(created_id(&json!({"id": 14})).as_deref(), Some("14"));
        assert_eq!(created_id(&json!({"_id": "65ab"})).as_deref(), Some("65ab"));
        assert_eq!(
            created_id(&json!({"success": true, "producto": {"id": 3}})).as_deref(),
            Some("3")
        );
        assert_eq!(created_id(&json!({"ok": 1})), None);
    }

    #[test]
    fn test_created_invoice_display_id_priority() {
        let inv = created_invoice(&json!({"id": "65f1", "numero": 1042, "mensaje": "factura creada"}));
        assert_eq!(inv.id.as_deref(), Some("65f1"));
        assert_eq!(inv.display_id.as_deref(), Some("1042"));
        assert_eq!(inv.message.as_deref(), Some("factura creada"));
        assert_eq!(inv.total, None);

        let inv = created_invoice(&json!({"_id": {"$oid": "beef"}, "total": "15.00"}));
        assert_eq!(inv.display_id.as_deref(), Some("beef"));
        assert_eq!(inv.total, Some(Money::from_cents(1500)));
    }

    #[test]
    fn test_invoices_list() {
        let payload = json!([
            {"id": "a1", "id_cliente": 3, "total": 25.5, "fecha": "2026-10-16"},
            {"id": "a2", "seq": 7, "cliente": {"nombre": "Ana"}, "monto": 3}
        ]);
        let list = invoices(&payload);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].display_id, "a1");
        assert_eq!(list[0].client_id.as_deref(), Some("3"));
        assert_eq!(list[0].total, Some(Money::from_cents(2550)));
        assert_eq!(list[1].display_id, "7");
        assert_eq!(list[1].client_label.as_deref(), Some("Ana"));
    }

    #[test]
    fn test_invoice_lines_and_detail_total() {
        let invoice = json!({
            "id": "a1",
            "vendedor_nombre": "Laura",
            "recibido": 20,
            "items": [
                {"id_producto": 1, "cantidad": 2, "precio_unitario": 3.5, "subtotal": 7},
                {"producto_nombre": "Gasa", "cantidad": "3", "precio": 1.25}
            ]
        });

        let lines = invoice_lines(&invoice);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].product_name, "1");
        assert_eq!(lines[1].subtotal, Money::from_cents(375));

        let detail = invoice_detail("a1", Some(&invoice), lines);
        assert_eq!(detail.seller.as_deref(), Some("Laura"));
        assert_eq!(detail.tendered, Some(Money::from_cents(2000)));
        assert_eq!(detail.total(), Money::from_cents(1075));
    }

    #[test]
    fn test_oversized_line_amounts_do_not_overflow() {
        let payload = json!({"detalles": [
            {"cantidad": 1_000_000, "precio_unitario": 1.0e14},
            {"cantidad": 1, "precio_unitario": 1.0e300}
        ]});

        let lines = invoice_lines(&payload);
        assert_eq!(lines[0].subtotal, Money::from_cents(i64::MAX));
        assert_eq!(lines[1].unit_price, Some(Money::from_cents(i64::MAX)));

        let detail = invoice_detail("x", None, lines);
        assert_eq!(detail.total(), Money::from_cents(i64::MAX));
    }

    #[test]
    fn test_session_user() {
        assert!(session_user(&json!({"user": null})).is_none());
        assert!(session_user(&json!({})).is_none());

        let user = session_user(&json!({"message": "ok", "user": {
            "id": 2, "nombre": "Laura", "email": "laura@farma.test", "rol": "vendedor"
        }}))
        .unwrap();
        assert_eq!(user.name, "Laura");
        assert_eq!(user.id.as_deref(), Some("2"));
        assert_eq!(user.role, Role::Vendedor);
    }

    #[test]
    fn test_user_accounts_read_the_admin_list() {
        let payload = json!({"usuarios": [
            {"id": "65f0a1", "nombre": "Ana Mamani", "email": "ana@farma.bo", "rol": "admin"},
            {"_id": {"$oid": "65f0a2"}, "username": "caja1", "rol": "vendedor", "password": "x"},
            {"nombre": "sin id"}
        ]});
        let users = user_accounts(&payload);
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].name, "Ana Mamani");
        assert_eq!(users[0].role, Role::Admin);
        assert_eq!(users[1].id, "65f0a2");
        assert_eq!(users[1].name, "caja1");
        assert_eq!(users[1].role, Role::Vendedor);

        let single = single_user(&json!({"usuario": {"_id": "65f0a2", "nombre": "Caja"}})).unwrap();
        assert_eq!(single.id, "65f0a2");
        assert_eq!(single.role, Role::Unknown);
        assert!(single_user(&json!({"error": "not_found"})).is_none());
    }

    #[test]
    fn test_acknowledgement_flags() {
        assert!(acknowledged(&json!({"deleted": true}), "deleted"));
        assert!(!acknowledged(&json!({"deleted": false}), "deleted"));
        assert!(acknowledged(&json!({}), "updated"));
    }

    #[test]
    fn test_suppliers_and_purchases() {
        let provs = suppliers(&json!({"proveedores": [
            {"id": "p1", "nombre": "Droguería Inti", "contacto": "Luis", "telefono": "70000000"}
        ], "total": 1}));
        assert_eq!(provs.len(), 1);
        assert_eq!(provs[0].name, "Droguería Inti");
        assert_eq!(provs[0].phone.as_deref(), Some("70000000"));

        let list = purchases(&json!({"compras": [
            {"id": "c1", "proveedor_id": "p1", "items": [{"id_producto": 1, "cantidad": 5}], "total": 12.5},
            {"_id": "c2", "proveedor": {"id": "p2", "nombre": "Bago"}, "fecha": "2024-05-02"}
        ]}));
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].supplier_id.as_deref(), Some("p1"));
        assert_eq!(list[0].item_count, 1);
        assert_eq!(list[0].total, Some(Money::from_cents(1250)));
        assert_eq!(list[1].supplier_id.as_deref(), Some("p2"));
        assert_eq!(list[1].supplier_name.as_deref(), Some("Bago"));
        assert_eq!(list[1].total, None);
    }
}
