//! # Purchase Commands
//!
//! Suppliers and stock purchases. Registering a purchase makes the backend
//! add every line's quantity to the product's stock.
//!
//! ```text
//! buy prov=p1 1:10:2,00 7:5 total=35
//!       │       │          │      └─ optional, defaults to the line costs
//!       │       │          └─ product 7, 5 units, no unit cost
//!       │       └─ product 1, 10 units at $2.00
//!       └─ supplier id (optional)
//! ```

use farma_api::PosBackend;
use farma_core::{NewSupplier, PurchaseDraft, PurchaseSummary, Supplier};
use tracing::info;

use crate::error::{AppError, AppResult, ErrorCode};

/// What the terminal shows after a purchase is recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseReceipt {
    pub id: String,
    /// `(product name, units)` per line
    pub lines: Vec<(String, i64)>,
    pub draft: PurchaseDraft,
}

/// Purchase history, newest first.
pub async fn list_purchases(backend: &dyn PosBackend) -> AppResult<Vec<PurchaseSummary>> {
    let mut purchases = backend.list_purchases().await?;
    purchases.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));
    Ok(purchases)
}

pub async fn list_suppliers(backend: &dyn PosBackend) -> AppResult<Vec<Supplier>> {
    Ok(backend.list_suppliers().await?)
}

pub async fn create_supplier(backend: &dyn PosBackend, supplier: &NewSupplier) -> AppResult<Supplier> {
    let created = backend.create_supplier(supplier).await?;
    info!(supplier_id = %created.id, "Supplier registered");
    Ok(created)
}

/// Checks every product exists, then registers the purchase.
///
/// Nothing is sent when a product id is unknown.
pub async fn register_purchase(
    backend: &dyn PosBackend,
    draft: PurchaseDraft,
) -> AppResult<PurchaseReceipt> {
    let mut lines = Vec::with_capacity(draft.items.len());
    for item in &draft.items {
        let product = backend.get_product(&item.product_id).await.map_err(|e| {
            let err = AppError::from(e);
            if err.code == ErrorCode::NotFound {
                AppError::not_found(format!("Product {} does not exist", item.product_id))
            } else {
                err
            }
        })?;
        lines.push((product.name, item.quantity));
    }

    let id = backend.create_purchase(&draft).await?;
    info!(
        purchase_id = %id,
        units = draft.total_quantity(),
        total = %draft.total,
        "Purchase registered"
    );
    Ok(PurchaseReceipt { id, lines, draft })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;
    use farma_core::{Money, PurchaseItem};

    fn item(product_id: &str, quantity: i64, cost_cents: i64) -> PurchaseItem {
        PurchaseItem {
            product_id: product_id.into(),
            quantity,
            unit_cost: Money::from_cents(cost_cents),
        }
    }

    #[tokio::test]
    async fn test_purchase_restocks_products() {
        let backend = FakeBackend::new();
        let draft = PurchaseDraft::new(
            Some("p1".into()),
            vec![item("3", 12, 300), item("1", 5, 200)],
            None,
        )
        .unwrap();

        let receipt = register_purchase(&backend, draft).await.unwrap();
        assert_eq!(receipt.lines[0], ("Ibuprofeno 400mg".to_string(), 12));
        assert_eq!(receipt.draft.total, Money::from_cents(4600));

        assert_eq!(backend.get_product("3").await.unwrap().stock, 12.0);
        assert_eq!(backend.get_product("1").await.unwrap().stock, 15.0);

        let history = list_purchases(&backend).await.unwrap();
        assert_eq!(history[0].id, receipt.id);
        assert_eq!(history[0].supplier_name.as_deref(), Some("Droguería Inti"));
    }

    #[tokio::test]
    async fn test_unknown_product_sends_nothing() {
        let backend = FakeBackend::new();
        let draft = PurchaseDraft::new(None, vec![item("1", 1, 0), item("99", 1, 0)], None).unwrap();

        let err = register_purchase(&backend, draft).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Product 99 does not exist");
        assert!(backend.registered_purchases().is_empty());
        assert_eq!(backend.get_product("1").await.unwrap().stock, 10.0);
    }

    #[tokio::test]
    async fn test_new_supplier_is_listed() {
        let backend = FakeBackend::new();
        create_supplier(
            &backend,
            &NewSupplier {
                name: "Bago".into(),
                contact: None,
                phone: Some("2-2440000".into()),
            },
        )
        .await
        .unwrap();

        let suppliers = list_suppliers(&backend).await.unwrap();
        assert_eq!(suppliers.len(), 2);
        assert_eq!(suppliers[1].name, "Bago");
    }
}
