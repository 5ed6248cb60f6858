//! # Views
//!
//! Plain-text rendering for every screen. Pure functions from response
//! DTOs to strings; nothing here touches state or the backend.
//!
//! ```text
//! ┌────┬──────────────────────┬─────────┬────────┐
//! │ #  │ Producto             │  Precio │  Stock │
//! ├────┼──────────────────────┼─────────┼────────┤
//! │ 1  │ Paracetamol 500mg    │   $3.50 │     10 │
//! │ 2  │ Ibuprofeno 400mg     │   $5.00 │ Agotado│
//! └────┴──────────────────────┴─────────┴────────┘
//! ```

use farma_core::{
    CheckoutStep, Client, InvoiceDetail, InvoiceSummary, Product, PurchaseSummary, Receipt,
    Supplier, UserAccount, UserInfo,
};

use crate::commands::cart::CartResponse;
use crate::commands::checkout::{CheckoutView, SaleOutcome};
use crate::commands::purchase::PurchaseReceipt;
use crate::config::TerminalConfig;
use crate::error::AppError;
use crate::router::Route;

// =============================================================================
// Table Helper
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

/// Renders a box-drawn table. Column widths fit the widest cell.
fn table(headers: &[(&str, Align)], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|(h, _)| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let rule = |left: &str, mid: &str, right: &str| {
        let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        format!("{left}{}{right}\n", segments.join(mid))
    };
    let line = |cells: Vec<&str>| {
        let padded: Vec<String> = cells
            .iter()
            .zip(headers)
            .zip(&widths)
            .map(|((cell, (_, align)), width)| {
                let fill = " ".repeat(width.saturating_sub(cell.chars().count()));
                match align {
                    Align::Left => format!(" {cell}{fill} "),
                    Align::Right => format!(" {fill}{cell} "),
                }
            })
            .collect();
        format!("│{}│\n", padded.join("│"))
    };

    let mut out = rule("┌", "┬", "┐");
    out.push_str(&line(headers.iter().map(|(h, _)| *h).collect()));
    out.push_str(&rule("├", "┼", "┤"));
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    out.push_str(&rule("└", "┴", "┘"));
    out
}

fn stock_cell(stock: f64) -> String {
    if farma_core::types::stock_ceiling(stock) < 1 {
        "Agotado".to_string()
    } else if stock.fract() == 0.0 {
        format!("{stock:.0}")
    } else {
        format!("{stock:.2}")
    }
}

fn dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or("-")
}

// =============================================================================
// Screens
// =============================================================================

pub fn banner(config: &TerminalConfig, user: Option<&UserInfo>) -> String {
    let who = match user {
        Some(u) => format!("{} ({})", u.name, u.role),
        None => "not logged in".to_string(),
    };
    format!(
        "{} · backend {} · {}\nType help for commands.\n",
        config.store.name, config.backend.base_url, who
    )
}

pub fn route_header(route: &Route) -> String {
    format!("== {} ({}) ==\n", route.title(), route.hash())
}

pub fn error(err: &AppError) -> String {
    format!("! {}\n", err.message)
}

pub fn user(user: &UserInfo) -> String {
    let role = if user.role.name().is_empty() {
        "no role".to_string()
    } else {
        user.role.to_string()
    };
    format!("{} · {} · {}\n", user.name, dash(user.email.as_deref()), role)
}

/// Search results and product lists. Sold-out products show `Agotado`.
pub fn products(products: &[Product]) -> String {
    if products.is_empty() {
        return "No products found.\n".to_string();
    }
    let rows: Vec<Vec<String>> = products
        .iter()
        .enumerate()
        .map(|(i, p)| {
            vec![
                (i + 1).to_string(),
                p.id.clone(),
                p.name.clone(),
                p.price.to_string(),
                stock_cell(p.stock),
            ]
        })
        .collect();
    table(
        &[
            ("#", Align::Right),
            ("Id", Align::Left),
            ("Producto", Align::Left),
            ("Precio", Align::Right),
            ("Stock", Align::Right),
        ],
        &rows,
    )
}

pub fn product_detail(product: &Product) -> String {
    let mut out = format!("{} (id {})\n", product.name, product.id);
    out.push_str(&format!("  Genérico:   {}\n", dash(product.generic_name.as_deref())));
    out.push_str(&format!("  Acción:     {}\n", dash(product.therapeutic_action.as_deref())));
    out.push_str(&format!("  Marca:      {}\n", dash(product.brand.as_deref())));
    out.push_str(&format!("  Barras:     {}\n", dash(product.barcode.as_deref())));
    out.push_str(&format!("  Precio:     {}\n", product.price));
    out.push_str(&format!("  Stock:      {}\n", stock_cell(product.stock)));
    out.push_str(&format!("  Vence:      {}\n", dash(product.expires_on.as_deref())));
    out
}

/// Inventory view: products with stock and expiry, soonest expiry first.
pub fn inventory(products: &[Product]) -> String {
    let mut sorted: Vec<&Product> = products.iter().collect();
    sorted.sort_by(|a, b| match (&a.expires_on, &b.expires_on) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.name.cmp(&b.name),
    });
    let rows: Vec<Vec<String>> = sorted
        .iter()
        .map(|p| {
            vec![
                p.name.clone(),
                stock_cell(p.stock),
                dash(p.expires_on.as_deref()).to_string(),
            ]
        })
        .collect();
    if rows.is_empty() {
        return "No products found.\n".to_string();
    }
    table(
        &[
            ("Producto", Align::Left),
            ("Stock", Align::Right),
            ("Vence", Align::Left),
        ],
        &rows,
    )
}

pub fn cart(cart: &CartResponse) -> String {
    let mut out = String::new();
    if let Some(notice) = &cart.notice {
        out.push_str(&format!("* {notice}\n"));
    }
    if cart.items.is_empty() {
        out.push_str("Cart is empty.\n");
        return out;
    }

    let rows: Vec<Vec<String>> = cart
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            vec![
                (i + 1).to_string(),
                item.name.clone(),
                item.quantity.to_string(),
                item.unit_price.to_string(),
                item.subtotal().to_string(),
            ]
        })
        .collect();
    out.push_str(&table(
        &[
            ("#", Align::Right),
            ("Producto", Align::Left),
            ("Cant.", Align::Right),
            ("Precio", Align::Right),
            ("Subtotal", Align::Right),
        ],
        &rows,
    ));
    out.push_str(&format!(
        "{} products · {} units · TOTAL {}\n",
        cart.totals.item_count, cart.totals.total_quantity, cart.totals.total
    ));
    if let Some(client) = &cart.client {
        out.push_str(&format!("Client: {}\n", client.label()));
    }
    out
}

pub fn checkout(view: &CheckoutView) -> String {
    let mut out = format!("-- Payment {} · {} --\n", view.short_id, view.step);
    out.push_str(&format!("Total:    {}\n", view.total));

    match view.step {
        CheckoutStep::ClientLookup => {
            out.push_str("Client:   type ci <document number>\n");
            if let Some(ci) = &view.not_found {
                out.push_str(&format!(
                    "No client with CI {ci}. Register with: newclient <name>\n"
                ));
            }
        }
        _ => {
            if let Some(client) = &view.client {
                out.push_str(&format!("Client:   {}\n", client.label()));
            }
            out.push_str(&format!("Method:   {}\n", view.method.label()));
            let locked = if view.tender_locked { " (card: exact total)" } else { "" };
            out.push_str(&format!("Tendered: {}{locked}\n", view.tendered));
            out.push_str(&format!("Change:   {}\n", view.change));
            if !view.note.is_empty() {
                out.push_str(&format!("Note:     {}\n", view.note));
            }
        }
    }

    if let Some(err) = &view.last_error {
        out.push_str(&format!("! {err}\n"));
    }
    out
}

pub fn receipt(receipt: &Receipt) -> String {
    receipt.to_text()
}

pub fn sale(outcome: &SaleOutcome) -> String {
    let mut out = String::from("Sale completed.\n\n");
    out.push_str(&receipt(&outcome.receipt));
    match (&outcome.files, &outcome.export_error) {
        (Some(files), _) => out.push_str(&format!(
            "\nSaved {} and {}\n",
            files.text_path.display(),
            files.html_path.display()
        )),
        (None, Some(err)) => out.push_str(&format!("\n! {err}\n")),
        (None, None) => {}
    }
    out
}

pub fn clients(clients: &[Client]) -> String {
    if clients.is_empty() {
        return "No clients found.\n".to_string();
    }
    let rows: Vec<Vec<String>> = clients
        .iter()
        .map(|c| {
            vec![
                c.id.clone(),
                c.name.clone(),
                dash(c.document_number.as_deref()).to_string(),
            ]
        })
        .collect();
    table(
        &[("Id", Align::Left), ("Nombre", Align::Left), ("CI", Align::Left)],
        &rows,
    )
}

pub fn invoices(invoices: &[InvoiceSummary]) -> String {
    if invoices.is_empty() {
        return "No invoices yet.\n".to_string();
    }
    let rows: Vec<Vec<String>> = invoices
        .iter()
        .map(|inv| {
            vec![
                inv.display_id.clone(),
                dash(inv.issued_at.as_deref()).to_string(),
                dash(inv.client_label.as_deref()).to_string(),
                inv.total.map(|t| t.to_string()).unwrap_or_else(|| "-".into()),
            ]
        })
        .collect();
    table(
        &[
            ("Factura", Align::Left),
            ("Fecha", Align::Left),
            ("Cliente", Align::Left),
            ("Total", Align::Right),
        ],
        &rows,
    )
}

pub fn invoice_detail(detail: &InvoiceDetail) -> String {
    let mut out = format!("Factura {}\n", detail.id);
    out.push_str(&format!("Fecha:    {}\n", dash(detail.issued_at.as_deref())));
    out.push_str(&format!("Vendedor: {}\n", dash(detail.seller.as_deref())));
    out.push_str(&format!("Cliente:  {}\n", dash(detail.client_name.as_deref())));

    let rows: Vec<Vec<String>> = detail
        .lines
        .iter()
        .map(|l| {
            vec![
                l.product_name.clone(),
                l.quantity.to_string(),
                l.unit_price.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
                l.subtotal.to_string(),
            ]
        })
        .collect();
    out.push_str(&table(
        &[
            ("Producto", Align::Left),
            ("Cant.", Align::Right),
            ("Precio", Align::Right),
            ("Subtotal", Align::Right),
        ],
        &rows,
    ));
    out.push_str(&format!("Total:    {}\n", detail.total()));
    if let Some(tendered) = detail.tendered {
        out.push_str(&format!("Recibido: {tendered}\n"));
    }
    if let Some(change) = detail.change {
        out.push_str(&format!("Cambio:   {change}\n"));
    }
    if let Some(note) = detail.note.as_deref().filter(|n| !n.is_empty()) {
        out.push_str(&format!("Nota:     {note}\n"));
    }
    out
}

fn role_cell(role: &farma_core::Role) -> String {
    if role.name().is_empty() {
        "-".to_string()
    } else {
        role.to_string()
    }
}

pub fn users(users: &[UserAccount]) -> String {
    if users.is_empty() {
        return "No users.\n".to_string();
    }
    let rows: Vec<Vec<String>> = users
        .iter()
        .map(|u| {
            vec![
                u.id.clone(),
                u.name.clone(),
                dash(u.username.as_deref()).to_string(),
                dash(u.email.as_deref()).to_string(),
                role_cell(&u.role),
            ]
        })
        .collect();
    table(
        &[
            ("Id", Align::Left),
            ("Nombre", Align::Left),
            ("Usuario", Align::Left),
            ("Email", Align::Left),
            ("Rol", Align::Left),
        ],
        &rows,
    )
}

pub fn user_detail(user: &UserAccount) -> String {
    format!(
        "{} (id {})\n  Usuario:    {}\n  Email:      {}\n  Rol:        {}\n",
        user.name,
        user.id,
        dash(user.username.as_deref()),
        dash(user.email.as_deref()),
        role_cell(&user.role)
    )
}

pub fn suppliers(suppliers: &[Supplier]) -> String {
    if suppliers.is_empty() {
        return "No suppliers.\n".to_string();
    }
    let rows: Vec<Vec<String>> = suppliers
        .iter()
        .map(|s| {
            vec![
                s.id.clone(),
                s.name.clone(),
                dash(s.contact.as_deref()).to_string(),
                dash(s.phone.as_deref()).to_string(),
            ]
        })
        .collect();
    table(
        &[
            ("Id", Align::Left),
            ("Proveedor", Align::Left),
            ("Contacto", Align::Left),
            ("Teléfono", Align::Left),
        ],
        &rows,
    )
}

pub fn purchases(purchases: &[PurchaseSummary]) -> String {
    if purchases.is_empty() {
        return "No purchases yet.\n".to_string();
    }
    let rows: Vec<Vec<String>> = purchases
        .iter()
        .map(|p| {
            vec![
                p.id.clone(),
                dash(p.issued_at.as_deref()).to_string(),
                p.supplier_name
                    .as_deref()
                    .or(p.supplier_id.as_deref())
                    .unwrap_or("-")
                    .to_string(),
                p.item_count.to_string(),
                p.total.map(|t| t.to_string()).unwrap_or_else(|| "-".into()),
            ]
        })
        .collect();
    table(
        &[
            ("Compra", Align::Left),
            ("Fecha", Align::Left),
            ("Proveedor", Align::Left),
            ("Items", Align::Right),
            ("Total", Align::Right),
        ],
        &rows,
    )
}

pub fn purchase(receipt: &PurchaseReceipt) -> String {
    let mut out = format!("Purchase {} registered.\n", receipt.id);
    for (name, units) in &receipt.lines {
        out.push_str(&format!("  +{units:<5} {name}\n"));
    }
    out.push_str(&format!(
        "{} units · TOTAL {}\n",
        receipt.draft.total_quantity(),
        receipt.draft.total
    ));
    out
}

pub fn settings(config: &TerminalConfig) -> String {
    let receipts = config.receipts_dir();
    format!(
        "Backend:   {} (timeout {}s, search limit {})\n\
         Store:     {} (branch {})\n\
         Receipts:  {}{}\n",
        config.backend.base_url,
        config.backend.timeout_secs,
        config.backend.search_limit,
        config.store.name,
        config.store.branch_id,
        receipts.display(),
        if config.receipts.open_in_browser {
            " (opened in browser)"
        } else {
            ""
        }
    )
}

pub fn help(route: &Route) -> String {
    let mut out = String::from(
        "General:  #/<route> | go <#/route> | login <user> <pass> [--remember] | logout | whoami | help | quit\n\
         Products: products [term] | product <id> | pnew code;name;price[;stock[;generic[;action[;barcode]]]]\n\
         \x20         pedit <id> <fields> | pdel <id>\n\
         Clients:  clients [name] | cnew <CI> <name>\n\
         Invoices: invoices | invoice <id>\n\
         Compras:  purchases | suppliers | snew name[;contact[;phone]]\n\
         \x20         buy [prov=<id>] <product id>:<qty>[:<cost>] ... [total=<amount>]\n",
    );
    if matches!(route, Route::Usuarios) {
        out.push_str(
            "Users:    users | user <id> | unew name;username;email;rol;password\n\
             \x20         uedit <id> name;username;email;rol[;password] | udel <id>\n",
        );
    }
    if route.is_sales() {
        out.push_str(
            "Sales:    search <term> | add <result #|@id> [qty] | qty <line> <n> | rm <line> | cart | clear\n\
             \x20         client <CI>|none | checkout | receipt\n\
             Payment:  ci <CI> | newclient <name> | changeclient | pay cash|card | tender <amount>\n\
             \x20         note <text> | confirm | cancel\n",
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_products;

    #[test]
    fn test_sold_out_products_are_marked() {
        let out = products(&sample_products());
        assert!(out.contains("Paracetamol 500mg"));
        assert!(out.contains("Agotado"));
        assert_eq!(out.lines().count(), 3 + 1 + 2);
    }

    #[test]
    fn test_table_aligns_columns() {
        let out = table(
            &[("A", Align::Left), ("B", Align::Right)],
            &[vec!["xyz".into(), "1".into()]],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[1], "│ A   │ B │");
        assert_eq!(lines[3], "│ xyz │ 1 │");
    }

    #[test]
    fn test_fractional_stock() {
        assert_eq!(stock_cell(0.5), "Agotado");
        assert_eq!(stock_cell(2.5), "2.50");
        assert_eq!(stock_cell(3.0), "3");
    }

    #[test]
    fn test_sales_help_only_in_sales_view() {
        assert!(help(&Route::Ventas).contains("confirm"));
        assert!(!help(&Route::Inicio).contains("confirm"));
    }

    #[test]
    fn test_purchases_fall_back_to_supplier_id() {
        let out = purchases(&[PurchaseSummary {
            id: "c9".into(),
            supplier_id: Some("p7".into()),
            supplier_name: None,
            item_count: 2,
            total: None,
            issued_at: None,
        }]);
        assert!(out.contains("│ c9 "));
        assert!(out.contains("│ p7 "));
    }

    #[test]
    fn test_user_help_only_in_user_view() {
        assert!(help(&Route::Usuarios).contains("udel <id>"));
        assert!(!help(&Route::Inicio).contains("udel"));
        assert!(help(&Route::Inicio).contains("buy [prov=<id>]"));
    }
}
