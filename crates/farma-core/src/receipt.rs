//! # Receipt
//!
//! The payment receipt (`comprobante`) shown after a sale, exported as a
//! plain text file and as a standalone HTML page for printing.
//!
//! ## Field Sources
//! ```text
//! ┌────────────────┬──────────────────────────────────────────────────────┐
//! │ Field          │ Source                                               │
//! ├────────────────┼──────────────────────────────────────────────────────┤
//! │ ID             │ numero | seq | short_id | display_id | id | _id      │
//! │ Fecha          │ server `fecha`, else local time at confirmation      │
//! │ Vendedor       │ server `vendedor_nombre`, else session user          │
//! │ Cliente        │ client chosen during checkout, else "-"              │
//! │ Lines          │ cart snapshot taken at submission                    │
//! │ Total          │ server `total`, else sum of line subtotals           │
//! │ Recibido/Cambio│ server values, else what was submitted               │
//! └────────────────┴──────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::checkout::InvoiceDraft;
use crate::money::Money;
use crate::types::CreatedInvoice;

/// Seller label when neither the server nor the session names one.
pub const DEFAULT_SELLER: &str = "Vendedor";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Receipt {
    pub display_id: String,
    pub issued_at: String,
    pub seller: String,
    pub client_label: Option<String>,
    pub lines: Vec<ReceiptLine>,
    pub total: Money,
    pub tendered: Money,
    pub change: Money,
    pub note: String,
}

/// Values the caller supplies when the server response leaves them out.
#[derive(Debug, Clone, Default)]
pub struct ReceiptFallbacks<'a> {
    pub display_id: &'a str,
    pub seller: Option<&'a str>,
    pub issued_at: &'a str,
}

impl Receipt {
    /// Merges the server response with the submitted sale.
    pub fn build(
        created: &CreatedInvoice,
        draft: &InvoiceDraft,
        lines: Vec<ReceiptLine>,
        client_label: Option<String>,
        fallbacks: ReceiptFallbacks<'_>,
    ) -> Receipt {
        let line_total: Money = lines.iter().map(|l| l.subtotal).sum();

        Receipt {
            display_id: created
                .display_id
                .clone()
                .or_else(|| created.id.clone())
                .unwrap_or_else(|| fallbacks.display_id.to_string()),
            issued_at: created
                .issued_at
                .clone()
                .unwrap_or_else(|| fallbacks.issued_at.to_string()),
            seller: created
                .seller_name
                .clone()
                .or_else(|| fallbacks.seller.map(str::to_string))
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SELLER.to_string()),
            client_label: client_label.filter(|c| !c.trim().is_empty()),
            lines,
            total: created.total.unwrap_or(line_total),
            tendered: created.tendered.unwrap_or(draft.tendered),
            change: created.change.unwrap_or(draft.change),
            note: created.note.clone().unwrap_or_else(|| draft.note.clone()),
        }
    }

    /// Tab separated plain text.
    ///
    /// ```text
    /// Comprobante ID: 1042
    /// Fecha: 16/10/2026 10:31
    /// Vendedor: Laura
    /// Cliente: Ana Pérez (1234567)
    ///
    /// Producto        Cant.   Precio  Subtotal
    /// Paracetamol     2       3.50    7.00
    ///
    /// Total: $7.00
    /// Recibido: $10.00
    /// Cambio: $3.00
    /// Nota:
    /// ```
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Comprobante ID: {}\n", self.display_id));
        out.push_str(&format!("Fecha: {}\n", self.issued_at));
        out.push_str(&format!("Vendedor: {}\n", self.seller));
        out.push_str(&format!("Cliente: {}\n\n", self.client_or_dash()));
        out.push_str("Producto\tCant.\tPrecio\tSubtotal\n");
        for line in &self.lines {
            out.push_str(&format!(
                "{}\t{}\t{}\t{}\n",
                line.name,
                line.quantity,
                line.unit_price.plain(),
                line.subtotal.plain()
            ));
        }
        out.push_str(&format!("\nTotal: {}\n", self.total));
        out.push_str(&format!("Recibido: {}\n", self.tendered));
        out.push_str(&format!("Cambio: {}\n", self.change));
        out.push_str(&format!("Nota: {}\n", self.note));
        out
    }

    /// Standalone, print-friendly HTML document. Every value is escaped.
    pub fn to_html(&self, store_name: &str) -> String {
        let rows: String = self
            .lines
            .iter()
            .map(|line| {
                format!(
                    "<tr><td>{}</td><td class=\"c\">{}</td><td class=\"r\">{}</td><td class=\"r\">{}</td></tr>",
                    escape_html(&line.name),
                    line.quantity,
                    line.unit_price,
                    line.subtotal
                )
            })
            .collect();

        let header = if store_name.trim().is_empty() {
            String::new()
        } else {
            format!("<h1>{}</h1>", escape_html(store_name))
        };

        format!(
            concat!(
                "<!doctype html><html><head><meta charset=\"utf-8\">",
                "<title>Comprobante {id}</title>",
                "<style>body{{font-family:Arial,Helvetica,sans-serif;padding:20px}}",
                "table{{width:100%;border-collapse:collapse}}",
                "th,td{{padding:6px;border-bottom:1px solid #ddd}}",
                ".c{{text-align:center}}.r{{text-align:right}}</style></head><body>",
                "{header}<h2>Comprobante de pago</h2>",
                "<div><strong>ID:</strong> {id}</div>",
                "<div><strong>Fecha:</strong> {date}</div>",
                "<div><strong>Vendedor:</strong> {seller}</div>",
                "<div><strong>Cliente:</strong> {client}</div>",
                "<table><thead><tr><th>Producto</th><th>Cant.</th><th>Precio</th><th>Subtotal</th></tr></thead>",
                "<tbody>{rows}</tbody></table>",
                "<div class=\"r\"><strong>Total: {total}</strong></div>",
                "<div><strong>Recibido:</strong> {tendered}</div>",
                "<div><strong>Cambio:</strong> {change}</div>",
                "<div><strong>Nota:</strong> {note}</div>",
                "</body></html>"
            ),
            header = header,
            id = escape_html(&self.display_id),
            date = escape_html(&self.issued_at),
            seller = escape_html(&self.seller),
            client = escape_html(self.client_or_dash()),
            rows = rows,
            total = self.total,
            tendered = self.tendered,
            change = self.change,
            note = escape_html(&self.note),
        )
    }

    /// `comprobante_<id>.txt`
    pub fn text_file_name(&self) -> String {
        format!("comprobante_{}.txt", file_safe(&self.display_id))
    }

    /// `comprobante_<id>.html`
    pub fn html_file_name(&self) -> String {
        format!("comprobante_{}.html", file_safe(&self.display_id))
    }

    fn client_or_dash(&self) -> &str {
        self.client_label.as_deref().unwrap_or("-")
    }
}

/// Escapes text for inclusion in HTML element content or attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn file_safe(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> InvoiceDraft {
        InvoiceDraft {
            client_id: "7".into(),
            branch_id: 1,
            items: Vec::new(),
            total: Money::from_cents(700),
            tendered: Money::from_cents(1000),
            change: Money::from_cents(300),
            note: "sin bolsa".into(),
        }
    }

    fn lines() -> Vec<ReceiptLine> {
        vec![ReceiptLine {
            name: "Paracetamol".into(),
            quantity: 2,
            unit_price: Money::from_cents(350),
            subtotal: Money::from_cents(700),
        }]
    }

    fn fallbacks() -> ReceiptFallbacks<'static> {
        ReceiptFallbacks {
            display_id: "a1b2c3d4",
            seller: Some("Laura"),
            issued_at: "16/10/2026 10:31",
        }
    }

    #[test]
    fn test_build_prefers_server_fields() {
        let created = CreatedInvoice {
            id: Some("65f1".into()),
            display_id: Some("1042".into()),
            seller_name: Some("Marta".into()),
            total: Some(Money::from_cents(750)),
            ..Default::default()
        };

        let receipt = Receipt::build(&created, &draft(), lines(), None, fallbacks());

        assert_eq!(receipt.display_id, "1042");
        assert_eq!(receipt.seller, "Marta");
        assert_eq!(receipt.total, Money::from_cents(750));
        assert_eq!(receipt.tendered, Money::from_cents(1000));
        assert_eq!(receipt.issued_at, "16/10/2026 10:31");
    }

    #[test]
    fn test_build_falls_back() {
        let receipt = Receipt::build(
            &CreatedInvoice::default(),
            &draft(),
            lines(),
            Some(" ".into()),
            ReceiptFallbacks {
                seller: None,
                ..fallbacks()
            },
        );

        assert_eq!(receipt.display_id, "a1b2c3d4");
        assert_eq!(receipt.seller, DEFAULT_SELLER);
        assert_eq!(receipt.total, Money::from_cents(700));
        assert_eq!(receipt.client_label, None);
    }

    #[test]
    fn test_text_layout() {
        let created = CreatedInvoice {
            id: Some("1042".into()),
            ..Default::default()
        };
        let receipt = Receipt::build(
            &created,
            &draft(),
            lines(),
            Some("Ana Pérez (1234567)".into()),
            fallbacks(),
        );

        let expected = "Comprobante ID: 1042\n\
                        Fecha: 16/10/2026 10:31\n\
                        Vendedor: Laura\n\
                        Cliente: Ana Pérez (1234567)\n\
                        \n\
                        Producto\tCant.\tPrecio\tSubtotal\n\
                        Paracetamol\t2\t3.50\t7.00\n\
                        \n\
                        Total: $7.00\n\
                        Recibido: $10.00\n\
                        Cambio: $3.00\n\
                        Nota: sin bolsa\n";
        assert_eq!(receipt.to_text(), expected);
        assert_eq!(receipt.text_file_name(), "comprobante_1042.txt");
    }

    #[test]
    fn test_html_is_escaped() {
        let mut bad_lines = lines();
        bad_lines[0].name = "<script>alert(1)</script>".into();
        let receipt = Receipt::build(
            &CreatedInvoice::default(),
            &draft(),
            bad_lines,
            None,
            fallbacks(),
        );

        let html = receipt.to_html("Farmacia & Co");
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("<h1>Farmacia &amp; Co</h1>"));
        assert!(html.contains("<strong>Cliente:</strong> -"));
    }

    #[test]
    fn test_file_name_is_sanitized() {
        let created = CreatedInvoice {
            display_id: Some("F/001 2".into()),
            ..Default::default()
        };
        let receipt = Receipt::build(&created, &draft(), lines(), None, fallbacks());
        assert_eq!(receipt.html_file_name(), "comprobante_F_001_2.html");
    }
}
