//! # Receipt Export
//!
//! Writes each completed sale's receipt next to the terminal as plain text
//! and as a small printable HTML page, then optionally opens the page in
//! the system browser for printing.
//!
//! ```text
//! receipts/
//! ├── comprobante_F-1042.txt    ◄── Receipt::to_text
//! └── comprobante_F-1042.html   ◄── Receipt::to_html(store name)
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use farma_core::Receipt;
use tracing::{debug, info, warn};

use crate::config::TerminalConfig;

/// Where a receipt was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedReceipt {
    pub text_path: PathBuf,
    pub html_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ReceiptExporter {
    dir: PathBuf,
    store_name: String,
    open_in_browser: bool,
}

impl ReceiptExporter {
    pub fn new(dir: impl Into<PathBuf>, store_name: impl Into<String>, open_in_browser: bool) -> Self {
        ReceiptExporter {
            dir: dir.into(),
            store_name: store_name.into(),
            open_in_browser,
        }
    }

    pub fn from_config(config: &TerminalConfig) -> Self {
        ReceiptExporter::new(
            config.receipts_dir(),
            config.store.name.clone(),
            config.receipts.open_in_browser,
        )
    }

    /// Writes both files, creating the directory on first use.
    ///
    /// A browser that fails to open is logged and otherwise ignored; the
    /// files are already on disk.
    pub fn export(&self, receipt: &Receipt) -> std::io::Result<ExportedReceipt> {
        fs::create_dir_all(&self.dir)?;

        let text_path = self.dir.join(receipt.text_file_name());
        fs::write(&text_path, receipt.to_text())?;

        let html_path = self.dir.join(receipt.html_file_name());
        fs::write(&html_path, receipt.to_html(&self.store_name))?;

        info!(
            receipt = %receipt.display_id,
            path = %text_path.display(),
            "Receipt exported"
        );

        if self.open_in_browser {
            open_in_browser(&html_path);
        }

        Ok(ExportedReceipt {
            text_path,
            html_path,
        })
    }
}

fn open_in_browser(path: &Path) {
    let target = path.to_string_lossy();
    debug!(path = %target, "Opening receipt in browser");
    if let Err(e) = webbrowser::open(&target) {
        warn!(error = %e, path = %target, "Could not open receipt in browser");
    }
}
