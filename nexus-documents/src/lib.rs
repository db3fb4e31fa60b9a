//! nexus-documents: invoice documents as pure functions.
//!
//! Everything here takes records in and hands bytes or strings back; nothing
//! touches the network, the clock or global state.
pub mod csv;
pub mod error;
pub mod pdf;
pub mod qr;

pub use csv::{build_csv, Column, ExportKind, InvoiceExportRow};
pub use error::DocumentError;
pub use pdf::{invoice_filename, render_invoice, InvoiceSheet, RenderedInvoice};
pub use qr::{QrMatrix, QrPayload};
