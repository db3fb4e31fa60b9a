//! Spreadsheet export.
//!
//! One builder serves every export: a row type plus an ordered list of
//! [`Column`]s. Fields are always quoted with inner quotes doubled, the output
//! starts with a UTF-8 byte order mark, and lines end in CRLF.

use chrono::NaiveDate;
use nexus_core::models::money::{format_amount, format_quantity};
use nexus_core::models::{Client, FbrSubmission, Invoice, LineItem};
use serde::{Deserialize, Serialize};

pub const BOM: char = '\u{feff}';
pub const LINE_END: &str = "\r\n";

pub struct Column<T> {
    pub header: &'static str,
    pub extract: fn(&T) -> String,
}

impl<T> Column<T> {
    pub const fn new(header: &'static str, extract: fn(&T) -> String) -> Self {
        Self { header, extract }
    }
}

pub fn escape_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn join_line<'a>(fields: impl Iterator<Item = &'a str>) -> String {
    fields.map(escape_field).collect::<Vec<_>>().join(",")
}

/// Header line followed by one line per row.
pub fn build_csv<T>(rows: &[T], columns: &[Column<T>]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(join_line(columns.iter().map(|c| c.header)));

    for row in rows {
        let values: Vec<String> = columns.iter().map(|c| (c.extract)(row)).collect();
        lines.push(join_line(values.iter().map(String::as_str)));
    }

    let mut out = String::from(BOM);
    out.push_str(&lines.join(LINE_END));
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Invoices,
    Clients,
    Fbr,
}

impl ExportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::Invoices => "invoices",
            ExportKind::Clients => "clients",
            ExportKind::Fbr => "fbr",
        }
    }

    pub fn filename(&self, date: NaiveDate) -> String {
        format!("{}_export_{}.csv", self.as_str(), date.format("%Y-%m-%d"))
    }
}

/// An invoice joined with its buyer and FBR submission, when known.
pub struct InvoiceExportRow<'a> {
    pub invoice: &'a Invoice,
    pub client: Option<&'a Client>,
    pub fbr: Option<&'a FbrSubmission>,
}

type Row<'a> = InvoiceExportRow<'a>;

fn opt(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

fn joined<F>(invoice: &Invoice, field: F) -> String
where
    F: Fn(&LineItem) -> String,
{
    invoice
        .line_items()
        .iter()
        .map(field)
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn invoice_columns<'a>() -> Vec<Column<Row<'a>>> {
    vec![
        Column::new("Invoice Number", |r: &Row<'a>| r.invoice.display_number()),
        Column::new("Client", |r: &Row<'a>| opt(r.client.map(|c| c.company_name.as_str()))),
        Column::new("Buyer NTN", |r: &Row<'a>| opt(r.client.and_then(|c| c.buyer_ntn.as_deref()))),
        Column::new("Products", |r: &Row<'a>| joined(r.invoice, |i| i.description.clone())),
        Column::new("HS Codes", |r: &Row<'a>| {
            joined(r.invoice, |i| i.hs_code.clone().unwrap_or_default())
        }),
        Column::new("Quantities", |r: &Row<'a>| joined(r.invoice, |i| format_quantity(i.quantity))),
        Column::new("Total Value", |r: &Row<'a>| format_amount(r.invoice.totals.total_value)),
        Column::new("Sales Tax", |r: &Row<'a>| format_amount(r.invoice.totals.sales_tax)),
        Column::new("Extra Tax", |r: &Row<'a>| format_amount(r.invoice.totals.extra_tax)),
        Column::new("Discount", |r: &Row<'a>| format_amount(r.invoice.totals.discount)),
        Column::new("Final Value", |r: &Row<'a>| format_amount(r.invoice.totals.final_value)),
        Column::new("Invoice Date", |r: &Row<'a>| {
            r.invoice
                .invoice_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default()
        }),
        Column::new("Status", |r: &Row<'a>| r.invoice.status.as_str().to_string()),
        Column::new("FBR Status", |r: &Row<'a>| {
            r.fbr.map(|f| f.status.as_str().to_string()).unwrap_or_default()
        }),
        Column::new("FBR Reference", |r: &Row<'a>| {
            opt(r.fbr.and_then(|f| f.irn.as_deref().or(f.uuid.as_deref())))
        }),
    ]
}

pub fn client_columns() -> Vec<Column<Client>> {
    vec![
        Column::new("Company Name", |c: &Client| c.company_name.clone()),
        Column::new("Buyer NTN", |c: &Client| opt(c.buyer_ntn.as_deref())),
        Column::new("Buyer STRN", |c: &Client| opt(c.buyer_strn.as_deref())),
        Column::new("Address", |c: &Client| opt(c.address.as_deref())),
        Column::new("Phone", |c: &Client| opt(c.phone.as_deref())),
        Column::new("Email", |c: &Client| opt(c.email.as_deref())),
        Column::new("Province", |c: &Client| opt(c.province.as_deref())),
        Column::new("Registration Type", |c: &Client| opt(c.registration_type.as_deref())),
        Column::new("Created At", |c: &Client| c.created_at.format("%Y-%m-%d").to_string()),
    ]
}

pub fn fbr_columns() -> Vec<Column<FbrSubmission>> {
    vec![
        Column::new("Invoice Number", |f: &FbrSubmission| opt(f.invoice_number.as_deref())),
        Column::new("Status", |f: &FbrSubmission| f.status.as_str().to_string()),
        Column::new("IRN", |f: &FbrSubmission| opt(f.irn.as_deref())),
        Column::new("UUID", |f: &FbrSubmission| opt(f.uuid.as_deref())),
        Column::new("Submitted At", |f: &FbrSubmission| {
            f.submitted_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_default()
        }),
        Column::new("Error", |f: &FbrSubmission| opt(f.error_message.as_deref())),
        Column::new("Created At", |f: &FbrSubmission| f.created_at.format("%Y-%m-%d").to_string()),
    ]
}
