//! Verification payload printed as a QR code on each invoice.

use crate::error::DocumentError;
use base64::{engine::general_purpose, Engine as _};
use image::{DynamicImage, Luma};
use nexus_core::models::{Client, Invoice, SellerSettings};
use qrcode::{Color, QrCode};
use serde::Serialize;
use std::io::Cursor;

const MISSING: &str = "N/A";

/// The four fields a scanner needs to look an invoice up. Key order on the
/// wire is fixed by field order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QrPayload {
    #[serde(rename = "buyerNTN")]
    pub buyer_ntn: String,
    #[serde(rename = "sellerNTN")]
    pub seller_ntn: String,
    #[serde(rename = "invoiceDate")]
    pub invoice_date: String,
    #[serde(rename = "invoiceNumber")]
    pub invoice_number: String,
}

fn or_missing(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => MISSING.to_string(),
    }
}

impl QrPayload {
    pub fn new(
        invoice: &Invoice,
        buyer: Option<&Client>,
        seller: Option<&SellerSettings>,
    ) -> Self {
        Self {
            buyer_ntn: or_missing(buyer.and_then(|b| b.buyer_ntn.as_deref())),
            seller_ntn: or_missing(seller.and_then(|s| s.seller_ntn.as_deref())),
            invoice_date: invoice
                .invoice_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| MISSING.to_string()),
            invoice_number: or_missing(invoice.invoice_number.as_deref()),
        }
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        serde_json::to_string(self).map_err(|e| DocumentError::QrEncoding(e.to_string()))
    }

    pub fn matrix(&self) -> Result<QrMatrix, DocumentError> {
        QrMatrix::encode(&self.to_json()?)
    }

    /// PNG rendering, base64 encoded, for clients that display the code on
    /// screen.
    pub fn png_base64(&self) -> Result<String, DocumentError> {
        let code = QrCode::new(self.to_json()?.as_bytes())
            .map_err(|e| DocumentError::QrEncoding(e.to_string()))?;
        let image = code.render::<Luma<u8>>().build();

        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(image)
            .write_to(&mut buffer, image::ImageOutputFormat::Png)
            .map_err(|e| DocumentError::QrEncoding(e.to_string()))?;

        Ok(general_purpose::STANDARD.encode(buffer.get_ref()))
    }
}

/// Square grid of QR modules, row-major, `true` for dark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrMatrix {
    width: usize,
    modules: Vec<bool>,
}

impl QrMatrix {
    pub fn encode(data: &str) -> Result<Self, DocumentError> {
        let code =
            QrCode::new(data.as_bytes()).map_err(|e| DocumentError::QrEncoding(e.to_string()))?;
        let modules = code
            .to_colors()
            .into_iter()
            .map(|c| c == Color::Dark)
            .collect();

        Ok(Self {
            width: code.width(),
            modules,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.width && self.modules[y * self.width + x]
    }

    /// Horizontal runs of dark modules in row `y` as `(start, len)`.
    pub fn dark_runs(&self, y: usize) -> Vec<(usize, usize)> {
        let mut runs = Vec::new();
        let mut start = None;

        for x in 0..=self.width {
            match (self.is_dark(x, y), start) {
                (true, None) => start = Some(x),
                (false, Some(s)) => {
                    runs.push((s, x - s));
                    start = None;
                }
                _ => {}
            }
        }

        runs
    }
}
