use super::{clean, validate_non_negative};
use chrono::NaiveDate;
use nexus_core::models::{
    validate_hs_code, Client, Invoice, InvoiceStatus, LineItemInput, SellerSettings,
};
use nexus_documents::ExportKind;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of `POST /api/invoices`. Either `items` or the flat single-product
/// fields must be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    #[validate(length(max = 64))]
    pub invoice_number: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub client_id: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<LineItemInput>,
    #[validate(length(max = 256))]
    pub product: Option<String>,
    #[validate(custom(function = "validate_hs_code"))]
    pub hs_code: Option<String>,
    pub uom: Option<String>,
    #[serde(alias = "quantity")]
    #[validate(custom(function = "validate_non_negative"))]
    pub units: Option<Decimal>,
    #[validate(custom(function = "validate_non_negative"))]
    pub unit_price: Option<Decimal>,
    pub sales_tax: Option<Decimal>,
    pub extra_tax: Option<Decimal>,
    #[validate(custom(function = "validate_non_negative"))]
    pub discount: Option<Decimal>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub status: Option<InvoiceStatus>,
}

impl CreateInvoiceRequest {
    /// The request's lines; the flat fields become one line when `items` is
    /// empty. `None` when neither form carries anything.
    pub fn line_inputs(&self) -> Option<Vec<LineItemInput>> {
        if !self.items.is_empty() {
            return Some(self.items.clone());
        }

        let product = clean(self.product.clone());
        if product.is_none() && self.units.is_none() && self.unit_price.is_none() {
            return None;
        }

        Some(vec![LineItemInput {
            description: product.unwrap_or_default(),
            hs_code: clean(self.hs_code.clone()),
            uom: clean(self.uom.clone()),
            quantity: self.units,
            unit_price: self.unit_price,
            sales_tax: self.sales_tax,
            sales_tax_rate: None,
            extra_tax: self.extra_tax,
        }])
    }

    pub fn invoice_number(&self) -> Option<String> {
        clean(self.invoice_number.clone())
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StatusUpdate {
    pub status: InvoiceStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceListParams {
    pub status: Option<InvoiceStatus>,
    pub client_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct BulkInvoiceRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 500, message = "Between 1 and 500 invoices per upload"))]
    pub invoices: Vec<CreateInvoiceRequest>,
}

/// Body of `POST /api/documents/invoice-pdf`: render without storing.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RenderInvoiceRequest {
    pub invoice: Invoice,
    #[serde(default, alias = "client")]
    pub buyer: Option<Client>,
    #[serde(default)]
    pub seller: Option<SellerSettings>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportParams {
    #[serde(rename = "type")]
    pub kind: Option<ExportKind>,
}
