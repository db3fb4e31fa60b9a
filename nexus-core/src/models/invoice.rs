use super::money::{percent_of, round2};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Pending,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }
}

/// HS codes are written `NNNN.NN.NN`.
pub fn validate_hs_code(code: &str) -> Result<(), ValidationError> {
    let groups: Vec<&str> = code.split('.').collect();
    let well_formed = groups.len() == 3
        && groups
            .iter()
            .zip([4usize, 2, 2])
            .all(|(g, len)| g.len() == len && g.chars().all(|c| c.is_ascii_digit()));

    if well_formed {
        Ok(())
    } else {
        let mut err = ValidationError::new("hs_code");
        err.message = Some("HS code must look like NNNN.NN.NN".into());
        Err(err)
    }
}

/// A priced invoice line as stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineItem {
    pub description: String,
    pub hs_code: Option<String>,
    pub uom: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_value: Decimal,
    pub sales_tax: Decimal,
    pub extra_tax: Decimal,
    pub final_value: Decimal,
}

/// A line as entered on a form. Anything missing counts as zero; sales tax is
/// derived from a rate unless given explicitly.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    #[serde(default, alias = "product")]
    #[validate(length(max = 256, message = "Description is too long"))]
    pub description: String,
    #[validate(custom(function = "validate_hs_code"))]
    pub hs_code: Option<String>,
    pub uom: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub sales_tax: Option<Decimal>,
    pub sales_tax_rate: Option<Decimal>,
    pub extra_tax: Option<Decimal>,
}

impl LineItemInput {
    /// Price the line. Rate precedence: explicit tax, the line's own rate,
    /// then `default_rate`.
    pub fn price(&self, default_rate: Decimal) -> LineItem {
        let quantity = self.quantity.unwrap_or_default();
        let unit_price = self.unit_price.unwrap_or_default();
        let total_value = round2(quantity * unit_price);
        let sales_tax = match self.sales_tax {
            Some(tax) => round2(tax),
            None => percent_of(total_value, self.sales_tax_rate.unwrap_or(default_rate)),
        };
        let extra_tax = round2(self.extra_tax.unwrap_or_default());

        LineItem {
            description: self.description.trim().to_string(),
            hs_code: self.hs_code.clone(),
            uom: self.uom.clone(),
            quantity,
            unit_price,
            total_value,
            sales_tax,
            extra_tax,
            final_value: total_value + sales_tax + extra_tax,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvoiceTotals {
    pub total_value: Decimal,
    pub sales_tax: Decimal,
    pub extra_tax: Decimal,
    pub discount: Decimal,
    pub final_value: Decimal,
}

impl InvoiceTotals {
    /// `final = total + sales tax + extra tax - discount`, at two places.
    pub fn from_items(items: &[LineItem], discount: Decimal) -> Self {
        let total_value = round2(items.iter().map(|i| i.total_value).sum());
        let sales_tax = round2(items.iter().map(|i| i.sales_tax).sum());
        let extra_tax = round2(items.iter().map(|i| i.extra_tax).sum());
        let discount = round2(discount);

        Self {
            total_value,
            sales_tax,
            extra_tax,
            discount,
            final_value: total_value + sales_tax + extra_tax - discount,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Invoice {
    #[serde(rename = "_id")]
    pub id: String,
    pub seller_id: String,
    pub invoice_number: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub client_id: Option<String>,
    pub items: Vec<LineItem>,
    /// Single-product fields from records that predate itemised invoices.
    pub product: Option<String>,
    pub hs_code: Option<String>,
    pub units: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    #[serde(flatten)]
    pub totals: InvoiceTotals,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// The invoice's lines, or one line synthesised from the flat fields when
    /// the record carries none. Never empty.
    pub fn line_items(&self) -> Cow<'_, [LineItem]> {
        if !self.items.is_empty() {
            return Cow::Borrowed(&self.items);
        }

        let quantity = self.units.unwrap_or_default();
        let unit_price = self.unit_price.unwrap_or_default();
        let total_value = if self.totals.total_value.is_zero() {
            round2(quantity * unit_price)
        } else {
            self.totals.total_value
        };
        let sales_tax = self.totals.sales_tax;
        let extra_tax = self.totals.extra_tax;

        Cow::Owned(vec![LineItem {
            description: self.product.clone().unwrap_or_default(),
            hs_code: self.hs_code.clone(),
            uom: None,
            quantity,
            unit_price,
            total_value,
            sales_tax,
            extra_tax,
            final_value: total_value + sales_tax + extra_tax,
        }])
    }

    pub fn recompute_totals(&mut self) {
        let discount = self.totals.discount;
        self.totals = InvoiceTotals::from_items(&self.line_items(), discount);
    }

    /// Invoice number, or the last six characters of the id.
    pub fn display_number(&self) -> String {
        match self.invoice_number.as_deref().map(str::trim) {
            Some(number) if !number.is_empty() => number.to_string(),
            _ => {
                let chars: Vec<char> = self.id.chars().collect();
                let start = chars.len().saturating_sub(6);
                chars[start..].iter().collect()
            }
        }
    }
}
