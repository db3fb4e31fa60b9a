//! Invoice creation shared by the single and bulk endpoints.

use super::metrics::record_invoice_created;
use super::store::Store;
use crate::dtos::invoices::CreateInvoiceRequest;
use chrono::Utc;
use nexus_core::error::AppError;
use nexus_core::models::{FbrStatus, FbrSubmission, Invoice, InvoiceTotals};
use uuid::Uuid;
use validator::Validate;

const DEFAULT_PREFIX: &str = "INV";
const NUMBER_ATTEMPTS: u32 = 8;

/// Price, number and store an invoice, then open its pending FBR record.
pub async fn create_invoice(
    store: &Store,
    seller_id: &str,
    request: CreateInvoiceRequest,
    source: &'static str,
) -> Result<Invoice, AppError> {
    request.validate()?;

    let seller = store.seller_settings(seller_id).await?;

    if let Some(client_id) = request.client_id.as_deref() {
        if store.clients.get(seller_id, client_id).await?.is_none() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Client {} does not exist",
                client_id
            )));
        }
    }

    let inputs = request.line_inputs().ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!("An invoice needs at least one line item"))
    })?;
    let items: Vec<_> = inputs
        .iter()
        .map(|line| line.price(seller.sales_tax_rate))
        .collect();

    let explicit_number = request.invoice_number();
    if let Some(number) = explicit_number.as_deref() {
        if number_taken(store, seller_id, number).await? {
            return Err(number_conflict(number));
        }
    }
    let prefix = seller.invoice_prefix.as_deref().unwrap_or(DEFAULT_PREFIX);

    let now = Utc::now();
    let first = items.first().cloned().unwrap_or_default();
    let totals = InvoiceTotals::from_items(&items, request.discount.unwrap_or_default());

    let mut invoice = Invoice {
        id: Uuid::new_v4().to_string(),
        seller_id: seller_id.to_string(),
        invoice_number: None,
        invoice_date: Some(request.invoice_date.unwrap_or_else(|| now.date_naive())),
        client_id: request.client_id.clone(),
        product: Some(first.description.clone()).filter(|p| !p.is_empty()),
        hs_code: first.hs_code.clone(),
        units: Some(first.quantity),
        unit_price: Some(first.unit_price),
        items,
        totals,
        status: request.status.unwrap_or_default(),
        notes: request.notes.clone(),
        created_at: now,
        updated_at: now,
    };

    // The store's unique index decides races between concurrent creates;
    // a generated number that lost one moves on to the next free number.
    let mut attempts = 0;
    loop {
        let number = match explicit_number.as_deref() {
            Some(number) => number.to_string(),
            None => next_invoice_number(store, seller_id, prefix).await?,
        };
        invoice.invoice_number = Some(number.clone());

        match store.invoices.insert(&invoice).await {
            Ok(()) => break,
            Err(AppError::Conflict(_)) if explicit_number.is_some() => {
                return Err(number_conflict(&number));
            }
            Err(AppError::Conflict(_)) if attempts < NUMBER_ATTEMPTS => {
                attempts += 1;
                tracing::debug!(invoice_number = %number, "Invoice number taken, retrying");
            }
            Err(err) => return Err(err),
        }
    }

    let submission = FbrSubmission {
        id: Uuid::new_v4().to_string(),
        seller_id: seller_id.to_string(),
        invoice_id: invoice.id.clone(),
        invoice_number: invoice.invoice_number.clone(),
        status: FbrStatus::Pending,
        created_at: now,
        updated_at: now,
        ..Default::default()
    };
    store.fbr_invoices.insert(&submission).await?;

    record_invoice_created(source);
    tracing::info!(
        invoice_id = %invoice.id,
        invoice_number = %invoice.display_number(),
        final_value = %invoice.totals.final_value,
        "Invoice created"
    );

    Ok(invoice)
}

fn number_conflict(number: &str) -> AppError {
    AppError::Conflict(anyhow::anyhow!("Invoice number {} already exists", number))
}

async fn number_taken(store: &Store, seller_id: &str, number: &str) -> Result<bool, AppError> {
    Ok(store
        .invoices
        .find_one(Some(seller_id), "invoiceNumber", number)
        .await?
        .is_some())
}

/// `{prefix}-{n:04}` where `n` starts after the seller's invoice count and
/// skips numbers already in use.
async fn next_invoice_number(
    store: &Store,
    seller_id: &str,
    prefix: &str,
) -> Result<String, AppError> {
    let mut n = store.invoices.list(seller_id).await?.len() + 1;
    loop {
        let candidate = format!("{}-{:04}", prefix, n);
        if !number_taken(store, seller_id, &candidate).await? {
            return Ok(candidate);
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::models::{Client, LineItemInput, SellerSettings};
    use rust_decimal::Decimal;

    async fn seeded() -> Store {
        let store = Store::in_memory();
        store
            .sellers
            .insert(&SellerSettings {
                id: "s1".into(),
                company_name: "HS Softworks".into(),
                invoice_prefix: Some("HSS".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        store
            .clients
            .insert(&Client {
                id: "c1".into(),
                seller_id: "s1".into(),
                company_name: "Acme Co".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        store
    }

    fn one_line() -> CreateInvoiceRequest {
        CreateInvoiceRequest {
            client_id: Some("c1".into()),
            items: vec![LineItemInput {
                description: "Tax Filing".into(),
                quantity: Some(Decimal::ONE),
                unit_price: Some(Decimal::new(5000, 0)),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn prices_with_seller_rate_and_opens_fbr_record() {
        let store = seeded().await;
        let invoice = create_invoice(&store, "s1", one_line(), "api").await.unwrap();

        assert_eq!(invoice.invoice_number.as_deref(), Some("HSS-0001"));
        assert_eq!(invoice.totals.sales_tax, Decimal::new(900, 0));
        assert_eq!(invoice.totals.final_value, Decimal::new(5900, 0));

        let fbr = store.fbr_invoices.list("s1").await.unwrap();
        assert_eq!(fbr.len(), 1);
        assert_eq!(fbr[0].invoice_id, invoice.id);
        assert_eq!(fbr[0].status, FbrStatus::Pending);
    }

    #[tokio::test]
    async fn concurrent_creates_with_one_number_store_one_invoice() {
        let store = seeded().await;
        let mut request = one_line();
        request.invoice_number = Some("INV-777".into());

        let (a, b, c) = tokio::join!(
            create_invoice(&store, "s1", request.clone(), "api"),
            create_invoice(&store, "s1", request.clone(), "api"),
            create_invoice(&store, "s1", request, "api"),
        );
        let created = [&a, &b, &c].iter().filter(|r| r.is_ok()).count();
        assert_eq!(created, 1);
        for result in [a, b, c] {
            if let Err(err) = result {
                assert!(matches!(err, AppError::Conflict(_)));
            }
        }
        assert_eq!(store.invoices.list("s1").await.unwrap().len(), 1);
        assert_eq!(store.fbr_invoices.list("s1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_generated_numbers_are_distinct() {
        let store = std::sync::Arc::new(seeded().await);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    create_invoice(&store, "s1", one_line(), "bulk").await
                })
            })
            .collect();

        let mut numbers = Vec::new();
        for handle in handles {
            let invoice = handle.await.unwrap().unwrap();
            numbers.push(invoice.invoice_number.unwrap());
        }
        numbers.sort();
        numbers.dedup();
        assert_eq!(numbers.len(), 8);
    }

    #[tokio::test]
    async fn duplicate_number_conflicts() {
        let store = seeded().await;
        let mut request = one_line();
        request.invoice_number = Some("INV-001".into());
        create_invoice(&store, "s1", request.clone(), "api").await.unwrap();

        let err = create_invoice(&store, "s1", request, "api").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn requires_seller_settings() {
        let store = Store::in_memory();
        let err = create_invoice(&store, "nobody", one_line(), "api")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SellerSettingsMissing(_)));
    }

    #[tokio::test]
    async fn unknown_client_is_rejected() {
        let store = seeded().await;
        let mut request = one_line();
        request.client_id = Some("c-missing".into());
        let err = create_invoice(&store, "s1", request, "api").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn generated_numbers_skip_taken_ones() {
        let store = seeded().await;
        let mut manual = one_line();
        manual.invoice_number = Some("HSS-0002".into());
        create_invoice(&store, "s1", manual, "api").await.unwrap();

        let generated = create_invoice(&store, "s1", one_line(), "api").await.unwrap();
        assert_eq!(generated.invoice_number.as_deref(), Some("HSS-0003"));
    }
}
