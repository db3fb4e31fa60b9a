use chrono::NaiveDate;
use nexus_core::models::{Client, Invoice, InvoiceTotals, LineItem, LineItemInput, SellerSettings};
use nexus_documents::pdf::{NOTE_LINE_CHARS, NOTE_MAX_LINES};
use nexus_documents::{render_invoice, InvoiceSheet};
use rust_decimal::Decimal;

fn dec(v: i64) -> Decimal {
    Decimal::new(v, 0)
}

fn acme() -> Client {
    Client {
        id: "c-1".into(),
        company_name: "Acme Co".into(),
        buyer_ntn: Some("123".into()),
        buyer_strn: Some("456".into()),
        ..Default::default()
    }
}

fn softworks() -> SellerSettings {
    SellerSettings {
        id: "seller-1".into(),
        company_name: "HS Softworks".into(),
        seller_ntn: Some("789".into()),
        seller_strn: Some("012".into()),
        ..Default::default()
    }
}

fn inv_001() -> Invoice {
    Invoice {
        id: "65a1b2c3d4e5f60718293a4b".into(),
        invoice_number: Some("INV-001".into()),
        invoice_date: NaiveDate::from_ymd_opt(2024, 6, 1),
        items: vec![LineItem {
            description: "Tax Filing".into(),
            quantity: dec(1),
            unit_price: dec(5000),
            total_value: dec(5000),
            sales_tax: dec(900),
            extra_tax: dec(0),
            final_value: dec(5900),
            ..Default::default()
        }],
        totals: InvoiceTotals {
            total_value: dec(5000),
            sales_tax: dec(900),
            extra_tax: dec(0),
            discount: dec(0),
            final_value: dec(5900),
        },
        ..Default::default()
    }
}

fn items(n: usize) -> Vec<LineItem> {
    (0..n)
        .map(|i| {
            LineItemInput {
                description: format!("Service {}", i),
                quantity: Some(dec(1)),
                unit_price: Some(dec(100)),
                ..Default::default()
            }
            .price(dec(18))
        })
        .collect()
}

#[test]
fn inv_001_scenario_renders_expected_strings() {
    let invoice = inv_001();
    let buyer = acme();
    let seller = softworks();

    let sheet = InvoiceSheet::build(&invoice, Some(&buyer), Some(&seller));
    assert_eq!(sheet.seller_name, "HS Softworks");
    assert_eq!(sheet.buyer_name, "Acme Co");
    assert_eq!(sheet.buyer_ntn, "123");
    assert_eq!(sheet.seller_strn, "012");
    assert_eq!(
        sheet.rows,
        vec![[
            "Tax Filing".to_string(),
            "1".to_string(),
            "5000.00".to_string(),
            "5000.00".to_string(),
            "900.00".to_string(),
            "-".to_string(),
            "5900.00".to_string(),
        ]]
    );

    let rendered = render_invoice(&invoice, Some(&buyer), Some(&seller)).unwrap();
    assert_eq!(rendered.filename, "Invoice_INV-001_Acme Co.pdf");
    assert!(rendered.bytes.starts_with(b"%PDF"));
}

#[test]
fn table_has_one_row_per_item() {
    for n in [1, 2, 5, 15, 16] {
        let invoice = Invoice {
            id: "x".into(),
            items: items(n),
            ..Default::default()
        };
        let sheet = InvoiceSheet::build(&invoice, None, None);
        assert_eq!(sheet.rows.len(), n);
        assert!(sheet.draw().is_ok());
    }
}

#[test]
fn invoice_without_items_gets_one_synthesised_row() {
    let invoice = Invoice {
        id: "legacy-000123".into(),
        product: Some("Annual Audit Services".into()),
        units: Some(dec(2)),
        unit_price: Some(Decimal::new(125050, 2)),
        ..Default::default()
    };
    let sheet = InvoiceSheet::build(&invoice, None, None);

    assert_eq!(sheet.rows.len(), 1);
    assert_eq!(sheet.rows[0][0], "Annual Audit...");
    assert_eq!(sheet.rows[0][1], "2");
    assert_eq!(sheet.rows[0][2], "1250.50");
    assert_eq!(sheet.rows[0][3], "2501.00");
}

#[test]
fn missing_parties_render_as_na() {
    let sheet = InvoiceSheet::build(&inv_001(), None, None);
    assert_eq!(sheet.seller_name, "N/A");
    assert_eq!(sheet.buyer_ntn, "N/A");
    assert_eq!(sheet.seller_phone, "N/A");
}

#[test]
fn net_payable_subtracts_discount() {
    let mut invoice = inv_001();
    invoice.items[0].extra_tax = Decimal::new(2550, 2);
    invoice.totals.discount = Decimal::new(10005, 2);

    let sheet = InvoiceSheet::build(&invoice, None, None);
    // 5000 + 900 + 25.50 - 100.05
    assert_eq!(sheet.net_payable, "5825.45");
    assert_eq!(sheet.discount, "100.05");
    assert_eq!(sheet.totals_row[5], "25.50");
    assert_eq!(sheet.totals_row[6], "5925.50");
}

#[test]
fn rendering_is_byte_identical_across_runs() {
    let invoice = inv_001();
    let first = render_invoice(&invoice, Some(&acme()), Some(&softworks())).unwrap();
    let second = render_invoice(&invoice, Some(&acme()), Some(&softworks())).unwrap();
    assert_eq!(first.bytes, second.bytes);
}

#[test]
fn qr_is_present_when_payload_encodes() {
    let sheet = InvoiceSheet::build(&inv_001(), Some(&acme()), Some(&softworks()));
    assert!(sheet.qr.is_some());
}

fn assert_contiguous(sheet: &InvoiceSheet) {
    let pages = sheet.pages();
    assert_eq!(pages.first().map(|p| p.start), Some(0));
    assert_eq!(pages.last().map(|p| p.end), Some(sheet.rows.len()));
    for pair in pages.windows(2) {
        assert_eq!(pair[0].end, pair[1].start);
    }
}

#[test]
fn long_tables_continue_on_extra_pages() {
    let invoice = Invoice {
        id: "big".into(),
        items: items(30),
        ..Default::default()
    };
    let sheet = InvoiceSheet::build(&invoice, Some(&acme()), Some(&softworks()));
    assert_eq!(sheet.rows.len(), 30);

    let pages = sheet.pages();
    assert_eq!(pages.len(), 2);
    assert_contiguous(&sheet);
    assert!(!pages[1].is_empty());

    let rendered = render_invoice(&invoice, Some(&acme()), Some(&softworks())).unwrap();
    assert!(rendered.bytes.starts_with(b"%PDF"));
}

#[test]
fn page_breaks_keep_rows_with_the_totals() {
    let sheet_for = |n: usize| {
        InvoiceSheet::build(
            &Invoice {
                id: "x".into(),
                items: items(n),
                ..Default::default()
            },
            None,
            None,
        )
    };

    assert_eq!(sheet_for(15).pages(), vec![0..15]);
    // One row over the last-page limit moves a single row to page two.
    assert_eq!(sheet_for(16).pages(), vec![0..15, 15..16]);

    let sheet = sheet_for(120);
    assert!(sheet.pages().len() >= 4);
    assert!(sheet.pages().iter().all(|p| !p.is_empty()));
    assert_contiguous(&sheet);
    assert!(sheet.draw().is_ok());
}

#[test]
fn notes_are_wrapped_for_the_page() {
    let mut invoice = inv_001();
    invoice.notes = Some(format!("{}\nBank: Meezan", "Kindly remit payment promptly. ".repeat(10)));

    let sheet = InvoiceSheet::build(&invoice, None, None);
    assert_eq!(sheet.notes.len(), NOTE_MAX_LINES);
    assert!(sheet.notes.iter().all(|l| l.chars().count() <= NOTE_LINE_CHARS));
    assert!(sheet.notes[NOTE_MAX_LINES - 1].ends_with("..."));
    assert!(sheet.draw().is_ok());

    invoice.notes = Some("  ".into());
    assert!(InvoiceSheet::build(&invoice, None, None).notes.is_empty());
}
