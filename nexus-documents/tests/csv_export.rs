use nexus_core::models::{Client, FbrStatus, FbrSubmission, Invoice, LineItemInput};
use nexus_documents::csv::{client_columns, fbr_columns, invoice_columns, BOM, LINE_END};
use nexus_documents::{build_csv, Column, InvoiceExportRow};
use rust_decimal::Decimal;

/// Minimal RFC 4180 reader: quoted fields, doubled quotes, CRLF records.
fn parse(csv: &str) -> Vec<Vec<String>> {
    let body = csv.strip_prefix(BOM).expect("missing BOM");
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            ('"', _) => in_quotes = !in_quotes,
            (',', false) => record.push(std::mem::take(&mut field)),
            ('\r', false) if chars.peek() == Some(&'\n') => {
                chars.next();
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }
    record.push(field);
    records.push(record);
    records
}

struct Pair {
    left: String,
    right: String,
}

fn pair_columns() -> Vec<Column<Pair>> {
    vec![
        Column::new("Left", |p: &Pair| p.left.clone()),
        Column::new("Right", |p: &Pair| p.right.clone()),
    ]
}

#[test]
fn awkward_values_survive_a_reparse() {
    let values = [
        ("plain", "with, comma"),
        ("\"quoted\"", "mixed \"a\", b"),
        ("multi\nline", ""),
        ("trailing\"", "تاجر"),
    ];
    let rows: Vec<Pair> = values
        .iter()
        .map(|(l, r)| Pair {
            left: l.to_string(),
            right: r.to_string(),
        })
        .collect();

    let parsed = parse(&build_csv(&rows, &pair_columns()));
    assert_eq!(parsed.len(), 1 + rows.len());
    assert_eq!(parsed[0], vec!["Left", "Right"]);
    for (record, (l, r)) in parsed[1..].iter().zip(values.iter()) {
        assert_eq!(record, &vec![l.to_string(), r.to_string()]);
    }
}

#[test]
fn zero_rows_is_bom_and_header_only() {
    let csv = build_csv::<Pair>(&[], &pair_columns());
    assert_eq!(csv, format!("{}\"Left\",\"Right\"", BOM));
    assert!(!csv.contains(LINE_END));
}

#[test]
fn lines_are_crlf_separated() {
    let rows = vec![
        Pair {
            left: "a".into(),
            right: "b".into(),
        },
        Pair {
            left: "c".into(),
            right: "d".into(),
        },
    ];
    let csv = build_csv(&rows, &pair_columns());
    assert_eq!(csv.matches(LINE_END).count(), 2);
    assert_eq!(csv.matches('\n').count(), 2);
}

#[test]
fn invoice_export_joins_client_and_fbr() {
    let mut invoice = Invoice {
        id: "inv-1".into(),
        invoice_number: Some("INV-7".into()),
        items: vec![
            LineItemInput {
                description: "Audit".into(),
                hs_code: Some("9983.11.00".into()),
                quantity: Some(Decimal::new(2, 0)),
                unit_price: Some(Decimal::new(100, 0)),
                ..Default::default()
            }
            .price(Decimal::new(18, 0)),
            LineItemInput {
                description: "Filing, \"urgent\"".into(),
                quantity: Some(Decimal::new(1, 0)),
                unit_price: Some(Decimal::new(50, 0)),
                ..Default::default()
            }
            .price(Decimal::new(18, 0)),
        ],
        ..Default::default()
    };
    invoice.recompute_totals();
    let client = Client {
        company_name: "Acme Co".into(),
        ..Default::default()
    };
    let fbr = FbrSubmission {
        status: FbrStatus::Accepted,
        irn: Some("IRN-42".into()),
        ..Default::default()
    };

    let rows = vec![InvoiceExportRow {
        invoice: &invoice,
        client: Some(&client),
        fbr: Some(&fbr),
    }];
    let columns = invoice_columns();
    let parsed = parse(&build_csv(&rows, &columns));

    assert_eq!(parsed.len(), 2);
    let header = &parsed[0];
    let record = &parsed[1];
    let field = |name: &str| {
        let idx = header.iter().position(|h| h == name).unwrap();
        record[idx].clone()
    };

    assert_eq!(field("Invoice Number"), "INV-7");
    assert_eq!(field("Client"), "Acme Co");
    assert_eq!(field("Products"), "Audit; Filing, \"urgent\"");
    assert_eq!(field("HS Codes"), "9983.11.00; ");
    assert_eq!(field("Total Value"), "250.00");
    assert_eq!(field("Sales Tax"), "45.00");
    assert_eq!(field("Final Value"), "295.00");
    assert_eq!(field("FBR Status"), "accepted");
    assert_eq!(field("FBR Reference"), "IRN-42");
}

#[test]
fn preset_row_counts_match_input() {
    let clients = vec![Client::default(), Client::default(), Client::default()];
    assert_eq!(parse(&build_csv(&clients, &client_columns())).len(), 4);

    let submissions: Vec<FbrSubmission> = Vec::new();
    assert_eq!(parse(&build_csv(&submissions, &fbr_columns())).len(), 1);
}
