//! Sales tax invoice on A4.
//!
//! Rendering happens in two steps. [`InvoiceSheet::build`] resolves every
//! string that will appear on the page, with fallbacks applied, and
//! [`InvoiceSheet::draw`] places them at fixed coordinates with `printpdf`.
//! Keeping the layout as a value lets callers inspect exactly what gets drawn.
//!
//! Long item tables continue on extra pages that repeat the column header.
//! Totals, signatures and the QR code only appear on the last page.

use crate::error::DocumentError;
use crate::qr::{QrMatrix, QrPayload};
use nexus_core::models::money::{format_amount, format_quantity};
use nexus_core::models::{Client, Invoice, LineItem, SellerSettings};
use printpdf::{
    BuiltinFont, CustomPdfConformance, IndirectFontRef, Line, Mm, PdfConformance, PdfDocument,
    PdfLayerReference, Point,
};
use rust_decimal::Decimal;
use std::io::BufWriter;
use std::ops::Range;
use time::OffsetDateTime;

pub const TITLE: &str = "SALES TAX INVOICE";
pub const PRODUCT_MAX_CHARS: usize = 12;
/// Wrapped note lines are at most this many characters, which keeps them
/// clear of the discount column.
pub const NOTE_LINE_CHARS: usize = 56;
pub const NOTE_MAX_LINES: usize = 3;

const MISSING: &str = "N/A";

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const RIGHT_EDGE: f32 = PAGE_WIDTH - MARGIN;
const RIGHT_COLUMN: f32 = 115.0;

const TABLE_TOP: f32 = 196.0;
const CONTINUED_TABLE_TOP: f32 = 280.0;
/// Height of the two-line column header.
const TABLE_HEADER: f32 = 13.0;
const ROW_HEIGHT: f32 = 6.0;
const CELL_PADDING: f32 = 1.5;
/// Lowest table edge on a page that continues onto the next.
const PAGE_FLOOR: f32 = 20.0;
/// Lowest table edge on the last page: the summary lines must stay above
/// the QR block.
const LAST_PAGE_FLOOR: f32 = QR_BOTTOM + QR_SIZE + 16.0;

const QR_LEFT: f32 = 165.0;
const QR_BOTTOM: f32 = 40.0;
const QR_SIZE: f32 = 30.0;

const SIGNATURE_Y: f32 = 22.0;

const PT_PER_MM: f32 = 72.0 / 25.4;

/// Seven fixed-width columns spanning the printable width.
pub const COLUMNS: [TableColumn; 7] = [
    TableColumn::new("Product", "Description", 38.0),
    TableColumn::new("Units", "Qty", 20.0),
    TableColumn::new("Unit Price", "Excl. Tax", 22.0),
    TableColumn::new("Total Value", "Excl. Tax", 26.0),
    TableColumn::new("Sales Tax", "Amount", 24.0),
    TableColumn::new("Extra Tax", "Amount", 22.0),
    TableColumn::new("Final Value", "Incl. Tax", 28.0),
];

#[derive(Debug, Clone, Copy)]
pub struct TableColumn {
    pub label: &'static str,
    pub sub_label: &'static str,
    pub width: f32,
}

impl TableColumn {
    const fn new(label: &'static str, sub_label: &'static str, width: f32) -> Self {
        Self {
            label,
            sub_label,
            width,
        }
    }
}

/// Output of a render: the bytes and the name to save them under.
#[derive(Debug, Clone)]
pub struct RenderedInvoice {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Everything drawn on the page, already formatted.
#[derive(Debug, Clone)]
pub struct InvoiceSheet {
    pub seller_name: String,
    pub seller_address: String,
    pub seller_phone: String,
    pub seller_ntn: String,
    pub seller_strn: String,
    pub invoice_number: String,
    pub invoice_date: String,
    pub buyer_name: String,
    pub buyer_address: String,
    pub buyer_ntn: String,
    pub buyer_strn: String,
    pub rows: Vec<[String; 7]>,
    pub totals_row: [String; 7],
    pub discount: String,
    pub net_payable: String,
    pub notes: Vec<String>,
    pub qr: Option<QrMatrix>,
    document_id: String,
    created_at: OffsetDateTime,
}

fn text_or_missing(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => MISSING.to_string(),
    }
}

/// Product names longer than [`PRODUCT_MAX_CHARS`] are cut and suffixed
/// with "...".
pub fn truncate_product(description: &str) -> String {
    let description = description.trim();
    if description.is_empty() {
        return MISSING.to_string();
    }
    if description.chars().count() > PRODUCT_MAX_CHARS {
        let head: String = description.chars().take(PRODUCT_MAX_CHARS).collect();
        format!("{}...", head)
    } else {
        description.to_string()
    }
}

fn extra_tax_cell(extra_tax: Decimal) -> String {
    if extra_tax.is_zero() {
        "-".to_string()
    } else {
        format_amount(extra_tax)
    }
}

fn item_row(item: &LineItem) -> [String; 7] {
    let final_value = item.total_value + item.sales_tax + item.extra_tax;
    [
        truncate_product(&item.description),
        format_quantity(item.quantity),
        format_amount(item.unit_price),
        format_amount(item.total_value),
        format_amount(item.sales_tax),
        extra_tax_cell(item.extra_tax),
        format_amount(final_value),
    ]
}

/// Word-wrap notes to [`NOTE_LINE_CHARS`], keeping at most
/// [`NOTE_MAX_LINES`] lines. Cut text ends in "...".
pub fn note_lines(notes: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in notes.lines() {
        wrap_paragraph(paragraph, NOTE_LINE_CHARS, &mut lines);
    }

    if lines.len() > NOTE_MAX_LINES {
        lines.truncate(NOTE_MAX_LINES);
        if let Some(last) = lines.last_mut() {
            let keep = NOTE_LINE_CHARS - 3;
            if last.chars().count() > keep {
                *last = last.chars().take(keep).collect();
            }
            last.push_str("...");
        }
    }
    lines
}

/// Words longer than `width` are split across lines.
fn wrap_paragraph(paragraph: &str, width: usize, out: &mut Vec<String>) {
    let mut line = String::new();
    let mut len = 0;
    for word in paragraph.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for chunk in chars.chunks(width) {
            if len > 0 && len + 1 + chunk.len() > width {
                out.push(std::mem::take(&mut line));
                len = 0;
            }
            if len > 0 {
                line.push(' ');
                len += 1;
            }
            line.extend(chunk);
            len += chunk.len();
        }
    }
    if len > 0 {
        out.push(line);
    }
}

/// Item rows that fit under a header rule when the page ends in the totals
/// row and summary.
fn last_page_rows(header_rule: f32) -> usize {
    (((header_rule - LAST_PAGE_FLOOR) / ROW_HEIGHT) as usize).saturating_sub(1)
}

/// Item rows that fit under a header rule when the table continues.
fn full_page_rows(header_rule: f32) -> usize {
    ((header_rule - PAGE_FLOOR) / ROW_HEIGHT) as usize
}

fn table_top(page: usize) -> f32 {
    if page == 0 {
        TABLE_TOP
    } else {
        CONTINUED_TABLE_TOP
    }
}

/// `Invoice_{number}_{buyer}.pdf`, falling back to the last six characters
/// of the id and to "Client".
pub fn invoice_filename(invoice: &Invoice, buyer: Option<&Client>) -> String {
    let buyer_name = buyer
        .map(|b| b.company_name.trim())
        .filter(|name| !name.is_empty())
        .unwrap_or("Client");
    format!("Invoice_{}_{}.pdf", invoice.display_number(), buyer_name)
}

impl InvoiceSheet {
    pub fn build(
        invoice: &Invoice,
        buyer: Option<&Client>,
        seller: Option<&SellerSettings>,
    ) -> Self {
        let items = invoice.line_items();
        let rows: Vec<[String; 7]> = items.iter().map(item_row).collect();

        let total_value: Decimal = items.iter().map(|i| i.total_value).sum();
        let sales_tax: Decimal = items.iter().map(|i| i.sales_tax).sum();
        let extra_tax: Decimal = items.iter().map(|i| i.extra_tax).sum();
        let discount = invoice.totals.discount;
        let gross = total_value + sales_tax + extra_tax;

        let totals_row = [
            "Total".to_string(),
            String::new(),
            String::new(),
            format_amount(total_value),
            format_amount(sales_tax),
            extra_tax_cell(extra_tax),
            format_amount(gross),
        ];

        let qr = match QrPayload::new(invoice, buyer, seller).matrix() {
            Ok(matrix) => Some(matrix),
            Err(e) => {
                tracing::warn!(invoice_id = %invoice.id, error = %e, "Rendering invoice without QR code");
                None
            }
        };

        let created_at = OffsetDateTime::from_unix_timestamp(invoice.created_at.timestamp())
            .unwrap_or(OffsetDateTime::UNIX_EPOCH);

        Self {
            seller_name: text_or_missing(seller.map(|s| s.company_name.as_str())),
            seller_address: text_or_missing(seller.and_then(|s| s.address.as_deref())),
            seller_phone: text_or_missing(seller.and_then(|s| s.phone.as_deref())),
            seller_ntn: text_or_missing(seller.and_then(|s| s.seller_ntn.as_deref())),
            seller_strn: text_or_missing(seller.and_then(|s| s.seller_strn.as_deref())),
            invoice_number: invoice.display_number(),
            invoice_date: invoice
                .invoice_date
                .map(|d| d.format("%d-%m-%Y").to_string())
                .unwrap_or_else(|| MISSING.to_string()),
            buyer_name: text_or_missing(buyer.map(|b| b.company_name.as_str())),
            buyer_address: text_or_missing(buyer.and_then(|b| b.address.as_deref())),
            buyer_ntn: text_or_missing(buyer.and_then(|b| b.buyer_ntn.as_deref())),
            buyer_strn: text_or_missing(buyer.and_then(|b| b.buyer_strn.as_deref())),
            rows,
            totals_row,
            discount: format_amount(discount),
            net_payable: format_amount(gross - discount),
            notes: invoice.notes.as_deref().map(note_lines).unwrap_or_default(),
            qr,
            document_id: format!("tax-nexus-{}", invoice.display_number()),
            created_at,
        }
    }

    /// Item rows per page. The last page always carries at least one row
    /// so the totals never stand alone.
    pub fn pages(&self) -> Vec<Range<usize>> {
        let total = self.rows.len();
        let mut pages = Vec::new();
        let mut start = 0;
        loop {
            let header_rule = table_top(pages.len()) - TABLE_HEADER;
            let remaining = total - start;
            if remaining <= last_page_rows(header_rule) {
                pages.push(start..total);
                return pages;
            }
            let take = full_page_rows(header_rule).min(remaining - 1);
            pages.push(start..start + take);
            start += take;
        }
    }

    /// Lay the sheet out on A4 pages and serialise it.
    pub fn draw(&self) -> Result<Vec<u8>, DocumentError> {
        let (doc, first_page, first_layer) =
            PdfDocument::new(TITLE, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let doc = doc
            .with_document_id(self.document_id.clone())
            .with_creation_date(self.created_at)
            .with_mod_date(self.created_at)
            .with_metadata_date(self.created_at)
            .with_conformance(PdfConformance::Custom(CustomPdfConformance {
                requires_icc_profile: false,
                requires_xmp_metadata: false,
                ..Default::default()
            }));

        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(DocumentError::render)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(DocumentError::render)?;

        let pages = self.pages();
        let page_count = pages.len();
        for (index, rows) in pages.into_iter().enumerate() {
            let layer = if index == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
                doc.get_page(page).get_layer(layer)
            };
            let canvas = Canvas {
                layer: &layer,
                font: &font,
                bold: &bold,
            };

            let last = index + 1 == page_count;
            if index == 0 {
                self.draw_header(&canvas);
                self.draw_parties(&canvas);
            } else {
                self.draw_continued_header(&canvas);
            }
            let totals = if last { Some(&self.totals_row) } else { None };
            let bottom = draw_table(&canvas, table_top(index), &self.rows[rows], totals);
            if page_count > 1 {
                canvas.text(
                    &format!("Page {} of {}", index + 1, page_count),
                    8.0,
                    QR_LEFT,
                    8.0,
                    false,
                );
            }
            if last {
                self.draw_summary(&canvas, bottom);
                self.draw_signatures(&canvas);
                if let Some(qr) = &self.qr {
                    draw_qr(&canvas, qr);
                }
            }
        }

        let mut writer = BufWriter::new(Vec::<u8>::new());
        doc.save(&mut writer).map_err(DocumentError::render)?;
        writer
            .into_inner()
            .map_err(|e| DocumentError::render(anyhow::anyhow!(e.to_string())))
    }

    fn draw_header(&self, canvas: &Canvas<'_>) {
        canvas.centered(&self.seller_name, 16.0, 280.0, true);
        canvas.centered(&self.seller_address, 10.0, 273.0, false);
        canvas.centered(&format!("Phone: {}", self.seller_phone), 10.0, 268.0, false);
        canvas.rule(MARGIN, RIGHT_EDGE, 263.0);
        canvas.centered(TITLE, 14.0, 254.0, true);

        canvas.text(&format!("Seller NTN: {}", self.seller_ntn), 10.0, MARGIN, 244.0, false);
        canvas.text(
            &format!("Seller STRN: {}", self.seller_strn),
            10.0,
            RIGHT_COLUMN,
            244.0,
            false,
        );
        canvas.text(
            &format!("Invoice No: {}", self.invoice_number),
            10.0,
            MARGIN,
            238.0,
            false,
        );
        canvas.text(
            &format!("Date: {}", self.invoice_date),
            10.0,
            RIGHT_COLUMN,
            238.0,
            false,
        );
    }

    fn draw_parties(&self, canvas: &Canvas<'_>) {
        canvas.text("Messers:", 11.0, MARGIN, 226.0, true);
        canvas.text(&self.buyer_name, 11.0, MARGIN, 220.0, true);
        canvas.text(&self.buyer_address, 10.0, MARGIN, 214.0, false);
        canvas.text(&format!("Buyer NTN: {}", self.buyer_ntn), 10.0, MARGIN, 206.0, false);
        canvas.text(
            &format!("Buyer STRN: {}", self.buyer_strn),
            10.0,
            RIGHT_COLUMN,
            206.0,
            false,
        );
    }

    fn draw_continued_header(&self, canvas: &Canvas<'_>) {
        canvas.text(&self.seller_name, 10.0, MARGIN, 287.0, true);
        canvas.text(
            &format!("Invoice No: {} (continued)", self.invoice_number),
            10.0,
            RIGHT_COLUMN,
            287.0,
            false,
        );
    }

    fn draw_summary(&self, canvas: &Canvas<'_>, table_bottom: f32) {
        let mut y = table_bottom - 8.0;
        canvas.text("Discount:", 10.0, 120.0, y, false);
        canvas.text(&self.discount, 10.0, 160.0, y, false);
        y -= 7.0;
        canvas.text("Net Payable:", 11.0, 120.0, y, true);
        canvas.text(&self.net_payable, 11.0, 160.0, y, true);

        if !self.notes.is_empty() {
            let mut y = table_bottom - 8.0;
            canvas.text("Notes:", 9.0, MARGIN, y, true);
            for line in &self.notes {
                y -= 5.0;
                canvas.text(line, 9.0, MARGIN, y, false);
            }
        }
    }

    fn draw_signatures(&self, canvas: &Canvas<'_>) {
        canvas.rule(MARGIN, 75.0, SIGNATURE_Y);
        canvas.text("PREPARED BY", 9.0, MARGIN, SIGNATURE_Y - 5.0, true);
        canvas.rule(95.0, 155.0, SIGNATURE_Y);
        canvas.text("Authorized Signatory", 9.0, 95.0, SIGNATURE_Y - 5.0, true);
    }
}

/// Column header, item rows and, on the last page, the totals row. Returns
/// the table's bottom edge.
fn draw_table(
    canvas: &Canvas<'_>,
    top: f32,
    rows: &[[String; 7]],
    totals: Option<&[String; 7]>,
) -> f32 {
    let header_rule = top - TABLE_HEADER;
    let body_rows = rows.len() + usize::from(totals.is_some());
    let bottom = header_rule - ROW_HEIGHT * body_rows as f32;

    canvas.rect(MARGIN, bottom, RIGHT_EDGE, top);
    canvas.rule(MARGIN, RIGHT_EDGE, header_rule);
    if totals.is_some() {
        canvas.rule(MARGIN, RIGHT_EDGE, bottom + ROW_HEIGHT);
    }

    let mut x = MARGIN;
    for (i, column) in COLUMNS.iter().enumerate() {
        canvas.text(column.label, 8.0, x + CELL_PADDING, top - 5.0, true);
        canvas.text(column.sub_label, 7.0, x + CELL_PADDING, top - 9.5, false);
        x += column.width;
        if i + 1 < COLUMNS.len() {
            canvas.vertical(x, bottom, top);
        }
    }

    let mut y = header_rule - ROW_HEIGHT + 2.0;
    for row in rows {
        canvas.row(row, y, false);
        y -= ROW_HEIGHT;
    }
    if let Some(totals) = totals {
        canvas.row(totals, y, true);
    }
    bottom
}

/// Build and draw in one go.
pub fn render_invoice(
    invoice: &Invoice,
    buyer: Option<&Client>,
    seller: Option<&SellerSettings>,
) -> Result<RenderedInvoice, DocumentError> {
    let sheet = InvoiceSheet::build(invoice, buyer, seller);
    let bytes = sheet.draw()?;

    Ok(RenderedInvoice {
        filename: invoice_filename(invoice, buyer),
        bytes,
    })
}

/// Dark modules are drawn as runs of thick horizontal strokes.
fn draw_qr(canvas: &Canvas<'_>, qr: &QrMatrix) {
    let module = QR_SIZE / qr.width() as f32;

    canvas.layer.set_outline_thickness(module * PT_PER_MM);
    for y in 0..qr.width() {
        let centre = QR_BOTTOM + QR_SIZE - (y as f32 + 0.5) * module;
        for (start, len) in qr.dark_runs(y) {
            let left = QR_LEFT + start as f32 * module;
            canvas.rule(left, left + len as f32 * module, centre);
        }
    }
    canvas.layer.set_outline_thickness(1.0);

    canvas.text("Scan to verify", 7.0, QR_LEFT + 4.0, QR_BOTTOM - 4.0, false);
}

struct Canvas<'a> {
    layer: &'a PdfLayerReference,
    font: &'a IndirectFontRef,
    bold: &'a IndirectFontRef,
}

impl Canvas<'_> {
    fn text(&self, text: &str, size: f32, x: f32, y: f32, bold: bool) {
        let font = if bold { self.bold } else { self.font };
        self.layer.use_text(text, size, Mm(x), Mm(y), font);
    }

    /// Builtin fonts carry no metrics here; half an em per glyph is close
    /// enough for centring Helvetica.
    fn centered(&self, text: &str, size: f32, y: f32, bold: bool) {
        let width = text.chars().count() as f32 * size * 0.5 / PT_PER_MM;
        let x = ((PAGE_WIDTH - width) / 2.0).max(MARGIN);
        self.text(text, size, x, y, bold);
    }

    fn row(&self, cells: &[String; 7], y: f32, bold: bool) {
        let mut x = MARGIN;
        for (cell, column) in cells.iter().zip(COLUMNS.iter()) {
            self.text(cell, 8.0, x + CELL_PADDING, y, bold);
            x += column.width;
        }
    }

    fn line(&self, points: &[(f32, f32)], is_closed: bool) {
        self.layer.add_line(Line {
            points: points
                .iter()
                .map(|&(x, y)| (Point::new(Mm(x), Mm(y)), false))
                .collect(),
            is_closed,
        });
    }

    fn rule(&self, from_x: f32, to_x: f32, y: f32) {
        self.line(&[(from_x, y), (to_x, y)], false);
    }

    fn vertical(&self, x: f32, from_y: f32, to_y: f32) {
        self.line(&[(x, from_y), (x, to_y)], false);
    }

    fn rect(&self, left: f32, bottom: f32, right: f32, top: f32) {
        self.line(
            &[(left, bottom), (right, bottom), (right, top), (left, top)],
            true,
        );
    }
}
