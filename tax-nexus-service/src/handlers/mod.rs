pub mod catalog;
pub mod clients;
pub mod dashboard;
pub mod documents;
pub mod export;
pub mod fbr;
pub mod health;
pub mod invoices;
pub mod sellers;
pub mod tasks;
pub mod users;

use axum::http::header;
use axum::response::{IntoResponse, Response};

/// `attachment` disposition carrying an ASCII `filename` for old clients and
/// the exact UTF-8 name as an RFC 6266 `filename*`.
pub(crate) fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            '"' => '\'',
            '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

/// A download response.
pub(crate) fn attachment(content_type: &'static str, filename: &str, body: Vec<u8>) -> Response {
    let disposition = content_disposition(filename);
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_names_are_kept_in_both_parameters() {
        assert_eq!(
            content_disposition("Invoice_INV-001_Acme Co.pdf"),
            "attachment; filename=\"Invoice_INV-001_Acme Co.pdf\"; \
             filename*=UTF-8''Invoice_INV-001_Acme%20Co.pdf"
        );
    }

    #[test]
    fn non_ascii_names_stay_valid_header_values() {
        let value = content_disposition("Invoice_INV-9_تاجر \"Ltd\".pdf");
        assert!(value.is_ascii());
        assert!(value.contains("filename=\"Invoice_INV-9_____ 'Ltd'.pdf\""));
        assert!(value.contains("filename*=UTF-8''Invoice_INV-9_%D8%AA%D8%A7%D8%AC%D8%B1%20%22Ltd%22.pdf"));

        let response = attachment("application/pdf", "Invoice_INV-9_تاجر.pdf", Vec::new());
        assert!(response.headers()[header::CONTENT_DISPOSITION].to_str().is_ok());
    }
}
