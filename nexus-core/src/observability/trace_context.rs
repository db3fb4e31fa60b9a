//! Trace context propagation for outbound HTTP calls.
//!
//! The proxy and the API client forward the W3C `traceparent` of the current
//! span and the caller's request id so upstream logs line up with ours.

use opentelemetry::trace::TraceContextExt;
use reqwest::header::HeaderMap;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

pub const TRACEPARENT_HEADER: &str = "traceparent";

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Insert `traceparent` for the current span, if it carries a valid context.
pub fn inject_trace_context(headers: &mut HeaderMap) {
    let span = Span::current();
    let context = span.context();
    let otel_span = context.span();
    let span_context = otel_span.span_context();

    if span_context.is_valid() {
        // version-trace_id-span_id-trace_flags
        let traceparent = format!(
            "00-{}-{}-{:02x}",
            span_context.trace_id(),
            span_context.span_id(),
            span_context.trace_flags().to_u8()
        );

        if let Ok(value) = traceparent.parse() {
            headers.insert(TRACEPARENT_HEADER, value);
        }
    }
}

/// Inject trace context and an optional request id.
pub fn inject_trace_headers(headers: &mut HeaderMap, request_id: Option<&str>) {
    inject_trace_context(headers);

    if let Some(id) = request_id {
        if let Ok(value) = id.parse() {
            headers.insert(REQUEST_ID_HEADER, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_span_means_no_traceparent() {
        let mut headers = HeaderMap::new();
        inject_trace_context(&mut headers);
        assert!(headers.is_empty());
    }

    #[test]
    fn request_id_is_forwarded() {
        let mut headers = HeaderMap::new();
        inject_trace_headers(&mut headers, Some("abc-123"));
        assert_eq!(headers.get(REQUEST_ID_HEADER).unwrap(), "abc-123");
        assert!(headers.get(TRACEPARENT_HEADER).is_none());
    }
}
