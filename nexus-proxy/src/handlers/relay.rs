use crate::cookies::rewrite_set_cookie;
use crate::error::ProxyError;
use crate::metrics::record_relay;
use crate::startup::ProxyState;
use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE, LOCATION, SET_COOKIE},
        HeaderMap, HeaderName, HeaderValue,
    },
    response::Response,
};
use nexus_core::observability::{inject_trace_headers, REQUEST_ID_HEADER};

/// Request headers copied upstream. Everything else stays at the proxy.
pub const FORWARDED_HEADERS: [&str; 4] = ["content-type", "authorization", "seller-id", "cookie"];

/// Response headers mirrored back besides `Set-Cookie`.
const MIRRORED_HEADERS: [HeaderName; 3] = [CONTENT_TYPE, CONTENT_DISPOSITION, LOCATION];

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

fn forwarded_headers(incoming: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for name in FORWARDED_HEADERS {
        if let Some(value) = incoming.get(name) {
            headers.insert(name, value.clone());
        }
    }

    let request_id = incoming
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok());
    inject_trace_headers(&mut headers, request_id);
    headers
}

/// Relay one `/api/*` request and mirror the answer.
pub async fn relay(
    State(state): State<ProxyState>,
    request: Request,
) -> Result<Response, ProxyError> {
    let (parts, body) = request.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = format!("{}{}", state.upstream_url, path_and_query);

    let body = to_bytes(body, MAX_BODY_BYTES).await?;
    let mut upstream_request = state
        .http
        .request(parts.method.clone(), &url)
        .headers(forwarded_headers(&parts.headers));
    if !body.is_empty() {
        upstream_request = upstream_request.body(body);
    }

    let upstream = match upstream_request.send().await {
        Ok(response) => response,
        Err(e) => {
            record_relay("error");
            tracing::warn!(method = %parts.method, url = %url, error = %e, "Upstream unreachable");
            return Err(e.into());
        }
    };

    let status = upstream.status();
    tracing::debug!(method = %parts.method, url = %url, status = status.as_u16(), "Relayed");

    let mut builder = Response::builder().status(status);
    for name in MIRRORED_HEADERS {
        if let Some(value) = upstream.headers().get(&name) {
            builder = builder.header(name, value.clone());
        }
    }
    for cookie in upstream.headers().get_all(SET_COOKIE) {
        let Ok(raw) = cookie.to_str() else {
            continue;
        };
        if let Ok(value) = HeaderValue::from_str(&rewrite_set_cookie(raw)) {
            builder = builder.header(SET_COOKIE, value);
        }
    }

    let bytes = upstream.bytes().await?;
    record_relay("ok");
    Ok(builder.body(Body::from(bytes))?)
}
