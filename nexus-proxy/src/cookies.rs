//! `Set-Cookie` rewriting so upstream cookies land on the proxy's origin.

const DROPPED_ATTRIBUTES: [&str; 3] = ["domain", "path", "samesite"];

/// Drop `Domain`, force `Path=/` and `SameSite=Lax`. Other attributes
/// (`HttpOnly`, `Secure`, `Expires`, `Max-Age`) pass through in order.
pub fn rewrite_set_cookie(value: &str) -> String {
    let mut parts = value.split(';').map(str::trim).filter(|p| !p.is_empty());
    let Some(pair) = parts.next() else {
        return String::new();
    };

    let mut rewritten = vec![pair.to_string()];
    rewritten.extend(
        parts
            .filter(|attr| {
                let name = attr.split('=').next().unwrap_or_default().trim();
                !DROPPED_ATTRIBUTES
                    .iter()
                    .any(|dropped| name.eq_ignore_ascii_case(dropped))
            })
            .map(str::to_string),
    );
    rewritten.push("Path=/".to_string());
    rewritten.push("SameSite=Lax".to_string());

    rewritten.join("; ")
}
