//! Seller scoping.
//!
//! Every tenant-owned route takes a [`SellerContext`]; the id comes from the
//! `seller-id` header the front end (or the proxy) forwards on each call.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use nexus_core::error::AppError;

pub const SELLER_ID_HEADER: &str = "seller-id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellerContext {
    pub seller_id: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for SellerContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let seller_id = parts
            .headers
            .get(SELLER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(AppError::SellerContextMissing)?;

        tracing::Span::current().record("seller_id", seller_id);

        Ok(SellerContext {
            seller_id: seller_id.to_string(),
        })
    }
}
