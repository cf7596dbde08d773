//! Caller identity extractor.
//!
//! Droplink sits behind a fronting proxy that authenticates owners and
//! forwards the verified address in `x-droplink-user`. Requests without
//! the header are anonymous; the public upload surface accepts them,
//! owner endpoints reject them inside the service layer.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use droplink_service::RequestContext;

/// Header carrying the verified owner email.
pub const PRINCIPAL_HEADER: &str = "x-droplink-user";

/// The caller's identity, extracted from request headers.
#[derive(Debug, Clone)]
pub struct Principal(pub RequestContext);

impl Principal {
    /// Borrow the request context.
    pub fn ctx(&self) -> &RequestContext {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts
            .headers
            .get(PRINCIPAL_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|email| !email.trim().is_empty())
            .map(RequestContext::authenticated)
            .unwrap_or_else(RequestContext::anonymous);
        Ok(Self(ctx))
    }
}
