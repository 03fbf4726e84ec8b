//! Caching operations bound to rules by configuration.
//!
//! An operation participates in two phases. Before the handler runs, its
//! interceptor side may answer the request outright with a 304 or a RAM
//! cached copy. After the handler runs, its mutator side stamps cache
//! headers onto the outgoing response and may store it for later
//! interception.

pub mod etag;
pub mod headers;
pub mod strong;
pub mod weak;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use metrics::counter;

use crate::config::CacheSettings;
use crate::domain::{PublishedResource, SiteCatalog};
use crate::ramcache::RamCache;
use crate::request::RequestContext;

pub use strong::StrongCaching;
pub use weak::WeakCaching;

/// Shared state handed to an operation at construction.
#[derive(Clone)]
pub struct OperationContext {
    pub settings: Arc<CacheSettings>,
    pub catalog: Arc<SiteCatalog>,
    pub ram: Arc<RamCache>,
    /// The rule this instance was resolved under.
    pub rule: String,
}

/// A request-scoped caching operation.
pub trait CachingOperation: Send + Sync {
    /// Answer the request before rendering, or None to proceed.
    fn intercept(
        &self,
        published: &PublishedResource,
        request: &RequestContext,
    ) -> Option<Response>;

    /// Stamp cache headers onto the rendered response. `body` is None when
    /// the response was too large to buffer.
    fn mutate(
        &self,
        published: &PublishedResource,
        request: &RequestContext,
        status: StatusCode,
        headers: &mut HeaderMap,
        body: Option<&Bytes>,
    );
}

/// Constructor registered for an operation name and resource kind.
pub type OperationConstructor = fn(OperationContext) -> Option<Box<dyn CachingOperation>>;

/// Build the empty-bodied 304 issued when the request's validators still
/// hold.
pub fn not_modified_response(etag: Option<&str>) -> Response {
    counter!("brezza_not_modified_total").increment(1);

    let mut builder = Response::builder().status(StatusCode::NOT_MODIFIED);
    if let Some(etag) = etag {
        builder = builder.header(header::ETAG, etag);
    }
    builder
        .body(Body::empty())
        .unwrap_or_else(|_| StatusCode::NOT_MODIFIED.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_modified_carries_the_etag() {
        let response = not_modified_response(Some("\"||7|en|classica\""));
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(
            response
                .headers()
                .get(header::ETAG)
                .and_then(|value| value.to_str().ok()),
            Some("\"||7|en|classica\"")
        );
    }

    #[test]
    fn not_modified_without_etag_has_no_validator() {
        let response = not_modified_response(None);
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert!(response.headers().get(header::ETAG).is_none());
    }
}
