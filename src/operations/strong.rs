//! Strong caching: shared browser and proxy caching for stable resources.

use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use time::OffsetDateTime;
use tracing::debug;

use crate::config::OperationParams;
use crate::domain::PublishedResource;
use crate::request::RequestContext;

use super::{
    CachingOperation, OperationContext,
    headers::{cache_in_browser_and_proxy, is_modified},
    not_modified_response,
};

/// Lifetime caching for resources that do not vary per visitor.
///
/// Responses may be reused by browsers and shared proxies for the configured
/// lifetime without revalidation.
pub struct StrongCaching {
    ctx: OperationContext,
    params: OperationParams,
}

impl StrongCaching {
    pub const NAME: &'static str = "brezza.caching.strong";

    pub fn construct(ctx: OperationContext) -> Option<Box<dyn CachingOperation>> {
        let params = ctx
            .settings
            .operation_params(Self::NAME, &ctx.rule, Self::defaults());
        Some(Box::new(Self { ctx, params }))
    }

    fn defaults() -> OperationParams {
        OperationParams {
            max_age: 86400,
            etags: Vec::new(),
            ram_cache: false,
            last_modified: true,
        }
    }

    fn etag(&self, published: &PublishedResource, request: &RequestContext) -> Option<String> {
        super::etag::compose_etag(&self.params.etags, published, request, &self.ctx.catalog)
    }

    fn last_modified(&self, published: &PublishedResource) -> Option<OffsetDateTime> {
        if self.params.last_modified {
            published.modified
        } else {
            None
        }
    }
}

impl CachingOperation for StrongCaching {
    fn intercept(
        &self,
        published: &PublishedResource,
        request: &RequestContext,
    ) -> Option<Response> {
        let etag = self.etag(published, request);
        let last_modified = self.last_modified(published);

        if !is_modified(request, etag.as_deref(), last_modified) {
            debug!(rule = %self.ctx.rule, outcome = "not_modified", "request validators still hold");
            return Some(not_modified_response(etag.as_deref()));
        }

        None
    }

    fn mutate(
        &self,
        published: &PublishedResource,
        request: &RequestContext,
        _status: StatusCode,
        headers: &mut HeaderMap,
        _body: Option<&Bytes>,
    ) {
        cache_in_browser_and_proxy(
            headers,
            self.params.max_age,
            self.etag(published, request).as_deref(),
            self.last_modified(published),
            OffsetDateTime::now_utc(),
        );
    }
}
