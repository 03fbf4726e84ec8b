//! Weak caching: browser-side validation with optional RAM backing.

use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use time::OffsetDateTime;
use tracing::debug;

use crate::config::OperationParams;
use crate::domain::PublishedResource;
use crate::ramcache::{CachedResponse, RamKey};
use crate::request::RequestContext;

use super::{
    CachingOperation, OperationContext,
    etag::{EtagComponent, compose_etag},
    headers::{cache_in_browser, is_modified},
    not_modified_response,
};

/// Validation caching for content that varies per visitor.
///
/// Responses are stored by the browser but revalidated on every use.
/// Anonymous 200 responses can additionally be kept in the RAM cache and
/// replayed until the catalog counter moves.
pub struct WeakCaching {
    ctx: OperationContext,
    params: OperationParams,
}

impl WeakCaching {
    pub const NAME: &'static str = "brezza.caching.weak";

    pub fn construct(ctx: OperationContext) -> Option<Box<dyn CachingOperation>> {
        let params = ctx
            .settings
            .operation_params(Self::NAME, &ctx.rule, Self::defaults());
        Some(Box::new(Self { ctx, params }))
    }

    fn defaults() -> OperationParams {
        OperationParams {
            max_age: 0,
            etags: vec![EtagComponent::UserId, EtagComponent::CatalogCounter],
            ram_cache: false,
            last_modified: true,
        }
    }

    fn etag(&self, published: &PublishedResource, request: &RequestContext) -> Option<String> {
        compose_etag(&self.params.etags, published, request, &self.ctx.catalog)
    }

    fn last_modified(&self, published: &PublishedResource) -> Option<OffsetDateTime> {
        if self.params.last_modified {
            published.modified
        } else {
            None
        }
    }

    fn stores_for(&self, request: &RequestContext) -> bool {
        self.params.ram_cache && request.user.is_none()
    }
}

impl CachingOperation for WeakCaching {
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

        if self.stores_for(request) {
            let key = RamKey::for_request(request, &self.ctx.catalog, etag.as_deref());
            if let Some(cached) = self.ctx.ram.fetch(&key) {
                debug!(rule = %self.ctx.rule, cache = "ram", outcome = "hit", "replaying cached response");
                return Some(cached.into_marked_response());
            }
        }

        None
    }

    fn mutate(
        &self,
        published: &PublishedResource,
        request: &RequestContext,
        status: StatusCode,
        headers: &mut HeaderMap,
        body: Option<&Bytes>,
    ) {
        let etag = self.etag(published, request);
        let last_modified = self.last_modified(published);
        cache_in_browser(
            headers,
            etag.as_deref(),
            last_modified,
            OffsetDateTime::now_utc(),
        );

        if !self.stores_for(request) || status != StatusCode::OK {
            return;
        }
        let Some(body) = body else {
            return;
        };

        let key = RamKey::for_request(request, &self.ctx.catalog, etag.as_deref());
        self.ctx
            .ram
            .store(key, CachedResponse::from_parts(status, headers, body.clone()));
        debug!(rule = %self.ctx.rule, cache = "ram", outcome = "stored", "response stored for replay");
    }
}
