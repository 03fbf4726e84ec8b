//! Response caching middleware.
//!
//! Reads the [`PublishedResource`] the host's traversal layer inserted into
//! request extensions, resolves the interception operation before the
//! handler runs, and the mutation operation after it. Diagnostic headers
//! record the resolved rule and operation on every response the layer
//! touched.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use bytes::BytesMut;
use futures::{StreamExt, stream};
use tracing::{debug, instrument, warn};

use crate::config::{CacheSettings, SettingsHandle};
use crate::domain::{PublishedResource, SiteCatalog, TypeRegistry};
use crate::ramcache::RamCache;
use crate::request::RequestContext;
use crate::rules::{OperationLookup, OperationRegistry, OperationResolution};

/// Diagnostic header naming the rule the response resolved to.
pub const X_CACHE_RULE: HeaderName = HeaderName::from_static("x-cache-rule");
/// Diagnostic header naming the operation applied to the response.
pub const X_CACHE_OPERATION: HeaderName = HeaderName::from_static("x-cache-operation");

/// Shared caching state for middleware.
#[derive(Clone)]
pub struct CachingState {
    pub settings: Arc<SettingsHandle>,
    pub types: Arc<TypeRegistry>,
    pub registry: Arc<OperationRegistry>,
    pub catalog: Arc<SiteCatalog>,
    pub ram: Arc<RamCache>,
}

impl CachingState {
    /// State with the shipped operations and `settings` installed.
    pub fn new(settings: CacheSettings, types: TypeRegistry, catalog: SiteCatalog) -> Self {
        let ram = Arc::new(RamCache::for_settings(&settings));
        Self {
            settings: Arc::new(SettingsHandle::with_settings(settings)),
            types: Arc::new(types),
            registry: Arc::new(OperationRegistry::defaults()),
            catalog: Arc::new(catalog),
            ram,
        }
    }

    pub fn with_registry(mut self, registry: OperationRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    fn lookup(&self) -> OperationLookup {
        OperationLookup::new(
            Arc::clone(&self.settings),
            Arc::clone(&self.types),
            Arc::clone(&self.registry),
            Arc::clone(&self.catalog),
            Arc::clone(&self.ram),
        )
    }
}

/// Middleware applying cache policy around the inner handler.
///
/// Only GET requests carrying a published resource are considered;
/// everything else passes through untouched.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn caching_layer(
    State(state): State<CachingState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let Some(published) = request.extensions().get::<PublishedResource>().cloned() else {
        return next.run(request).await;
    };

    let context = RequestContext::from_request(&request, &state.catalog);
    let lookup = state.lookup();

    let interception = lookup.interceptor(&published);
    if let Some(operation) = interception.operation.as_deref() {
        if let Some(mut response) = operation.intercept(&published, &context) {
            debug!(
                rule = interception.rule.as_deref().unwrap_or_default(),
                operation = interception.name.as_deref().unwrap_or_default(),
                outcome = "intercepted",
                "answered before rendering"
            );
            apply_diagnostics(response.headers_mut(), &interception);
            return response;
        }
    }

    let response = next.run(request).await;

    let mutation = lookup.mutator(&published);
    let Some(operation) = mutation.operation.as_deref() else {
        let mut response = response;
        apply_diagnostics(response.headers_mut(), &mutation);
        return response;
    };

    let (mut parts, body) = response.into_parts();
    let limit = state.ram.body_limit();

    // Bodies with a declared length over the buffer limit keep streaming;
    // the mutator then runs without a body and nothing is stored.
    if declared_length(&parts.headers).is_some_and(|length| length > limit as u64) {
        operation.mutate(&published, &context, parts.status, &mut parts.headers, None);
        apply_diagnostics(&mut parts.headers, &mutation);
        return Response::from_parts(parts, body);
    }

    // An undeclared length buffers up to the same limit; a body that
    // outgrows it resumes streaming with the buffered prefix chained
    // ahead of the unread remainder.
    let mut incoming = body.into_data_stream();
    let mut buffered = BytesMut::new();
    while let Some(chunk_result) = incoming.next().await {
        let chunk = match chunk_result {
            Ok(chunk) => chunk,
            Err(error) => {
                warn!(%error, "response body failed during buffering");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

        buffered.extend_from_slice(&chunk);
        if buffered.len() > limit {
            operation.mutate(&published, &context, parts.status, &mut parts.headers, None);
            apply_diagnostics(&mut parts.headers, &mutation);
            debug!(limit, "body outgrew the buffer cap, resuming the stream");
            let prefix = stream::iter([Ok::<_, axum::Error>(buffered.freeze())]);
            return Response::from_parts(parts, Body::from_stream(prefix.chain(incoming)));
        }
    }
    let bytes = buffered.freeze();

    operation.mutate(
        &published,
        &context,
        parts.status,
        &mut parts.headers,
        Some(&bytes),
    );
    // Applied after mutation so stored copies replay without stale
    // diagnostics; interception stamps fresh ones.
    apply_diagnostics(&mut parts.headers, &mutation);
    Response::from_parts(parts, Body::from(bytes))
}

fn apply_diagnostics(headers: &mut HeaderMap, resolution: &OperationResolution) {
    if let Some(rule) = resolution.rule.as_deref() {
        if let Ok(value) = HeaderValue::from_str(rule) {
            headers.insert(X_CACHE_RULE, value);
        }
    }
    if let Some(name) = resolution.name.as_deref() {
        if let Ok(value) = HeaderValue::from_str(name) {
            headers.insert(X_CACHE_OPERATION, value);
        }
    }
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}
