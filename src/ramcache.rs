//! RAM cache for anonymous responses.
//!
//! Stores rendered 200 responses keyed by request variant and replays them on
//! interception. Keys embed the catalog counter, so bumping the counter
//! retires every stored entry without explicit invalidation.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::RwLock;

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use lru::LruCache;
use metrics::counter;

use crate::config::CacheSettings;
use crate::domain::SiteCatalog;
use crate::lock::{read_guard, write_guard};
use crate::request::RequestContext;

const SOURCE: &str = "ramcache";

/// Marker header attached to responses served from the RAM cache.
pub const X_RAMCACHE: HeaderName = HeaderName::from_static("x-ramcache");

/// Value carried by [`X_RAMCACHE`].
pub const RAM_CACHE_MARKER: &str = "brezza.ramcache";

/// Key for one cached response variant.
///
/// `validator` is the ETag the storing operation computed for the request,
/// so responses whose validator moved (a lock toggle, a clipboard cookie)
/// key new variants instead of aliasing stored ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RamKey {
    pub path: String,
    pub query_hash: u64,
    pub language: String,
    pub skin: String,
    pub counter: u64,
    pub validator: Option<String>,
}

impl RamKey {
    pub fn for_request(
        request: &RequestContext,
        catalog: &SiteCatalog,
        validator: Option<&str>,
    ) -> Self {
        Self {
            path: request.path.clone(),
            query_hash: hash_query(&request.query),
            language: request.language.clone(),
            skin: request.skin.clone(),
            counter: catalog.counter(),
            validator: validator.map(str::to_string),
        }
    }
}

fn hash_query(query: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    query.hash(&mut hasher);
    hasher.finish()
}

/// A rendered response held for replay.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl CachedResponse {
    /// Snapshot response parts; headers with non-string values are skipped.
    pub fn from_parts(status: StatusCode, headers: &HeaderMap, body: Bytes) -> Self {
        Self {
            status: status.as_u16(),
            headers: headers
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|value| (name.to_string(), value.to_string()))
                })
                .collect(),
            body,
        }
    }

    /// Rebuild the response with the RAM marker header attached.
    pub fn into_marked_response(self) -> Response {
        let mut builder = Response::builder().status(self.status);
        for (name, value) in self.headers {
            if let Ok(value) = HeaderValue::from_str(&value) {
                builder = builder.header(name, value);
            }
        }
        builder = builder.header(X_RAMCACHE, HeaderValue::from_static(RAM_CACHE_MARKER));
        builder
            .body(Body::from(self.body))
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
    }
}

/// Bounded LRU store of anonymous responses.
pub struct RamCache {
    responses: RwLock<LruCache<RamKey, CachedResponse>>,
    body_limit: usize,
}

impl RamCache {
    pub fn new(response_limit: NonZeroUsize, body_limit: usize) -> Self {
        Self {
            responses: RwLock::new(LruCache::new(response_limit)),
            body_limit,
        }
    }

    pub fn for_settings(settings: &CacheSettings) -> Self {
        Self::new(
            settings.ram.response_limit_non_zero(),
            settings.ram.body_limit_bytes,
        )
    }

    /// Largest body, in bytes, a stored response may carry.
    pub fn body_limit(&self) -> usize {
        self.body_limit
    }

    pub fn fetch(&self, key: &RamKey) -> Option<CachedResponse> {
        let mut responses = write_guard(&self.responses, SOURCE, "fetch");
        match responses.get(key) {
            Some(cached) => {
                counter!("brezza_ramcache_hit_total").increment(1);
                Some(cached.clone())
            }
            None => {
                counter!("brezza_ramcache_miss_total").increment(1);
                None
            }
        }
    }

    pub fn store(&self, key: RamKey, response: CachedResponse) {
        if response.body.len() > self.body_limit {
            return;
        }
        let mut responses = write_guard(&self.responses, SOURCE, "store");
        if let Some((evicted, _)) = responses.push(key.clone(), response) {
            if evicted != key {
                counter!("brezza_ramcache_evict_total").increment(1);
            }
        }
    }

    pub fn invalidate_all(&self) {
        write_guard(&self.responses, SOURCE, "invalidate_all").clear();
    }

    pub fn len(&self) -> usize {
        read_guard(&self.responses, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
