//! Cache ruleset resolution and response caching for publishing hosts.
//!
//! `brezza` sits between a host's traversal layer and its handlers. The host
//! decides what is being published and inserts a [`PublishedResource`] into
//! request extensions; the caching middleware resolves a named cache rule
//! for it, binds the rule to a configured operation, and lets that operation
//! either intercept the request (a 304 or a RAM-cached replay) or stamp
//! cache headers onto the rendered response.
//!
//! Rule resolution consults two mapping tables. Template names match first
//! and unconditionally; content types match only when the published view is
//! the owning item's default view. An absence anywhere in the chain means
//! "apply no special caching", never an error.
//!
//! ```no_run
//! use axum::{Router, middleware, routing::get};
//! use brezza::{CacheSettings, CachingState, SiteCatalog, TypeRegistry, caching_layer};
//!
//! # fn build() -> Result<Router, brezza::LoadError> {
//! let state = CachingState::new(
//!     CacheSettings::browser_profile()?,
//!     TypeRegistry::new(),
//!     SiteCatalog::new("classica", "en"),
//! );
//!
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "home" }))
//!     .layer(middleware::from_fn_with_state(state, caching_layer));
//! # Ok(app)
//! # }
//! ```

pub mod config;
pub mod domain;
mod lock;
pub mod middleware;
pub mod operations;
pub mod ramcache;
pub mod request;
pub mod rules;
pub mod telemetry;

pub use config::{
    CacheSettings, LoadError, LogFormat, LoggingSettings, OperationParams, Settings,
    SettingsHandle, load,
};
pub use domain::{
    Capability, ContentItem, PublishedResource, ResourceKind, SiteCatalog, TypeInfo, TypeRegistry,
};
pub use middleware::{CachingState, X_CACHE_OPERATION, X_CACHE_RULE, caching_layer};
pub use operations::{CachingOperation, OperationContext, StrongCaching, WeakCaching};
pub use ramcache::{RAM_CACHE_MARKER, RamCache, X_RAMCACHE};
pub use request::{Principal, RequestContext};
pub use rules::{OperationLookup, OperationRegistry, OperationResolution, RulesetResolver};
