//! Operation lookup: rule name, operation name, operation instance.

use std::sync::Arc;

use tracing::trace;

use crate::config::SettingsHandle;
use crate::domain::{PublishedResource, SiteCatalog, TypeRegistry};
use crate::operations::{CachingOperation, OperationContext};
use crate::ramcache::RamCache;

use super::registry::OperationRegistry;
use super::resolver::RulesetResolver;

/// Which phase an operation is being resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationPhase {
    Interception,
    Mutation,
}

impl OperationPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationPhase::Interception => "interception",
            OperationPhase::Mutation => "mutation",
        }
    }
}

/// Result of resolving an operation for a published resource.
///
/// The fields fail independently: no rule matched at all, a rule matched but
/// no operation is bound for the phase, or a bound operation could not be
/// constructed for the resource kind. None of these states is an error.
#[derive(Default)]
pub struct OperationResolution {
    pub rule: Option<String>,
    pub name: Option<String>,
    pub operation: Option<Box<dyn CachingOperation>>,
}

/// Resolves the caching operation applying to a published resource.
pub struct OperationLookup {
    settings: Arc<SettingsHandle>,
    types: Arc<TypeRegistry>,
    registry: Arc<OperationRegistry>,
    catalog: Arc<SiteCatalog>,
    ram: Arc<RamCache>,
}

impl OperationLookup {
    pub fn new(
        settings: Arc<SettingsHandle>,
        types: Arc<TypeRegistry>,
        registry: Arc<OperationRegistry>,
        catalog: Arc<SiteCatalog>,
        ram: Arc<RamCache>,
    ) -> Self {
        Self {
            settings,
            types,
            registry,
            catalog,
            ram,
        }
    }

    /// Resolve the response-interception operation for `published`.
    pub fn interceptor(&self, published: &PublishedResource) -> OperationResolution {
        self.resolve(published, OperationPhase::Interception)
    }

    /// Resolve the response-mutation operation for `published`.
    pub fn mutator(&self, published: &PublishedResource) -> OperationResolution {
        self.resolve(published, OperationPhase::Mutation)
    }

    fn resolve(&self, published: &PublishedResource, phase: OperationPhase) -> OperationResolution {
        let Some(settings) = self.settings.current() else {
            trace!(
                phase = phase.as_str(),
                outcome = "no_settings",
                "cache settings are not installed"
            );
            return OperationResolution::default();
        };

        let resolver = RulesetResolver::new(&settings, &self.types);
        let Some(rule) = resolver.resolve(published) else {
            return OperationResolution::default();
        };

        let table = match phase {
            OperationPhase::Interception => &settings.interceptors,
            OperationPhase::Mutation => &settings.mutators,
        };
        let Some(name) = table.get(&rule).cloned() else {
            trace!(
                rule = %rule,
                phase = phase.as_str(),
                outcome = "unbound",
                "no operation bound for rule"
            );
            return OperationResolution {
                rule: Some(rule),
                ..OperationResolution::default()
            };
        };

        let ctx = OperationContext {
            settings: Arc::clone(&settings),
            catalog: Arc::clone(&self.catalog),
            ram: Arc::clone(&self.ram),
            rule: rule.clone(),
        };
        let operation = self.registry.construct(&name, published.kind, ctx);

        OperationResolution {
            rule: Some(rule),
            name: Some(name),
            operation,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;
    use crate::config::CacheSettings;
    use crate::domain::{ContentItem, ResourceKind};
    use crate::operations::{StrongCaching, WeakCaching};

    fn lookup_with(settings: Option<CacheSettings>, registry: OperationRegistry) -> OperationLookup {
        let handle = match settings {
            Some(settings) => SettingsHandle::with_settings(settings),
            None => SettingsHandle::new(),
        };
        OperationLookup::new(
            Arc::new(handle),
            Arc::new(TypeRegistry::new()),
            Arc::new(registry),
            Arc::new(SiteCatalog::new("classica", "en")),
            Arc::new(RamCache::new(NonZeroUsize::new(4).unwrap(), 1024)),
        )
    }

    fn feed_settings() -> CacheSettings {
        let mut settings = CacheSettings::default();
        settings
            .templates
            .insert("rss".to_string(), "content.feed".to_string());
        settings
            .interceptors
            .insert("content.feed".to_string(), WeakCaching::NAME.to_string());
        settings
            .mutators
            .insert("content.feed".to_string(), StrongCaching::NAME.to_string());
        settings
    }

    fn feed() -> PublishedResource {
        PublishedResource::view("rss", ResourceKind::Feed, ContentItem::new("folder"))
    }

    #[test]
    fn uninstalled_settings_resolve_to_nothing() {
        let lookup = lookup_with(None, OperationRegistry::defaults());
        let resolution = lookup.mutator(&feed());
        assert!(resolution.rule.is_none());
        assert!(resolution.name.is_none());
        assert!(resolution.operation.is_none());
    }

    #[test]
    fn unmatched_resources_resolve_to_nothing() {
        let lookup = lookup_with(Some(feed_settings()), OperationRegistry::defaults());
        let resolution = lookup.mutator(&PublishedResource::standalone("atom", ResourceKind::Feed));
        assert!(resolution.rule.is_none());
        assert!(resolution.name.is_none());
        assert!(resolution.operation.is_none());
    }

    #[test]
    fn unbound_rules_keep_the_rule_name() {
        let mut settings = feed_settings();
        settings.mutators.clear();

        let lookup = lookup_with(Some(settings), OperationRegistry::defaults());
        let resolution = lookup.mutator(&feed());
        assert_eq!(resolution.rule.as_deref(), Some("content.feed"));
        assert!(resolution.name.is_none());
        assert!(resolution.operation.is_none());
    }

    #[test]
    fn unconstructable_operations_keep_rule_and_name() {
        let lookup = lookup_with(Some(feed_settings()), OperationRegistry::empty());
        let resolution = lookup.mutator(&feed());
        assert_eq!(resolution.rule.as_deref(), Some("content.feed"));
        assert_eq!(resolution.name.as_deref(), Some(StrongCaching::NAME));
        assert!(resolution.operation.is_none());
    }

    #[test]
    fn phases_consult_their_own_binding_table() {
        let lookup = lookup_with(Some(feed_settings()), OperationRegistry::defaults());

        let interception = lookup.interceptor(&feed());
        assert_eq!(interception.name.as_deref(), Some(WeakCaching::NAME));
        assert!(interception.operation.is_some());

        let mutation = lookup.mutator(&feed());
        assert_eq!(mutation.name.as_deref(), Some(StrongCaching::NAME));
        assert!(mutation.operation.is_some());
    }
}
