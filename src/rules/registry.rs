//! Operation dispatch table.
//!
//! Operations register a constructor per (name, resource kind) pair and
//! dispatch is an exact lookup on the published resource's kind tag. An
//! operation that should not apply to a kind simply never registers for it.

use std::collections::HashMap;

use tracing::trace;

use crate::domain::ResourceKind;
use crate::operations::{
    CachingOperation, OperationConstructor, OperationContext, StrongCaching, WeakCaching,
};

const ALL_KINDS: [ResourceKind; 5] = [
    ResourceKind::Container,
    ResourceKind::Item,
    ResourceKind::Feed,
    ResourceKind::File,
    ResourceKind::Resource,
];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationKey {
    pub name: String,
    pub kind: ResourceKind,
}

pub struct OperationRegistry {
    entries: HashMap<OperationKey, OperationConstructor>,
}

impl OperationRegistry {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Registry with the shipped operations bound to every resource kind.
    pub fn defaults() -> Self {
        let mut registry = Self::empty();
        for kind in ALL_KINDS {
            registry.register(WeakCaching::NAME, kind, WeakCaching::construct);
            registry.register(StrongCaching::NAME, kind, StrongCaching::construct);
        }
        registry
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        kind: ResourceKind,
        constructor: OperationConstructor,
    ) {
        self.entries.insert(
            OperationKey {
                name: name.into(),
                kind,
            },
            constructor,
        );
    }

    /// Construct the operation registered for (`name`, `kind`), if any.
    pub fn construct(
        &self,
        name: &str,
        kind: ResourceKind,
        ctx: OperationContext,
    ) -> Option<Box<dyn CachingOperation>> {
        let key = OperationKey {
            name: name.to_string(),
            kind,
        };
        let Some(constructor) = self.entries.get(&key) else {
            trace!(
                operation = name,
                kind = kind.as_str(),
                outcome = "unregistered",
                "no constructor for operation and kind"
            );
            return None;
        };
        constructor(ctx)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;
    use std::sync::Arc;

    use super::*;
    use crate::config::CacheSettings;
    use crate::domain::SiteCatalog;
    use crate::ramcache::RamCache;

    fn ctx() -> OperationContext {
        OperationContext {
            settings: Arc::new(CacheSettings::default()),
            catalog: Arc::new(SiteCatalog::new("classica", "en")),
            ram: Arc::new(RamCache::new(NonZeroUsize::new(4).unwrap(), 1024)),
            rule: "content.item".to_string(),
        }
    }

    #[test]
    fn defaults_cover_both_operations_for_every_kind() {
        let registry = OperationRegistry::defaults();
        assert_eq!(registry.len(), 10);

        for kind in ALL_KINDS {
            assert!(registry.construct(WeakCaching::NAME, kind, ctx()).is_some());
            assert!(registry.construct(StrongCaching::NAME, kind, ctx()).is_some());
        }
    }

    #[test]
    fn unknown_names_construct_nothing() {
        let registry = OperationRegistry::defaults();
        assert!(
            registry
                .construct("brezza.caching.chained", ResourceKind::Item, ctx())
                .is_none()
        );
    }

    #[test]
    fn registration_is_per_kind() {
        let mut registry = OperationRegistry::empty();
        registry.register(WeakCaching::NAME, ResourceKind::Feed, WeakCaching::construct);

        assert!(
            registry
                .construct(WeakCaching::NAME, ResourceKind::Feed, ctx())
                .is_some()
        );
        assert!(
            registry
                .construct(WeakCaching::NAME, ResourceKind::Item, ctx())
                .is_none()
        );
    }
}
