//! Site-wide facts the cache varies on.

use std::sync::atomic::{AtomicU64, Ordering};

/// Site catalog state shared across requests.
///
/// The counter increases whenever the host reindexes content; cache keys and
/// ETags embed it, so a bump makes every previously issued validator and RAM
/// entry unreachable without explicit eviction.
#[derive(Debug)]
pub struct SiteCatalog {
    counter: AtomicU64,
    skin: String,
    default_language: String,
}

impl SiteCatalog {
    pub fn new(skin: impl Into<String>, default_language: impl Into<String>) -> Self {
        Self {
            counter: AtomicU64::new(1),
            skin: skin.into(),
            default_language: default_language.into(),
        }
    }

    pub fn counter(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }

    /// Advance the counter after a content index change; returns the new value.
    pub fn bump(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn skin(&self) -> &str {
        &self.skin
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_starts_at_one_and_bumps() {
        let catalog = SiteCatalog::new("classica", "en");
        assert_eq!(catalog.counter(), 1);
        assert_eq!(catalog.bump(), 2);
        assert_eq!(catalog.counter(), 2);
    }

    #[test]
    fn site_facts_are_exposed() {
        let catalog = SiteCatalog::new("classica", "it");
        assert_eq!(catalog.skin(), "classica");
        assert_eq!(catalog.default_language(), "it");
    }
}
