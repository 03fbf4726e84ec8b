//! Ruleset resolution for a published resource.

use tracing::{debug, trace};

use crate::config::CacheSettings;
use crate::domain::{PublishedResource, TypeRegistry};

use super::default_view::default_view;

/// Resolves a published resource to the name of a cache rule.
///
/// Template-name matches take absolute priority. The content-type path only
/// applies when the published view is the owning item's default view, so a
/// non-default rendering of an otherwise cacheable type stays unruled.
pub struct RulesetResolver<'a> {
    settings: &'a CacheSettings,
    types: &'a TypeRegistry,
}

impl<'a> RulesetResolver<'a> {
    pub fn new(settings: &'a CacheSettings, types: &'a TypeRegistry) -> Self {
        Self { settings, types }
    }

    /// Resolve the cache rule for `published`, or None when nothing applies.
    pub fn resolve(&self, published: &PublishedResource) -> Option<String> {
        if !self.settings.enabled {
            trace!(outcome = "disabled", "caching is globally disabled");
            return None;
        }

        let name = published.name.as_deref()?;

        if let Some(rule) = self.settings.templates.get(name) {
            debug!(
                template = name,
                rule = %rule,
                outcome = "template",
                "rule matched by template name"
            );
            return Some(rule.clone());
        }

        let owner = published.owner.as_ref()?;
        let type_tag = owner.type_tag.as_deref()?;

        let declared = default_view(owner, self.types)?;
        if declared != name {
            trace!(
                template = name,
                default_view = %declared,
                outcome = "non_default_view",
                "published view is not the default view"
            );
            return None;
        }

        let rule = self.settings.content_types.get(type_tag)?;
        debug!(
            content_type = type_tag,
            rule = %rule,
            outcome = "content_type",
            "rule matched by content type"
        );
        Some(rule.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::VIEW_ACTION;
    use crate::domain::{ContentItem, ResourceKind, TypeInfo};

    fn settings() -> CacheSettings {
        let mut settings = CacheSettings::default();
        settings
            .templates
            .insert("rss".to_string(), "content.feed".to_string());
        settings
            .content_types
            .insert("folder".to_string(), "content.container".to_string());
        settings
    }

    fn types() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register(
            "folder",
            TypeInfo::default().with_action(VIEW_ACTION, "string:${folder_url}/folder_listing"),
        );
        registry
    }

    fn resolve(published: &PublishedResource) -> Option<String> {
        let settings = settings();
        let types = types();
        RulesetResolver::new(&settings, &types).resolve(published)
    }

    #[test]
    fn template_match_wins_regardless_of_type() {
        let published =
            PublishedResource::view("rss", ResourceKind::Feed, ContentItem::new("folder"));
        assert_eq!(resolve(&published).as_deref(), Some("content.feed"));
    }

    #[test]
    fn template_match_needs_no_owner() {
        let published = PublishedResource::standalone("rss", ResourceKind::Feed);
        assert_eq!(resolve(&published).as_deref(), Some("content.feed"));
    }

    #[test]
    fn default_view_matches_by_content_type() {
        let published = PublishedResource::view(
            "folder_listing",
            ResourceKind::Container,
            ContentItem::new("folder"),
        );
        assert_eq!(resolve(&published).as_deref(), Some("content.container"));
    }

    #[test]
    fn non_default_view_matches_nothing() {
        let published = PublishedResource::view(
            "folder_tabular",
            ResourceKind::Container,
            ContentItem::new("folder"),
        );
        assert!(resolve(&published).is_none());
    }

    #[test]
    fn unnamed_untyped_and_unmapped_resources_match_nothing() {
        assert!(resolve(&PublishedResource::unnamed(ResourceKind::Item)).is_none());
        assert!(
            resolve(&PublishedResource::view(
                "folder_listing",
                ResourceKind::Container,
                ContentItem::untyped(),
            ))
            .is_none()
        );
        assert!(resolve(&PublishedResource::standalone("site.css", ResourceKind::Resource)).is_none());
    }

    #[test]
    fn disabled_settings_match_nothing() {
        let mut settings = settings();
        settings.enabled = false;
        let types = types();
        let published =
            PublishedResource::view("rss", ResourceKind::Feed, ContentItem::new("folder"));
        assert!(RulesetResolver::new(&settings, &types).resolve(&published).is_none());
    }

    #[test]
    fn repeated_resolution_is_stable() {
        let settings = settings();
        let types = types();
        let resolver = RulesetResolver::new(&settings, &types);
        let published = PublishedResource::view(
            "folder_listing",
            ResourceKind::Container,
            ContentItem::new("folder"),
        );
        let first = resolver.resolve(&published);
        assert_eq!(first.as_deref(), Some("content.container"));
        assert_eq!(resolver.resolve(&published), first);
    }
}
