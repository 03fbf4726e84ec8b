//! ETag composition from configured component sources.

use serde::{Deserialize, Serialize};

use crate::domain::{PublishedResource, SiteCatalog};
use crate::request::RequestContext;

/// A value source contributing one segment to a composed ETag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EtagComponent {
    /// Authenticated user id, empty for anonymous requests.
    UserId,
    /// Site-wide catalog counter.
    CatalogCounter,
    /// Negotiated request language.
    Language,
    /// Active site skin.
    Skin,
    /// Whether the published content is locked for editing.
    Locked,
    /// Whether the request carries a pending clipboard cookie.
    Clipboard,
}

/// Compose a quoted ETag from `components`, or None when the list is empty.
///
/// Segments join on `|` with a leading separator, so an anonymous request
/// under `[UserId, CatalogCounter]` yields `"||42"`.
pub fn compose_etag(
    components: &[EtagComponent],
    published: &PublishedResource,
    request: &RequestContext,
    catalog: &SiteCatalog,
) -> Option<String> {
    if components.is_empty() {
        return None;
    }

    let segments: Vec<String> = components
        .iter()
        .map(|component| component_value(*component, published, request, catalog))
        .collect();

    Some(format!("\"|{}\"", segments.join("|")))
}

fn component_value(
    component: EtagComponent,
    published: &PublishedResource,
    request: &RequestContext,
    catalog: &SiteCatalog,
) -> String {
    match component {
        EtagComponent::UserId => request.user.clone().unwrap_or_default(),
        EtagComponent::CatalogCounter => catalog.counter().to_string(),
        EtagComponent::Language => request.language.clone(),
        EtagComponent::Skin => request.skin.clone(),
        EtagComponent::Locked => flag(
            published
                .owner
                .as_ref()
                .is_some_and(|owner| owner.locked),
        ),
        EtagComponent::Clipboard => flag(request.clipboard),
    }
}

fn flag(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContentItem, ResourceKind};

    const BROWSER_COMPONENTS: [EtagComponent; 6] = [
        EtagComponent::UserId,
        EtagComponent::CatalogCounter,
        EtagComponent::Language,
        EtagComponent::Skin,
        EtagComponent::Locked,
        EtagComponent::Clipboard,
    ];

    fn anonymous() -> RequestContext {
        RequestContext {
            user: None,
            language: "en".to_string(),
            skin: "classica".to_string(),
            clipboard: false,
            if_none_match: None,
            if_modified_since: None,
            path: "/".to_string(),
            query: String::new(),
        }
    }

    fn folder_listing() -> PublishedResource {
        PublishedResource::view(
            "folder_listing",
            ResourceKind::Container,
            ContentItem::new("folder"),
        )
    }

    #[test]
    fn empty_component_list_yields_no_etag() {
        let catalog = SiteCatalog::new("classica", "en");
        assert!(compose_etag(&[], &folder_listing(), &anonymous(), &catalog).is_none());
    }

    #[test]
    fn anonymous_container_etag() {
        let catalog = SiteCatalog::new("classica", "en");
        let etag = compose_etag(&BROWSER_COMPONENTS, &folder_listing(), &anonymous(), &catalog);
        assert_eq!(etag.as_deref(), Some("\"||1|en|classica|0|0\""));
    }

    #[test]
    fn authenticated_user_fills_the_first_segment() {
        let catalog = SiteCatalog::new("classica", "en");
        let mut request = anonymous();
        request.user = Some("editor".to_string());

        let etag = compose_etag(&BROWSER_COMPONENTS, &folder_listing(), &request, &catalog);
        assert_eq!(etag.as_deref(), Some("\"|editor|1|en|classica|0|0\""));
    }

    #[test]
    fn locked_owner_and_clipboard_flip_the_flags() {
        let catalog = SiteCatalog::new("classica", "en");
        let published = PublishedResource::view(
            "folder_listing",
            ResourceKind::Container,
            ContentItem::new("folder").locked(),
        );
        let mut request = anonymous();
        request.clipboard = true;

        let etag = compose_etag(&BROWSER_COMPONENTS, &published, &request, &catalog);
        assert_eq!(etag.as_deref(), Some("\"||1|en|classica|1|1\""));
    }

    #[test]
    fn counter_changes_move_the_etag() {
        let catalog = SiteCatalog::new("classica", "en");
        catalog.bump();
        catalog.bump();

        let etag = compose_etag(
            &[EtagComponent::UserId, EtagComponent::CatalogCounter],
            &folder_listing(),
            &anonymous(),
            &catalog,
        );
        assert_eq!(etag.as_deref(), Some("\"||3\""));
    }

    #[test]
    fn feed_subset_omits_the_flags() {
        let catalog = SiteCatalog::new("classica", "en");
        let published = PublishedResource::view("rss", ResourceKind::Feed, ContentItem::new("folder"));
        let etag = compose_etag(
            &[
                EtagComponent::UserId,
                EtagComponent::CatalogCounter,
                EtagComponent::Language,
                EtagComponent::Skin,
            ],
            &published,
            &anonymous(),
            &catalog,
        );
        assert_eq!(etag.as_deref(), Some("\"||1|en|classica\""));
    }

    #[test]
    fn standalone_resource_reads_locked_as_unlocked() {
        let catalog = SiteCatalog::new("classica", "en");
        let published = PublishedResource::standalone("site.css", ResourceKind::Resource);
        let etag = compose_etag(&[EtagComponent::Locked], &published, &anonymous(), &catalog);
        assert_eq!(etag.as_deref(), Some("\"|0\""));
    }
}
