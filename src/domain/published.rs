//! The published resource handed to the caching layer per request.

use time::OffsetDateTime;

use super::content::ContentItem;

/// Kind tag of a published resource, used for operation dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Container,
    Item,
    Feed,
    File,
    Resource,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Container => "container",
            ResourceKind::Item => "item",
            ResourceKind::Feed => "feed",
            ResourceKind::File => "file",
            ResourceKind::Resource => "resource",
        }
    }
}

/// What the host decided to publish for the current request.
///
/// Built by the host's traversal layer and inserted into request extensions
/// before the caching middleware runs. The owning container is an explicit
/// reference captured at construction; resources without a name (direct
/// object publications) or without an owner never match content-type rules.
#[derive(Debug, Clone)]
pub struct PublishedResource {
    /// Template id of the published view, when one was named.
    pub name: Option<String>,
    pub kind: ResourceKind,
    /// The content item this resource renders, if any.
    pub owner: Option<ContentItem>,
    /// Modification time of the served representation.
    pub modified: Option<OffsetDateTime>,
}

impl PublishedResource {
    /// A named view over a content item.
    pub fn view(name: impl Into<String>, kind: ResourceKind, owner: ContentItem) -> Self {
        let modified = owner.modified;
        Self {
            name: Some(name.into()),
            kind,
            owner: Some(owner),
            modified,
        }
    }

    /// A named resource with no owning content item, e.g. a static file.
    pub fn standalone(name: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            name: Some(name.into()),
            kind,
            owner: None,
            modified: None,
        }
    }

    /// A publication without a usable name; never matches any rule.
    pub fn unnamed(kind: ResourceKind) -> Self {
        Self {
            name: None,
            kind,
            owner: None,
            modified: None,
        }
    }

    pub fn modified_at(mut self, instant: OffsetDateTime) -> Self {
        self.modified = Some(instant);
        self
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn view_inherits_owner_modification_time() {
        let stamp = datetime!(2025-03-01 12:00:00 UTC);
        let owner = ContentItem::new("document").modified_at(stamp);
        let published = PublishedResource::view("document_view", ResourceKind::Item, owner);
        assert_eq!(published.modified, Some(stamp));
    }

    #[test]
    fn standalone_resource_has_no_owner() {
        let published = PublishedResource::standalone("site.css", ResourceKind::Resource);
        assert!(published.owner.is_none());
        assert_eq!(published.name.as_deref(), Some("site.css"));
    }

    #[test]
    fn modified_at_overrides_inherited_time() {
        let owner = ContentItem::new("file").modified_at(datetime!(2025-01-01 00:00:00 UTC));
        let published = PublishedResource::view("download", ResourceKind::File, owner)
            .modified_at(datetime!(2025-06-01 00:00:00 UTC));
        assert_eq!(published.modified, Some(datetime!(2025-06-01 00:00:00 UTC)));
    }
}
