//! Content items and the content-type registry.
//!
//! A `ContentItem` is the host's view of a stored object: its type tag, its
//! lock state, and its last modification time. Per-type behavior (the default
//! view declaration, the action registry, method aliases) lives in `TypeInfo`
//! records held by a `TypeRegistry` keyed on the type tag.

use std::collections::BTreeMap;

use time::OffsetDateTime;
use uuid::Uuid;

/// Action id under which a content type publishes its canonical view target.
pub const VIEW_ACTION: &str = "object/view";

/// Outcome of probing a per-type capability.
///
/// `Absent` means the type never declared the capability. `Unconfigured`
/// means the capability is declared but has not been set up yet, so callers
/// fall through to their next strategy instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Capability<T> {
    #[default]
    Absent,
    Unconfigured,
    Ready(T),
}

impl<T> Capability<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Capability::Ready(value) => Some(value),
            Capability::Absent | Capability::Unconfigured => None,
        }
    }
}

/// A stored content object as seen by the caching layer.
#[derive(Debug, Clone)]
pub struct ContentItem {
    pub id: Uuid,
    /// Type tag used for rule dispatch; `None` for untyped containers.
    pub type_tag: Option<String>,
    pub locked: bool,
    pub modified: Option<OffsetDateTime>,
}

impl ContentItem {
    pub fn new(type_tag: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            type_tag: Some(type_tag.into()),
            locked: false,
            modified: None,
        }
    }

    pub fn untyped() -> Self {
        Self {
            id: Uuid::new_v4(),
            type_tag: None,
            locked: false,
            modified: None,
        }
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    pub fn modified_at(mut self, instant: OffsetDateTime) -> Self {
        self.modified = Some(instant);
        self
    }
}

/// Per-type registration consulted during default-view resolution.
#[derive(Debug, Clone, Default)]
pub struct TypeInfo {
    /// Declared default view, when the type supports browsable defaults.
    pub browsable_default: Capability<String>,
    /// Action id to target URL, e.g. `object/view` to the view template.
    pub actions: BTreeMap<String, String>,
    /// Method alias to template id, e.g. `(Default)` to `listing_view`.
    pub method_aliases: BTreeMap<String, String>,
}

impl TypeInfo {
    pub fn with_browsable_default(mut self, view: impl Into<String>) -> Self {
        self.browsable_default = Capability::Ready(view.into());
        self
    }

    pub fn with_unconfigured_default(mut self) -> Self {
        self.browsable_default = Capability::Unconfigured;
        self
    }

    pub fn with_action(mut self, id: impl Into<String>, target: impl Into<String>) -> Self {
        self.actions.insert(id.into(), target.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>, template: impl Into<String>) -> Self {
        self.method_aliases.insert(alias.into(), template.into());
        self
    }
}

/// Registry of content types keyed by type tag.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: BTreeMap<String, TypeInfo>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tag: impl Into<String>, info: TypeInfo) {
        self.types.insert(tag.into(), info);
    }

    pub fn get(&self, tag: &str) -> Option<&TypeInfo> {
        self.types.get(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_defaults_to_absent() {
        let capability: Capability<String> = Capability::default();
        assert_eq!(capability, Capability::Absent);
        assert!(capability.ready().is_none());
    }

    #[test]
    fn capability_ready_exposes_value() {
        let capability = Capability::Ready("summary_view".to_string());
        assert_eq!(capability.ready().map(String::as_str), Some("summary_view"));
    }

    #[test]
    fn registry_roundtrip() {
        let mut registry = TypeRegistry::new();
        registry.register(
            "document",
            TypeInfo::default().with_action(VIEW_ACTION, "document_view"),
        );

        let info = registry.get("document").expect("registered type");
        assert_eq!(
            info.actions.get(VIEW_ACTION).map(String::as_str),
            Some("document_view")
        );
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn untyped_item_has_no_tag() {
        let item = ContentItem::untyped();
        assert!(item.type_tag.is_none());
        assert!(!item.locked);
    }
}
