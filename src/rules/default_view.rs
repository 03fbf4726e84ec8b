//! Default-view resolution for content items.

use tracing::trace;

use crate::domain::content::VIEW_ACTION;
use crate::domain::{ContentItem, TypeRegistry};

/// Alias consulted when the view action target resolves to an empty id.
const DEFAULT_ALIAS: &str = "(Default)";

/// Resolve the default view name for `item`, or None when it cannot be
/// determined.
///
/// A ready browsable default wins outright. A declared-but-unconfigured
/// default falls through to the action registry, the same as a type that
/// never declared one. From the action registry, the view action target's
/// last path segment is mapped through the method-alias table and
/// normalized to a plain template id.
pub fn default_view(item: &ContentItem, types: &TypeRegistry) -> Option<String> {
    let tag = item.type_tag.as_deref()?;
    let Some(info) = types.get(tag) else {
        trace!(type_tag = tag, outcome = "unregistered", "content type is not registered");
        return None;
    };

    if let Some(view) = info.browsable_default.ready() {
        return Some(view.clone());
    }

    let target = info.actions.get(VIEW_ACTION)?;
    let action = target.rsplit('/').next().unwrap_or_default();

    let alias_key = if action.is_empty() { DEFAULT_ALIAS } else { action };
    let resolved = info
        .method_aliases
        .get(alias_key)
        .map(String::as_str)
        .unwrap_or(action);

    Some(normalize(resolved).to_string())
}

/// Strip the leading slash and view-name marker from a template id.
fn normalize(view: &str) -> &str {
    let view = view.strip_prefix('/').unwrap_or(view);
    view.strip_prefix("@@").unwrap_or(view)
}
