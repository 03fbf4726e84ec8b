//! Domain layer types and invariants.

pub mod catalog;
pub mod content;
pub mod published;

pub use catalog::SiteCatalog;
pub use content::{Capability, ContentItem, TypeInfo, TypeRegistry};
pub use published::{PublishedResource, ResourceKind};
