//! Rule resolution: from published resource to cache rule to operation.

pub mod default_view;
pub mod lookup;
pub mod registry;
pub mod resolver;

pub use default_view::default_view;
pub use lookup::{OperationLookup, OperationPhase, OperationResolution};
pub use registry::{OperationKey, OperationRegistry};
pub use resolver::RulesetResolver;
