//! Tool system: trait, registry, parameter schemas, and argument validation.

pub mod registry;
pub mod tool;
pub mod types;
pub mod validation;

pub use registry::ToolRegistry;
pub use tool::{FnTool, Tool};
pub use types::ToolParameters;
