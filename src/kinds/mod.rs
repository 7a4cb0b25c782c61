//! Built-in configuration kinds

pub mod deployed;

use crate::error::Result;
use crate::registry::SchemaRegistry;

/// Base `$id` for every published config schema
pub const TOP_LEVEL_SCHEMA_ID: &str = "https://fluence.dev/schemas";

/// A registry with every built-in kind registered
pub fn builtin_registry() -> Result<SchemaRegistry> {
    let mut registry = SchemaRegistry::new();
    registry.register(deployed::kind()?)?;
    Ok(registry)
}
