//! Versioned schema definitions

use std::fmt;

use jsonschema::{Draft, JSONSchema};
use serde_json::Value;

use crate::checksum::Checksum;
use crate::error::{ConfigError, Result};
use crate::validator::{self, ValidationError};
use crate::version::SchemaVersion;

/// A JSON Schema for one version of a configuration kind, compiled once
pub struct Schema {
    /// Version this schema describes
    version: SchemaVersion,
    /// The raw schema content
    content: Value,
    /// Compiled validator for `content`
    compiled: JSONSchema,
}

impl Schema {
    /// Compile a schema for `version` of `kind`
    pub fn compile(kind: &str, version: SchemaVersion, content: Value) -> Result<Self> {
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&content)
            .map_err(|e| ConfigError::InvalidSchema {
                kind: kind.to_string(),
                version: version.get(),
                message: e.to_string(),
            })?;

        Ok(Self {
            version,
            content,
            compiled,
        })
    }

    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    pub fn content(&self) -> &Value {
        &self.content
    }

    /// Compute the checksum for this schema
    pub fn checksum(&self) -> Checksum {
        Checksum::from_json(&self.content)
    }

    /// Validate a document against this schema
    pub fn validate(&self, kind: &str, doc: &Value) -> std::result::Result<(), ValidationError> {
        validator::validate(kind, self, doc)
    }

    pub(crate) fn compiled(&self) -> &JSONSchema {
        &self.compiled
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("version", &self.version)
            .field("content", &self.content)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compile_schema() {
        let schema = Schema::compile(
            "test",
            SchemaVersion::ZERO,
            json!({ "type": "object", "required": ["version"] }),
        )
        .unwrap();
        assert_eq!(schema.version(), SchemaVersion::ZERO);
        assert_eq!(schema.checksum(), Checksum::from_json(schema.content()));
    }

    #[test]
    fn test_invalid_schema_rejected() {
        let result = Schema::compile("test", SchemaVersion::ZERO, json!({ "type": 12 }));
        assert!(matches!(result, Err(ConfigError::InvalidSchema { version: 0, .. })));
    }
}
