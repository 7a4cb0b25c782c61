//! Structural validation of documents against versioned schemas
//!
//! Validation never coerces: a document either matches the schema for its
//! version as-is, or the caller gets every violation with its location.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::schema::Schema;
use crate::version::SchemaVersion;

/// A single schema rule violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// JSON pointer into the document (e.g., "/workers/0/name")
    pub path: String,
    /// Human-readable description of the broken rule
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// A document failed validation against a schema version
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{kind}' document does not match schema {version}: {}", render(.violations))]
pub struct ValidationError {
    pub kind: String,
    pub version: SchemaVersion,
    pub violations: Vec<Violation>,
}

fn render(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validate `doc` against `schema`, collecting every violation
pub fn validate(kind: &str, schema: &Schema, doc: &Value) -> Result<(), ValidationError> {
    let result = schema.compiled().validate(doc);
    let Err(errors) = result else {
        return Ok(());
    };

    let mut violations: Vec<Violation> = errors
        .map(|e| {
            let path = e.instance_path.to_string();
            Violation {
                path: if path.is_empty() { "/".to_string() } else { path },
                message: e.to_string(),
            }
        })
        .collect();
    violations.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.message.cmp(&b.message)));

    Err(ValidationError {
        kind: kind.to_string(),
        version: schema.version(),
        violations,
    })
}

/// Validate and then deserialize into the typed shape for this version
pub fn validate_as<T: DeserializeOwned>(
    kind: &str,
    schema: &Schema,
    doc: &Value,
) -> Result<T, ValidationError> {
    validate(kind, schema, doc)?;
    T::deserialize(doc).map_err(|e| ValidationError {
        kind: kind.to_string(),
        version: schema.version(),
        violations: vec![Violation {
            path: "/".to_string(),
            message: e.to_string(),
        }],
    })
}
