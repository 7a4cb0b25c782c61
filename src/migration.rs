//! Ordered migration chains
//!
//! A chain holds exactly one step per version boundary. Walking it always
//! visits every intermediate version, validating before and after each step,
//! so adding a version only ever means writing one new step.

use std::fmt;

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::error::Corruption;
use crate::schema::Schema;
use crate::version::{stamp_version, SchemaVersion};

/// Failure raised by a migration step
#[derive(Error, Debug, Clone)]
#[error("{0}")]
pub struct MigrationError(String);

impl MigrationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

type StepFn = dyn Fn(Value) -> Result<Value, MigrationError> + Send + Sync;

/// Transformation of a document from `from` to `from + 1`
pub struct MigrationStep {
    from: SchemaVersion,
    apply: Box<StepFn>,
}

impl MigrationStep {
    pub fn new(
        from: u32,
        apply: impl Fn(Value) -> Result<Value, MigrationError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            from: SchemaVersion::new(from),
            apply: Box::new(apply),
        }
    }

    pub fn from_version(&self) -> SchemaVersion {
        self.from
    }

    pub fn to_version(&self) -> SchemaVersion {
        self.from.next()
    }
}

impl fmt::Debug for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MigrationStep({} -> {})", self.from, self.to_version())
    }
}

/// Result of walking the chain
#[derive(Debug, Clone, PartialEq)]
pub struct Migrated {
    pub document: Value,
    /// Versions whose outgoing step ran, in order
    pub applied: Vec<SchemaVersion>,
}

impl Migrated {
    pub fn was_migrated(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// The ordered steps of one configuration kind
#[derive(Debug, Default)]
pub struct MigrationChain {
    steps: Vec<MigrationStep>,
}

impl MigrationChain {
    /// Build a chain; ordering is checked by the kind builder
    pub(crate) fn new(steps: Vec<MigrationStep>) -> Self {
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[MigrationStep] {
        &self.steps
    }

    /// Bring `document`, declared at `from`, up to the last schema in `schemas`.
    ///
    /// `schemas[i]` must be the schema for version `i` and `self.steps[i]`
    /// the step leaving version `i`. A `from` past the last schema, or a
    /// missing step, is `Corruption::OutOfChain`.
    pub fn run(
        &self,
        kind: &str,
        schemas: &[Schema],
        mut document: Value,
        from: SchemaVersion,
    ) -> Result<Migrated, Corruption> {
        let out_of_chain = |version: SchemaVersion| Corruption::OutOfChain {
            version: version.get(),
            schemas: schemas.len(),
        };
        let latest = SchemaVersion::new(schemas.len().saturating_sub(1) as u32);
        let mut current = from;
        let mut applied = Vec::new();

        loop {
            let schema = schemas
                .get(current.get() as usize)
                .ok_or_else(|| out_of_chain(current))?;
            schema.validate(kind, &document)?;

            if current == latest {
                return Ok(Migrated { document, applied });
            }

            let step = self
                .steps
                .get(current.get() as usize)
                .ok_or_else(|| out_of_chain(current))?;
            let next = step.to_version();
            info!(kind, from = %current, to = %next, "Running config migration");

            document = (step.apply)(document).map_err(|e| Corruption::MigrationFailed {
                from: current.get(),
                to: next.get(),
                message: e.to_string(),
            })?;
            stamp_version(&mut document, next)?;

            applied.push(current);
            current = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schemas() -> Vec<Schema> {
        vec![
            Schema::compile(
                "x",
                SchemaVersion::new(0),
                json!({
                    "type": "object",
                    "properties": { "version": { "const": 0 }, "name": { "type": "string" } },
                    "required": ["name"]
                }),
            )
            .unwrap(),
            Schema::compile(
                "x",
                SchemaVersion::new(1),
                json!({
                    "type": "object",
                    "properties": {
                        "version": { "const": 1 },
                        "name": { "type": "string" },
                        "workers": { "type": "array" }
                    },
                    "required": ["version", "name", "workers"]
                }),
            )
            .unwrap(),
            Schema::compile(
                "x",
                SchemaVersion::new(2),
                json!({
                    "type": "object",
                    "properties": {
                        "version": { "const": 2 },
                        "title": { "type": "string" },
                        "workers": { "type": "array" }
                    },
                    "required": ["version", "title", "workers"]
                }),
            )
            .unwrap(),
        ]
    }

    fn chain() -> MigrationChain {
        MigrationChain::new(vec![
            MigrationStep::new(0, |mut doc| {
                doc["workers"] = json!([]);
                Ok(doc)
            }),
            MigrationStep::new(1, |mut doc| {
                let name = doc["name"].take();
                let map = doc.as_object_mut().ok_or_else(|| MigrationError::new("not a map"))?;
                map.remove("name");
                map.insert("title".to_string(), name);
                Ok(doc)
            }),
        ])
    }

    #[test]
    fn test_walks_every_step() {
        let migrated = chain()
            .run("x", &schemas(), json!({"version": 0, "name": "a"}), SchemaVersion::ZERO)
            .unwrap();
        assert_eq!(migrated.document, json!({"version": 2, "title": "a", "workers": []}));
        assert_eq!(migrated.applied, vec![SchemaVersion::new(0), SchemaVersion::new(1)]);
    }

    #[test]
    fn test_starts_mid_chain() {
        let migrated = chain()
            .run(
                "x",
                &schemas(),
                json!({"version": 1, "name": "a", "workers": [1]}),
                SchemaVersion::new(1),
            )
            .unwrap();
        assert_eq!(migrated.document, json!({"version": 2, "title": "a", "workers": [1]}));
        assert_eq!(migrated.applied, vec![SchemaVersion::new(1)]);
    }

    #[test]
    fn test_latest_is_noop() {
        let doc = json!({"version": 2, "title": "a", "workers": []});
        let migrated = chain()
            .run("x", &schemas(), doc.clone(), SchemaVersion::new(2))
            .unwrap();
        assert_eq!(migrated.document, doc);
        assert!(!migrated.was_migrated());
    }

    #[test]
    fn test_invalid_source_is_corrupt() {
        let err = chain()
            .run("x", &schemas(), json!({"version": 0, "name": 3}), SchemaVersion::ZERO)
            .unwrap_err();
        assert!(matches!(err, Corruption::Invalid(ref v) if v.version == SchemaVersion::ZERO));
    }

    #[test]
    fn test_failing_step_aborts() {
        let chain = MigrationChain::new(vec![
            MigrationStep::new(0, |_| Err(MigrationError::new("boom"))),
            MigrationStep::new(1, Ok),
        ]);
        let err = chain
            .run("x", &schemas(), json!({"version": 0, "name": "a"}), SchemaVersion::ZERO)
            .unwrap_err();
        assert!(matches!(err, Corruption::MigrationFailed { from: 0, to: 1, .. }));
    }

    #[test]
    fn test_step_output_must_match_target() {
        // forgets to add `workers`
        let chain = MigrationChain::new(vec![MigrationStep::new(0, Ok), MigrationStep::new(1, Ok)]);
        let err = chain
            .run("x", &schemas(), json!({"version": 0, "name": "a"}), SchemaVersion::ZERO)
            .unwrap_err();
        assert!(matches!(err, Corruption::Invalid(ref v) if v.version == SchemaVersion::new(1)));
    }

    #[test]
    fn test_version_past_chain_is_error() {
        let err = chain()
            .run("x", &schemas(), json!({"version": 5}), SchemaVersion::new(5))
            .unwrap_err();
        assert!(matches!(err, Corruption::OutOfChain { version: 5, schemas: 3 }));

        let err = chain()
            .run("x", &[], json!({"version": 0}), SchemaVersion::ZERO)
            .unwrap_err();
        assert!(matches!(err, Corruption::OutOfChain { version: 0, schemas: 0 }));
    }

    #[test]
    fn test_missing_step_is_error() {
        let short = MigrationChain::new(vec![MigrationStep::new(0, Ok)]);
        let doc = json!({"version": 1, "name": "a", "workers": []});
        let err = short
            .run("x", &schemas(), doc, SchemaVersion::new(1))
            .unwrap_err();
        assert!(matches!(err, Corruption::OutOfChain { version: 1, schemas: 3 }));
    }
}
