//! Configuration kinds: a named document type with its full version history

use serde_json::Value;

use crate::codec::Format;
use crate::error::{ConfigError, Result};
use crate::migration::{MigrationChain, MigrationStep};
use crate::paths::ConfigLocation;
use crate::schema::Schema;
use crate::version::SchemaVersion;

/// A category of persisted document, immutable once built
#[derive(Debug)]
pub struct ConfigKind {
    name: String,
    file_name: String,
    format: Format,
    location: ConfigLocation,
    /// `schemas[i]` describes version `i`; the last entry is the latest
    schemas: Vec<Schema>,
    migrations: MigrationChain,
}

impl ConfigKind {
    /// Start building a kind stored as `file_name`
    pub fn builder(name: impl Into<String>, file_name: impl Into<String>) -> ConfigKindBuilder {
        ConfigKindBuilder {
            name: name.into(),
            file_name: file_name.into(),
            location: ConfigLocation::Project,
            schemas: Vec::new(),
            latest: None,
            migrations: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn location(&self) -> ConfigLocation {
        self.location
    }

    pub fn latest_version(&self) -> SchemaVersion {
        self.latest_schema().version()
    }

    pub fn latest_schema(&self) -> &Schema {
        // the builder guarantees at least one schema
        &self.schemas[self.schemas.len() - 1]
    }

    /// All schemas, oldest first
    pub fn schemas(&self) -> &[Schema] {
        &self.schemas
    }

    pub fn migrations(&self) -> &MigrationChain {
        &self.migrations
    }

    /// Schema for `version`, which may come straight from a document
    pub fn schema(&self, version: u64) -> Result<&Schema> {
        usize::try_from(version)
            .ok()
            .and_then(|i| self.schemas.get(i))
            .ok_or_else(|| ConfigError::UnknownVersion {
                kind: self.name.clone(),
                version,
                latest: self.latest_version().get(),
            })
    }
}

/// Builder for [`ConfigKind`]
pub struct ConfigKindBuilder {
    name: String,
    file_name: String,
    location: ConfigLocation,
    schemas: Vec<(u32, Value)>,
    latest: Option<Value>,
    migrations: Vec<MigrationStep>,
}

impl ConfigKindBuilder {
    pub fn location(mut self, location: ConfigLocation) -> Self {
        self.location = location;
        self
    }

    /// Add the schema for one historical version
    pub fn schema(mut self, version: u32, content: Value) -> Self {
        self.schemas.push((version, content));
        self
    }

    /// Declare the latest schema; must equal the last historical schema
    pub fn latest(mut self, content: Value) -> Self {
        self.latest = Some(content);
        self
    }

    /// Add the step migrating `from` to `from + 1`
    pub fn migration(mut self, step: MigrationStep) -> Self {
        self.migrations.push(step);
        self
    }

    /// Check version ordering, compile every schema and produce the kind
    pub fn build(self) -> Result<ConfigKind> {
        let order_err = |reason: String| ConfigError::SchemaOrder {
            kind: self.name.clone(),
            reason,
        };

        if self.schemas.is_empty() {
            return Err(order_err("no schemas supplied".into()));
        }

        for (expected, (version, _)) in self.schemas.iter().enumerate() {
            if *version as usize != expected {
                return Err(order_err(format!(
                    "schema at position {expected} declares v{version}, expected v{expected}"
                )));
            }
        }

        let last = &self.schemas[self.schemas.len() - 1].1;
        match &self.latest {
            None => return Err(order_err("no latest schema supplied".into())),
            Some(latest) if latest != last => {
                return Err(order_err(
                    "latest schema differs from the last historical schema".into(),
                ))
            }
            Some(_) => {}
        }

        let boundaries = self.schemas.len() - 1;
        if self.migrations.len() != boundaries {
            return Err(order_err(format!(
                "{} migration(s) supplied for {boundaries} version boundaries",
                self.migrations.len()
            )));
        }
        for (expected, step) in self.migrations.iter().enumerate() {
            if step.from_version().get() as usize != expected {
                return Err(order_err(format!(
                    "migration at position {expected} starts at {}, expected v{expected}",
                    step.from_version()
                )));
            }
        }

        let format = Format::from_file_name(&self.file_name)?;

        let schemas = self
            .schemas
            .into_iter()
            .map(|(version, content)| Schema::compile(&self.name, SchemaVersion::new(version), content))
            .collect::<Result<Vec<_>>>()?;

        Ok(ConfigKind {
            name: self.name,
            file_name: self.file_name,
            format,
            location: self.location,
            schemas,
            migrations: MigrationChain::new(self.migrations),
        })
    }
}
