//! Configuration Store
//!
//! Loads a kind's document from disk, migrates it to the latest version and
//! hands it out as a readonly or mutable handle. Migrated documents are
//! written back even for readonly loads: "readonly" describes the handle,
//! not the file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::checksum::Checksum;
use crate::error::{ConfigError, Corruption, Result};
use crate::fs::{ConfigFs, LocalFs};
use crate::kind::ConfigKind;
use crate::paths::{DirsResolver, PathResolver};
use crate::registry::SchemaRegistry;
use crate::settings::{JsonStyle, StoreSettings};
use crate::version::{self, SchemaVersion};

/// Loads and persists configuration documents for registered kinds
pub struct ConfigStore<F: ConfigFs = LocalFs> {
    registry: Arc<SchemaRegistry>,
    resolver: Arc<dyn PathResolver>,
    fs: Arc<F>,
    json_style: JsonStyle,
    self_heal: bool,
}

impl ConfigStore<LocalFs> {
    pub fn new(registry: Arc<SchemaRegistry>, resolver: impl PathResolver + 'static) -> Self {
        Self {
            registry,
            resolver: Arc::new(resolver),
            fs: Arc::new(LocalFs),
            json_style: JsonStyle::default(),
            self_heal: true,
        }
    }

    /// Build a store on the local filesystem from loaded settings
    pub fn from_settings(registry: Arc<SchemaRegistry>, settings: &StoreSettings) -> Self {
        Self::new(registry, DirsResolver::from_settings(settings))
            .with_json_style(settings.output.json_style)
            .with_self_heal(settings.migration.self_heal)
    }
}

impl<F: ConfigFs> ConfigStore<F> {
    /// Swap the file collaborator
    pub fn with_fs<G: ConfigFs>(self, fs: G) -> ConfigStore<G> {
        ConfigStore {
            registry: self.registry,
            resolver: self.resolver,
            fs: Arc::new(fs),
            json_style: self.json_style,
            self_heal: self.self_heal,
        }
    }

    pub fn with_json_style(mut self, json_style: JsonStyle) -> Self {
        self.json_style = json_style;
        self
    }

    /// Whether loads rewrite migrated documents on disk
    pub fn with_self_heal(mut self, self_heal: bool) -> Self {
        self.self_heal = self_heal;
        self
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Where the file for `kind` lives
    pub fn path_for(&self, kind: &str) -> Result<PathBuf> {
        let kind = self.registry.get(kind)?;
        self.path_of(&kind)
    }

    /// Load a kind without a mutation API; fails with `NotFound` if absent
    pub fn load_readonly(&self, kind: &str) -> Result<ReadonlyConfig> {
        self.load_document(kind, None::<fn() -> Value>)
            .map(ReadonlyConfig::from_loaded)
    }

    /// Load a kind, creating it from `default` when absent
    pub fn load_readonly_or_init(
        &self,
        kind: &str,
        default: impl FnOnce() -> Value,
    ) -> Result<ReadonlyConfig> {
        self.load_document(kind, Some(default))
            .map(ReadonlyConfig::from_loaded)
    }

    /// Load a kind for editing; fails with `NotFound` if absent
    pub fn load(&self, kind: &str) -> Result<Config<F>> {
        let loaded = self.load_document(kind, None::<fn() -> Value>)?;
        Ok(self.mutable(loaded))
    }

    /// Load a kind for editing, creating it from `default` when absent
    pub fn load_or_init(&self, kind: &str, default: impl FnOnce() -> Value) -> Result<Config<F>> {
        let loaded = self.load_document(kind, Some(default))?;
        Ok(self.mutable(loaded))
    }

    fn mutable(&self, loaded: Loaded) -> Config<F> {
        Config {
            meta: loaded.meta,
            document: loaded.document,
            persisted: loaded.persisted,
            fs: Arc::clone(&self.fs),
            json_style: self.json_style,
        }
    }

    fn path_of(&self, kind: &ConfigKind) -> Result<PathBuf> {
        Ok(self
            .resolver
            .config_dir(kind.location())?
            .join(kind.file_name()))
    }

    fn load_document(
        &self,
        kind_name: &str,
        default: Option<impl FnOnce() -> Value>,
    ) -> Result<Loaded> {
        let kind = self.registry.get(kind_name)?;
        let path = self.path_of(&kind)?;
        debug!(kind = kind.name(), path = %path.display(), "Loading config");

        let bytes = self.fs.read(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;

        let Some(bytes) = bytes else {
            let Some(default) = default else {
                return Err(ConfigError::NotFound {
                    kind: kind.name().to_string(),
                    path,
                });
            };
            return self.create_default(kind, path, default());
        };

        let parsed = kind.format().parse(&path, &bytes)?;
        let corrupt = |reason: Corruption| ConfigError::CorruptConfig {
            kind: kind.name().to_string(),
            path: path.clone(),
            reason,
        };

        let mut document = parsed.clone();
        let from = match version::declared_version(&document).map_err(corrupt)? {
            Some(declared) => kind.schema(declared)?.version(),
            None => SchemaVersion::ZERO,
        };
        // Absent and integral-float versions are rewritten as integers
        version::stamp_version(&mut document, from).map_err(corrupt)?;

        let migrated = kind
            .migrations()
            .run(kind.name(), kind.schemas(), document, from)
            .map_err(corrupt)?;
        let migrated_from = migrated.was_migrated().then_some(from);
        let document = migrated.document;

        let persisted = if document == parsed {
            Checksum::from_json(&parsed)
        } else if self.self_heal {
            self.persist(&kind, &path, &document)?;
            info!(
                kind = kind.name(),
                from = %from,
                to = %kind.latest_version(),
                "Persisted migrated config"
            );
            Checksum::from_json(&document)
        } else {
            warn!(
                kind = kind.name(),
                path = %path.display(),
                "Config migrated in memory only; self-heal is disabled"
            );
            Checksum::from_json(&parsed)
        };

        Ok(Loaded {
            meta: ConfigMeta {
                kind,
                path,
                existed: true,
                created: false,
                migrated_from,
            },
            document,
            persisted,
        })
    }

    fn create_default(&self, kind: Arc<ConfigKind>, path: PathBuf, document: Value) -> Result<Loaded> {
        kind.latest_schema()
            .validate(kind.name(), &document)
            .map_err(|source| ConfigError::DefaultShape {
                kind: kind.name().to_string(),
                source,
            })?;

        self.persist(&kind, &path, &document)?;
        info!(kind = kind.name(), path = %path.display(), "Created default config");

        Ok(Loaded {
            persisted: Checksum::from_json(&document),
            meta: ConfigMeta {
                kind,
                path,
                existed: false,
                created: true,
                migrated_from: None,
            },
            document,
        })
    }

    fn persist(&self, kind: &ConfigKind, path: &Path, document: &Value) -> Result<()> {
        write_document(self.fs.as_ref(), kind, path, document, self.json_style)
    }
}

fn write_document<F: ConfigFs + ?Sized>(
    fs: &F,
    kind: &ConfigKind,
    path: &Path,
    document: &Value,
    json_style: JsonStyle,
) -> Result<()> {
    let bytes = kind.format().serialize(kind.name(), document, json_style)?;
    fs.write(path, &bytes).map_err(|source| ConfigError::Persist {
        path: path.to_path_buf(),
        source,
    })
}

struct Loaded {
    meta: ConfigMeta,
    document: Value,
    persisted: Checksum,
}

/// Where a loaded document came from and what happened to it
#[derive(Debug, Clone)]
pub struct ConfigMeta {
    kind: Arc<ConfigKind>,
    path: PathBuf,
    existed: bool,
    created: bool,
    migrated_from: Option<SchemaVersion>,
}

impl ConfigMeta {
    pub fn kind(&self) -> &ConfigKind {
        &self.kind
    }

    /// Absolute (or resolver-relative) path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file was on disk before this load
    pub fn existed(&self) -> bool {
        self.existed
    }

    /// Whether this load created the file from a default
    pub fn was_created(&self) -> bool {
        self.created
    }

    /// The on-disk version, if the document had to be migrated
    pub fn migrated_from(&self) -> Option<SchemaVersion> {
        self.migrated_from
    }
}

/// A latest-version document with no mutation API
#[derive(Debug, Clone)]
pub struct ReadonlyConfig {
    meta: ConfigMeta,
    document: Value,
}

impl ReadonlyConfig {
    fn from_loaded(loaded: Loaded) -> Self {
        Self {
            meta: loaded.meta,
            document: loaded.document,
        }
    }

    pub fn meta(&self) -> &ConfigMeta {
        &self.meta
    }

    pub fn path(&self) -> &Path {
        self.meta.path()
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Top-level field lookup
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.document.get(key)
    }

    /// Deserialize into the latest typed shape
    pub fn typed<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(T::deserialize(&self.document)?)
    }

    /// The document rendered in its file format
    pub fn to_config_string(&self) -> Result<String> {
        render(&self.meta.kind, &self.document)
    }

    pub fn into_document(self) -> Value {
        self.document
    }
}

/// A latest-version document that can be edited and saved back
#[derive(Debug)]
pub struct Config<F: ConfigFs = LocalFs> {
    meta: ConfigMeta,
    document: Value,
    /// Checksum of the document as it is on disk
    persisted: Checksum,
    fs: Arc<F>,
    json_style: JsonStyle,
}

impl<F: ConfigFs> Config<F> {
    pub fn meta(&self) -> &ConfigMeta {
        &self.meta
    }

    pub fn path(&self) -> &Path {
        self.meta.path()
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Direct access; the shape is checked again on `save`
    pub fn document_mut(&mut self) -> &mut Value {
        &mut self.document
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.document.get(key)
    }

    /// Set a top-level field
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Result<()> {
        let map = self
            .document
            .as_object_mut()
            .ok_or_else(|| ConfigError::CorruptConfig {
                kind: self.meta.kind.name().to_string(),
                path: self.meta.path.clone(),
                reason: Corruption::NotAMapping,
            })?;
        map.insert(key.into(), value);
        Ok(())
    }

    /// Apply an edit closure to the document
    pub fn update(&mut self, edit: impl FnOnce(&mut Value)) {
        edit(&mut self.document);
    }

    pub fn typed<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(T::deserialize(&self.document)?)
    }

    /// Replace the document with a typed value, if it matches the latest schema
    pub fn replace_typed<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let document = serde_json::to_value(value)?;
        self.meta
            .kind
            .latest_schema()
            .validate(self.meta.kind.name(), &document)?;
        self.document = document;
        Ok(())
    }

    /// Whether the in-memory document differs from what is on disk
    pub fn is_dirty(&self) -> bool {
        Checksum::from_json(&self.document) != self.persisted
    }

    /// Validate against the latest schema and overwrite the backing file.
    ///
    /// Nothing is written and the handle is unchanged if validation or the
    /// write fails.
    pub fn save(&mut self) -> Result<()> {
        let kind = &self.meta.kind;
        kind.latest_schema().validate(kind.name(), &self.document)?;
        write_document(
            self.fs.as_ref(),
            kind,
            &self.meta.path,
            &self.document,
            self.json_style,
        )?;

        self.persisted = Checksum::from_json(&self.document);
        self.meta.existed = true;
        debug!(kind = kind.name(), path = %self.meta.path.display(), "Saved config");
        Ok(())
    }

    pub fn to_config_string(&self) -> Result<String> {
        render(&self.meta.kind, &self.document)
    }

    /// Drop the mutation API
    pub fn into_readonly(self) -> ReadonlyConfig {
        ReadonlyConfig {
            meta: self.meta,
            document: self.document,
        }
    }
}

fn render(kind: &ConfigKind, document: &Value) -> Result<String> {
    let bytes = kind
        .format()
        .serialize(kind.name(), document, JsonStyle::Pretty)?;
    String::from_utf8(bytes).map_err(|e| ConfigError::Serialize {
        kind: kind.name().to_string(),
        format: kind.format().name(),
        message: e.to_string(),
    })
}
