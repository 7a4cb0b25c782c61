//! Schema Registry
//!
//! Holds every configuration kind known to the process. Kinds are registered
//! once at startup; afterwards the registry is read-only and shared by `Arc`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::checksum::Checksum;
use crate::error::{ConfigError, Result};
use crate::kind::ConfigKind;
use crate::schema::Schema;
use crate::version::SchemaVersion;

/// The registry of configuration kinds
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    kinds: BTreeMap<String, Arc<ConfigKind>>,
}

/// One exported kind in `manifest.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedKind {
    pub name: String,
    pub file: String,
    pub latest_version: SchemaVersion,
    pub checksum: Checksum,
}

/// Manifest written alongside exported schemas
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportManifest {
    pub generated_at: DateTime<Utc>,
    pub kinds: Vec<ExportedKind>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kind; names must be unique
    pub fn register(&mut self, kind: ConfigKind) -> Result<Arc<ConfigKind>> {
        if self.kinds.contains_key(kind.name()) {
            return Err(ConfigError::AlreadyRegistered(kind.name().to_string()));
        }

        let kind = Arc::new(kind);
        self.kinds.insert(kind.name().to_string(), Arc::clone(&kind));
        Ok(kind)
    }

    /// Get a kind by name
    pub fn get(&self, name: &str) -> Result<Arc<ConfigKind>> {
        self.kinds
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownKind(name.to_string()))
    }

    /// Get the schema for `version` of a kind
    pub fn lookup(&self, name: &str, version: u64) -> Result<&Schema> {
        self.kinds
            .get(name)
            .ok_or_else(|| ConfigError::UnknownKind(name.to_string()))?
            .schema(version)
    }

    /// All kinds, sorted by name
    pub fn kinds(&self) -> impl Iterator<Item = &Arc<ConfigKind>> {
        self.kinds.values()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Export the latest schema of every kind to a directory (for editors)
    ///
    /// Writes `<kind>.schema.json` per kind, `checksums.sha256` and
    /// `manifest.json`.
    pub fn export_schemas(&self, output_dir: impl AsRef<Path>) -> Result<ExportManifest> {
        let output = output_dir.as_ref();
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| ConfigError::Io { path, source }
        };
        fs::create_dir_all(output).map_err(io_err(output))?;

        let mut exported = Vec::new();
        for kind in self.kinds.values() {
            let schema = kind.latest_schema();
            let file = format!("{}.schema.json", kind.name());
            let path = output.join(&file);
            let content = serde_json::to_string_pretty(schema.content())?;
            fs::write(&path, &content).map_err(io_err(&path))?;

            exported.push(ExportedKind {
                name: kind.name().to_string(),
                file,
                latest_version: schema.version(),
                checksum: schema.checksum(),
            });
        }

        let checksums_path = output.join("checksums.sha256");
        let checksums_content: String = exported
            .iter()
            .map(|k| format!("{}  {}", k.checksum, k.file))
            .collect::<Vec<_>>()
            .join("\n");
        fs::write(&checksums_path, &checksums_content).map_err(io_err(&checksums_path))?;

        let manifest = ExportManifest {
            generated_at: Utc::now(),
            kinds: exported,
        };
        let manifest_path = output.join("manifest.json");
        let manifest_content = serde_json::to_string_pretty(&manifest)?;
        fs::write(&manifest_path, &manifest_content).map_err(io_err(&manifest_path))?;

        info!(dir = %output.display(), kinds = manifest.kinds.len(), "Exported config schemas");
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn kind(name: &str) -> ConfigKind {
        let schema = json!({
            "type": "object",
            "properties": { "version": { "type": "number", "const": 0 } },
            "required": ["version"]
        });
        ConfigKind::builder(name, format!("{name}.yaml"))
            .schema(0, schema.clone())
            .latest(schema)
            .build()
            .unwrap()
    }

    #[test]
    fn test_create_registry() {
        let registry = SchemaRegistry::new();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = SchemaRegistry::new();
        registry.register(kind("deployed")).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("deployed").unwrap().name(), "deployed");
        assert_eq!(registry.lookup("deployed", 0).unwrap().version(), SchemaVersion::ZERO);
        assert!(matches!(
            registry.lookup("deployed", 1),
            Err(ConfigError::UnknownVersion { .. })
        ));
        assert!(matches!(registry.get("secrets"), Err(ConfigError::UnknownKind(_))));
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = SchemaRegistry::new();
        registry.register(kind("deployed")).unwrap();
        let result = registry.register(kind("deployed"));
        assert!(matches!(result, Err(ConfigError::AlreadyRegistered(_))));
    }

    #[test]
    fn test_kinds_sorted() {
        let mut registry = SchemaRegistry::new();
        registry.register(kind("b")).unwrap();
        registry.register(kind("a")).unwrap();
        let names: Vec<_> = registry.kinds().map(|k| k.name().to_string()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_export_schemas() {
        let dir = tempdir().unwrap();
        let mut registry = SchemaRegistry::new();
        registry.register(kind("deployed")).unwrap();

        let manifest = registry.export_schemas(dir.path()).unwrap();
        assert_eq!(manifest.kinds.len(), 1);

        // checksum is over canonical JSON, not the pretty file
        let exported = fs::read_to_string(dir.path().join("deployed.schema.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&exported).unwrap();
        assert_eq!(Checksum::from_json(&value), manifest.kinds[0].checksum);

        let checksums = fs::read_to_string(dir.path().join("checksums.sha256")).unwrap();
        assert!(checksums.ends_with("  deployed.schema.json"));
        assert!(dir.path().join("manifest.json").exists());
    }
}
