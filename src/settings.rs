//! Settings for the configuration store itself
//!
//! Supports loading settings from:
//! - Default values
//! - Settings file (versioned-config.toml)
//! - Environment variables (CONFIG_STORE__*)
//!
//! ## Example settings file (versioned-config.toml):
//! ```toml
//! [storage]
//! project_root = "."
//! dot_dir = ".fluence"
//!
//! [output]
//! json_style = "pretty"
//!
//! [migration]
//! self_heal = true
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level store settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Where config files live
    #[serde(default)]
    pub storage: StorageSettings,

    /// How documents are written
    #[serde(default)]
    pub output: OutputSettings,

    /// Migration behavior
    #[serde(default)]
    pub migration: MigrationSettings,
}

/// Storage locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Project root; project-scoped configs go under `<project_root>/<dot_dir>`
    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,

    /// Name of the per-project config directory
    #[serde(default = "default_dot_dir")]
    pub dot_dir: String,

    /// Override for the per-user config directory
    #[serde(default)]
    pub user_dir: Option<PathBuf>,
}

/// Output settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default)]
    pub json_style: JsonStyle,
}

/// Layout for JSON documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JsonStyle {
    #[default]
    Pretty,
    Compact,
}

/// Migration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationSettings {
    /// Rewrite migrated documents on disk, even for readonly loads
    #[serde(default = "default_true")]
    pub self_heal: bool,
}

fn default_project_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_dot_dir() -> String {
    ".fluence".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            project_root: default_project_root(),
            dot_dir: default_dot_dir(),
            user_dir: None,
        }
    }
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self { self_heal: true }
    }
}

impl StoreSettings {
    /// Load settings from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load settings, layering an explicit file over the default locations
    pub fn load_from(settings_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let locations = [
            "versioned-config.toml",
            ".versioned-config.toml",
            "config/versioned-config.toml",
        ];

        for location in locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(dirs) = directories::ProjectDirs::from("dev", "fluence", "versioned-config") {
            let user_settings = dirs.config_dir().join("versioned-config.toml");
            if user_settings.exists() {
                builder = builder.add_source(File::from(user_settings).required(false));
            }
        }

        if let Some(path) = settings_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // CONFIG_STORE__STORAGE__DOT_DIR=.cfg
        builder = builder.add_source(
            Environment::with_prefix("CONFIG_STORE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Save settings to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Project root, resolved against the current directory when relative
    pub fn project_root(&self) -> PathBuf {
        if self.storage.project_root.is_absolute() {
            self.storage.project_root.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.storage.project_root)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = StoreSettings::default();
        assert!(settings.migration.self_heal);
        assert_eq!(settings.storage.dot_dir, ".fluence");
        assert_eq!(settings.output.json_style, JsonStyle::Pretty);
    }

    #[test]
    fn test_serialize_settings() {
        let settings = StoreSettings::default();
        let toml_str = toml::to_string_pretty(&settings).unwrap();
        assert!(toml_str.contains("[storage]"));
        assert!(toml_str.contains("[migration]"));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[storage]\ndot_dir = \".cfg\"\n\n[output]\njson_style = \"compact\"\n\n[migration]\nself_heal = false\n",
        )
        .unwrap();

        let settings = StoreSettings::load_from(path.to_str()).unwrap();
        assert_eq!(settings.storage.dot_dir, ".cfg");
        assert_eq!(settings.output.json_style, JsonStyle::Compact);
        assert!(!settings.migration.self_heal);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.toml");
        let mut settings = StoreSettings::default();
        settings.storage.user_dir = Some(dir.path().join("user"));
        settings.save(path.to_str().unwrap()).unwrap();

        let reloaded = StoreSettings::load_from(path.to_str()).unwrap();
        assert_eq!(reloaded.storage.user_dir, settings.storage.user_dir);
    }
}
