//! Resolving where a configuration kind's file lives

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::settings::StoreSettings;

/// Which directory a config kind is stored in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigLocation {
    /// `<project_root>/<dot_dir>`
    Project,
    /// The per-user config directory
    User,
}

/// Maps a location to a directory
pub trait PathResolver: Send + Sync {
    fn config_dir(&self, location: ConfigLocation) -> Result<PathBuf>;
}

/// Resolves directories from store settings, falling back to the platform
/// user config directory
#[derive(Debug, Clone)]
pub struct DirsResolver {
    project_dir: PathBuf,
    user_dir: Option<PathBuf>,
}

impl DirsResolver {
    pub fn new(project_dir: impl Into<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            user_dir,
        }
    }

    pub fn from_settings(settings: &StoreSettings) -> Self {
        Self {
            project_dir: settings.project_root().join(&settings.storage.dot_dir),
            user_dir: settings.storage.user_dir.clone(),
        }
    }
}

impl PathResolver for DirsResolver {
    fn config_dir(&self, location: ConfigLocation) -> Result<PathBuf> {
        match location {
            ConfigLocation::Project => Ok(self.project_dir.clone()),
            ConfigLocation::User => match &self.user_dir {
                Some(dir) => Ok(dir.clone()),
                None => directories::ProjectDirs::from("dev", "fluence", "fluence")
                    .map(|dirs| dirs.config_dir().to_path_buf())
                    .ok_or_else(|| {
                        ConfigError::PathResolution("no home directory for user configs".into())
                    }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_dir_from_settings() {
        let mut settings = StoreSettings::default();
        settings.storage.project_root = PathBuf::from("/work/app");
        let resolver = DirsResolver::from_settings(&settings);
        assert_eq!(
            resolver.config_dir(ConfigLocation::Project).unwrap(),
            PathBuf::from("/work/app/.fluence")
        );
    }

    #[test]
    fn test_user_dir_override() {
        let resolver = DirsResolver::new("/p", Some(PathBuf::from("/home/u/.fluence")));
        assert_eq!(
            resolver.config_dir(ConfigLocation::User).unwrap(),
            PathBuf::from("/home/u/.fluence")
        );
    }
}
