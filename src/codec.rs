//! Serialization formats for config documents
//!
//! All formats parse into a generic `serde_json::Value`, so documents keep
//! map semantics regardless of how they are stored.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, Result};
use crate::settings::JsonStyle;

/// On-disk format of a config file, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Json,
    Yaml,
    Toml,
}

impl Format {
    /// Pick the format for a file name
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("json") => Ok(Format::Json),
            Some("yaml") | Some("yml") => Ok(Format::Yaml),
            Some("toml") => Ok(Format::Toml),
            _ => Err(ConfigError::UnsupportedFormat(file_name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Format::Json => "JSON",
            Format::Yaml => "YAML",
            Format::Toml => "TOML",
        }
    }

    /// Parse raw bytes read from `path`
    pub fn parse(&self, path: &Path, bytes: &[u8]) -> Result<Value> {
        let parse_err = |message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            format: self.name(),
            message,
        };

        match self {
            Format::Json => serde_json::from_slice(bytes).map_err(|e| parse_err(e.to_string())),
            Format::Yaml => serde_yaml::from_slice(bytes).map_err(|e| parse_err(e.to_string())),
            Format::Toml => {
                let text = std::str::from_utf8(bytes).map_err(|e| parse_err(e.to_string()))?;
                toml::from_str(text).map_err(|e| parse_err(e.to_string()))
            }
        }
    }

    /// Serialize a document of `kind`
    pub fn serialize(&self, kind: &str, doc: &Value, style: JsonStyle) -> Result<Vec<u8>> {
        let ser_err = |message: String| ConfigError::Serialize {
            kind: kind.to_string(),
            format: self.name(),
            message,
        };

        let mut text = match (self, style) {
            (Format::Json, JsonStyle::Pretty) => serde_json::to_string_pretty(doc)?,
            (Format::Json, JsonStyle::Compact) => serde_json::to_string(doc)?,
            (Format::Yaml, _) => serde_yaml::to_string(doc).map_err(|e| ser_err(e.to_string()))?,
            (Format::Toml, _) => {
                toml::to_string_pretty(doc).map_err(|e| ser_err(e.to_string()))?
            }
        };

        if !text.ends_with('\n') {
            text.push('\n');
        }
        Ok(text.into_bytes())
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
