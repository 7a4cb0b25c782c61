//! Schema version numbers and declared-version extraction

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::Corruption;

/// Name of the field every document carries its version in
pub const VERSION_FIELD: &str = "version";

/// A dense, non-negative schema version (`v0` is the oldest loadable format)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaVersion(u32);

impl SchemaVersion {
    /// The oldest supported version
    pub const ZERO: SchemaVersion = SchemaVersion(0);

    pub const fn new(version: u32) -> Self {
        Self(version)
    }

    /// Parse from a string, accepting an optional `v` prefix
    pub fn parse(version_str: &str) -> Option<Self> {
        let version_str = version_str.strip_prefix('v').unwrap_or(version_str);
        version_str.parse().ok().map(Self)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// The version directly after this one
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl From<u32> for SchemaVersion {
    fn from(version: u32) -> Self {
        Self(version)
    }
}

/// Read the raw declared version of a document.
///
/// Returns `Ok(None)` when the field is absent. Integral floats (`1.0`, as YAML
/// and some editors produce) are accepted; anything else is corruption.
pub fn declared_version(doc: &Value) -> Result<Option<u64>, Corruption> {
    let map = doc.as_object().ok_or(Corruption::NotAMapping)?;
    let Some(raw) = map.get(VERSION_FIELD) else {
        return Ok(None);
    };

    let number = match raw {
        Value::Number(n) => n,
        other => return Err(Corruption::BadVersionField(other.to_string())),
    };

    if let Some(v) = number.as_u64() {
        return Ok(Some(v));
    }

    match number.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(Some(f as u64)),
        _ => Err(Corruption::BadVersionField(number.to_string())),
    }
}

/// Overwrite the version field of a document
pub fn stamp_version(doc: &mut Value, version: SchemaVersion) -> Result<(), Corruption> {
    let map = doc.as_object_mut().ok_or(Corruption::NotAMapping)?;
    map.insert(VERSION_FIELD.to_string(), Value::from(version.get()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_version_parsing() {
        assert_eq!(SchemaVersion::parse("3"), Some(SchemaVersion::new(3)));
        assert_eq!(SchemaVersion::parse("v3"), Some(SchemaVersion::new(3)));
        assert_eq!(SchemaVersion::parse("v-1"), None);
        assert_eq!(SchemaVersion::parse("latest"), None);
        assert_eq!(SchemaVersion::new(3).to_string(), "v3");
    }

    #[test]
    fn test_next_and_order() {
        let v0 = SchemaVersion::ZERO;
        assert_eq!(v0.next(), SchemaVersion::new(1));
        assert!(v0 < v0.next());
    }

    #[test]
    fn test_declared_version() {
        assert_eq!(declared_version(&json!({"version": 2})).unwrap(), Some(2));
        assert_eq!(declared_version(&json!({"version": 1.0})).unwrap(), Some(1));
        assert_eq!(declared_version(&json!({"name": "a"})).unwrap(), None);
    }

    #[test]
    fn test_declared_version_rejects_garbage() {
        assert!(matches!(
            declared_version(&json!({"version": "1"})),
            Err(Corruption::BadVersionField(_))
        ));
        assert!(matches!(
            declared_version(&json!({"version": -1})),
            Err(Corruption::BadVersionField(_))
        ));
        assert!(matches!(
            declared_version(&json!({"version": 1.5})),
            Err(Corruption::BadVersionField(_))
        ));
        assert!(matches!(
            declared_version(&json!([1, 2])),
            Err(Corruption::NotAMapping)
        ));
    }

    #[test]
    fn test_stamp_version() {
        let mut doc = json!({"version": 0, "name": "a"});
        stamp_version(&mut doc, SchemaVersion::new(1)).unwrap();
        assert_eq!(doc, json!({"version": 1, "name": "a"}));
    }
}
