//! File access for config documents

use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

/// Reads and writes whole config files
pub trait ConfigFs: Send + Sync {
    /// Read a file; `Ok(None)` when it does not exist
    fn read(&self, path: &Path) -> io::Result<Option<Vec<u8>>>;

    /// Replace a file's contents; readers see either the old or the new bytes
    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;
}

/// The local filesystem, with temp-file-then-rename writes
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl ConfigFs for LocalFs {
    fn read(&self, path: &Path) -> io::Result<Option<Vec<u8>>> {
        match std::fs::read(path) {
            Ok(bytes) => {
                debug!(path = %path.display(), len = bytes.len(), "Read config file");
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;

        debug!(path = %path.display(), len = bytes.len(), "Wrote config file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_missing_file() {
        let dir = tempdir().unwrap();
        assert!(LocalFs.read(&dir.path().join("absent.yaml")).unwrap().is_none());
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".fluence").join("deployed.yaml");
        LocalFs.write(&path, b"version: 0\n").unwrap();
        assert_eq!(LocalFs.read(&path).unwrap().unwrap(), b"version: 0\n");
    }

    #[test]
    fn test_write_replaces_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("x.json");
        LocalFs.write(&path, b"{\"version\":0}").unwrap();
        LocalFs.write(&path, b"{\"version\":1}").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"{\"version\":1}");

        // no temp files left behind
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }
}
