//! Filesystem access used for mod discovery.

use std::io;
use std::path::{Path, PathBuf};

/// Entries of a directory. An `Err` item ends the scan.
pub type DirEntries = Box<dyn Iterator<Item = io::Result<PathBuf>>>;

/// Path resolution and directory listing.
pub trait ModFileSystem {
    /// Resolve `path` to an absolute path. Fails if the path is invalid.
    fn resolve(&self, path: &Path) -> io::Result<PathBuf>;

    fn is_dir(&self, path: &Path) -> bool;

    fn is_file(&self, path: &Path) -> bool;

    /// List the entries directly inside `path`, in filesystem order.
    fn read_dir(&self, path: &Path) -> io::Result<DirEntries>;
}

/// [`ModFileSystem`] over `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFileSystem;

impl ModFileSystem for StdFileSystem {
    fn resolve(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::canonicalize(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_dir(&self, path: &Path) -> io::Result<DirEntries> {
        let entries = std::fs::read_dir(path)?;
        Ok(Box::new(entries.map(|entry| entry.map(|e| e.path()))))
    }
}
