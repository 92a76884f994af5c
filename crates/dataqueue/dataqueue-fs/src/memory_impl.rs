//! In-memory fake of [`crate::FileSystem`], used by `dataqueue-core`'s unit
//! tests so ring/lock invariants can be checked without touching a real
//! disk. Not `cfg(test)`-gated: other crates in the workspace need it as a
//! dev-dependency, and it has no real-world footprint of its own.

use crate::FileSystem;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Default)]
enum Entry {
    #[default]
    Dir,
    File(Vec<u8>),
}

/// A tiny in-process filesystem backed by a path -> entry map.
///
/// Directory removal is "recursive" in the same sense `std::fs::remove_dir_all`
/// is: every entry whose path starts with the removed directory is dropped.
#[derive(Debug, Default)]
pub struct InMemoryFileSystem {
    entries: Mutex<HashMap<PathBuf, Entry>>,
}

impl InMemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FileSystem for InMemoryFileSystem {
    fn make_dir(&self, path: &Path) -> io::Result<()> {
        let mut entries = self.entries.lock().unwrap();
        if entries.contains_key(path) {
            return Err(io::Error::new(io::ErrorKind::AlreadyExists, "dir exists"));
        }
        entries.insert(path.to_path_buf(), Entry::Dir);
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut entries = self.entries.lock().unwrap();
        if !entries.contains_key(path) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "dir missing"));
        }
        entries.retain(|p, _| !p.starts_with(path));
        Ok(())
    }

    fn dir_exists(&self, path: &Path) -> bool {
        matches!(self.entries.lock().unwrap().get(path), Some(Entry::Dir))
    }

    fn list_file(&self, path: &Path) -> bool {
        matches!(self.entries.lock().unwrap().get(path), Some(Entry::File(_)))
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        match self.entries.lock().unwrap().get(path) {
            Some(Entry::File(bytes)) => Ok(bytes.clone()),
            _ => Err(io::Error::new(io::ErrorKind::NotFound, "file missing")),
        }
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), Entry::File(data.to_vec()));
        Ok(())
    }

    fn create_new_file(&self, path: &Path, data: &[u8]) -> io::Result<bool> {
        let mut entries = self.entries.lock().unwrap();
        if entries.contains_key(path) {
            return Ok(false);
        }
        entries.insert(path.to_path_buf(), Entry::File(data.to_vec()));
        Ok(true)
    }

    fn delete_file(&self, path: &Path) -> io::Result<()> {
        match self.entries.lock().unwrap().remove(path) {
            Some(Entry::File(_)) => Ok(()),
            _ => Err(io::Error::new(io::ErrorKind::NotFound, "file missing")),
        }
    }
}
