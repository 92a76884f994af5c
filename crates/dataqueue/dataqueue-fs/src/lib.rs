//! `dataqueue-fs`: thin filesystem adaptor for the dataqueue engine.
//!
//! The dataqueue engine (`dataqueue-core`) never touches `std::fs` directly.
//! Every directory or file primitive it needs goes through the [`FileSystem`]
//! trait defined here, the same way `lithos-icc` never calls `mmap(2)` itself
//! and instead goes through `lithos-mmap`'s `MmapFile`/`MmapFileMut`. This
//! keeps the "external collaborator" the engine's own spec declares out of
//! its scope in one small, swappable place.
//!
//! [`StdFileSystem`] is the real, [`std::fs`]-backed implementation used in
//! production. [`memory::InMemoryFileSystem`] is a fake used by
//! `dataqueue-core`'s unit tests to exercise invariants (ring arithmetic,
//! lock bookkeeping) without touching a real disk.

mod memory_impl;

pub mod memory {
    pub use crate::memory_impl::InMemoryFileSystem;
}

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Filesystem primitives consumed by the dataqueue engine.
///
/// Mirrors the original `FSAL_*` surface (`make_dir`, `change_dir`,
/// `remove_dir`, `list_file`, `open_file`/`read_file`/`write_file`/
/// `close_file`, `delete_file`) but rendered the idiomatic-Rust way: every
/// call takes an explicit path rather than relying on an implicit current
/// working directory, and file contents move as owned byte buffers rather
/// than through a separate open/read/write/close handle dance. There is no
/// process-global cwd to `change_dir` into; callers build the path to a
/// queue's directory once and pass it to every operation.
pub trait FileSystem: Send + Sync {
    /// Performs whatever one-time setup the backing store needs.
    /// The real, `std::fs`-backed implementation has nothing to do here;
    /// the hook exists so fakes (e.g. resetting an in-memory store) have
    /// a place to hang initialization.
    fn init(&self) {}

    /// Creates a directory. Fails if it already exists.
    fn make_dir(&self, path: &Path) -> io::Result<()>;

    /// Removes a directory and everything under it.
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Reports whether a directory exists at `path`. This is the Rust
    /// rendering of `FSAL_ChangeDirectory`'s existence-probing use in the
    /// original adaptor (attempt to descend, fail if absent) without the
    /// side effect of actually changing a process-global cwd.
    fn dir_exists(&self, path: &Path) -> bool;

    /// Reports whether a file exists at `path`.
    fn list_file(&self, path: &Path) -> bool;

    /// Reads a whole file into memory.
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Writes `data` to `path`, creating or truncating as needed.
    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()>;

    /// Creates `path` only if it does not already exist, writing `data` as
    /// its initial contents. Returns `Ok(true)` if the file was created,
    /// `Ok(false)` if it already existed (no bytes were written in that
    /// case). This is the exclusive-create primitive the lock protocol
    /// needs to close its check-then-create race (spec §9).
    fn create_new_file(&self, path: &Path, data: &[u8]) -> io::Result<bool>;

    /// Deletes a file. Not an error if callers already know it is there;
    /// absence is surfaced as a normal `io::Error` (`NotFound`) so callers
    /// can decide whether that's expected.
    fn delete_file(&self, path: &Path) -> io::Result<()>;
}

/// Real filesystem adaptor, backed directly by [`std::fs`].
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn make_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }

    fn dir_exists(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        fs::write(path, data)
    }

    fn create_new_file(&self, path: &Path, data: &[u8]) -> io::Result<bool> {
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut file) => {
                file.write_all(data)?;
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn delete_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_dir(label: &str) -> std::path::PathBuf {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("dataqueue_fs_test_{label}_{ts}"));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn write_then_read_roundtrips_bytes() {
        let dir = scratch_dir("roundtrip");
        let fsys = StdFileSystem;
        let file = dir.join("payload");

        fsys.write_file(&file, b"hello").unwrap();
        assert!(fsys.list_file(&file));
        assert_eq!(fsys.read_file(&file).unwrap(), b"hello");

        fsys.delete_file(&file).unwrap();
        assert!(!fsys.list_file(&file));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn create_new_file_is_exclusive() {
        let dir = scratch_dir("exclusive");
        let fsys = StdFileSystem;
        let file = dir.join(".wolock");

        assert!(fsys.create_new_file(&file, b"").unwrap());
        assert!(!fsys.create_new_file(&file, b"").unwrap());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn remove_dir_all_clears_contents() {
        let dir = scratch_dir("rmdir");
        let fsys = StdFileSystem;
        fsys.write_file(&dir.join("a"), b"x").unwrap();

        fsys.remove_dir_all(&dir).unwrap();
        assert!(!dir.exists());
    }

    #[test]
    fn dir_exists_reflects_real_directories() {
        let dir = scratch_dir("direxists");
        let fsys = StdFileSystem;
        assert!(fsys.dir_exists(&dir));
        assert!(!fsys.dir_exists(&dir.join("nope")));
        let _ = fs::remove_dir_all(&dir);
    }
}
