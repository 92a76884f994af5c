//! Advisory lock-file protocol (spec §4.C).
//!
//! Every function here goes straight through the [`FileSystem`] adaptor and
//! re-reads lock state fresh on every call — the engine never caches lock
//! state in memory, matching the original control flow where every mutating
//! or querying operation re-checks the lock files on disk.

use crate::AccessType;
use dataqueue_fs::FileSystem;
use std::path::{Path, PathBuf};

const ROLOCK: &str = ".rolock";
const WOLOCK: &str = ".wolock";
const RWLOCK: &str = ".rwlock";

fn path(dir: &Path, name: &str) -> PathBuf {
    dir.join(name)
}

/// Whether an `Open(access)` would collide with the lock(s) currently
/// present, per the compatibility table in spec §4.C.
pub fn is_busy_for(fs: &dyn FileSystem, dir: &Path, access: AccessType) -> bool {
    if fs.list_file(&path(dir, WOLOCK)) || fs.list_file(&path(dir, RWLOCK)) {
        return true;
    }
    if fs.list_file(&path(dir, ROLOCK)) && access != AccessType::ReadOnly {
        return true;
    }
    false
}

/// `.wolock` or `.rwlock` present — the lock state Enqueue/Dequeue require.
pub fn write_lock_present(fs: &dyn FileSystem, dir: &Path) -> bool {
    fs.list_file(&path(dir, WOLOCK)) || fs.list_file(&path(dir, RWLOCK))
}

/// `.rolock` or `.rwlock` present — the lock state Seek/GetEntry require.
pub fn read_lock_present(fs: &dyn FileSystem, dir: &Path) -> bool {
    fs.list_file(&path(dir, ROLOCK)) || fs.list_file(&path(dir, RWLOCK))
}

/// Any of the three lock files present — the lock state GetLength requires.
pub fn any_lock_present(fs: &dyn FileSystem, dir: &Path) -> bool {
    fs.list_file(&path(dir, ROLOCK))
        || fs.list_file(&path(dir, WOLOCK))
        || fs.list_file(&path(dir, RWLOCK))
}

/// Creates or updates the lock file for a newly granted `Open(access)`.
/// Callers must have already confirmed `!is_busy_for(fs, dir, access)`.
pub fn acquire(fs: &dyn FileSystem, dir: &Path, access: AccessType) -> std::io::Result<()> {
    match access {
        AccessType::ReadOnly => {
            let p = path(dir, ROLOCK);
            if fs.create_new_file(&p, &[1])? {
                return Ok(());
            }
            let mut buf = fs.read_file(&p)?;
            let count = buf.first().copied().unwrap_or(0).saturating_add(1);
            buf = vec![count];
            fs.write_file(&p, &buf)
        }
        AccessType::WriteOnly => {
            fs.create_new_file(&path(dir, WOLOCK), &[])?;
            Ok(())
        }
        AccessType::ReadWrite => {
            fs.create_new_file(&path(dir, RWLOCK), &[])?;
            Ok(())
        }
    }
}

/// Releases the lock held for `access`, deleting or decrementing as needed.
pub fn release(fs: &dyn FileSystem, dir: &Path, access: AccessType) -> std::io::Result<()> {
    match access {
        AccessType::ReadOnly => {
            let p = path(dir, ROLOCK);
            let buf = fs.read_file(&p)?;
            let count = buf.first().copied().unwrap_or(1);
            if count <= 1 {
                fs.delete_file(&p)
            } else {
                fs.write_file(&p, &[count - 1])
            }
        }
        AccessType::WriteOnly => fs.delete_file(&path(dir, WOLOCK)),
        AccessType::ReadWrite => fs.delete_file(&path(dir, RWLOCK)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataqueue_fs::memory::InMemoryFileSystem;

    fn dir() -> PathBuf {
        PathBuf::from("/q")
    }

    #[test]
    fn readers_can_share_the_rolock() {
        let fs = InMemoryFileSystem::new();
        let d = dir();
        acquire(&fs, &d, AccessType::ReadOnly).unwrap();
        assert!(!is_busy_for(&fs, &d, AccessType::ReadOnly));
        acquire(&fs, &d, AccessType::ReadOnly).unwrap();
        assert_eq!(fs.read_file(&d.join(ROLOCK)).unwrap(), vec![2]);

        assert!(is_busy_for(&fs, &d, AccessType::WriteOnly));
        assert!(is_busy_for(&fs, &d, AccessType::ReadWrite));
    }

    #[test]
    fn writer_lock_excludes_everyone() {
        let fs = InMemoryFileSystem::new();
        let d = dir();
        acquire(&fs, &d, AccessType::WriteOnly).unwrap();
        assert!(is_busy_for(&fs, &d, AccessType::ReadOnly));
        assert!(is_busy_for(&fs, &d, AccessType::WriteOnly));
        assert!(is_busy_for(&fs, &d, AccessType::ReadWrite));
    }

    #[test]
    fn release_decrements_then_deletes_rolock() {
        let fs = InMemoryFileSystem::new();
        let d = dir();
        acquire(&fs, &d, AccessType::ReadOnly).unwrap();
        acquire(&fs, &d, AccessType::ReadOnly).unwrap();
        release(&fs, &d, AccessType::ReadOnly).unwrap();
        assert!(fs.list_file(&d.join(ROLOCK)));
        release(&fs, &d, AccessType::ReadOnly).unwrap();
        assert!(!fs.list_file(&d.join(ROLOCK)));
    }

    #[test]
    fn write_and_read_lock_presence_checks() {
        let fs = InMemoryFileSystem::new();
        let d = dir();
        assert!(!write_lock_present(&fs, &d));
        assert!(!read_lock_present(&fs, &d));
        assert!(!any_lock_present(&fs, &d));

        acquire(&fs, &d, AccessType::ReadOnly).unwrap();
        assert!(read_lock_present(&fs, &d));
        assert!(!write_lock_present(&fs, &d));
        assert!(any_lock_present(&fs, &d));
    }
}
