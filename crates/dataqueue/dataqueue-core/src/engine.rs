//! Operation layer (spec §4.F): the public surface every caller drives.
//!
//! `Engine` owns the process-local [`HandleTable`] and a handle to the
//! filesystem adaptor. Every public method here is the whole of one
//! `Create`/`Destroy`/`Open`/... call: validate arguments, consult the
//! handle table, descend into the queue's directory, check the lock
//! protocol, read header+LUT, apply ring arithmetic, write back, return —
//! the control flow spec §2 describes for component F.
//!
//! The table is wrapped in a `RefCell`, not a `Mutex`: spec §5 is explicit
//! that the engine itself offers no thread safety ("implementations
//! targeting multithreaded callers must wrap the engine in a single coarse
//! lock"), the same contract `lithos-icc::BroadcastWriter` documents for its
//! own `Send`-not-`Sync` shared-memory state. `RefCell` gives every method a
//! `&self` signature without pretending to offer more than that.

use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::error::{DataQError, Result};
use crate::handle::{AccessMode, AccessType, HandleEntry, HandleId, HandleTable};
use crate::header::{Flags, Header};
use crate::lock;
use crate::lut::{LookupTable, mint_tag};
use crate::ring;
use crate::store::{self, payload_path, queue_dir};
use dataqueue_fs::FileSystem;

const MAX_NAME_LEN: usize = 31;

/// Where `Seek` should move the read cursor (spec §4.E).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekType {
    Head,
    Tail,
    Position(u8),
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(DataQError::InvalidArg);
    }
    if name == "." || name == ".." || name.contains('/') || name.contains('\0') {
        return Err(DataQError::InvalidArg);
    }
    Ok(())
}

/// The process-local dataqueue engine. One instance per process is the
/// idiomatic-Rust rendering of the spec's "global mutable state" note
/// (§9): construct it explicitly at startup rather than relying on a
/// lazily-initialized static.
pub struct Engine {
    fs: Arc<dyn FileSystem>,
    base_dir: PathBuf,
    handles: RefCell<HandleTable>,
}

impl Engine {
    /// Builds a fresh engine rooted at `base_dir`, with room for `h_max`
    /// concurrently open handles (spec §3 `H_max`, default 10).
    pub fn new(fs: Arc<dyn FileSystem>, base_dir: impl Into<PathBuf>, h_max: usize) -> Self {
        fs.init();
        Self {
            fs,
            base_dir: base_dir.into(),
            handles: RefCell::new(HandleTable::new(h_max)),
        }
    }

    fn dir(&self, name: &str) -> PathBuf {
        queue_dir(&self.base_dir, name)
    }

    fn entry_for(&self, handle: HandleId) -> Result<HandleEntry> {
        self.handles
            .borrow()
            .get(handle)
            .cloned()
            .ok_or(DataQError::InvalidHandle)
    }

    /// Create(name, max_entries, max_entry_size, flags) — spec §4.F.
    #[instrument(skip(self), fields(name))]
    pub fn create(
        &self,
        name: &str,
        max_entries: u8,
        max_entry_size: usize,
        flags: Flags,
    ) -> Result<()> {
        validate_name(name)?;
        if !(1..=255).contains(&max_entries) || max_entry_size == 0 {
            return Err(DataQError::InvalidArg);
        }

        let dir = self.dir(name);
        if store::directory_exists(self.fs.as_ref(), &dir) {
            return Err(DataQError::QueueExists);
        }

        self.fs.make_dir(&dir)?;
        let result = (|| -> Result<()> {
            let header = Header::new(max_entries, max_entry_size, flags);
            store::write_header(self.fs.as_ref(), &dir, &header)?;
            store::write_lut(self.fs.as_ref(), &dir, &LookupTable::empty())?;
            Ok(())
        })();

        if let Err(e) = result {
            warn!(?e, "rolling back partially created queue directory");
            let _ = self.fs.remove_dir_all(&dir);
            return Err(e);
        }
        debug!("queue created");
        Ok(())
    }

    /// Destroy(name) — spec §4.F. Silently succeeds if absent.
    #[instrument(skip(self), fields(name))]
    pub fn destroy(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        let dir = self.dir(name);
        if !store::directory_exists(self.fs.as_ref(), &dir) {
            return Ok(());
        }
        if lock::any_lock_present(self.fs.as_ref(), &dir)
            || self.handles.borrow().find_any_for_name(name).is_some()
        {
            return Err(DataQError::QueueIsBusy);
        }
        self.fs.remove_dir_all(&dir)?;
        debug!("queue destroyed");
        Ok(())
    }

    /// Open(name, access, mode) — spec §4.F.
    #[instrument(skip(self), fields(name, ?access, ?mode))]
    pub fn open(&self, name: &str, access: AccessType, mode: AccessMode) -> Result<HandleId> {
        validate_name(name)?;

        if let Some(id) = self.handles.borrow().find_reopen(name, access, mode) {
            debug!("re-open of identical access/mode returns existing handle");
            return Ok(id);
        }
        if self.handles.borrow().find_any_for_name(name).is_some() {
            return Err(DataQError::QueueOpened);
        }

        let dir = self.dir(name);
        if !store::directory_exists(self.fs.as_ref(), &dir) {
            return Err(DataQError::QueueMissing);
        }
        if lock::is_busy_for(self.fs.as_ref(), &dir, access) {
            return Err(DataQError::QueueIsBusy);
        }

        lock::acquire(self.fs.as_ref(), &dir, access)?;

        let entry = HandleEntry {
            name: name.to_string(),
            access,
            mode,
        };
        match self.handles.borrow_mut().allocate(entry) {
            Some(id) => {
                debug!("queue opened");
                Ok(id)
            }
            None => {
                // Roll back the lock we just took — no handle slot survives to release it.
                let _ = lock::release(self.fs.as_ref(), &dir, access);
                Err(DataQError::HandleNotAvail)
            }
        }
    }

    /// Close(handle) — spec §4.F.
    #[instrument(skip(self))]
    pub fn close(&self, handle: HandleId) -> Result<()> {
        let entry = self.entry_for(handle)?;
        let dir = self.dir(&entry.name);
        if store::directory_exists(self.fs.as_ref(), &dir) {
            lock::release(self.fs.as_ref(), &dir, entry.access)?;
        }
        self.handles.borrow_mut().release(handle);
        debug!("queue closed");
        Ok(())
    }

    /// Enqueue(handle, data) — spec §4.F/§4.E.
    #[instrument(skip(self, data), fields(len = data.len()))]
    pub fn enqueue(&self, handle: HandleId, data: &[u8]) -> Result<()> {
        let entry = self.entry_for(handle)?;
        if entry.access == AccessType::ReadOnly {
            return Err(DataQError::QueueReadOnly);
        }
        if data.is_empty() {
            return Err(DataQError::InvalidArg);
        }

        let dir = self.dir(&entry.name);
        if !store::directory_exists(self.fs.as_ref(), &dir) {
            return Err(DataQError::QueueMissing);
        }
        if !lock::write_lock_present(self.fs.as_ref(), &dir) {
            return Err(DataQError::QueueClosed);
        }

        let mut header = store::read_header(self.fs.as_ref(), &dir)?;
        if data.len() > header.max_entry_size {
            return Err(DataQError::InvalidArg);
        }
        let mut lut = store::read_lut(self.fs.as_ref(), &dir)?;

        let placed = ring::enqueue_slot(&mut header);
        header.reference_count = header.reference_count.wrapping_add(1);
        let tag = mint_tag(header.reference_count);

        if let Some(evicted) = placed.evicted_slot {
            let old_tag = lut.get(evicted);
            // Evicted payload deleted here to preserve I4 — spec §9's named fix
            // for the source's leave-it-behind behavior.
            match self.fs.delete_file(&payload_path(&dir, &old_tag)?) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            lut.clear(evicted);
        }

        self.fs.write_file(&payload_path(&dir, &tag)?, data)?;
        lut.set(placed.slot, tag);

        store::write_lut(self.fs.as_ref(), &dir, &lut)?;
        store::write_header(self.fs.as_ref(), &dir, &header)?;
        debug!(slot = placed.slot, "entry enqueued");
        Ok(())
    }

    /// Dequeue(handle, out buf) — spec §4.F/§4.E. Returns the number of
    /// bytes actually copied into `buf` (up to `buf.len()`).
    #[instrument(skip(self, buf))]
    pub fn dequeue(&self, handle: HandleId, buf: &mut [u8]) -> Result<usize> {
        let entry = self.entry_for(handle)?;
        if entry.access == AccessType::ReadOnly {
            return Err(DataQError::QueueReadOnly);
        }

        let dir = self.dir(&entry.name);
        if !store::directory_exists(self.fs.as_ref(), &dir) {
            return Err(DataQError::QueueMissing);
        }
        if !lock::write_lock_present(self.fs.as_ref(), &dir) {
            return Err(DataQError::QueueClosed);
        }

        let mut header = store::read_header(self.fs.as_ref(), &dir)?;
        if header.is_empty() {
            return Err(DataQError::QueueIsEmpty);
        }
        let mut lut = store::read_lut(self.fs.as_ref(), &dir)?;

        let slot = ring::dequeue_slot(&mut header).expect("checked non-empty above");
        let tag = lut.get(slot);
        let payload = self.fs.read_file(&payload_path(&dir, &tag)?)?;
        let n = buf.len().min(payload.len());
        buf[..n].copy_from_slice(&payload[..n]);

        self.fs.delete_file(&payload_path(&dir, &tag)?)?;
        lut.clear(slot);

        store::write_lut(self.fs.as_ref(), &dir, &lut)?;
        store::write_header(self.fs.as_ref(), &dir, &header)?;
        debug!(slot, bytes = n, "entry dequeued");
        Ok(n)
    }

    /// Seek(handle, type) — spec §4.F/§4.E.
    #[instrument(skip(self))]
    pub fn seek(&self, handle: HandleId, seek: SeekType) -> Result<()> {
        let entry = self.entry_for(handle)?;
        if entry.access == AccessType::WriteOnly {
            return Err(DataQError::QueueWriteOnly);
        }

        let dir = self.dir(&entry.name);
        if !store::directory_exists(self.fs.as_ref(), &dir) {
            return Err(DataQError::QueueMissing);
        }
        if !lock::read_lock_present(self.fs.as_ref(), &dir) {
            return Err(DataQError::QueueClosed);
        }

        let mut header = store::read_header(self.fs.as_ref(), &dir)?;
        if !header.flags.contains(Flags::RANDOM_ACCESS) {
            return Err(DataQError::QueueNotSeekable);
        }
        if header.is_empty() {
            return Err(DataQError::QueueIsEmpty);
        }

        match seek {
            SeekType::Head => ring::seek_head(&mut header),
            SeekType::Tail => ring::seek_tail(&mut header),
            SeekType::Position(p) => {
                if p >= header.num_of_entries {
                    return Err(DataQError::InvalidSeek);
                }
                ring::seek_position(&mut header, p);
            }
        }

        store::write_header(self.fs.as_ref(), &dir, &header)?;
        debug!(?seek, "seek applied");
        Ok(())
    }

    /// GetEntry(handle, out buf) — spec §4.F/§4.E. Returns the number of
    /// bytes copied into `buf`; does not delete the payload.
    #[instrument(skip(self, buf))]
    pub fn get_entry(&self, handle: HandleId, buf: &mut [u8]) -> Result<usize> {
        let entry = self.entry_for(handle)?;
        if entry.access == AccessType::WriteOnly {
            return Err(DataQError::QueueWriteOnly);
        }

        let dir = self.dir(&entry.name);
        if !store::directory_exists(self.fs.as_ref(), &dir) {
            return Err(DataQError::QueueMissing);
        }
        if !lock::read_lock_present(self.fs.as_ref(), &dir) {
            return Err(DataQError::QueueClosed);
        }

        let mut header = store::read_header(self.fs.as_ref(), &dir)?;
        if header.is_empty() {
            return Err(DataQError::QueueIsEmpty);
        }
        let lut = store::read_lut(self.fs.as_ref(), &dir)?;

        let slot = ring::get_entry_slot(&mut header);
        let tag = lut.get(slot);
        let payload = self.fs.read_file(&payload_path(&dir, &tag)?)?;
        let n = buf.len().min(payload.len());
        buf[..n].copy_from_slice(&payload[..n]);

        store::write_header(self.fs.as_ref(), &dir, &header)?;
        debug!(slot, bytes = n, "entry peeked");
        Ok(n)
    }

    /// GetLength(handle) — spec §4.F.
    #[instrument(skip(self))]
    pub fn get_length(&self, handle: HandleId) -> Result<u8> {
        let entry = self.entry_for(handle)?;
        let dir = self.dir(&entry.name);
        if !store::directory_exists(self.fs.as_ref(), &dir) {
            return Err(DataQError::QueueMissing);
        }
        if !lock::any_lock_present(self.fs.as_ref(), &dir) {
            return Err(DataQError::QueueClosed);
        }
        let header = store::read_header(self.fs.as_ref(), &dir)?;
        Ok(header.num_of_entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataqueue_fs::memory::InMemoryFileSystem;

    fn engine() -> Engine {
        Engine::new(Arc::new(InMemoryFileSystem::new()), "/base", 10)
    }

    #[test]
    fn create_then_destroy_empty_queue() {
        let e = engine();
        e.create("q", 4, 64, Flags::RANDOM_ACCESS).unwrap();
        e.destroy("q").unwrap();
        // Destroy on absent queue is a silent success.
        e.destroy("q").unwrap();
    }

    #[test]
    fn create_twice_fails_with_queue_exists() {
        let e = engine();
        e.create("q", 4, 64, Flags::empty()).unwrap();
        assert!(matches!(
            e.create("q", 4, 64, Flags::empty()),
            Err(DataQError::QueueExists)
        ));
    }

    #[test]
    fn create_rejects_bad_arguments() {
        let e = engine();
        assert!(matches!(
            e.create("", 4, 64, Flags::empty()),
            Err(DataQError::InvalidArg)
        ));
        assert!(matches!(
            e.create("q", 0, 64, Flags::empty()),
            Err(DataQError::InvalidArg)
        ));
        assert!(matches!(
            e.create("q", 4, 0, Flags::empty()),
            Err(DataQError::InvalidArg)
        ));
    }

    #[test]
    fn enqueue_dequeue_round_trip_in_order() {
        let e = engine();
        e.create("q", 3, 16, Flags::RANDOM_ACCESS).unwrap();
        let h = e.open("q", AccessType::ReadWrite, AccessMode::Unpacked).unwrap();

        e.enqueue(h, b"aa").unwrap();
        e.enqueue(h, b"bb").unwrap();
        e.enqueue(h, b"cc").unwrap();
        assert_eq!(e.get_length(h).unwrap(), 3);

        let mut buf = [0u8; 16];
        let n = e.dequeue(h, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"aa");
        let n = e.dequeue(h, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"bb");
        let n = e.dequeue(h, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"cc");

        assert!(matches!(
            e.dequeue(h, &mut buf),
            Err(DataQError::QueueIsEmpty)
        ));
    }

    #[test]
    fn overwrite_on_full_keeps_newest_and_frees_evicted_payload() {
        let e = engine();
        e.create("q", 2, 16, Flags::empty()).unwrap();
        let h = e.open("q", AccessType::ReadWrite, AccessMode::Unpacked).unwrap();

        e.enqueue(h, b"a").unwrap();
        e.enqueue(h, b"b").unwrap();
        e.enqueue(h, b"c").unwrap();
        assert_eq!(e.get_length(h).unwrap(), 2);

        let mut buf = [0u8; 16];
        let n = e.dequeue(h, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"b");
        let n = e.dequeue(h, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"c");
    }

    #[test]
    fn seek_by_position_then_get_entry() {
        let e = engine();
        e.create("q", 4, 16, Flags::RANDOM_ACCESS).unwrap();
        let h = e.open("q", AccessType::ReadWrite, AccessMode::Unpacked).unwrap();
        for p in [b"w".as_slice(), b"x", b"y", b"z"] {
            e.enqueue(h, p).unwrap();
        }
        e.close(h).unwrap();

        let h = e.open("q", AccessType::ReadOnly, AccessMode::Unpacked).unwrap();
        e.seek(h, SeekType::Position(2)).unwrap();
        let mut buf = [0u8; 16];
        let n = e.get_entry(h, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"y");
        let n = e.get_entry(h, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"z");
        // Seek does not wrap past tail (spec §9); reading again stays at tail.
        let n = e.get_entry(h, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"z");

        assert!(matches!(
            e.seek(h, SeekType::Position(4)),
            Err(DataQError::InvalidSeek)
        ));
    }

    #[test]
    fn seek_on_non_random_access_queue_fails() {
        let e = engine();
        e.create("q", 2, 4, Flags::empty()).unwrap();
        let h = e.open("q", AccessType::ReadOnly, AccessMode::Unpacked).unwrap();
        assert!(matches!(
            e.seek(h, SeekType::Head),
            Err(DataQError::QueueNotSeekable)
        ));
    }

    #[test]
    fn lock_exclusivity_blocks_concurrent_writer_open() {
        let e = engine();
        e.create("q", 1, 4, Flags::empty()).unwrap();
        let h1 = e.open("q", AccessType::ReadWrite, AccessMode::Unpacked).unwrap();

        // A second engine simulates a second process sharing the same disk.
        // (Same process re-open with identical params would instead succeed
        // and return the same handle — see `reopen_same_params_succeeds`.)
        assert!(matches!(
            e.destroy("q"),
            Err(DataQError::QueueIsBusy)
        ));

        e.close(h1).unwrap();
        e.destroy("q").unwrap();
    }

    #[test]
    fn reopen_same_params_returns_same_handle() {
        let e = engine();
        e.create("q", 2, 4, Flags::empty()).unwrap();
        let h1 = e.open("q", AccessType::ReadWrite, AccessMode::Unpacked).unwrap();
        let h2 = e.open("q", AccessType::ReadWrite, AccessMode::Unpacked).unwrap();
        assert_eq!(h1, h2);

        assert!(matches!(
            e.open("q", AccessType::ReadOnly, AccessMode::Unpacked),
            Err(DataQError::QueueOpened)
        ));
    }

    #[test]
    fn enqueue_without_writer_lock_is_rejected() {
        let e = engine();
        e.create("q", 2, 4, Flags::empty()).unwrap();
        let h = e.open("q", AccessType::ReadOnly, AccessMode::Unpacked).unwrap();
        assert!(matches!(
            e.enqueue(h, b"x"),
            Err(DataQError::QueueReadOnly)
        ));
    }

    #[test]
    fn invalid_handle_is_rejected() {
        let e = engine();
        e.create("q", 2, 4, Flags::empty()).unwrap();
        let h = e.open("q", AccessType::ReadWrite, AccessMode::Unpacked).unwrap();
        e.close(h).unwrap();
        assert!(matches!(
            e.enqueue(h, b"x"),
            Err(DataQError::InvalidHandle)
        ));
    }

    #[test]
    fn handle_table_exhaustion_reports_not_available() {
        let e = Engine::new(Arc::new(InMemoryFileSystem::new()), "/base", 1);
        e.create("a", 2, 4, Flags::empty()).unwrap();
        e.create("b", 2, 4, Flags::empty()).unwrap();
        let _h = e.open("a", AccessType::ReadOnly, AccessMode::Unpacked).unwrap();
        assert!(matches!(
            e.open("b", AccessType::ReadOnly, AccessMode::Unpacked),
            Err(DataQError::HandleNotAvail)
        ));
    }

}
