//! Binary layout of a queue's `.header` file.
//!
//! The field order and widths here are the on-disk contract (spec §6): native
//! endianness and natural alignment of the implementing platform, not a
//! portable wire format — the same deal `shm_layout::RingHeader` strikes for
//! the mmap-backed ring, just applied to a file buffer instead of a live
//! mapping.

use bitflags::bitflags;

bitflags! {
    /// Header flag bits. `RANDOM_ACCESS` gates `Seek`/`GetEntry`; `MESSAGE_LOG`
    /// is carried for on-disk compatibility but has no behavior attached to it
    /// (reserved in the original layout).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Flags: u16 {
        const MESSAGE_LOG = 0x0001;
        const RANDOM_ACCESS = 0x0002;
    }
}

/// In-memory mirror of the `.header` file, read and written as a whole unit
/// on every mutating operation (spec §3, §5).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Size of this struct, stamped at create time. Not otherwise consulted;
    /// carried for on-disk compatibility with the original layout.
    pub size: usize,
    pub max_entry_size: usize,
    pub max_entries: u8,
    pub num_of_entries: u8,
    pub head_lut_offs: u8,
    pub tail_lut_offs: u8,
    pub seek_lut_offs: u8,
    pub reserved: u8,
    pub reference_count: u16,
    pub flags: Flags,
}

impl Header {
    pub fn new(max_entries: u8, max_entry_size: usize, flags: Flags) -> Self {
        Self {
            size: std::mem::size_of::<Header>(),
            max_entry_size,
            max_entries,
            num_of_entries: 0,
            head_lut_offs: 0,
            tail_lut_offs: 0,
            seek_lut_offs: 0,
            reserved: 0,
            reference_count: 0,
            flags,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.num_of_entries == 0
    }

    pub fn is_full(&self) -> bool {
        self.num_of_entries == self.max_entries
    }

    /// Copies this header's raw bytes out, the way `FSAL_WriteFile` writes
    /// `&fifo_hdr` as a flat byte range.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; std::mem::size_of::<Header>()];
        unsafe {
            std::ptr::write(buf.as_mut_ptr() as *mut Header, *self);
        }
        buf
    }

    /// Reconstructs a header from raw bytes. `buf` must be exactly
    /// `size_of::<Header>()` bytes, read as a whole the way `.header` is read
    /// in one `FSAL_ReadFile` call.
    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() != std::mem::size_of::<Header>() {
            return None;
        }
        let mut header = std::mem::MaybeUninit::<Header>::uninit();
        unsafe {
            std::ptr::copy_nonoverlapping(
                buf.as_ptr(),
                header.as_mut_ptr() as *mut u8,
                buf.len(),
            );
            Some(header.assume_init())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrips_through_bytes() {
        let h = Header::new(4, 64, Flags::RANDOM_ACCESS);
        let bytes = h.to_bytes();
        let back = Header::from_bytes(&bytes).unwrap();
        assert_eq!(h, back);
    }

    #[test]
    fn from_bytes_rejects_wrong_length() {
        assert!(Header::from_bytes(&[0u8; 3]).is_none());
    }

    #[test]
    fn new_header_starts_empty() {
        let h = Header::new(4, 64, Flags::empty());
        assert!(h.is_empty());
        assert!(!h.is_full());
        assert_eq!(h.head_lut_offs, h.tail_lut_offs);
    }
}
