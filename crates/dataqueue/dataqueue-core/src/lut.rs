//! The `.lut` file: a fixed `Cap_max × W` byte buffer mapping ring slots to
//! reference tags, transferred as a single buffer on every mutating
//! operation (spec §4.B), the same discipline `shm_layout::bytes_for_ring`
//! applies to the mmap ring's whole-region sizing.

/// Engine-wide LUT capacity. `max_entries` (≤255) may be smaller; slots
/// `[max_entries, CAP_MAX)` are dead space reserved for on-disk compatibility
/// (spec §9).
pub const CAP_MAX: usize = 256;

/// Width, in bytes, of a reference tag.
pub const TAG_WIDTH: usize = 4;

/// `10^TAG_WIDTH`, the modulus reference tags are minted under.
pub const TAG_MODULUS: u32 = 10_000;

pub type Tag = [u8; TAG_WIDTH];

/// All-zero sentinel marking an empty LUT slot. Distinct from the ASCII tag
/// `"0000"` (`[0x30; 4]`), so a minted tag never collides with it.
pub const EMPTY_TAG: Tag = [0u8; TAG_WIDTH];

/// In-memory mirror of the `.lut` file.
#[derive(Debug, Clone)]
pub struct LookupTable {
    slots: Vec<Tag>,
}

impl LookupTable {
    /// A fresh, fully zeroed table, as written by `Create`.
    pub fn empty() -> Self {
        Self {
            slots: vec![EMPTY_TAG; CAP_MAX],
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(CAP_MAX * TAG_WIDTH);
        for tag in &self.slots {
            buf.extend_from_slice(tag);
        }
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() != CAP_MAX * TAG_WIDTH {
            return None;
        }
        let mut slots = Vec::with_capacity(CAP_MAX);
        for chunk in buf.chunks_exact(TAG_WIDTH) {
            let mut tag = EMPTY_TAG;
            tag.copy_from_slice(chunk);
            slots.push(tag);
        }
        Some(Self { slots })
    }

    pub fn get(&self, idx: u8) -> Tag {
        self.slots[idx as usize]
    }

    pub fn set(&mut self, idx: u8, tag: Tag) {
        self.slots[idx as usize] = tag;
    }

    pub fn clear(&mut self, idx: u8) {
        self.slots[idx as usize] = EMPTY_TAG;
    }
}

pub fn is_empty_slot(tag: &Tag) -> bool {
    *tag == EMPTY_TAG
}

/// Mints the reference tag for the slot an enqueue is about to fill.
///
/// Callers increment `reference_count` *before* minting (spec §3 "Reference
/// tag lifecycle"): the tag reflects the post-increment counter, not the
/// pre-increment one.
pub fn mint_tag(reference_count: u16) -> Tag {
    let n = (reference_count as u32) % TAG_MODULUS;
    let digits = format!("{n:0width$}", width = TAG_WIDTH);
    let mut tag = EMPTY_TAG;
    tag.copy_from_slice(digits.as_bytes());
    tag
}

/// Renders a tag as the payload filename it names.
///
/// Tags this crate mints are always ASCII digits, but a tag read back from a
/// `.lut` file on disk could hold anything if the file were corrupted or
/// truncated by something outside the engine; callers must treat that as
/// corrupt data rather than let it panic.
pub fn tag_to_filename(tag: &Tag) -> Result<String, std::string::FromUtf8Error> {
    String::from_utf8(tag.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_roundtrips() {
        let lut = LookupTable::empty();
        let bytes = lut.to_bytes();
        assert_eq!(bytes.len(), CAP_MAX * TAG_WIDTH);
        let back = LookupTable::from_bytes(&bytes).unwrap();
        assert_eq!(back.get(0), EMPTY_TAG);
    }

    #[test]
    fn mint_tag_pads_and_wraps() {
        assert_eq!(&mint_tag(1), b"0001");
        assert_eq!(&mint_tag(42), b"0042");
        assert_eq!(&mint_tag(10_000), b"0000");
        assert_eq!(&mint_tag(10_001), b"0001");
    }

    #[test]
    fn minted_tag_never_collides_with_empty_sentinel() {
        for n in 0..10_000u16 {
            assert!(!is_empty_slot(&mint_tag(n)));
        }
    }

    #[test]
    fn tag_to_filename_rejects_non_ascii_tag() {
        let tag: Tag = [0xff, 0xfe, 0x00, 0x01];
        assert!(tag_to_filename(&tag).is_err());
    }

    #[test]
    fn set_and_clear_round_trip_through_bytes() {
        let mut lut = LookupTable::empty();
        lut.set(3, mint_tag(7));
        assert_eq!(lut.get(3), *b"0007");
        let back = LookupTable::from_bytes(&lut.to_bytes()).unwrap();
        assert_eq!(back.get(3), *b"0007");
        lut.clear(3);
        assert!(is_empty_slot(&lut.get(3)));
    }
}
