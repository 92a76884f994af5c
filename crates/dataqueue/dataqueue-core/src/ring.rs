//! Ring index arithmetic: head/tail/seek bookkeeping for one queue.
//!
//! Generalizes the index-masking style of `lithos-icc::ring` from
//! power-of-two masking over an unbounded sequence number to modulo-`N`
//! arithmetic over the bounded `[0, max_entries)` slot range a queue's
//! `.header` actually uses — `max_entries` need not be a power of two here.
//!
//! Every function takes the header by `&mut` and mutates it in place; none of
//! them touch the filesystem. Callers (the operation layer) are responsible
//! for reading the header in, calling the right function here, and writing
//! it back out.

use crate::header::Header;

/// `(idx + 1) mod max_entries`.
#[inline]
fn advance(idx: u8, max_entries: u8) -> u8 {
    (idx + 1) % max_entries
}

/// Result of placing a new entry: the slot it landed in, and — on the
/// overwrite-full path — the slot that got evicted so the caller can delete
/// its payload file (spec §9's fix for I4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnqueueSlot {
    pub slot: u8,
    pub evicted_slot: Option<u8>,
}

/// Applies the §4.E enqueue rules for one new entry and reports where it
/// landed. Does not touch the LUT or any payload file; the caller writes the
/// new tag into `slot` and, if `evicted_slot` is `Some`, deletes that slot's
/// old payload file and zeroes its LUT entry.
pub fn enqueue_slot(header: &mut Header) -> EnqueueSlot {
    if header.num_of_entries == 0 {
        // A drained queue leaves `head` wherever the last dequeue advanced it
        // to, not necessarily back at `tail` (see `dequeue_slot` below) — the
        // new entry must land where `head` now is, with `tail` re-synced to
        // match, or the next enqueue/dequeue pair reads a zeroed LUT slot.
        header.tail_lut_offs = header.head_lut_offs;
        let slot = header.head_lut_offs;
        header.num_of_entries = 1;
        EnqueueSlot {
            slot,
            evicted_slot: None,
        }
    } else if header.num_of_entries == header.max_entries {
        let evicted = header.head_lut_offs;
        if header.seek_lut_offs == header.head_lut_offs {
            header.seek_lut_offs = advance(header.seek_lut_offs, header.max_entries);
        }
        header.head_lut_offs = advance(header.head_lut_offs, header.max_entries);
        header.tail_lut_offs = advance(header.tail_lut_offs, header.max_entries);
        EnqueueSlot {
            slot: header.tail_lut_offs,
            evicted_slot: Some(evicted),
        }
    } else {
        header.tail_lut_offs = advance(header.tail_lut_offs, header.max_entries);
        header.num_of_entries += 1;
        EnqueueSlot {
            slot: header.tail_lut_offs,
            evicted_slot: None,
        }
    }
}

/// Applies the §4.E dequeue rules. Returns the slot the caller must read and
/// then delete the payload of, or `None` if the queue is empty (callers
/// should check `num_of_entries == 0` themselves before calling; this is a
/// convenience guard, not the authoritative check).
pub fn dequeue_slot(header: &mut Header) -> Option<u8> {
    if header.num_of_entries == 0 {
        return None;
    }
    if header.seek_lut_offs == header.head_lut_offs {
        header.seek_lut_offs = advance(header.seek_lut_offs, header.max_entries);
    }
    let slot = header.head_lut_offs;
    header.head_lut_offs = advance(header.head_lut_offs, header.max_entries);
    header.num_of_entries -= 1;
    Some(slot)
}

pub fn seek_head(header: &mut Header) {
    header.seek_lut_offs = header.head_lut_offs;
}

pub fn seek_tail(header: &mut Header) {
    header.seek_lut_offs = header.tail_lut_offs;
}

/// Sets `seek` to the `position`-th oldest live entry (0-based, relative to
/// `head`). Callers must have already checked `position < num_of_entries`.
pub fn seek_position(header: &mut Header, position: u8) {
    header.seek_lut_offs = (header.head_lut_offs + position) % header.max_entries;
}

/// Returns the slot `GetEntry` should read from, and advances `seek` per
/// §4.E: stays at `tail` once it reaches it, rather than wrapping back to
/// `head` (spec §9 — the caller must re-seek to continue).
pub fn get_entry_slot(header: &mut Header) -> u8 {
    let slot = header.seek_lut_offs;
    if header.seek_lut_offs != header.tail_lut_offs {
        header.seek_lut_offs = advance(header.seek_lut_offs, header.max_entries);
    }
    slot
}
