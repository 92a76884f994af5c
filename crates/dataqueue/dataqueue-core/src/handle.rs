//! Process-local handle table (spec §4.D).
//!
//! A fixed `H_max`-slot table, each slot either free or holding one open
//! queue's `{name, access, mode}`. The slot's index is the handle identity
//! exposed to callers; validity is a range-and-occupancy check against this
//! table, never a pointer or generation tag — the spec only promises
//! address-stable identity, so a plain `Vec<Option<_>>` slot index is enough.

/// Requested access level for an open queue (spec §3/§4.F).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessType {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

/// Payload framing mode negotiated at open time. The engine does not itself
/// interpret payload bytes differently per mode (that's out of scope per
/// spec §1); it is carried on the handle purely for re-open/mismatch checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Unpacked,
    BinaryPacked,
}

/// Opaque handle identity: an index into the process-local handle table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(usize);

#[derive(Debug, Clone)]
pub struct HandleEntry {
    pub name: String,
    pub access: AccessType,
    pub mode: AccessMode,
}

#[derive(Debug)]
pub struct HandleTable {
    slots: Vec<Option<HandleEntry>>,
}

impl HandleTable {
    pub fn new(h_max: usize) -> Self {
        Self {
            slots: (0..h_max).map(|_| None).collect(),
        }
    }

    /// A handle already open on `name` with the exact same access and mode
    /// (re-open policy, spec §4.D).
    pub fn find_reopen(
        &self,
        name: &str,
        access: AccessType,
        mode: AccessMode,
    ) -> Option<HandleId> {
        self.slots.iter().enumerate().find_map(|(i, slot)| {
            slot.as_ref().and_then(|e| {
                (e.name == name && e.access == access && e.mode == mode).then_some(HandleId(i))
            })
        })
    }

    /// Any handle open on `name`, regardless of access/mode — used for
    /// Destroy's busy check and Open's mismatched-reopen detection.
    pub fn find_any_for_name(&self, name: &str) -> Option<HandleId> {
        self.slots.iter().enumerate().find_map(|(i, slot)| {
            slot.as_ref()
                .and_then(|e| (e.name == name).then_some(HandleId(i)))
        })
    }

    /// Claims the first free slot. Returns `None` if the table is full
    /// (`HANDLE_NOT_AVAIL`).
    pub fn allocate(&mut self, entry: HandleEntry) -> Option<HandleId> {
        let idx = self.slots.iter().position(|s| s.is_none())?;
        self.slots[idx] = Some(entry);
        Some(HandleId(idx))
    }

    /// Frees a slot. No-op if the handle isn't currently valid.
    pub fn release(&mut self, id: HandleId) {
        if let Some(slot) = self.slots.get_mut(id.0) {
            *slot = None;
        }
    }

    pub fn get(&self, id: HandleId) -> Option<&HandleEntry> {
        self.slots.get(id.0).and_then(|s| s.as_ref())
    }

    pub fn is_valid(&self, id: HandleId) -> bool {
        self.get(id).is_some()
    }
}
