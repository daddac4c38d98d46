//! Atom Cache Module
//!
//! Per-connection cache that lets a repeated atom travel as a one-byte slot
//! index instead of its full text.
//!
//! The cache is direct-mapped and lossy: an atom's slot is
//! `id % MAXINDX`, and an insert simply overwrites whatever occupied the
//! slot. There is no collision chaining. Peer synchronization depends on
//! both sides making identical eviction decisions from the identical opcode
//! sequence, so the mapping must not be changed without renegotiating the
//! protocol.
//!
//! `outgoing` tracks what this side last sent per slot; `incoming` mirrors
//! what the peer last defined per slot. The protocol keeps the two tables
//! consistent without acknowledgment traffic.

use crate::constants::MAXINDX;

/// Direct-mapped atom cache, one per connection
#[derive(Debug, Clone)]
pub struct AtomCache {
    outgoing: [Option<u32>; MAXINDX],
    incoming: [Option<u32>; MAXINDX],
}

impl AtomCache {
    pub fn new() -> Self {
        Self {
            outgoing: [None; MAXINDX],
            incoming: [None; MAXINDX],
        }
    }

    /// Slot an atom maps to
    pub fn slot_of(atom: u32) -> u8 {
        (atom as usize % MAXINDX) as u8
    }

    /// Slot of `atom` if it is the current occupant of its slot
    pub fn lookup_outgoing(&self, atom: u32) -> Option<u8> {
        let slot = Self::slot_of(atom);
        if self.outgoing[slot as usize] == Some(atom) {
            Some(slot)
        } else {
            None
        }
    }

    /// Install `atom` in its slot, evicting the previous occupant
    pub fn insert_outgoing(&mut self, atom: u32) -> u8 {
        let slot = Self::slot_of(atom);
        self.outgoing[slot as usize] = Some(atom);
        slot
    }

    /// Record an atom the peer defined for `slot`
    ///
    /// Returns false when the slot is outside the table; the caller treats
    /// that as a malformed message.
    pub fn insert_incoming(&mut self, slot: u8, atom: u32) -> bool {
        if (slot as usize) < MAXINDX {
            self.incoming[slot as usize] = Some(atom);
            true
        } else {
            false
        }
    }

    /// Atom the peer last defined for `slot`, if any
    pub fn lookup_incoming(&self, slot: u8) -> Option<u32> {
        if (slot as usize) < MAXINDX {
            self.incoming[slot as usize]
        } else {
            None
        }
    }
}

impl Default for AtomCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_miss_then_hit() {
        let mut cache = AtomCache::new();
        assert_eq!(cache.lookup_outgoing(7), None);
        let slot = cache.insert_outgoing(7);
        assert_eq!(cache.lookup_outgoing(7), Some(slot));
    }

    #[test]
    fn test_direct_mapped_eviction() {
        let mut cache = AtomCache::new();
        // 7 and 7 + MAXINDX share a slot
        let other = 7 + MAXINDX as u32;
        let slot = cache.insert_outgoing(7);
        assert_eq!(cache.insert_outgoing(other), slot);
        assert_eq!(cache.lookup_outgoing(7), None);
        assert_eq!(cache.lookup_outgoing(other), Some(slot));
    }

    #[test]
    fn test_incoming_mirror() {
        let mut cache = AtomCache::new();
        assert!(cache.insert_incoming(12, 99));
        assert_eq!(cache.lookup_incoming(12), Some(99));
        assert_eq!(cache.lookup_incoming(13), None);
    }

    #[test]
    fn test_out_of_range_slot() {
        let mut cache = AtomCache::new();
        assert!(!cache.insert_incoming(MAXINDX as u8, 1));
        assert_eq!(cache.lookup_incoming(MAXINDX as u8), None);
    }

    #[test]
    fn test_halves_are_independent() {
        let mut cache = AtomCache::new();
        cache.insert_outgoing(5);
        assert_eq!(cache.lookup_incoming(AtomCache::slot_of(5)), None);
    }
}
