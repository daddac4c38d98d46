//! Decode Arena Module
//!
//! Bump accounting for decode destinations. The size scan computes the
//! exact number of destination cells a buffer needs before any term is
//! built; the decoder then charges every allocation against an arena of
//! that capacity. Allocation is bump-only, there is no individual free.
//!
//! Exceeding the capacity means the size scan and the decoder disagree,
//! which is a codec fault, not an input fault.

/// Arena capacity exhausted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaOverflow {
    pub requested: usize,
    pub available: usize,
}

/// Bump cell allocator for decoded terms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermArena {
    capacity: usize,
    used: usize,
}

impl TermArena {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { capacity, used: 0 }
    }

    /// Reserve `cells` cells, returning the base offset of the reservation
    pub fn allocate(&mut self, cells: usize) -> Result<usize, ArenaOverflow> {
        let available = self.capacity - self.used;
        if cells > available {
            return Err(ArenaOverflow {
                requested: cells,
                available,
            });
        }
        let base = self.used;
        self.used += cells;
        Ok(base)
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
