//! Default ordering indices.
//!
//! Sheets without an explicit index get one from an [`IndexAllocator`]. The
//! allocator hands out strictly increasing negative numbers, so:
//!
//! - sheets whose wrappers were created earlier sort before later ones,
//!   whatever order they mount in
//! - every default index sorts before any explicit non-negative index
//!
//! The process-wide allocator behind [`next_index`] is what engines use. An
//! isolated root can carry its own allocator through
//! [`InjectorFactory::with_allocator`](crate::InjectorFactory::with_allocator).

use std::sync::atomic::{AtomicI64, Ordering};

/// The first index an allocator hands out.
///
/// Exhausting the negative range takes 2^48 allocations.
pub const INDEX_FLOOR: i64 = -(1 << 48);

/// A counter producing unique, increasing, negative indices.
#[derive(Debug)]
pub struct IndexAllocator {
    next: AtomicI64,
}

impl IndexAllocator {
    /// Creates an allocator starting at [`INDEX_FLOOR`].
    pub const fn new() -> Self {
        Self {
            next: AtomicI64::new(INDEX_FLOOR),
        }
    }

    /// Returns an index greater than every index returned before.
    pub fn allocate(&self) -> i64 {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        debug_assert!(index < 0, "default index range exhausted");
        index
    }
}

impl Default for IndexAllocator {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_ALLOCATOR: IndexAllocator = IndexAllocator::new();

/// Allocates from the process-wide allocator.
pub fn next_index() -> i64 {
    GLOBAL_ALLOCATOR.allocate()
}
