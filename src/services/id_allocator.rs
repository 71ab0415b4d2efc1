//! Small integer IDs for data call contexts and keepalive handles
//!
//! IDs start at 1. Released IDs are reused smallest first; releasing the
//! highest ID shrinks the range instead, together with any freed IDs right
//! below it.

use std::collections::BTreeSet;

use parking_lot::Mutex;

#[derive(Debug, Default)]
struct Ids {
    /// Highest ID handed out and not compacted away
    counter: i32,
    free: BTreeSet<i32>,
}

/// Thread-safe ID allocator
#[derive(Debug, Default)]
pub struct IdAllocator {
    ids: Mutex<Ids>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&self) -> i32 {
        let mut ids = self.ids.lock();
        match ids.free.pop_first() {
            Some(id) => id,
            None => {
                ids.counter += 1;
                ids.counter
            }
        }
    }

    /// Return `id` for reuse
    pub fn release(&self, id: i32) {
        let mut ids = self.ids.lock();
        if id == ids.counter {
            ids.counter -= 1;
            while ids.counter > 0 {
                let top = ids.counter;
                if !ids.free.remove(&top) {
                    break;
                }
                ids.counter -= 1;
            }
        } else {
            ids.free.insert(id);
        }
    }

    /// Number of IDs currently handed out
    pub fn in_use(&self) -> usize {
        let ids = self.ids.lock();
        usize::try_from(ids.counter)
            .unwrap_or(0)
            .saturating_sub(ids.free.len())
    }
}
