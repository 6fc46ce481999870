//! # Buffer Pool
//!
//! Every parse rents a token buffer and expected-set storage, and alternation
//! rents short-lived branch accumulators at high frequency. Rather than
//! allocating fresh vectors each time, a [`Pool`] keeps returned vectors on a
//! shelf and hands them back out with their capacity intact.
//!
//! The pool is shared behind an `Arc` and protected by a mutex, so parser
//! values holding the same [`crate::config::ParseConfig`] can run on multiple
//! threads concurrently. Returned buffers are always cleared before they are
//! shelved.

use std::sync::Mutex;

/// Upper bound on shelved buffers; beyond this, returned buffers are simply
/// dropped.
const MAX_SHELVED: usize = 32;

/// A thread-safe free-list of reusable vectors.
#[derive(Debug)]
pub struct Pool<T> {
    shelves: Mutex<Vec<Vec<T>>>,
}

impl<T> Pool<T> {
    pub fn new() -> Self {
        Self {
            shelves: Mutex::new(Vec::new()),
        }
    }

    /// Take a vector from the pool, or allocate an empty one.
    pub fn rent(&self) -> Vec<T> {
        self.shelves
            .lock()
            .map(|mut shelves| shelves.pop())
            .unwrap_or_default()
            .unwrap_or_default()
    }

    /// Return a vector to the pool. Its contents are discarded.
    pub fn recycle(&self, mut buffer: Vec<T>) {
        buffer.clear();
        if buffer.capacity() == 0 {
            return;
        }
        if let Ok(mut shelves) = self.shelves.lock() {
            if shelves.len() < MAX_SHELVED {
                shelves.push(buffer);
            }
        }
    }

    /// Number of buffers currently shelved.
    pub fn shelved(&self) -> usize {
        self.shelves.lock().map(|shelves| shelves.len()).unwrap_or(0)
    }
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}
