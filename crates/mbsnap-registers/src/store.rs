use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::error::{RegisterError, Result};

/// Words needed to hold every channel in the standard table (offsets 0..=4103).
pub const DEFAULT_REGISTER_COUNT: usize = 4104;

/// Fixed-size shared memory of 16-bit words.
///
/// Every access goes through one mutex. Writes outside `[0, len)` are
/// dropped silently; callers learn how many words landed from the return
/// value of [`set_range`](Self::set_range) and nothing else.
///
/// Consecutive words are not updated atomically across separate calls, so
/// a reader may observe one half of a 32-bit pair from an older write.
#[derive(Debug)]
pub struct RegisterStore {
    words: Mutex<Box<[u16]>>,
    len: usize,
}

impl RegisterStore {
    /// Allocate `len` zeroed words.
    pub fn new(len: usize) -> Self {
        Self {
            words: Mutex::new(vec![0u16; len].into_boxed_slice()),
            len,
        }
    }

    /// Number of words; fixed for the lifetime of the store.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Word at `offset`, or `None` past the end.
    pub fn get(&self, offset: usize) -> Option<u16> {
        self.lock().get(offset).copied()
    }

    /// `count` consecutive words from `offset`.
    pub fn get_range(&self, offset: usize, count: usize) -> Result<Vec<u16>> {
        let end = offset.saturating_add(count);
        if end > self.len {
            return Err(RegisterError::OutOfRange {
                offset,
                end,
                len: self.len,
            });
        }
        Ok(self.lock()[offset..end].to_vec())
    }

    /// Store one word. Returns false when `offset` is out of range.
    pub fn set(&self, offset: usize, value: u16) -> bool {
        self.set_range(offset, &[value]) == 1
    }

    /// Store `values` from `offset` onward, skipping indices past the end.
    ///
    /// Returns the number of words actually written.
    pub fn set_range(&self, offset: usize, values: &[u16]) -> usize {
        let mut words = self.lock();
        let mut written = 0usize;
        for (i, value) in values.iter().enumerate() {
            let Some(index) = offset.checked_add(i) else {
                break;
            };
            if let Some(slot) = words.get_mut(index) {
                *slot = *value;
                written += 1;
            }
        }
        if written < values.len() {
            trace!(
                offset,
                requested = values.len(),
                written,
                "dropped out-of-range register writes"
            );
        }
        written
    }

    /// Copy of the whole buffer, taken under the lock.
    pub fn snapshot_copy(&self) -> Vec<u16> {
        self.lock().to_vec()
    }

    // Words are plain integers, so a panic mid-write cannot leave them invalid.
    fn lock(&self) -> MutexGuard<'_, Box<[u16]>> {
        self.words.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RegisterStore {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTER_COUNT)
    }
}
