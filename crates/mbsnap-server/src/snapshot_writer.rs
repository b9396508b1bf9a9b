use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use mbsnap_registers::{ChannelMap, DecodeOptions, RegisterStore, Snapshot};
use tracing::debug;

use crate::error::{Result, ServerError};

/// Throttled writer of the channel snapshot file.
///
/// A flush copies the register image under the store lock, then decodes
/// and writes with the store unlocked. Throttle bookkeeping and file
/// writes use separate locks: a caller inside the interval returns at once
/// even while another flush is writing. Writes are serialized, and each
/// copies the image only once it holds the write lock, so a later flush
/// never persists an older image than an earlier one.
#[derive(Debug)]
pub struct SnapshotWriter {
    path: PathBuf,
    map: &'static ChannelMap,
    options: DecodeOptions,
    interval: Duration,
    last_flush: Mutex<Option<Instant>>,
    write_lock: Mutex<()>,
    flushes: AtomicU64,
}

impl SnapshotWriter {
    pub fn new(
        path: impl Into<PathBuf>,
        map: &'static ChannelMap,
        options: DecodeOptions,
        interval: Duration,
    ) -> Self {
        Self {
            path: path.into(),
            map,
            options,
            interval,
            last_flush: Mutex::new(None),
            write_lock: Mutex::new(()),
            flushes: AtomicU64::new(0),
        }
    }

    /// Flush unless the previous flush is younger than the interval.
    ///
    /// The slot is claimed before writing; a failed write gives it back so
    /// the next candidate retries. Returns whether a flush happened.
    pub fn maybe_flush(&self, store: &RegisterStore) -> Result<bool> {
        let now = Instant::now();
        let previous = {
            let mut last = self.last_flush.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(previous) = *last {
                if now.duration_since(previous) < self.interval {
                    return Ok(false);
                }
            }
            last.replace(now)
        };

        if let Err(err) = self.write(store) {
            let mut last = self.last_flush.lock().unwrap_or_else(PoisonError::into_inner);
            if *last == Some(now) {
                *last = previous;
            }
            return Err(err);
        }
        Ok(true)
    }

    /// Flush regardless of the throttle.
    pub fn flush_now(&self, store: &RegisterStore) -> Result<()> {
        self.write(store)?;
        let now = Instant::now();
        let mut last = self.last_flush.lock().unwrap_or_else(PoisonError::into_inner);
        *last = Some(last.map_or(now, |previous| previous.max(now)));
        Ok(())
    }

    /// Successful flushes so far.
    pub fn flush_count(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn write(&self, store: &RegisterStore) -> Result<()> {
        let _serial = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let words = store.snapshot_copy();
        let text = Snapshot::capture(&words, self.map, &self.options).render();
        std::fs::write(&self.path, text.as_bytes()).map_err(|source| ServerError::Snapshot {
            path: self.path.clone(),
            source,
        })?;
        let count = self.flushes.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(path = ?self.path, channels = self.map.len(), flush = count, "wrote snapshot");
        Ok(())
    }
}
