//! Ingest statistics
//!
//! Counters are plain atomics so the write path can update them without
//! locking. [`IngestStats`] is the serializable snapshot handed to callers.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of the ingest counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    /// Blocks accepted by the ring
    pub blocks_written: u64,
    /// Samples per channel accepted by the ring
    pub samples_written: u64,
    /// Accepted blocks longer than the whole ring (oldest part discarded)
    pub oversized_blocks: u64,
    /// Writes rejected with an error
    pub rejected_writes: u64,
    /// Reads rejected with an error
    pub rejected_reads: u64,
    /// Markers dropped because the marker queue was full
    pub dropped_markers: u64,
}

/// Live counters shared between the producer, readers and the manager
#[derive(Debug, Default)]
pub struct IngestCounters {
    blocks_written: AtomicU64,
    samples_written: AtomicU64,
    oversized_blocks: AtomicU64,
    rejected_writes: AtomicU64,
    rejected_reads: AtomicU64,
    dropped_markers: AtomicU64,
}

impl IngestCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted block
    #[inline]
    pub fn record_block(&self, n_samples: usize, oversized: bool) {
        self.blocks_written.fetch_add(1, Ordering::Relaxed);
        self.samples_written
            .fetch_add(n_samples as u64, Ordering::Relaxed);
        if oversized {
            self.oversized_blocks.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_rejected_write(&self) {
        self.rejected_writes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rejected_read(&self) {
        self.rejected_reads.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dropped_marker(&self) {
        self.dropped_markers.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current values
    pub fn snapshot(&self) -> IngestStats {
        IngestStats {
            blocks_written: self.blocks_written.load(Ordering::Relaxed),
            samples_written: self.samples_written.load(Ordering::Relaxed),
            oversized_blocks: self.oversized_blocks.load(Ordering::Relaxed),
            rejected_writes: self.rejected_writes.load(Ordering::Relaxed),
            rejected_reads: self.rejected_reads.load(Ordering::Relaxed),
            dropped_markers: self.dropped_markers.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        self.blocks_written.store(0, Ordering::Relaxed);
        self.samples_written.store(0, Ordering::Relaxed);
        self.oversized_blocks.store(0, Ordering::Relaxed);
        self.rejected_writes.store(0, Ordering::Relaxed);
        self.rejected_reads.store(0, Ordering::Relaxed);
        self.dropped_markers.store(0, Ordering::Relaxed);
    }
}
