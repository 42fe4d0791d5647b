//! Write-side and read-side contracts
//!
//! The acquisition pipeline talks to the buffer only through
//! [`StreamingIngestPort`]; renderers only through [`SnapshotReadPort`].

use crate::buffer::Snapshot;
use crate::error::BufferError;
use crate::lifecycle::{LifecycleState, SharedRing};
use crate::markers::Marker;
use crate::stats::IngestStats;
use ringbuf::traits::Producer;
use ringbuf::HeapProd;
use std::sync::Arc;

/// Narrow write-side contract, called once per incoming block
pub trait StreamingIngestPort {
    /// Append `n_samples` samples from one slice per channel
    ///
    /// Must not allocate or block beyond the buffer's copy-bound lock.
    fn write<C: AsRef<[f32]>>(&mut self, block: &[C], n_samples: usize) -> Result<(), BufferError>;
}

/// Narrow read-side contract, called once per render tick
pub trait SnapshotReadPort {
    /// Copy `count` samples per channel ending `offset_from_now` samples before the newest
    fn read(&self, offset_from_now: usize, count: usize) -> Result<Snapshot, BufferError>;

    fn channel_count(&self) -> usize;

    fn capacity_samples(&self) -> usize;

    fn state(&self) -> LifecycleState;
}

/// The single producer handle
///
/// Not `Clone`: owning it is what makes a thread the only writer.
pub struct IngestHandle {
    shared: Arc<SharedRing>,
    markers: HeapProd<Marker>,
}

impl IngestHandle {
    pub(crate) fn new(shared: Arc<SharedRing>, markers: HeapProd<Marker>) -> Self {
        Self { shared, markers }
    }

    /// Absolute sample number of the next sample to be written
    ///
    /// Resets to zero whenever the ring is resized.
    pub fn position(&self) -> u64 {
        self.shared.position()
    }

    /// Queue an event marker for the renderer
    ///
    /// Lock-free. A full queue drops the marker, counts it and reports
    /// [`BufferError::MarkerQueueFull`].
    pub fn push_marker(&mut self, mut marker: Marker) -> Result<(), BufferError> {
        if self.shared.state() != LifecycleState::Enabled {
            return Err(BufferError::NotReady);
        }
        marker.generation = self.shared.generation();
        self.markers.try_push(marker).map_err(|_| {
            self.shared.counters.record_dropped_marker();
            BufferError::MarkerQueueFull
        })
    }

    pub fn stats(&self) -> IngestStats {
        self.shared.counters.snapshot()
    }
}

impl StreamingIngestPort for IngestHandle {
    fn write<C: AsRef<[f32]>>(&mut self, block: &[C], n_samples: usize) -> Result<(), BufferError> {
        let counters = &self.shared.counters;
        let result = self.shared.with_ring_mut(|ring| {
            let oversized = n_samples > ring.capacity_samples();
            ring.write(block, n_samples)?;
            Ok(oversized)
        });
        match result {
            Ok(oversized) => {
                counters.record_block(n_samples, oversized);
                Ok(())
            }
            Err(e) => {
                counters.record_rejected_write();
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for IngestHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestHandle")
            .field("position", &self.position())
            .finish_non_exhaustive()
    }
}

/// Renderer handle; cheap to clone
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    shared: Arc<SharedRing>,
}

impl SnapshotReader {
    pub(crate) fn new(shared: Arc<SharedRing>) -> Self {
        Self { shared }
    }

    /// Same as [`SnapshotReadPort::read`] but reuses the caller's vectors
    ///
    /// `out` is sized for the current geometry before the ring is locked, so
    /// the copy itself never allocates while the producer waits. A resize
    /// landing between sizing and copying yields `NotReady`.
    ///
    /// # Returns
    /// `(end_sample, generation)` of the copied window
    pub fn read_into(
        &self,
        offset_from_now: usize,
        count: usize,
        out: &mut Vec<Vec<f32>>,
    ) -> Result<(u64, u64), BufferError> {
        let channels = self.shared.channel_count();
        let capacity = self.shared.capacity_samples();
        out.resize_with(channels, Vec::new);
        if count <= capacity {
            for dest in out.iter_mut() {
                dest.clear();
                dest.reserve(count);
            }
        }

        let result = self.shared.with_ring(|ring| {
            if ring.channel_count() != channels || ring.capacity_samples() != capacity {
                return Err(BufferError::NotReady);
            }
            let end = ring.read_into(offset_from_now, count, out)?;
            Ok((end, ring.generation()))
        });
        if result.is_err() {
            self.shared.counters.record_rejected_read();
        }
        result
    }

    /// Read the whole window, oldest sample first
    pub fn read_window(&self) -> Result<Snapshot, BufferError> {
        self.read(0, self.capacity_samples())
    }

    /// Generation of the live ring
    pub fn generation(&self) -> u64 {
        self.shared.generation()
    }

    pub fn stats(&self) -> IngestStats {
        self.shared.counters.snapshot()
    }
}

impl SnapshotReadPort for SnapshotReader {
    fn read(&self, offset_from_now: usize, count: usize) -> Result<Snapshot, BufferError> {
        let mut channels = Vec::new();
        let (end_sample, generation) = self.read_into(offset_from_now, count, &mut channels)?;
        Ok(Snapshot {
            channels,
            end_sample,
            generation,
        })
    }

    fn channel_count(&self) -> usize {
        self.shared.channel_count()
    }

    fn capacity_samples(&self) -> usize {
        self.shared.capacity_samples()
    }

    fn state(&self) -> LifecycleState {
        self.shared.state()
    }
}
