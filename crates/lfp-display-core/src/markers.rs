//! Event markers travelling alongside the sample stream
//!
//! Upstream event channels (TTL edges and similar) are pushed by the ingest
//! side into a lock-free SPSC ring and drained by the renderer. Each marker
//! is stamped with the buffer generation it was recorded in; markers from an
//! older generation refer to discarded geometry and are dropped on drain.

use crate::lifecycle::SharedRing;
use ringbuf::traits::{Consumer, Observer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A single event on an upstream event channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    /// Absolute sample number the event occurred at
    pub sample_number: u64,
    /// Event channel (not a sample channel)
    pub channel: u16,
    /// Rising (true) or falling (false) edge
    pub rising: bool,
    /// Buffer generation, stamped on push
    pub generation: u64,
}

impl Marker {
    pub fn new(sample_number: u64, channel: u16, rising: bool) -> Self {
        Self {
            sample_number,
            channel,
            rising,
            generation: 0,
        }
    }
}

pub(crate) fn marker_queue(capacity: usize) -> (HeapProd<Marker>, HeapCons<Marker>) {
    HeapRb::<Marker>::new(capacity).split()
}

/// Renderer side of the marker queue
pub struct MarkerDrain {
    consumer: HeapCons<Marker>,
    shared: Arc<SharedRing>,
}

impl MarkerDrain {
    pub(crate) fn new(consumer: HeapCons<Marker>, shared: Arc<SharedRing>) -> Self {
        Self { consumer, shared }
    }

    /// Markers waiting in the queue, including stale ones
    pub fn pending(&self) -> usize {
        self.consumer.occupied_len()
    }

    /// Move all current-generation markers into `out`
    ///
    /// # Returns
    /// Number of markers appended
    pub fn drain(&mut self, out: &mut Vec<Marker>) -> usize {
        let generation = self.shared.generation();
        let before = out.len();
        while let Some(marker) = self.consumer.try_pop() {
            if marker.generation == generation {
                out.push(marker);
            }
        }
        out.len() - before
    }
}

impl std::fmt::Debug for MarkerDrain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerDrain")
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbuf::traits::Producer;

    #[test]
    fn test_queue_capacity() {
        let (mut prod, cons) = marker_queue(2);
        assert!(prod.try_push(Marker::new(1, 0, true)).is_ok());
        assert!(prod.try_push(Marker::new(2, 0, false)).is_ok());
        assert!(prod.try_push(Marker::new(3, 0, true)).is_err());
        assert_eq!(cons.occupied_len(), 2);
    }

    #[test]
    fn test_drain_skips_stale_generation() {
        let shared = Arc::new(SharedRing::new());
        shared.set_generation(2);
        let (mut prod, cons) = marker_queue(8);
        let mut drain = MarkerDrain::new(cons, Arc::clone(&shared));

        let mut stale = Marker::new(10, 1, true);
        stale.generation = 1;
        let mut fresh = Marker::new(20, 1, false);
        fresh.generation = 2;
        prod.try_push(stale).unwrap();
        prod.try_push(fresh).unwrap();
        assert_eq!(drain.pending(), 2);

        let mut out = Vec::new();
        assert_eq!(drain.drain(&mut out), 1);
        assert_eq!(out, vec![fresh]);
        assert_eq!(drain.pending(), 0);
    }
}
