//! Buffer lifecycle management
//!
//! Owns the circular display buffer and keeps its geometry in step with the
//! upstream configuration:
//!
//! ```text
//!            configure()            enable() ok
//! Disabled ──────────────> Disabled ───────────> Enabled ─┐
//!    ^                                             │      │ configure() / set_window_seconds()
//!    └──────────────── disable() ──────────────────┘ <────┘ (resize, history discarded)
//! ```
//!
//! ## Concurrency
//!
//! The ring sits behind one `Mutex` whose critical sections are copy-bound.
//! A separate atomic state is checked before and after taking the lock, so a
//! read or write that races a resize fails with [`BufferError::NotReady`]
//! instead of seeing half-built geometry. New rings are allocated before the
//! lock is taken and swapped in, so the writer never waits on an allocation.

use crate::buffer::CircularDisplayBuffer;
use crate::config::DisplayConfig;
use crate::error::BufferError;
use crate::events::{
    ChannelListener, LifecycleEvent, LifecycleEventKind, LifecycleListener, ListenerSet,
};
use crate::markers::{marker_queue, MarkerDrain};
use crate::ports::{IngestHandle, SnapshotReader};
use crate::stats::{IngestCounters, IngestStats};
use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const STATE_DISABLED: u8 = 0;
const STATE_ENABLED: u8 = 1;
const STATE_RESIZING: u8 = 2;

/// Externally visible buffer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    /// No valid buffer; reads and writes fail with `NotReady`
    Disabled,
    /// Buffer sized and accepting reads and writes
    Enabled,
}

/// State shared between the manager, the ingest handle and readers
#[derive(Debug)]
pub(crate) struct SharedRing {
    state: AtomicU8,
    generation: AtomicU64,
    channels: AtomicUsize,
    capacity: AtomicUsize,
    /// Samples written into the current ring
    position: AtomicU64,
    ring: Mutex<Option<CircularDisplayBuffer>>,
    pub(crate) counters: IngestCounters,
}

impl SharedRing {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(STATE_DISABLED),
            generation: AtomicU64::new(0),
            channels: AtomicUsize::new(0),
            capacity: AtomicUsize::new(0),
            position: AtomicU64::new(0),
            ring: Mutex::new(None),
            counters: IngestCounters::new(),
        }
    }

    pub(crate) fn state(&self) -> LifecycleState {
        match self.state.load(Ordering::Acquire) {
            STATE_ENABLED => LifecycleState::Enabled,
            _ => LifecycleState::Disabled,
        }
    }

    fn is_enabled(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_ENABLED
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    #[cfg(test)]
    pub(crate) fn set_generation(&self, generation: u64) {
        self.generation.store(generation, Ordering::Release);
    }

    pub(crate) fn channel_count(&self) -> usize {
        self.channels.load(Ordering::Acquire)
    }

    pub(crate) fn capacity_samples(&self) -> usize {
        self.capacity.load(Ordering::Acquire)
    }

    pub(crate) fn position(&self) -> u64 {
        self.position.load(Ordering::Acquire)
    }

    // Ring contents stay consistent even if a holder panicked: every
    // mutation validates before touching storage.
    fn lock(&self) -> MutexGuard<'_, Option<CircularDisplayBuffer>> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` on the ring if the buffer is enabled
    pub(crate) fn with_ring_mut<R>(
        &self,
        f: impl FnOnce(&mut CircularDisplayBuffer) -> Result<R, BufferError>,
    ) -> Result<R, BufferError> {
        if !self.is_enabled() {
            return Err(BufferError::NotReady);
        }
        let mut guard = self.lock();
        if !self.is_enabled() {
            return Err(BufferError::NotReady);
        }
        let ring = guard.as_mut().ok_or(BufferError::NotReady)?;
        let result = f(&mut *ring);
        if result.is_ok() {
            self.position.store(ring.total_written(), Ordering::Release);
        }
        result
    }

    /// Run `f` on the ring without mutating it, if the buffer is enabled
    pub(crate) fn with_ring<R>(
        &self,
        f: impl FnOnce(&CircularDisplayBuffer) -> Result<R, BufferError>,
    ) -> Result<R, BufferError> {
        if !self.is_enabled() {
            return Err(BufferError::NotReady);
        }
        let guard = self.lock();
        if !self.is_enabled() {
            return Err(BufferError::NotReady);
        }
        f(guard.as_ref().ok_or(BufferError::NotReady)?)
    }

    /// Swap in a freshly allocated ring and mark the buffer enabled
    fn install(&self, ring: CircularDisplayBuffer) {
        self.state.store(STATE_RESIZING, Ordering::Release);
        let (channels, capacity, generation) =
            (ring.channel_count(), ring.capacity_samples(), ring.generation());
        let previous = {
            let mut guard = self.lock();
            guard.replace(ring)
        };
        // Old storage is freed outside the lock
        drop(previous);

        self.channels.store(channels, Ordering::Release);
        self.capacity.store(capacity, Ordering::Release);
        self.position.store(0, Ordering::Release);
        self.generation.store(generation, Ordering::Release);
        self.state.store(STATE_ENABLED, Ordering::Release);
    }

    /// Mark the buffer disabled and release its storage
    fn release(&self) {
        self.state.store(STATE_DISABLED, Ordering::Release);
        let previous = self.lock().take();
        drop(previous);
        self.channels.store(0, Ordering::Release);
        self.capacity.store(0, Ordering::Release);
        self.position.store(0, Ordering::Release);
    }
}

/// Ring capacity for a sample rate and window, `None` when it would be empty
///
/// # Example
/// ```
/// use lfp_display_core::lifecycle::required_capacity;
///
/// assert_eq!(required_capacity(44100.0, 5.0), Some(220_500));
/// assert_eq!(required_capacity(30000.0, 0.00001), None);
/// assert_eq!(required_capacity(0.0, 5.0), None);
/// ```
pub fn required_capacity(sample_rate_hz: f64, window_seconds: f64) -> Option<usize> {
    let samples = (sample_rate_hz * window_seconds).floor();
    if samples.is_finite() && samples >= 1.0 && samples <= usize::MAX as f64 {
        Some(samples as usize)
    } else {
        None
    }
}

/// Owns the display buffer and drives its enable/resize/disable lifecycle
///
/// The manager lives on the configuration path. The write side is handed out
/// once as an [`IngestHandle`]; any number of [`SnapshotReader`]s may be
/// created for renderers.
///
/// # Example
/// ```
/// use lfp_display_core::{BufferLifecycleManager, SnapshotReadPort, StreamingIngestPort};
///
/// let mut manager = BufferLifecycleManager::new();
/// manager.configure(2, 2.0).unwrap();
/// manager.enable().unwrap();
///
/// let mut ingest = manager.take_ingest().unwrap();
/// let reader = manager.reader();
/// ingest.write(&[[1.0f32, 2.0], [3.0, 4.0]], 2).unwrap();
///
/// // Window is 5 s at 2 Hz = 10 samples
/// assert_eq!(reader.capacity_samples(), 10);
/// assert_eq!(reader.read(0, 2).unwrap().channels[1], vec![3.0, 4.0]);
/// ```
#[derive(Debug)]
pub struct BufferLifecycleManager {
    config: DisplayConfig,
    channel_count: usize,
    sample_rate_hz: f64,
    shared: Arc<SharedRing>,
    listeners: ListenerSet,
    ingest: Option<IngestHandle>,
    markers: Option<MarkerDrain>,
}

impl BufferLifecycleManager {
    /// Create a disabled manager with the default configuration
    pub fn new() -> Self {
        Self::build(DisplayConfig::default())
    }

    /// Create a disabled manager with a custom configuration
    pub fn with_config(config: DisplayConfig) -> Result<Self, BufferError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: DisplayConfig) -> Self {
        let shared = Arc::new(SharedRing::new());
        let (producer, consumer) = marker_queue(config.marker_capacity);
        Self {
            ingest: Some(IngestHandle::new(Arc::clone(&shared), producer)),
            markers: Some(MarkerDrain::new(consumer, Arc::clone(&shared))),
            channel_count: 0,
            sample_rate_hz: 0.0,
            listeners: ListenerSet::default(),
            shared,
            config,
        }
    }

    /// Current state
    pub fn state(&self) -> LifecycleState {
        self.shared.state()
    }

    /// Configured channel count
    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    /// Configured sample rate in Hz
    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }

    /// Target history window in seconds
    pub fn window_seconds(&self) -> f64 {
        self.config.window_seconds
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    /// Capacity of the live ring, 0 while disabled
    pub fn capacity_samples(&self) -> usize {
        self.shared.capacity_samples()
    }

    /// Generation of the live ring, bumped on every enable and resize
    pub fn generation(&self) -> u64 {
        self.shared.generation()
    }

    pub fn stats(&self) -> IngestStats {
        self.shared.counters.snapshot()
    }

    pub fn reset_stats(&self) {
        self.shared.counters.reset();
    }

    /// Take the single write-side handle
    ///
    /// Returns `None` after the first call.
    pub fn take_ingest(&mut self) -> Option<IngestHandle> {
        self.ingest.take()
    }

    /// Take the single marker consumer
    ///
    /// Returns `None` after the first call.
    pub fn take_marker_drain(&mut self) -> Option<MarkerDrain> {
        self.markers.take()
    }

    /// Create a read-side handle
    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader::new(Arc::clone(&self.shared))
    }

    /// Register a listener for lifecycle events
    pub fn subscribe(&mut self, listener: impl LifecycleListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Number of registered lifecycle listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Register a bounded channel that receives lifecycle events
    pub fn subscribe_channel(&mut self) -> Receiver<LifecycleEvent> {
        let (listener, rx) = ChannelListener::bounded(self.config.event_queue_capacity);
        self.subscribe(listener);
        rx
    }

    /// Record new upstream stream parameters
    ///
    /// While enabled the ring is resized immediately; if the new parameters
    /// cannot produce a valid ring the manager drops to `Disabled` and the
    /// error is returned. While disabled the values are only recorded.
    pub fn configure(
        &mut self,
        channel_count: usize,
        sample_rate_hz: f64,
    ) -> Result<(), BufferError> {
        tracing::debug!(
            channels = channel_count,
            sample_rate_hz,
            "Stream configuration changed"
        );
        self.channel_count = channel_count;
        self.sample_rate_hz = sample_rate_hz;
        self.resize_if_enabled()
    }

    /// Change the target history window
    ///
    /// Rejects non-positive or non-finite windows without touching state.
    pub fn set_window_seconds(&mut self, window_seconds: f64) -> Result<(), BufferError> {
        let candidate = DisplayConfig {
            window_seconds,
            ..self.config.clone()
        };
        candidate.validate()?;
        self.config = candidate;
        self.resize_if_enabled()
    }

    /// Size the ring for the current configuration and start accepting data
    ///
    /// # Returns
    /// Capacity of the new ring in samples per channel
    pub fn enable(&mut self) -> Result<usize, BufferError> {
        match self.build_ring() {
            Ok(ring) => {
                let capacity = ring.capacity_samples();
                let channels = ring.channel_count();
                self.shared.install(ring);
                tracing::info!(channels, capacity, "Display buffer enabled");
                self.emit(LifecycleEventKind::Enabled { channels, capacity });
                Ok(capacity)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Display buffer enable rejected");
                self.disable();
                Err(e)
            }
        }
    }

    /// Stop accepting data and release the ring
    ///
    /// Emits `Disabled` only when the buffer was enabled.
    pub fn disable(&mut self) {
        let was_enabled = self.state() == LifecycleState::Enabled;
        self.shared.release();
        if was_enabled {
            tracing::info!("Display buffer disabled");
            self.emit(LifecycleEventKind::Disabled);
        }
    }

    fn resize_if_enabled(&mut self) -> Result<(), BufferError> {
        if self.state() != LifecycleState::Enabled {
            return Ok(());
        }

        let unchanged = required_capacity(self.sample_rate_hz, self.config.window_seconds)
            == Some(self.shared.capacity_samples())
            && self.channel_count == self.shared.channel_count();
        if unchanged {
            tracing::debug!("Geometry unchanged, keeping buffered history");
            return Ok(());
        }

        match self.build_ring() {
            Ok(ring) => {
                let capacity = ring.capacity_samples();
                let channels = ring.channel_count();
                self.shared.install(ring);
                tracing::info!(channels, capacity, "Display buffer resized");
                self.emit(LifecycleEventKind::Resized { channels, capacity });
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Resize rejected, disabling display buffer");
                self.disable();
                Err(e)
            }
        }
    }

    fn build_ring(&self) -> Result<CircularDisplayBuffer, BufferError> {
        let invalid = BufferError::InvalidConfiguration {
            channels: self.channel_count,
            sample_rate_hz: self.sample_rate_hz,
            window_seconds: self.config.window_seconds,
        };
        if self.channel_count == 0 {
            return Err(invalid);
        }
        let capacity =
            required_capacity(self.sample_rate_hz, self.config.window_seconds).ok_or(invalid)?;
        let ring = CircularDisplayBuffer::new(self.channel_count, capacity).map_err(|_| invalid)?;
        Ok(ring.with_generation(self.shared.generation() + 1))
    }

    fn emit(&self, kind: LifecycleEventKind) {
        let event = LifecycleEvent::new(kind, self.shared.generation());
        self.listeners.notify(&event);
    }
}

impl Default for BufferLifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}
