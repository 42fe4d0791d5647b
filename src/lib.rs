//! LFP Display - real-time multichannel display buffer
//!
//! This library re-exports the buffering engine from `lfp-display-core` and
//! adds a synthetic acquisition source used by the demo binary and tests.

pub mod source;

pub use lfp_display_core::{buffer, config, error, events, lifecycle, markers, ports, stats};

pub use lfp_display_core::{
    BufferError, BufferLifecycleManager, CircularDisplayBuffer, DisplayConfig, IngestHandle,
    LifecycleEvent, LifecycleEventKind, LifecycleState, Marker, SampleMatrix, Snapshot,
    SnapshotReadPort, SnapshotReader, StreamingIngestPort,
};
pub use lfp_display_core::{
    BUILD_DATE, DEFAULT_BLOCK_SIZE, DEFAULT_SAMPLE_RATE, DEFAULT_WINDOW_SECONDS, VERSION,
};
