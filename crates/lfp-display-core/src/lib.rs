//! LFP Display Core - Real-time multichannel circular display buffer
//!
//! Decouples a streaming acquisition pipeline, which delivers fixed or
//! variable-size blocks of multichannel samples, from a renderer that reads
//! recent history at its own pace. The write path never allocates; resizing
//! happens only on the configuration path.
//!
//! - Raw storage and the ring ([`buffer`])
//! - Enable/resize/disable state machine ([`lifecycle`])
//! - Producer and renderer contracts ([`ports`])
//! - Lifecycle notifications ([`events`]) and event markers ([`markers`])

pub mod buffer;
pub mod config;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod markers;
pub mod ports;
pub mod stats;

pub use buffer::{CircularDisplayBuffer, SampleMatrix, Snapshot};
pub use config::DisplayConfig;
pub use error::BufferError;
pub use events::{LifecycleEvent, LifecycleEventKind, LifecycleListener};
pub use lifecycle::{BufferLifecycleManager, LifecycleState};
pub use markers::{Marker, MarkerDrain};
pub use ports::{IngestHandle, SnapshotReadPort, SnapshotReader, StreamingIngestPort};
pub use stats::IngestStats;

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date stamped by build.rs
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Default history window in seconds
pub const DEFAULT_WINDOW_SECONDS: f64 = 5.0;

/// Default sample rate used by the demo source
pub const DEFAULT_SAMPLE_RATE: f64 = 44100.0;

/// Default block length used by the demo source
pub const DEFAULT_BLOCK_SIZE: usize = 128;
