//! Error kinds reported by the display buffer
//!
//! All variants are local and recoverable. Payloads are plain numbers so the
//! write path can reject a block without allocating.

use thiserror::Error;

/// Errors that can occur during buffer operations
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum BufferError {
    #[error("Invalid matrix dimension: {channels} channels x {samples} samples")]
    InvalidDimension { channels: usize, samples: usize },

    #[error(
        "Invalid configuration: {channels} channels at {sample_rate_hz} Hz over {window_seconds} s"
    )]
    InvalidConfiguration {
        channels: usize,
        sample_rate_hz: f64,
        window_seconds: f64,
    },

    #[error("Range out of bounds: start {start} + len {len} exceeds {bound}")]
    OutOfRange {
        start: usize,
        len: usize,
        bound: usize,
    },

    #[error("Display buffer is not ready")]
    NotReady,

    #[error("Channel mismatch: expected {expected}, got {actual}")]
    ChannelMismatch { expected: usize, actual: usize },

    #[error("Marker queue is full")]
    MarkerQueueFull,
}

impl BufferError {
    /// Whether the renderer should simply skip this tick
    ///
    /// `NotReady` and `OutOfRange` mean "nothing to draw", not a fault.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NotReady | Self::OutOfRange { .. })
    }
}
