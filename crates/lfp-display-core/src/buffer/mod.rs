//! Sample storage and the circular display ring
//!
//! - Raw channels x time storage ([`matrix`])
//! - Wraparound-safe block writes and range reads ([`ring`])

pub mod matrix;
pub mod ring;

pub use matrix::SampleMatrix;
pub use ring::{CircularDisplayBuffer, Snapshot};
