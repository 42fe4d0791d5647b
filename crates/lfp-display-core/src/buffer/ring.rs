//! Circular display buffer
//!
//! Appends incoming blocks of any size to a fixed-capacity ring and serves
//! range reads relative to the newest sample.
//!
//! ## Layout
//!
//! ```text
//!            write_cursor
//!                 v
//! [ 11 12 13 | 4  5  6  7  8  9  10 ]
//!   newest ^   ^ oldest
//! ```
//!
//! The logical window is the `capacity` samples ending one slot behind
//! `write_cursor`. A read of `count` samples that starts `offset` samples
//! before "now" is split into at most two contiguous copies when it crosses
//! the wrap point.

use super::matrix::SampleMatrix;
use crate::error::BufferError;

/// Copy of recent samples handed to the renderer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// One vector per channel, oldest sample first
    pub channels: Vec<Vec<f32>>,
    /// Absolute sample number one past the newest sample in the snapshot
    pub end_sample: u64,
    /// Buffer generation the snapshot was taken from
    pub generation: u64,
}

impl Snapshot {
    /// Number of samples per channel
    pub fn len(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }

    /// Whether the snapshot holds no samples
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position of an absolute sample number inside each channel vector
    pub fn index_of(&self, sample_number: u64) -> Option<usize> {
        let back = self.end_sample.checked_sub(sample_number)?;
        let len = self.len() as u64;
        if back == 0 || back > len {
            return None;
        }
        Some((len - back) as usize)
    }
}

/// Ring of multichannel samples sharing one write cursor
#[derive(Debug, Clone)]
pub struct CircularDisplayBuffer {
    matrix: SampleMatrix,
    /// Next slot to write, always `< capacity`
    write_cursor: usize,
    /// Samples written since this ring was created
    total_written: u64,
    generation: u64,
}

impl CircularDisplayBuffer {
    /// Create an empty ring of `channels` x `capacity` samples
    pub fn new(channels: usize, capacity: usize) -> Result<Self, BufferError> {
        Ok(Self {
            matrix: SampleMatrix::new(channels, capacity)?,
            write_cursor: 0,
            total_written: 0,
            generation: 0,
        })
    }

    /// Tag the ring with the lifecycle generation that created it
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    pub fn channel_count(&self) -> usize {
        self.matrix.channel_count()
    }

    pub fn capacity_samples(&self) -> usize {
        self.matrix.capacity_samples()
    }

    pub fn write_cursor(&self) -> usize {
        self.write_cursor
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Append a block of `n_samples` samples on every channel
    ///
    /// `block` must hold exactly one slice per channel, each at least
    /// `n_samples` long. Blocks longer than the ring keep only their newest
    /// `capacity` samples; the cursor still advances by `n_samples` modulo
    /// capacity. Nothing is written when validation fails.
    pub fn write<C: AsRef<[f32]>>(
        &mut self,
        block: &[C],
        n_samples: usize,
    ) -> Result<(), BufferError> {
        let channels = self.channel_count();
        if block.len() != channels {
            return Err(BufferError::ChannelMismatch {
                expected: channels,
                actual: block.len(),
            });
        }
        for source in block {
            let len = source.as_ref().len();
            if len < n_samples {
                return Err(BufferError::OutOfRange {
                    start: 0,
                    len: n_samples,
                    bound: len,
                });
            }
        }
        if n_samples == 0 {
            return Ok(());
        }

        let capacity = self.capacity_samples();
        // Oldest part of an oversized block would be overwritten within this call
        let skipped = n_samples.saturating_sub(capacity);
        let len = n_samples - skipped;
        let dest = (self.write_cursor + skipped % capacity) % capacity;
        let samples_left = capacity - dest;

        if len <= samples_left {
            for (chan, source) in block.iter().enumerate() {
                self.matrix
                    .copy_block(chan, dest, source.as_ref(), skipped, len)?;
            }
            let next = dest + len;
            // Exact fit must wrap, `capacity` is not a valid slot
            self.write_cursor = if next == capacity { 0 } else { next };
        } else {
            let extra = len - samples_left;
            for (chan, source) in block.iter().enumerate() {
                let source = source.as_ref();
                self.matrix
                    .copy_block(chan, dest, source, skipped, samples_left)?;
                self.matrix
                    .copy_block(chan, 0, source, skipped + samples_left, extra)?;
            }
            self.write_cursor = extra;
        }

        self.total_written += n_samples as u64;
        Ok(())
    }

    /// Read `count` samples per channel ending `offset_from_now` samples before the newest
    ///
    /// Slots that were never written since the last resize read as zero.
    pub fn read(&self, offset_from_now: usize, count: usize) -> Result<Snapshot, BufferError> {
        self.window_start(offset_from_now, count)?;
        let mut channels: Vec<Vec<f32>> = (0..self.channel_count())
            .map(|_| Vec::with_capacity(count))
            .collect();
        let end_sample = self.read_into(offset_from_now, count, &mut channels)?;
        Ok(Snapshot {
            channels,
            end_sample,
            generation: self.generation,
        })
    }

    /// Same as [`Self::read`] but copies into the caller's channel vectors
    ///
    /// `out` must hold one vector per channel. Vectors that already have room
    /// for `count` samples are filled without allocating.
    ///
    /// # Returns
    /// Absolute sample number one past the newest sample copied
    pub fn read_into(
        &self,
        offset_from_now: usize,
        count: usize,
        out: &mut [Vec<f32>],
    ) -> Result<u64, BufferError> {
        let start = self.window_start(offset_from_now, count)?;
        if out.len() != self.channel_count() {
            return Err(BufferError::ChannelMismatch {
                expected: self.channel_count(),
                actual: out.len(),
            });
        }

        let first = count.min(self.capacity_samples() - start);
        let second = count - first;
        for (chan, dest) in out.iter_mut().enumerate() {
            dest.clear();
            dest.extend_from_slice(self.matrix.slice(chan, start, first)?);
            if second > 0 {
                dest.extend_from_slice(self.matrix.slice(chan, 0, second)?);
            }
        }

        Ok(self.total_written.saturating_sub(offset_from_now as u64))
    }

    /// Ring index of the oldest sample in a window, if it fits in the ring
    fn window_start(&self, offset_from_now: usize, count: usize) -> Result<usize, BufferError> {
        let capacity = self.capacity_samples();
        let back = offset_from_now
            .checked_add(count)
            .filter(|&back| back <= capacity)
            .ok_or(BufferError::OutOfRange {
                start: offset_from_now,
                len: count,
                bound: capacity,
            })?;
        Ok((self.write_cursor + capacity - back) % capacity)
    }

    /// Forget all samples and rewind the cursor
    pub fn clear(&mut self) {
        self.matrix.clear();
        self.write_cursor = 0;
        self.total_written = 0;
    }
}
