//! Fixed-shape sample storage
//!
//! Samples are stored channel-major: every channel owns one contiguous row of
//! `capacity` samples, so a per-channel block copy is a single `copy_from_slice`.

use crate::error::BufferError;

/// Channels x time store of `f32` samples
#[derive(Debug, Clone, Default)]
pub struct SampleMatrix {
    /// Number of channels (rows)
    channels: usize,
    /// Samples per channel (columns)
    capacity: usize,
    /// Backing store, always `channels * capacity` long
    data: Vec<f32>,
}

impl SampleMatrix {
    /// Create a zeroed matrix
    ///
    /// # Arguments
    /// * `channels` - Number of channels, must be non-zero
    /// * `samples` - Samples per channel, must be non-zero
    pub fn new(channels: usize, samples: usize) -> Result<Self, BufferError> {
        let mut matrix = Self::default();
        matrix.resize(channels, samples)?;
        Ok(matrix)
    }

    /// Reshape the matrix, discarding all previous contents
    ///
    /// The existing allocation is reused when it is large enough. A shape the
    /// allocator cannot satisfy is rejected and leaves the matrix unchanged.
    pub fn resize(&mut self, channels: usize, samples: usize) -> Result<(), BufferError> {
        let invalid = BufferError::InvalidDimension { channels, samples };
        let len = channels
            .checked_mul(samples)
            .filter(|&len| len > 0)
            .ok_or(invalid)?;
        self.data
            .try_reserve_exact(len.saturating_sub(self.data.len()))
            .map_err(|_| invalid)?;

        self.data.clear();
        self.data.resize(len, 0.0);
        self.channels = channels;
        self.capacity = samples;
        Ok(())
    }

    /// Number of channels
    pub fn channel_count(&self) -> usize {
        self.channels
    }

    /// Samples per channel
    pub fn capacity_samples(&self) -> usize {
        self.capacity
    }

    /// Copy `count` samples from `source[source_start..]` into one channel row
    ///
    /// Never wraps: the destination range must lie inside the row.
    pub fn copy_block(
        &mut self,
        dest_channel: usize,
        dest_start: usize,
        source: &[f32],
        source_start: usize,
        count: usize,
    ) -> Result<(), BufferError> {
        if dest_channel >= self.channels {
            return Err(BufferError::OutOfRange {
                start: dest_channel,
                len: 1,
                bound: self.channels,
            });
        }
        check_range(dest_start, count, self.capacity)?;
        check_range(source_start, count, source.len())?;

        let row = dest_channel * self.capacity;
        self.data[row + dest_start..row + dest_start + count]
            .copy_from_slice(&source[source_start..source_start + count]);
        Ok(())
    }

    /// Borrow a contiguous run of one channel
    pub fn slice(&self, channel: usize, start: usize, len: usize) -> Result<&[f32], BufferError> {
        if channel >= self.channels {
            return Err(BufferError::OutOfRange {
                start: channel,
                len: 1,
                bound: self.channels,
            });
        }
        check_range(start, len, self.capacity)?;
        let row = channel * self.capacity;
        Ok(&self.data[row + start..row + start + len])
    }

    /// Borrow a whole channel row
    pub fn channel(&self, channel: usize) -> Option<&[f32]> {
        self.slice(channel, 0, self.capacity).ok()
    }

    /// Zero every sample without changing the shape
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }
}

fn check_range(start: usize, len: usize, bound: usize) -> Result<(), BufferError> {
    match start.checked_add(len) {
        Some(end) if end <= bound => Ok(()),
        _ => Err(BufferError::OutOfRange { start, len, bound }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_creation() {
        let matrix = SampleMatrix::new(4, 100).unwrap();
        assert_eq!(matrix.channel_count(), 4);
        assert_eq!(matrix.capacity_samples(), 100);
        assert!(matrix.channel(3).unwrap().iter().all(|&s| s == 0.0));
        assert!(matrix.channel(4).is_none());
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert_eq!(
            SampleMatrix::new(0, 100).unwrap_err(),
            BufferError::InvalidDimension {
                channels: 0,
                samples: 100
            }
        );
        assert!(SampleMatrix::new(2, 0).is_err());
        assert!(SampleMatrix::new(usize::MAX, 2).is_err());
    }

    #[test]
    fn test_unallocatable_shape_rejected() {
        let mut matrix = SampleMatrix::new(2, 8).unwrap();
        matrix.copy_block(1, 0, &[3.0], 0, 1).unwrap();

        // Byte size exceeds isize::MAX even though the element count fits
        let samples = usize::MAX / 4;
        assert_eq!(
            matrix.resize(2, samples).unwrap_err(),
            BufferError::InvalidDimension {
                channels: 2,
                samples
            }
        );
        assert_eq!(matrix.channel_count(), 2);
        assert_eq!(matrix.capacity_samples(), 8);
        assert_eq!(matrix.channel(1).unwrap()[0], 3.0);
    }

    #[test]
    fn test_resize_discards_contents() {
        let mut matrix = SampleMatrix::new(2, 8).unwrap();
        matrix.copy_block(1, 0, &[1.0; 8], 0, 8).unwrap();

        matrix.resize(3, 4).unwrap();
        assert_eq!(matrix.channel_count(), 3);
        assert_eq!(matrix.capacity_samples(), 4);
        for ch in 0..3 {
            assert_eq!(matrix.channel(ch).unwrap(), &[0.0; 4]);
        }
    }

    #[test]
    fn test_failed_resize_keeps_shape() {
        let mut matrix = SampleMatrix::new(2, 8).unwrap();
        matrix.copy_block(0, 0, &[5.0], 0, 1).unwrap();
        assert!(matrix.resize(0, 8).is_err());
        assert_eq!(matrix.channel_count(), 2);
        assert_eq!(matrix.slice(0, 0, 1).unwrap(), &[5.0]);
    }

    #[test]
    fn test_copy_block() {
        let mut matrix = SampleMatrix::new(2, 10).unwrap();
        let source = [1.0, 2.0, 3.0, 4.0, 5.0];

        matrix.copy_block(1, 7, &source, 2, 3).unwrap();
        assert_eq!(matrix.slice(1, 7, 3).unwrap(), &[3.0, 4.0, 5.0]);
        // Other channel untouched
        assert_eq!(matrix.slice(0, 7, 3).unwrap(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_copy_block_never_wraps() {
        let mut matrix = SampleMatrix::new(1, 10).unwrap();
        let source = [1.0; 4];

        let err = matrix.copy_block(0, 8, &source, 0, 4).unwrap_err();
        assert_eq!(
            err,
            BufferError::OutOfRange {
                start: 8,
                len: 4,
                bound: 10
            }
        );
        // Nothing was written
        assert_eq!(matrix.slice(0, 8, 2).unwrap(), &[0.0, 0.0]);
    }

    #[test]
    fn test_copy_block_bad_channel_or_source() {
        let mut matrix = SampleMatrix::new(2, 10).unwrap();
        assert!(matrix.copy_block(2, 0, &[1.0], 0, 1).is_err());
        assert!(matrix.copy_block(0, 0, &[1.0, 2.0], 1, 2).is_err());
    }
}
