//! Synthetic acquisition source
//!
//! Stands in for the upstream pipeline in the demo binary and tests.
//! Produces per-channel blocks of a slow oscillation plus noise, and a TTL
//! line that toggles every 500ms and is reported as event markers.

use std::f64::consts::TAU;

/// Oscillation amplitude (-6dB for headroom)
const AMPLITUDE: f32 = 0.5;

/// Noise amplitude relative to full scale
const NOISE_AMPLITUDE: f32 = 0.05;

/// Base oscillation frequency of channel 0 in Hz
const BASE_FREQUENCY: f64 = 4.0;

/// TTL edge reported inside the last block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlEdge {
    /// Offset into the block
    pub offset: usize,
    pub rising: bool,
}

/// Block generator for a fixed channel count and sample rate
///
/// # Example
/// ```
/// use lfp_display::source::SyntheticSource;
///
/// let mut source = SyntheticSource::new(4, 30000.0, 256);
/// let block = source.next_block();
/// assert_eq!(block.len(), 4);
/// assert_eq!(block[0].len(), 256);
/// ```
#[derive(Debug)]
pub struct SyntheticSource {
    sample_rate: f64,
    /// One reusable buffer per channel
    block: Vec<Vec<f32>>,
    /// Samples generated so far
    clock: u64,
    /// Samples between TTL edges
    ttl_period: u64,
    /// Edges found in the last block
    edges: Vec<TtlEdge>,
    noise_seed: u32,
}

impl SyntheticSource {
    /// Create a source
    ///
    /// # Arguments
    /// * `channels` - Number of channels per block
    /// * `sample_rate` - Sample rate in Hz
    /// * `block_size` - Samples per channel in each block
    pub fn new(channels: usize, sample_rate: f64, block_size: usize) -> Self {
        Self {
            sample_rate,
            block: vec![vec![0.0; block_size]; channels],
            clock: 0,
            ttl_period: ((sample_rate * 0.5) as u64).max(1),
            edges: Vec::with_capacity(4),
            noise_seed: 0x1234_5678,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.block.len()
    }

    pub fn block_size(&self) -> usize {
        self.block.first().map(Vec::len).unwrap_or(0)
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Samples generated so far
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Generate the next block
    ///
    /// Reuses internal buffers, so steady-state calls do not allocate.
    pub fn next_block(&mut self) -> &[Vec<f32>] {
        let block_size = self.block_size();
        self.edges.clear();

        for i in 0..block_size {
            let n = self.clock + i as u64;
            let t = n as f64 / self.sample_rate;
            for chan in 0..self.block.len() {
                let freq = BASE_FREQUENCY * (chan + 1) as f64;
                let noise = self.generate_noise() * NOISE_AMPLITUDE;
                self.block[chan][i] = (TAU * freq * t).sin() as f32 * AMPLITUDE + noise;
            }
            if n > 0 && n % self.ttl_period == 0 && self.edges.len() < self.edges.capacity() {
                self.edges.push(TtlEdge {
                    offset: i,
                    rising: (n / self.ttl_period) % 2 == 1,
                });
            }
        }

        self.clock += block_size as u64;
        &self.block
    }

    /// TTL edges inside the block returned by the last [`Self::next_block`]
    pub fn edges(&self) -> &[TtlEdge] {
        &self.edges
    }

    // LCG parameters (same as glibc)
    fn generate_noise(&mut self) -> f32 {
        self.noise_seed = self.noise_seed.wrapping_mul(1103515245).wrapping_add(12345);
        let bits = (self.noise_seed >> 16) & 0x7FFF;
        (bits as f32 / 16384.0) - 1.0
    }
}
