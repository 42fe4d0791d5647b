//! E2E tests for ring write/read behavior
//!
//! Drives the buffer through the public ports the way an acquisition
//! pipeline and a renderer would.

use lfp_display::{
    BufferError, BufferLifecycleManager, IngestHandle, SnapshotReadPort, SnapshotReader,
    StreamingIngestPort,
};

fn ramp(from: u32, to: u32) -> Vec<f32> {
    (from..=to).map(|v| v as f32).collect()
}

/// Enabled manager with a 5 s window at `rate` Hz
fn setup(channels: usize, rate: f64) -> (BufferLifecycleManager, IngestHandle, SnapshotReader) {
    let mut manager = BufferLifecycleManager::new();
    manager.configure(channels, rate).unwrap();
    manager.enable().unwrap();
    let ingest = manager.take_ingest().unwrap();
    let reader = manager.reader();
    (manager, ingest, reader)
}

/// Capacity 10, two channels, blocks of 6 then 7 samples
#[test]
fn test_documented_wrap_scenario() {
    let (_manager, mut ingest, reader) = setup(2, 2.0);
    assert_eq!(reader.capacity_samples(), 10);

    let a = ramp(1, 6);
    ingest.write(&[&a, &a], 6).unwrap();
    assert_eq!(ingest.position(), 6);

    let b = ramp(7, 13);
    ingest.write(&[&b, &b], 7).unwrap();

    let snap = reader.read(0, 10).unwrap();
    for chan in &snap.channels {
        assert_eq!(chan, &ramp(4, 13), "Window must be oldest-first");
    }
}

/// Reads without wraparound return exactly the last N samples
#[test]
fn test_unwrapped_reads_return_last_samples() {
    let (_manager, mut ingest, reader) = setup(3, 20.0);
    let capacity = reader.capacity_samples();
    assert_eq!(capacity, 100);

    let mut written = 0u32;
    for len in [7u32, 13, 1, 29, 40] {
        let block: Vec<Vec<f32>> = (0..3)
            .map(|ch| {
                ramp(written + 1, written + len)
                    .iter()
                    .map(|v| v + ch as f32 * 1000.0)
                    .collect()
            })
            .collect();
        ingest.write(&block, len as usize).unwrap();
        written += len;

        for n in [1u32, len, written] {
            let snap = reader.read(0, n as usize).unwrap();
            for (ch, chan) in snap.channels.iter().enumerate() {
                let expected: Vec<f32> = ramp(written - n + 1, written)
                    .iter()
                    .map(|v| v + ch as f32 * 1000.0)
                    .collect();
                assert_eq!(chan, &expected);
            }
        }
    }
    assert_eq!(written as usize, capacity - 10);
}

/// Writing capacity + k samples leaves the cursor at k and keeps the newest window
#[test]
fn test_wraparound_across_many_blocks() {
    let (_manager, mut ingest, reader) = setup(1, 10.0);
    let capacity = reader.capacity_samples() as u32;

    let total = capacity + 17;
    let mut next = 1u32;
    while next <= total {
        let len = 9.min(total - next + 1);
        ingest.write(&[ramp(next, next + len - 1)], len as usize).unwrap();
        next += len;
    }

    let snap = reader.read_window().unwrap();
    assert_eq!(snap.channels[0], ramp(total - capacity + 1, total));
    assert_eq!(snap.end_sample, total as u64);
}

/// A block that ends exactly at the end of the ring wraps the cursor to zero
#[test]
fn test_exact_fit_then_continue() {
    let (_manager, mut ingest, reader) = setup(1, 2.0);
    ingest.write(&[ramp(1, 6)], 6).unwrap();
    ingest.write(&[ramp(7, 10)], 4).unwrap();
    ingest.write(&[ramp(11, 12)], 2).unwrap();

    assert_eq!(reader.read(0, 10).unwrap().channels[0], ramp(3, 12));
}

/// A single block larger than the ring keeps only its newest samples
#[test]
fn test_oversized_block() {
    let (manager, mut ingest, reader) = setup(2, 2.0);
    let big = ramp(1, 37);
    ingest.write(&[&big, &big], 37).unwrap();

    let snap = reader.read(0, 10).unwrap();
    assert_eq!(snap.channels[0], ramp(28, 37));
    assert_eq!(snap.channels[1], ramp(28, 37));
    assert_eq!(manager.stats().oversized_blocks, 1);
}

/// Offsets look further into the past
#[test]
fn test_offset_reads_and_marker_alignment() {
    let (_manager, mut ingest, reader) = setup(1, 4.0);
    ingest.write(&[ramp(1, 30)], 30).unwrap();

    let snap = reader.read(5, 10).unwrap();
    assert_eq!(snap.channels[0], ramp(16, 25));
    // Sample number 20 holds value 21
    let idx = snap.index_of(20).unwrap();
    assert_eq!(snap.channels[0][idx], 21.0);
}

/// Out-of-range reads and malformed blocks are rejected without side effects
#[test]
fn test_rejections_leave_buffer_intact() {
    let (_manager, mut ingest, reader) = setup(2, 2.0);
    let a = ramp(1, 5);
    ingest.write(&[&a, &a], 5).unwrap();

    assert!(matches!(
        reader.read(0, 11),
        Err(BufferError::OutOfRange { .. })
    ));
    assert!(matches!(
        reader.read(3, 8),
        Err(BufferError::OutOfRange { .. })
    ));
    assert!(matches!(
        ingest.write(&[&a], 5),
        Err(BufferError::ChannelMismatch { expected: 2, actual: 1 })
    ));
    assert!(matches!(
        ingest.write(&[&a, &a], 6),
        Err(BufferError::OutOfRange { .. })
    ));

    assert_eq!(ingest.position(), 5);
    assert_eq!(reader.read(0, 5).unwrap().channels[1], a);
}
