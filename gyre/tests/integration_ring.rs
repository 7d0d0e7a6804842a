//! Integration tests for the full buffer lifecycle.
//!
//! These tests exercise the complete flow from creation through writes,
//! aggregation, window advancement, and range queries, including the
//! out-of-window edge cases late data hits in production.

use gyre::{Aggregation, RingBuffer, RingConfig};

const SEC: i64 = 1_000_000_000;

/// Helper: a buffer of `rows` one-second buckets with one column.
fn one_column(rows: u32) -> RingBuffer {
    RingBuffer::new(RingConfig::new(rows, 1, 1).unwrap()).unwrap()
}

#[test]
fn test_fresh_buffer_has_no_values() {
    let ring = RingBuffer::new(RingConfig::new(10, 3, 60).unwrap()).unwrap();

    assert_eq!(ring.current_time_ns(), 60 * 9 * SEC);
    for column in 1..=3 {
        // Every read is "no value": either out of window, or a NaN cell.
        for second in [0, 59, 540, 599, 6000] {
            let value = ring.get(second * SEC, column).unwrap();
            assert!(value.is_none_or(f64::is_nan), "t={second}s c={column}");
        }
    }
}

#[test]
fn test_write_read_cycle() {
    let mut ring = RingBuffer::new(RingConfig::new(10, 2, 1).unwrap()).unwrap();

    // set then get at the same timestamp returns the written value
    assert_eq!(ring.set(4 * SEC, 1, 7.25).unwrap(), Some(7.25));
    assert_eq!(ring.get(4 * SEC, 1).unwrap(), Some(7.25));

    // add on an unwritten cell behaves like set; a second add accumulates
    assert_eq!(ring.add(5 * SEC, 2, 2.0).unwrap(), Some(2.0));
    assert_eq!(ring.add(5 * SEC, 2, 3.0).unwrap(), Some(5.0));
    assert_eq!(ring.get(5 * SEC, 2).unwrap(), Some(5.0));
}

#[test]
fn test_nan_is_never_equal_to_itself() {
    let mut ring = one_column(10);

    ring.add(3 * SEC, 1, f64::NAN).unwrap();
    let cell = ring.get(3 * SEC, 1).unwrap().unwrap();
    #[allow(clippy::eq_op)]
    {
        assert!(cell != cell);
    }

    let untouched = ring.get(4 * SEC, 1).unwrap().unwrap();
    assert!(untouched.is_nan());
}

#[test]
fn test_aggregation_policies() {
    let mut ring = RingBuffer::new(RingConfig::new(10, 4, 1).unwrap()).unwrap();
    ring.set_header(1, "total", None, Some(Aggregation::Sum)).unwrap();
    ring.set_header(2, "floor", None, Some(Aggregation::Min)).unwrap();
    ring.set_header(3, "ceiling", None, Some(Aggregation::Max)).unwrap();
    ring.set_header(4, "gauge", None, Some(Aggregation::None)).unwrap();

    for column in 1..=4 {
        ring.set(2 * SEC, column, 5.0).unwrap();
        ring.set(2 * SEC, column, 3.0).unwrap();
    }

    assert_eq!(ring.get(2 * SEC, 1).unwrap(), Some(3.0)); // sum: overwrite
    assert_eq!(ring.get(2 * SEC, 2).unwrap(), Some(3.0)); // min: 3 wins
    assert_eq!(ring.get(2 * SEC, 3).unwrap(), Some(5.0)); // max: 5 stays
    assert_eq!(ring.get(2 * SEC, 4).unwrap(), Some(3.0)); // none: overwrite
}

#[test]
fn test_range_queries() {
    let mut ring = one_column(5);
    for i in 0..5 {
        ring.set(i * SEC, 1, (i + 1) as f64).unwrap();
    }

    // Full window
    assert_eq!(
        ring.get_range(1, None, None).unwrap().unwrap(),
        vec![1.0, 2.0, 3.0, 4.0, 5.0]
    );
    // Closed sub-range: buckets holding 3 and 4
    assert_eq!(
        ring.get_range(1, Some(2 * SEC), Some(3 * SEC)).unwrap().unwrap(),
        vec![3.0, 4.0]
    );
    // Open end runs to the newest bucket
    assert_eq!(
        ring.get_range(1, Some(2 * SEC), None).unwrap().unwrap(),
        vec![3.0, 4.0, 5.0]
    );
    // Entirely beyond the window: absent, no partial results
    assert!(ring
        .get_range(1, Some(100 * SEC), Some(104 * SEC))
        .unwrap()
        .is_none());
    // Inverted bounds are an argument error, not "absent"
    assert!(ring.get_range(1, Some(3 * SEC), Some(2 * SEC)).is_err());
}

#[test]
fn test_future_write_slides_window() {
    let mut ring = one_column(5);
    for i in 0..5 {
        ring.set(i * SEC, 1, (i + 1) as f64).unwrap();
    }

    // Jump 3 buckets ahead: 0s, 1s, 2s leave the window.
    assert_eq!(ring.set(7 * SEC, 1, 70.0).unwrap(), Some(70.0));
    assert_eq!(ring.current_time_ns(), 7 * SEC);

    for old in 0..3 {
        assert_eq!(ring.get(old * SEC, 1).unwrap(), None, "t={old}s");
        assert_eq!(ring.set(old * SEC, 1, 1.0).unwrap(), None);
        assert_eq!(ring.add(old * SEC, 1, 1.0).unwrap(), None);
    }

    // Survivors are intact; slid-over buckets were cleared.
    assert_eq!(ring.get(3 * SEC, 1).unwrap(), Some(4.0));
    assert_eq!(ring.get(4 * SEC, 1).unwrap(), Some(5.0));
    assert!(ring.get(5 * SEC, 1).unwrap().unwrap().is_nan());
    assert!(ring.get(6 * SEC, 1).unwrap().unwrap().is_nan());

    let values = ring.get_range(1, None, None).unwrap().unwrap();
    assert_eq!(values.len(), 5);
    assert_eq!(values[0], 4.0);
    assert_eq!(values[1], 5.0);
    assert!(values[2].is_nan());
    assert!(values[3].is_nan());
    assert_eq!(values[4], 70.0);
}

#[test]
fn test_reads_never_advance_the_window() {
    let mut ring = one_column(5);
    ring.set(4 * SEC, 1, 1.0).unwrap();
    let before = ring.current_time_ns();

    assert_eq!(ring.get(100 * SEC, 1).unwrap(), None);
    assert!(ring.get_range(1, Some(90 * SEC), Some(100 * SEC)).unwrap().is_none());
    assert_eq!(ring.current_time_ns(), before);
}

#[test]
fn test_bucket_flooring() {
    let mut ring = RingBuffer::new(RingConfig::new(10, 1, 60).unwrap()).unwrap();

    // Any timestamp inside a bucket maps to the same cell.
    let base = 120 * SEC;
    ring.add(base, 1, 1.0).unwrap();
    ring.add(base + 59 * SEC, 1, 1.0).unwrap();
    ring.add(base + 59 * SEC + 999_999_999, 1, 1.0).unwrap();
    assert_eq!(ring.get(base + 30 * SEC, 1).unwrap(), Some(3.0));

    // The next second over starts a new bucket.
    ring.add(base + 60 * SEC, 1, 9.0).unwrap();
    assert_eq!(ring.get(base + 60 * SEC, 1).unwrap(), Some(9.0));
    assert_eq!(ring.get(base, 1).unwrap(), Some(3.0));
}

#[test]
fn test_configuration_accessors() {
    let ring = RingBuffer::new(RingConfig::with_deltas(12, 3, 5).unwrap()).unwrap();
    assert_eq!(ring.configuration(), (12, 3, 5));
    assert_eq!(ring.rows(), 12);
    assert_eq!(ring.columns(), 3);
    assert_eq!(ring.seconds_per_row(), 5);
    assert!(ring.tracks_deltas());
    assert_eq!(ring.window_start_ns(), 0);
    assert_eq!(ring.current_time_ns(), 55 * SEC);
}

#[test]
fn test_header_sanitization_roundtrip() {
    let mut ring = one_column(5);
    assert_eq!(
        ring.set_header(1, "cpu usage!", Some("%"), Some(Aggregation::Max)).unwrap(),
        1
    );
    let header = ring.header(1).unwrap();
    assert_eq!(
        (header.name(), header.unit(), header.aggregation()),
        ("cpu_usage_", "_", Aggregation::Max)
    );
}
