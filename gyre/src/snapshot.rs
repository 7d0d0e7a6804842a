//! Snapshot text format for exact state restore.
//!
//! A snapshot is a single line of space-separated tokens:
//!
//! ```text
//! <current_time> <current_row> <v_0> <v_1> ... <v_{rows*columns-1}> [<delta_time> <d_0> ... <d_{columns-1}> ...]
//! ```
//!
//! `current_time` (seconds) and `current_row` are integers, followed by
//! exactly `rows × columns` doubles in row-major order. When the buffer
//! tracks deltas, zero or more groups of `(timestamp, columns doubles)`
//! follow, one group per logged bucket. The format is for restore, not for
//! display; see [`export`](crate::export) for the human-facing dump.
//!
//! Doubles use fixed, portable tokens: `nan`, `inf`, `-inf`, or Rust's
//! shortest round-trip decimal. NaN marks unwritten cells and no-change
//! delta columns, so a snapshot restores bit-identical state on an
//! identically configured buffer.

use std::fmt::Write as _;

use crate::delta::DeltaLog;
use crate::error::{RestoreError, Result};
use crate::ring::RingBuffer;

/// Appends one value token to `out`.
///
/// Non-finite values get the fixed spellings `nan`, `inf`, and `-inf`;
/// everything else uses the shortest decimal that parses back exactly.
pub(crate) fn push_value(out: &mut String, value: f64) {
    if value.is_nan() {
        out.push_str("nan");
    } else if value == f64::INFINITY {
        out.push_str("inf");
    } else if value == f64::NEG_INFINITY {
        out.push_str("-inf");
    } else {
        let _ = write!(out, "{value}");
    }
}

/// Parses one value token, reporting its position on failure.
fn parse_value(token: &str, position: usize) -> Result<f64> {
    token.parse::<f64>().map_err(|_| {
        RestoreError::InvalidValue {
            token: token.to_string(),
            position,
        }
        .into()
    })
}

impl RingBuffer {
    /// Serializes the complete buffer state to snapshot text.
    ///
    /// The output restores cursor, matrix, and (when tracking) the delta
    /// log via [`from_snapshot_text`](RingBuffer::from_snapshot_text) on a
    /// buffer created with the same configuration. Unlike the delta view of
    /// [`dump`](RingBuffer::dump), serializing does not consume the log.
    pub fn to_snapshot_text(&self) -> String {
        // 8 bytes is a reasonable guess for the common short tokens.
        let mut out = String::with_capacity(32 + self.values.len() * 8);
        let _ = write!(out, "{} {}", self.current_time, self.current_row);
        for &value in &self.values {
            out.push(' ');
            push_value(&mut out, value);
        }
        if let Some(log) = &self.deltas {
            for (time, row) in log.iter() {
                let _ = write!(out, " {time}");
                for &value in row {
                    out.push(' ');
                    push_value(&mut out, value);
                }
            }
        }
        out
    }

    /// Replaces the buffer state from snapshot text.
    ///
    /// This is a full replacement of cursor, matrix, and delta log, not a
    /// merge. Token counts are validated strictly: the matrix must contain
    /// exactly `rows × columns` values, and any trailing tokens must form
    /// whole delta groups (and are only accepted when the buffer tracks
    /// deltas). The text is parsed completely before anything is committed,
    /// so on error the buffer is left unchanged.
    ///
    /// Headers and the selected output format are not part of a snapshot
    /// and survive the restore.
    ///
    /// # Errors
    ///
    /// Returns [`RestoreError`] for a malformed header, a cursor row
    /// outside `[0, rows)`, a non-numeric value token, too few or too many
    /// values, or a truncated delta group.
    pub fn from_snapshot_text(&mut self, text: &str) -> Result<()> {
        let mut tokens = text.split_ascii_whitespace();

        let token = tokens.next().ok_or(RestoreError::MissingHeader {
            field: "current_time",
        })?;
        let current_time: i64 = token.parse().map_err(|_| RestoreError::InvalidHeader {
            field: "current_time",
            token: token.to_string(),
        })?;

        let token = tokens.next().ok_or(RestoreError::MissingHeader {
            field: "current_row",
        })?;
        let current_row: u32 = token.parse().map_err(|_| RestoreError::InvalidHeader {
            field: "current_row",
            token: token.to_string(),
        })?;
        if current_row >= self.config.rows {
            return Err(RestoreError::RowOutOfRange {
                row: current_row,
                rows: self.config.rows,
            }
            .into());
        }

        let expected = self.config.cells();
        let mut position = 0;
        let mut values = Vec::with_capacity(expected);
        while values.len() < expected {
            let Some(token) = tokens.next() else {
                return Err(RestoreError::TooFewValues {
                    got: values.len(),
                    expected,
                }
                .into());
            };
            values.push(parse_value(token, position)?);
            position += 1;
        }

        let mut staged = self
            .deltas
            .as_ref()
            .map(|_| DeltaLog::new(self.config.columns as usize));
        if let Some(log) = staged.as_mut() {
            let spr = i64::from(self.config.seconds_per_row);
            while let Some(token) = tokens.next() {
                // Each group starts with a bucket timestamp in seconds,
                // floored onto the bucket grid like any write.
                #[allow(clippy::cast_possible_truncation)] // fractional stamps truncate
                let stamp = parse_value(token, position)? as i64;
                position += 1;
                let bucket = stamp - stamp % spr;
                for column in 0..self.config.columns as usize {
                    let Some(token) = tokens.next() else {
                        return Err(RestoreError::InvalidDelta.into());
                    };
                    let value = parse_value(token, position)?;
                    position += 1;
                    // NaN means the column did not change in this bucket.
                    if !value.is_nan() {
                        log.record(bucket, column, value);
                    }
                }
            }
        } else if tokens.next().is_some() {
            return Err(RestoreError::TooManyValues { expected }.into());
        }

        self.current_time = current_time;
        self.current_row = current_row;
        self.values = values;
        if staged.is_some() {
            self.deltas = staged;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::RingConfig;

    fn token_roundtrip(value: f64) -> f64 {
        let mut out = String::new();
        push_value(&mut out, value);
        parse_value(&out, 0).unwrap()
    }

    #[test]
    fn test_value_tokens() {
        let mut out = String::new();
        push_value(&mut out, f64::NAN);
        out.push(' ');
        push_value(&mut out, f64::INFINITY);
        out.push(' ');
        push_value(&mut out, f64::NEG_INFINITY);
        out.push(' ');
        push_value(&mut out, -0.25);
        assert_eq!(out, "nan inf -inf -0.25");
    }

    #[test]
    fn test_token_roundtrip_is_exact() {
        for value in [0.0, -0.0, 1.5, -123.456, 0.1, 1e300, 5e-324, f64::MAX] {
            assert_eq!(token_roundtrip(value).to_bits(), value.to_bits());
        }
        assert!(token_roundtrip(f64::NAN).is_nan());
        assert_eq!(token_roundtrip(f64::INFINITY), f64::INFINITY);
        assert_eq!(token_roundtrip(f64::NEG_INFINITY), f64::NEG_INFINITY);
    }

    #[test]
    fn test_fresh_snapshot_shape() {
        let ring = RingBuffer::new(RingConfig::new(2, 2, 5).unwrap()).unwrap();
        assert_eq!(ring.to_snapshot_text(), "5 1 nan nan nan nan");
    }

    #[test]
    fn test_restore_header_errors() {
        let mut ring = RingBuffer::new(RingConfig::new(2, 1, 1).unwrap()).unwrap();
        assert!(ring.from_snapshot_text("").is_err());
        assert!(ring.from_snapshot_text("1").is_err());
        assert!(ring.from_snapshot_text("x 1 0 0").is_err());
        assert!(ring.from_snapshot_text("1 x 0 0").is_err());
        // Cursor row must fit the ring.
        assert!(ring.from_snapshot_text("1 2 0 0").is_err());
    }

    #[test]
    fn test_restore_token_count_errors() {
        let mut ring = RingBuffer::new(RingConfig::new(2, 2, 1).unwrap()).unwrap();
        assert!(matches!(
            ring.from_snapshot_text("1 1 0 0 0"),
            Err(crate::GyreError::Restore(RestoreError::TooFewValues { got: 3, expected: 4 }))
        ));
        assert!(matches!(
            ring.from_snapshot_text("1 1 0 0 0 0 9"),
            Err(crate::GyreError::Restore(RestoreError::TooManyValues { expected: 4 }))
        ));
        assert!(matches!(
            ring.from_snapshot_text("1 1 0 0 zero 0"),
            Err(crate::GyreError::Restore(RestoreError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_restore_truncated_delta_group() {
        let mut ring = RingBuffer::new(RingConfig::with_deltas(2, 2, 1).unwrap()).unwrap();
        // Matrix is complete; the delta group carries a stamp and only one
        // of the two required columns.
        assert!(matches!(
            ring.from_snapshot_text("1 1 1 2 3 4 0 5"),
            Err(crate::GyreError::Restore(RestoreError::InvalidDelta))
        ));
    }

    #[test]
    fn test_restore_failure_leaves_state_unchanged() {
        let mut ring = RingBuffer::new(RingConfig::new(2, 1, 1).unwrap()).unwrap();
        ring.set(1_000_000_000, 1, 42.0).unwrap();
        let before = ring.to_snapshot_text();

        assert!(ring.from_snapshot_text("7 0 1").is_err());
        assert_eq!(ring.to_snapshot_text(), before);
        assert_eq!(ring.get(1_000_000_000, 1).unwrap(), Some(42.0));
    }
}
