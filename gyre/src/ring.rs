//! Ring buffer implementation for gyre time-series storage.
//!
//! This module owns the core engine: the time→row mapping, window
//! advancement and eviction, the per-column aggregation write paths, and
//! range reads. The buffer is a dense `rows × columns` matrix of doubles
//! indexed by bucket, where each bucket covers `seconds_per_row` of wall
//! time and NaN marks cells never written since they were last cleared.
//!
//! # Design
//!
//! - Row computation: a timestamp floors to its bucket time `t`, and the
//!   bucket maps to row `(t / seconds_per_row) % rows`.
//! - Reads never move the window; writes advance it, evicting every bucket
//!   the window slides past. Retention is therefore self-managing: there is
//!   no explicit eviction call.
//! - Writes older than the retained window, or reads ahead of it, resolve
//!   to "no value" rather than an error; late and bursty data is expected.
//! - NaN sentinel values mark unwritten cells, so zero is a legitimate
//!   stored value.

use serde::{Deserialize, Serialize};

use crate::column::{Aggregation, ColumnHeader, DEFAULT_UNIT};
use crate::delta::DeltaLog;
use crate::error::{ArgumentError, ConfigError, Result};
use crate::export::OutputFormat;

/// Nanoseconds per second, for boundary/bucket conversions.
pub(crate) const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Configuration for a [`RingBuffer`], fixed at creation.
///
/// # Example
///
/// ```rust
/// use gyre::RingConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // 60 one-minute buckets of 4 metrics, with delta tracking
/// let config = RingConfig::with_deltas(60, 4, 60)?;
/// assert!(config.track_deltas);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RingConfig {
    /// Number of time buckets retained. Must be > 1.
    pub rows: u32,

    /// Number of metric columns per bucket. Must be > 0.
    pub columns: u32,

    /// Width of one bucket in whole seconds. Must be > 0.
    pub seconds_per_row: u32,

    /// Whether writes also feed the sparse delta log.
    #[serde(default)]
    pub track_deltas: bool,
}

impl RingConfig {
    /// Creates a validated configuration without delta tracking.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `rows <= 1`, `columns == 0`, or
    /// `seconds_per_row == 0`.
    pub fn new(rows: u32, columns: u32, seconds_per_row: u32) -> Result<Self> {
        let config = Self {
            rows,
            columns,
            seconds_per_row,
            track_deltas: false,
        };
        config.validate()?;
        Ok(config)
    }

    /// Creates a validated configuration with delta tracking enabled.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any dimension is out of range, as
    /// [`RingConfig::new`].
    pub fn with_deltas(rows: u32, columns: u32, seconds_per_row: u32) -> Result<Self> {
        let mut config = Self::new(rows, columns, seconds_per_row)?;
        config.track_deltas = true;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first out-of-range dimension.
    pub fn validate(&self) -> Result<()> {
        if self.rows <= 1 {
            return Err(ConfigError::InvalidRows { rows: self.rows }.into());
        }
        if self.columns == 0 {
            return Err(ConfigError::InvalidColumns {
                columns: self.columns,
            }
            .into());
        }
        if self.seconds_per_row == 0 {
            return Err(ConfigError::InvalidSecondsPerRow {
                seconds_per_row: self.seconds_per_row,
            }
            .into());
        }
        Ok(())
    }

    /// Total number of cells in the value matrix.
    pub(crate) fn cells(&self) -> usize {
        self.rows as usize * self.columns as usize
    }
}

/// A fixed-capacity, time-indexed circular buffer of metric columns.
///
/// The buffer retains a sliding window of `rows` buckets ending at
/// `current_time`. Writing past the end of the window advances it, clearing
/// the buckets it slides over; writing or reading outside the window yields
/// `None`. Repeated writes into one bucket combine per the column's
/// [`Aggregation`] policy.
///
/// # Thread Safety
///
/// A `RingBuffer` is a plain owned value; `&mut` access gives the single
/// writer required by the design. Wrap it externally if it must be shared.
///
/// # Example
///
/// ```rust
/// use gyre::{RingBuffer, RingConfig};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut ring = RingBuffer::new(RingConfig::new(10, 1, 1)?)?;
///
/// let ts = 20 * 1_000_000_000;
/// ring.set(ts, 1, 42.5)?;
/// assert_eq!(ring.get(ts, 1)?, Some(42.5));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RingBuffer {
    /// Immutable buffer dimensions and delta flag.
    pub(crate) config: RingConfig,
    /// Bucket time of the newest retained bucket, in seconds.
    pub(crate) current_time: i64,
    /// Ring index corresponding to `current_time`.
    pub(crate) current_row: u32,
    /// Row-major `rows × columns` value matrix.
    pub(crate) values: Vec<f64>,
    /// Per-column metadata, `columns` entries.
    pub(crate) headers: Vec<ColumnHeader>,
    /// Sparse change log, present iff `config.track_deltas`.
    pub(crate) deltas: Option<DeltaLog>,
    /// Selected representation for the descriptive dump.
    pub(crate) format: OutputFormat,
}

impl RingBuffer {
    /// Creates an empty buffer from a validated configuration.
    ///
    /// The cursor starts at `seconds_per_row * (rows - 1)` so that the
    /// window begins at time zero, and every cell holds NaN.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid.
    pub fn new(config: RingConfig) -> Result<Self> {
        config.validate()?;
        let headers = (1..=config.columns).map(ColumnHeader::numbered).collect();
        Ok(Self {
            current_time: i64::from(config.seconds_per_row) * i64::from(config.rows - 1),
            current_row: config.rows - 1,
            values: vec![f64::NAN; config.cells()],
            headers,
            deltas: config
                .track_deltas
                .then(|| DeltaLog::new(config.columns as usize)),
            format: OutputFormat::Dense,
            config,
        })
    }

    /// Returns the buffer configuration.
    pub fn config(&self) -> &RingConfig {
        &self.config
    }

    /// Returns `(rows, columns, seconds_per_row)`.
    pub fn configuration(&self) -> (u32, u32, u32) {
        (
            self.config.rows,
            self.config.columns,
            self.config.seconds_per_row,
        )
    }

    /// Returns the number of retained buckets.
    pub fn rows(&self) -> u32 {
        self.config.rows
    }

    /// Returns the number of metric columns.
    pub fn columns(&self) -> u32 {
        self.config.columns
    }

    /// Returns the bucket width in seconds.
    pub fn seconds_per_row(&self) -> u32 {
        self.config.seconds_per_row
    }

    /// Returns whether writes feed the delta log.
    pub fn tracks_deltas(&self) -> bool {
        self.config.track_deltas
    }

    /// Returns the timestamp of the newest retained bucket, in nanoseconds.
    pub fn current_time_ns(&self) -> i64 {
        self.current_time * NANOS_PER_SEC
    }

    /// Returns the timestamp of the oldest retained bucket, in nanoseconds.
    pub fn window_start_ns(&self) -> i64 {
        self.start_time() * NANOS_PER_SEC
    }

    /// Returns a read-only view of the delta log, if tracking is enabled.
    pub fn delta_log(&self) -> Option<&DeltaLog> {
        self.deltas.as_ref()
    }

    /// Returns the number of buckets currently held in the delta log.
    pub fn delta_len(&self) -> usize {
        self.deltas.as_ref().map_or(0, DeltaLog::len)
    }

    /// Returns the representation the descriptive dump will use.
    pub fn output_format(&self) -> OutputFormat {
        self.format
    }

    /// Selects the representation for subsequent descriptive dumps.
    pub fn set_output_format(&mut self, format: OutputFormat) {
        self.format = format;
    }

    /// Adds `value` into the bucket covering `timestamp_ns`.
    ///
    /// A NaN (unwritten) cell takes the value directly; otherwise the value
    /// is summed into the cell regardless of the column's aggregation
    /// method. The write advances the window when the timestamp lands past
    /// its end.
    ///
    /// Returns the resulting cell value, or `None` when the timestamp falls
    /// outside the reachable window (too old, or too far ahead to advance).
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError`] if `column` is outside `[1, columns]`.
    pub fn add(&mut self, timestamp_ns: i64, column: u32, value: f64) -> Result<Option<f64>> {
        let col = self.column_index(column)?;
        let Some((row, bucket)) = self.resolve_write(timestamp_ns) else {
            return Ok(None);
        };
        let idx = self.cell(row, col);
        let cell = &mut self.values[idx];
        if cell.is_nan() {
            *cell = value;
        } else {
            *cell += value;
        }
        let updated = *cell;
        // Zero increments change nothing worth replaying downstream.
        if value != 0.0
            && let Some(log) = self.deltas.as_mut()
        {
            let recorded = if self.headers[col].aggregation() == Aggregation::Sum {
                value
            } else {
                updated
            };
            log.record(bucket, col, recorded);
        }
        Ok(Some(updated))
    }

    /// Stores `value` into the bucket covering `timestamp_ns`, subject to
    /// the column's aggregation method.
    ///
    /// `sum` and `none` columns are overwritten unconditionally; `min` and
    /// `max` columns only when the value improves on the cell. The write
    /// advances the window when the timestamp lands past its end.
    ///
    /// Returns the resulting cell value (the prior one if a `min`/`max`
    /// write lost), or `None` when the timestamp falls outside the
    /// reachable window.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError`] if `column` is outside `[1, columns]`.
    pub fn set(&mut self, timestamp_ns: i64, column: u32, value: f64) -> Result<Option<f64>> {
        let col = self.column_index(column)?;
        let Some((row, bucket)) = self.resolve_write(timestamp_ns) else {
            return Ok(None);
        };
        let idx = self.cell(row, col);
        let old = self.values[idx];
        match self.headers[col].aggregation() {
            Aggregation::Min => {
                if old.is_nan() || value < old {
                    self.values[idx] = value;
                    if let Some(log) = self.deltas.as_mut() {
                        log.record(bucket, col, value);
                    }
                }
            }
            Aggregation::Max => {
                if old.is_nan() || value > old {
                    self.values[idx] = value;
                    if let Some(log) = self.deltas.as_mut() {
                        log.record(bucket, col, value);
                    }
                }
            }
            Aggregation::Sum | Aggregation::None => {
                self.values[idx] = value;
                if let Some(log) = self.deltas.as_mut() {
                    // A NaN or infinite prior value marks a fresh cell: the
                    // delta is the full value, not a difference.
                    let delta = if old.is_nan() || old.is_infinite() {
                        value
                    } else {
                        value - old
                    };
                    log.record(bucket, col, delta);
                }
            }
        }
        Ok(Some(self.values[idx]))
    }

    /// Reads the cell for `column` in the bucket covering `timestamp_ns`.
    ///
    /// Never moves the window. Returns `None` for timestamps outside the
    /// retained window; an untouched in-window cell reads as NaN.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError`] if `column` is outside `[1, columns]`.
    pub fn get(&self, timestamp_ns: i64, column: u32) -> Result<Option<f64>> {
        let col = self.column_index(column)?;
        Ok(self
            .resolve_read(timestamp_ns)
            .map(|row| self.values[self.cell(row, col)]))
    }

    /// Reads a contiguous span of one column in chronological order.
    ///
    /// `start_ns` defaults to the window start and `end_ns` to the newest
    /// bucket time; both endpoints are inclusive and the result holds one
    /// value per bucket spanned, NaN included. Returns `None` (no partial
    /// results) when either endpoint falls outside the retained window.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError`] if `column` is out of range or
    /// `end_ns < start_ns`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use gyre::{RingBuffer, RingConfig};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut ring = RingBuffer::new(RingConfig::new(5, 1, 1)?)?;
    /// for i in 0..5 {
    ///     ring.set(i * 1_000_000_000, 1, (i + 1) as f64)?;
    /// }
    /// let values = ring.get_range(1, None, None)?.unwrap();
    /// assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn get_range(
        &self,
        column: u32,
        start_ns: Option<i64>,
        end_ns: Option<i64>,
    ) -> Result<Option<Vec<f64>>> {
        let col = self.column_index(column)?;
        let start_ns = start_ns.unwrap_or_else(|| self.window_start_ns());
        let end_ns = end_ns.unwrap_or_else(|| self.current_time_ns());
        if end_ns < start_ns {
            return Err(ArgumentError::InvalidTimeRange { start_ns, end_ns }.into());
        }

        let (Some(start_row), Some(end_row)) =
            (self.resolve_read(start_ns), self.resolve_read(end_ns))
        else {
            return Ok(None);
        };

        let rows = self.config.rows;
        let span = (u64::from(end_row) + u64::from(rows) - u64::from(start_row))
            % u64::from(rows)
            + 1;
        let mut out = Vec::with_capacity(span as usize);
        let mut row = start_row;
        loop {
            out.push(self.values[self.cell(row, col)]);
            if row == end_row {
                break;
            }
            row = (row + 1) % rows;
        }
        Ok(Some(out))
    }

    /// Replaces the header of a 1-based column.
    ///
    /// `unit` defaults to `count` and `aggregation` to [`Aggregation::Sum`]
    /// when omitted. The name and unit are sanitized and length-capped; see
    /// [`ColumnHeader`]. Returns the normalized 1-based column index.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError`] if `column` is outside `[1, columns]`.
    pub fn set_header(
        &mut self,
        column: u32,
        name: &str,
        unit: Option<&str>,
        aggregation: Option<Aggregation>,
    ) -> Result<u32> {
        let col = self.column_index(column)?;
        self.headers[col].set(
            name,
            unit.unwrap_or(DEFAULT_UNIT),
            aggregation.unwrap_or(Aggregation::Sum),
        );
        Ok(column)
    }

    /// Returns the header of a 1-based column.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError`] if `column` is outside `[1, columns]`.
    pub fn header(&self, column: u32) -> Result<&ColumnHeader> {
        let col = self.column_index(column)?;
        Ok(&self.headers[col])
    }

    /// Bucket time of the oldest retained bucket, in seconds.
    pub(crate) fn start_time(&self) -> i64 {
        self.current_time
            - i64::from(self.config.seconds_per_row) * i64::from(self.config.rows - 1)
    }

    /// Floors a nanosecond timestamp to its bucket time in seconds.
    pub(crate) fn bucket_time(&self, timestamp_ns: i64) -> i64 {
        let t = timestamp_ns / NANOS_PER_SEC;
        t - t % i64::from(self.config.seconds_per_row)
    }

    /// Index of `(row, column)` in the row-major value matrix.
    #[inline]
    pub(crate) fn cell(&self, row: u32, column: usize) -> usize {
        row as usize * self.config.columns as usize + column
    }

    /// Validates a 1-based column and converts it to a matrix index.
    fn column_index(&self, column: u32) -> Result<usize> {
        if column == 0 || column > self.config.columns {
            return Err(ArgumentError::ColumnOutOfRange {
                column,
                columns: self.config.columns,
            }
            .into());
        }
        Ok((column - 1) as usize)
    }

    /// Resolves a timestamp to its ring row without moving the window.
    ///
    /// Returns `None` for timestamps past `current_time` or behind the
    /// window start.
    #[allow(clippy::cast_possible_truncation)] // rem_euclid result is bounded by rows
    pub(crate) fn resolve_read(&self, timestamp_ns: i64) -> Option<u32> {
        let spr = i64::from(self.config.seconds_per_row);
        let requested = self.bucket_time(timestamp_ns) / spr;
        let delta = requested - self.current_time / spr;
        if delta > 0 || delta.unsigned_abs() >= u64::from(self.config.rows) {
            return None;
        }
        Some(requested.rem_euclid(i64::from(self.config.rows)) as u32)
    }

    /// Resolves a timestamp to its ring row for a write, advancing the
    /// window (and evicting slid-over buckets) when the timestamp lands
    /// past its end.
    ///
    /// Returns the row together with the bucket time in seconds, or `None`
    /// when the timestamp falls behind the retained window.
    #[allow(clippy::cast_possible_truncation)] // both casts bounded by rows
    fn resolve_write(&mut self, timestamp_ns: i64) -> Option<(u32, i64)> {
        let spr = i64::from(self.config.seconds_per_row);
        let rows = i64::from(self.config.rows);
        let t = self.bucket_time(timestamp_ns);
        let requested = t / spr;
        let delta = requested - self.current_time / spr;
        let row = requested.rem_euclid(rows) as u32;

        if delta > 0 {
            self.clear_rows(delta.min(rows) as u32);
            self.current_time = t;
            self.current_row = row;
            Some((row, t))
        } else if delta.unsigned_abs() >= u64::from(self.config.rows) {
            None
        } else {
            Some((row, t))
        }
    }

    /// Clears `min(num_rows, rows)` buckets to NaN, starting immediately
    /// after the current row and wrapping past the end of the ring.
    ///
    /// The cleared span is at most two contiguous slices of the row-major
    /// matrix, so this is a pair of bulk fills rather than a per-cell walk.
    pub(crate) fn clear_rows(&mut self, num_rows: u32) {
        let rows = self.config.rows as usize;
        let columns = self.config.columns as usize;
        let num = num_rows.min(self.config.rows) as usize;
        let first = ((self.current_row + 1) % self.config.rows) as usize;
        let end = first + num;
        if end <= rows {
            self.values[first * columns..end * columns].fill(f64::NAN);
        } else {
            self.values[first * columns..].fill(f64::NAN);
            self.values[..(end - rows) * columns].fill(f64::NAN);
        }
    }
}
