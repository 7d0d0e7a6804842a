//! Error types for the gyre circular buffer.

use thiserror::Error;

/// The main error type for all gyre operations.
///
/// This enum covers the error conditions that can occur from buffer creation
/// through writes, queries, and snapshot restoration. Out-of-window reads and
/// writes are deliberately *not* errors: late or bursty data is an expected
/// steady-state condition, so those operations return `Ok(None)` instead.
#[derive(Error, Debug)]
pub enum GyreError {
    /// Error validating buffer configuration at construction.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Error validating an operation argument.
    #[error("argument error: {0}")]
    Argument(#[from] ArgumentError),

    /// Error restoring buffer state from snapshot text.
    #[error("restore error: {0}")]
    Restore(#[from] RestoreError),
}

/// Errors that can occur when validating a [`RingConfig`](crate::RingConfig).
///
/// These are fatal: construction fails and no buffer is created.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The row count is too small to form a window.
    #[error("rows must be > 1, got {rows}")]
    InvalidRows {
        /// The rejected row count.
        rows: u32,
    },

    /// The column count is zero.
    #[error("columns must be > 0, got {columns}")]
    InvalidColumns {
        /// The rejected column count.
        columns: u32,
    },

    /// The bucket width is zero.
    #[error("seconds_per_row must be > 0, got {seconds_per_row}")]
    InvalidSecondsPerRow {
        /// The rejected bucket width.
        seconds_per_row: u32,
    },
}

/// Errors raised by invalid operation arguments.
///
/// These are rejected before any mutation; buffer state is unchanged.
#[derive(Error, Debug)]
pub enum ArgumentError {
    /// A column index is outside the valid 1-based range.
    #[error("column {column} out of range [1, {columns}]")]
    ColumnOutOfRange {
        /// The requested 1-based column.
        column: u32,
        /// The number of columns in the buffer.
        columns: u32,
    },

    /// A range query was given an end timestamp earlier than its start.
    #[error("invalid time range: end {end_ns} < start {start_ns}")]
    InvalidTimeRange {
        /// The requested start timestamp in nanoseconds.
        start_ns: i64,
        /// The requested end timestamp in nanoseconds.
        end_ns: i64,
    },

    /// An aggregation token did not name a known method.
    #[error("unknown aggregation method '{token}' (expected sum, min, max, or none)")]
    UnknownAggregation {
        /// The rejected token.
        token: String,
    },

    /// An output format token did not name a known format.
    #[error("unknown output format '{token}' (expected dense or delta)")]
    UnknownOutputFormat {
        /// The rejected token.
        token: String,
    },
}

/// Errors that can occur while restoring a buffer from snapshot text.
///
/// These are fatal to the restore call. The text is parsed in full before any
/// state is committed, so the buffer is left unchanged on every error path.
#[derive(Error, Debug)]
pub enum RestoreError {
    /// The snapshot header is missing its time or row field.
    #[error("snapshot header truncated: missing {field}")]
    MissingHeader {
        /// Name of the missing field.
        field: &'static str,
    },

    /// A header token could not be parsed as an integer.
    #[error("invalid snapshot {field}: '{token}'")]
    InvalidHeader {
        /// Name of the malformed field.
        field: &'static str,
        /// The rejected token.
        token: String,
    },

    /// The restored cursor row does not fit the buffer.
    #[error("snapshot row {row} out of range [0, {rows})")]
    RowOutOfRange {
        /// The restored row index.
        row: u32,
        /// The number of rows in the buffer.
        rows: u32,
    },

    /// A value token could not be parsed as a double.
    #[error("invalid value token '{token}' at position {position}")]
    InvalidValue {
        /// The rejected token.
        token: String,
        /// Zero-based token position within the value sequence.
        position: usize,
    },

    /// The snapshot ended before the full matrix was read.
    #[error("too few values: {got}, expected {expected}")]
    TooFewValues {
        /// Number of values actually present.
        got: usize,
        /// Number of values required (`rows * columns`).
        expected: usize,
    },

    /// The snapshot carries tokens beyond the expected matrix.
    #[error("too many values, more than: {expected}")]
    TooManyValues {
        /// Number of values expected (`rows * columns`).
        expected: usize,
    },

    /// A trailing delta group did not contain one value per column.
    #[error("invalid delta: group truncated mid-row")]
    InvalidDelta,
}

/// Type alias for `Result<T, GyreError>`.
pub type Result<T> = std::result::Result<T, GyreError>;
