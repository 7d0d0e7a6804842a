//! Descriptive dump output for external consumption.
//!
//! The dump is the human- and pipeline-facing view of a buffer: a JSON
//! header describing the window and its columns, followed by the data in
//! one of two representations selected with
//! [`set_output_format`](crate::RingBuffer::set_output_format):
//!
//! - [`OutputFormat::Dense`] — one line per bucket, oldest to newest,
//!   tab-separated values.
//! - [`OutputFormat::Delta`] — one line per logged bucket timestamp,
//!   tab-separated per-column deltas with `nan` for unchanged columns.
//!   Emitting the delta view consumes the log; with no logged changes the
//!   dump is empty (no header either), so pollers can skip idle buffers.

use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::column::ColumnHeader;
use crate::error::{ArgumentError, GyreError};
use crate::ring::RingBuffer;
use crate::snapshot::push_value;

/// Representation used by [`RingBuffer::dump`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// The full value matrix, one line per bucket. The default.
    #[default]
    Dense,

    /// Only the logged changes since the last delta emission.
    Delta,
}

impl OutputFormat {
    /// Returns the lowercase token form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dense => "dense",
            Self::Delta => "delta",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = GyreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dense" => Ok(Self::Dense),
            "delta" => Ok(Self::Delta),
            _ => Err(ArgumentError::UnknownOutputFormat {
                token: s.to_string(),
            }
            .into()),
        }
    }
}

/// Header block emitted as the first line of every non-empty dump.
#[derive(Serialize)]
struct DumpHeader<'a> {
    time: i64,
    rows: u32,
    columns: u32,
    seconds_per_row: u32,
    column_info: &'a [ColumnHeader],
}

impl RingBuffer {
    /// Renders the buffer in the selected output format.
    ///
    /// The first line is a JSON object naming the window start time
    /// (seconds), the buffer dimensions, and the per-column
    /// `{name, unit, aggregation}` metadata; data lines follow per the
    /// format. In [`OutputFormat::Delta`] the logged changes are drained
    /// into the output, and an empty log yields an empty string.
    ///
    /// # Panics
    ///
    /// Panics if JSON serialization of the header fails, which cannot
    /// happen for these plain string/integer fields.
    pub fn dump(&mut self) -> String {
        if self.format == OutputFormat::Delta && self.delta_len() == 0 {
            return String::new();
        }

        let header = DumpHeader {
            time: self.start_time(),
            rows: self.config.rows,
            columns: self.config.columns,
            seconds_per_row: self.config.seconds_per_row,
            column_info: &self.headers,
        };
        let mut out =
            serde_json::to_string(&header).expect("dump header serialization is infallible");
        out.push('\n');

        match self.format {
            OutputFormat::Dense => {
                let rows = self.config.rows;
                let columns = self.config.columns as usize;
                // Walk forward from the oldest bucket so lines come out in
                // chronological order.
                let mut row = (self.current_row + 1) % rows;
                for _ in 0..rows {
                    for column in 0..columns {
                        if column != 0 {
                            out.push('\t');
                        }
                        push_value(&mut out, self.values[self.cell(row, column)]);
                    }
                    out.push('\n');
                    row = (row + 1) % rows;
                }
            }
            OutputFormat::Delta => {
                if let Some(log) = self.deltas.as_mut() {
                    for (time, deltas) in log.take() {
                        let _ = write!(out, "{time}");
                        for value in deltas {
                            out.push('\t');
                            push_value(&mut out, value);
                        }
                        out.push('\n');
                    }
                }
            }
        }
        out
    }
}
