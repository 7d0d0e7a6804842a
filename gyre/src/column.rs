//! Column metadata: names, units, and aggregation policy.
//!
//! Every column of a [`RingBuffer`](crate::RingBuffer) carries a header with
//! a short display name, a unit label, and the aggregation method that
//! governs how repeated `set` calls within the same bucket combine. Headers
//! are serialized into the `column_info` block of the descriptive dump.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ArgumentError, GyreError};

/// Maximum length of a sanitized column name, in characters.
pub const MAX_NAME_LEN: usize = 15;

/// Maximum length of a sanitized unit label, in characters.
pub const MAX_UNIT_LEN: usize = 7;

/// Unit label assigned to columns that never had a header set.
pub const DEFAULT_UNIT: &str = "count";

/// Per-column rule governing how repeated writes to the same bucket combine.
///
/// The policy applies to [`set`](crate::RingBuffer::set); `add` always sums.
/// It also selects what the delta log records for a column: `Sum` columns
/// log increments, all others log the resulting cell value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Overwrite unconditionally; deltas are increments. The default.
    Sum,

    /// Keep the smallest value seen in the bucket.
    Min,

    /// Keep the largest value seen in the bucket.
    Max,

    /// Overwrite unconditionally, but delta as an absolute value.
    ///
    /// For gauge-like columns whose changes should not be replayed as sums.
    None,
}

impl Aggregation {
    /// Returns the lowercase token form used in headers and dumps.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
            Self::None => "none",
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aggregation {
    type Err = GyreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sum" => Ok(Self::Sum),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "none" => Ok(Self::None),
            _ => Err(ArgumentError::UnknownAggregation {
                token: s.to_string(),
            }
            .into()),
        }
    }
}

/// Metadata for one column of the buffer.
///
/// Names and units are sanitized on the way in so they can be embedded in
/// the dump header and downstream display formats without escaping: any
/// character that is not ASCII alphanumeric becomes `_`, except that unit
/// labels keep `/` and `*` for rate notations like `B/s`. Names are capped
/// at [`MAX_NAME_LEN`] characters and units at [`MAX_UNIT_LEN`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnHeader {
    name: String,
    unit: String,
    aggregation: Aggregation,
}

impl ColumnHeader {
    /// Creates the default header for the given 1-based column index:
    /// `Column_<n>` / `count` / `sum`.
    pub(crate) fn numbered(index: u32) -> Self {
        Self {
            name: format!("Column_{index}"),
            unit: DEFAULT_UNIT.to_string(),
            aggregation: Aggregation::Sum,
        }
    }

    /// Replaces this header with sanitized copies of the given fields.
    pub(crate) fn set(&mut self, name: &str, unit: &str, aggregation: Aggregation) {
        self.name = sanitize_name(name);
        self.unit = sanitize_unit(unit);
        self.aggregation = aggregation;
    }

    /// Returns the sanitized column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the sanitized unit label.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Returns the column's aggregation method.
    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }
}

/// Sanitizes a column name: non-alphanumeric characters become `_`,
/// truncated to [`MAX_NAME_LEN`] characters.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .take(MAX_NAME_LEN)
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Sanitizes a unit label like [`sanitize_name`], except `/` and `*` are
/// preserved, truncated to [`MAX_UNIT_LEN`] characters.
fn sanitize_unit(unit: &str) -> String {
    unit.chars()
        .take(MAX_UNIT_LEN)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '/' || c == '*' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
