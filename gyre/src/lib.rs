//! # gyre
//!
//! Embedded time-windowed circular buffer for in-memory metrics.
//!
//! gyre is a Rust library for fixed-capacity, time-indexed metric storage
//! designed to be embedded directly in agents, dataplanes, and other
//! systems software that aggregates measurements in place. It keeps a
//! sliding window of `rows` time buckets × `columns` metrics and advances
//! the window automatically as writes arrive, evicting what falls behind.
//!
//! ## Key Properties
//!
//! - Bounded, predictable storage — size is determined by configuration,
//!   not data volume
//! - Self-managing retention: writing past the window end slides it forward
//!   and clears the evicted buckets; there is no explicit eviction call
//! - Per-column aggregation (`sum`, `min`, `max`, `none`) for repeated
//!   writes within a bucket
//! - Optional sparse delta log for incremental emission of changes
//! - Portable text snapshots that round-trip the full state exactly,
//!   NaN-for-NaN
//! - Single-threaded and synchronous: no background threads, no I/O, no
//!   surprises under the write path
//!
//! ## Quick Start
//!
//! ```rust
//! use gyre::{Aggregation, RingBuffer, RingConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // 1440 one-minute buckets of 2 metrics: a day of data
//! let mut ring = RingBuffer::new(RingConfig::new(1440, 2, 60)?)?;
//! ring.set_header(1, "requests", Some("count"), Some(Aggregation::Sum))?;
//! ring.set_header(2, "worst_latency", Some("ms"), Some(Aggregation::Max))?;
//!
//! // Record values (timestamps are nanoseconds since the epoch)
//! let ts = 1_700_000_000 * 1_000_000_000;
//! ring.add(ts, 1, 17.0)?;
//! ring.set(ts, 2, 4.5)?;
//!
//! // Query data back
//! assert_eq!(ring.get(ts, 1)?, Some(17.0));
//! let recent = ring.get_range(1, None, None)?.unwrap();
//! assert_eq!(recent.len(), 1440);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`RingBuffer`] — the buffer engine: time→row mapping, advancement,
//!   aggregation, range reads
//! - [`RingConfig`] — validated dimensions and the delta-tracking flag
//! - [`DeltaLog`] — sparse per-bucket change log, drained on emission
//! - [`OutputFormat`] — dense matrix vs. delta view for the dump
//!
//! ## Modules
//!
//! For lower-level access, the individual modules are also public:
//!
//! - [`ring`] — buffer engine and configuration
//! - [`column`] — column headers and aggregation policy
//! - [`delta`] — sparse delta log
//! - [`snapshot`] — exact-restore text format
//! - [`export`] — descriptive dump output
//! - [`error`] — error types

pub mod column;
pub mod delta;
pub mod error;
pub mod export;
pub mod ring;
pub mod snapshot;

// Re-export primary API types at crate root for convenience.
pub use column::{Aggregation, ColumnHeader};
pub use delta::DeltaLog;
pub use error::{ArgumentError, ConfigError, GyreError, RestoreError, Result};
pub use export::OutputFormat;
pub use ring::{RingBuffer, RingConfig};
