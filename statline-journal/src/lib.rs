//! Journal format, encoding and validation for Statline metric samples.
//!
//! A journal is an append-only plain-text file of newline-delimited samples.
//! Each line carries three whitespace-delimited fields:
//!
//! ```text
//! <timestamp-text> <prefixed-metric-name> <numeric-value>
//! ```
//!
//! The [`Journal`] writer appends lines encoded with [`encode_line`]. The
//! upload side reads a rotated snapshot of the journal back through
//! [`Sample::parse`], which turns well-formed, fresh lines into [`Sample`]
//! records and diverts everything else to a [`RejectSink`].
//!
//! # Timestamps
//!
//! Timestamp fields are interpreted by [`UnixTimestamp::parse`], which
//! accepts unix seconds, unix milliseconds and free-form date text. Samples
//! older than the staleness window (two hours by default) are rejected, so a
//! journal that sat unprocessed for too long does not flood the backend with
//! outdated data.

#![warn(missing_docs)]

mod journal;
mod parse;
mod sample;
mod sink;
mod timestamp;

pub use self::journal::Journal;
pub use self::parse::{DEFAULT_STALE_THRESHOLD, ParseSamples, RejectReason, RejectedLine};
pub use self::sample::{Sample, encode_line};
pub use self::sink::RejectSink;
pub use self::timestamp::UnixTimestamp;
