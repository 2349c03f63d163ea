//! Eviction trace records and sinks.
//!
//! Each eviction performed by the page-aware cache is logged as one line of a
//! disk-simulation input trace. The line layout is bit-exact and fixed by the
//! consuming simulator:
//!
//! ```text
//! <issue_time:16><device_number:8><block_number:8><request_size:8><request_flags>
//! ```
//!
//! All fields are left-justified and space-padded to their width. The device
//! number and request flags are emitted as the literal constant `"0"` (device
//! slot and write-flag convention fixed by the trace format). The issue time
//! is the *triggering access's* issue time, printed in fixed notation with
//! six decimals; block number and request size come from the victim entry's
//! stored request metadata.
//!
//! The layout is reproduced by an explicit formatter rather than trusting
//! incidental stream formatting, and pinned down by tests.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

#[cfg(feature = "std")]
use std::io::{self, Write};

/// One eviction, ready to be serialized as a trace line.
///
/// The eviction is logged as occurring at the time of the access that caused
/// it, not at the victim's own original access time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvictionRecord {
    /// Issue time of the access that triggered the eviction.
    pub issue_time: f64,
    /// Block number of the victim entry.
    pub block_number: u64,
    /// Request size of the victim entry.
    pub request_size: u64,
}

impl EvictionRecord {
    /// Formats this record as one trace line (without a trailing newline).
    ///
    /// # Examples
    ///
    /// ```
    /// use memo_cache::trace::EvictionRecord;
    ///
    /// let record = EvictionRecord {
    ///     issue_time: 31.5,
    ///     block_number: 1024,
    ///     request_size: 8,
    /// };
    /// assert_eq!(
    ///     record.format_line(),
    ///     "31.500000       0       1024    8       0",
    /// );
    /// ```
    pub fn format_line(&self) -> String {
        use core::fmt::Write;
        let mut line = String::new();
        // Infallible for String; discard the Result rather than unwrap.
        let _ = write!(
            line,
            "{:<16.6}{:<8}{:<8}{:<8}{}",
            self.issue_time, DEVICE_NUMBER, self.block_number, self.request_size, REQUEST_FLAGS
        );
        line
    }
}

/// Device slot constant emitted in every trace line.
const DEVICE_NUMBER: &str = "0";
/// Request-flag constant emitted in every trace line.
const REQUEST_FLAGS: &str = "0";

impl fmt::Display for EvictionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<16.6}{:<8}{:<8}{:<8}{}",
            self.issue_time, DEVICE_NUMBER, self.block_number, self.request_size, REQUEST_FLAGS
        )
    }
}

/// Consumer of eviction trace records.
///
/// The page cache emits exactly one record per eviction (capacity pressure or
/// explicit removal). Implementations decide where the formatted line goes.
pub trait TraceSink {
    /// Accepts one eviction record.
    fn record(&mut self, record: &EvictionRecord);
}

/// Sink that drops every record. Useful when the trace is not needed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TraceSink for NullSink {
    fn record(&mut self, _record: &EvictionRecord) {}
}

/// Sink that collects formatted trace lines in memory.
///
/// Mostly useful in tests and small simulations; lines are stored in emission
/// order.
#[derive(Debug, Default, Clone)]
pub struct VecSink {
    lines: Vec<String>,
}

impl VecSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        VecSink::default()
    }

    /// The trace lines collected so far, in emission order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl TraceSink for VecSink {
    fn record(&mut self, record: &EvictionRecord) {
        self.lines.push(record.format_line());
    }
}

impl<S: TraceSink + ?Sized> TraceSink for &mut S {
    fn record(&mut self, record: &EvictionRecord) {
        (**self).record(record);
    }
}

/// Sink that writes each trace line, newline-terminated, to an
/// [`io::Write`] destination.
///
/// Write errors are sticky: the first error is retained and subsequent
/// records are dropped, so a broken pipe cannot panic the cache mid-access.
#[cfg(feature = "std")]
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: W,
    error: Option<io::Error>,
}

#[cfg(feature = "std")]
impl<W: Write> WriterSink<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        WriterSink {
            writer,
            error: None,
        }
    }

    /// The first write error encountered, if any.
    pub fn last_error(&self) -> Option<&io::Error> {
        self.error.as_ref()
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

#[cfg(feature = "std")]
impl<W: Write> TraceSink for WriterSink<W> {
    fn record(&mut self, record: &EvictionRecord) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = writeln!(self.writer, "{}", record) {
            self.error = Some(e);
        }
    }
}
