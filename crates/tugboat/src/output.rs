//! Console sinks for pull progress and container logs.

use std::io::{self, Write};

use crate::runtime::{LogChunk, LogSource};

/// Copies pull progress to a writer without interpreting it.
#[derive(Debug)]
pub struct ProgressSink<W> {
    writer: W,
    bytes: u64,
}

impl<W: Write> ProgressSink<W> {
    /// Create a sink over `writer`.
    pub const fn new(writer: W) -> Self {
        Self { writer, bytes: 0 }
    }

    /// Write one progress chunk verbatim.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.writer.write_all(chunk)?;
        self.bytes += chunk.len() as u64;
        Ok(())
    }

    /// Flush the writer and return the number of bytes copied.
    ///
    /// # Errors
    ///
    /// Returns any error from flushing the underlying writer.
    pub fn finish(mut self) -> io::Result<u64> {
        self.writer.flush()?;
        Ok(self.bytes)
    }
}

/// Byte counts per output channel after demultiplexing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemuxTotals {
    /// Bytes written to standard output.
    pub stdout_bytes: u64,
    /// Bytes written to standard error.
    pub stderr_bytes: u64,
}

/// Routes log frames to an output and an error writer by their origin tag.
///
/// Frames are written in arrival order, so ordering within each channel
/// matches the container's. Interleaving across the two channels is up to
/// whatever the writers are attached to.
#[derive(Debug)]
pub struct LogDemuxer<O, E> {
    stdout: O,
    stderr: E,
    totals: DemuxTotals,
}

impl<O: Write, E: Write> LogDemuxer<O, E> {
    /// Create a demuxer over the two writers.
    pub fn new(stdout: O, stderr: E) -> Self {
        Self {
            stdout,
            stderr,
            totals: DemuxTotals::default(),
        }
    }

    /// Write one frame's payload to the writer matching its source.
    ///
    /// # Errors
    ///
    /// Returns any error from the target writer.
    pub fn write_chunk(&mut self, chunk: &LogChunk) -> io::Result<()> {
        let len = chunk.payload.len() as u64;
        match chunk.source {
            LogSource::Stdout => {
                self.stdout.write_all(&chunk.payload)?;
                self.totals.stdout_bytes += len;
            }
            LogSource::Stderr => {
                self.stderr.write_all(&chunk.payload)?;
                self.totals.stderr_bytes += len;
            }
        }
        Ok(())
    }

    /// Flush both writers and return the byte counts.
    ///
    /// # Errors
    ///
    /// Returns any error from flushing either writer.
    pub fn finish(mut self) -> io::Result<DemuxTotals> {
        self.stdout.flush()?;
        self.stderr.flush()?;
        Ok(self.totals)
    }
}
