use std::io::{self, Write};

use tracing::Level;

use super::SinkError;
use crate::record::LogRecord;

/// Writes `{timestamp} > {message}` lines to a terminal (or any writer).
///
/// Each line is flushed as soon as it is written.
#[derive(Debug)]
pub struct ConsoleSink<W = io::Stdout> {
    writer: W,
    max_level: Level,
}

impl ConsoleSink {
    /// A sink writing to standard output.
    pub fn stdout(quiet: bool) -> Self {
        Self::new(io::stdout(), quiet)
    }
}

impl<W: Write> ConsoleSink<W> {
    /// Quiet sinks only show INFO and above, otherwise DEBUG is shown as well.
    pub fn new(writer: W, quiet: bool) -> Self {
        Self {
            writer,
            max_level: if quiet { Level::INFO } else { Level::DEBUG },
        }
    }

    /// Write the record at the given level.
    ///
    /// Returns `false` if the level was filtered out.
    pub fn emit(&mut self, level: Level, record: &LogRecord) -> Result<bool, SinkError> {
        if level > self.max_level {
            return Ok(false);
        }

        writeln!(self.writer, "{}", record.console_line())?;
        self.writer.flush()?;

        Ok(true)
    }

    /// Give back the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
