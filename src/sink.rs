use std::io;

use thiserror::Error;

/// Echoes lines to the terminal.
pub mod console;

/// Appends lines to a daily rotated log file.
pub mod file;

/// Streams lines to a TCP log collector.
pub mod network;

pub use console::ConsoleSink;
pub use file::FileSink;
pub use network::NetworkSink;

/// Problems a sink may run into.
///
/// These are reported by the dispatcher but never stop it.
#[derive(Debug, Error)]
pub enum SinkError {
    /// IO related errors.
    #[error("Underlying IO problem: {0}")]
    IO(#[from] io::Error),

    /// The log directory is missing or not usable.
    #[error("Not a writable directory: {0}")]
    NotWritable(String),

    /// No connection to the log collector could be made.
    #[error("Could not connect to {addr}: {problem}")]
    Connect {
        /// The collector.
        addr: String,

        /// What went wrong.
        problem: String,
    },
}
