use std::io;

use thiserror::Error;

/// Problems reading from the serial source.
#[derive(Debug, Error)]
pub enum SerialError {
    /// IO related errors.
    #[error("Underlying IO problem")]
    IO(#[from] io::Error),

    /// The byte stream ended.
    #[error("Serial port disconnected")]
    Disconnected,
}
